//! Application assembly: shared state plus the middleware pipeline.
//!
//! The pipeline applies, in order: request tracing, CORS, security headers,
//! response compression, then for `/api` paths only: per-IP rate limiting,
//! the body size cap, and input scrubbing. The payment webhook route sits
//! outside the API scope so its raw body reaches the handler untouched.
//! Unmatched routes fall through to a JSON 404.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    http::Uri,
    middleware,
    routing::post,
    Router,
};
use sqlx::PgPool;
use tower::ServiceBuilder;
use tower_governor::{
    governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor, GovernorLayer,
};
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::api::errors::ApiError;
use crate::api::handlers::{bookings, reviews, tours, users, views};
use crate::api::middleware::{scrub_request, set_security_headers};
use crate::config::{Config, API_BODY_LIMIT, WEBHOOK_BODY_LIMIT};
use crate::domain::repositories::{
    BookingRepository, ReviewRepository, TourRepository, UserRepository,
};
use crate::infrastructure::repositories::{
    PostgresBookingRepository, PostgresReviewRepository, PostgresTourRepository,
    PostgresUserRepository,
};
use crate::payments::{HttpPaymentGateway, PaymentGateway};

/// Shared application state
///
/// Repositories and the payment gateway are trait objects so the same
/// router runs against Postgres in production and in-memory stores in tests.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub tours: Arc<dyn TourRepository>,
    pub users: Arc<dyn UserRepository>,
    pub reviews: Arc<dyn ReviewRepository>,
    pub bookings: Arc<dyn BookingRepository>,
    pub payments: Arc<dyn PaymentGateway>,
}

impl AppState {
    pub fn new(
        config: Config,
        tours: Arc<dyn TourRepository>,
        users: Arc<dyn UserRepository>,
        reviews: Arc<dyn ReviewRepository>,
        bookings: Arc<dyn BookingRepository>,
        payments: Arc<dyn PaymentGateway>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            tours,
            users,
            reviews,
            bookings,
            payments,
        }
    }

    /// Production wiring: Postgres repositories and the HTTP payment gateway
    pub fn postgres(config: Config, pool: PgPool) -> Self {
        let payments = HttpPaymentGateway::new(
            config.payment_api_url.clone(),
            config.payment_secret_key.clone(),
        );
        Self::new(
            config,
            Arc::new(PostgresTourRepository::new(pool.clone())),
            Arc::new(PostgresUserRepository::new(pool.clone())),
            Arc::new(PostgresReviewRepository::new(pool.clone())),
            Arc::new(PostgresBookingRepository::new(pool)),
            Arc::new(payments),
        )
    }
}

/// Builds the complete application router
pub fn build_app(state: AppState) -> Router {
    // CORS: allow any origin; preflight handled for all routes
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Rate limiting on /api paths: one request slot replenished every
    // window/max seconds, with a burst of the full window allowance.
    // SmartIpKeyExtractor resolves the client IP from X-Forwarded-For /
    // X-Real-IP before the socket peer, which is what running behind a
    // trusted proxy requires.
    let governor_config = Arc::new(
        GovernorConfigBuilder::default()
            .period(Duration::from_secs(state.config.rate_limit_replenish_secs()))
            .burst_size(state.config.rate_limit_max)
            .key_extractor(SmartIpKeyExtractor)
            .use_headers()
            .finish()
            .expect("Rate limiter configuration is valid and should never fail"),
    );

    let api = Router::new()
        .nest("/api/v1/tours", tours::router())
        .nest("/api/v1/users", users::router())
        .nest("/api/v1/reviews", reviews::router())
        .nest("/api/v1/bookings", bookings::router())
        .layer(
            ServiceBuilder::new()
                .layer(GovernorLayer {
                    config: governor_config,
                })
                .layer(DefaultBodyLimit::max(API_BODY_LIMIT))
                .layer(middleware::from_fn(scrub_request)),
        );

    // Raw-body webhook route, outside the API middleware scope
    let webhook = Router::new()
        .route("/webhook-checkout", post(bookings::webhook_checkout))
        .layer(DefaultBodyLimit::max(WEBHOOK_BODY_LIMIT));

    Router::new()
        .merge(views::router())
        .merge(webhook)
        .merge(api)
        .fallback(not_found)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(middleware::from_fn(set_security_headers))
                .layer(CompressionLayer::new()),
        )
        .with_state(state)
}

/// Catch-all for unmatched routes
async fn not_found(uri: Uri) -> ApiError {
    ApiError::not_found(format!("Can't find {} on this server!", uri.path()))
}
