//! Middleware pipeline integration tests
//!
//! Configuration assertions over the assembled router: the 404 catch-all,
//! security headers, the API body cap, input scrubbing, parameter-pollution
//! collapse, CORS, compression, and the per-IP rate limit.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use tower::util::ServiceExt; // for oneshot
use uuid::Uuid;

use wayfarer_api::app::{build_app, AppState};
use wayfarer_api::config::Config;
use wayfarer_api::infrastructure::repositories::memory::{
    InMemoryBookingRepository, InMemoryReviewRepository, InMemoryTourRepository,
    InMemoryUserRepository,
};
use wayfarer_api::payments::webhook;
use wayfarer_api::payments::{CheckoutSession, PaymentError, PaymentGateway};

const TEST_WEBHOOK_SECRET: &str = "whsec-pipeline-test";

struct StubGateway;

#[async_trait::async_trait]
impl PaymentGateway for StubGateway {
    async fn create_checkout_session(
        &self,
        reference: Uuid,
        _tour_name: &str,
        _amount: Decimal,
        _customer_email: &str,
        _success_url: &str,
    ) -> Result<CheckoutSession, PaymentError> {
        Ok(CheckoutSession {
            id: format!("cs_test_{}", reference.simple()),
            url: "https://checkout.payments.example/session".to_string(),
        })
    }
}

fn setup_app(config: Config) -> Router {
    let tours = Arc::new(InMemoryTourRepository::new());
    let reviews = Arc::new(InMemoryReviewRepository::new(tours.clone()));
    let state = AppState::new(
        config,
        tours,
        Arc::new(InMemoryUserRepository::new()),
        reviews,
        Arc::new(InMemoryBookingRepository::new()),
        Arc::new(StubGateway),
    );
    build_app(state)
}

fn default_app() -> Router {
    setup_app(Config {
        webhook_secret: TEST_WEBHOOK_SECRET.to_string(),
        rate_limit_max: 10_000,
        ..Config::default()
    })
}

fn get_from(uri: &str, ip: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("x-forwarded-for", ip)
        .body(Body::empty())
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_unmatched_route_returns_404_error_object() {
    let app = default_app();

    let response = app
        .oneshot(get_from("/api/v1/nowhere", "203.0.113.1"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["status"], "fail");
    assert_eq!(body["message"], "Can't find /api/v1/nowhere on this server!");
}

#[tokio::test]
async fn test_security_headers_on_every_response() {
    let app = default_app();

    for uri in ["/", "/api/v1/tours", "/definitely-not-a-route"] {
        let response = app
            .clone()
            .oneshot(get_from(uri, "203.0.113.1"))
            .await
            .unwrap();
        let headers = response.headers();
        assert_eq!(
            headers.get("x-content-type-options").unwrap(),
            "nosniff",
            "missing on {}",
            uri
        );
        assert_eq!(headers.get("x-frame-options").unwrap(), "SAMEORIGIN");
        assert!(headers.contains_key("content-security-policy"));
        assert!(headers.contains_key("strict-transport-security"));
        assert!(headers.contains_key("referrer-policy"));
    }
}

#[tokio::test]
async fn test_api_body_cap_returns_413() {
    let app = default_app();

    let oversized = json!({
        "name": "Ada",
        "email": "ada@example.com",
        "password": "x".repeat(11 * 1024),
    });

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/users/signup")
                .header("x-forwarded-for", "203.0.113.1")
                .header("content-type", "application/json")
                .body(Body::from(oversized.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn test_webhook_accepts_bodies_above_api_cap() {
    let app = default_app();

    // 20 KiB of padding: over the API cap, under the webhook cap
    let event = json!({
        "type": "payment_intent.created",
        "data": { "object": { "id": "cs_big" } },
        "padding": "x".repeat(20 * 1024),
    })
    .to_string();
    let signature = webhook::sign(TEST_WEBHOOK_SECRET, event.as_bytes());

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/webhook-checkout")
                .header("content-type", "application/json")
                .header(webhook::SIGNATURE_HEADER, signature)
                .body(Body::from(event))
                .unwrap(),
        )
        .await
        .unwrap();

    // unrecognized event types are acknowledged and ignored
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["received"], true);
}

#[tokio::test]
async fn test_webhook_requires_signature() {
    let app = default_app();

    let event = json!({
        "type": "checkout.session.completed",
        "data": { "object": { "id": "cs_123" } }
    })
    .to_string();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/webhook-checkout")
                .header("content-type", "application/json")
                .body(Body::from(event))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["status"], "fail");
}

#[tokio::test]
async fn test_json_bodies_sanitized_before_handlers() {
    let app = default_app();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/users/signup")
                .header("x-forwarded-for", "203.0.113.1")
                .header("content-type", "application/json")
                .body(Body::from(
                    json!({
                        "name": "<script>alert('x')</script>Ada",
                        "email": "ada@example.com",
                        "password": "pass12345"
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    let name = body["user"]["name"].as_str().unwrap();
    assert!(!name.contains('<'));
    assert!(name.ends_with("Ada"));
}

#[tokio::test]
async fn test_duplicate_query_keys_collapse_to_last() {
    let app = default_app();

    // without the collapse this request would fail to deserialize
    let response = app
        .clone()
        .oneshot(get_from("/api/v1/tours?sort=price&sort=-price", "203.0.113.1"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // whitelisted range filters pass through untouched
    let response = app
        .clone()
        .oneshot(get_from(
            "/api/v1/tours?duration%5Bgte%5D=2&duration%5Blte%5D=9",
            "203.0.113.1",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_cors_allows_any_origin() {
    let app = default_app();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("OPTIONS")
                .uri("/api/v1/tours")
                .header("x-forwarded-for", "203.0.113.1")
                .header("origin", "https://example.com")
                .header("access-control-request-method", "GET")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .unwrap(),
        "*"
    );

    let mut request = get_from("/api/v1/tours", "203.0.113.1");
    request
        .headers_mut()
        .insert("origin", "https://example.com".parse().unwrap());
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .unwrap(),
        "*"
    );
}

#[tokio::test]
async fn test_responses_compressed_when_requested() {
    let app = default_app();

    let mut request = get_from("/", "203.0.113.1");
    request
        .headers_mut()
        .insert("accept-encoding", "gzip".parse().unwrap());

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get("content-encoding").unwrap(), "gzip");
}

#[tokio::test]
async fn test_api_rate_limit_per_client_ip() {
    // window of an hour, two requests: the third in a row must be rejected
    let app = setup_app(Config {
        rate_limit_max: 2,
        rate_limit_window_secs: 3600,
        ..Config::default()
    });

    for _ in 0..2 {
        let response = app
            .clone()
            .oneshot(get_from("/api/v1/tours", "198.51.100.1"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app
        .clone()
        .oneshot(get_from("/api/v1/tours", "198.51.100.1"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

    // a different client is unaffected
    let response = app
        .clone()
        .oneshot(get_from("/api/v1/tours", "198.51.100.2"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // routes outside /api are not rate limited
    let response = app
        .clone()
        .oneshot(get_from("/health", "198.51.100.1"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
