use axum::{
    http::{header, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use rust_embed::RustEmbed;

use crate::app::AppState;

// Compiled-in public assets; pages fetch their data from /api/v1
#[derive(RustEmbed)]
#[folder = "public/"]
struct PublicAssets;

/// View router mounted at /
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(overview))
        .route("/login", get(login_page))
        .route("/tour/:slug", get(tour_page))
        .route("/health", get(health_check))
        .route("/css/*path", get(serve_asset))
        .route("/js/*path", get(serve_asset))
        .route("/img/*path", get(serve_asset))
}

/// Health check endpoint
///
/// GET /health
pub async fn health_check() -> &'static str {
    "OK"
}

/// Tour overview page
///
/// GET /
pub async fn overview() -> Response {
    serve_embedded("index.html")
}

/// Login page
///
/// GET /login
pub async fn login_page() -> Response {
    serve_embedded("login.html")
}

/// Single tour page; the slug is resolved client-side against the API
///
/// GET /tour/:slug
pub async fn tour_page() -> Response {
    serve_embedded("tour.html")
}

/// Static asset lookup under css/, js/ and img/
pub async fn serve_asset(uri: Uri) -> Response {
    serve_embedded(uri.path().trim_start_matches('/'))
}

fn serve_embedded(path: &str) -> Response {
    match PublicAssets::get(path) {
        Some(content) => {
            let mime = mime_guess::from_path(path).first_or_octet_stream();
            ([(header::CONTENT_TYPE, mime.as_ref())], content.data).into_response()
        }
        None => (StatusCode::NOT_FOUND, "404 Not Found").into_response(),
    }
}
