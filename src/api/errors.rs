use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// API error type with HTTP status code and message
///
/// Every handler error converges here; `IntoResponse` is the single place
/// errors become HTTP responses. Client errors (4xx) serialize with
/// `"status": "fail"`, server errors (5xx) with `"status": "error"`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    /// Creates a new API error
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// Creates a 400 Bad Request error
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    /// Creates a 401 Unauthorized error
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    /// Creates a 403 Forbidden error
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    /// Creates a 404 Not Found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    /// Creates a 413 Payload Too Large error
    pub fn payload_too_large(message: impl Into<String>) -> Self {
        Self::new(StatusCode::PAYLOAD_TOO_LARGE, message)
    }

    /// Creates a 500 Internal Server Error
    pub fn internal_server_error(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    /// Classifies a repository error string into a client or server error
    ///
    /// Repositories flag duplicate-key violations with "duplicate" and
    /// missing rows with "not found"; anything else is a server fault.
    pub fn from_repo(message: String) -> Self {
        let lower = message.to_lowercase();
        if lower.contains("duplicate") || lower.contains("unique") {
            Self::bad_request(message)
        } else if lower.contains("not found") {
            Self::not_found(message)
        } else {
            Self::internal_server_error(message)
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(status = %self.status, message = %self.message, "request failed");
        }

        let status_word = if self.status.is_server_error() {
            "error"
        } else {
            "fail"
        };
        let body = Json(json!({
            "status": status_word,
            "message": self.message,
        }));

        (self.status, body).into_response()
    }
}

impl From<String> for ApiError {
    fn from(message: String) -> Self {
        Self::internal_server_error(message)
    }
}

impl From<&str> for ApiError {
    fn from(message: &str) -> Self {
        Self::internal_server_error(message)
    }
}
