use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use axum_extra::extract::cookie::CookieJar;

use crate::api::errors::ApiError;
use crate::app::AppState;
use crate::auth::jwt::{verify_token, Claims};

/// Name of the session cookie carrying the JWT
pub const JWT_COOKIE: &str = "jwt";

/// JWT authentication extractor for protected routes
///
/// Accepts either an `Authorization: Bearer <token>` header or the `jwt`
/// session cookie set at login.
///
/// Usage:
/// ```ignore
/// async fn protected_handler(JwtAuth(claims): JwtAuth) -> Result<String, ApiError> {
///     Ok(format!("Hello user {}", claims.sub))
/// }
/// ```
pub struct JwtAuth(pub Claims);

#[async_trait]
impl FromRequestParts<AppState> for JwtAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = token_from_headers(&parts.headers).ok_or_else(|| {
            ApiError::unauthorized("You are not logged in. Please log in to get access.")
        })?;

        let claims = verify_token(&token, &state.config.jwt_secret)
            .map_err(|e| ApiError::unauthorized(format!("Invalid token: {}", e)))?;

        Ok(JwtAuth(claims))
    }
}

/// Authentication extractor for tour/booking management routes
///
/// Wraps [`JwtAuth`] and additionally requires an inventory-managing role
/// (admin or lead-guide).
pub struct StaffAuth(pub Claims);

#[async_trait]
impl FromRequestParts<AppState> for StaffAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let JwtAuth(claims) = JwtAuth::from_request_parts(parts, state).await?;

        if !claims.role.manages_inventory() {
            return Err(ApiError::forbidden(
                "You do not have permission to perform this action",
            ));
        }

        Ok(StaffAuth(claims))
    }
}

/// Pulls the JWT out of the Authorization header or the session cookie
fn token_from_headers(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.to_string());

    bearer.or_else(|| {
        CookieJar::from_headers(headers)
            .get(JWT_COOKIE)
            .map(|cookie| cookie.value().to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn bearer_header_wins_over_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        headers.insert(
            axum::http::header::COOKIE,
            HeaderValue::from_static("jwt=def"),
        );
        assert_eq!(token_from_headers(&headers).as_deref(), Some("abc"));
    }

    #[test]
    fn cookie_used_without_header() {
        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::COOKIE,
            HeaderValue::from_static("theme=dark; jwt=def"),
        );
        assert_eq!(token_from_headers(&headers).as_deref(), Some("def"));
    }

    #[test]
    fn malformed_authorization_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Token abc"));
        assert_eq!(token_from_headers(&headers), None);
    }
}
