use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::middleware::{JwtAuth, StaffAuth};
use crate::app::AppState;
use crate::domain::booking::value_objects::BookingStatus;
use crate::domain::booking::Booking;
use crate::payments::webhook::{self, WebhookEvent};

/// Router mounted at /api/v1/bookings
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_bookings))
        .route("/my", get(my_bookings))
        .route("/checkout-session/:tour_id", get(checkout_session))
        .route("/:id", get(get_booking).delete(delete_booking))
}

/// Booking representation returned by the API
#[derive(Debug, Serialize)]
pub struct BookingResponse {
    pub id: Uuid,
    pub tour_id: Uuid,
    pub user_id: Uuid,
    pub price: Decimal,
    pub session_id: String,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
    pub paid_at: Option<DateTime<Utc>>,
}

impl From<&Booking> for BookingResponse {
    fn from(booking: &Booking) -> Self {
        Self {
            id: booking.id(),
            tour_id: booking.tour_id(),
            user_id: booking.user_id(),
            price: booking.price(),
            session_id: booking.session_id().to_string(),
            status: booking.status(),
            created_at: booking.created_at(),
            paid_at: booking.paid_at(),
        }
    }
}

/// Response for a freshly opened checkout session
#[derive(Debug, Serialize)]
pub struct CheckoutSessionResponse {
    pub booking_id: Uuid,
    pub session_id: String,
    pub checkout_url: String,
}

/// Opens a checkout session for a tour and records a pending booking
///
/// GET /api/v1/bookings/checkout-session/:tour_id
pub async fn checkout_session(
    JwtAuth(claims): JwtAuth,
    State(state): State<AppState>,
    Path(tour_id): Path<Uuid>,
) -> Result<(StatusCode, Json<CheckoutSessionResponse>), ApiError> {
    let tour = state
        .tours
        .find_by_id(tour_id)
        .await
        .map_err(ApiError::from)?
        .ok_or_else(|| ApiError::not_found(format!("Tour not found: {}", tour_id)))?;

    let user = state
        .users
        .find_by_id(claims.sub)
        .await
        .map_err(ApiError::from)?
        .filter(|user| user.active)
        .ok_or_else(|| {
            ApiError::unauthorized("The user belonging to this token no longer exists")
        })?;

    let price = tour.price_discount.unwrap_or(tour.price);

    let session = state
        .payments
        .create_checkout_session(
            tour.id,
            &tour.name,
            price,
            user.email.as_str(),
            &state.config.checkout_success_url,
        )
        .await
        .map_err(|e| ApiError::internal_server_error(e.to_string()))?;

    let booking =
        Booking::new(tour.id, user.id, price, session.id.clone()).map_err(ApiError::from)?;

    state
        .bookings
        .save(&booking)
        .await
        .map_err(ApiError::from)?;

    Ok((
        StatusCode::CREATED,
        Json(CheckoutSessionResponse {
            booking_id: booking.id(),
            session_id: session.id,
            checkout_url: session.url,
        }),
    ))
}

/// The logged-in user's bookings
///
/// GET /api/v1/bookings/my
pub async fn my_bookings(
    JwtAuth(claims): JwtAuth,
    State(state): State<AppState>,
) -> Result<Json<Vec<BookingResponse>>, ApiError> {
    let bookings = state
        .bookings
        .list_by_user(claims.sub)
        .await
        .map_err(ApiError::from)?;
    Ok(Json(bookings.iter().map(BookingResponse::from).collect()))
}

/// List every booking (admin and lead-guide only)
///
/// GET /api/v1/bookings
pub async fn list_bookings(
    StaffAuth(_claims): StaffAuth,
    State(state): State<AppState>,
) -> Result<Json<Vec<BookingResponse>>, ApiError> {
    let bookings = state.bookings.list().await.map_err(ApiError::from)?;
    Ok(Json(bookings.iter().map(BookingResponse::from).collect()))
}

/// Get one booking (admin and lead-guide only)
///
/// GET /api/v1/bookings/:id
pub async fn get_booking(
    StaffAuth(_claims): StaffAuth,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<BookingResponse>, ApiError> {
    let booking = state
        .bookings
        .find_by_id(id)
        .await
        .map_err(ApiError::from)?
        .ok_or_else(|| ApiError::not_found(format!("Booking not found: {}", id)))?;

    Ok(Json(BookingResponse::from(&booking)))
}

/// Delete a booking (admin and lead-guide only)
///
/// DELETE /api/v1/bookings/:id
pub async fn delete_booking(
    StaffAuth(_claims): StaffAuth,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state
        .bookings
        .delete(id)
        .await
        .map_err(ApiError::from_repo)?;

    Ok(StatusCode::NO_CONTENT)
}

/// Acknowledgement returned to the payment processor
#[derive(Debug, Serialize)]
pub struct WebhookAck {
    pub received: bool,
}

/// Payment processor callback, mounted at /webhook-checkout
///
/// Reads the raw body: the HMAC signature covers the exact bytes sent, so
/// this route must not share the API's JSON parsing or sanitization.
/// Redelivery of an already-processed event acknowledges without touching
/// the booking.
pub async fn webhook_checkout(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookAck>, ApiError> {
    let signature = headers
        .get(webhook::SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| ApiError::bad_request("Missing webhook signature"))?;

    if !webhook::verify_signature(&state.config.webhook_secret, &body, signature) {
        return Err(ApiError::bad_request(
            "Webhook signature verification failed",
        ));
    }

    let event: WebhookEvent = serde_json::from_slice(&body)
        .map_err(|e| ApiError::bad_request(format!("Malformed webhook payload: {}", e)))?;

    if event.event_type != webhook::CHECKOUT_COMPLETED {
        tracing::debug!(event_type = %event.event_type, "ignoring webhook event");
        return Ok(Json(WebhookAck { received: true }));
    }

    let session_id = event.data.object.id;
    let mut booking = state
        .bookings
        .find_by_session(&session_id)
        .await
        .map_err(ApiError::from)?
        .ok_or_else(|| {
            ApiError::not_found(format!("No booking for checkout session: {}", session_id))
        })?;

    if booking.status() == BookingStatus::Paid {
        return Ok(Json(WebhookAck { received: true }));
    }

    booking.mark_paid().map_err(ApiError::bad_request)?;

    state
        .bookings
        .save(&booking)
        .await
        .map_err(ApiError::from)?;

    tracing::info!(booking_id = %booking.id(), %session_id, "booking paid");

    Ok(Json(WebhookAck { received: true }))
}
