use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::middleware::JwtAuth;
use crate::app::AppState;
use crate::auth::jwt::Claims;
use crate::domain::review::Review;
use crate::domain::user::value_objects::Role;

/// Router mounted at /api/v1/reviews
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_reviews).post(create_review))
        .route(
            "/:id",
            get(get_review).patch(update_review).delete(delete_review),
        )
}

/// Request body for creating a review on the top-level router
#[derive(Debug, Deserialize)]
pub struct CreateReviewRequest {
    pub tour_id: Uuid,
    pub text: String,
    pub rating: i32,
}

/// Request body for creating a review nested under a tour
#[derive(Debug, Deserialize)]
pub struct CreateNestedReviewRequest {
    pub text: String,
    pub rating: i32,
}

/// Request body for updating a review
#[derive(Debug, Deserialize)]
pub struct UpdateReviewRequest {
    pub text: Option<String>,
    pub rating: Option<i32>,
}

/// Review representation returned by the API
#[derive(Debug, Serialize)]
pub struct ReviewResponse {
    pub id: Uuid,
    pub tour_id: Uuid,
    pub author_id: Uuid,
    pub text: String,
    pub rating: i32,
    pub created_at: DateTime<Utc>,
}

impl From<&Review> for ReviewResponse {
    fn from(review: &Review) -> Self {
        Self {
            id: review.id,
            tour_id: review.tour_id,
            author_id: review.author_id,
            text: review.text.clone(),
            rating: review.rating,
            created_at: review.created_at,
        }
    }
}

/// List every review
///
/// GET /api/v1/reviews
pub async fn list_reviews(
    State(state): State<AppState>,
) -> Result<Json<Vec<ReviewResponse>>, ApiError> {
    let reviews = state.reviews.list().await.map_err(ApiError::from)?;
    Ok(Json(reviews.iter().map(ReviewResponse::from).collect()))
}

/// Get a single review by ID
///
/// GET /api/v1/reviews/:id
pub async fn get_review(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ReviewResponse>, ApiError> {
    let review = state
        .reviews
        .find_by_id(id)
        .await
        .map_err(ApiError::from)?
        .ok_or_else(|| ApiError::not_found(format!("Review not found: {}", id)))?;

    Ok(Json(ReviewResponse::from(&review)))
}

/// Create a review; the author is always the logged-in user
///
/// POST /api/v1/reviews
pub async fn create_review(
    JwtAuth(claims): JwtAuth,
    State(state): State<AppState>,
    Json(req): Json<CreateReviewRequest>,
) -> Result<(StatusCode, Json<ReviewResponse>), ApiError> {
    submit_review(&state, req.tour_id, claims.sub, req.text, req.rating).await
}

/// List reviews for one tour
///
/// GET /api/v1/tours/:id/reviews
pub async fn list_for_tour(
    State(state): State<AppState>,
    Path(tour_id): Path<Uuid>,
) -> Result<Json<Vec<ReviewResponse>>, ApiError> {
    let reviews = state
        .reviews
        .list_by_tour(tour_id)
        .await
        .map_err(ApiError::from)?;
    Ok(Json(reviews.iter().map(ReviewResponse::from).collect()))
}

/// Create a review nested under a tour
///
/// POST /api/v1/tours/:id/reviews
pub async fn create_for_tour(
    JwtAuth(claims): JwtAuth,
    State(state): State<AppState>,
    Path(tour_id): Path<Uuid>,
    Json(req): Json<CreateNestedReviewRequest>,
) -> Result<(StatusCode, Json<ReviewResponse>), ApiError> {
    submit_review(&state, tour_id, claims.sub, req.text, req.rating).await
}

async fn submit_review(
    state: &AppState,
    tour_id: Uuid,
    author_id: Uuid,
    text: String,
    rating: i32,
) -> Result<(StatusCode, Json<ReviewResponse>), ApiError> {
    state
        .tours
        .find_by_id(tour_id)
        .await
        .map_err(ApiError::from)?
        .ok_or_else(|| ApiError::not_found(format!("Tour not found: {}", tour_id)))?;

    let review = Review::new(tour_id, author_id, text, rating).map_err(ApiError::bad_request)?;

    state
        .reviews
        .create(&review)
        .await
        .map_err(ApiError::from_repo)?;

    Ok((StatusCode::CREATED, Json(ReviewResponse::from(&review))))
}

/// Update a review (author or admin only)
///
/// PATCH /api/v1/reviews/:id
pub async fn update_review(
    JwtAuth(claims): JwtAuth,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateReviewRequest>,
) -> Result<Json<ReviewResponse>, ApiError> {
    let mut review = state
        .reviews
        .find_by_id(id)
        .await
        .map_err(ApiError::from)?
        .ok_or_else(|| ApiError::not_found(format!("Review not found: {}", id)))?;

    authorize_author(&claims, &review)?;

    if let Some(text) = req.text {
        Review::validate_text(&text).map_err(ApiError::bad_request)?;
        review.text = text;
    }
    if let Some(rating) = req.rating {
        Review::validate_rating(rating).map_err(ApiError::bad_request)?;
        review.rating = rating;
    }

    state
        .reviews
        .update(&review)
        .await
        .map_err(ApiError::from_repo)?;

    Ok(Json(ReviewResponse::from(&review)))
}

/// Delete a review (author or admin only)
///
/// DELETE /api/v1/reviews/:id
pub async fn delete_review(
    JwtAuth(claims): JwtAuth,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let review = state
        .reviews
        .find_by_id(id)
        .await
        .map_err(ApiError::from)?
        .ok_or_else(|| ApiError::not_found(format!("Review not found: {}", id)))?;

    authorize_author(&claims, &review)?;

    state
        .reviews
        .delete(review.id)
        .await
        .map_err(ApiError::from_repo)?;

    Ok(StatusCode::NO_CONTENT)
}

fn authorize_author(claims: &Claims, review: &Review) -> Result<(), ApiError> {
    if claims.sub != review.author_id && claims.role != Role::Admin {
        return Err(ApiError::forbidden(
            "You can only modify your own reviews",
        ));
    }
    Ok(())
}
