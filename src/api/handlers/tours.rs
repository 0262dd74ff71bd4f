use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::handlers::reviews;
use crate::api::middleware::StaffAuth;
use crate::app::AppState;
use crate::domain::repositories::tour_repository::{SortKey, TourFilter, TourStats};
use crate::domain::tour::value_objects::Difficulty;
use crate::domain::tour::{tour::slugify, Tour};

/// Router mounted at /api/v1/tours
///
/// Reviews are reachable nested under their tour as well as from the
/// top-level review router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_tours).post(create_tour))
        .route("/top-5-cheap", get(top_tours))
        .route("/stats", get(tour_stats))
        .route(
            "/:id",
            get(get_tour).patch(update_tour).delete(delete_tour),
        )
        .route(
            "/:id/reviews",
            get(reviews::list_for_tour).post(reviews::create_for_tour),
        )
}

/// Query features for GET /api/v1/tours
///
/// Range filters use the `field[op]` key convention, e.g.
/// `?difficulty=easy&price[lte]=500&sort=-ratingsAverage`.
#[derive(Debug, Default, Deserialize)]
pub struct TourListQuery {
    pub difficulty: Option<Difficulty>,
    #[serde(rename = "price[gte]")]
    pub price_gte: Option<Decimal>,
    #[serde(rename = "price[lte]")]
    pub price_lte: Option<Decimal>,
    #[serde(rename = "duration[gte]")]
    pub duration_gte: Option<i32>,
    #[serde(rename = "duration[lte]")]
    pub duration_lte: Option<i32>,
    #[serde(rename = "ratingsAverage[gte]")]
    pub ratings_gte: Option<f64>,
    pub sort: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl TourListQuery {
    fn into_filter(self) -> Result<TourFilter, ApiError> {
        let sort = match self.sort.as_deref() {
            None => None,
            Some(raw) => {
                let (key, descending) = match raw.strip_prefix('-') {
                    Some(rest) => (rest, true),
                    None => (raw, false),
                };
                let key = match key {
                    "price" => SortKey::Price,
                    "ratingsAverage" => SortKey::RatingsAverage,
                    "duration" => SortKey::Duration,
                    "createdAt" => SortKey::CreatedAt,
                    other => {
                        return Err(ApiError::bad_request(format!("Cannot sort by: {}", other)))
                    }
                };
                Some((key, descending))
            }
        };

        let page = self.page.unwrap_or(1).max(1);
        let limit = self.limit.unwrap_or(100).clamp(1, 100);

        Ok(TourFilter {
            difficulty: self.difficulty,
            price_gte: self.price_gte,
            price_lte: self.price_lte,
            duration_gte: self.duration_gte,
            duration_lte: self.duration_lte,
            ratings_gte: self.ratings_gte,
            sort,
            page,
            limit,
        })
    }
}

/// Request body for creating a tour
#[derive(Debug, Deserialize)]
pub struct CreateTourRequest {
    pub name: String,
    pub duration_days: i32,
    pub max_group_size: i32,
    pub difficulty: Difficulty,
    pub price: Decimal,
    pub price_discount: Option<Decimal>,
    pub summary: String,
    pub description: Option<String>,
    #[serde(default)]
    pub start_dates: Vec<DateTime<Utc>>,
}

/// Request body for partially updating a tour
#[derive(Debug, Deserialize)]
pub struct UpdateTourRequest {
    pub name: Option<String>,
    pub duration_days: Option<i32>,
    pub max_group_size: Option<i32>,
    pub difficulty: Option<Difficulty>,
    pub price: Option<Decimal>,
    pub price_discount: Option<Option<Decimal>>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub image_cover: Option<String>,
    pub start_dates: Option<Vec<DateTime<Utc>>>,
    pub secret: Option<bool>,
}

/// Tour representation returned by the API
#[derive(Debug, Serialize)]
pub struct TourResponse {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub duration_days: i32,
    pub max_group_size: i32,
    pub difficulty: Difficulty,
    pub ratings_average: f64,
    pub ratings_quantity: i32,
    pub price: Decimal,
    pub price_discount: Option<Decimal>,
    pub summary: String,
    pub description: Option<String>,
    pub image_cover: Option<String>,
    pub start_dates: Vec<DateTime<Utc>>,
}

impl From<&Tour> for TourResponse {
    fn from(tour: &Tour) -> Self {
        Self {
            id: tour.id,
            name: tour.name.clone(),
            slug: tour.slug.clone(),
            duration_days: tour.duration_days,
            max_group_size: tour.max_group_size,
            difficulty: tour.difficulty,
            ratings_average: tour.ratings_average,
            ratings_quantity: tour.ratings_quantity,
            price: tour.price,
            price_discount: tour.price_discount,
            summary: tour.summary.clone(),
            description: tour.description.clone(),
            image_cover: tour.image_cover.clone(),
            start_dates: tour.start_dates.clone(),
        }
    }
}

/// List public tours with filtering, sorting and pagination
///
/// GET /api/v1/tours
pub async fn list_tours(
    State(state): State<AppState>,
    Query(query): Query<TourListQuery>,
) -> Result<Json<Vec<TourResponse>>, ApiError> {
    let filter = query.into_filter()?;
    let tours = state.tours.list(&filter).await.map_err(ApiError::from)?;
    Ok(Json(tours.iter().map(TourResponse::from).collect()))
}

/// The five cheapest tours, best rated first among equals
///
/// GET /api/v1/tours/top-5-cheap
pub async fn top_tours(
    State(state): State<AppState>,
) -> Result<Json<Vec<TourResponse>>, ApiError> {
    let tours = state
        .tours
        .list(&TourFilter::top_five_cheap())
        .await
        .map_err(ApiError::from)?;
    Ok(Json(tours.iter().map(TourResponse::from).collect()))
}

/// Per-difficulty aggregate over the public catalog
#[derive(Debug, Serialize)]
pub struct TourStatsResponse {
    pub difficulty: Difficulty,
    pub num_tours: i64,
    pub avg_rating: f64,
    pub avg_price: Decimal,
    pub min_price: Decimal,
    pub max_price: Decimal,
}

impl From<TourStats> for TourStatsResponse {
    fn from(stats: TourStats) -> Self {
        Self {
            difficulty: stats.difficulty,
            num_tours: stats.num_tours,
            avg_rating: stats.avg_rating,
            avg_price: stats.avg_price,
            min_price: stats.min_price,
            max_price: stats.max_price,
        }
    }
}

/// Rating and price statistics grouped by difficulty
///
/// GET /api/v1/tours/stats
pub async fn tour_stats(
    State(state): State<AppState>,
) -> Result<Json<Vec<TourStatsResponse>>, ApiError> {
    let stats = state.tours.stats().await.map_err(ApiError::from)?;
    Ok(Json(stats.into_iter().map(TourStatsResponse::from).collect()))
}

/// Get a single tour by ID
///
/// GET /api/v1/tours/:id
pub async fn get_tour(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<TourResponse>, ApiError> {
    let tour = state
        .tours
        .find_by_id(id)
        .await
        .map_err(ApiError::from)?
        .ok_or_else(|| ApiError::not_found(format!("Tour not found: {}", id)))?;

    Ok(Json(TourResponse::from(&tour)))
}

/// Create a new tour (admin and lead-guide only)
///
/// POST /api/v1/tours
pub async fn create_tour(
    StaffAuth(_claims): StaffAuth,
    State(state): State<AppState>,
    Json(req): Json<CreateTourRequest>,
) -> Result<(StatusCode, Json<TourResponse>), ApiError> {
    let tour = Tour::new(
        req.name,
        req.duration_days,
        req.max_group_size,
        req.difficulty,
        req.price,
        req.price_discount,
        req.summary,
        req.description,
        req.start_dates,
    )
    .map_err(ApiError::bad_request)?;

    state
        .tours
        .create(&tour)
        .await
        .map_err(ApiError::from_repo)?;

    Ok((StatusCode::CREATED, Json(TourResponse::from(&tour))))
}

/// Partially update a tour (admin and lead-guide only)
///
/// PATCH /api/v1/tours/:id
pub async fn update_tour(
    StaffAuth(_claims): StaffAuth,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateTourRequest>,
) -> Result<Json<TourResponse>, ApiError> {
    let mut tour = state
        .tours
        .find_by_id(id)
        .await
        .map_err(ApiError::from)?
        .ok_or_else(|| ApiError::not_found(format!("Tour not found: {}", id)))?;

    if let Some(name) = req.name {
        tour.slug = slugify(&name);
        tour.name = name;
    }
    if let Some(duration_days) = req.duration_days {
        tour.duration_days = duration_days;
    }
    if let Some(max_group_size) = req.max_group_size {
        tour.max_group_size = max_group_size;
    }
    if let Some(difficulty) = req.difficulty {
        tour.difficulty = difficulty;
    }
    if let Some(price) = req.price {
        tour.price = price;
    }
    if let Some(price_discount) = req.price_discount {
        tour.price_discount = price_discount;
    }
    if let Some(summary) = req.summary {
        tour.summary = summary;
    }
    if let Some(description) = req.description {
        tour.description = Some(description);
    }
    if let Some(image_cover) = req.image_cover {
        tour.image_cover = Some(image_cover);
    }
    if let Some(start_dates) = req.start_dates {
        tour.start_dates = start_dates;
    }
    if let Some(secret) = req.secret {
        tour.secret = secret;
    }

    tour.validate().map_err(ApiError::bad_request)?;

    state
        .tours
        .update(&tour)
        .await
        .map_err(ApiError::from_repo)?;

    Ok(Json(TourResponse::from(&tour)))
}

/// Delete a tour (admin and lead-guide only)
///
/// DELETE /api/v1/tours/:id
pub async fn delete_tour(
    StaffAuth(_claims): StaffAuth,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state
        .tours
        .delete(id)
        .await
        .map_err(ApiError::from_repo)?;

    Ok(StatusCode::NO_CONTENT)
}
