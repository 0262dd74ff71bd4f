use async_trait::async_trait;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::tour::value_objects::Difficulty;
use crate::domain::tour::Tour;

/// Sortable columns for tour listings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Price,
    RatingsAverage,
    Duration,
    CreatedAt,
}

/// Query features for tour listings: filtering, sorting, pagination
///
/// The defaults match an unfiltered first page.
#[derive(Debug, Clone)]
pub struct TourFilter {
    pub difficulty: Option<Difficulty>,
    pub price_gte: Option<Decimal>,
    pub price_lte: Option<Decimal>,
    pub duration_gte: Option<i32>,
    pub duration_lte: Option<i32>,
    pub ratings_gte: Option<f64>,
    pub sort: Option<(SortKey, bool)>,
    pub page: u32,
    pub limit: u32,
}

impl Default for TourFilter {
    fn default() -> Self {
        Self {
            difficulty: None,
            price_gte: None,
            price_lte: None,
            duration_gte: None,
            duration_lte: None,
            ratings_gte: None,
            sort: None,
            page: 1,
            limit: 100,
        }
    }
}

impl TourFilter {
    /// Preset behind the `top-5-cheap` listing alias: the five cheapest
    /// tours, best rated first among equals
    pub fn top_five_cheap() -> Self {
        Self {
            sort: Some((SortKey::Price, false)),
            limit: 5,
            ..Self::default()
        }
    }

    pub fn offset(&self) -> u32 {
        self.page.saturating_sub(1) * self.limit
    }
}

/// Per-difficulty aggregate over the public catalog
#[derive(Debug, Clone)]
pub struct TourStats {
    pub difficulty: Difficulty,
    pub num_tours: i64,
    pub avg_rating: f64,
    pub avg_price: Decimal,
    pub min_price: Decimal,
    pub max_price: Decimal,
}

/// Repository trait for the Tour aggregate
#[async_trait]
pub trait TourRepository: Send + Sync {
    /// Insert a new tour
    async fn create(&self, tour: &Tour) -> Result<(), String>;

    /// Find a tour by its ID (secret tours included)
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Tour>, String>;

    /// List public tours matching the filter
    async fn list(&self, filter: &TourFilter) -> Result<Vec<Tour>, String>;

    /// Persist changes to an existing tour
    async fn update(&self, tour: &Tour) -> Result<(), String>;

    /// Delete a tour by ID
    async fn delete(&self, id: Uuid) -> Result<(), String>;

    /// Aggregate rating/price statistics per difficulty, secret tours excluded
    async fn stats(&self) -> Result<Vec<TourStats>, String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_starts_at_zero() {
        let filter = TourFilter::default();
        assert_eq!(filter.offset(), 0);
    }

    #[test]
    fn offset_advances_by_limit() {
        let filter = TourFilter {
            page: 3,
            limit: 10,
            ..TourFilter::default()
        };
        assert_eq!(filter.offset(), 20);
    }

    #[test]
    fn top_five_cheap_sorts_by_price_ascending() {
        let filter = TourFilter::top_five_cheap();
        assert_eq!(filter.sort, Some((SortKey::Price, false)));
        assert_eq!(filter.limit, 5);
    }
}
