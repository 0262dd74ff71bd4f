use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::review::Review;

/// Repository trait for reviews
///
/// Creating or deleting a review also refreshes the owning tour's
/// `ratings_average` and `ratings_quantity` so listings never show stale
/// aggregates.
#[async_trait]
pub trait ReviewRepository: Send + Sync {
    /// Insert a new review; duplicate (tour, author) pairs are rejected with
    /// a message containing "duplicate"
    async fn create(&self, review: &Review) -> Result<(), String>;

    /// Find a review by ID
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Review>, String>;

    /// List every review
    async fn list(&self) -> Result<Vec<Review>, String>;

    /// List reviews for one tour, newest first
    async fn list_by_tour(&self, tour_id: Uuid) -> Result<Vec<Review>, String>;

    /// Persist changes to an existing review
    async fn update(&self, review: &Review) -> Result<(), String>;

    /// Delete a review by ID
    async fn delete(&self, id: Uuid) -> Result<(), String>;
}
