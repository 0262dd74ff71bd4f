use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::booking::Booking;

/// Repository trait for the Booking aggregate
#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Save a booking (insert or update)
    async fn save(&self, booking: &Booking) -> Result<(), String>;

    /// Find a booking by its ID
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Booking>, String>;

    /// Find the booking tied to a checkout session
    async fn find_by_session(&self, session_id: &str) -> Result<Option<Booking>, String>;

    /// List every booking
    async fn list(&self) -> Result<Vec<Booking>, String>;

    /// List bookings made by one user
    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Booking>, String>;

    /// Delete a booking by ID
    async fn delete(&self, id: Uuid) -> Result<(), String>;
}
