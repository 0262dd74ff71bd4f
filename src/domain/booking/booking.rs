use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use super::value_objects::BookingStatus;

/// Booking aggregate root
///
/// A booking is created the moment a checkout session is opened with the
/// payment processor and stays `Pending` until the processor's webhook
/// confirms or voids the payment.
///
/// # Invariants
/// - Price must be positive
/// - Session id must not be empty
/// - Status transitions follow the `BookingStatus` matrix
#[derive(Debug, Clone)]
pub struct Booking {
    id: Uuid,
    tour_id: Uuid,
    user_id: Uuid,
    price: Decimal,
    session_id: String,
    status: BookingStatus,
    created_at: DateTime<Utc>,
    paid_at: Option<DateTime<Utc>>,
}

impl Booking {
    /// Creates a new pending booking tied to a checkout session
    pub fn new(
        tour_id: Uuid,
        user_id: Uuid,
        price: Decimal,
        session_id: String,
    ) -> Result<Self, String> {
        if price <= Decimal::ZERO {
            return Err("Booking price must be positive".to_string());
        }
        if session_id.is_empty() {
            return Err("Checkout session id cannot be empty".to_string());
        }

        Ok(Self {
            id: Uuid::new_v4(),
            tour_id,
            user_id,
            price,
            session_id,
            status: BookingStatus::Pending,
            created_at: Utc::now(),
            paid_at: None,
        })
    }

    /// Rehydrates a booking from storage without re-running creation rules
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        id: Uuid,
        tour_id: Uuid,
        user_id: Uuid,
        price: Decimal,
        session_id: String,
        status: BookingStatus,
        created_at: DateTime<Utc>,
        paid_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id,
            tour_id,
            user_id,
            price,
            session_id,
            status,
            created_at,
            paid_at,
        }
    }

    /// Marks the booking paid (transition Pending -> Paid)
    ///
    /// # Returns
    /// * `Err(String)` - If the booking is not pending
    pub fn mark_paid(&mut self) -> Result<(), String> {
        if !self.status.can_transition_to(BookingStatus::Paid) {
            return Err(format!("Cannot mark a {} booking paid", self.status));
        }
        self.status = BookingStatus::Paid;
        self.paid_at = Some(Utc::now());
        Ok(())
    }

    /// Cancels the booking (transition Pending -> Cancelled)
    pub fn cancel(&mut self) -> Result<(), String> {
        if !self.status.can_transition_to(BookingStatus::Cancelled) {
            return Err(format!("Cannot cancel a {} booking", self.status));
        }
        self.status = BookingStatus::Cancelled;
        Ok(())
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn tour_id(&self) -> Uuid {
        self.tour_id
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    pub fn price(&self) -> Decimal {
        self.price
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn status(&self) -> BookingStatus {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn paid_at(&self) -> Option<DateTime<Utc>> {
        self.paid_at
    }
}
