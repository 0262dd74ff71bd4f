use serde::{Deserialize, Serialize};

/// Represents the payment lifecycle of a booking
///
/// # Status Transitions
/// ```text
/// Pending -> Paid
///      └---> Cancelled
/// ```
///
/// Paid and Cancelled are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    /// Checkout session created, payment not yet confirmed
    Pending,
    /// Payment confirmed by the processor webhook
    Paid,
    /// Checkout abandoned or voided
    Cancelled,
}

impl BookingStatus {
    /// Checks if a transition from the current status to `next` is valid
    pub fn can_transition_to(&self, next: BookingStatus) -> bool {
        use BookingStatus::*;
        matches!((self, next), (Pending, Paid) | (Pending, Cancelled))
    }

    /// Parses a status from its wire representation
    pub fn parse(s: &str) -> Result<Self, String> {
        match s {
            "pending" => Ok(BookingStatus::Pending),
            "paid" => Ok(BookingStatus::Paid),
            "cancelled" => Ok(BookingStatus::Cancelled),
            other => Err(format!("Unknown booking status: {}", other)),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Paid => "paid",
            BookingStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
