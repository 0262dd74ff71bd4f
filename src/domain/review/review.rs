use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Review left by a user on a tour
///
/// # Invariants
/// - Text is non-empty
/// - Rating is an integer from 1 to 5
/// - One review per (tour, author) pair, enforced by the repository
#[derive(Debug, Clone)]
pub struct Review {
    pub id: Uuid,
    pub tour_id: Uuid,
    pub author_id: Uuid,
    pub text: String,
    pub rating: i32,
    pub created_at: DateTime<Utc>,
}

impl Review {
    /// Creates a new review for a tour
    pub fn new(tour_id: Uuid, author_id: Uuid, text: String, rating: i32) -> Result<Self, String> {
        Self::validate_text(&text)?;
        Self::validate_rating(rating)?;

        Ok(Self {
            id: Uuid::new_v4(),
            tour_id,
            author_id,
            text,
            rating,
            created_at: Utc::now(),
        })
    }

    pub fn validate_text(text: &str) -> Result<(), String> {
        if text.trim().is_empty() {
            return Err("Review text cannot be empty".to_string());
        }
        Ok(())
    }

    pub fn validate_rating(rating: i32) -> Result<(), String> {
        if !(1..=5).contains(&rating) {
            return Err("Rating must be between 1 and 5".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_review_accepted() {
        let review = Review::new(Uuid::new_v4(), Uuid::new_v4(), "Great trip".to_string(), 5);
        assert!(review.is_ok());
    }

    #[test]
    fn empty_text_rejected() {
        let review = Review::new(Uuid::new_v4(), Uuid::new_v4(), "   ".to_string(), 4);
        assert!(review.is_err());
    }

    #[test]
    fn rating_out_of_range_rejected() {
        assert!(Review::new(Uuid::new_v4(), Uuid::new_v4(), "ok".to_string(), 0).is_err());
        assert!(Review::new(Uuid::new_v4(), Uuid::new_v4(), "ok".to_string(), 6).is_err());
    }
}
