use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use super::value_objects::Difficulty;

/// Tour catalog record
///
/// # Invariants
/// - Name is 10 to 40 characters
/// - Duration and group size are positive
/// - Price is positive; a discount must stay below the price
/// - Ratings average stays within 1.0 to 5.0
///
/// Tours flagged `secret` are excluded from public listings and aggregates.
#[derive(Debug, Clone)]
pub struct Tour {
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
    pub secret: bool,
    pub created_at: DateTime<Utc>,
}

impl Tour {
    /// Creates a new tour, enforcing all catalog invariants
    ///
    /// New tours start with the default 4.5 ratings average and zero ratings,
    /// matching how a tour looks before anyone has reviewed it.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: String,
        duration_days: i32,
        max_group_size: i32,
        difficulty: Difficulty,
        price: Decimal,
        price_discount: Option<Decimal>,
        summary: String,
        description: Option<String>,
        start_dates: Vec<DateTime<Utc>>,
    ) -> Result<Self, String> {
        let slug = slugify(&name);
        let tour = Self {
            id: Uuid::new_v4(),
            name,
            slug,
            duration_days,
            max_group_size,
            difficulty,
            ratings_average: 4.5,
            ratings_quantity: 0,
            price,
            price_discount,
            summary,
            description,
            image_cover: None,
            start_dates,
            secret: false,
            created_at: Utc::now(),
        };
        tour.validate()?;
        Ok(tour)
    }

    /// Checks every invariant; used on creation and after partial updates
    pub fn validate(&self) -> Result<(), String> {
        let name_len = self.name.chars().count();
        if !(10..=40).contains(&name_len) {
            return Err("Tour name must be between 10 and 40 characters".to_string());
        }
        if self.duration_days <= 0 {
            return Err("Duration must be positive".to_string());
        }
        if self.max_group_size <= 0 {
            return Err("Group size must be positive".to_string());
        }
        if self.price <= Decimal::ZERO {
            return Err("Price must be positive".to_string());
        }
        if let Some(discount) = self.price_discount {
            if discount <= Decimal::ZERO || discount >= self.price {
                return Err("Discount price must be below the regular price".to_string());
            }
        }
        if !(1.0..=5.0).contains(&self.ratings_average) {
            return Err("Ratings average must be between 1.0 and 5.0".to_string());
        }
        if self.summary.trim().is_empty() {
            return Err("Summary cannot be empty".to_string());
        }
        Ok(())
    }
}

/// Lowercases a tour name into a URL slug
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut prev_dash = false;
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch.to_ascii_lowercase());
            prev_dash = false;
        } else if !prev_dash && !slug.is_empty() {
            slug.push('-');
            prev_dash = true;
        }
    }
    if slug.ends_with('-') {
        slug.pop();
    }
    slug
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn valid_tour() -> Result<Tour, String> {
        Tour::new(
            "The Forest Hiker".to_string(),
            5,
            25,
            Difficulty::Easy,
            Decimal::new(397, 0),
            None,
            "Breathtaking hike through the Canadian Banff National Park".to_string(),
            None,
            vec![],
        )
    }

    #[test]
    fn valid_tour_accepted() {
        let tour = valid_tour().unwrap();
        assert_eq!(tour.slug, "the-forest-hiker");
        assert_eq!(tour.ratings_average, 4.5);
        assert_eq!(tour.ratings_quantity, 0);
        assert!(!tour.secret);
    }

    #[test]
    fn short_name_rejected() {
        let result = Tour::new(
            "Short".to_string(),
            5,
            25,
            Difficulty::Easy,
            Decimal::new(397, 0),
            None,
            "A summary".to_string(),
            None,
            vec![],
        );
        assert!(result.is_err());
    }

    #[test]
    fn discount_must_be_below_price() {
        let mut tour = valid_tour().unwrap();
        tour.price_discount = Some(Decimal::new(500, 0));
        assert!(tour.validate().is_err());

        tour.price_discount = Some(Decimal::new(100, 0));
        assert!(tour.validate().is_ok());
    }

    #[test]
    fn negative_duration_rejected() {
        let mut tour = valid_tour().unwrap();
        tour.duration_days = 0;
        assert!(tour.validate().is_err());
    }

    #[test]
    fn ratings_average_bounds_enforced() {
        let mut tour = valid_tour().unwrap();
        tour.ratings_average = 5.1;
        assert!(tour.validate().is_err());
        tour.ratings_average = 0.9;
        assert!(tour.validate().is_err());
        tour.ratings_average = 5.0;
        assert!(tour.validate().is_ok());
    }

    #[test]
    fn slugify_collapses_punctuation() {
        assert_eq!(slugify("The Snow  Adventurer!"), "the-snow-adventurer");
    }
}
