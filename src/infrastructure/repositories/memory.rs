//! In-memory repository implementations
//!
//! Back the black-box test suite (and local experiments) so the full HTTP
//! pipeline can run without PostgreSQL. Behavior mirrors the Postgres
//! adapters, including duplicate detection and rating-aggregate refresh.

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use uuid::Uuid;

use crate::domain::booking::Booking;
use crate::domain::repositories::tour_repository::{SortKey, TourFilter, TourStats};
use crate::domain::repositories::{
    BookingRepository, ReviewRepository, TourRepository, UserRepository,
};
use crate::domain::review::Review;
use crate::domain::tour::value_objects::Difficulty;
use crate::domain::tour::Tour;
use crate::domain::user::value_objects::Email;
use crate::domain::user::User;

fn poisoned<T>(_: T) -> String {
    "store lock poisoned".to_string()
}

/// In-memory TourRepository
#[derive(Default)]
pub struct InMemoryTourRepository {
    tours: RwLock<HashMap<Uuid, Tour>>,
}

impl InMemoryTourRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TourRepository for InMemoryTourRepository {
    async fn create(&self, tour: &Tour) -> Result<(), String> {
        let mut tours = self.tours.write().map_err(poisoned)?;
        if tours.values().any(|t| t.name == tour.name) {
            return Err(format!("duplicate tour name: {}", tour.name));
        }
        tours.insert(tour.id, tour.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Tour>, String> {
        Ok(self.tours.read().map_err(poisoned)?.get(&id).cloned())
    }

    async fn list(&self, filter: &TourFilter) -> Result<Vec<Tour>, String> {
        let tours = self.tours.read().map_err(poisoned)?;
        let mut matched: Vec<Tour> = tours
            .values()
            .filter(|t| !t.secret)
            .filter(|t| filter.difficulty.map_or(true, |d| t.difficulty == d))
            .filter(|t| filter.price_gte.map_or(true, |p| t.price >= p))
            .filter(|t| filter.price_lte.map_or(true, |p| t.price <= p))
            .filter(|t| filter.duration_gte.map_or(true, |d| t.duration_days >= d))
            .filter(|t| filter.duration_lte.map_or(true, |d| t.duration_days <= d))
            .filter(|t| filter.ratings_gte.map_or(true, |r| t.ratings_average >= r))
            .cloned()
            .collect();

        matched.sort_by(|a, b| match filter.sort {
            Some((key, descending)) => {
                let ordering = compare_by(a, b, key);
                let ordering = if descending {
                    ordering.reverse()
                } else {
                    ordering
                };
                ordering.then(compare_by(a, b, SortKey::RatingsAverage).reverse())
            }
            None => b.created_at.cmp(&a.created_at),
        });

        Ok(matched
            .into_iter()
            .skip(filter.offset() as usize)
            .take(filter.limit as usize)
            .collect())
    }

    async fn update(&self, tour: &Tour) -> Result<(), String> {
        let mut tours = self.tours.write().map_err(poisoned)?;
        if !tours.contains_key(&tour.id) {
            return Err(format!("Tour not found: {}", tour.id));
        }
        tours.insert(tour.id, tour.clone());
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<(), String> {
        let mut tours = self.tours.write().map_err(poisoned)?;
        if tours.remove(&id).is_none() {
            return Err(format!("Tour not found: {}", id));
        }
        Ok(())
    }

    async fn stats(&self) -> Result<Vec<TourStats>, String> {
        let tours = self.tours.read().map_err(poisoned)?;
        let mut groups: HashMap<&'static str, Vec<&Tour>> = HashMap::new();
        for tour in tours.values().filter(|t| !t.secret) {
            groups.entry(tour.difficulty.as_str()).or_default().push(tour);
        }

        let mut stats: Vec<TourStats> = groups
            .into_iter()
            .map(|(difficulty, group)| {
                let count = group.len() as i64;
                let price_sum: Decimal = group.iter().map(|t| t.price).sum();
                let rating_sum: f64 = group.iter().map(|t| t.ratings_average).sum();
                TourStats {
                    difficulty: Difficulty::parse(difficulty).expect("difficulty came from as_str"),
                    num_tours: count,
                    avg_rating: rating_sum / count as f64,
                    avg_price: price_sum / Decimal::from(count),
                    min_price: group.iter().map(|t| t.price).min().unwrap_or_default(),
                    max_price: group.iter().map(|t| t.price).max().unwrap_or_default(),
                }
            })
            .collect();

        stats.sort_by(|a, b| a.avg_price.cmp(&b.avg_price));
        Ok(stats)
    }
}

fn compare_by(a: &Tour, b: &Tour, key: SortKey) -> Ordering {
    match key {
        SortKey::Price => a.price.cmp(&b.price),
        SortKey::RatingsAverage => a
            .ratings_average
            .partial_cmp(&b.ratings_average)
            .unwrap_or(Ordering::Equal),
        SortKey::Duration => a.duration_days.cmp(&b.duration_days),
        SortKey::CreatedAt => a.created_at.cmp(&b.created_at),
    }
}

/// In-memory UserRepository
#[derive(Default)]
pub struct InMemoryUserRepository {
    users: RwLock<HashMap<Uuid, User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, user: &User) -> Result<(), String> {
        let mut users = self.users.write().map_err(poisoned)?;
        if users.values().any(|u| u.email == user.email) {
            return Err(format!("duplicate email: {}", user.email));
        }
        users.insert(user.id, user.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, String> {
        Ok(self.users.read().map_err(poisoned)?.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &Email) -> Result<Option<User>, String> {
        Ok(self
            .users
            .read()
            .map_err(poisoned)?
            .values()
            .find(|u| &u.email == email)
            .cloned())
    }

    async fn list(&self) -> Result<Vec<User>, String> {
        let users = self.users.read().map_err(poisoned)?;
        let mut all: Vec<User> = users.values().cloned().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(all)
    }

    async fn update(&self, user: &User) -> Result<(), String> {
        let mut users = self.users.write().map_err(poisoned)?;
        if !users.contains_key(&user.id) {
            return Err(format!("User not found: {}", user.id));
        }
        users.insert(user.id, user.clone());
        Ok(())
    }

    async fn deactivate(&self, id: Uuid) -> Result<(), String> {
        let mut users = self.users.write().map_err(poisoned)?;
        match users.get_mut(&id) {
            Some(user) => {
                user.active = false;
                Ok(())
            }
            None => Err(format!("User not found: {}", id)),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<(), String> {
        let mut users = self.users.write().map_err(poisoned)?;
        if users.remove(&id).is_none() {
            return Err(format!("User not found: {}", id));
        }
        Ok(())
    }
}

/// In-memory ReviewRepository
///
/// Holds a handle to the tour store so rating aggregates stay in sync, the
/// way the Postgres adapter refreshes them in one transaction.
pub struct InMemoryReviewRepository {
    reviews: RwLock<Vec<Review>>,
    tours: Arc<InMemoryTourRepository>,
}

impl InMemoryReviewRepository {
    pub fn new(tours: Arc<InMemoryTourRepository>) -> Self {
        Self {
            reviews: RwLock::new(Vec::new()),
            tours,
        }
    }

    fn refresh_tour_ratings(&self, tour_id: Uuid, reviews: &[Review]) -> Result<(), String> {
        let ratings: Vec<i32> = reviews
            .iter()
            .filter(|r| r.tour_id == tour_id)
            .map(|r| r.rating)
            .collect();

        let mut tours = self.tours.tours.write().map_err(poisoned)?;
        if let Some(tour) = tours.get_mut(&tour_id) {
            tour.ratings_quantity = ratings.len() as i32;
            tour.ratings_average = if ratings.is_empty() {
                4.5
            } else {
                f64::from(ratings.iter().sum::<i32>()) / ratings.len() as f64
            };
        }
        Ok(())
    }
}

#[async_trait]
impl ReviewRepository for InMemoryReviewRepository {
    async fn create(&self, review: &Review) -> Result<(), String> {
        let mut reviews = self.reviews.write().map_err(poisoned)?;
        if reviews
            .iter()
            .any(|r| r.tour_id == review.tour_id && r.author_id == review.author_id)
        {
            return Err("duplicate review for this tour".to_string());
        }
        reviews.push(review.clone());
        self.refresh_tour_ratings(review.tour_id, &reviews)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Review>, String> {
        Ok(self
            .reviews
            .read()
            .map_err(poisoned)?
            .iter()
            .find(|r| r.id == id)
            .cloned())
    }

    async fn list(&self) -> Result<Vec<Review>, String> {
        let mut all = self.reviews.read().map_err(poisoned)?.clone();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(all)
    }

    async fn list_by_tour(&self, tour_id: Uuid) -> Result<Vec<Review>, String> {
        let mut matched: Vec<Review> = self
            .reviews
            .read()
            .map_err(poisoned)?
            .iter()
            .filter(|r| r.tour_id == tour_id)
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(matched)
    }

    async fn update(&self, review: &Review) -> Result<(), String> {
        let mut reviews = self.reviews.write().map_err(poisoned)?;
        let Some(existing) = reviews.iter_mut().find(|r| r.id == review.id) else {
            return Err(format!("Review not found: {}", review.id));
        };
        existing.text = review.text.clone();
        existing.rating = review.rating;
        let tour_id = existing.tour_id;
        self.refresh_tour_ratings(tour_id, &reviews)
    }

    async fn delete(&self, id: Uuid) -> Result<(), String> {
        let mut reviews = self.reviews.write().map_err(poisoned)?;
        let Some(index) = reviews.iter().position(|r| r.id == id) else {
            return Err(format!("Review not found: {}", id));
        };
        let removed = reviews.remove(index);
        self.refresh_tour_ratings(removed.tour_id, &reviews)
    }
}

/// In-memory BookingRepository
#[derive(Default)]
pub struct InMemoryBookingRepository {
    bookings: RwLock<HashMap<Uuid, Booking>>,
}

impl InMemoryBookingRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BookingRepository for InMemoryBookingRepository {
    async fn save(&self, booking: &Booking) -> Result<(), String> {
        self.bookings
            .write()
            .map_err(poisoned)?
            .insert(booking.id(), booking.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Booking>, String> {
        Ok(self.bookings.read().map_err(poisoned)?.get(&id).cloned())
    }

    async fn find_by_session(&self, session_id: &str) -> Result<Option<Booking>, String> {
        Ok(self
            .bookings
            .read()
            .map_err(poisoned)?
            .values()
            .find(|b| b.session_id() == session_id)
            .cloned())
    }

    async fn list(&self) -> Result<Vec<Booking>, String> {
        let mut all: Vec<Booking> = self
            .bookings
            .read()
            .map_err(poisoned)?
            .values()
            .cloned()
            .collect();
        all.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        Ok(all)
    }

    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Booking>, String> {
        let mut matched: Vec<Booking> = self
            .bookings
            .read()
            .map_err(poisoned)?
            .values()
            .filter(|b| b.user_id() == user_id)
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        Ok(matched)
    }

    async fn delete(&self, id: Uuid) -> Result<(), String> {
        let mut bookings = self.bookings.write().map_err(poisoned)?;
        if bookings.remove(&id).is_none() {
            return Err(format!("Booking not found: {}", id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::tour::value_objects::Difficulty;

    fn tour(name: &str, price: i64, difficulty: Difficulty) -> Tour {
        Tour::new(
            name.to_string(),
            5,
            10,
            difficulty,
            Decimal::new(price, 0),
            None,
            "A perfectly fine summary".to_string(),
            None,
            vec![],
        )
        .unwrap()
    }

    #[tokio::test]
    async fn list_filters_and_sorts_by_price() {
        let repo = InMemoryTourRepository::new();
        repo.create(&tour("The Forest Hiker", 400, Difficulty::Easy))
            .await
            .unwrap();
        repo.create(&tour("The Sea Explorer", 250, Difficulty::Medium))
            .await
            .unwrap();
        repo.create(&tour("The Snow Adventurer", 700, Difficulty::Difficult))
            .await
            .unwrap();

        let filter = TourFilter {
            sort: Some((SortKey::Price, false)),
            ..TourFilter::default()
        };
        let tours = repo.list(&filter).await.unwrap();
        let prices: Vec<i64> = tours.iter().map(|t| t.price.mantissa() as i64).collect();
        assert_eq!(prices, vec![250, 400, 700]);
    }

    #[tokio::test]
    async fn secret_tours_hidden_from_listings() {
        let repo = InMemoryTourRepository::new();
        let mut hidden = tour("The Secret Getaway", 999, Difficulty::Easy);
        hidden.secret = true;
        repo.create(&hidden).await.unwrap();
        repo.create(&tour("The Forest Hiker", 400, Difficulty::Easy))
            .await
            .unwrap();

        let tours = repo.list(&TourFilter::default()).await.unwrap();
        assert_eq!(tours.len(), 1);
        assert_eq!(tours[0].name, "The Forest Hiker");

        // still reachable directly
        assert!(repo.find_by_id(hidden.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn review_create_refreshes_tour_aggregates() {
        let tours = Arc::new(InMemoryTourRepository::new());
        let t = tour("The Forest Hiker", 400, Difficulty::Easy);
        tours.create(&t).await.unwrap();

        let reviews = InMemoryReviewRepository::new(tours.clone());
        let first = Review::new(t.id, Uuid::new_v4(), "Loved it".to_string(), 5).unwrap();
        let second = Review::new(t.id, Uuid::new_v4(), "It was fine".to_string(), 2).unwrap();
        reviews.create(&first).await.unwrap();
        reviews.create(&second).await.unwrap();

        let refreshed = tours.find_by_id(t.id).await.unwrap().unwrap();
        assert_eq!(refreshed.ratings_quantity, 2);
        assert_eq!(refreshed.ratings_average, 3.5);

        reviews.delete(second.id).await.unwrap();
        let refreshed = tours.find_by_id(t.id).await.unwrap().unwrap();
        assert_eq!(refreshed.ratings_quantity, 1);
        assert_eq!(refreshed.ratings_average, 5.0);
    }

    #[tokio::test]
    async fn duplicate_review_per_tour_rejected() {
        let tours = Arc::new(InMemoryTourRepository::new());
        let t = tour("The Forest Hiker", 400, Difficulty::Easy);
        tours.create(&t).await.unwrap();

        let reviews = InMemoryReviewRepository::new(tours);
        let author = Uuid::new_v4();
        let first = Review::new(t.id, author, "Loved it".to_string(), 5).unwrap();
        let again = Review::new(t.id, author, "Still love it".to_string(), 4).unwrap();
        reviews.create(&first).await.unwrap();

        let err = reviews.create(&again).await.unwrap_err();
        assert!(err.contains("duplicate"));
    }

    #[tokio::test]
    async fn stats_group_by_difficulty() {
        let repo = InMemoryTourRepository::new();
        repo.create(&tour("The Forest Hiker", 400, Difficulty::Easy))
            .await
            .unwrap();
        repo.create(&tour("The Quiet Meadow", 200, Difficulty::Easy))
            .await
            .unwrap();
        repo.create(&tour("The Snow Adventurer", 700, Difficulty::Difficult))
            .await
            .unwrap();

        let stats = repo.stats().await.unwrap();
        assert_eq!(stats.len(), 2);
        let easy = stats
            .iter()
            .find(|s| s.difficulty == Difficulty::Easy)
            .unwrap();
        assert_eq!(easy.num_tours, 2);
        assert_eq!(easy.min_price, Decimal::new(200, 0));
        assert_eq!(easy.max_price, Decimal::new(400, 0));
    }
}
