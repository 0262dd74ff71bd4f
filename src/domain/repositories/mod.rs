// Repository traits for the domain aggregates
// Implementations live in the infrastructure layer

pub mod booking_repository;
pub mod review_repository;
pub mod tour_repository;
pub mod user_repository;

pub use booking_repository::BookingRepository;
pub use review_repository::ReviewRepository;
pub use tour_repository::{SortKey, TourFilter, TourRepository, TourStats};
pub use user_repository::UserRepository;
