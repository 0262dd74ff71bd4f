// HTTP handlers, one module per mounted router

pub mod bookings;
pub mod reviews;
pub mod tours;
pub mod users;
pub mod views;
