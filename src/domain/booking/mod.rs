// Booking domain module
// Contains the booking aggregate and its status value object

#![allow(clippy::module_inception)]

pub mod booking;
pub mod value_objects;

pub use booking::Booking;
pub use value_objects::BookingStatus;
