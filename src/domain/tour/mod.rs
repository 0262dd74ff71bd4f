// Tour domain module
// Contains the tour record and its value objects

#![allow(clippy::module_inception)]

pub mod tour;
pub mod value_objects;

pub use tour::Tour;
pub use value_objects::Difficulty;
