// User domain module
// Contains the user record and its value objects

pub mod user;
pub mod value_objects;

pub use user::User;
pub use value_objects::{Email, Role};
