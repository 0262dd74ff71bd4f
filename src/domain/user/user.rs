use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::value_objects::{Email, Role};

/// User account record
///
/// Accounts are soft-deleted: `active` flips to false and the row stays put
/// so reviews and bookings keep a valid author.
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: Email,
    pub role: Role,
    pub password_hash: String,
    pub photo: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Creates a new user account
    ///
    /// # Business Rules Enforced
    /// - Name must not be empty
    /// - Role is always `User`; staff roles are granted out of band
    pub fn new(name: String, email: Email, password_hash: String) -> Result<Self, String> {
        if name.trim().is_empty() {
            return Err("Name cannot be empty".to_string());
        }

        Ok(Self {
            id: Uuid::new_v4(),
            name,
            email,
            role: Role::User,
            password_hash,
            photo: None,
            active: true,
            created_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn email() -> Email {
        Email::new("traveler@example.com").unwrap()
    }

    #[test]
    fn new_user_starts_active_with_user_role() {
        let user = User::new("Ada".to_string(), email(), "hash".to_string()).unwrap();
        assert!(user.active);
        assert_eq!(user.role, Role::User);
    }

    #[test]
    fn empty_name_rejected() {
        assert!(User::new("  ".to_string(), email(), "hash".to_string()).is_err());
    }
}
