use serde::{Deserialize, Serialize};
use std::fmt;

/// Email value object representing a valid email address
///
/// # Invariants
/// - Must contain '@' with characters on both sides
/// - Must be at least 3 characters long
/// - Is immutable after construction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Email(String);

impl Email {
    /// Creates a new Email value object
    ///
    /// # Arguments
    /// * `email` - The email string to validate
    ///
    /// # Returns
    /// * `Ok(Email)` - If email is valid
    /// * `Err(String)` - If email is invalid
    pub fn new(email: impl Into<String>) -> Result<Self, String> {
        let email = email.into();
        if Self::is_valid(&email) {
            Ok(Email(email))
        } else {
            Err(format!("Invalid email: {}", email))
        }
    }

    fn is_valid(email: &str) -> bool {
        match email.split_once('@') {
            Some((local, domain)) => !local.is_empty() && !domain.is_empty(),
            None => false,
        }
    }

    /// Returns the email as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Access role attached to a user account
///
/// Staff roles (`Guide`, `LeadGuide`, `Admin`) unlock management endpoints;
/// every new signup starts as `User`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    User,
    Guide,
    LeadGuide,
    Admin,
}

impl Role {
    /// Parses a role from its wire representation
    pub fn parse(s: &str) -> Result<Self, String> {
        match s {
            "user" => Ok(Role::User),
            "guide" => Ok(Role::Guide),
            "lead-guide" => Ok(Role::LeadGuide),
            "admin" => Ok(Role::Admin),
            other => Err(format!("Unknown role: {}", other)),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Guide => "guide",
            Role::LeadGuide => "lead-guide",
            Role::Admin => "admin",
        }
    }

    /// Whether this role may create, update, or delete tours and bookings
    pub fn manages_inventory(&self) -> bool {
        matches!(self, Role::Admin | Role::LeadGuide)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_email() {
        assert!(Email::new("test@example.com").is_ok());
    }

    #[test]
    fn valid_email_with_subdomain() {
        assert!(Email::new("user@mail.example.com").is_ok());
    }

    #[test]
    fn invalid_email_no_at_symbol() {
        assert!(Email::new("invalid").is_err());
    }

    #[test]
    fn invalid_email_missing_local_part() {
        assert!(Email::new("@example.com").is_err());
    }

    #[test]
    fn invalid_email_missing_domain() {
        assert!(Email::new("user@").is_err());
    }

    #[test]
    fn invalid_email_empty() {
        assert!(Email::new("").is_err());
    }

    #[test]
    fn email_display() {
        let email = Email::new("test@example.com").unwrap();
        assert_eq!(format!("{}", email), "test@example.com");
    }

    #[test]
    fn role_round_trip() {
        for role in [Role::User, Role::Guide, Role::LeadGuide, Role::Admin] {
            assert_eq!(Role::parse(role.as_str()).unwrap(), role);
        }
    }

    #[test]
    fn unknown_role_rejected() {
        assert!(Role::parse("superuser").is_err());
    }

    #[test]
    fn only_admin_and_lead_guide_manage_inventory() {
        assert!(Role::Admin.manages_inventory());
        assert!(Role::LeadGuide.manages_inventory());
        assert!(!Role::Guide.manages_inventory());
        assert!(!Role::User.manages_inventory());
    }
}
