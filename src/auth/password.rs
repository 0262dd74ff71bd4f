// Password hashing utilities
// Uses bcrypt for secure password hashing

use bcrypt::{hash, verify, DEFAULT_COST};

/// Minimum accepted password length at signup
pub const MIN_PASSWORD_LEN: usize = 8;

/// Hashes a password using bcrypt
pub fn hash_password(password: &str) -> Result<String, String> {
    hash(password, DEFAULT_COST).map_err(|e| e.to_string())
}

/// Verifies a password against a bcrypt hash
///
/// # Returns
/// * `Ok(bool)` - True if the password matches
/// * `Err(String)` - If verification itself fails
pub fn verify_password(password: &str, hash: &str) -> Result<bool, String> {
    verify(password, hash).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify_password() {
        let password = "test_password_123";
        let hash = hash_password(password).expect("valid hash");

        let valid = verify_password(password, &hash).expect("valid verification");
        assert!(valid);
    }

    #[test]
    fn verify_wrong_password() {
        let password = "test_password_123";
        let hash = hash_password(password).expect("valid hash");

        let valid = verify_password("wrong_password", &hash).expect("valid verification");
        assert!(!valid);
    }

    #[test]
    fn hash_different_outputs() {
        let password = "test_password_123";
        let hash1 = hash_password(password).expect("valid hash");
        let hash2 = hash_password(password).expect("valid hash");

        // Salted, so two hashes of the same input differ
        assert_ne!(hash1, hash2);

        assert!(verify_password(password, &hash1).unwrap());
        assert!(verify_password(password, &hash2).unwrap());
    }
}
