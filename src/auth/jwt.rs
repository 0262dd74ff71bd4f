// JWT token creation and verification
// Tokens carry the user id and role; expiry is configured per deployment

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::user::value_objects::Role;

/// JWT claims structure
///
/// # Fields
/// * `sub` - Subject (user id)
/// * `role` - The user's role at issue time
/// * `iat` - Issued-at (seconds since epoch)
/// * `exp` - Expiry time (seconds since epoch)
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: Uuid,
    pub role: Role,
    pub iat: usize,
    pub exp: usize,
}

/// Creates a signed JWT for a user
///
/// # Arguments
/// * `user_id` - The user's ID to include in the token
/// * `role` - The user's role, embedded so role checks stay stateless
/// * `secret` - The signing secret (from configuration)
/// * `expires_hours` - Token lifetime in hours
///
/// # Token Properties
/// - Signed with HS256
/// - Contains user id in `sub` and role in `role`
pub fn create_token(
    user_id: Uuid,
    role: Role,
    secret: &str,
    expires_hours: i64,
) -> Result<String, String> {
    let now = Utc::now();
    let expiry = now + Duration::hours(expires_hours);
    let claims = Claims {
        sub: user_id,
        role,
        iat: now.timestamp() as usize,
        exp: expiry.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_ref()),
    )
    .map_err(|e| e.to_string())
}

/// Verifies and decodes a JWT
///
/// # Returns
/// * `Ok(Claims)` - The decoded claims if the token is valid
/// * `Err(String)` - If the token is invalid or expired
pub fn verify_token(token: &str, secret: &str) -> Result<Claims, String> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_ref()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_SECRET: &str = "test-secret-key-for-unit-tests";

    #[test]
    fn create_and_verify_token() {
        let user_id = Uuid::new_v4();
        let token = create_token(user_id, Role::User, TEST_SECRET, 8).expect("valid token");

        let claims = verify_token(&token, TEST_SECRET).expect("valid verification");
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.role, Role::User);
    }

    #[test]
    fn token_preserves_role() {
        let token =
            create_token(Uuid::new_v4(), Role::LeadGuide, TEST_SECRET, 8).expect("valid token");

        let claims = verify_token(&token, TEST_SECRET).expect("valid verification");
        assert_eq!(claims.role, Role::LeadGuide);
    }

    #[test]
    fn wrong_secret_fails() {
        let token = create_token(Uuid::new_v4(), Role::User, TEST_SECRET, 8).expect("valid token");

        let result = verify_token(&token, "wrong-secret");
        assert!(result.is_err());
    }

    #[test]
    fn invalid_token_fails() {
        let result = verify_token("invalid.token.string", TEST_SECRET);
        assert!(result.is_err());
    }

    #[test]
    fn token_expiry_honors_configured_hours() {
        let token = create_token(Uuid::new_v4(), Role::User, TEST_SECRET, 2).expect("valid token");

        let claims = verify_token(&token, TEST_SECRET).expect("valid verification");
        let expiry_time = claims.exp as i64;
        let now = Utc::now().timestamp();
        let in_2_hours = (Utc::now() + Duration::hours(2)).timestamp();

        assert!(expiry_time > now);
        assert!(expiry_time <= in_2_hours + 10); // buffer for test execution time
    }
}
