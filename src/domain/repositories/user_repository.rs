use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::user::value_objects::Email;
use crate::domain::user::User;

/// Repository trait for user accounts
///
/// `create` reports a duplicate email with a message containing "duplicate"
/// so the handler boundary can classify it as a client error.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Create a new user
    async fn create(&self, user: &User) -> Result<(), String>;

    /// Find a user by ID
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, String>;

    /// Find a user by email address
    async fn find_by_email(&self, email: &Email) -> Result<Option<User>, String>;

    /// List all accounts, inactive ones included
    async fn list(&self) -> Result<Vec<User>, String>;

    /// Persist changes to an existing user
    async fn update(&self, user: &User) -> Result<(), String>;

    /// Soft-delete: flip `active` to false, keeping the row
    async fn deactivate(&self, id: Uuid) -> Result<(), String>;

    /// Hard-delete a user by ID
    async fn delete(&self, id: Uuid) -> Result<(), String>;
}
