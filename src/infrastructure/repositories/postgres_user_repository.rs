use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::domain::repositories::UserRepository;
use crate::domain::user::value_objects::{Email, Role};
use crate::domain::user::User;

#[derive(Debug, FromRow)]
struct UserRow {
    id: Uuid,
    name: String,
    email: String,
    role: String,
    password_hash: String,
    photo: Option<String>,
    active: bool,
    created_at: DateTime<Utc>,
}

impl UserRow {
    fn into_user(self) -> Result<User, String> {
        Ok(User {
            id: self.id,
            name: self.name,
            email: Email::new(&self.email)
                .map_err(|e| format!("Invalid email from database: {}", e))?,
            role: Role::parse(&self.role)
                .map_err(|e| format!("Invalid role from database: {}", e))?,
            password_hash: self.password_hash,
            photo: self.photo,
            active: self.active,
            created_at: self.created_at,
        })
    }
}

const USER_COLUMNS: &str = "id, name, email, role, password_hash, photo, active, created_at";

/// PostgreSQL implementation of UserRepository
pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn create(&self, user: &User) -> Result<(), String> {
        sqlx::query(
            r#"
            INSERT INTO users (id, name, email, role, password_hash, photo, active, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(user.email.as_str())
        .bind(user.role.as_str())
        .bind(&user.password_hash)
        .bind(&user.photo)
        .bind(user.active)
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| format!("Failed to create user: {}", e))?;

        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, String> {
        let row: Option<UserRow> =
            sqlx::query_as(&format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS))
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| format!("Failed to find user by id: {}", e))?;

        row.map(UserRow::into_user).transpose()
    }

    async fn find_by_email(&self, email: &Email) -> Result<Option<User>, String> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            "SELECT {} FROM users WHERE email = $1",
            USER_COLUMNS
        ))
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| format!("Failed to find user by email: {}", e))?;

        row.map(UserRow::into_user).transpose()
    }

    async fn list(&self) -> Result<Vec<User>, String> {
        let rows: Vec<UserRow> =
            sqlx::query_as(&format!("SELECT {} FROM users ORDER BY name", USER_COLUMNS))
                .fetch_all(&self.pool)
                .await
                .map_err(|e| format!("Failed to list users: {}", e))?;

        rows.into_iter().map(UserRow::into_user).collect()
    }

    async fn update(&self, user: &User) -> Result<(), String> {
        let result = sqlx::query(
            r#"
            UPDATE users SET
                name = $2, email = $3, role = $4, password_hash = $5,
                photo = $6, active = $7
            WHERE id = $1
            "#,
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(user.email.as_str())
        .bind(user.role.as_str())
        .bind(&user.password_hash)
        .bind(&user.photo)
        .bind(user.active)
        .execute(&self.pool)
        .await
        .map_err(|e| format!("Failed to update user: {}", e))?;

        if result.rows_affected() == 0 {
            return Err(format!("User not found: {}", user.id));
        }
        Ok(())
    }

    async fn deactivate(&self, id: Uuid) -> Result<(), String> {
        let result = sqlx::query("UPDATE users SET active = FALSE WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| format!("Failed to deactivate user: {}", e))?;

        if result.rows_affected() == 0 {
            return Err(format!("User not found: {}", id));
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<(), String> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| format!("Failed to delete user: {}", e))?;

        if result.rows_affected() == 0 {
            return Err(format!("User not found: {}", id));
        }
        Ok(())
    }
}
