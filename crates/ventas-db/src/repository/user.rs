//! # User Repository
//!
//! Database operations for user accounts. Stores the password hash as given;
//! hashing happens before it reaches this layer.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use ventas_core::{Role, User};

/// Changes to a stored user. `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<Role>,
    pub is_active: Option<bool>,
    /// Already hashed.
    pub password_hash: Option<String>,
}

/// Repository for user database operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    /// Creates a new UserRepository.
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// Inserts an active user and returns the stored row.
    pub async fn insert(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
        role: Role,
    ) -> DbResult<User> {
        debug!(email = %email, role = %role, "Inserting user");

        let now = Utc::now();
        let user: User = sqlx::query_as(
            r#"
            INSERT INTO users (
                name, email, password_hash, role, is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, 1, ?5, ?5)
            RETURNING *
            "#,
        )
        .bind(name.trim())
        .bind(email.trim())
        .bind(password_hash)
        .bind(role)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DbError::from(e).with_value(email.trim()))?;

        Ok(user)
    }

    /// Gets a user by ID, active or not.
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<User>> {
        let user = sqlx::query_as("SELECT * FROM users WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// Gets a user by email (case-insensitive).
    pub async fn get_by_email(&self, email: &str) -> DbResult<Option<User>> {
        let user = sqlx::query_as("SELECT * FROM users WHERE email = ?1")
            .bind(email.trim())
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// Lists users ordered by name.
    pub async fn list(&self, include_inactive: bool, limit: i64, offset: i64) -> DbResult<Vec<User>> {
        let users = sqlx::query_as(
            r#"
            SELECT * FROM users
            WHERE (?1 OR is_active = 1)
            ORDER BY name, id
            LIMIT ?2 OFFSET ?3
            "#,
        )
        .bind(include_inactive)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    /// Applies changes and returns the stored row.
    pub async fn update(&self, id: i64, changes: &UserChanges) -> DbResult<User> {
        debug!(id = %id, "Updating user");

        let user: Option<User> = sqlx::query_as(
            r#"
            UPDATE users SET
                name          = COALESCE(?2, name),
                email         = COALESCE(?3, email),
                role          = COALESCE(?4, role),
                is_active     = COALESCE(?5, is_active),
                password_hash = COALESCE(?6, password_hash),
                updated_at    = ?7
            WHERE id = ?1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(changes.name.as_deref().map(str::trim))
        .bind(changes.email.as_deref().map(str::trim))
        .bind(changes.role)
        .bind(changes.is_active)
        .bind(&changes.password_hash)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DbError::from(e).with_value(changes.email.as_deref().unwrap_or("")))?;

        user.ok_or_else(|| DbError::not_found("User", id))
    }

    /// Deactivates a user. Tokens already issued stop working at the next
    /// request because the account is checked on every call.
    pub async fn deactivate(&self, id: i64) -> DbResult<()> {
        debug!(id = %id, "Deactivating user");

        let result = sqlx::query("UPDATE users SET is_active = 0, updated_at = ?2 WHERE id = ?1")
            .bind(id)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", id));
        }

        Ok(())
    }

    /// Stamps the last successful login.
    pub async fn record_login(&self, id: i64) -> DbResult<()> {
        let result = sqlx::query("UPDATE users SET last_login_at = ?2 WHERE id = ?1")
            .bind(id)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", id));
        }

        Ok(())
    }

    /// Counts active users.
    pub async fn count_active(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE is_active = 1")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Counts all users, active or not.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
