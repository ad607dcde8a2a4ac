//! Database repository for user management operations.
//!
//! Persistence for the User entity: lookup by id / Telegram id and lazy
//! creation from verified WebApp claims.

use anyhow::Result;
use sqlx::SqlitePool;

use crate::database::models::{Role, User};
use crate::utils::init_data::TelegramUser;

const USER_COLUMNS: &str =
    "id, tg_id, role, first, last, username, is_active, created_at, updated_at";

/// Repository for user database operations.
pub struct UserRepository<'a> {
    /// Shared SQLite connection pool
    pool: &'a SqlitePool,
}

impl<'a> UserRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Retrieves a user by their unique identifier.
    pub async fn get_user_by_id(&self, id: i64) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(user)
    }

    /// Retrieves a user by their Telegram identifier.
    pub async fn get_user_by_tg_id(&self, tg_id: i64) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE tg_id = ?"
        ))
        .bind(tg_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(user)
    }

    /// Creates a user row from verified Telegram claims.
    pub async fn create_from_telegram(&self, tg: &TelegramUser, role: Role) -> Result<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (tg_id, role, first, last, username)
            VALUES (?, ?, ?, ?, ?)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(tg.id)
        .bind(role)
        .bind(&tg.first_name)
        .bind(&tg.last_name)
        .bind(&tg.username)
        .fetch_one(self.pool)
        .await?;

        Ok(user)
    }

    /// Refreshes profile fields from the latest Telegram claims.
    pub async fn update_profile(&self, id: i64, tg: &TelegramUser) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET first = ?, last = ?, username = ?, updated_at = CURRENT_TIMESTAMP
            WHERE id = ?
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&tg.first_name)
        .bind(&tg.last_name)
        .bind(&tg.username)
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(user)
    }

    /// Changes a user's role. Used by the user-management surface; in tests
    /// it exercises the stale-role refresh rejection.
    pub async fn set_role(&self, id: i64, role: Role) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET role = ?, updated_at = CURRENT_TIMESTAMP
            WHERE id = ?
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(role)
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(user)
    }
}
