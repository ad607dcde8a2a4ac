//! User business logic service.
//!
//! Wraps the user repository with the rules the auth flow needs: lazy
//! creation from verified Telegram claims and existence checks during
//! refresh.

use sqlx::SqlitePool;

use crate::database::models::{Role, User};
use crate::errors::{ServiceError, ServiceResult};
use crate::repositories::user_repository::UserRepository;
use crate::utils::init_data::TelegramUser;

pub struct UserService<'a> {
    /// Shared database connection pool
    pool: &'a SqlitePool,
}

impl<'a> UserService<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Finds the user for a verified Telegram identity, creating the row on
    /// first contact. Profile fields are refreshed on every login so the
    /// stored name tracks the Telegram account.
    ///
    /// The role passed here only applies to newly created users; an existing
    /// user keeps whatever role user management assigned to them.
    pub async fn get_or_create_from_telegram(
        &self,
        tg: &TelegramUser,
        role: Role,
    ) -> ServiceResult<User> {
        let repo = UserRepository::new(self.pool);

        let user = match repo.get_user_by_tg_id(tg.id).await? {
            Some(existing) => repo
                .update_profile(existing.id, tg)
                .await?
                .ok_or_else(|| ServiceError::not_found("User", existing.id.to_string()))?,
            None => repo.create_from_telegram(tg, role).await?,
        };

        Ok(user)
    }

    /// Retrieves a user by ID with existence verification.
    pub async fn get_user_required(&self, id: i64) -> ServiceResult<User> {
        let repo = UserRepository::new(self.pool);
        let user = repo
            .get_user_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("User", id.to_string()))?;
        Ok(user)
    }
}
