//! Core business logic for the authentication system.

use chrono::Utc;
use sqlx::SqlitePool;

use crate::AppState;
use crate::database::models::{Role, User};
use crate::errors::{ServiceError, ServiceResult};
use crate::services::analytics_service::{AnalyticsService, ClientId};
use crate::services::user_service::UserService;
use crate::utils::init_data::InitDataVerifier;
use crate::utils::jwt::{TokenIssuer, TokenPair};

/// Authentication service for the init-data exchange and silent refresh.
pub struct AuthService<'a> {
    pool: &'a SqlitePool,
    issuer: &'a TokenIssuer,
    verifier: &'a InitDataVerifier,
    analytics: &'a AnalyticsService,
}

impl<'a> AuthService<'a> {
    pub fn new(state: &'a AppState) -> Self {
        AuthService {
            pool: &state.pool,
            issuer: &state.issuer,
            verifier: &state.verifier,
            analytics: &state.analytics,
        }
    }

    /// Exchange a Telegram WebApp init-data payload for a token pair.
    ///
    /// `init_data = None` means the client is not running inside the
    /// embedding host at all; that is reported separately from an empty or
    /// forged payload.
    pub async fn exchange_init_data(
        &self,
        init_data: Option<String>,
        client_id: &ClientId,
    ) -> ServiceResult<(User, TokenPair)> {
        let raw = init_data.ok_or(ServiceError::NotEmbedded)?;
        let verified = self.verifier.verify(&raw, Utc::now().timestamp())?;

        let user_service = UserService::new(self.pool);
        let user = user_service
            .get_or_create_from_telegram(&verified.user, Role::BotUser)
            .await?;

        if !user.is_active {
            return Err(ServiceError::permission_denied("account is deactivated"));
        }

        let pair = self.issuer.mint_pair(user.id, user.role)?;

        self.analytics.track(client_id, "login", None);
        tracing::info!(user_id = user.id, role = %user.role, "init-data exchange succeeded");

        Ok((user, pair))
    }

    /// Exchange a refresh token for a rotated pair.
    ///
    /// The persisted identity is re-checked on every refresh: a vanished or
    /// deactivated user, or a role that changed since mint time, invalidates
    /// the refresh so a stale-role token can never be renewed.
    pub async fn refresh(&self, refresh_token: &str) -> ServiceResult<(User, TokenPair)> {
        let claims = self.issuer.verify_refresh(refresh_token)?;
        let user_id = claims.user_id()?;

        let user_service = UserService::new(self.pool);
        let user = match user_service.get_user_required(user_id).await {
            Ok(user) => user,
            Err(ServiceError::NotFound { .. }) => {
                return Err(ServiceError::refresh_invalid("user no longer exists"));
            }
            Err(e) => return Err(e),
        };

        if !user.is_active {
            return Err(ServiceError::refresh_invalid("user is deactivated"));
        }
        if user.role != claims.role() {
            tracing::warn!(
                user_id,
                token_role = %claims.role(),
                current_role = %user.role,
                "refresh rejected: role changed since mint"
            );
            return Err(ServiceError::refresh_invalid("role changed since mint"));
        }

        let pair = self.issuer.mint_pair(user.id, user.role)?;
        Ok((user, pair))
    }
}
