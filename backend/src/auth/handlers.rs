//! Handler functions for authentication-related API endpoints.
//!
//! These functions process the init-data exchange, silent refresh, logout
//! and current-user requests, delegating business logic to `auth::service`.
//! Tokens travel exclusively in HttpOnly cookies; bodies carry user data
//! and machine-readable error reasons only.

use axum::{
    extract::{Extension, Json},
    http::StatusCode,
    response::Json as ResponseJson,
};
use axum_extra::extract::cookie::CookieJar;

use crate::AppState;
use crate::api::common::service_error_to_http;
use crate::auth::cookies::{
    REFRESH_COOKIE, access_cookie, access_cookie_clear, refresh_cookie, refresh_cookie_clear,
};
use crate::auth::models::*;
use crate::auth::service::AuthService;
use crate::errors::ServiceError;
use crate::services::analytics_service::ClientId;
use crate::services::user_service::UserService;
use crate::utils::jwt::Claims;

/// Handle the Telegram WebApp init-data exchange.
#[axum::debug_handler]
pub async fn telegram_webapp_auth(
    Extension(state): Extension<AppState>,
    Extension(client_id): Extension<ClientId>,
    jar: CookieJar,
    Json(payload): Json<InitDataExchangeRequest>,
) -> Result<(CookieJar, ResponseJson<AuthResponse>), (StatusCode, String)> {
    let service = AuthService::new(&state);

    let (user, pair) = service
        .exchange_init_data(payload.init_data, &client_id)
        .await
        .map_err(service_error_to_http)?;

    let jar = jar
        .add(access_cookie(pair.access_token, &state.config))
        .add(refresh_cookie(pair.refresh_token, &state.config));

    Ok((
        jar,
        ResponseJson(AuthResponse {
            user: UserInfo::from(&user),
        }),
    ))
}

/// Handle token refresh: the refresh token is read from its cookie and the
/// rotated pair is returned the same way.
#[axum::debug_handler]
pub async fn refresh_token(
    Extension(state): Extension<AppState>,
    jar: CookieJar,
) -> Result<(CookieJar, ResponseJson<RefreshResponse>), (StatusCode, String)> {
    let token = jar
        .get(REFRESH_COOKIE)
        .map(|c| c.value().to_string())
        .ok_or_else(|| {
            service_error_to_http(ServiceError::refresh_invalid("missing refresh cookie"))
        })?;

    let (_user, pair) = AuthService::new(&state)
        .refresh(&token)
        .await
        .map_err(service_error_to_http)?;

    let jar = jar
        .add(access_cookie(pair.access_token, &state.config))
        .add(refresh_cookie(pair.refresh_token, &state.config));

    Ok((jar, ResponseJson(RefreshResponse { refreshed: true })))
}

/// Handle logout: clear both auth cookies.
///
/// Tokens are stateless, so an already-issued refresh token stays valid
/// until natural expiry; logout only removes the client's copies.
#[axum::debug_handler]
pub async fn logout(
    Extension(state): Extension<AppState>,
    jar: CookieJar,
) -> (CookieJar, StatusCode) {
    let jar = jar
        .add(access_cookie_clear(&state.config))
        .add(refresh_cookie_clear(&state.config));

    (jar, StatusCode::NO_CONTENT)
}

/// Get current user information from verified claims.
#[axum::debug_handler]
pub async fn me(
    Extension(state): Extension<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<ResponseJson<UserInfo>, (StatusCode, String)> {
    let user_id = claims.user_id().map_err(service_error_to_http)?;

    let user = UserService::new(&state.pool)
        .get_user_required(user_id)
        .await
        .map_err(service_error_to_http)?;

    Ok(ResponseJson(UserInfo::from(&user)))
}
