//! Middleware for protecting authenticated routes.
//!
//! Resolves the caller's identity from the access-token cookie, silently
//! refreshing it from the refresh-token cookie when expired. The wrapped
//! handler either observes fully verified `Claims` in the request extensions
//! or is never invoked; there is no half-refreshed state.

use axum::{
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;

use crate::AppState;
use crate::api::common::service_error_to_http;
use crate::auth::cookies::{
    ACCESS_COOKIE, REFRESH_COOKIE, access_cookie, access_cookie_clear, refresh_cookie,
    refresh_cookie_clear,
};
use crate::auth::service::AuthService;
use crate::errors::ServiceError;

/// Cookie-based authentication with transparent refresh.
///
/// Concurrent requests holding the same expired access token may each
/// trigger their own refresh; stateless tokens make that safe, so no
/// deduplication is attempted.
pub async fn refresh_auth(mut request: Request, next: Next) -> Response {
    let Some(state) = request.extensions().get::<AppState>().cloned() else {
        tracing::error!("refresh_auth middleware installed without AppState extension");
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    };

    let jar = CookieJar::from_headers(request.headers());

    if let Some(cookie) = jar.get(ACCESS_COOKIE) {
        match state.issuer.verify_access(cookie.value()) {
            Ok(claims) => {
                request.extensions_mut().insert(claims);
                return next.run(request).await;
            }
            // Expired tokens fall through to the refresh path.
            Err(ServiceError::TokenExpired) => {}
            Err(_) => {
                // Tampered or foreign token: drop both cookies.
                let jar = jar
                    .add(access_cookie_clear(&state.config))
                    .add(refresh_cookie_clear(&state.config));
                return (jar, service_error_to_http(ServiceError::InvalidToken)).into_response();
            }
        }
    }

    let Some(refresh_token) = jar.get(REFRESH_COOKIE).map(|c| c.value().to_string()) else {
        return service_error_to_http(ServiceError::refresh_invalid("no credentials presented"))
            .into_response();
    };

    match AuthService::new(&state).refresh(&refresh_token).await {
        Ok((_user, pair)) => {
            let claims = match state.issuer.verify_access(&pair.access_token) {
                Ok(claims) => claims,
                Err(e) => return service_error_to_http(e).into_response(),
            };
            request.extensions_mut().insert(claims);

            let response = next.run(request).await;

            // Rotate the pair on the way out.
            let jar = jar
                .add(access_cookie(pair.access_token, &state.config))
                .add(refresh_cookie(pair.refresh_token, &state.config));
            (jar, response).into_response()
        }
        Err(e) => service_error_to_http(e).into_response(),
    }
}
