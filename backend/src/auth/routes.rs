//! Defines the HTTP routes specifically for authentication.
//!
//! These routes handle the init-data exchange, silent token refresh, logout
//! and the current-user lookup, and are designed to be nested into the main
//! Axum router.

use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::auth::handlers::*;
use crate::auth::middleware::refresh_auth;

/// Creates the authentication router with all auth-related routes.
pub fn auth_router() -> Router {
    Router::new()
        .route("/telegram", post(telegram_webapp_auth))
        .route("/refresh", post(refresh_token))
        .route("/logout", post(logout))
        .route("/me", get(me).layer(middleware::from_fn(refresh_auth)))
}
