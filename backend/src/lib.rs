//! Tourline backend: Telegram-WebApp authentication and token refresh.
//!
//! Wires the signature verifier, token issuer, cookie transport, refresh
//! middleware and analytics attribution into a single Axum application.

pub mod api;
pub mod auth;
pub mod config;
pub mod database;
pub mod errors;
pub mod repositories;
pub mod services;
pub mod utils;

use axum::{Extension, Router, middleware, response::Json, routing::get};
use sqlx::SqlitePool;
use std::sync::Arc;

use crate::api::common::ApiResponse;
use crate::config::Config;
use crate::services::analytics_service::{AnalyticsService, client_id_middleware};
use crate::utils::init_data::InitDataVerifier;
use crate::utils::jwt::TokenIssuer;

/// Process-wide immutable application state.
///
/// Constructed once at startup and handed to the router explicitly; nothing
/// in the request path reads the environment.
#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub config: Arc<Config>,
    pub issuer: Arc<TokenIssuer>,
    pub verifier: Arc<InitDataVerifier>,
    pub analytics: AnalyticsService,
}

impl AppState {
    pub fn new(config: Config, pool: SqlitePool) -> Self {
        let issuer = TokenIssuer::new(
            &config.jwt_secret,
            config.access_ttl_seconds,
            config.refresh_ttl_seconds,
        );
        let verifier =
            InitDataVerifier::new(&config.bot_token, config.auth_date_max_age_seconds);
        let analytics = AnalyticsService::new(&config);

        AppState {
            pool,
            config: Arc::new(config),
            issuer: Arc::new(issuer),
            verifier: Arc::new(verifier),
            analytics,
        }
    }
}

/// Builds the application router.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .nest("/auth", auth::routes::auth_router())
        .layer(middleware::from_fn(client_id_middleware))
        .layer(Extension(state))
}

async fn root_handler() -> Json<ApiResponse<serde_json::Value>> {
    Json(ApiResponse::success(
        serde_json::json!({
            "service": "Tourline Auth Backend",
            "version": "0.1.0"
        }),
        "Welcome to the Tourline API",
    ))
}
