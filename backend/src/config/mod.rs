//! Application-wide configuration.
//!
//! Loads every knob the auth subsystem needs from the environment at
//! startup. Missing required values (bot token, JWT secret, database URL)
//! are fatal here rather than surfacing as per-request failures later.

use anyhow::{Context, Result};
use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub max_connections: u32,
    pub acquire_timeout_seconds: u64,
    /// Telegram bot token; signing root for init-data verification.
    pub bot_token: String,
    pub jwt_secret: String,
    /// Access token lifetime, default 15 minutes.
    pub access_ttl_seconds: u64,
    /// Refresh token lifetime, default 30 days.
    pub refresh_ttl_seconds: u64,
    /// Maximum accepted age of the init-data auth_date, default 24h.
    pub auth_date_max_age_seconds: u64,
    pub cookie_domain: Option<String>,
    pub cookie_secure: bool,
    pub server_port: u16,
    /// Measurement-protocol counter/token; analytics is disabled when unset.
    pub metrika_counter: Option<String>,
    pub metrika_token: Option<String>,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").context("DATABASE_URL not set")?;

        let max_connections = env::var("DB_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "5".to_string())
            .parse::<u32>()
            .context("DB_MAX_CONNECTIONS must be a valid number")?;

        let acquire_timeout_seconds = env::var("DB_ACQUIRE_TIMEOUT_SECONDS")
            .unwrap_or_else(|_| "3".to_string())
            .parse::<u64>()
            .context("DB_ACQUIRE_TIMEOUT_SECONDS must be a valid number")?;

        let bot_token = env::var("BOT_TOKEN").context("BOT_TOKEN not set")?;

        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET not set")?;

        let access_ttl_seconds = env::var("JWT_ACCESS_TTL")
            .unwrap_or_else(|_| "900".to_string())
            .parse::<u64>()
            .context("JWT_ACCESS_TTL must be a valid number")?;

        let refresh_ttl_seconds = env::var("JWT_REFRESH_TTL")
            .unwrap_or_else(|_| (60 * 60 * 24 * 30).to_string())
            .parse::<u64>()
            .context("JWT_REFRESH_TTL must be a valid number")?;

        let auth_date_max_age_seconds = env::var("AUTH_DATE_MAX_AGE")
            .unwrap_or_else(|_| "86400".to_string())
            .parse::<u64>()
            .context("AUTH_DATE_MAX_AGE must be a valid number")?;

        let cookie_domain = env::var("COOKIE_DOMAIN").ok().filter(|d| !d.is_empty());

        let cookie_secure = env::var("COOKIE_SECURE")
            .unwrap_or_else(|_| "true".to_string())
            .parse::<bool>()
            .context("COOKIE_SECURE must be true or false")?;

        let server_port = env::var("SERVER_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .context("SERVER_PORT must be a valid number")?;

        let metrika_counter = env::var("METRIKA_COUNTER").ok().filter(|v| !v.is_empty());
        let metrika_token = env::var("METRIKA_MP_TOKEN").ok().filter(|v| !v.is_empty());

        Ok(Config {
            database_url,
            max_connections,
            acquire_timeout_seconds,
            bot_token,
            jwt_secret,
            access_ttl_seconds,
            refresh_ttl_seconds,
            auth_date_max_age_seconds,
            cookie_domain,
            cookie_secure,
            server_port,
            metrika_counter,
            metrika_token,
        })
    }

    /// Configuration for in-process tests: in-memory database, fixed secrets.
    pub fn for_tests() -> Self {
        Config {
            database_url: "sqlite::memory:".to_string(),
            max_connections: 1,
            acquire_timeout_seconds: 3,
            bot_token: "12345:TEST-BOT-TOKEN".to_string(),
            jwt_secret: "test-jwt-secret".to_string(),
            access_ttl_seconds: 900,
            refresh_ttl_seconds: 60 * 60 * 24 * 30,
            auth_date_max_age_seconds: 86400,
            cookie_domain: None,
            cookie_secure: false,
            server_port: 0,
            metrika_counter: None,
            metrika_token: None,
        }
    }
}
