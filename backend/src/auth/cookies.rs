//! Cookie transport for the token pair.
//!
//! Cookies are the single source of truth for tokens in this deployment:
//! both are HttpOnly and SameSite=None so the WebApp (served from another
//! origin, embedded in the Telegram client) can use them, while script
//! never sees them. The analytics cookie is the one deliberate exception:
//! it must stay readable by the client-side tag.

use axum_extra::extract::cookie::{Cookie, SameSite};
use time::Duration;

use crate::config::Config;

pub const ACCESS_COOKIE: &str = "access_token";
pub const REFRESH_COOKIE: &str = "refresh_token";
pub const CLIENT_ID_COOKIE: &str = "_ym_uid";

fn auth_cookie(name: &'static str, value: String, max_age: Duration, config: &Config) -> Cookie<'static> {
    let mut builder = Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .secure(config.cookie_secure)
        .same_site(SameSite::None)
        .max_age(max_age);
    if let Some(domain) = &config.cookie_domain {
        builder = builder.domain(domain.clone());
    }
    builder.build()
}

pub fn access_cookie(token: String, config: &Config) -> Cookie<'static> {
    auth_cookie(
        ACCESS_COOKIE,
        token,
        Duration::seconds(config.access_ttl_seconds as i64),
        config,
    )
}

pub fn refresh_cookie(token: String, config: &Config) -> Cookie<'static> {
    auth_cookie(
        REFRESH_COOKIE,
        token,
        Duration::seconds(config.refresh_ttl_seconds as i64),
        config,
    )
}

pub fn access_cookie_clear(config: &Config) -> Cookie<'static> {
    auth_cookie(ACCESS_COOKIE, String::new(), Duration::ZERO, config)
}

pub fn refresh_cookie_clear(config: &Config) -> Cookie<'static> {
    auth_cookie(REFRESH_COOKIE, String::new(), Duration::ZERO, config)
}

/// Analytics attribution cookie: script-readable, one year, Lax.
pub fn client_id_cookie(value: String) -> Cookie<'static> {
    Cookie::build((CLIENT_ID_COOKIE, value))
        .path("/")
        .http_only(false)
        .same_site(SameSite::Lax)
        .max_age(Duration::days(365))
        .build()
}
