//! Database entity definitions for the auth subsystem.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Closed set of platform roles.
///
/// The role string is persisted on the user row and embedded in token
/// claims; a refresh is rejected when the two disagree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Agency,
    Manager,
    Landlord,
    BotUser,
    Service,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Role::Admin => "admin",
            Role::Agency => "agency",
            Role::Manager => "manager",
            Role::Landlord => "landlord",
            Role::BotUser => "bot_user",
            Role::Service => "service",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "agency" => Ok(Role::Agency),
            "manager" => Ok(Role::Manager),
            "landlord" => Ok(Role::Landlord),
            "bot_user" => Ok(Role::BotUser),
            "service" => Ok(Role::Service),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}

/// A platform user, created lazily from verified Telegram claims.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub tg_id: i64,
    pub role: Role,
    pub first: String,
    pub last: Option<String>,
    pub username: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
