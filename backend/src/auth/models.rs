//! Data structures for authentication-related entities.
//!
//! Request/response payloads for the init-data exchange, silent refresh and
//! current-user endpoints.

use serde::{Deserialize, Serialize};

use crate::database::models::{Role, User};

/// Init-data exchange request.
///
/// `init_data` is optional on purpose: a client running outside the
/// embedding host sends nothing, and the two cases get distinct rejection
/// reasons (`not_embedded` vs `empty_payload`).
#[derive(Debug, Deserialize, Serialize)]
pub struct InitDataExchangeRequest {
    pub init_data: Option<String>,
}

/// User information returned by the exchange and `/auth/me`.
///
/// Tokens never appear in response bodies: the cookie pair is the only
/// transport.
#[derive(Debug, Serialize, Deserialize)]
pub struct UserInfo {
    pub id: i64,
    pub role: Role,
    pub first: String,
    pub last: Option<String>,
    pub username: Option<String>,
}

impl From<&User> for UserInfo {
    fn from(user: &User) -> Self {
        UserInfo {
            id: user.id,
            role: user.role,
            first: user.first.clone(),
            last: user.last.clone(),
            username: user.username.clone(),
        }
    }
}

/// Init-data exchange response.
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub user: UserInfo,
}

/// Silent refresh response; the rotated pair travels in cookies.
#[derive(Debug, Serialize, Deserialize)]
pub struct RefreshResponse {
    pub refreshed: bool,
}
