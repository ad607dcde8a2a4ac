//! Verification of Telegram WebApp init-data.
//!
//! The embedding host signs the url-encoded payload with a key derived from
//! the bot token (`HMAC-SHA256("WebAppData", bot_token)`). Verification
//! recomputes that signature over the canonicalized key-value list (keys
//! sorted, `key=value` lines joined with `\n`, `hash` excluded) and compares
//! it in constant time.

use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;

use crate::errors::{ServiceError, ServiceResult};

type HmacSha256 = Hmac<Sha256>;

/// User claims embedded in the init-data payload.
#[derive(Debug, Clone, Deserialize)]
pub struct TelegramUser {
    pub id: i64,
    pub first_name: String,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
}

/// The outcome of a successful verification.
#[derive(Debug, Clone)]
pub struct VerifiedInitData {
    pub user: TelegramUser,
    pub auth_date: i64,
}

/// Validates raw init-data strings against the bot token.
pub struct InitDataVerifier {
    derived_secret: Vec<u8>,
    max_age_seconds: i64,
}

impl InitDataVerifier {
    pub fn new(bot_token: &str, max_age_seconds: u64) -> Self {
        let mut mac = HmacSha256::new_from_slice(b"WebAppData")
            .expect("HMAC accepts any key length");
        mac.update(bot_token.as_bytes());

        InitDataVerifier {
            derived_secret: mac.finalize().into_bytes().to_vec(),
            max_age_seconds: max_age_seconds as i64,
        }
    }

    /// Verify `raw` and return the embedded claims.
    ///
    /// `now` is the caller's clock (unix seconds); injected for testability.
    pub fn verify(&self, raw: &str, now: i64) -> ServiceResult<VerifiedInitData> {
        if raw.is_empty() {
            return Err(ServiceError::EmptyPayload);
        }

        let mut pairs: Vec<(String, String)> = url::form_urlencoded::parse(raw.as_bytes())
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        let hash_idx = pairs.iter().position(|(k, _)| k == "hash");
        let provided_hash = match hash_idx {
            Some(idx) => pairs.remove(idx).1,
            None => return Err(ServiceError::BadSignature),
        };
        let provided_hash =
            hex::decode(&provided_hash).map_err(|_| ServiceError::BadSignature)?;

        pairs.sort_by(|a, b| a.0.cmp(&b.0));
        let data_check_string = pairs
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("\n");

        let mut mac = HmacSha256::new_from_slice(&self.derived_secret)
            .expect("HMAC accepts any key length");
        mac.update(data_check_string.as_bytes());
        // verify_slice compares in constant time.
        mac.verify_slice(&provided_hash)
            .map_err(|_| ServiceError::BadSignature)?;

        let auth_date = pairs
            .iter()
            .find(|(k, _)| k == "auth_date")
            .and_then(|(_, v)| v.parse::<i64>().ok())
            .ok_or(ServiceError::BadSignature)?;

        // A correctly signed but old payload is still rejected; replaying a
        // captured init-data string must stop working within the window.
        if now - auth_date > self.max_age_seconds {
            return Err(ServiceError::StaleTimestamp);
        }

        let user_json = pairs
            .iter()
            .find(|(k, _)| k == "user")
            .map(|(_, v)| v.as_str())
            .ok_or_else(|| ServiceError::validation("init data has no user field"))?;
        let user: TelegramUser = serde_json::from_str(user_json)
            .map_err(|e| ServiceError::validation(format!("malformed user field: {}", e)))?;

        Ok(VerifiedInitData { user, auth_date })
    }
}
