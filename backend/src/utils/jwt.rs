//! JWT token utilities for authentication and authorization.
//!
//! Provides creation and validation of the access/refresh token pair. Both
//! tokens are stateless HS256 JWTs; the `kind` claim keeps an access token
//! from being replayed as a refresh token and vice versa.

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::database::models::Role;
use crate::errors::{ServiceError, ServiceResult};

/// Discriminates the two token flavours inside the claims.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// JWT claims carried by both access and refresh tokens.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// User ID, stringified.
    pub sub: String,
    /// Platform role at mint time.
    pub role: Role,
    /// Access or refresh.
    pub kind: TokenKind,
    /// Token issued at timestamp
    pub iat: usize,
    /// Token expiration timestamp
    pub exp: usize,
}

impl Claims {
    pub fn user_id(&self) -> ServiceResult<i64> {
        self.sub
            .parse::<i64>()
            .map_err(|_| ServiceError::validation(format!("malformed subject '{}'", self.sub)))
    }

    pub fn role(&self) -> Role {
        self.role
    }
}

/// The freshly minted access/refresh pair.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Mints and validates the stateless token pair.
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenIssuer {
    pub fn new(secret: &str, access_ttl_seconds: u64, refresh_ttl_seconds: u64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;

        TokenIssuer {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            access_ttl: Duration::seconds(access_ttl_seconds as i64),
            refresh_ttl: Duration::seconds(refresh_ttl_seconds as i64),
        }
    }

    /// Mint a fresh access/refresh pair bound to a user and their current role.
    pub fn mint_pair(&self, user_id: i64, role: Role) -> ServiceResult<TokenPair> {
        Ok(TokenPair {
            access_token: self.mint(user_id, role, TokenKind::Access, self.access_ttl)?,
            refresh_token: self.mint(user_id, role, TokenKind::Refresh, self.refresh_ttl)?,
        })
    }

    fn mint(
        &self,
        user_id: i64,
        role: Role,
        kind: TokenKind,
        ttl: Duration,
    ) -> ServiceResult<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            role,
            kind,
            iat: now.timestamp() as usize,
            exp: (now + ttl).timestamp() as usize,
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| ServiceError::validation(format!("token generation failed: {}", e)))
    }

    /// Validate an access token. Expiry maps to `TokenExpired` so the
    /// middleware can fall through to the refresh path; any other failure is
    /// `InvalidToken`.
    pub fn verify_access(&self, token: &str) -> ServiceResult<Claims> {
        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => ServiceError::TokenExpired,
                _ => ServiceError::InvalidToken,
            })?;

        if claims.kind != TokenKind::Access {
            return Err(ServiceError::InvalidToken);
        }
        Ok(claims)
    }

    /// Validate a refresh token. Every failure collapses to `RefreshInvalid`:
    /// the caller's only remedy is a full init-data exchange.
    pub fn verify_refresh(&self, token: &str) -> ServiceResult<Claims> {
        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| ServiceError::refresh_invalid(e.to_string()))?;

        if claims.kind != TokenKind::Refresh {
            return Err(ServiceError::refresh_invalid("wrong token kind"));
        }
        Ok(claims)
    }

}
