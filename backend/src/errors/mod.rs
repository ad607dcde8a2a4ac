//! Service-layer error types shared across the backend.

use thiserror::Error;

/// Generic service error used across the auth subsystem.
///
/// The init-data rejection reasons are deliberately separate variants so
/// callers and logs can distinguish "the WebApp was not opened inside the
/// host" from "the host sent a forged or stale payload".
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Init data missing: request did not originate from the embedding host")]
    NotEmbedded,

    #[error("Init data payload is empty")]
    EmptyPayload,

    #[error("Init data signature mismatch")]
    BadSignature,

    #[error("Init data auth_date outside the allowed window")]
    StaleTimestamp,

    #[error("Access token expired")]
    TokenExpired,

    #[error("Invalid access token")]
    InvalidToken,

    #[error("Refresh token rejected: {message}")]
    RefreshInvalid { message: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("{entity} not found: {identifier}")]
    NotFound { entity: String, identifier: String },

    #[error("Permission denied: {message}")]
    PermissionDenied { message: String },

    #[error("Database error: {source}")]
    Database {
        #[from]
        source: anyhow::Error,
    },
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl ServiceError {
    // Helper constructors for common patterns

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn refresh_invalid(message: impl Into<String>) -> Self {
        Self::RefreshInvalid {
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn not_found(entity: impl Into<String>, identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity: entity.into(),
            identifier: identifier.into(),
        }
    }

    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self::PermissionDenied {
            message: message.into(),
        }
    }

    /// Machine-readable reason string carried in error response bodies.
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::Configuration { .. } => "configuration_error",
            Self::NotEmbedded => "not_embedded",
            Self::EmptyPayload => "empty_payload",
            Self::BadSignature => "bad_signature",
            Self::StaleTimestamp => "stale_timestamp",
            Self::TokenExpired => "token_expired",
            Self::InvalidToken => "invalid_token",
            Self::RefreshInvalid { .. } => "refresh_invalid",
            Self::Validation { .. } => "validation_error",
            Self::NotFound { .. } => "not_found",
            Self::PermissionDenied { .. } => "permission_denied",
            Self::Database { .. } => "database_error",
        }
    }
}
