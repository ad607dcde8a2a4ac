//! Response envelope and service-error to HTTP mapping.
//!
//! Every error body carries a human-readable `message` plus a
//! machine-readable `error_type` (e.g. `bad_signature`, `refresh_invalid`)
//! that the client interceptor branches on during recovery. Auth failures
//! short-circuit with 401 before any handler runs.

use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

use crate::errors::ServiceError;

/// Response envelope shared by every endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Human-readable summary; never the branching target for clients.
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorDetails>,
    pub timestamp: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetails {
    /// Machine-readable reason, e.g. `refresh_invalid`. Clients branch on
    /// this during recovery.
    pub error_type: String,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: message.into(),
            error: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn error(message: impl Into<String>, error_type: impl Into<String>) -> ApiResponse<()> {
        ApiResponse {
            success: false,
            data: None,
            message: message.into(),
            error: Some(ErrorDetails {
                error_type: error_type.into(),
            }),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Converts ServiceError to appropriate HTTP response with standard format
pub fn service_error_to_http(error: ServiceError) -> (StatusCode, String) {
    let error_type = error.error_type();

    let (status, message) = match error {
        ServiceError::Configuration { message } => {
            tracing::error!("configuration error surfaced per-request: {}", message);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            )
        }
        ServiceError::NotEmbedded
        | ServiceError::EmptyPayload
        | ServiceError::BadSignature
        | ServiceError::StaleTimestamp
        | ServiceError::TokenExpired
        | ServiceError::InvalidToken => (StatusCode::UNAUTHORIZED, error.to_string()),
        ServiceError::RefreshInvalid { message } => (
            StatusCode::UNAUTHORIZED,
            format!("Refresh token rejected: {}", message),
        ),
        ServiceError::Validation { message } => (StatusCode::BAD_REQUEST, message),
        ServiceError::NotFound { entity, identifier } => (
            StatusCode::NOT_FOUND,
            format!("{} '{}' not found", entity, identifier),
        ),
        ServiceError::PermissionDenied { message } => (StatusCode::FORBIDDEN, message),
        ServiceError::Database { source } => {
            tracing::error!("Database error: {}", source);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            )
        }
    };

    let error_response = ApiResponse::<()>::error(message, error_type);
    (status, serde_json::to_string(&error_response).unwrap())
}
