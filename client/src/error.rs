//! Client-side error taxonomy.

use thiserror::Error;

/// Errors surfaced by [`crate::ApiClient`].
///
/// `Unauthenticated` is terminal for the current attempt: every automatic
/// recovery path (silent refresh, full re-authentication) has already been
/// tried exactly once before it is returned.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("unauthenticated: {reason}")]
    Unauthenticated { reason: String },

    #[error("api error: status {status}: {body}")]
    Api {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
}
