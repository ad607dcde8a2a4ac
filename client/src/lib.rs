//! HTTP client for the Tourline auth backend.
//!
//! Wraps `reqwest` with cookie-jar token transport, analytics client-id
//! attribution and a bounded authentication retry policy. On a 401 the
//! client tries a silent refresh exactly once, then a full init-data
//! re-authentication exactly once, retrying the original request after
//! each recovery step. Requests to the auth endpoints themselves are
//! never retried, which keeps the policy free of recursion.

pub mod client_id;
pub mod error;

use std::sync::Mutex;
use std::time::Duration;

use reqwest::{Method, StatusCode};
use serde::Deserialize;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::client_id::{CachedClientId, ClientIdSource};
use crate::error::ClientError;

pub const CLIENT_ID_HEADER: &str = "X-Client-Id";

/// Source of the raw init-data string from the embedding host.
///
/// `None` means the application is not running embedded, in which case
/// authentication is impossible and the client reports `not_embedded`.
pub trait InitDataSource: Send + Sync {
    fn init_data(&self) -> Option<String>;
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub request_timeout: Duration,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        ClientConfig {
            base_url: base_url.into(),
            request_timeout: Duration::from_secs(10),
        }
    }
}

/// The authenticated user as reported by the backend.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthenticatedUser {
    pub id: i64,
    pub role: String,
    pub first: String,
    pub last: Option<String>,
    pub username: Option<String>,
}

#[derive(Deserialize)]
struct AuthResponseBody {
    user: AuthenticatedUser,
}

#[derive(Serialize)]
struct InitDataExchangeBody {
    init_data: Option<String>,
}

pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    init_data: Box<dyn InitDataSource>,
    client_id: CachedClientId,
    authenticated_user: Mutex<Option<i64>>,
}

impl ApiClient {
    pub fn new(
        config: ClientConfig,
        init_data: Box<dyn InitDataSource>,
        client_id: Box<dyn ClientIdSource>,
    ) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(config.request_timeout)
            .build()?;
        Ok(ApiClient {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            init_data,
            client_id: CachedClientId::new(client_id),
            authenticated_user: Mutex::new(None),
        })
    }

    /// Id of the last successfully authenticated user, if any.
    pub fn authenticated_user_id(&self) -> Option<i64> {
        *self.authenticated_user.lock().unwrap()
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let response = self
            .send_with_retry(Method::GET, path, None::<&()>)
            .await?;
        Self::decode(response).await
    }

    pub async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        let response = self.send_with_retry(Method::POST, path, Some(body)).await?;
        Self::decode(response).await
    }

    /// Exchange init-data for a fresh cookie pair.
    ///
    /// Called automatically by the retry policy; also usable directly at
    /// application startup to warm the session.
    pub async fn authenticate(&self) -> Result<AuthenticatedUser, ClientError> {
        let body = InitDataExchangeBody {
            init_data: self.init_data.init_data(),
        };
        let response = self
            .request(Method::POST, "/auth/telegram")
            .await
            .json(&body)
            .send()
            .await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            let reason = Self::error_reason(response).await;
            return Err(ClientError::Unauthenticated { reason });
        }
        let parsed: AuthResponseBody = Self::decode(response).await?;
        *self.authenticated_user.lock().unwrap() = Some(parsed.user.id);
        tracing::info!(user_id = parsed.user.id, "authenticated via init-data exchange");
        Ok(parsed.user)
    }

    /// Rotate the cookie pair using the refresh cookie alone.
    pub async fn refresh(&self) -> Result<(), ClientError> {
        let response = self
            .request(Method::POST, "/auth/refresh")
            .await
            .send()
            .await?;
        if response.status().is_success() {
            return Ok(());
        }
        let reason = Self::error_reason(response).await;
        Err(ClientError::Unauthenticated { reason })
    }

    pub async fn logout(&self) -> Result<(), ClientError> {
        let response = self
            .request(Method::POST, "/auth/logout")
            .await
            .send()
            .await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Api { status, body });
        }
        *self.authenticated_user.lock().unwrap() = None;
        Ok(())
    }

    /// One attempt, then at most one silent refresh and at most one full
    /// re-authentication, each followed by a single retry.
    async fn send_with_retry<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<reqwest::Response, ClientError> {
        let response = match self.attempt(&method, path, body).await {
            Ok(response) => response,
            Err(ClientError::Transport(e)) => {
                // Network failures get one retry; anything after that surfaces.
                tracing::debug!(path, error = %e, "transport failure, retrying once");
                self.attempt(&method, path, body).await?
            }
            Err(e) => return Err(e),
        };
        if response.status() != StatusCode::UNAUTHORIZED || is_auth_path(path) {
            return Ok(response);
        }

        tracing::debug!(path, "request unauthorized, attempting silent refresh");
        if self.refresh().await.is_ok() {
            let response = self.attempt(&method, path, body).await?;
            if response.status() != StatusCode::UNAUTHORIZED {
                return Ok(response);
            }
        }

        tracing::debug!(path, "refresh did not recover, re-authenticating");
        self.authenticate().await?;
        let response = self.attempt(&method, path, body).await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }
        let reason = Self::error_reason(response).await;
        Err(ClientError::Unauthenticated { reason })
    }

    async fn attempt<B: Serialize + ?Sized>(
        &self,
        method: &Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<reqwest::Response, ClientError> {
        let mut builder = self.request(method.clone(), path).await;
        if let Some(body) = body {
            builder = builder.json(body);
        }
        Ok(builder.send().await?)
    }

    async fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let mut builder = self
            .http
            .request(method, format!("{}{}", self.base_url, path));
        if let Some(id) = self.client_id.get().await {
            builder = builder.header(CLIENT_ID_HEADER, id);
        }
        builder
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ClientError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Api { status, body });
        }
        Ok(response.json().await?)
    }

    /// Pull the machine-readable reason out of an error envelope, falling
    /// back to a generic label when the body is not what we expect.
    async fn error_reason(response: reqwest::Response) -> String {
        let body = response.text().await.unwrap_or_default();
        serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|v| {
                v.pointer("/error/error_type")
                    .and_then(|r| r.as_str())
                    .map(str::to_string)
            })
            .unwrap_or_else(|| "unauthorized".to_string())
    }
}

/// Auth endpoints are excluded from the retry policy; their 401s are the
/// policy's own signals, not something to recover from.
fn is_auth_path(path: &str) -> bool {
    path.starts_with("/auth/telegram")
        || path.starts_with("/auth/refresh")
        || path.starts_with("/auth/logout")
}
