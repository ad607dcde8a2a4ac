//! Server-side analytics event posting (Measurement Protocol style).
//!
//! Events are fire-and-forget side effects: a failed or slow post must never
//! change the outcome of the request it is attached to, so every error here
//! is logged at debug level and swallowed.

use axum::{extract::Request, middleware::Next, response::IntoResponse, response::Response};
use axum_extra::extract::cookie::CookieJar;
use std::sync::Arc;
use std::time::Duration;

use crate::auth::cookies::{CLIENT_ID_COOKIE, client_id_cookie};
use crate::config::Config;

const COLLECT_URL: &str = "https://mc.yandex.ru/collect";
pub const CLIENT_ID_HEADER: &str = "x-client-id";

/// Analytics client id for the current request, resolved from the
/// `X-Client-Id` header or the attribution cookie. Absent when the client
/// could not obtain one; handlers must treat that as normal.
#[derive(Debug, Clone)]
pub struct ClientId(pub Option<String>);

struct Inner {
    http: reqwest::Client,
    counter: String,
    token: String,
}

/// Posts attribution events to the analytics collector.
///
/// Cheap to clone; a no-op when the counter/token are not configured or the
/// HTTP client could not be constructed.
#[derive(Clone)]
pub struct AnalyticsService {
    inner: Option<Arc<Inner>>,
}

impl AnalyticsService {
    pub fn new(config: &Config) -> Self {
        let (Some(counter), Some(token)) = (&config.metrika_counter, &config.metrika_token)
        else {
            return AnalyticsService { inner: None };
        };

        let http = match reqwest::Client::builder()
            .timeout(Duration::from_secs(2))
            .build()
        {
            Ok(client) => client,
            Err(e) => {
                tracing::warn!("analytics disabled, http client failed to build: {}", e);
                return AnalyticsService { inner: None };
            }
        };

        AnalyticsService {
            inner: Some(Arc::new(Inner {
                http,
                counter: counter.clone(),
                token: token.clone(),
            })),
        }
    }

    /// Fire-and-forget event post. Returns immediately; the actual request
    /// runs in a background task.
    pub fn track(&self, client_id: &ClientId, action: &'static str, value: Option<i64>) {
        let Some(inner) = self.inner.clone() else {
            return;
        };
        let Some(cid) = client_id.0.clone() else {
            return;
        };

        tokio::spawn(async move {
            let mut params = vec![
                ("tid", inner.counter.clone()),
                ("cid", cid),
                ("t", "event".to_string()),
                ("ea", action.to_string()),
                ("ms", inner.token.clone()),
            ];
            if let Some(v) = value {
                params.push(("ev", v.to_string()));
            }

            if let Err(e) = inner.http.post(COLLECT_URL).query(&params).send().await {
                tracing::debug!("analytics event '{}' dropped: {}", action, e);
            }
        });
    }
}

/// Resolves the analytics client id for every request and mirrors a
/// header-supplied id into the attribution cookie so later visits carry it
/// without the header. Never fails the request.
pub async fn client_id_middleware(mut request: Request, next: Next) -> Response {
    let jar = CookieJar::from_headers(request.headers());

    let header_id = request
        .headers()
        .get(CLIENT_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string());
    let cookie_id = jar.get(CLIENT_ID_COOKIE).map(|c| c.value().to_string());

    let resolved = header_id.clone().or(cookie_id.clone());
    request.extensions_mut().insert(ClientId(resolved));

    let response = next.run(request).await;

    match (header_id, cookie_id) {
        (Some(id), None) => (jar.add(client_id_cookie(id)), response).into_response(),
        _ => response,
    }
}
