//! Retry-policy tests against an in-process mock backend.
//!
//! The mock speaks the backend's wire contract (cookie transport, error
//! envelope with a machine-readable reason) and counts every hit, so each
//! test can assert the exact number of attempts the policy made.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};

use tourline_client::client_id::ClientIdSource;
use tourline_client::error::ClientError;
use tourline_client::{ApiClient, ClientConfig, InitDataSource};

const GOOD_ACCESS: &str = "access-ok";
const VALID_INIT_DATA: &str = "signed-init-data";

#[derive(Default)]
struct MockState {
    data_hits: AtomicUsize,
    refresh_hits: AtomicUsize,
    exchange_hits: AtomicUsize,
    logout_hits: AtomicUsize,
    refresh_works: AtomicBool,
}

type Shared = Arc<MockState>;

fn has_good_access(headers: &HeaderMap) -> bool {
    headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|c| c.contains(&format!("access_token={}", GOOD_ACCESS)))
}

fn error_envelope(reason: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(serde_json::json!({
            "success": false,
            "error": { "error_type": reason },
        })),
    )
        .into_response()
}

fn with_session_cookies(body: serde_json::Value) -> Response {
    let mut response = Json(body).into_response();
    let headers = response.headers_mut();
    headers.append(
        header::SET_COOKIE,
        format!("access_token={}; Path=/; HttpOnly", GOOD_ACCESS)
            .parse()
            .unwrap(),
    );
    headers.append(
        header::SET_COOKIE,
        "refresh_token=refresh-ok; Path=/; HttpOnly".parse().unwrap(),
    );
    response
}

async fn data_handler(State(state): State<Shared>, headers: HeaderMap) -> Response {
    state.data_hits.fetch_add(1, Ordering::SeqCst);
    if has_good_access(&headers) {
        Json(serde_json::json!({ "items": ["tour-1"] })).into_response()
    } else {
        error_envelope("token_expired")
    }
}

async fn refresh_handler(State(state): State<Shared>, headers: HeaderMap) -> Response {
    state.refresh_hits.fetch_add(1, Ordering::SeqCst);
    let has_refresh = headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|c| c.contains("refresh_token="));
    if state.refresh_works.load(Ordering::SeqCst) && has_refresh {
        with_session_cookies(serde_json::json!({ "refreshed": true }))
    } else {
        error_envelope("refresh_invalid")
    }
}

async fn exchange_handler(
    State(state): State<Shared>,
    Json(body): Json<serde_json::Value>,
) -> Response {
    state.exchange_hits.fetch_add(1, Ordering::SeqCst);
    match body.get("init_data").and_then(|v| v.as_str()) {
        None => error_envelope("not_embedded"),
        Some("") => error_envelope("empty_payload"),
        Some(VALID_INIT_DATA) => with_session_cookies(serde_json::json!({
            "user": { "id": 42, "role": "bot_user", "first": "Ada", "last": null, "username": "ada" },
        })),
        Some(_) => error_envelope("bad_signature"),
    }
}

async fn logout_handler(State(state): State<Shared>) -> StatusCode {
    state.logout_hits.fetch_add(1, Ordering::SeqCst);
    StatusCode::NO_CONTENT
}

async fn spawn_mock() -> (String, Shared) {
    let state: Shared = Arc::new(MockState::default());
    let router = Router::new()
        .route("/api/data", get(data_handler))
        .route("/auth/refresh", post(refresh_handler))
        .route("/auth/telegram", post(exchange_handler))
        .route("/auth/logout", post(logout_handler))
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    (format!("http://{}", addr), state)
}

struct FixedInitData(Option<&'static str>);

impl InitDataSource for FixedInitData {
    fn init_data(&self) -> Option<String> {
        self.0.map(str::to_string)
    }
}

struct FixedClientId(Option<&'static str>);

#[async_trait]
impl ClientIdSource for FixedClientId {
    async fn resolve(&self) -> Option<String> {
        self.0.map(str::to_string)
    }
}

fn client(base_url: &str, init_data: Option<&'static str>) -> ApiClient {
    ApiClient::new(
        ClientConfig::new(base_url),
        Box::new(FixedInitData(init_data)),
        Box::new(FixedClientId(None)),
    )
    .unwrap()
}

#[tokio::test]
async fn authenticated_request_goes_straight_through() {
    let (base_url, state) = spawn_mock().await;
    state.refresh_works.store(true, Ordering::SeqCst);
    let api = client(&base_url, Some(VALID_INIT_DATA));

    api.authenticate().await.unwrap();
    state.exchange_hits.store(0, Ordering::SeqCst);

    let body: serde_json::Value = api.get_json("/api/data").await.unwrap();
    assert_eq!(body["items"][0], "tour-1");

    // No recovery machinery fired.
    assert_eq!(state.data_hits.load(Ordering::SeqCst), 1);
    assert_eq!(state.refresh_hits.load(Ordering::SeqCst), 0);
    assert_eq!(state.exchange_hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn unauthorized_request_refreshes_once_then_retries_once() {
    let (base_url, state) = spawn_mock().await;
    state.refresh_works.store(true, Ordering::SeqCst);
    let api = client(&base_url, Some(VALID_INIT_DATA));

    // No cookies at all: first attempt 401, refresh fails (no refresh
    // cookie yet), re-auth succeeds, retry succeeds.
    let body: serde_json::Value = api.get_json("/api/data").await.unwrap();
    assert_eq!(body["items"][0], "tour-1");

    assert_eq!(state.data_hits.load(Ordering::SeqCst), 2);
    assert_eq!(state.refresh_hits.load(Ordering::SeqCst), 1);
    assert_eq!(state.exchange_hits.load(Ordering::SeqCst), 1);
    assert_eq!(api.authenticated_user_id(), Some(42));
}

#[tokio::test]
async fn failed_refresh_falls_back_to_reauthentication() {
    let (base_url, state) = spawn_mock().await;
    // Refresh endpoint rejects everything; only the exchange can recover.
    state.refresh_works.store(false, Ordering::SeqCst);
    let api = client(&base_url, Some(VALID_INIT_DATA));

    let body: serde_json::Value = api.get_json("/api/data").await.unwrap();
    assert_eq!(body["items"][0], "tour-1");

    assert_eq!(state.data_hits.load(Ordering::SeqCst), 2);
    assert_eq!(state.refresh_hits.load(Ordering::SeqCst), 1);
    assert_eq!(state.exchange_hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn not_embedded_is_terminal_with_bounded_attempts() {
    let (base_url, state) = spawn_mock().await;
    state.refresh_works.store(false, Ordering::SeqCst);
    let api = client(&base_url, None);

    let err = api
        .get_json::<serde_json::Value>("/api/data")
        .await
        .unwrap_err();
    match err {
        ClientError::Unauthenticated { reason } => assert_eq!(reason, "not_embedded"),
        other => panic!("expected Unauthenticated, got {:?}", other),
    }

    // One data attempt, one refresh attempt, one exchange attempt. Never
    // more, never a loop.
    assert_eq!(state.data_hits.load(Ordering::SeqCst), 1);
    assert_eq!(state.refresh_hits.load(Ordering::SeqCst), 1);
    assert_eq!(state.exchange_hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn tampered_init_data_surfaces_backend_reason() {
    let (base_url, state) = spawn_mock().await;
    state.refresh_works.store(false, Ordering::SeqCst);
    let api = client(&base_url, Some("forged-init-data"));

    let err = api
        .get_json::<serde_json::Value>("/api/data")
        .await
        .unwrap_err();
    match err {
        ClientError::Unauthenticated { reason } => assert_eq!(reason, "bad_signature"),
        other => panic!("expected Unauthenticated, got {:?}", other),
    }
    assert_eq!(state.exchange_hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn direct_auth_calls_are_never_retried() {
    let (base_url, state) = spawn_mock().await;
    state.refresh_works.store(false, Ordering::SeqCst);
    let api = client(&base_url, Some(VALID_INIT_DATA));

    let err = api.refresh().await.unwrap_err();
    match err {
        ClientError::Unauthenticated { reason } => assert_eq!(reason, "refresh_invalid"),
        other => panic!("expected Unauthenticated, got {:?}", other),
    }
    assert_eq!(state.refresh_hits.load(Ordering::SeqCst), 1);
    assert_eq!(state.exchange_hits.load(Ordering::SeqCst), 0);
}

/// Raw TCP server that drops the first `drop_first` connections outright and
/// answers anything after that with a fixed JSON body. Lets a test fail a
/// request at the network level rather than with an HTTP status.
async fn spawn_flaky_server(drop_first: usize) -> (String, Arc<AtomicUsize>) {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let connections = Arc::new(AtomicUsize::new(0));
    let counter = connections.clone();

    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                break;
            };
            let n = counter.fetch_add(1, Ordering::SeqCst);
            if n < drop_first {
                // Dropping the socket kills the connection mid-request.
                continue;
            }
            tokio::spawn(async move {
                let mut buf = [0u8; 1024];
                let _ = socket.read(&mut buf).await;
                let body = r#"{"items":["tour-1"]}"#;
                let response = format!(
                    "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    (format!("http://{}", addr), connections)
}

#[tokio::test]
async fn transport_failure_is_retried_exactly_once() {
    let (base_url, connections) = spawn_flaky_server(1).await;
    let api = client(&base_url, Some(VALID_INIT_DATA));

    let body: serde_json::Value = api.get_json("/api/data").await.unwrap();
    assert_eq!(body["items"][0], "tour-1");
    // First connection dropped, second served: no third attempt.
    assert_eq!(connections.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn persistent_transport_failure_surfaces_after_one_retry() {
    let (base_url, connections) = spawn_flaky_server(usize::MAX).await;
    let api = client(&base_url, Some(VALID_INIT_DATA));

    let err = api
        .get_json::<serde_json::Value>("/api/data")
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Transport(_)));
    assert_eq!(connections.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn logout_clears_the_remembered_user() {
    let (base_url, state) = spawn_mock().await;
    state.refresh_works.store(true, Ordering::SeqCst);
    let api = client(&base_url, Some(VALID_INIT_DATA));

    api.authenticate().await.unwrap();
    assert_eq!(api.authenticated_user_id(), Some(42));

    api.logout().await.unwrap();
    assert_eq!(api.authenticated_user_id(), None);
    assert_eq!(state.logout_hits.load(Ordering::SeqCst), 1);
}

/// Attribution never blocks a request: with an id the header is attached,
/// without one the request goes out bare.
#[tokio::test]
async fn client_id_failure_does_not_block_requests() {
    let (base_url, state) = spawn_mock().await;
    state.refresh_works.store(true, Ordering::SeqCst);

    let api = ApiClient::new(
        ClientConfig::new(&base_url),
        Box::new(FixedInitData(Some(VALID_INIT_DATA))),
        Box::new(FixedClientId(None)),
    )
    .unwrap();
    let user = api.authenticate().await.unwrap();
    assert_eq!(user.id, 42);

    let api = ApiClient::new(
        ClientConfig::new(&base_url),
        Box::new(FixedInitData(Some(VALID_INIT_DATA))),
        Box::new(FixedClientId(Some("17123.456789"))),
    )
    .unwrap();
    let user = api.authenticate().await.unwrap();
    assert_eq!(user.username.as_deref(), Some("ada"));
}
