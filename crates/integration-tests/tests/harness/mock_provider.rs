//! Mock vendor backend for integration tests.
//!
//! Speaks the three wire formats `ultra-providers` adapters expect
//! (OpenAI chat completions, Anthropic messages, Google `generateContent`)
//! off of one shared bit of state, so a single `MockProvider` instance can
//! stand in for whichever adapter a test's `ProviderKind` selects.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Json, Router, routing};
use serde_json::json;
use tokio_util::sync::CancellationToken;

/// A running mock vendor backend.
pub struct MockProvider {
    addr: SocketAddr,
    shutdown: CancellationToken,
    state: Arc<MockState>,
}

struct MockState {
    call_count: AtomicU32,
    fail_times: AtomicU32,
    probe_fails: AtomicBool,
    response_text: String,
    delay: Option<Duration>,
}

impl MockProvider {
    /// Start a backend that always succeeds with `response_text`.
    pub async fn start(response_text: &str) -> anyhow::Result<Self> {
        Self::start_inner(response_text, 0, None, false).await
    }

    /// Start a backend whose generation calls always return HTTP 500
    /// (exhausting the adapter's retry budget), while still answering
    /// health probes successfully.
    pub async fn start_failing(response_text: &str) -> anyhow::Result<Self> {
        Self::start_inner(response_text, u32::MAX, None, false).await
    }

    /// Start a backend whose generation calls take `delay` before
    /// answering, for exercising stage/pipeline deadlines.
    pub async fn start_slow(response_text: &str, delay: Duration) -> anyhow::Result<Self> {
        Self::start_inner(response_text, 0, Some(delay), false).await
    }

    /// Start a backend whose health probe endpoint always fails, so the
    /// Health Probe marks this provider `unavailable`.
    pub async fn start_unavailable() -> anyhow::Result<Self> {
        Self::start_inner("unused", 0, None, true).await
    }

    async fn start_inner(response_text: &str, fail_times: u32, delay: Option<Duration>, probe_fails: bool) -> anyhow::Result<Self> {
        let state = Arc::new(MockState {
            call_count: AtomicU32::new(0),
            fail_times: AtomicU32::new(fail_times),
            probe_fails: AtomicBool::new(probe_fails),
            response_text: response_text.to_owned(),
            delay,
        });

        let app = Router::new()
            .route("/chat/completions", routing::post(handle_openai))
            .route("/messages", routing::post(handle_anthropic))
            .route("/models/{model_action}", routing::post(handle_google_generate))
            .route("/models", routing::get(handle_probe))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let shutdown = CancellationToken::new();
        let shutdown_clone = shutdown.clone();

        tokio::spawn(async move {
            axum::serve(listener, app).with_graceful_shutdown(async move { shutdown_clone.cancelled().await; }).await.ok();
        });

        Ok(Self { addr, shutdown, state })
    }

    /// Base URL to configure as a model's `base_url`.
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Number of generation requests received so far (any wire format).
    pub fn call_count(&self) -> u32 {
        self.state.call_count.load(Ordering::Relaxed)
    }
}

impl Drop for MockProvider {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

async fn handle_probe(State(state): State<Arc<MockState>>) -> impl IntoResponse {
    if state.probe_fails.load(Ordering::Relaxed) {
        return (StatusCode::SERVICE_UNAVAILABLE, Json(json!({"error": "mock backend unavailable"}))).into_response();
    }
    Json(json!({"object": "list", "data": [{"id": "mock-model", "object": "model"}]})).into_response()
}

/// Returns `true` if the caller should answer with a failure response,
/// decrementing the remaining fail count.
async fn should_fail(state: &MockState) -> bool {
    state.call_count.fetch_add(1, Ordering::Relaxed);
    if let Some(delay) = state.delay {
        tokio::time::sleep(delay).await;
    }
    let remaining = state.fail_times.load(Ordering::Relaxed);
    if remaining > 0 {
        let _ = state.fail_times.fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| Some(n.saturating_sub(1)));
        return true;
    }
    false
}

fn vendor_error() -> impl IntoResponse {
    (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"error": {"message": "mock provider intentional failure", "type": "server_error"}})))
}

async fn handle_openai(State(state): State<Arc<MockState>>, Json(_req): Json<serde_json::Value>) -> impl IntoResponse {
    if should_fail(&state).await {
        return vendor_error().into_response();
    }
    Json(json!({
        "id": "chatcmpl-mock",
        "object": "chat.completion",
        "created": 1_700_000_000,
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": state.response_text.clone()},
            "finish_reason": "stop",
        }],
    }))
    .into_response()
}

async fn handle_anthropic(State(state): State<Arc<MockState>>, Json(_req): Json<serde_json::Value>) -> impl IntoResponse {
    if should_fail(&state).await {
        return vendor_error().into_response();
    }
    Json(json!({
        "id": "msg-mock",
        "type": "message",
        "content": [{"type": "text", "text": state.response_text.clone()}],
    }))
    .into_response()
}

async fn handle_google_generate(
    State(state): State<Arc<MockState>>,
    Path(_model_action): Path<String>,
    Json(_req): Json<serde_json::Value>,
) -> impl IntoResponse {
    if should_fail(&state).await {
        return vendor_error().into_response();
    }
    Json(json!({
        "candidates": [{"content": {"parts": [{"text": state.response_text.clone()}]}}],
    }))
    .into_response()
}
