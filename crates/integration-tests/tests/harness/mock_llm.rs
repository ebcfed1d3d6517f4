//! Mock OpenAI-compatible backend for integration tests
//!
//! One instance stands in for one tier. The mock serving the low tier can
//! also answer complexity evaluation prompts with a canned judgment.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Body;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router, routing};
use bytes::Bytes;
use futures_util::StreamExt;
use futures_util::stream;
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;

/// Leading words of the evaluator's system prompt
const EVALUATION_PROMPT_PREFIX: &str = "You rate how demanding";

/// How the mock answers streamed completions
#[derive(Clone, Copy, PartialEq, Eq)]
enum StreamMode {
    Complete,
    /// One chunk, then the connection drops
    Broken,
    /// One chunk, then nothing while the connection stays open
    Stalled,
}

struct MockOptions {
    name: String,
    fail_count: u32,
    evaluation: Option<String>,
    stream_mode: StreamMode,
}

/// Mock tier backend that returns predictable responses
pub struct MockLlm {
    addr: SocketAddr,
    shutdown: CancellationToken,
    state: Arc<MockLlmState>,
}

struct MockLlmState {
    options: MockOptions,
    /// Forwarded completions, evaluation calls excluded
    completion_count: AtomicU32,
    evaluation_count: AtomicU32,
    /// Remaining forwarded completions to fail with 500
    fail_remaining: AtomicU32,
    models: Mutex<Vec<String>>,
}

impl MockLlm {
    /// Start a mock that answers every completion with `hello from <name>`
    pub async fn start(name: &str) -> anyhow::Result<Self> {
        Self::start_inner(MockOptions {
            name: name.to_owned(),
            fail_count: 0,
            evaluation: None,
            stream_mode: StreamMode::Complete,
        })
        .await
    }

    /// Start a mock that fails the first `n` forwarded completions with 500
    pub async fn start_failing(name: &str, n: u32) -> anyhow::Result<Self> {
        Self::start_inner(MockOptions {
            name: name.to_owned(),
            fail_count: n,
            evaluation: None,
            stream_mode: StreamMode::Complete,
        })
        .await
    }

    /// Start a mock that answers evaluation prompts with `evaluation`
    pub async fn start_evaluator(name: &str, evaluation: &Value) -> anyhow::Result<Self> {
        Self::start_evaluator_raw(name, &evaluation.to_string()).await
    }

    /// Start a mock that answers evaluation prompts with raw text
    pub async fn start_evaluator_raw(name: &str, reply: &str) -> anyhow::Result<Self> {
        Self::start_inner(MockOptions {
            name: name.to_owned(),
            fail_count: 0,
            evaluation: Some(reply.to_owned()),
            stream_mode: StreamMode::Complete,
        })
        .await
    }

    /// Start a mock whose streamed responses break after the first chunk
    pub async fn start_broken_stream(name: &str) -> anyhow::Result<Self> {
        Self::start_inner(MockOptions {
            name: name.to_owned(),
            fail_count: 0,
            evaluation: None,
            stream_mode: StreamMode::Broken,
        })
        .await
    }

    /// Start a mock whose streamed responses go silent after the first chunk
    pub async fn start_stalled_stream(name: &str) -> anyhow::Result<Self> {
        Self::start_inner(MockOptions {
            name: name.to_owned(),
            fail_count: 0,
            evaluation: None,
            stream_mode: StreamMode::Stalled,
        })
        .await
    }

    async fn start_inner(options: MockOptions) -> anyhow::Result<Self> {
        let state = Arc::new(MockLlmState {
            completion_count: AtomicU32::new(0),
            evaluation_count: AtomicU32::new(0),
            fail_remaining: AtomicU32::new(options.fail_count),
            models: Mutex::new(Vec::new()),
            options,
        });

        let app = Router::new()
            .route("/v1/chat/completions", routing::post(handle_chat_completions))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let shutdown = CancellationToken::new();
        let shutdown_clone = shutdown.clone();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    shutdown_clone.cancelled().await;
                })
                .await
                .ok();
        });

        Ok(Self { addr, shutdown, state })
    }

    /// Base URL for configuring the mock as a tier backend
    ///
    /// Includes `/v1` since the provider appends `/chat/completions`
    pub fn base_url(&self) -> String {
        format!("http://{}/v1", self.addr)
    }

    /// Forwarded completions received, including failed ones
    pub fn completion_count(&self) -> u32 {
        self.state.completion_count.load(Ordering::Relaxed)
    }

    /// Evaluation prompts received
    pub fn evaluation_count(&self) -> u32 {
        self.state.evaluation_count.load(Ordering::Relaxed)
    }

    /// Model names of the forwarded completions, in arrival order
    pub fn models(&self) -> Vec<String> {
        self.state.models.lock().expect("mock state lock").clone()
    }

    /// Text every successful completion from this mock carries
    pub fn reply(&self) -> String {
        format!("hello from {}", self.state.options.name)
    }
}

impl Drop for MockLlm {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

fn is_evaluation(request: &Value) -> bool {
    request
        .pointer("/messages/0/content")
        .and_then(Value::as_str)
        .is_some_and(|content| content.starts_with(EVALUATION_PROMPT_PREFIX))
}

async fn handle_chat_completions(State(state): State<Arc<MockLlmState>>, Json(request): Json<Value>) -> Response {
    let model = request["model"].as_str().unwrap_or_default().to_owned();

    if is_evaluation(&request) {
        state.evaluation_count.fetch_add(1, Ordering::Relaxed);
        let reply = state
            .options
            .evaluation
            .clone()
            .unwrap_or_else(|| format!("hello from {}", state.options.name));
        return Json(completion_body(&model, &reply)).into_response();
    }

    state.completion_count.fetch_add(1, Ordering::Relaxed);
    state.models.lock().expect("mock state lock").push(model.clone());

    let remaining = state.fail_remaining.load(Ordering::Relaxed);
    if remaining > 0 {
        state.fail_remaining.fetch_sub(1, Ordering::Relaxed);
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "error": {
                    "message": "mock server intentional failure",
                    "type": "server_error"
                }
            })),
        )
            .into_response();
    }

    let content = format!("hello from {}", state.options.name);

    if request["stream"].as_bool().unwrap_or(false) {
        return match state.options.stream_mode {
            StreamMode::Complete => streaming_response(&model, &content),
            StreamMode::Broken => broken_streaming_response(&model),
            StreamMode::Stalled => stalled_streaming_response(&model),
        };
    }

    Json(completion_body(&model, &content)).into_response()
}

fn completion_body(model: &str, content: &str) -> Value {
    json!({
        "id": "chatcmpl-test-123",
        "object": "chat.completion",
        "created": 1_700_000_000,
        "model": model,
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }],
        "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15}
    })
}

fn chunk(model: &str, delta: &Value, finish_reason: Option<&str>) -> String {
    let chunk = json!({
        "id": "chatcmpl-test-stream",
        "object": "chat.completion.chunk",
        "created": 1_700_000_000,
        "model": model,
        "choices": [{"index": 0, "delta": delta, "finish_reason": finish_reason}]
    });
    format!("data: {chunk}\n\n")
}

fn sse(body: Body) -> Response {
    (StatusCode::OK, [(header::CONTENT_TYPE, "text/event-stream")], body).into_response()
}

/// Role chunk, one chunk per word, finish chunk, usage chunk, `[DONE]`
fn streaming_response(model: &str, content: &str) -> Response {
    let mut body = chunk(model, &json!({"role": "assistant", "content": ""}), None);

    for word in content.split_whitespace() {
        body.push_str(&chunk(model, &json!({"content": format!("{word} ")}), None));
    }

    body.push_str(&chunk(model, &json!({}), Some("stop")));

    let usage = json!({
        "id": "chatcmpl-test-stream",
        "object": "chat.completion.chunk",
        "created": 1_700_000_000,
        "model": model,
        "choices": [],
        "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15}
    });
    body.push_str(&format!("data: {usage}\n\n"));
    body.push_str("data: [DONE]\n\n");

    sse(Body::from(body))
}

/// First chunk arrives, then the body fails without an end marker
fn broken_streaming_response(model: &str) -> Response {
    let first = Bytes::from(chunk(model, &json!({"role": "assistant", "content": "partial "}), None));

    let body = stream::once(async move { Ok::<_, std::io::Error>(first) }).chain(stream::once(async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        Err(std::io::Error::other("mock connection dropped"))
    }));

    sse(Body::from_stream(body))
}

/// First chunk arrives, then the body never yields again
fn stalled_streaming_response(model: &str) -> Response {
    let first = Bytes::from(chunk(model, &json!({"role": "assistant", "content": "partial "}), None));

    let body = stream::once(async move { Ok::<_, std::io::Error>(first) }).chain(stream::pending());

    sse(Body::from_stream(body))
}
