//! Axum route handlers for the OpenAI-compatible surface

use std::convert::Infallible;

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router, routing};
use futures_util::{Stream, StreamExt};
use serde::Serialize;
use tiergate_core::{HttpError, error_envelope};
use tiergate_telemetry::StatsSnapshot;

use crate::error::LlmError;
use crate::provider::ChunkStream;
use crate::state::LlmState;
use crate::types::{ChatCompletionRequest, StreamEvent};

/// Build the LLM router with all endpoints
pub fn llm_router(state: LlmState) -> Router {
    Router::new()
        .route("/v1/chat/completions", routing::post(chat_completions))
        .route("/v1/models", routing::get(list_models))
        .route("/v1/stats", routing::get(stats))
        .route("/v1/stats/reset", routing::post(reset_stats))
        .with_state(state)
}

/// Handle `POST /v1/chat/completions`
async fn chat_completions(State(state): State<LlmState>, Json(request): Json<ChatCompletionRequest>) -> Response {
    if request.messages.is_empty() {
        return error_response(&LlmError::InvalidRequest("messages must not be empty".to_owned()));
    }

    if request.is_stream() {
        match state.complete_stream(request).await {
            Ok(stream) => sse_response(stream).into_response(),
            Err(e) => error_response(&e),
        }
    } else {
        match state.complete(request).await {
            Ok(body) => Json(body).into_response(),
            Err(e) => error_response(&e),
        }
    }
}

#[derive(Serialize)]
struct ModelList {
    object: &'static str,
    data: Vec<ModelEntry>,
}

#[derive(Serialize)]
struct ModelEntry {
    id: String,
    object: &'static str,
    created: i64,
    owned_by: String,
}

/// Handle `GET /v1/models`
async fn list_models(State(state): State<LlmState>) -> Json<ModelList> {
    let created = jiff::Timestamp::now().as_second();

    let data = state
        .advertised_models()
        .into_iter()
        .map(|id| ModelEntry {
            id,
            object: "model",
            created,
            owned_by: state.namespace().to_owned(),
        })
        .collect();

    Json(ModelList { object: "list", data })
}

/// Handle `GET /v1/stats`
async fn stats(State(state): State<LlmState>) -> Json<StatsSnapshot> {
    Json(state.telemetry().snapshot())
}

/// Handle `POST /v1/stats/reset`
async fn reset_stats(State(state): State<LlmState>) -> Json<StatsSnapshot> {
    state.telemetry().reset();
    Json(state.telemetry().snapshot())
}

/// One `data:` event per chunk, `[DONE]` at the end, or a single error event
fn sse_response(stream: ChunkStream) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let events = stream.map(|item| {
        let data = match item {
            Ok(StreamEvent::Chunk(chunk)) => chunk.to_string(),
            Ok(StreamEvent::Done) => "[DONE]".to_owned(),
            Err(e) => error_envelope(&e).to_string(),
        };
        Ok(Event::default().data(data))
    });

    Sse::new(events).keep_alive(KeepAlive::default())
}

/// Convert an LLM error to an OpenAI-style JSON error response
fn error_response(error: &LlmError) -> Response {
    (error.status_code(), Json(error_envelope(error))).into_response()
}
