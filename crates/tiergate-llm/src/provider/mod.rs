//! Provider trait and the OpenAI-compatible HTTP backend

pub mod openai;

use std::pin::Pin;

use async_trait::async_trait;
use futures_util::Stream;
use serde_json::Value;

use crate::error::LlmError;
use crate::types::{ChatCompletionRequest, StreamEvent};

/// Stream of parsed completion chunks
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<StreamEvent, LlmError>> + Send>>;

/// A backend that serves chat completions
#[async_trait]
pub trait Provider: Send + Sync {
    /// Human-readable provider name
    fn name(&self) -> &str;

    /// Send a non-streaming completion request, returning the raw response body
    async fn complete(&self, request: &ChatCompletionRequest) -> Result<Value, LlmError>;

    /// Send a streaming completion request
    ///
    /// Errors returned here happen before any chunk was produced; errors
    /// inside the stream happen after.
    async fn complete_stream(&self, request: &ChatCompletionRequest) -> Result<ChunkStream, LlmError>;
}
