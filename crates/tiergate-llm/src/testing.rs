//! Scripted providers for unit tests

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::error::LlmError;
use crate::provider::{ChunkStream, Provider};
use crate::types::{ChatCompletionRequest, StreamEvent};

/// One scripted answer, consumed in order
pub enum Reply {
    Body(Value),
    Stream(Vec<Result<StreamEvent, LlmError>>),
    Fail(String),
    /// Never answers
    Hang,
}

pub struct ScriptedProvider {
    name: &'static str,
    replies: Mutex<VecDeque<Reply>>,
    requests: Mutex<Vec<ChatCompletionRequest>>,
    calls: AtomicUsize,
}

impl ScriptedProvider {
    pub fn new(name: &'static str, replies: Vec<Reply>) -> Arc<Self> {
        Arc::new(Self {
            name,
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<ChatCompletionRequest> {
        self.requests.lock().unwrap().clone()
    }

    async fn next(&self, request: &ChatCompletionRequest) -> Reply {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());
        let reply = self.replies.lock().unwrap().pop_front();

        match reply {
            Some(Reply::Hang) => std::future::pending().await,
            Some(reply) => reply,
            None => Reply::Fail(format!("{} has no scripted reply left", self.name)),
        }
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        self.name
    }

    async fn complete(&self, request: &ChatCompletionRequest) -> Result<Value, LlmError> {
        match self.next(request).await {
            Reply::Body(body) => Ok(body),
            Reply::Fail(message) => Err(LlmError::Upstream(message)),
            Reply::Stream(_) | Reply::Hang => Err(LlmError::Upstream("scripted stream on buffered call".to_owned())),
        }
    }

    async fn complete_stream(&self, request: &ChatCompletionRequest) -> Result<ChunkStream, LlmError> {
        match self.next(request).await {
            Reply::Stream(events) => Ok(Box::pin(futures_util::stream::iter(events))),
            Reply::Fail(message) => Err(LlmError::Upstream(message)),
            Reply::Body(_) | Reply::Hang => Err(LlmError::Upstream("scripted body on stream call".to_owned())),
        }
    }
}

/// Buffered chat completion whose first choice says `content`
pub fn chat_body(content: &str) -> Value {
    json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "model": "backend-model",
        "choices": [{"index": 0, "message": {"role": "assistant", "content": content}, "finish_reason": "stop"}]
    })
}

/// Stream chunk carrying `content` as a delta
pub fn delta_chunk(content: &str) -> StreamEvent {
    StreamEvent::Chunk(json!({
        "id": "chatcmpl-test",
        "object": "chat.completion.chunk",
        "model": "backend-model",
        "choices": [{"index": 0, "delta": {"content": content}}]
    }))
}
