//! OpenAI-compatible provider implementation

use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::{Client, Response};
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tiergate_config::TierConfig;
use url::Url;

use super::{ChunkStream, Provider};
use crate::error::LlmError;
use crate::sse::SseLineBuffer;
use crate::types::{ChatCompletionRequest, StreamEvent};

/// Default `OpenAI` API base URL
const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Longest error body quoted back from a failing backend
const MAX_ERROR_BODY: usize = 512;

/// OpenAI-compatible provider
pub struct OpenAiProvider {
    name: String,
    client: Client,
    completions_url: String,
    api_key: Option<SecretString>,
    timeout: Duration,
}

impl OpenAiProvider {
    /// Create from tier configuration
    ///
    /// `timeout` bounds connecting and receiving response headers. Buffered
    /// responses are also bounded while the body is read; streamed responses
    /// are bounded per read, so a stalled stream ends with a timeout.
    pub fn new(name: impl Into<String>, config: &TierConfig, timeout: Duration) -> Result<Self, LlmError> {
        let base_url = match &config.base_url {
            Some(url) => url.clone(),
            None => Url::parse(DEFAULT_BASE_URL).map_err(|e| anyhow::anyhow!("invalid default base URL: {e}"))?,
        };

        Ok(Self {
            name: name.into(),
            client: Client::new(),
            completions_url: completions_url(&base_url),
            api_key: config.api_key.clone(),
            timeout,
        })
    }

    async fn send(&self, request: &ChatCompletionRequest) -> Result<Response, LlmError> {
        let mut builder = self.client.post(&self.completions_url).json(request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key.expose_secret());
        }

        let response = builder.send().await.map_err(|e| {
            tracing::error!(provider = %self.name, error = %e, "upstream request failed");
            LlmError::Upstream(e.to_string())
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(provider = %self.name, status = %status, "upstream returned error");
            return Err(LlmError::Upstream(format!(
                "provider returned {status}: {}",
                truncate(&body, MAX_ERROR_BODY)
            )));
        }

        Ok(response)
    }

    async fn exchange(&self, request: &ChatCompletionRequest) -> Result<Value, LlmError> {
        let response = self.send(request).await?;

        response
            .json()
            .await
            .map_err(|e| LlmError::Upstream(format!("failed to parse response: {e}")))
    }
}

#[async_trait]
impl Provider for OpenAiProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, request: &ChatCompletionRequest) -> Result<Value, LlmError> {
        tokio::time::timeout(self.timeout, self.exchange(request))
            .await
            .map_err(|_| LlmError::Timeout(self.timeout))?
    }

    async fn complete_stream(&self, request: &ChatCompletionRequest) -> Result<ChunkStream, LlmError> {
        let mut wire_request = request.clone();
        wire_request.stream = Some(true);

        let response = tokio::time::timeout(self.timeout, self.send(&wire_request))
            .await
            .map_err(|_| LlmError::Timeout(self.timeout))??;

        let name = self.name.clone();
        let idle = self.timeout;
        let mut body = Box::pin(response.bytes_stream());

        let stream = async_stream::stream! {
            let mut buffer = SseLineBuffer::new();

            loop {
                let Ok(read) = tokio::time::timeout(idle, body.next()).await else {
                    tracing::warn!(provider = %name, idle = ?idle, "upstream stream stalled");
                    yield Err(LlmError::Timeout(idle));
                    return;
                };
                let Some(read) = read else {
                    break;
                };

                let bytes = match read {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        tracing::warn!(provider = %name, error = %e, "upstream stream read failed");
                        yield Err(LlmError::Streaming(e.to_string()));
                        return;
                    }
                };

                for event in buffer.push(&bytes) {
                    let done = event == StreamEvent::Done;
                    yield Ok(event);
                    if done {
                        return;
                    }
                }
            }

            if let Some(event) = buffer.finish() {
                let done = event == StreamEvent::Done;
                yield Ok(event);
                if done {
                    return;
                }
            }

            tracing::debug!(provider = %name, "upstream stream closed without terminal sentinel");
            yield Ok(StreamEvent::Done);
        };

        Ok(Box::pin(stream))
    }
}

/// `<base>/chat/completions`, tolerating a trailing slash on the base
fn completions_url(base_url: &Url) -> String {
    let base = base_url.as_str().trim_end_matches('/');
    format!("{base}/chat/completions")
}

fn truncate(text: &str, max_chars: usize) -> &str {
    text.char_indices().nth(max_chars).map_or(text, |(index, _)| &text[..index])
}
