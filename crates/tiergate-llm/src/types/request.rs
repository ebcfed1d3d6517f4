use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::message::{Message, Role};

/// Inbound chat completion request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatCompletionRequest {
    /// Requested model: `auto`, an explicit tier, or anything else
    pub model: String,
    /// Conversation messages
    pub messages: Vec<Message>,
    /// Whether to stream the response
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
    /// Sampling temperature
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    /// Maximum tokens to generate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// Every other request field, forwarded untouched
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ChatCompletionRequest {
    pub fn new(model: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            model: model.into(),
            messages,
            stream: None,
            temperature: None,
            max_tokens: None,
            extra: Map::new(),
        }
    }

    pub fn is_stream(&self) -> bool {
        self.stream.unwrap_or(false)
    }

    /// Copy of the request addressed to `model`
    #[must_use]
    pub fn with_model(&self, model: &str) -> Self {
        let mut request = self.clone();
        model.clone_into(&mut request.model);
        request
    }

    /// Text of every user-authored turn, oldest first
    pub fn user_turns(&self) -> Vec<String> {
        self.messages
            .iter()
            .filter(|m| m.role == Role::User)
            .map(Message::text_content)
            .collect()
    }

    /// Character count of all message text
    pub fn text_chars(&self) -> usize {
        self.messages.iter().map(|m| m.text_content().chars().count()).sum()
    }
}
