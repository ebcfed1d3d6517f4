//! Accessors over raw backend response bodies
//!
//! Backend responses are relayed as opaque JSON; only the fields needed for
//! relabelling and token accounting are read.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Characters per token when a backend reports no usage
pub const CHARS_PER_TOKEN: usize = 4;

/// Approximate token count of `chars` characters
pub fn approx_tokens(chars: usize) -> u64 {
    u64::try_from(chars / CHARS_PER_TOKEN).unwrap_or(u64::MAX)
}

/// Token usage reported by a backend
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub prompt_tokens: u64,
    #[serde(default)]
    pub completion_tokens: u64,
}

impl Usage {
    /// Usage object of a response or stream chunk, if present
    pub fn from_body(body: &Value) -> Option<Self> {
        body.get("usage")
            .filter(|usage| usage.is_object())
            .and_then(|usage| Self::deserialize(usage).ok())
    }
}

/// Characters of assistant text across all choices of a buffered response
pub fn completion_text_chars(body: &Value) -> usize {
    choice_text_chars(body, "message")
}

/// Characters of assistant text across all choices of a stream chunk
pub fn delta_text_chars(chunk: &Value) -> usize {
    choice_text_chars(chunk, "delta")
}

fn choice_text_chars(body: &Value, field: &str) -> usize {
    body.get("choices")
        .and_then(Value::as_array)
        .map_or(0, |choices| {
            choices
                .iter()
                .filter_map(|choice| choice.get(field)?.get("content")?.as_str())
                .map(|text| text.chars().count())
                .sum()
        })
}

/// Replace the `model` field of a response or chunk
pub fn relabel_model(body: &mut Value, model: &str) {
    if let Some(object) = body.as_object_mut() {
        object.insert("model".to_owned(), Value::String(model.to_owned()));
    }
}
