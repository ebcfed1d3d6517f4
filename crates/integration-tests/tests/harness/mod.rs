#![allow(dead_code)]

pub mod config;
pub mod mock_llm;
pub mod server;

use serde_json::{Value, json};

use self::config::ConfigBuilder;
use self::mock_llm::MockLlm;

/// Judgment the rules send to `pro` (deep reasoning, score 100)
pub fn pro_evaluation() -> Value {
    json!({
        "reasoning_depth": "high",
        "task_type": "architecture_design",
        "constraint_level": "high",
        "required_accuracy": "high",
        "estimated_token_size": "medium",
        "confidence": 0.9
    })
}

/// Judgment the score bands send to `low` (score 25)
pub fn low_evaluation() -> Value {
    json!({
        "reasoning_depth": "low",
        "task_type": "classification",
        "constraint_level": "low",
        "required_accuracy": "low",
        "estimated_token_size": "small",
        "confidence": 0.9
    })
}

/// Single-turn chat request
pub fn chat_body(model: &str, prompt: &str) -> Value {
    json!({
        "model": model,
        "messages": [{"role": "user", "content": prompt}]
    })
}

/// Single-turn streamed chat request
pub fn stream_body(model: &str, prompt: &str) -> Value {
    json!({
        "model": model,
        "messages": [{"role": "user", "content": prompt}],
        "stream": true
    })
}

/// `data:` payloads of an SSE body, in order
pub fn sse_data(text: &str) -> Vec<String> {
    text.lines()
        .filter_map(|line| line.strip_prefix("data:"))
        .map(|data| data.trim_start().to_owned())
        .collect()
}

/// One mock backend per tier; `low` also answers evaluation prompts
pub struct Tiers {
    pub pro: MockLlm,
    pub mid: MockLlm,
    pub low: MockLlm,
}

impl Tiers {
    /// Healthy backends with `evaluation` as the complexity judgment
    pub async fn start(evaluation: &Value) -> Self {
        Self {
            pro: MockLlm::start("pro").await.expect("start pro mock"),
            mid: MockLlm::start("mid").await.expect("start mid mock"),
            low: MockLlm::start_evaluator("low", evaluation).await.expect("start low mock"),
        }
    }

    /// Configuration pointing every tier at its mock
    pub fn config(&self) -> ConfigBuilder {
        ConfigBuilder::new().with_tiers(&self.pro.base_url(), &self.mid.base_url(), &self.low.base_url())
    }
}
