//! Complexity evaluator
//!
//! Asks the low-tier backend for a structured judgment of the latest user
//! turn, validates the reply field by field, and memoizes the result by a
//! hash of the user turns. Never fails outward: any error yields the
//! conservative default evaluation.

use std::str::FromStr;
use std::sync::LazyLock;
use std::time::{Duration, Instant};

use serde::Deserialize;
use serde_json::Value;
use strum::IntoEnumIterator;
use thiserror::Error;
use tiergate_cache::{TtlCache, content_hash};
use tiergate_config::EvaluatorConfig;
use tiergate_routing::{ComplexityEvaluation, Level, TaskType, TokenSize};

use crate::error::LlmError;
use crate::registry::TierBackend;
use crate::types::{ChatCompletionRequest, Message, Role};

/// Confidence assumed when the reply omits it or sends a non-number
const DEFAULT_CONFIDENCE: f64 = 0.6;

static SYSTEM_PROMPT: LazyLock<String> = LazyLock::new(|| {
    let choices = |names: Vec<String>| names.iter().map(|n| format!("\"{n}\"")).collect::<Vec<_>>().join(", ");
    let levels = choices(Level::iter().map(|l| l.to_string()).collect());

    format!(
        "You rate how demanding a request to a language model is. Reply with one JSON object and \
         nothing else, no prose and no code fences, using exactly these keys:\n\
         - \"reasoning_depth\": one of {levels}\n\
         - \"task_type\": one of {tasks}\n\
         - \"constraint_level\": one of {levels}\n\
         - \"required_accuracy\": one of {levels}\n\
         - \"estimated_token_size\": one of {sizes}\n\
         - \"confidence\": a number from 0 to 1 stating how sure you are of this rating",
        tasks = choices(TaskType::iter().map(|t| t.to_string()).collect()),
        sizes = choices(TokenSize::iter().map(|s| s.to_string()).collect()),
    )
});

/// Why a live evaluation could not be produced
#[derive(Debug, Error)]
enum EvaluationError {
    #[error("auxiliary model call failed: {0}")]
    Http(#[from] LlmError),

    #[error("auxiliary model did not answer within {}ms", .0.as_millis())]
    Timeout(Duration),

    #[error("auxiliary model returned no content")]
    EmptyReply,

    #[error("auxiliary model reply is not a JSON object: {0}")]
    Parse(String),
}

/// Result of [`ComplexityEvaluator::evaluate`]
#[derive(Debug, Clone)]
pub struct EvaluationOutcome {
    pub evaluation: ComplexityEvaluation,
    /// Zero on a cache hit
    pub latency: Duration,
    pub cached: bool,
    /// Hash of the user turns, also the cache key
    pub content_hash: String,
}

/// Produces complexity evaluations through one auxiliary model call
pub struct ComplexityEvaluator {
    backend: TierBackend,
    cache: TtlCache<ComplexityEvaluation>,
    timeout: Duration,
    max_tokens: u32,
}

impl ComplexityEvaluator {
    /// Create an evaluator that queries `backend`
    pub fn new(backend: TierBackend, config: &EvaluatorConfig) -> anyhow::Result<Self> {
        let ttl = tiergate_config::parse_duration("evaluator.cache_ttl", &config.cache_ttl)?;
        let timeout = tiergate_config::parse_duration("evaluator.timeout", &config.timeout)?;

        Ok(Self {
            backend,
            cache: TtlCache::new(ttl, config.cache_capacity),
            timeout,
            max_tokens: config.max_tokens,
        })
    }

    /// Evaluate the conversation in `request`
    pub async fn evaluate(&self, request: &ChatCompletionRequest) -> EvaluationOutcome {
        let user_turns = request.user_turns();
        let content_hash = content_hash(user_turns.iter().map(String::as_str));

        if let Some(evaluation) = self.cache.get(&content_hash) {
            tracing::debug!(hash = %content_hash, "evaluation cache hit");
            return EvaluationOutcome {
                evaluation,
                latency: Duration::ZERO,
                cached: true,
                content_hash,
            };
        }

        if user_turns.is_empty() {
            tracing::debug!("no user turn to evaluate, using conservative default");
            return EvaluationOutcome {
                evaluation: ComplexityEvaluation::conservative_default(),
                latency: Duration::ZERO,
                cached: false,
                content_hash,
            };
        }

        tracing::debug!(hash = %content_hash, "evaluation cache miss");
        let started = Instant::now();
        let result = tokio::time::timeout(self.timeout, self.request_evaluation(&request.messages))
            .await
            .unwrap_or(Err(EvaluationError::Timeout(self.timeout)));
        let latency = started.elapsed();

        let evaluation = match result {
            Ok(evaluation) => {
                self.cache.insert(content_hash.clone(), evaluation.clone());
                evaluation
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    latency_ms = latency.as_millis(),
                    "complexity evaluation failed, using conservative default"
                );
                ComplexityEvaluation::conservative_default()
            }
        };

        EvaluationOutcome {
            evaluation,
            latency,
            cached: false,
            content_hash,
        }
    }

    /// Number of live cached evaluations
    pub fn cached_entries(&self) -> usize {
        self.cache.len()
    }

    async fn request_evaluation(&self, messages: &[Message]) -> Result<ComplexityEvaluation, EvaluationError> {
        let mut request = ChatCompletionRequest::new(
            self.backend.model.as_str(),
            vec![
                Message::text(Role::System, SYSTEM_PROMPT.as_str()),
                Message::text(Role::User, evaluation_prompt(messages)),
            ],
        );
        request.temperature = Some(0.0);
        request.max_tokens = Some(self.max_tokens);

        let body = self.backend.provider.complete(&request).await?;
        let reply = body
            .pointer("/choices/0/message/content")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|reply| !reply.is_empty())
            .ok_or(EvaluationError::EmptyReply)?;

        parse_reply(reply)
    }
}

/// Prior conversation as context, latest user turn as the target
fn evaluation_prompt(messages: &[Message]) -> String {
    let target = messages.iter().rposition(|m| m.role == Role::User);
    let (context, target) = match target {
        Some(index) => (&messages[..index], messages[index].text_content()),
        None => (messages, String::new()),
    };

    let mut prompt = String::from("Conversation so far:\n");
    if context.is_empty() {
        prompt.push_str("(none)\n");
    }
    for message in context {
        prompt.push_str(&format!("[{}] {}\n", message.role, message.text_content()));
    }
    prompt.push_str("\nRequest to rate:\n");
    prompt.push_str(&target);
    prompt
}

/// Reply fields as sent, each validated separately
#[derive(Debug, Default, Deserialize)]
struct RawEvaluation {
    reasoning_depth: Option<Value>,
    task_type: Option<Value>,
    constraint_level: Option<Value>,
    required_accuracy: Option<Value>,
    estimated_token_size: Option<Value>,
    confidence: Option<Value>,
}

impl RawEvaluation {
    /// Replace each invalid field with its neutral default; the score is
    /// derived from the categorical fields, never read from the reply
    fn validate(self) -> ComplexityEvaluation {
        ComplexityEvaluation::new(
            categorical("reasoning_depth", self.reasoning_depth.as_ref(), Level::Medium),
            categorical("task_type", self.task_type.as_ref(), TaskType::Other),
            categorical("constraint_level", self.constraint_level.as_ref(), Level::Medium),
            categorical("required_accuracy", self.required_accuracy.as_ref(), Level::Medium),
            categorical("estimated_token_size", self.estimated_token_size.as_ref(), TokenSize::Medium),
            confidence(self.confidence.as_ref()),
        )
    }
}

fn parse_reply(reply: &str) -> Result<ComplexityEvaluation, EvaluationError> {
    let body = strip_code_fence(reply);

    let raw = serde_json::from_str::<RawEvaluation>(body).or_else(|e| {
        embedded_object(body)
            .and_then(|object| serde_json::from_str::<RawEvaluation>(object).ok())
            .ok_or_else(|| EvaluationError::Parse(e.to_string()))
    })?;

    Ok(raw.validate())
}

/// Body of a fenced block, with or without a language tag
fn strip_code_fence(reply: &str) -> &str {
    let trimmed = reply.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };

    let rest = rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric());
    let rest = rest.trim_end();
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Outermost `{...}` span of a reply wrapped in prose
fn embedded_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (start < end).then(|| &text[start..=end])
}

fn categorical<T: FromStr>(field: &'static str, value: Option<&Value>, default: T) -> T {
    let parsed = value
        .and_then(Value::as_str)
        .and_then(|raw| raw.trim().replace([' ', '-'], "_").parse::<T>().ok());

    parsed.unwrap_or_else(|| {
        tracing::debug!(field, value = ?value, "invalid or missing evaluation field, using neutral default");
        default
    })
}

fn confidence(value: Option<&Value>) -> f64 {
    match value {
        Some(Value::Number(number)) => number.as_f64().unwrap_or(DEFAULT_CONFIDENCE),
        Some(Value::String(raw)) => raw.trim().parse().unwrap_or(DEFAULT_CONFIDENCE),
        _ => DEFAULT_CONFIDENCE,
    }
}
