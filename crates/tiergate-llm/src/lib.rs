//! Complexity-routed chat completions for tiergate
//!
//! Evaluates each request with a cheap auxiliary model, routes it to the
//! `pro`, `mid`, or `low` backend, relays the answer (buffered or streamed),
//! and falls back to `mid` once when the routed backend fails.

#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

pub mod error;
pub mod evaluator;
pub mod handler;
pub mod provider;
pub mod registry;
mod relay;
pub mod sse;
pub mod state;
pub mod types;

#[cfg(test)]
mod testing;

pub use error::LlmError;
pub use evaluator::{ComplexityEvaluator, EvaluationOutcome};
pub use handler::llm_router;
pub use provider::{ChunkStream, Provider};
pub use registry::{TierBackend, TierRegistry};
pub use state::LlmState;
pub use types::{ChatCompletionRequest, StreamEvent};
