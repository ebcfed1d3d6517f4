//! Complexity-based tier routing for tiergate
//!
//! Maps a structured [`ComplexityEvaluation`] to one of three backend tiers
//! using an ordered rule list where the first matching rule wins:
//! - **Overrides**: very large inputs, low confidence, distrusted extreme scores
//! - **Task caps**: creative and coding tasks below a score ceiling stay on `mid`
//! - **Deep reasoning**: architecture, math, and planning tasks escalate to `pro`
//! - **Score bands**: configurable `pro`/`mid` thresholds decide everything else

#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

pub mod evaluation;
pub mod rules;

use serde::{Deserialize, Serialize};

pub use evaluation::{ComplexityEvaluation, Level, TaskType, TokenSize, complexity_score};
pub use rules::{RULES, RoutingRule, decide};

/// Backend capability tier
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::IntoStaticStr,
    strum::EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Tier {
    /// High-capability, most expensive backend
    Pro,
    /// Balanced backend and the safe default under uncertainty
    Mid,
    /// Cheapest backend
    Low,
}

/// Result of a routing decision
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoutingDecision {
    /// Selected tier
    pub tier: Tier,
    /// Complexity score the decision was based on
    pub score: u8,
    /// Task category of the request
    pub task_type: TaskType,
    /// Evaluator confidence
    pub confidence: f64,
    /// Name of the rule that fired
    pub rule: &'static str,
    /// Human-readable trace of the rule and the values involved
    pub reasoning: String,
    /// Whether the evaluation came from the cache
    pub cached: bool,
}
