//! Ordered routing rules
//!
//! Rules are checked in priority order and the first match decides the
//! tier. When none match, the score is banded against the configured
//! thresholds, so [`decide`] always returns exactly one tier.

use tiergate_config::ThresholdConfig;

use crate::evaluation::{ComplexityEvaluation, TaskType, TokenSize};
use crate::{RoutingDecision, Tier};

/// Confidence below which the evaluation is not trusted at all
const MIN_CONFIDENCE: f64 = 0.6;

/// Confidence below which an extreme score is not trusted
const EXTREME_SCORE_CONFIDENCE: f64 = 0.7;

/// Score above which an evaluation counts as extreme
const EXTREME_SCORE: u8 = 90;

/// Ceiling below which creative and coding tasks stay on `mid`
const TASK_CAP_SCORE: u8 = 70;

/// Floor at which deep-reasoning tasks escalate to `pro`
const DEEP_REASONING_SCORE: u8 = 65;

/// A predicate paired with the tier it selects
#[derive(Debug)]
pub struct RoutingRule {
    /// Stable rule identifier used in reasoning traces
    pub name: &'static str,
    /// Tier selected when the rule matches
    pub tier: Tier,
    matches: fn(&ComplexityEvaluation) -> bool,
    describe: fn(&ComplexityEvaluation) -> String,
}

impl RoutingRule {
    /// Whether this rule applies to the evaluation
    pub fn matches(&self, evaluation: &ComplexityEvaluation) -> bool {
        (self.matches)(evaluation)
    }

    fn reasoning(&self, evaluation: &ComplexityEvaluation) -> String {
        format!("{}: {} -> {}", self.name, (self.describe)(evaluation), self.tier)
    }
}

const fn is_creative(task_type: TaskType) -> bool {
    matches!(
        task_type,
        TaskType::Visualization | TaskType::Writing | TaskType::Summarization
    )
}

const fn is_deep_reasoning(task_type: TaskType) -> bool {
    matches!(
        task_type,
        TaskType::ArchitectureDesign | TaskType::MathematicalReasoning | TaskType::MultiStepPlanning
    )
}

/// Priority-ordered rule list, first match wins
pub static RULES: [RoutingRule; 6] = [
    RoutingRule {
        name: "very_large_input",
        tier: Tier::Pro,
        matches: |e| e.estimated_token_size == TokenSize::VeryLarge,
        describe: |e| format!("estimated_token_size={}", e.estimated_token_size),
    },
    RoutingRule {
        name: "low_confidence",
        tier: Tier::Mid,
        matches: |e| e.confidence < MIN_CONFIDENCE,
        describe: |e| format!("confidence={:.2} < {MIN_CONFIDENCE}", e.confidence),
    },
    RoutingRule {
        name: "distrusted_extreme_score",
        tier: Tier::Mid,
        matches: |e| e.complexity_score > EXTREME_SCORE && e.confidence < EXTREME_SCORE_CONFIDENCE,
        describe: |e| {
            format!(
                "score={} > {EXTREME_SCORE} with confidence={:.2} < {EXTREME_SCORE_CONFIDENCE}",
                e.complexity_score, e.confidence
            )
        },
    },
    RoutingRule {
        name: "creative_task_cap",
        tier: Tier::Mid,
        matches: |e| is_creative(e.task_type) && e.complexity_score < TASK_CAP_SCORE,
        describe: |e| format!("task_type={} with score={} < {TASK_CAP_SCORE}", e.task_type, e.complexity_score),
    },
    RoutingRule {
        name: "coding_task_cap",
        tier: Tier::Mid,
        matches: |e| e.task_type == TaskType::Coding && e.complexity_score < TASK_CAP_SCORE,
        describe: |e| format!("task_type=coding with score={} < {TASK_CAP_SCORE}", e.complexity_score),
    },
    RoutingRule {
        name: "deep_reasoning_task",
        tier: Tier::Pro,
        matches: |e| is_deep_reasoning(e.task_type) && e.complexity_score >= DEEP_REASONING_SCORE,
        describe: |e| {
            format!(
                "task_type={} with score={} >= {DEEP_REASONING_SCORE}",
                e.task_type, e.complexity_score
            )
        },
    },
];

/// Name of the final banding step in reasoning traces
pub const SCORE_BAND: &str = "score_band";

/// Band the score against the configured thresholds
fn band(score: u8, thresholds: &ThresholdConfig) -> (Tier, String) {
    let (tier, relation) = if score >= thresholds.pro {
        (Tier::Pro, format!(">= pro threshold {}", thresholds.pro))
    } else if score >= thresholds.mid {
        (Tier::Mid, format!(">= mid threshold {} and < {}", thresholds.mid, thresholds.pro))
    } else {
        (Tier::Low, format!("< mid threshold {}", thresholds.mid))
    };

    (tier, format!("{SCORE_BAND}: score={score} {relation} -> {tier}"))
}

/// Map an evaluation to a tier
///
/// Pure and total: the same evaluation and thresholds always produce the
/// same tier and reasoning.
pub fn decide(evaluation: &ComplexityEvaluation, cached: bool, thresholds: &ThresholdConfig) -> RoutingDecision {
    let (tier, rule, reasoning) = RULES.iter().find(|rule| rule.matches(evaluation)).map_or_else(
        || {
            let (tier, reasoning) = band(evaluation.complexity_score, thresholds);
            (tier, SCORE_BAND, reasoning)
        },
        |rule| (rule.tier, rule.name, rule.reasoning(evaluation)),
    );

    tracing::debug!(
        tier = %tier,
        rule,
        score = evaluation.complexity_score,
        task_type = %evaluation.task_type,
        confidence = evaluation.confidence,
        "routing rule matched"
    );

    RoutingDecision {
        tier,
        score: evaluation.complexity_score,
        task_type: evaluation.task_type,
        confidence: evaluation.confidence,
        rule,
        reasoning,
        cached,
    }
}
