//! Structured complexity judgment and its deterministic score
//!
//! The score is always derived from the four categorical fields through
//! fixed lookup tables, never taken from the evaluating model.

use serde::{Deserialize, Serialize};

/// Upper bound of the complexity score
pub const MAX_SCORE: u8 = 100;

/// Score of the conservative default evaluation
pub const DEFAULT_SCORE: u8 = 50;

/// Three-step scale shared by reasoning depth, constraint level, and required accuracy
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
    strum::EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Level {
    Low,
    Medium,
    High,
}

/// Closed set of task categories
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
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum TaskType {
    Classification,
    Extraction,
    Summarization,
    Writing,
    Coding,
    Visualization,
    ArchitectureDesign,
    MathematicalReasoning,
    MultiStepPlanning,
    Other,
}

/// Expected size of the input and output combined
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
    strum::EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum TokenSize {
    Small,
    Medium,
    Large,
    VeryLarge,
}

impl Level {
    const fn reasoning_points(self) -> u8 {
        match self {
            Self::Low => 10,
            Self::Medium => 20,
            Self::High => 30,
        }
    }

    /// Points for constraint level and required accuracy, which share a table
    const fn demand_points(self) -> u8 {
        match self {
            Self::Low => 5,
            Self::Medium => 10,
            Self::High => 20,
        }
    }
}

impl TaskType {
    const fn points(self) -> u8 {
        match self {
            Self::Classification | Self::Extraction => 5,
            Self::Summarization => 10,
            Self::Writing | Self::Visualization | Self::Other => 15,
            Self::Coding => 20,
            Self::MultiStepPlanning => 25,
            Self::ArchitectureDesign | Self::MathematicalReasoning => 30,
        }
    }
}

/// Compute the complexity score from the categorical dimensions
///
/// Sum of the per-dimension lookup tables, clamped to [`MAX_SCORE`].
pub const fn complexity_score(
    reasoning_depth: Level,
    task_type: TaskType,
    constraint_level: Level,
    required_accuracy: Level,
) -> u8 {
    let total = reasoning_depth.reasoning_points()
        + task_type.points()
        + constraint_level.demand_points()
        + required_accuracy.demand_points();

    if total > MAX_SCORE { MAX_SCORE } else { total }
}

/// Structured judgment of a request's cognitive demand
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplexityEvaluation {
    pub reasoning_depth: Level,
    pub task_type: TaskType,
    pub constraint_level: Level,
    pub required_accuracy: Level,
    pub estimated_token_size: TokenSize,
    /// Always equal to [`complexity_score`] of the categorical fields when
    /// built through [`ComplexityEvaluation::new`]
    pub complexity_score: u8,
    /// Evaluator confidence in `[0, 1]`
    pub confidence: f64,
}

impl ComplexityEvaluation {
    /// Build an evaluation, deriving the score and clamping confidence to `[0, 1]`
    pub fn new(
        reasoning_depth: Level,
        task_type: TaskType,
        constraint_level: Level,
        required_accuracy: Level,
        estimated_token_size: TokenSize,
        confidence: f64,
    ) -> Self {
        let confidence = if confidence.is_finite() {
            confidence.clamp(0.0, 1.0)
        } else {
            0.0
        };

        Self {
            reasoning_depth,
            task_type,
            constraint_level,
            required_accuracy,
            estimated_token_size,
            complexity_score: complexity_score(reasoning_depth, task_type, constraint_level, required_accuracy),
            confidence,
        }
    }

    /// Conservative evaluation used whenever the evaluator cannot produce one
    ///
    /// Carries the fixed score [`DEFAULT_SCORE`] rather than the table sum of
    /// its fields (55), so a failed evaluation lands mid-band.
    pub fn conservative_default() -> Self {
        Self {
            complexity_score: DEFAULT_SCORE,
            ..Self::new(
                Level::Medium,
                TaskType::Other,
                Level::Medium,
                Level::Medium,
                TokenSize::Medium,
                0.6,
            )
        }
    }

    /// Re-derive the score from the categorical fields
    #[must_use]
    pub fn with_recomputed_score(mut self) -> Self {
        self.complexity_score = complexity_score(
            self.reasoning_depth,
            self.task_type,
            self.constraint_level,
            self.required_accuracy,
        );
        self
    }
}
