use serde::{Deserialize, Serialize};
use tiergate_routing::{TaskType, Tier};

/// Audit record for one completed request
///
/// One JSON object per line in the routing log; field names are camelCase
/// so existing log consumers can tail the file unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutingLogEntry {
    pub timestamp: jiff::Timestamp,
    pub request_id: String,
    pub score: u8,
    /// Tier that produced the answer, which is `mid` after a fallback
    pub tier: Tier,
    /// Backend model id that produced the answer
    pub model_used: String,
    pub task_type: TaskType,
    pub confidence: f64,
    pub tokens_in: u64,
    pub tokens_out: u64,
    pub total_latency_ms: u64,
    pub evaluation_latency_ms: u64,
    pub forwarding_latency_ms: u64,
    /// Whether the evaluation was served from cache
    pub cached: bool,
    /// Content hash of the user turns
    pub prompt_hash: String,
}
