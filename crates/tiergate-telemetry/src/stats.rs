//! Running routing statistics
//!
//! Folded incrementally from [`RoutingLogEntry`] values; history is never
//! replayed. One mutex guards all fields so each entry lands as a unit.

use std::collections::BTreeMap;
use std::sync::Mutex;

use serde::Serialize;
use strum::IntoEnumIterator;
use tiergate_routing::{TaskType, Tier};

use crate::entry::RoutingLogEntry;

/// Accumulated totals since start or the last reset
#[derive(Debug)]
struct Totals {
    total: u64,
    by_tier: BTreeMap<Tier, u64>,
    by_task_type: BTreeMap<TaskType, u64>,
    avg_score: f64,
    avg_latency_ms: f64,
    avg_evaluation_latency_ms: f64,
    avg_forwarding_latency_ms: f64,
    cache_hits: u64,
    tokens_in: u64,
    tokens_out: u64,
    since: jiff::Timestamp,
}

impl Totals {
    fn new() -> Self {
        Self {
            total: 0,
            by_tier: Tier::iter().map(|tier| (tier, 0)).collect(),
            by_task_type: BTreeMap::new(),
            avg_score: 0.0,
            avg_latency_ms: 0.0,
            avg_evaluation_latency_ms: 0.0,
            avg_forwarding_latency_ms: 0.0,
            cache_hits: 0,
            tokens_in: 0,
            tokens_out: 0,
            since: jiff::Timestamp::now(),
        }
    }
}

/// Point-in-time copy of the running statistics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsSnapshot {
    pub total_requests: u64,
    /// Always contains every tier
    pub tier_counts: BTreeMap<Tier, u64>,
    pub task_type_counts: BTreeMap<TaskType, u64>,
    pub avg_score: f64,
    pub avg_latency_ms: f64,
    pub avg_evaluation_latency_ms: f64,
    pub avg_forwarding_latency_ms: f64,
    pub cache_hits: u64,
    /// `cache_hits / total_requests * 100`, rounded
    pub cache_hit_rate: u32,
    pub total_tokens_in: u64,
    pub total_tokens_out: u64,
    /// When accumulation started
    pub since: jiff::Timestamp,
}

/// Thread-safe statistics aggregator
#[derive(Debug)]
pub struct StatsAggregator {
    totals: Mutex<Totals>,
}

impl StatsAggregator {
    pub fn new() -> Self {
        Self {
            totals: Mutex::new(Totals::new()),
        }
    }

    /// Fold one entry into the running totals
    #[allow(clippy::cast_precision_loss)]
    pub fn record(&self, entry: &RoutingLogEntry) {
        let mut totals = self.lock();

        totals.total += 1;
        let n = totals.total as f64;

        *totals.by_tier.entry(entry.tier).or_insert(0) += 1;
        *totals.by_task_type.entry(entry.task_type).or_insert(0) += 1;

        totals.avg_score = running_mean(totals.avg_score, f64::from(entry.score), n);
        totals.avg_latency_ms = running_mean(totals.avg_latency_ms, entry.total_latency_ms as f64, n);
        totals.avg_evaluation_latency_ms =
            running_mean(totals.avg_evaluation_latency_ms, entry.evaluation_latency_ms as f64, n);
        totals.avg_forwarding_latency_ms =
            running_mean(totals.avg_forwarding_latency_ms, entry.forwarding_latency_ms as f64, n);

        if entry.cached {
            totals.cache_hits += 1;
        }
        totals.tokens_in += entry.tokens_in;
        totals.tokens_out += entry.tokens_out;
    }

    /// Copy the current statistics
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn snapshot(&self) -> StatsSnapshot {
        let totals = self.lock();

        let cache_hit_rate = if totals.total == 0 {
            0
        } else {
            (totals.cache_hits as f64 / totals.total as f64 * 100.0).round() as u32
        };

        StatsSnapshot {
            total_requests: totals.total,
            tier_counts: totals.by_tier.clone(),
            task_type_counts: totals.by_task_type.clone(),
            avg_score: round2(totals.avg_score),
            avg_latency_ms: round2(totals.avg_latency_ms),
            avg_evaluation_latency_ms: round2(totals.avg_evaluation_latency_ms),
            avg_forwarding_latency_ms: round2(totals.avg_forwarding_latency_ms),
            cache_hits: totals.cache_hits,
            cache_hit_rate,
            total_tokens_in: totals.tokens_in,
            total_tokens_out: totals.tokens_out,
            since: totals.since,
        }
    }

    /// Zero every counter
    pub fn reset(&self) {
        *self.lock() = Totals::new();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Totals> {
        self.totals.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl Default for StatsAggregator {
    fn default() -> Self {
        Self::new()
    }
}

/// Incremental mean after the `n`th sample
fn running_mean(mean: f64, sample: f64, n: f64) -> f64 {
    mean + (sample - mean) / n
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
