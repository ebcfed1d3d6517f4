//! Telemetry for tiergate
//!
//! Console logging via the `tracing` ecosystem, plus the routing audit
//! trail: an NDJSON log of every routed request and running statistics
//! folded from the same entries.

#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

mod entry;
mod log;
mod stats;

use std::sync::Arc;

use tiergate_config::{LogFormat, TelemetryConfig};

pub use entry::RoutingLogEntry;
pub use log::RoutingLog;
pub use stats::{StatsAggregator, StatsSnapshot};

/// Install the global `tracing` subscriber
///
/// An invalid filter directive falls back to `info`.
pub fn init(config: &TelemetryConfig) -> anyhow::Result<()> {
    use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    let filter = EnvFilter::try_new(&config.log_filter).unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    let registry = tracing_subscriber::registry().with(filter);
    match config.log_format {
        LogFormat::Text => registry.with(fmt_layer).try_init(),
        LogFormat::Json => registry.with(fmt_layer.json().flatten_event(true)).try_init(),
    }
    .map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {e}"))
}

/// Records every routed request to the statistics and the routing log
#[derive(Debug, Clone)]
pub struct RoutingTelemetry {
    stats: Arc<StatsAggregator>,
    log: Option<RoutingLog>,
}

impl RoutingTelemetry {
    /// Build from configuration, spawning the log writer when a path is set
    ///
    /// Must be called within a Tokio runtime when logging to a file.
    pub fn from_config(config: &TelemetryConfig) -> anyhow::Result<Self> {
        let write_timeout = tiergate_config::parse_duration("telemetry.write_timeout", &config.write_timeout)?;

        let log = config
            .log_path
            .as_ref()
            .filter(|path| !path.as_os_str().is_empty())
            .map(|path| RoutingLog::spawn(path.clone(), write_timeout));

        match &log {
            Some(log) => tracing::info!(path = %log.path().display(), "routing log enabled"),
            None => tracing::info!("routing log disabled, statistics kept in memory only"),
        }

        Ok(Self::new(log))
    }

    pub fn new(log: Option<RoutingLog>) -> Self {
        Self {
            stats: Arc::new(StatsAggregator::new()),
            log,
        }
    }

    /// Fold the entry into the statistics and enqueue it for the log
    pub fn record(&self, entry: RoutingLogEntry) {
        tracing::debug!(
            request_id = %entry.request_id,
            tier = %entry.tier,
            score = entry.score,
            model = %entry.model_used,
            latency_ms = entry.total_latency_ms,
            "request recorded"
        );

        self.stats.record(&entry);
        if let Some(log) = &self.log {
            log.append(entry);
        }
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Zero the statistics; the routing log is left untouched
    pub fn reset(&self) {
        self.stats.reset();
        tracing::info!("routing statistics reset");
    }

    /// Wait for pending log writes
    pub async fn flush(&self) {
        if let Some(log) = &self.log {
            log.flush().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use tiergate_routing::{TaskType, Tier};

    use super::*;

    fn entry(tier: Tier) -> RoutingLogEntry {
        RoutingLogEntry {
            timestamp: jiff::Timestamp::now(),
            request_id: "abc".to_owned(),
            score: 80,
            tier,
            model_used: "model".to_owned(),
            task_type: TaskType::Other,
            confidence: 0.9,
            tokens_in: 1,
            tokens_out: 2,
            total_latency_ms: 3,
            evaluation_latency_ms: 1,
            forwarding_latency_ms: 2,
            cached: false,
            prompt_hash: "hash".to_owned(),
        }
    }

    #[tokio::test]
    async fn records_to_stats_and_log() {
        let dir = tempfile::tempdir().unwrap();
        let config = TelemetryConfig {
            log_path: Some(dir.path().join("routing.jsonl")),
            ..TelemetryConfig::default()
        };
        let telemetry = RoutingTelemetry::from_config(&config).unwrap();

        telemetry.record(entry(Tier::Pro));
        telemetry.flush().await;

        assert_eq!(telemetry.snapshot().tier_counts[&Tier::Pro], 1);
        let contents = std::fs::read_to_string(dir.path().join("routing.jsonl")).unwrap();
        assert_eq!(contents.lines().count(), 1);
    }

    #[tokio::test]
    async fn empty_path_disables_log() {
        let config = TelemetryConfig {
            log_path: Some(std::path::PathBuf::new()),
            ..TelemetryConfig::default()
        };
        let telemetry = RoutingTelemetry::from_config(&config).unwrap();
        assert!(telemetry.log.is_none());

        telemetry.record(entry(Tier::Low));
        telemetry.flush().await;
        assert_eq!(telemetry.snapshot().total_requests, 1);
    }

    #[test]
    fn invalid_write_timeout_is_rejected() {
        let config = TelemetryConfig {
            write_timeout: "soon".to_owned(),
            log_path: None,
            ..TelemetryConfig::default()
        };
        assert!(RoutingTelemetry::from_config(&config).is_err());
    }

    #[test]
    fn reset_clears_shared_stats() {
        let telemetry = RoutingTelemetry::new(None);
        let clone = telemetry.clone();
        telemetry.record(entry(Tier::Mid));
        clone.reset();
        assert_eq!(telemetry.snapshot().total_requests, 0);
    }
}
