use std::path::PathBuf;

use serde::Deserialize;

/// Logging and routing log configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TelemetryConfig {
    /// Append-only NDJSON routing log; `None` or an empty path keeps statistics in memory only
    #[serde(default = "default_log_path")]
    pub log_path: Option<PathBuf>,
    /// `tracing` filter directive
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
    /// Console log format
    #[serde(default)]
    pub log_format: LogFormat,
    /// Upper bound on a single routing log write
    #[serde(default = "default_write_timeout")]
    pub write_timeout: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_path: default_log_path(),
            log_filter: default_log_filter(),
            log_format: LogFormat::default(),
            write_timeout: default_write_timeout(),
        }
    }
}

/// Console log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

#[allow(clippy::unnecessary_wraps)]
fn default_log_path() -> Option<PathBuf> {
    Some(PathBuf::from("logs/routing.jsonl"))
}

fn default_log_filter() -> String {
    "info".to_owned()
}

fn default_write_timeout() -> String {
    "2s".to_owned()
}
