#![allow(clippy::must_use_candidate)]

mod env;
pub mod evaluator;
mod loader;
pub mod router;
pub mod server;
pub mod telemetry;
pub mod tiers;

use serde::Deserialize;

pub use evaluator::*;
pub use router::*;
pub use server::*;
pub use telemetry::*;
pub use tiers::*;

/// Top-level tiergate configuration
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// HTTP listener configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Routing thresholds and model naming
    #[serde(default)]
    pub router: RouterConfig,
    /// Backend endpoint per capability tier
    #[serde(default)]
    pub tiers: TiersConfig,
    /// Complexity evaluator settings
    #[serde(default)]
    pub evaluator: EvaluatorConfig,
    /// Backend forwarding settings
    #[serde(default)]
    pub forwarding: ForwardingConfig,
    /// Logging and routing log settings
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// Parse a human-readable duration such as `"15s"` or `"1h"`
///
/// # Errors
///
/// Returns an error naming the offending field when the string is not a
/// valid duration
pub fn parse_duration(field: &str, value: &str) -> anyhow::Result<std::time::Duration> {
    duration_str::parse(value).map_err(|e| anyhow::anyhow!("invalid duration for {field} '{value}': {e}"))
}
