//! Programmatic configuration builder for integration tests

use std::net::SocketAddr;
use std::path::Path;

use secrecy::SecretString;
use tiergate_config::{Config, HealthConfig, ServerConfig, TelemetryConfig, TierConfig, TiersConfig};

/// Builder for constructing test configurations
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Minimal defaults with the routing log disabled
    pub fn new() -> Self {
        Self {
            config: Config {
                server: ServerConfig {
                    listen_address: Some(SocketAddr::from(([127, 0, 0, 1], 0))),
                    health: HealthConfig {
                        enabled: true,
                        ..HealthConfig::default()
                    },
                },
                telemetry: TelemetryConfig {
                    log_path: None,
                    ..TelemetryConfig::default()
                },
                ..Config::default()
            },
        }
    }

    /// Point each tier at its own mock backend
    pub fn with_tiers(mut self, pro: &str, mid: &str, low: &str) -> Self {
        self.config.tiers = TiersConfig {
            pro: tier(pro, "pro-model"),
            mid: tier(mid, "mid-model"),
            low: tier(low, "low-model"),
        };
        self
    }

    /// Write the routing log to `path`
    pub fn with_log_path(mut self, path: &Path) -> Self {
        self.config.telemetry.log_path = Some(path.to_path_buf());
        self
    }

    /// Report backend model names instead of `<namespace>/<tier>`
    pub fn without_relabel(mut self) -> Self {
        self.config.router.relabel_model = false;
        self
    }

    /// Bound backend calls, and each read of a streamed response
    pub fn with_forwarding_timeout(mut self, timeout: &str) -> Self {
        self.config.forwarding.timeout = timeout.to_owned();
        self
    }

    /// Disable health endpoint
    pub fn without_health(mut self) -> Self {
        self.config.server.health.enabled = false;
        self
    }

    /// Build the final config
    pub fn build(self) -> Config {
        self.config.validate().expect("test config is valid");
        self.config
    }
}

fn tier(base_url: &str, model: &str) -> TierConfig {
    TierConfig {
        base_url: Some(base_url.parse().expect("valid URL")),
        api_key: Some(SecretString::from("test-key")),
        model: model.to_owned(),
    }
}
