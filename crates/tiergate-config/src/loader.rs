use std::path::Path;

use crate::{Config, parse_duration};

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Reads the file, expands `{{ env.VAR }}` placeholders, then
    /// deserializes and validates the result.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, environment variable
    /// expansion fails, TOML parsing fails, or validation fails
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read config file {}: {e}", path.display()))?;

        Self::from_toml(&raw)
    }

    /// Parse and validate configuration from TOML text
    ///
    /// # Errors
    ///
    /// Returns an error if expansion, parsing, or validation fails
    pub fn from_toml(raw: &str) -> anyhow::Result<Self> {
        let expanded =
            crate::env::expand_env(raw).map_err(|e| anyhow::anyhow!("config variable expansion failed: {e}"))?;

        let config: Self = toml::from_str(&expanded).map_err(|e| anyhow::anyhow!("failed to parse config: {e}"))?;

        config.validate()?;

        Ok(config)
    }

    /// Validate that the configuration is internally consistent
    ///
    /// # Errors
    ///
    /// Returns an error if a tier lacks a model, thresholds are out of
    /// order, or a duration cannot be parsed
    pub fn validate(&self) -> anyhow::Result<()> {
        self.validate_tiers()?;
        self.validate_thresholds()?;
        self.validate_durations()?;

        if self.evaluator.cache_capacity == 0 {
            anyhow::bail!("evaluator.cache_capacity must be at least 1");
        }

        Ok(())
    }

    /// Every tier must name the backend model it forwards to
    fn validate_tiers(&self) -> anyhow::Result<()> {
        for (name, tier) in self.tiers.iter() {
            if tier.model.trim().is_empty() {
                anyhow::bail!("tiers.{name}.model must be set");
            }
        }
        Ok(())
    }

    fn validate_thresholds(&self) -> anyhow::Result<()> {
        let thresholds = self.router.thresholds;

        if thresholds.pro > 100 {
            anyhow::bail!("router.thresholds.pro must be at most 100, got {}", thresholds.pro);
        }

        if thresholds.mid >= thresholds.pro {
            anyhow::bail!(
                "router.thresholds.mid ({}) must be below router.thresholds.pro ({})",
                thresholds.mid,
                thresholds.pro
            );
        }

        Ok(())
    }

    fn validate_durations(&self) -> anyhow::Result<()> {
        parse_duration("evaluator.cache_ttl", &self.evaluator.cache_ttl)?;
        parse_duration("evaluator.timeout", &self.evaluator.timeout)?;
        parse_duration("forwarding.timeout", &self.forwarding.timeout)?;
        parse_duration("telemetry.write_timeout", &self.telemetry.write_timeout)?;
        Ok(())
    }
}
