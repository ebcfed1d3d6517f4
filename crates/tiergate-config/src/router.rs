use serde::Deserialize;

/// Routing behaviour and model naming
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RouterConfig {
    /// Prefix used for explicit tier names (`tiergate/pro`) and relabelled models
    #[serde(default = "default_namespace")]
    pub namespace: String,
    /// Replace backend model ids in responses with `<namespace>/<tier>`
    #[serde(default = "default_relabel")]
    pub relabel_model: bool,
    /// Score bands for the default routing rule
    #[serde(default)]
    pub thresholds: ThresholdConfig,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
            relabel_model: default_relabel(),
            thresholds: ThresholdConfig::default(),
        }
    }
}

/// Complexity score thresholds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ThresholdConfig {
    /// Scores at or above this route to the pro tier
    #[serde(default = "default_pro_threshold")]
    pub pro: u8,
    /// Scores at or above this (and below `pro`) route to the mid tier
    #[serde(default = "default_mid_threshold")]
    pub mid: u8,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            pro: default_pro_threshold(),
            mid: default_mid_threshold(),
        }
    }
}

fn default_namespace() -> String {
    "tiergate".to_owned()
}

#[allow(clippy::missing_const_for_fn)]
fn default_relabel() -> bool {
    true
}

#[allow(clippy::missing_const_for_fn)]
fn default_pro_threshold() -> u8 {
    75
}

#[allow(clippy::missing_const_for_fn)]
fn default_mid_threshold() -> u8 {
    35
}
