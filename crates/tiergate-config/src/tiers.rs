use secrecy::SecretString;
use serde::Deserialize;
use url::Url;

/// Backend endpoints for the three capability tiers
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TiersConfig {
    /// High-capability tier
    #[serde(default)]
    pub pro: TierConfig,
    /// Middle tier, also the fallback target
    #[serde(default)]
    pub mid: TierConfig,
    /// Cheapest tier, also used by the complexity evaluator
    #[serde(default)]
    pub low: TierConfig,
}

impl TiersConfig {
    /// Iterate `(tier name, config)` pairs in pro, mid, low order
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &TierConfig)> {
        [("pro", &self.pro), ("mid", &self.mid), ("low", &self.low)].into_iter()
    }
}

/// OpenAI-compatible endpoint serving one tier
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TierConfig {
    /// Base URL override, `/chat/completions` is appended
    #[serde(default)]
    pub base_url: Option<Url>,
    /// Bearer token sent to the backend
    #[serde(default)]
    pub api_key: Option<SecretString>,
    /// Backend model identifier substituted into forwarded requests
    #[serde(default)]
    pub model: String,
}

/// Settings for relaying requests to tier backends
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ForwardingConfig {
    /// Upper bound on connecting and receiving response headers
    #[serde(default = "default_forward_timeout")]
    pub timeout: String,
}

impl Default for ForwardingConfig {
    fn default() -> Self {
        Self {
            timeout: default_forward_timeout(),
        }
    }
}

fn default_forward_timeout() -> String {
    "120s".to_owned()
}
