use serde::Deserialize;

/// Complexity evaluator settings
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EvaluatorConfig {
    /// How long a cached evaluation stays valid
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl: String,
    /// Maximum number of live cache entries
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
    /// Upper bound on the auxiliary model call
    #[serde(default = "default_timeout")]
    pub timeout: String,
    /// Completion budget for the auxiliary model reply
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self {
            cache_ttl: default_cache_ttl(),
            cache_capacity: default_cache_capacity(),
            timeout: default_timeout(),
            max_tokens: default_max_tokens(),
        }
    }
}

fn default_cache_ttl() -> String {
    "1h".to_owned()
}

#[allow(clippy::missing_const_for_fn)]
fn default_cache_capacity() -> usize {
    1000
}

fn default_timeout() -> String {
    "15s".to_owned()
}

#[allow(clippy::missing_const_for_fn)]
fn default_max_tokens() -> u32 {
    300
}
