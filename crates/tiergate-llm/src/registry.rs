//! Static mapping from tier to backend

use std::sync::Arc;
use std::time::Duration;

use tiergate_config::TiersConfig;
use tiergate_routing::Tier;

use crate::error::LlmError;
use crate::provider::Provider;
use crate::provider::openai::OpenAiProvider;

/// Backend serving one tier
#[derive(Clone)]
pub struct TierBackend {
    /// Backend model id substituted into forwarded requests
    pub model: String,
    pub provider: Arc<dyn Provider>,
}

impl TierBackend {
    pub fn new(model: impl Into<String>, provider: Arc<dyn Provider>) -> Self {
        Self {
            model: model.into(),
            provider,
        }
    }
}

impl std::fmt::Debug for TierBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TierBackend")
            .field("model", &self.model)
            .field("provider", &self.provider.name())
            .finish()
    }
}

/// One backend per tier, read-only after construction
#[derive(Debug, Clone)]
pub struct TierRegistry {
    pro: TierBackend,
    mid: TierBackend,
    low: TierBackend,
}

impl TierRegistry {
    pub const fn new(pro: TierBackend, mid: TierBackend, low: TierBackend) -> Self {
        Self { pro, mid, low }
    }

    /// Build OpenAI-compatible providers for every configured tier
    pub fn from_config(tiers: &TiersConfig, timeout: Duration) -> Result<Self, LlmError> {
        let backend = |name: &str, config: &tiergate_config::TierConfig| -> Result<TierBackend, LlmError> {
            let provider = OpenAiProvider::new(name, config, timeout)?;
            tracing::debug!(tier = name, model = %config.model, "tier backend configured");
            Ok(TierBackend::new(config.model.clone(), Arc::new(provider)))
        };

        Ok(Self::new(
            backend("pro", &tiers.pro)?,
            backend("mid", &tiers.mid)?,
            backend("low", &tiers.low)?,
        ))
    }

    pub const fn get(&self, tier: Tier) -> &TierBackend {
        match tier {
            Tier::Pro => &self.pro,
            Tier::Mid => &self.mid,
            Tier::Low => &self.low,
        }
    }
}
