//! Request pipeline shared by the route handlers
//!
//! Per request: evaluate complexity, decide a tier, honour an explicit tier
//! override, forward with a single fallback to `mid`, and record the
//! outcome.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::Value;
use tiergate_config::{Config, RouterConfig};
use tiergate_routing::{RoutingDecision, Tier, decide};
use tiergate_telemetry::{RoutingLogEntry, RoutingTelemetry};

use crate::error::LlmError;
use crate::evaluator::{ComplexityEvaluator, EvaluationOutcome};
use crate::provider::{ChunkStream, Provider};
use crate::registry::TierRegistry;
use crate::relay::{StreamAccounting, relay};
use crate::types::{ChatCompletionRequest, Usage, approx_tokens, completion_text_chars, relabel_model};

/// Tier retried once when the routed tier fails
const FALLBACK_TIER: Tier = Tier::Mid;

/// Model name that asks for automatic routing
pub const AUTO_MODEL: &str = "auto";

/// Shared state for LLM route handlers
#[derive(Clone)]
pub struct LlmState {
    inner: Arc<LlmStateInner>,
}

struct LlmStateInner {
    registry: TierRegistry,
    evaluator: ComplexityEvaluator,
    telemetry: RoutingTelemetry,
    router: RouterConfig,
}

/// Everything decided before forwarding
struct Routed {
    request_id: String,
    started: Instant,
    outcome: EvaluationOutcome,
    decision: RoutingDecision,
    target: Tier,
}

impl Routed {
    fn log_entry(&self, tier: Tier, model_used: &str, tokens_in: u64, tokens_out: u64) -> RoutingLogEntry {
        RoutingLogEntry {
            timestamp: jiff::Timestamp::now(),
            request_id: self.request_id.clone(),
            score: self.decision.score,
            tier,
            model_used: model_used.to_owned(),
            task_type: self.decision.task_type,
            confidence: self.decision.confidence,
            tokens_in,
            tokens_out,
            total_latency_ms: millis(self.started.elapsed()),
            evaluation_latency_ms: millis(self.outcome.latency),
            forwarding_latency_ms: 0,
            cached: self.outcome.cached,
            prompt_hash: self.outcome.content_hash.clone(),
        }
    }
}

impl LlmState {
    /// Build providers, evaluator, and routing settings from configuration
    ///
    /// The evaluator queries the `low` tier backend.
    pub fn from_config(config: &Config, telemetry: RoutingTelemetry) -> anyhow::Result<Self> {
        let timeout = tiergate_config::parse_duration("forwarding.timeout", &config.forwarding.timeout)?;
        let registry = TierRegistry::from_config(&config.tiers, timeout)?;
        let evaluator = ComplexityEvaluator::new(registry.get(Tier::Low).clone(), &config.evaluator)?;

        Ok(Self::new(registry, evaluator, telemetry, config.router.clone()))
    }

    pub fn new(
        registry: TierRegistry,
        evaluator: ComplexityEvaluator,
        telemetry: RoutingTelemetry,
        router: RouterConfig,
    ) -> Self {
        Self {
            inner: Arc::new(LlmStateInner {
                registry,
                evaluator,
                telemetry,
                router,
            }),
        }
    }

    pub fn telemetry(&self) -> &RoutingTelemetry {
        &self.inner.telemetry
    }

    pub fn namespace(&self) -> &str {
        &self.inner.router.namespace
    }

    /// Client-facing name of a tier, `<namespace>/<tier>`
    pub fn public_model(&self, tier: Tier) -> String {
        format!("{}/{tier}", self.inner.router.namespace)
    }

    /// Model names clients may request
    pub fn advertised_models(&self) -> Vec<String> {
        std::iter::once(format!("{}/{AUTO_MODEL}", self.inner.router.namespace))
            .chain([Tier::Pro, Tier::Mid, Tier::Low].map(|tier| self.public_model(tier)))
            .collect()
    }

    /// Tier named explicitly by `model`, either bare or under the namespace
    pub fn explicit_tier(&self, model: &str) -> Option<Tier> {
        let model = model.trim();
        let name = match model.split_once('/') {
            Some((namespace, name)) if namespace.eq_ignore_ascii_case(&self.inner.router.namespace) => name,
            Some(_) => return None,
            None => model,
        };

        name.parse().ok()
    }

    /// Handle a buffered chat completion
    pub async fn complete(&self, request: ChatCompletionRequest) -> Result<Value, LlmError> {
        let routed = self.route(&request).await;

        let forward_started = Instant::now();
        let (tier, mut body) = self
            .forward(&request, routed.target, &routed.request_id, |provider, request| async move {
                provider.complete(&request).await
            })
            .await?;
        let forwarding_latency = forward_started.elapsed();

        let usage = Usage::from_body(&body);
        let tokens_in = usage.map_or_else(|| approx_tokens(request.text_chars()), |u| u.prompt_tokens);
        let tokens_out = usage.map_or_else(|| approx_tokens(completion_text_chars(&body)), |u| u.completion_tokens);

        if self.inner.router.relabel_model {
            relabel_model(&mut body, &self.public_model(tier));
        }

        let mut entry = routed.log_entry(tier, &self.inner.registry.get(tier).model, tokens_in, tokens_out);
        entry.forwarding_latency_ms = millis(forwarding_latency);
        self.inner.telemetry.record(entry);

        Ok(body)
    }

    /// Handle a streaming chat completion
    ///
    /// Fallback applies only until the backend accepts the stream; a failure
    /// after that ends the returned stream with the error.
    pub async fn complete_stream(&self, request: ChatCompletionRequest) -> Result<ChunkStream, LlmError> {
        let routed = self.route(&request).await;

        let forward_started = Instant::now();
        let (tier, upstream) = self
            .forward(&request, routed.target, &routed.request_id, |provider, request| async move {
                provider.complete_stream(&request).await
            })
            .await?;

        let entry = routed.log_entry(
            tier,
            &self.inner.registry.get(tier).model,
            approx_tokens(request.text_chars()),
            0,
        );
        let accounting = StreamAccounting::new(self.inner.telemetry.clone(), entry, routed.started, forward_started);
        let public_model = self.inner.router.relabel_model.then(|| self.public_model(tier));

        Ok(relay(upstream, public_model, accounting))
    }

    async fn route(&self, request: &ChatCompletionRequest) -> Routed {
        let started = Instant::now();
        let request_id = uuid::Uuid::new_v4().to_string();

        let outcome = self.inner.evaluator.evaluate(request).await;
        let decision = decide(&outcome.evaluation, outcome.cached, &self.inner.router.thresholds);
        let explicit = self.explicit_tier(&request.model);
        let target = explicit.unwrap_or(decision.tier);

        tracing::info!(
            request_id = %request_id,
            tier = %target,
            decided = %decision.tier,
            explicit = explicit.is_some(),
            rule = decision.rule,
            score = decision.score,
            task_type = %decision.task_type,
            confidence = decision.confidence,
            cached = decision.cached,
            "routing decision"
        );
        tracing::debug!(request_id = %request_id, reasoning = %decision.reasoning, "routing reasoning");

        Routed {
            request_id,
            started,
            outcome,
            decision,
            target,
        }
    }

    /// Call `primary`, then [`FALLBACK_TIER`] once if that fails
    ///
    /// Both attempts send the original request with only `model` rewritten.
    async fn forward<T, F, Fut>(
        &self,
        request: &ChatCompletionRequest,
        primary: Tier,
        request_id: &str,
        call: F,
    ) -> Result<(Tier, T), LlmError>
    where
        F: Fn(Arc<dyn Provider>, ChatCompletionRequest) -> Fut,
        Fut: Future<Output = Result<T, LlmError>>,
    {
        let backend = self.inner.registry.get(primary);
        let error = match call(Arc::clone(&backend.provider), request.with_model(&backend.model)).await {
            Ok(value) => return Ok((primary, value)),
            Err(e) => e,
        };

        tracing::warn!(
            request_id,
            tier = %primary,
            fallback = %FALLBACK_TIER,
            error = %error,
            "forwarding failed, falling back"
        );

        let fallback = self.inner.registry.get(FALLBACK_TIER);
        match call(Arc::clone(&fallback.provider), request.with_model(&fallback.model)).await {
            Ok(value) => Ok((FALLBACK_TIER, value)),
            Err(e) => {
                tracing::error!(
                    request_id,
                    tier = %primary,
                    fallback = %FALLBACK_TIER,
                    first_error = %error,
                    error = %e,
                    "fallback tier also failed"
                );
                Err(LlmError::FallbackExhausted {
                    primary,
                    fallback: FALLBACK_TIER,
                    source: Box::new(e),
                })
            }
        }
    }
}

pub(crate) fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
