//! Generation stage: prompt assembly, provider fallback, targeted repair.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::time::{sleep, timeout};
use tracing::{debug, warn};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::candidate::{Candidate, GenerationParameters, Provenance};
use crate::domain::models::draft::{DraftInput, DraftOutput, GenerationRequest};
use crate::domain::models::fixit::FixItPlan;
use crate::domain::models::TraditionCatalog;
use crate::domain::ports::Provider;

/// Base negative prompt applied to every request.
const BASE_NEGATIVE: &str = "lowres, watermark, artifacts";

/// Backoff between retry attempts on the same provider.
///
/// Exponential: `initial * 2^attempt`, capped at `max`.
#[derive(Debug, Clone)]
pub struct BackoffPolicy {
    pub initial_ms: u64,
    pub max_ms: u64,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            initial_ms: 500,
            max_ms: 10_000,
        }
    }
}

impl BackoffPolicy {
    /// No waiting between attempts; for tests and deterministic chains.
    pub fn none() -> Self {
        Self {
            initial_ms: 0,
            max_ms: 0,
        }
    }

    fn delay(&self, attempt: u32) -> Duration {
        let ms = self
            .initial_ms
            .saturating_mul(2_u64.saturating_pow(attempt))
            .min(self.max_ms);
        Duration::from_millis(ms)
    }
}

/// What the chain produced, and who produced it.
#[derive(Debug, Clone)]
pub struct ChainOutcome {
    pub artifact_location: String,
    pub provider: String,
    pub model_ref: String,
    /// Total attempts across all providers, including the successful one.
    pub attempts: u32,
}

/// An ordered provider list with per-provider retry.
///
/// On failure (error, timeout, or an `available() == false` probe) the
/// chain advances to the next provider. Construction convention: a
/// deterministic mock provider is always the last element, so a correctly
/// assembled chain cannot be exhausted. Retries hold no locks; the chain
/// is plain sequential control flow.
pub struct FallbackChain {
    providers: Vec<Arc<dyn Provider>>,
    backoff: BackoffPolicy,
}

impl FallbackChain {
    pub fn new(providers: Vec<Arc<dyn Provider>>, backoff: BackoffPolicy) -> Self {
        Self { providers, backoff }
    }

    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// Try each provider in order, up to `max_attempts_per_provider` calls
    /// each, bounding every call by `attempt_timeout`.
    pub async fn generate(
        &self,
        request: &GenerationRequest,
        max_attempts_per_provider: u32,
        attempt_timeout: Duration,
    ) -> DomainResult<ChainOutcome> {
        let max_attempts = max_attempts_per_provider.max(1);
        let mut attempts_total = 0_u32;
        let mut last_error = "no providers configured".to_string();

        for provider in &self.providers {
            if !provider.available().await {
                debug!(provider = provider.name(), "provider unavailable, skipping");
                last_error = format!("provider {} unavailable", provider.name());
                continue;
            }

            for attempt in 0..max_attempts {
                attempts_total += 1;
                match timeout(attempt_timeout, provider.generate(request)).await {
                    Ok(Ok(artifact_location)) => {
                        return Ok(ChainOutcome {
                            artifact_location,
                            provider: provider.name().to_string(),
                            model_ref: provider.model_ref().to_string(),
                            attempts: attempts_total,
                        });
                    }
                    Ok(Err(err)) => {
                        warn!(
                            provider = provider.name(),
                            attempt = attempt + 1,
                            %err,
                            "generation attempt failed"
                        );
                        last_error = err.to_string();
                    }
                    Err(_) => {
                        warn!(
                            provider = provider.name(),
                            attempt = attempt + 1,
                            "generation attempt timed out"
                        );
                        last_error = format!("provider {} timed out", provider.name());
                    }
                }
                if attempt + 1 < max_attempts {
                    let delay = self.backoff.delay(attempt);
                    if !delay.is_zero() {
                        sleep(delay).await;
                    }
                }
            }
        }

        Err(DomainError::ProviderChainExhausted {
            attempts: attempts_total,
            last_error,
        })
    }
}

/// Produces one round's candidates through the fallback chain.
pub struct DraftStage {
    chain: FallbackChain,
    catalog: Arc<TraditionCatalog>,
}

impl DraftStage {
    pub fn new(chain: FallbackChain, catalog: Arc<TraditionCatalog>) -> Self {
        Self { chain, catalog }
    }

    /// Generate the round's candidates.
    ///
    /// Seeds derive from `seed_base + candidate index` so a run with the
    /// same seed base reproduces exactly. When a fix-it plan is present the
    /// prompt is patched instead of rebuilt: deltas merge in ascending
    /// priority order, the most urgent region hint becomes the mask hint,
    /// and issue descriptions extend the negative prompt.
    pub async fn generate(&self, input: &DraftInput) -> DraftOutput {
        let start = Instant::now();
        let (prompt, negative_prompt, mask_hint) = self.build_prompts(input);
        let attempt_timeout = Duration::from_secs(input.config.timeout_secs);

        let mut candidates = Vec::with_capacity(input.config.n_candidates as usize);
        let mut model_ref = String::new();

        for index in 0..input.config.n_candidates {
            let seed = input.config.seed_base.wrapping_add(u64::from(index));
            let request = GenerationRequest {
                prompt: prompt.clone(),
                negative_prompt: negative_prompt.clone(),
                seed,
                width: input.config.width,
                height: input.config.height,
                steps: input.config.steps,
                sampler: input.config.sampler.clone(),
                mask_hint: mask_hint.clone(),
            };

            match self
                .chain
                .generate(&request, input.config.max_retries_per_provider, attempt_timeout)
                .await
            {
                Ok(outcome) => {
                    if model_ref.is_empty() {
                        model_ref.clone_from(&outcome.model_ref);
                    }
                    candidates.push(Candidate {
                        candidate_id: format!("{}-r{}-c{}", input.task_id, input.round, index),
                        generation_parameters: GenerationParameters {
                            prompt: request.prompt,
                            negative_prompt: request.negative_prompt,
                            seed,
                            width: request.width,
                            height: request.height,
                            steps: request.steps,
                            sampler: request.sampler,
                            mask_hint: request.mask_hint,
                        },
                        provenance: Provenance {
                            provider: outcome.provider,
                            seed,
                            model_ref: outcome.model_ref,
                        },
                        artifact_location: outcome.artifact_location,
                    });
                }
                Err(err) => {
                    return DraftOutput {
                        candidates,
                        model_ref,
                        latency_ms: start.elapsed().as_millis() as u64,
                        success: false,
                        error: Some(err.to_string()),
                    };
                }
            }
        }

        DraftOutput {
            candidates,
            model_ref,
            latency_ms: start.elapsed().as_millis() as u64,
            success: true,
            error: None,
        }
    }

    fn build_prompts(&self, input: &DraftInput) -> (String, String, Option<String>) {
        let profile = self.catalog.resolve(&input.tradition);

        let mut parts = vec![input.subject.clone()];
        if profile.name != crate::domain::models::DEFAULT_TRADITION {
            parts.push(format!("in the {} tradition", profile.name));
        }
        if !profile.style_keywords.is_empty() {
            parts.push(profile.style_keywords.join(", "));
        }
        let terms: Vec<&str> = input
            .evidence
            .terminology_hits
            .iter()
            .map(|h| h.term.as_str())
            .collect();
        if !terms.is_empty() {
            parts.push(terms.join(", "));
        }
        let mut prompt = parts.join(", ");
        let mut negative = BASE_NEGATIVE.to_string();
        let mut mask_hint = None;

        if let Some(plan) = &input.fixit {
            apply_fixit(plan, &mut prompt, &mut negative, &mut mask_hint);
        }

        (prompt, negative, mask_hint)
    }
}

/// Merge a fix-it plan into the assembled prompts.
fn apply_fixit(
    plan: &FixItPlan,
    prompt: &mut String,
    negative: &mut String,
    mask_hint: &mut Option<String>,
) {
    for item in plan.items_by_priority() {
        prompt.push_str(", ");
        prompt.push_str(&item.prompt_delta);
        negative.push_str(", ");
        negative.push_str(&item.issue);
    }
    *mask_hint = plan.primary_region_hint().map(String::from);
}
