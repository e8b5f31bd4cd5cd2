//! Generation-stage inputs, outputs, and guardrail-clamped configuration.

use serde::{Deserialize, Serialize};

use super::candidate::Candidate;
use super::evidence::EvidencePack;
use super::fixit::FixItPlan;

/// Hard limits on sampling parameters.
pub const MIN_STEPS: u32 = 1;
pub const MAX_STEPS: u32 = 50;
pub const MIN_RETRIES: u32 = 1;
pub const MIN_TIMEOUT_SECS: u64 = 5;

/// Round a requested pixel dimension up to the next positive multiple of 64.
pub fn align_dimension(requested: u32) -> u32 {
    let requested = requested.max(1);
    requested.div_ceil(64) * 64
}

/// Resolved generation parameters for one round.
///
/// Guardrails are enforced at construction via [`DraftConfig::resolved`],
/// never at call time: the generation stage trusts that any `DraftConfig`
/// it receives is already within limits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftConfig {
    #[serde(default = "default_n_candidates")]
    pub n_candidates: u32,
    #[serde(default = "default_max_candidates")]
    pub max_candidates: u32,
    #[serde(default = "default_steps")]
    pub steps: u32,
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_width")]
    pub height: u32,
    #[serde(default = "default_sampler")]
    pub sampler: String,
    #[serde(default)]
    pub seed_base: u64,
    #[serde(default = "default_provider_retries")]
    pub max_retries_per_provider: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_n_candidates() -> u32 {
    4
}
fn default_max_candidates() -> u32 {
    6
}
fn default_steps() -> u32 {
    30
}
fn default_width() -> u32 {
    512
}
fn default_sampler() -> String {
    "euler_a".to_string()
}
fn default_provider_retries() -> u32 {
    2
}
fn default_timeout_secs() -> u64 {
    60
}

impl DraftConfig {
    /// Clamp raw requested values into a valid configuration:
    ///
    /// - candidate count into `[1, max_candidates]`
    /// - steps into `[1, 50]`
    /// - width/height rounded up to the next positive multiple of 64
    /// - retries and timeout floored at their minimums
    #[allow(clippy::too_many_arguments)]
    pub fn resolved(
        n_candidates: u32,
        max_candidates: u32,
        steps: u32,
        width: u32,
        height: u32,
        sampler: impl Into<String>,
        seed_base: u64,
        max_retries_per_provider: u32,
        timeout_secs: u64,
    ) -> Self {
        let max_candidates = max_candidates.max(1);
        Self {
            n_candidates: n_candidates.clamp(1, max_candidates),
            max_candidates,
            steps: steps.clamp(MIN_STEPS, MAX_STEPS),
            width: align_dimension(width),
            height: align_dimension(height),
            sampler: sampler.into(),
            seed_base,
            max_retries_per_provider: max_retries_per_provider.max(MIN_RETRIES),
            timeout_secs: timeout_secs.max(MIN_TIMEOUT_SECS),
        }
    }

    /// Re-apply the guardrails. Used after deserializing raw settings from
    /// a config file so out-of-range values never reach the provider chain.
    pub fn sanitized(&self) -> Self {
        Self::resolved(
            self.n_candidates,
            self.max_candidates,
            self.steps,
            self.width,
            self.height,
            self.sampler.clone(),
            self.seed_base,
            self.max_retries_per_provider,
            self.timeout_secs,
        )
    }

    /// The downgraded profile: half the candidates and steps, floored at
    /// the minimums. Applied when the decision engine downgrades a run.
    pub fn downgraded(&self) -> Self {
        Self::resolved(
            (self.n_candidates / 2).max(1),
            self.max_candidates,
            (self.steps / 2).max(MIN_STEPS),
            self.width,
            self.height,
            self.sampler.clone(),
            self.seed_base,
            self.max_retries_per_provider,
            self.timeout_secs,
        )
    }
}

impl Default for DraftConfig {
    fn default() -> Self {
        Self::resolved(4, 6, 30, 512, 512, "euler_a", 0, 2, 60)
    }
}

/// What one provider call needs to produce an artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub prompt: String,
    pub negative_prompt: String,
    pub seed: u64,
    pub width: u32,
    pub height: u32,
    pub steps: u32,
    pub sampler: String,
    pub mask_hint: Option<String>,
}

/// Input to the generation stage for one round.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DraftInput {
    pub task_id: String,
    pub subject: String,
    pub tradition: String,
    pub round: u32,
    pub evidence: EvidencePack,
    pub config: DraftConfig,
    /// Present when the decision engine chose targeted repair.
    pub fixit: Option<FixItPlan>,
}

/// Output of the generation stage for one round.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DraftOutput {
    pub candidates: Vec<Candidate>,
    pub model_ref: String,
    pub latency_ms: u64,
    pub success: bool,
    pub error: Option<String>,
}
