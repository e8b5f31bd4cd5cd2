//! Pipeline configuration.
//!
//! Every section is a serde-derived value type with per-field defaults so a
//! partial YAML file or environment overlay deserializes cleanly. The loader
//! in [`crate::infrastructure::config`] merges defaults, project files, and
//! environment variables, then validates the result.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::draft::DraftConfig;

/// Gate policy for the critic stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CritiqueConfig {
    /// Minimum weighted total for a candidate to pass the gate.
    #[serde(default = "default_pass_threshold")]
    pub pass_threshold: f64,
    /// Per-dimension floor; one dimension below this rejects the candidate.
    #[serde(default = "default_min_dimension_score")]
    pub min_dimension_score: f64,
    /// How many scored candidates to keep after ranking.
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    /// Whether a critical risk tag hard-blocks the gate.
    #[serde(default = "default_true")]
    pub critical_risk_blocks: bool,
}

impl Default for CritiqueConfig {
    fn default() -> Self {
        Self {
            pass_threshold: default_pass_threshold(),
            min_dimension_score: default_min_dimension_score(),
            top_k: default_top_k(),
            critical_risk_blocks: default_true(),
        }
    }
}

/// Round/cost ceilings and thresholds for the decision engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionConfig {
    #[serde(default = "default_max_rounds")]
    pub max_rounds: u32,
    #[serde(default = "default_max_cost_usd")]
    pub max_cost_usd: f64,
    /// Accept immediately at or above this total, skipping remaining rounds.
    #[serde(default = "default_early_stop_threshold")]
    pub early_stop_threshold: f64,
    #[serde(default = "default_accept_threshold")]
    pub accept_threshold: f64,
    /// Below this round-over-round improvement the run stops.
    #[serde(default = "default_min_improvement")]
    pub min_improvement: f64,
    /// Fraction of `max_cost_usd` at which the run downgrades.
    #[serde(default = "default_downgrade_at_cost_pct")]
    pub downgrade_at_cost_pct: f64,
    #[serde(default = "default_cost_per_candidate")]
    pub cost_per_candidate_usd: f64,
    #[serde(default = "default_cost_per_critique")]
    pub cost_per_critique_usd: f64,
}

impl Default for DecisionConfig {
    fn default() -> Self {
        Self {
            max_rounds: default_max_rounds(),
            max_cost_usd: default_max_cost_usd(),
            early_stop_threshold: default_early_stop_threshold(),
            accept_threshold: default_accept_threshold(),
            min_improvement: default_min_improvement(),
            downgrade_at_cost_pct: default_downgrade_at_cost_pct(),
            cost_per_candidate_usd: default_cost_per_candidate(),
            cost_per_critique_usd: default_cost_per_critique(),
        }
    }
}

impl DecisionConfig {
    /// Worst-case cost of one round under the given generation profile.
    pub fn round_cost(&self, n_candidates: u32) -> f64 {
        self.cost_per_candidate_usd * f64::from(n_candidates) + self.cost_per_critique_usd
    }
}

/// Parameters for per-round weight modulation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeightingConfig {
    /// Confidence boost strength: weight scales by `1 + alpha * (1 - confidence)`.
    #[serde(default = "default_alpha")]
    pub alpha: f64,
    /// Per-round decay toward the uniform vector.
    #[serde(default = "default_decay_rate")]
    pub decay_rate: f64,
    /// Maximum deviation of a modulated weight from its base value.
    #[serde(default = "default_max_deviation")]
    pub max_deviation: f64,
    /// Multiplicative boost for dimensions flagged by cross-layer signals.
    #[serde(default = "default_signal_boost")]
    pub signal_boost: f64,
}

impl Default for WeightingConfig {
    fn default() -> Self {
        Self {
            alpha: default_alpha(),
            decay_rate: default_decay_rate(),
            max_deviation: default_max_deviation(),
            signal_boost: default_signal_boost(),
        }
    }
}

/// Human-in-the-loop behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HitlConfig {
    #[serde(default)]
    pub enabled: bool,
    /// How long a wait blocks before resuming with no human input.
    #[serde(default = "default_wait_timeout_secs")]
    pub wait_timeout_secs: u64,
}

impl Default for HitlConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            wait_timeout_secs: default_wait_timeout_secs(),
        }
    }
}

/// Which adapter serves a provider chain entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Remote backend behind the HTTP contract.
    Http,
    /// In-process deterministic mock.
    #[default]
    Mock,
}

/// One entry in the ordered provider chain.
///
/// Entries are tried in configuration order. Chain assembly appends a mock
/// terminator if the configured list does not end in one, so generation
/// cannot exhaust the chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderSpec {
    pub name: String,
    #[serde(default)]
    pub kind: ProviderKind,
    /// Base URL; required for `http` providers.
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "default_model_ref")]
    pub model_ref: String,
    /// Environment variable holding the backend's bearer token, if any.
    #[serde(default)]
    pub api_token_env: Option<String>,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Output format (json, pretty).
    #[serde(default = "default_log_format")]
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Pretty,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

/// Top-level configuration for one pipeline deployment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub draft: DraftConfig,
    #[serde(default)]
    pub critique: CritiqueConfig,
    #[serde(default)]
    pub decision: DecisionConfig,
    #[serde(default)]
    pub weighting: WeightingConfig,
    #[serde(default)]
    pub hitl: HitlConfig,
    #[serde(default)]
    pub logging: LogConfig,
    /// Ordered provider chain. Empty means mock-only.
    #[serde(default)]
    pub providers: Vec<ProviderSpec>,
    /// Root directory for checkpoints, the runs index, trajectories, and
    /// archives.
    #[serde(default = "default_state_dir")]
    pub state_dir: PathBuf,
    /// Whether to run the archival stage after a terminal decision.
    #[serde(default = "default_true")]
    pub archive_on_completion: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            draft: DraftConfig::default(),
            critique: CritiqueConfig::default(),
            decision: DecisionConfig::default(),
            weighting: WeightingConfig::default(),
            hitl: HitlConfig::default(),
            logging: LogConfig::default(),
            providers: Vec::new(),
            state_dir: default_state_dir(),
            archive_on_completion: default_true(),
        }
    }
}

fn default_pass_threshold() -> f64 {
    0.7
}
fn default_min_dimension_score() -> f64 {
    0.4
}
fn default_top_k() -> usize {
    3
}
fn default_true() -> bool {
    true
}
fn default_max_rounds() -> u32 {
    3
}
fn default_max_cost_usd() -> f64 {
    1.0
}
fn default_early_stop_threshold() -> f64 {
    0.9
}
fn default_accept_threshold() -> f64 {
    0.75
}
fn default_min_improvement() -> f64 {
    0.02
}
fn default_downgrade_at_cost_pct() -> f64 {
    0.8
}
fn default_cost_per_candidate() -> f64 {
    0.02
}
fn default_cost_per_critique() -> f64 {
    0.01
}
fn default_alpha() -> f64 {
    0.3
}
fn default_decay_rate() -> f64 {
    0.1
}
fn default_max_deviation() -> f64 {
    0.15
}
fn default_signal_boost() -> f64 {
    1.2
}
fn default_wait_timeout_secs() -> u64 {
    300
}
fn default_model_ref() -> String {
    "unspecified".to_string()
}
fn default_request_timeout_secs() -> u64 {
    120
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> LogFormat {
    LogFormat::Pretty
}
fn default_state_dir() -> PathBuf {
    PathBuf::from(".atelier/state")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_sane() {
        let config = PipelineConfig::default();
        assert!(config.critique.pass_threshold > config.critique.min_dimension_score);
        assert!(config.decision.early_stop_threshold >= config.decision.accept_threshold);
        assert!(config.decision.max_rounds >= 1);
        assert!(config.decision.downgrade_at_cost_pct > 0.0);
        assert!(config.decision.downgrade_at_cost_pct <= 1.0);
        assert_eq!(config.state_dir, PathBuf::from(".atelier/state"));
        assert!(config.archive_on_completion);
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let yaml = "decision:\n  max_rounds: 5\n";
        let config: PipelineConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.decision.max_rounds, 5);
        assert!((config.decision.accept_threshold - 0.75).abs() < f64::EPSILON);
        assert!(!config.hitl.enabled);
    }

    #[test]
    fn test_provider_spec_defaults_to_mock() {
        let yaml = "providers:\n  - name: primary\n";
        let config: PipelineConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.providers.len(), 1);
        assert_eq!(config.providers[0].kind, ProviderKind::Mock);
        assert_eq!(config.providers[0].request_timeout_secs, 120);
    }

    #[test]
    fn test_round_cost() {
        let decision = DecisionConfig::default();
        let expected = decision.cost_per_candidate_usd * 4.0 + decision.cost_per_critique_usd;
        assert!((decision.round_cost(4) - expected).abs() < 1e-12);
    }
}
