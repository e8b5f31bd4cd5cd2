use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use crate::domain::models::{PipelineConfig, ProviderKind};

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid max_rounds: {0}. Must be at least 1")]
    InvalidMaxRounds(u32),

    #[error("Invalid max_cost_usd: {0}. Must be positive")]
    InvalidMaxCost(f64),

    #[error("Invalid threshold {name}: {value}. Must be within [0, 1]")]
    InvalidThreshold { name: &'static str, value: f64 },

    #[error(
        "Invalid thresholds: early_stop_threshold ({0}) must not be below accept_threshold ({1})"
    )]
    InvalidThresholdOrder(f64, f64),

    #[error("Invalid downgrade_at_cost_pct: {0}. Must be within (0, 1]")]
    InvalidDowngradePct(f64),

    #[error("Invalid top_k: 0. Must be at least 1")]
    InvalidTopK,

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Provider {0} is declared as http but has no base_url")]
    MissingProviderUrl(String),

    #[error("Invalid hitl wait_timeout_secs: 0. Must be at least 1")]
    InvalidHitlTimeout,
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .atelier/config.yaml (project config)
    /// 3. .atelier/local.yaml (project local overrides, optional)
    /// 4. Environment variables (ATELIER_* prefix, highest priority)
    ///
    /// Configuration is always project-local (pwd/.atelier/) so several
    /// deployments on one machine keep independent state roots.
    pub fn load() -> Result<PipelineConfig> {
        let config: PipelineConfig = Figment::new()
            .merge(Serialized::defaults(PipelineConfig::default()))
            .merge(Yaml::file(".atelier/config.yaml"))
            .merge(Yaml::file(".atelier/local.yaml"))
            .merge(Env::prefixed("ATELIER_").split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: impl AsRef<std::path::Path>) -> Result<PipelineConfig> {
        let config: PipelineConfig = Figment::new()
            .merge(Serialized::defaults(PipelineConfig::default()))
            .merge(Yaml::file(path.as_ref()))
            .extract()
            .context(format!(
                "Failed to load config from {}",
                path.as_ref().display()
            ))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(config: &PipelineConfig) -> Result<(), ConfigError> {
        let decision = &config.decision;
        if decision.max_rounds == 0 {
            return Err(ConfigError::InvalidMaxRounds(decision.max_rounds));
        }
        if decision.max_cost_usd <= 0.0 {
            return Err(ConfigError::InvalidMaxCost(decision.max_cost_usd));
        }
        for (name, value) in [
            ("accept_threshold", decision.accept_threshold),
            ("early_stop_threshold", decision.early_stop_threshold),
            ("pass_threshold", config.critique.pass_threshold),
            ("min_dimension_score", config.critique.min_dimension_score),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::InvalidThreshold { name, value });
            }
        }
        if decision.early_stop_threshold < decision.accept_threshold {
            return Err(ConfigError::InvalidThresholdOrder(
                decision.early_stop_threshold,
                decision.accept_threshold,
            ));
        }
        if decision.downgrade_at_cost_pct <= 0.0 || decision.downgrade_at_cost_pct > 1.0 {
            return Err(ConfigError::InvalidDowngradePct(
                decision.downgrade_at_cost_pct,
            ));
        }

        if config.critique.top_k == 0 {
            return Err(ConfigError::InvalidTopK);
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        for spec in &config.providers {
            if spec.kind == ProviderKind::Http && spec.base_url.is_none() {
                return Err(ConfigError::MissingProviderUrl(spec.name.clone()));
            }
        }

        if config.hitl.enabled && config.hitl.wait_timeout_secs == 0 {
            return Err(ConfigError::InvalidHitlTimeout);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use crate::domain::models::ProviderSpec;

    #[test]
    fn test_defaults_validate() {
        assert!(ConfigLoader::validate(&PipelineConfig::default()).is_ok());
    }

    #[test]
    fn test_load_from_file_merges_over_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "decision:\n  max_rounds: 5\ncritique:\n  top_k: 2\n"
        )
        .unwrap();

        let config = ConfigLoader::load_from_file(file.path()).unwrap();
        assert_eq!(config.decision.max_rounds, 5);
        assert_eq!(config.critique.top_k, 2);
        // Untouched sections keep their defaults.
        assert!((config.decision.accept_threshold - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn test_zero_rounds_rejected() {
        let mut config = PipelineConfig::default();
        config.decision.max_rounds = 0;
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidMaxRounds(0))
        ));
    }

    #[test]
    fn test_threshold_out_of_range_rejected() {
        let mut config = PipelineConfig::default();
        config.critique.pass_threshold = 1.5;
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidThreshold { .. })
        ));
    }

    #[test]
    fn test_early_stop_below_accept_rejected() {
        let mut config = PipelineConfig::default();
        config.decision.early_stop_threshold = 0.5;
        config.decision.accept_threshold = 0.75;
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidThresholdOrder(..))
        ));
    }

    #[test]
    fn test_http_provider_without_url_rejected() {
        let mut config = PipelineConfig::default();
        config.providers.push(ProviderSpec {
            name: "gpu-a".to_string(),
            kind: ProviderKind::Http,
            base_url: None,
            model_ref: "sdxl-1.0".to_string(),
            api_token_env: None,
            request_timeout_secs: 120,
        });
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::MissingProviderUrl(name)) if name == "gpu-a"
        ));
    }

    #[test]
    fn test_bad_log_level_rejected() {
        let mut config = PipelineConfig::default();
        config.logging.level = "verbose".to_string();
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidLogLevel(_))
        ));
    }
}
