//! Deployment wiring: configuration in, a ready orchestrator out.
//!
//! Everything here is constructed once and read-only thereafter. The
//! tradition catalog, provider chain, and stage configs are plain values
//! handed to the components that need them; there is no process-wide
//! registry to mutate.

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::adapters::{
    FsArchiver, FsCheckpointStore, FsTrajectoryStore, HttpProvider, HttpProviderConfig,
    MockProvider, StaticScout,
};
use crate::domain::models::{PipelineConfig, ProviderKind, ProviderSpec, TraditionCatalog};
use crate::domain::ports::{CheckpointStore, Provider};
use crate::services::{
    BackoffPolicy, CriticStage, DraftStage, FallbackChain, Orchestrator, WeightingEngine,
};

/// Assemble the ordered provider chain from configuration.
///
/// HTTP entries come first in their configured order; a deterministic mock
/// terminator is appended unless the configured list already ends in a
/// mock, so an assembled chain can always produce candidates. Unreachable
/// backends cost nothing at assembly time; the chain probes availability
/// per round.
pub fn build_provider_chain(specs: &[ProviderSpec]) -> Result<Vec<Arc<dyn Provider>>> {
    let mut providers: Vec<Arc<dyn Provider>> = Vec::with_capacity(specs.len() + 1);
    for spec in specs {
        match spec.kind {
            ProviderKind::Http => {
                let base_url = spec
                    .base_url
                    .clone()
                    .with_context(|| format!("provider {} has no base_url", spec.name))?;
                let api_token = match &spec.api_token_env {
                    Some(var) => Some(
                        std::env::var(var)
                            .with_context(|| format!("provider {} token env {var} unset", spec.name))?,
                    ),
                    None => None,
                };
                let provider = HttpProvider::new(HttpProviderConfig {
                    name: spec.name.clone(),
                    model_ref: spec.model_ref.clone(),
                    base_url,
                    api_token,
                    request_timeout_secs: spec.request_timeout_secs,
                })
                .with_context(|| format!("failed to build provider {}", spec.name))?;
                providers.push(Arc::new(provider));
            }
            ProviderKind::Mock => {
                providers.push(Arc::new(MockProvider::named(spec.name.clone())));
            }
        }
    }

    let ends_in_mock = specs.last().is_some_and(|s| s.kind == ProviderKind::Mock);
    if !ends_in_mock {
        providers.push(Arc::new(MockProvider::new()));
    }
    Ok(providers)
}

/// Build a fully wired orchestrator over filesystem-backed state.
pub fn build_orchestrator(config: PipelineConfig) -> Result<Arc<Orchestrator>> {
    let catalog = Arc::new(TraditionCatalog::builtin());
    let checkpoints = Arc::new(FsCheckpointStore::new(&config.state_dir));

    let scout = Arc::new(StaticScout::new(Arc::clone(&catalog)));
    let weighting = WeightingEngine::new(Arc::clone(&catalog), config.weighting.clone());
    let critic = CriticStage::new(
        weighting,
        Arc::clone(&catalog),
        config.critique.clone(),
        Arc::clone(&checkpoints) as Arc<dyn CheckpointStore>,
    );

    let providers = build_provider_chain(&config.providers)?;
    let chain = FallbackChain::new(providers, BackoffPolicy::default());
    let draft = DraftStage::new(chain, Arc::clone(&catalog));

    let trajectories = Arc::new(FsTrajectoryStore::new(&config.state_dir));
    let archiver = Arc::new(FsArchiver::new(&config.state_dir));

    let orchestrator = Orchestrator::new(
        config,
        scout,
        draft,
        critic,
        checkpoints,
    )
    .with_trajectory_store(trajectories)
    .with_archiver(archiver);

    Ok(Arc::new(orchestrator))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_spec_list_yields_mock_only_chain() {
        let providers = build_provider_chain(&[]).unwrap();
        assert_eq!(providers.len(), 1);
        assert_eq!(providers[0].name(), "mock");
    }

    #[test]
    fn test_http_chain_gains_mock_terminator() {
        let specs = vec![ProviderSpec {
            name: "gpu-a".to_string(),
            kind: ProviderKind::Http,
            base_url: Some("http://worker:7860".to_string()),
            model_ref: "sdxl-1.0".to_string(),
            api_token_env: None,
            request_timeout_secs: 120,
        }];
        let providers = build_provider_chain(&specs).unwrap();
        assert_eq!(providers.len(), 2);
        assert_eq!(providers[0].name(), "gpu-a");
        assert_eq!(providers[1].name(), "mock");
    }

    #[test]
    fn test_trailing_mock_not_duplicated() {
        let specs = vec![ProviderSpec {
            name: "local-mock".to_string(),
            kind: ProviderKind::Mock,
            base_url: None,
            model_ref: "mock-diffusion-v1".to_string(),
            api_token_env: None,
            request_timeout_secs: 120,
        }];
        let providers = build_provider_chain(&specs).unwrap();
        assert_eq!(providers.len(), 1);
        assert_eq!(providers[0].name(), "local-mock");
    }

    #[test]
    fn test_build_orchestrator_from_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = PipelineConfig {
            state_dir: dir.path().to_path_buf(),
            ..PipelineConfig::default()
        };
        assert!(build_orchestrator(config).is_ok());
    }
}
