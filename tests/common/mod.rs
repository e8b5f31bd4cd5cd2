//! Shared fixtures for integration tests.

// Each integration test binary compiles this module separately and uses a
// different subset of it.
#![allow(dead_code)]

use std::sync::Arc;

use atelier::adapters::{
    MemoryCheckpointStore, MemoryTrajectoryStore, MockProvider, NoopArchiver, StaticScout,
};
use atelier::domain::models::{PipelineConfig, TraditionCatalog};
use atelier::domain::ports::Provider;
use atelier::services::{
    BackoffPolicy, CriticStage, DraftStage, FallbackChain, Orchestrator, WeightingEngine,
};

/// Everything a test needs to drive and inspect one orchestrator.
pub struct Fixture {
    pub orchestrator: Arc<Orchestrator>,
    pub checkpoints: Arc<MemoryCheckpointStore>,
    pub trajectories: Arc<MemoryTrajectoryStore>,
}

/// Build an orchestrator over in-memory state and a mock-only chain.
pub fn fixture(config: PipelineConfig) -> Fixture {
    assemble(config, vec![Arc::new(MockProvider::new())], false)
}

/// Same, but over a caller-supplied provider chain.
pub fn fixture_with_chain(config: PipelineConfig, providers: Vec<Arc<dyn Provider>>) -> Fixture {
    assemble(config, providers, false)
}

/// Same, but every checkpoint write fails.
pub fn fixture_with_failing_checkpoints(config: PipelineConfig) -> Fixture {
    assemble(config, vec![Arc::new(MockProvider::new())], true)
}

fn assemble(
    config: PipelineConfig,
    providers: Vec<Arc<dyn Provider>>,
    failing_checkpoints: bool,
) -> Fixture {
    let catalog = Arc::new(TraditionCatalog::builtin());
    let checkpoints = Arc::new(if failing_checkpoints {
        MemoryCheckpointStore::failing()
    } else {
        MemoryCheckpointStore::new()
    });
    let trajectories = Arc::new(MemoryTrajectoryStore::new());

    let scout = Arc::new(StaticScout::new(Arc::clone(&catalog)));
    let weighting = WeightingEngine::new(Arc::clone(&catalog), config.weighting.clone());
    let critic = CriticStage::new(
        weighting,
        Arc::clone(&catalog),
        config.critique.clone(),
        Arc::clone(&checkpoints) as _,
    );
    let chain = FallbackChain::new(providers, BackoffPolicy::none());
    let draft = DraftStage::new(chain, Arc::clone(&catalog));

    let orchestrator = Arc::new(
        Orchestrator::new(config, scout, draft, critic, Arc::clone(&checkpoints) as _)
            .with_trajectory_store(Arc::clone(&trajectories) as _)
            .with_archiver(Arc::new(NoopArchiver)),
    );

    Fixture {
        orchestrator,
        checkpoints,
        trajectories,
    }
}

/// A config that keeps tests fast: two candidates, fixed seed base.
pub fn test_config() -> PipelineConfig {
    let mut config = PipelineConfig::default();
    config.draft.n_candidates = 2;
    config.draft.seed_base = 7;
    config
}
