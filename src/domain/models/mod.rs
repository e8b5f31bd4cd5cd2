//! Domain models for the Atelier pipeline.

pub mod budget;
pub mod candidate;
pub mod config;
pub mod critique;
pub mod draft;
pub mod evidence;
pub mod fixit;
pub mod hitl;
pub mod plan;
pub mod run;
pub mod score;
pub mod task;
pub mod tradition;
pub mod trajectory;

pub use budget::BudgetState;
pub use candidate::{Candidate, GenerationParameters, Provenance};
pub use config::{
    CritiqueConfig, DecisionConfig, HitlConfig, LogConfig, LogFormat, PipelineConfig,
    ProviderKind, ProviderSpec, WeightingConfig,
};
pub use critique::{CritiqueInput, CritiqueOutput};
pub use draft::{DraftConfig, DraftInput, DraftOutput, GenerationRequest};
pub use evidence::{EvidencePack, SampleMatch, TabooViolation, TerminologyHit};
pub use fixit::{FixItPlan, FixItStrategy, FixItem};
pub use hitl::{HumanAction, HumanActionKind};
pub use plan::{Decision, DecisionAction, PlanState};
pub use run::{
    PipelineEvent, PipelineOutput, RunStatus, RunStatusReport, RunSummary, StageResult,
};
pub use score::{CandidateScore, Dimension, DimensionScore, RiskSeverity, RiskTag};
pub use task::Task;
pub use tradition::{TraditionCatalog, TraditionProfile, WeightVector, DEFAULT_TRADITION};
pub use trajectory::{ArchiveManifest, RoundRecord, RunTrajectory};
