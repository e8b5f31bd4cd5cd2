//! Service layer: the pipeline's engines and the orchestrator.

pub mod critic;
pub mod decision;
pub mod draft;
pub mod hitl;
pub mod orchestrator;
pub mod scoring;
pub mod trajectory;
pub mod weighting;

pub use critic::{CriticStage, CritiqueContext};
pub use decision::DecisionEngine;
pub use draft::{BackoffPolicy, ChainOutcome, DraftStage, FallbackChain};
pub use hitl::HumanMailbox;
pub use orchestrator::Orchestrator;
pub use scoring::ScoringEngine;
pub use trajectory::TrajectoryRecorder;
pub use weighting::{CrossLayerSignal, CrossLayerSignalKind, WeightingEngine};
