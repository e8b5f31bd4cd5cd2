//! Atelier - Evaluation pipeline for culturally-grounded artwork generation
//!
//! Atelier produces, scores, and iteratively refines candidate artifacts
//! for a subject under a cultural tradition, through bounded rounds of
//! generation, rule-based multi-dimensional critique, and budget-aware
//! decisions.
//!
//! # Architecture
//!
//! This crate follows Clean Architecture / Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): value types, the domain error, and the
//!   port traits collaborators implement
//! - **Service Layer** (`services`): the pipeline engines and the
//!   orchestrator/run state machine
//! - **Adapters** (`adapters`): concrete port implementations (providers,
//!   checkpoint/trajectory stores, scout, archiver)
//! - **Infrastructure Layer** (`infrastructure`): configuration loading,
//!   logging, deployment wiring
//! - **CLI Layer** (`cli`): operator command-line interface
//!
//! # Example
//!
//! ```ignore
//! use atelier::domain::models::{PipelineConfig, Task};
//! use atelier::infrastructure::setup::build_orchestrator;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let orchestrator = build_orchestrator(PipelineConfig::default())?;
//!     let task = Task::new("t-1", "crane over pines", "chinese_ink");
//!     let output = orchestrator.run(task).await;
//!     println!("{:?}", output.final_decision);
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::models::{
    BudgetState, Candidate, CandidateScore, CritiqueConfig, CritiqueOutput, DecisionAction,
    DecisionConfig, Dimension, DimensionScore, DraftConfig, EvidencePack, FixItPlan, HumanAction,
    PipelineConfig, PipelineEvent, PipelineOutput, RiskSeverity, RiskTag, RunStatus, Task,
    TraditionCatalog, WeightVector,
};
pub use domain::ports::{Archiver, CheckpointStore, Provider, Scout, TrajectoryStore};
pub use domain::{DomainError, DomainResult};
pub use infrastructure::{build_orchestrator, ConfigError, ConfigLoader};
pub use services::{DecisionEngine, FallbackChain, Orchestrator, ScoringEngine, WeightingEngine};
