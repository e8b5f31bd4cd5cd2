//! Recorded run history for later retrieval-augmented decision-making.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::critique::CritiqueOutput;
use super::draft::DraftOutput;
use super::evidence::EvidencePack;
use super::plan::Decision;
use super::run::PipelineOutput;

/// Everything that happened in one round.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundRecord {
    pub round: u32,
    pub draft: DraftOutput,
    pub critique: CritiqueOutput,
    pub decision: Decision,
}

/// The full history of one run, written once the run reaches a terminal
/// state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunTrajectory {
    pub task_id: String,
    pub subject: String,
    pub tradition: String,
    pub evidence: EvidencePack,
    pub rounds: Vec<RoundRecord>,
    pub output: Option<PipelineOutput>,
    pub recorded_at: DateTime<Utc>,
}

/// Durable artifact paths produced by the archival collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveManifest {
    pub evidence_chain: String,
    pub critique_card: String,
    pub params_snapshot: String,
}
