//! Gate/critic stage inputs and outputs.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::candidate::Candidate;
use super::evidence::EvidencePack;
use super::fixit::FixItPlan;
use super::score::{CandidateScore, Dimension};

/// Everything the critic needs to evaluate one round's candidates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CritiqueInput {
    pub task_id: String,
    pub subject: String,
    pub tradition: String,
    pub round: u32,
    pub evidence: EvidencePack,
    pub candidates: Vec<Candidate>,
}

/// The critic's verdict on one round.
///
/// `scored_candidates` is sorted by `weighted_total` descending (ties broken
/// by `candidate_id` ascending) and truncated to the configured `top_k`.
/// `rerun_hint` lists the dimensions where any candidate scored below 0.3,
/// in canonical (lexical) order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CritiqueOutput {
    pub success: bool,
    pub scored_candidates: Vec<CandidateScore>,
    pub best_candidate_id: Option<String>,
    pub rerun_hint: Vec<Dimension>,
    pub fixit_plan: Option<FixItPlan>,
    /// The resolved weight vector the totals were computed with, keyed by
    /// wire dimension id. Kept in the output so the round is auditable.
    pub weights: BTreeMap<String, f64>,
    pub latency_ms: u64,
}

impl CritiqueOutput {
    /// The top-ranked score regardless of gate outcome, if any candidate
    /// was scored at all.
    pub fn top_score(&self) -> Option<&CandidateScore> {
        self.scored_candidates.first()
    }

    /// The score record of the winning (gate-passing) candidate.
    pub fn best_score(&self) -> Option<&CandidateScore> {
        let best_id = self.best_candidate_id.as_deref()?;
        self.scored_candidates
            .iter()
            .find(|s| s.candidate_id == best_id)
    }
}
