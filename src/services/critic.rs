//! Gate/critic stage: score, gate, rank, and plan repairs.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, warn};

use crate::domain::models::critique::{CritiqueInput, CritiqueOutput};
use crate::domain::models::fixit::{FixItPlan, FixItStrategy, FixItem};
use crate::domain::models::score::{round4, CandidateScore, Dimension, RiskSeverity};
use crate::domain::models::tradition::WeightVector;
use crate::domain::models::CritiqueConfig;
use crate::domain::ports::CheckpointStore;

use super::scoring::ScoringEngine;
use super::weighting::{CrossLayerSignal, WeightingEngine};

/// A dimension scoring below this anywhere in the round lands in the
/// rerun hint.
const RERUN_HINT_THRESHOLD: f64 = 0.3;

/// A dimension scoring below this on the top candidate gets a fix-it item.
const REPAIR_THRESHOLD: f64 = 0.6;

/// Checkpoint namespace for critique output.
pub const CRITIQUE_STAGE: &str = "critique";

/// Per-round modulation inputs the orchestrator carries into the critic.
#[derive(Debug, Clone, Default)]
pub struct CritiqueContext {
    /// Previous round's per-dimension confidences (0.5 where unknown).
    pub confidences: [f64; 5],
    /// Active cross-layer signals for this round.
    pub signals: Vec<CrossLayerSignal>,
}

/// Runs the scoring engine over a round's candidates and applies gate
/// policy.
///
/// Gating always produces a result: malformed or empty candidate input is
/// reported through `success` and `rejected_reasons`, never an error.
pub struct CriticStage {
    scoring: ScoringEngine,
    weighting: WeightingEngine,
    config: CritiqueConfig,
    catalog: Arc<crate::domain::models::TraditionCatalog>,
    checkpoints: Arc<dyn CheckpointStore>,
}

impl CriticStage {
    pub fn new(
        weighting: WeightingEngine,
        catalog: Arc<crate::domain::models::TraditionCatalog>,
        config: CritiqueConfig,
        checkpoints: Arc<dyn CheckpointStore>,
    ) -> Self {
        Self {
            scoring: ScoringEngine::new(),
            weighting,
            config,
            catalog,
            checkpoints,
        }
    }

    /// Evaluate one round of candidates.
    pub async fn run(&self, input: &CritiqueInput, ctx: &CritiqueContext) -> CritiqueOutput {
        let start = Instant::now();
        let base = self.weighting.resolve(&input.tradition);
        let weights = self
            .weighting
            .modulate(base, ctx.confidences, input.round, &ctx.signals);

        let output = if input.candidates.is_empty() {
            CritiqueOutput {
                success: false,
                scored_candidates: vec![],
                best_candidate_id: None,
                rerun_hint: vec![],
                fixit_plan: None,
                weights: weights.to_map(),
                latency_ms: start.elapsed().as_millis() as u64,
            }
        } else {
            self.evaluate(input, weights, start)
        };

        self.checkpoint(&input.task_id, &output).await;
        output
    }

    fn evaluate(
        &self,
        input: &CritiqueInput,
        weights: WeightVector,
        start: Instant,
    ) -> CritiqueOutput {
        let profile = self.catalog.resolve(&input.tradition);

        let mut scored: Vec<CandidateScore> = input
            .candidates
            .iter()
            .map(|candidate| {
                let dimension_scores = self.scoring.score(candidate, &input.evidence, profile);
                let risk_tags = self.scoring.tag_risk(candidate, &input.evidence, profile);
                let weighted_total: f64 = dimension_scores
                    .iter()
                    .map(|s| weights.get(s.dimension_id) * s.score)
                    .sum();

                let mut rejected_reasons = Vec::new();
                if weighted_total < self.config.pass_threshold {
                    rejected_reasons.push(format!(
                        "weighted total {:.4} below pass threshold {:.2}",
                        weighted_total, self.config.pass_threshold
                    ));
                }
                for score in &dimension_scores {
                    if score.score < self.config.min_dimension_score {
                        rejected_reasons.push(format!(
                            "dimension {} score {:.4} below minimum {:.2}",
                            score.dimension_id, score.score, self.config.min_dimension_score
                        ));
                    }
                }
                if self.config.critical_risk_blocks {
                    for tag in &risk_tags {
                        if tag.severity == RiskSeverity::Critical {
                            rejected_reasons.push(format!("critical risk: {}", tag.name));
                        }
                    }
                }

                CandidateScore {
                    candidate_id: candidate.candidate_id.clone(),
                    dimension_scores,
                    weighted_total,
                    risk_tags,
                    gate_passed: rejected_reasons.is_empty(),
                    rejected_reasons,
                }
            })
            .collect();

        // Hint is computed over every scored candidate, before truncation.
        let mut rerun_hint: Vec<Dimension> = Dimension::ALL
            .into_iter()
            .filter(|d| {
                scored
                    .iter()
                    .any(|s| s.score_for(*d).is_some_and(|v| v < RERUN_HINT_THRESHOLD))
            })
            .collect();
        rerun_hint.sort_unstable();

        // Stable rank: weighted total descending, candidate_id ascending as
        // the explicit tie-break.
        scored.sort_by(|a, b| {
            b.weighted_total
                .partial_cmp(&a.weighted_total)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.candidate_id.cmp(&b.candidate_id))
        });
        scored.truncate(self.config.top_k);

        let best_candidate_id = scored
            .iter()
            .find(|s| s.gate_passed)
            .map(|s| s.candidate_id.clone());

        let fixit_plan = if best_candidate_id.is_none() {
            scored.first().map(|top| self.build_fixit_plan(top, input))
        } else {
            None
        };

        debug!(
            task_id = %input.task_id,
            round = input.round,
            candidates = scored.len(),
            best = ?best_candidate_id,
            "critique complete"
        );

        CritiqueOutput {
            success: true,
            scored_candidates: scored,
            best_candidate_id,
            rerun_hint,
            fixit_plan,
            weights: weights.to_map(),
            latency_ms: start.elapsed().as_millis() as u64,
        }
    }

    /// Build a repair plan from the top candidate's weak dimensions.
    ///
    /// Weakest dimension gets priority 1. Two or fewer weak dimensions make
    /// a targeted repair; more means the round regenerates from scratch.
    fn build_fixit_plan(&self, top: &CandidateScore, input: &CritiqueInput) -> FixItPlan {
        let profile = self.catalog.resolve(&input.tradition);

        let mut failing: Vec<(Dimension, f64, String)> = top
            .dimension_scores
            .iter()
            .filter(|s| s.score < REPAIR_THRESHOLD)
            .map(|s| (s.dimension_id, s.score, s.rationale.clone()))
            .collect();
        failing.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));

        let items: Vec<FixItem> = failing
            .iter()
            .enumerate()
            .map(|(rank, (dimension, _, rationale))| {
                let (prompt_delta, region_hint) = repair_delta(*dimension, input, profile);
                FixItem {
                    target_layer: *dimension,
                    issue: rationale.clone(),
                    prompt_delta,
                    region_hint,
                    priority: (rank + 1) as u8,
                }
            })
            .collect();

        let overall_strategy = if items.len() <= 2 {
            FixItStrategy::TargetedRepair
        } else {
            FixItStrategy::FullRegenerate
        };

        FixItPlan {
            items,
            overall_strategy,
            source_scores: top
                .dimension_scores
                .iter()
                .map(|s| (s.dimension_id.id().to_string(), round4(s.score)))
                .collect(),
        }
    }

    async fn checkpoint(&self, task_id: &str, output: &CritiqueOutput) {
        match serde_json::to_value(output) {
            Ok(value) => {
                if let Err(err) = self.checkpoints.save(task_id, CRITIQUE_STAGE, &value).await {
                    warn!(%task_id, %err, "failed to checkpoint critique output");
                }
            }
            Err(err) => warn!(%task_id, %err, "failed to serialize critique output"),
        }
    }
}

/// The repair instruction for one weak dimension.
fn repair_delta(
    dimension: Dimension,
    input: &CritiqueInput,
    profile: &crate::domain::models::TraditionProfile,
) -> (String, Option<String>) {
    match dimension {
        Dimension::VisualPerception => (
            "refine composition, clarify focal hierarchy".to_string(),
            Some("full_frame".to_string()),
        ),
        Dimension::TechnicalAnalysis => (
            "increase rendering fidelity and material detail".to_string(),
            Some("detail_pass".to_string()),
        ),
        Dimension::CulturalContext => {
            let terms: Vec<&str> = input
                .evidence
                .terminology_hits
                .iter()
                .map(|h| h.term.as_str())
                .collect();
            (
                format!("incorporate tradition terminology: {}", terms.join(", ")),
                None,
            )
        }
        Dimension::CriticalInterpretation => {
            let titles: Vec<&str> = input
                .evidence
                .sample_matches
                .iter()
                .map(|s| s.title.as_str())
                .collect();
            (
                format!("reference canonical works: {}", titles.join(", ")),
                None,
            )
        }
        Dimension::Aesthetic => (
            format!(
                "apply stylistic vocabulary: {}",
                profile.style_keywords.join(", ")
            ),
            None,
        ),
    }
}
