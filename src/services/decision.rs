//! Budget-aware control loop: one decision per round.

use std::collections::BTreeMap;

use tracing::info;

use crate::domain::models::critique::CritiqueOutput;
use crate::domain::models::fixit::FixItStrategy;
use crate::domain::models::hitl::{HumanAction, HumanActionKind};
use crate::domain::models::plan::{Decision, DecisionAction, PlanState};
use crate::domain::models::score::round4;
use crate::domain::models::DecisionConfig;

/// A rerun hint touching at most this many dimensions counts as narrow.
const NARROW_HINT_MAX: usize = 2;

/// Owns one task's [`PlanState`] and produces a [`Decision`] per round.
///
/// Decision order, evaluated after each critique:
///
/// 1. round or cost ceiling reached → `stop`
/// 2. winner at or above the early-stop threshold → `accept`
/// 3. winner at or above the accept threshold → `accept`
/// 4. projected cost of another round crosses the downgrade fraction →
///    `downgrade`
/// 5. round-over-round improvement below the minimum → `stop`
/// 6. otherwise rerun: targeted (`rerun_local`) when the failure is narrow
///    or the fix-it plan says targeted repair, global otherwise
pub struct DecisionEngine {
    config: DecisionConfig,
    plan: PlanState,
}

impl DecisionEngine {
    pub fn new(config: DecisionConfig, task_id: impl Into<String>) -> Self {
        let task_id = task_id.into();
        Self {
            plan: PlanState::new(task_id),
            config,
        }
    }

    pub fn plan(&self) -> &PlanState {
        &self.plan
    }

    /// Record a human submission. Dimension locks accumulate across
    /// actions; everything else is interpreted by [`Self::override_decision`].
    pub fn apply_human_action(&mut self, action: &HumanAction) {
        if action.action == HumanActionKind::LockDimensions
            || !action.locked_dimensions.is_empty()
        {
            for dimension in &action.locked_dimensions {
                if !self.plan.locked_dimensions.contains(dimension) {
                    self.plan.locked_dimensions.push(*dimension);
                }
            }
            self.plan.locked_dimensions.sort_unstable();
        }
        self.plan.human_actions.push(action.clone());
    }

    /// Evaluate the round that just finished and commit its budget.
    pub fn decide(&mut self, critique: &CritiqueOutput, n_candidates: u32) -> Decision {
        let round = self.plan.current_round + 1;
        let round_cost = self.config.round_cost(n_candidates);

        // Improvement compares against history from before this round.
        let previous_top = self.plan.previous_top_total();

        self.plan.current_round = round;
        self.plan.budget.record_round(round_cost, n_candidates);
        if let Some(top) = critique.top_score() {
            self.plan.top_totals.push(top.weighted_total);
            let confidences: BTreeMap<String, f64> = top
                .dimension_scores
                .iter()
                .map(|s| (s.dimension_id.id().to_string(), round4(s.score)))
                .collect();
            self.plan.confidence_history.push(confidences);
        }

        let decision = self.evaluate(critique, previous_top, round, n_candidates);
        if decision.action == DecisionAction::Downgrade {
            self.plan.downgraded = true;
        }
        info!(
            task_id = %self.plan.task_id,
            round,
            action = ?decision.action,
            reason = %decision.reason,
            total_cost = self.plan.budget.total_cost,
            "round decided"
        );
        self.plan.decisions.push(decision.clone());
        decision
    }

    /// Re-interpret a pending decision under a human submission. Returns
    /// the decision that actually governs the round.
    pub fn override_decision(&mut self, pending: Decision, action: &HumanAction) -> Decision {
        self.apply_human_action(action);
        let rounds_exhausted = self.plan.budget.rounds_used >= self.config.max_rounds;

        let overridden = match action.action {
            HumanActionKind::Approve | HumanActionKind::LockDimensions => pending,
            HumanActionKind::ForceAccept => Decision {
                action: DecisionAction::Accept,
                reason: "human force-accepted".to_string(),
                best_candidate_id: action
                    .candidate_id
                    .clone()
                    .or(pending.best_candidate_id),
                ..pending
            },
            HumanActionKind::Reject => {
                if rounds_exhausted {
                    Decision {
                        action: DecisionAction::Stop,
                        reason: "human rejected; round budget exhausted".to_string(),
                        best_candidate_id: None,
                        ..pending
                    }
                } else {
                    Decision {
                        action: DecisionAction::RerunGlobal,
                        reason: "human rejected the pending result".to_string(),
                        best_candidate_id: None,
                        ..pending
                    }
                }
            }
            HumanActionKind::Rerun => {
                if rounds_exhausted {
                    Decision {
                        action: DecisionAction::Stop,
                        reason: "human requested rerun; round budget exhausted".to_string(),
                        ..pending
                    }
                } else if action.rerun_dimensions.is_empty() {
                    Decision {
                        action: DecisionAction::Rerun,
                        reason: "human requested rerun".to_string(),
                        ..pending
                    }
                } else {
                    Decision {
                        action: DecisionAction::RerunLocal,
                        reason: format!(
                            "human requested rerun on {}",
                            action
                                .rerun_dimensions
                                .iter()
                                .map(ToString::to_string)
                                .collect::<Vec<_>>()
                                .join(", ")
                        ),
                        ..pending
                    }
                }
            }
        };

        let governed = Decision {
            preserve_dimensions: self.plan.locked_dimensions.clone(),
            ..overridden
        };
        if let Some(last) = self.plan.decisions.last_mut() {
            *last = governed.clone();
        }
        governed
    }

    fn evaluate(
        &self,
        critique: &CritiqueOutput,
        previous_top: Option<f64>,
        round: u32,
        n_candidates: u32,
    ) -> Decision {
        let budget = &self.plan.budget;
        let preserve = self.plan.locked_dimensions.clone();
        let decision = |action: DecisionAction, reason: String| Decision {
            action,
            round,
            reason,
            best_candidate_id: critique.best_candidate_id.clone(),
            preserve_dimensions: preserve.clone(),
        };

        if budget.rounds_used >= self.config.max_rounds {
            return decision(
                DecisionAction::Stop,
                format!("round budget exhausted ({} rounds)", budget.rounds_used),
            );
        }
        if budget.total_cost >= self.config.max_cost_usd {
            return decision(
                DecisionAction::Stop,
                format!("cost budget exhausted (${:.4})", budget.total_cost),
            );
        }

        if let Some(best) = critique.best_score() {
            if best.weighted_total >= self.config.early_stop_threshold {
                return decision(
                    DecisionAction::Accept,
                    format!(
                        "weighted total {:.4} met early-stop threshold {:.2}",
                        best.weighted_total, self.config.early_stop_threshold
                    ),
                );
            }
            if best.weighted_total >= self.config.accept_threshold {
                return decision(
                    DecisionAction::Accept,
                    format!(
                        "weighted total {:.4} met accept threshold {:.2}",
                        best.weighted_total, self.config.accept_threshold
                    ),
                );
            }
        }

        // Another round is assumed to cost what this one did.
        let projected = budget.projected_cost(self.config.round_cost(n_candidates));
        if projected >= self.config.downgrade_at_cost_pct * self.config.max_cost_usd {
            return decision(
                DecisionAction::Downgrade,
                format!(
                    "projected cost ${projected:.4} crosses {:.0}% of budget",
                    self.config.downgrade_at_cost_pct * 100.0
                ),
            );
        }

        let Some(top) = critique.top_score() else {
            return decision(
                DecisionAction::RerunGlobal,
                "no candidates scored this round".to_string(),
            );
        };

        if round > 1 {
            let improvement = top.weighted_total - previous_top.unwrap_or(0.0);
            if improvement < self.config.min_improvement {
                return decision(
                    DecisionAction::Stop,
                    format!(
                        "improvement {improvement:.4} below minimum {:.4}",
                        self.config.min_improvement
                    ),
                );
            }
        }

        let narrow = !critique.rerun_hint.is_empty()
            && critique.rerun_hint.len() <= NARROW_HINT_MAX;
        let targeted = match critique.fixit_plan.as_ref().map(|p| p.overall_strategy) {
            Some(FixItStrategy::TargetedRepair) => true,
            Some(FixItStrategy::FullRegenerate) => false,
            None => narrow,
        };
        if targeted {
            decision(
                DecisionAction::RerunLocal,
                "narrow failure; targeted repair next round".to_string(),
            )
        } else {
            decision(
                DecisionAction::RerunGlobal,
                "broad failure; full regeneration next round".to_string(),
            )
        }
    }
}
