//! Decisions and the per-task plan state the decision engine owns.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::budget::BudgetState;
use super::hitl::HumanAction;
use super::score::Dimension;

/// The action the decision engine chose for a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionAction {
    /// Terminal: a winner was selected.
    Accept,
    /// Human-initiated rerun without a locality judgment.
    Rerun,
    /// Rerun with targeted repair on specific dimensions.
    RerunLocal,
    /// Rerun with full regeneration.
    RerunGlobal,
    /// Continue under a reduced generation profile.
    Downgrade,
    /// Terminal: stop without further rounds.
    Stop,
}

impl DecisionAction {
    /// Whether this action ends the run.
    pub fn is_terminal(self) -> bool {
        matches!(self, DecisionAction::Accept | DecisionAction::Stop)
    }
}

/// One round's decision, with enough context to audit it later.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Decision {
    pub action: DecisionAction,
    pub round: u32,
    pub reason: String,
    pub best_candidate_id: Option<String>,
    /// Dimensions a human has locked; reruns preserve (do not regenerate)
    /// their prior contribution.
    pub preserve_dimensions: Vec<Dimension>,
}

/// Per-task mutable aggregate owned exclusively by the decision engine.
///
/// Everything the engine needs to judge progress across rounds: the budget,
/// the per-round confidence history (the best candidate's dimension scores),
/// prior decisions, and any human overrides.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanState {
    pub task_id: String,
    pub current_round: u32,
    /// One entry per scored round: wire dimension id → best score.
    pub confidence_history: Vec<BTreeMap<String, f64>>,
    /// One entry per scored round: the top candidate's weighted total.
    pub top_totals: Vec<f64>,
    pub budget: BudgetState,
    pub decisions: Vec<Decision>,
    pub locked_dimensions: Vec<Dimension>,
    pub human_actions: Vec<HumanAction>,
    /// Whether a downgrade decision has reduced the generation profile.
    pub downgraded: bool,
}

impl PlanState {
    pub fn new(task_id: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            current_round: 0,
            confidence_history: Vec::new(),
            top_totals: Vec::new(),
            budget: BudgetState::default(),
            decisions: Vec::new(),
            locked_dimensions: Vec::new(),
            human_actions: Vec::new(),
            downgraded: false,
        }
    }

    /// The top weighted total recorded for the previous scored round
    /// (winner or not).
    pub fn previous_top_total(&self) -> Option<f64> {
        self.top_totals.last().copied()
    }

    /// The previous round's per-dimension confidences, if a round has been
    /// scored. Used to modulate the next round's weight vector.
    pub fn previous_confidences(&self) -> Option<&BTreeMap<String, f64>> {
        self.confidence_history.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decision_action_snake_case() {
        assert_eq!(
            serde_json::to_string(&DecisionAction::RerunLocal).unwrap(),
            "\"rerun_local\""
        );
        assert_eq!(
            serde_json::to_string(&DecisionAction::Stop).unwrap(),
            "\"stop\""
        );
    }

    #[test]
    fn test_terminal_actions() {
        assert!(DecisionAction::Accept.is_terminal());
        assert!(DecisionAction::Stop.is_terminal());
        assert!(!DecisionAction::RerunGlobal.is_terminal());
        assert!(!DecisionAction::Downgrade.is_terminal());
    }

    #[test]
    fn test_plan_state_starts_empty() {
        let plan = PlanState::new("t-1");
        assert_eq!(plan.current_round, 0);
        assert!(plan.confidence_history.is_empty());
        assert!(plan.decisions.is_empty());
        assert!(!plan.downgraded);
    }
}
