//! Human-in-the-loop submissions.

use serde::{Deserialize, Serialize};

use super::score::Dimension;

/// What the human asked the pipeline to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HumanActionKind {
    /// Accept the pending decision as-is.
    Approve,
    /// Reject the pending decision; the run continues with a global rerun.
    Reject,
    /// Force another round, optionally scoped to `rerun_dimensions`.
    Rerun,
    /// Lock `locked_dimensions` so later rounds preserve their contribution.
    LockDimensions,
    /// Accept immediately, optionally naming the winning `candidate_id`.
    ForceAccept,
}

/// A submission delivered to a running pipeline.
///
/// Deliverable at any time after the run starts; each delivered action
/// unblocks at most one pending wait.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HumanAction {
    pub action: HumanActionKind,
    #[serde(default)]
    pub locked_dimensions: Vec<Dimension>,
    #[serde(default)]
    pub rerun_dimensions: Vec<Dimension>,
    #[serde(default)]
    pub candidate_id: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
}

impl HumanAction {
    pub fn approve() -> Self {
        Self::of_kind(HumanActionKind::Approve)
    }

    pub fn reject(reason: impl Into<String>) -> Self {
        Self {
            reason: Some(reason.into()),
            ..Self::of_kind(HumanActionKind::Reject)
        }
    }

    pub fn force_accept(candidate_id: Option<String>) -> Self {
        Self {
            candidate_id,
            ..Self::of_kind(HumanActionKind::ForceAccept)
        }
    }

    pub fn lock(dimensions: Vec<Dimension>) -> Self {
        Self {
            locked_dimensions: dimensions,
            ..Self::of_kind(HumanActionKind::LockDimensions)
        }
    }

    pub fn rerun(dimensions: Vec<Dimension>) -> Self {
        Self {
            rerun_dimensions: dimensions,
            ..Self::of_kind(HumanActionKind::Rerun)
        }
    }

    fn of_kind(action: HumanActionKind) -> Self {
        Self {
            action,
            locked_dimensions: vec![],
            rerun_dimensions: vec![],
            candidate_id: None,
            reason: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_kind_snake_case() {
        assert_eq!(
            serde_json::to_string(&HumanActionKind::ForceAccept).unwrap(),
            "\"force_accept\""
        );
        assert_eq!(
            serde_json::to_string(&HumanActionKind::LockDimensions).unwrap(),
            "\"lock_dimensions\""
        );
    }

    #[test]
    fn test_action_deserializes_with_defaults() {
        let action: HumanAction = serde_json::from_str(r#"{"action":"approve"}"#).unwrap();
        assert_eq!(action.action, HumanActionKind::Approve);
        assert!(action.locked_dimensions.is_empty());
        assert!(action.candidate_id.is_none());
    }
}
