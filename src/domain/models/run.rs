//! Run lifecycle: status, stage results, the event stream, and outputs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::candidate::Candidate;
use super::hitl::HumanActionKind;
use super::plan::DecisionAction;

/// Orchestration-level lifecycle state.
///
/// Transitions are strictly monotonic except `Running ⇄ WaitingHuman`;
/// `Completed` and `Failed` are sink states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStatus {
    Pending,
    Running,
    WaitingHuman,
    Completed,
    Failed,
}

impl RunStatus {
    /// Whether a transition to `next` is legal from this state.
    pub fn can_transition(self, next: RunStatus) -> bool {
        use RunStatus::{Completed, Failed, Pending, Running, WaitingHuman};
        matches!(
            (self, next),
            (Pending, Running)
                | (Running, WaitingHuman)
                | (WaitingHuman, Running)
                | (Running | WaitingHuman, Completed | Failed)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, RunStatus::Completed | RunStatus::Failed)
    }
}

/// Result of one stage execution within a round.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageResult {
    pub stage: String,
    pub round: u32,
    pub success: bool,
    pub latency_ms: u64,
    #[serde(default)]
    pub error: Option<String>,
}

/// One entry in the ordered event stream a streaming run emits.
///
/// `elapsed_ms` is measured from pipeline start on a monotonic clock, so
/// event timestamps never decrease within a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PipelineEvent {
    StageStarted {
        stage: String,
        round: u32,
        elapsed_ms: u64,
    },
    StageCompleted {
        stage: String,
        round: u32,
        elapsed_ms: u64,
        success: bool,
    },
    DecisionMade {
        round: u32,
        action: DecisionAction,
        reason: String,
        elapsed_ms: u64,
    },
    HumanRequired {
        round: u32,
        elapsed_ms: u64,
    },
    HumanReceived {
        round: u32,
        /// `None` when the wait timed out with no submission.
        action: Option<HumanActionKind>,
        elapsed_ms: u64,
    },
    PipelineCompleted {
        final_decision: DecisionAction,
        total_rounds: u32,
        elapsed_ms: u64,
    },
    PipelineFailed {
        error: String,
        elapsed_ms: u64,
    },
}

impl PipelineEvent {
    pub fn elapsed_ms(&self) -> u64 {
        match self {
            PipelineEvent::StageStarted { elapsed_ms, .. }
            | PipelineEvent::StageCompleted { elapsed_ms, .. }
            | PipelineEvent::DecisionMade { elapsed_ms, .. }
            | PipelineEvent::HumanRequired { elapsed_ms, .. }
            | PipelineEvent::HumanReceived { elapsed_ms, .. }
            | PipelineEvent::PipelineCompleted { elapsed_ms, .. }
            | PipelineEvent::PipelineFailed { elapsed_ms, .. } => *elapsed_ms,
        }
    }
}

/// The terminal checkpoint of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineOutput {
    pub task_id: String,
    pub success: bool,
    pub final_decision: Option<DecisionAction>,
    pub best_candidate_id: Option<String>,
    pub best_candidate: Option<Candidate>,
    pub total_rounds: u32,
    pub total_latency_ms: u64,
    pub total_cost: f64,
    pub stages: Vec<StageResult>,
    #[serde(default)]
    pub error: Option<String>,
    pub completed_at: DateTime<Utc>,
}

/// One row of the runs index: enough for a fast listing without loading
/// the full output document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub task_id: String,
    pub status: RunStatus,
    pub decision: Option<DecisionAction>,
    pub cost: f64,
    pub latency_ms: u64,
    pub updated_at: DateTime<Utc>,
}

/// The run status surface consumed by external front-ends.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunStatusReport {
    pub task_id: String,
    pub status: RunStatus,
    pub current_stage: Option<String>,
    pub current_round: u32,
    pub final_decision: Option<DecisionAction>,
    pub best_candidate_id: Option<String>,
    pub total_rounds: u32,
    pub total_latency_ms: u64,
    pub total_cost: f64,
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
    pub stages: Vec<StageResult>,
}

impl RunStatusReport {
    /// Assemble the report from a terminal output document.
    pub fn from_output(output: &PipelineOutput, status: RunStatus) -> Self {
        Self {
            task_id: output.task_id.clone(),
            status,
            current_stage: output.stages.last().map(|s| s.stage.clone()),
            current_round: output.total_rounds,
            final_decision: output.final_decision,
            best_candidate_id: output.best_candidate_id.clone(),
            total_rounds: output.total_rounds,
            total_latency_ms: output.total_latency_ms,
            total_cost: output.total_cost,
            success: output.success,
            error: output.error.clone(),
            stages: output.stages.clone(),
        }
    }
}
