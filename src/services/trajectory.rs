//! Trajectory recording: observes stage transitions, persists on
//! completion.

use std::sync::Arc;

use chrono::Utc;
use tracing::warn;

use crate::domain::models::critique::CritiqueOutput;
use crate::domain::models::draft::DraftOutput;
use crate::domain::models::evidence::EvidencePack;
use crate::domain::models::plan::Decision;
use crate::domain::models::run::PipelineOutput;
use crate::domain::models::trajectory::{RoundRecord, RunTrajectory};
use crate::domain::models::Task;
use crate::domain::ports::TrajectoryStore;

/// Accumulates one run's history and writes it once the run terminates.
///
/// Recording failures degrade to warnings; they never fail the run.
pub struct TrajectoryRecorder {
    trajectory: RunTrajectory,
    store: Option<Arc<dyn TrajectoryStore>>,
}

impl TrajectoryRecorder {
    pub fn new(task: &Task, store: Option<Arc<dyn TrajectoryStore>>) -> Self {
        Self {
            trajectory: RunTrajectory {
                task_id: task.task_id.clone(),
                subject: task.subject.clone(),
                tradition: task.cultural_tradition.clone(),
                evidence: EvidencePack::default(),
                rounds: Vec::new(),
                output: None,
                recorded_at: Utc::now(),
            },
            store,
        }
    }

    pub fn observe_evidence(&mut self, evidence: &EvidencePack) {
        self.trajectory.evidence = evidence.clone();
    }

    pub fn observe_round(
        &mut self,
        round: u32,
        draft: &DraftOutput,
        critique: &CritiqueOutput,
        decision: &Decision,
    ) {
        self.trajectory.rounds.push(RoundRecord {
            round,
            draft: draft.clone(),
            critique: critique.clone(),
            decision: decision.clone(),
        });
    }

    /// Stamp the terminal output and persist the whole history.
    pub async fn finalize(mut self, output: &PipelineOutput) -> RunTrajectory {
        self.trajectory.output = Some(output.clone());
        self.trajectory.recorded_at = Utc::now();
        if let Some(store) = &self.store {
            if let Err(err) = store.record(&self.trajectory).await {
                warn!(task_id = %self.trajectory.task_id, %err, "failed to record trajectory");
            }
        }
        self.trajectory
    }
}
