//! Run state machine and top-level orchestrator.
//!
//! Sequences one task's rounds — evidence, draft, critique, decision —
//! checkpointing every stage transition, emitting a typed event stream,
//! and suspending for human input when configured. Stages within a task
//! run strictly sequentially; concurrency exists only across tasks, which
//! share nothing but the checkpoint store and runs index.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use serde::Serialize;
use tokio::sync::{mpsc, RwLock};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::domain::errors::DomainResult;
use crate::domain::models::candidate::Candidate;
use crate::domain::models::critique::{CritiqueInput, CritiqueOutput};
use crate::domain::models::draft::{DraftConfig, DraftInput};
use crate::domain::models::evidence::EvidencePack;
use crate::domain::models::fixit::FixItPlan;
use crate::domain::models::hitl::HumanAction;
use crate::domain::models::plan::{Decision, DecisionAction};
use crate::domain::models::run::{
    PipelineEvent, PipelineOutput, RunStatus, RunStatusReport, RunSummary, StageResult,
};
use crate::domain::models::score::{Dimension, RiskSeverity};
use crate::domain::models::{PipelineConfig, Task};
use crate::domain::ports::{Archiver, CheckpointStore, Scout, TrajectoryStore};

use super::critic::{CriticStage, CritiqueContext};
use super::decision::DecisionEngine;
use super::draft::DraftStage;
use super::hitl::HumanMailbox;
use super::trajectory::TrajectoryRecorder;
use super::weighting::{CrossLayerSignal, CrossLayerSignalKind, WeightingEngine};

pub const STAGE_SCOUT: &str = "scout";
pub const STAGE_DRAFT: &str = "draft";
pub const STAGE_DECISION: &str = "decision";
pub const STAGE_ARCHIVE: &str = "archive";

type EventSink = Option<mpsc::UnboundedSender<PipelineEvent>>;

/// Top-level coordinator for pipeline runs.
pub struct Orchestrator {
    config: PipelineConfig,
    scout: Arc<dyn Scout>,
    draft: DraftStage,
    critic: CriticStage,
    checkpoints: Arc<dyn CheckpointStore>,
    trajectories: Option<Arc<dyn TrajectoryStore>>,
    archiver: Option<Arc<dyn Archiver>>,
    mailboxes: RwLock<HashMap<String, Arc<HumanMailbox>>>,
}

impl Orchestrator {
    pub fn new(
        config: PipelineConfig,
        scout: Arc<dyn Scout>,
        draft: DraftStage,
        critic: CriticStage,
        checkpoints: Arc<dyn CheckpointStore>,
    ) -> Self {
        Self {
            config,
            scout,
            draft,
            critic,
            checkpoints,
            trajectories: None,
            archiver: None,
            mailboxes: RwLock::new(HashMap::new()),
        }
    }

    pub fn with_trajectory_store(mut self, store: Arc<dyn TrajectoryStore>) -> Self {
        self.trajectories = Some(store);
        self
    }

    pub fn with_archiver(mut self, archiver: Arc<dyn Archiver>) -> Self {
        self.archiver = Some(archiver);
        self
    }

    /// Synchronous mode: run to a terminal state and return the complete
    /// output.
    pub async fn run(&self, task: Task) -> PipelineOutput {
        self.execute(task, None).await
    }

    /// Streaming mode: events arrive on the returned receiver while the
    /// run executes on a spawned task. Identical inputs produce the same
    /// final decision and round count as [`Self::run`].
    pub fn run_streaming(
        self: &Arc<Self>,
        task: Task,
    ) -> (
        mpsc::UnboundedReceiver<PipelineEvent>,
        JoinHandle<PipelineOutput>,
    ) {
        let (tx, rx) = mpsc::unbounded_channel();
        let this = Arc::clone(self);
        let handle = tokio::spawn(async move { this.execute(task, Some(tx)).await });
        (rx, handle)
    }

    /// Deliver a human action to a run. Deliverable at any time once the
    /// task id is known; an action arriving before the run's first wait is
    /// held until then.
    pub async fn submit_human_action(&self, task_id: &str, action: HumanAction) {
        let mailbox = self.mailbox_for(task_id).await;
        mailbox.deliver(action).await;
    }

    /// The status surface for external front-ends.
    pub async fn run_status(&self, task_id: &str) -> DomainResult<Option<RunStatusReport>> {
        let index = self.checkpoints.load_index().await?;
        let Some(summary) = index.get(task_id) else {
            return Ok(None);
        };
        let report = match self.checkpoints.load_output(task_id).await? {
            Some(output) => RunStatusReport::from_output(&output, summary.status),
            None => RunStatusReport {
                task_id: task_id.to_string(),
                status: summary.status,
                current_stage: None,
                current_round: 0,
                final_decision: summary.decision,
                best_candidate_id: None,
                total_rounds: 0,
                total_latency_ms: summary.latency_ms,
                total_cost: summary.cost,
                success: false,
                error: None,
                stages: vec![],
            },
        };
        Ok(Some(report))
    }

    // -------------------------------------------------------------------
    // Core execution
    // -------------------------------------------------------------------

    async fn execute(&self, task: Task, sink: EventSink) -> PipelineOutput {
        let start = Instant::now();
        let mailbox = self.mailbox_for(&task.task_id).await;
        let mut status = RunStatus::Pending;
        let mut stages: Vec<StageResult> = Vec::new();

        self.transition(&mut status, RunStatus::Running, &task.task_id);
        self.update_index(&task.task_id, status, None, 0.0, 0).await;
        info!(task_id = %task.task_id, subject = %task.subject, tradition = %task.cultural_tradition, "run started");

        let mut engine = DecisionEngine::new(self.config.decision.clone(), &task.task_id);
        let mut recorder = TrajectoryRecorder::new(&task, self.trajectories.clone());

        // Evidence lookup.
        emit(
            &sink,
            PipelineEvent::StageStarted {
                stage: STAGE_SCOUT.to_string(),
                round: 0,
                elapsed_ms: elapsed_ms(start),
            },
        );
        let stage_start = Instant::now();
        let evidence = match self
            .scout
            .gather(&task.subject, &task.cultural_tradition)
            .await
        {
            Ok(evidence) => evidence,
            Err(err) => {
                stages.push(StageResult {
                    stage: STAGE_SCOUT.to_string(),
                    round: 0,
                    success: false,
                    latency_ms: elapsed_ms(stage_start),
                    error: Some(err.to_string()),
                });
                emit(
                    &sink,
                    PipelineEvent::StageCompleted {
                        stage: STAGE_SCOUT.to_string(),
                        round: 0,
                        elapsed_ms: elapsed_ms(start),
                        success: false,
                    },
                );
                return self
                    .fail(
                        &task,
                        &mut status,
                        stages,
                        start,
                        &sink,
                        format!("evidence lookup failed: {err}"),
                        &engine,
                    )
                    .await;
            }
        };
        self.checkpoint(&task.task_id, STAGE_SCOUT, &evidence).await;
        stages.push(StageResult {
            stage: STAGE_SCOUT.to_string(),
            round: 0,
            success: true,
            latency_ms: elapsed_ms(stage_start),
            error: None,
        });
        emit(
            &sink,
            PipelineEvent::StageCompleted {
                stage: STAGE_SCOUT.to_string(),
                round: 0,
                elapsed_ms: elapsed_ms(start),
                success: true,
            },
        );
        recorder.observe_evidence(&evidence);

        let mut draft_config: DraftConfig = self.config.draft.sanitized();
        let mut fixit: Option<FixItPlan> = None;
        let mut prev_critique: Option<CritiqueOutput> = None;
        let mut all_candidates: HashMap<String, Candidate> = HashMap::new();
        let mut best_so_far: Option<(String, f64)> = None;
        let mut round: u32 = 1;

        let final_decision = loop {
            // ---- draft ------------------------------------------------
            emit(
                &sink,
                PipelineEvent::StageStarted {
                    stage: STAGE_DRAFT.to_string(),
                    round,
                    elapsed_ms: elapsed_ms(start),
                },
            );
            let draft_input = DraftInput {
                task_id: task.task_id.clone(),
                subject: task.subject.clone(),
                tradition: task.cultural_tradition.clone(),
                round,
                evidence: evidence.clone(),
                config: draft_config.clone(),
                fixit: fixit.take(),
            };
            let draft_output = self.draft.generate(&draft_input).await;
            self.checkpoint(&task.task_id, STAGE_DRAFT, &draft_output)
                .await;
            stages.push(StageResult {
                stage: STAGE_DRAFT.to_string(),
                round,
                success: draft_output.success,
                latency_ms: draft_output.latency_ms,
                error: draft_output.error.clone(),
            });
            emit(
                &sink,
                PipelineEvent::StageCompleted {
                    stage: STAGE_DRAFT.to_string(),
                    round,
                    elapsed_ms: elapsed_ms(start),
                    success: draft_output.success,
                },
            );
            if !draft_output.success {
                let error = draft_output
                    .error
                    .unwrap_or_else(|| "generation failed".to_string());
                return self
                    .fail(&task, &mut status, stages, start, &sink, error, &engine)
                    .await;
            }
            for candidate in &draft_output.candidates {
                all_candidates.insert(candidate.candidate_id.clone(), candidate.clone());
            }

            // ---- critique ---------------------------------------------
            emit(
                &sink,
                PipelineEvent::StageStarted {
                    stage: super::critic::CRITIQUE_STAGE.to_string(),
                    round,
                    elapsed_ms: elapsed_ms(start),
                },
            );
            let ctx = CritiqueContext {
                confidences: WeightingEngine::confidences_from_map(
                    engine.plan().previous_confidences(),
                ),
                signals: derive_signals(&evidence, prev_critique.as_ref()),
            };
            let critique_input = CritiqueInput {
                task_id: task.task_id.clone(),
                subject: task.subject.clone(),
                tradition: task.cultural_tradition.clone(),
                round,
                evidence: evidence.clone(),
                candidates: draft_output.candidates.clone(),
            };
            let critique_output = self.critic.run(&critique_input, &ctx).await;
            stages.push(StageResult {
                stage: super::critic::CRITIQUE_STAGE.to_string(),
                round,
                success: critique_output.success,
                latency_ms: critique_output.latency_ms,
                error: None,
            });
            emit(
                &sink,
                PipelineEvent::StageCompleted {
                    stage: super::critic::CRITIQUE_STAGE.to_string(),
                    round,
                    elapsed_ms: elapsed_ms(start),
                    success: critique_output.success,
                },
            );
            if let Some(best) = critique_output.best_score() {
                let better = best_so_far
                    .as_ref()
                    .is_none_or(|(_, total)| best.weighted_total > *total);
                if better {
                    best_so_far = Some((best.candidate_id.clone(), best.weighted_total));
                }
            }

            // ---- decision ---------------------------------------------
            emit(
                &sink,
                PipelineEvent::StageStarted {
                    stage: STAGE_DECISION.to_string(),
                    round,
                    elapsed_ms: elapsed_ms(start),
                },
            );
            let decision_start = Instant::now();
            let mut decision = engine.decide(&critique_output, draft_config.n_candidates);

            if self.config.hitl.enabled
                && (decision.action.is_terminal() || critique_output.best_candidate_id.is_none())
            {
                decision = self
                    .await_human(
                        &task,
                        &mut status,
                        &mailbox,
                        &mut engine,
                        decision,
                        round,
                        start,
                        &sink,
                    )
                    .await;
            }

            self.checkpoint(&task.task_id, STAGE_DECISION, &decision)
                .await;
            stages.push(StageResult {
                stage: STAGE_DECISION.to_string(),
                round,
                success: true,
                latency_ms: elapsed_ms(decision_start),
                error: None,
            });
            emit(
                &sink,
                PipelineEvent::StageCompleted {
                    stage: STAGE_DECISION.to_string(),
                    round,
                    elapsed_ms: elapsed_ms(start),
                    success: true,
                },
            );
            emit(
                &sink,
                PipelineEvent::DecisionMade {
                    round,
                    action: decision.action,
                    reason: decision.reason.clone(),
                    elapsed_ms: elapsed_ms(start),
                },
            );
            recorder.observe_round(round, &draft_output, &critique_output, &decision);

            match decision.action {
                DecisionAction::Accept | DecisionAction::Stop => break decision,
                DecisionAction::Downgrade => {
                    draft_config = draft_config.downgraded();
                    fixit = None;
                }
                DecisionAction::RerunLocal => {
                    fixit = critique_output.fixit_plan.clone();
                }
                DecisionAction::RerunGlobal | DecisionAction::Rerun => {
                    fixit = None;
                }
            }
            prev_critique = Some(critique_output);
            round += 1;
        };

        // ---- finalize -------------------------------------------------
        let best_candidate_id = final_decision
            .best_candidate_id
            .clone()
            .or_else(|| best_so_far.as_ref().map(|(id, _)| id.clone()));
        let best_candidate = best_candidate_id
            .as_ref()
            .and_then(|id| all_candidates.get(id).cloned());

        let output = PipelineOutput {
            task_id: task.task_id.clone(),
            success: true,
            final_decision: Some(final_decision.action),
            best_candidate_id,
            best_candidate,
            total_rounds: engine.plan().budget.rounds_used,
            total_latency_ms: elapsed_ms(start),
            total_cost: engine.plan().budget.total_cost,
            stages,
            error: None,
            completed_at: Utc::now(),
        };
        if let Err(err) = self.checkpoints.save_output(&task.task_id, &output).await {
            warn!(task_id = %task.task_id, %err, "failed to persist terminal output");
        }

        let trajectory = recorder.finalize(&output).await;
        if self.config.archive_on_completion {
            if let Some(archiver) = &self.archiver {
                emit(
                    &sink,
                    PipelineEvent::StageStarted {
                        stage: STAGE_ARCHIVE.to_string(),
                        round,
                        elapsed_ms: elapsed_ms(start),
                    },
                );
                let archived = match archiver.archive(&trajectory).await {
                    Ok(manifest) => {
                        self.checkpoint(&task.task_id, STAGE_ARCHIVE, &manifest).await;
                        true
                    }
                    Err(err) => {
                        warn!(task_id = %task.task_id, %err, "archival failed");
                        false
                    }
                };
                emit(
                    &sink,
                    PipelineEvent::StageCompleted {
                        stage: STAGE_ARCHIVE.to_string(),
                        round,
                        elapsed_ms: elapsed_ms(start),
                        success: archived,
                    },
                );
            }
        }

        self.transition(&mut status, RunStatus::Completed, &task.task_id);
        self.update_index(
            &task.task_id,
            status,
            output.final_decision,
            output.total_cost,
            output.total_latency_ms,
        )
        .await;
        emit(
            &sink,
            PipelineEvent::PipelineCompleted {
                final_decision: final_decision.action,
                total_rounds: output.total_rounds,
                elapsed_ms: elapsed_ms(start),
            },
        );
        self.mailboxes.write().await.remove(&task.task_id);
        info!(
            task_id = %task.task_id,
            decision = ?final_decision.action,
            rounds = output.total_rounds,
            cost = output.total_cost,
            "run completed"
        );
        output
    }

    /// Suspend for human input, bounded by the configured timeout.
    #[allow(clippy::too_many_arguments)]
    async fn await_human(
        &self,
        task: &Task,
        status: &mut RunStatus,
        mailbox: &Arc<HumanMailbox>,
        engine: &mut DecisionEngine,
        pending: Decision,
        round: u32,
        start: Instant,
        sink: &EventSink,
    ) -> Decision {
        self.transition(status, RunStatus::WaitingHuman, &task.task_id);
        self.update_index(
            &task.task_id,
            *status,
            None,
            engine.plan().budget.total_cost,
            elapsed_ms(start),
        )
        .await;
        emit(
            sink,
            PipelineEvent::HumanRequired {
                round,
                elapsed_ms: elapsed_ms(start),
            },
        );

        let action = mailbox
            .wait(Duration::from_secs(self.config.hitl.wait_timeout_secs))
            .await;
        emit(
            sink,
            PipelineEvent::HumanReceived {
                round,
                action: action.as_ref().map(|a| a.action),
                elapsed_ms: elapsed_ms(start),
            },
        );
        self.transition(status, RunStatus::Running, &task.task_id);

        match action {
            Some(action) => engine.override_decision(pending, &action),
            // Timeout is "no human input": the pending decision stands.
            None => pending,
        }
    }

    async fn fail(
        &self,
        task: &Task,
        status: &mut RunStatus,
        stages: Vec<StageResult>,
        start: Instant,
        sink: &EventSink,
        error: String,
        engine: &DecisionEngine,
    ) -> PipelineOutput {
        let output = PipelineOutput {
            task_id: task.task_id.clone(),
            success: false,
            final_decision: None,
            best_candidate_id: None,
            best_candidate: None,
            total_rounds: engine.plan().budget.rounds_used,
            total_latency_ms: elapsed_ms(start),
            total_cost: engine.plan().budget.total_cost,
            stages,
            error: Some(error.clone()),
            completed_at: Utc::now(),
        };
        if let Err(err) = self.checkpoints.save_output(&task.task_id, &output).await {
            warn!(task_id = %task.task_id, %err, "failed to persist failure output");
        }
        self.transition(status, RunStatus::Failed, &task.task_id);
        self.update_index(
            &task.task_id,
            *status,
            None,
            output.total_cost,
            output.total_latency_ms,
        )
        .await;
        emit(
            sink,
            PipelineEvent::PipelineFailed {
                error,
                elapsed_ms: elapsed_ms(start),
            },
        );
        self.mailboxes.write().await.remove(&task.task_id);
        output
    }

    fn transition(&self, status: &mut RunStatus, next: RunStatus, task_id: &str) {
        if status.can_transition(next) {
            *status = next;
        } else {
            // Unreachable with the fixed stage sequence; logged for audit.
            warn!(%task_id, from = ?status, to = ?next, "illegal run-state transition suppressed");
        }
    }

    async fn update_index(
        &self,
        task_id: &str,
        status: RunStatus,
        decision: Option<DecisionAction>,
        cost: f64,
        latency_ms: u64,
    ) {
        let entry = RunSummary {
            task_id: task_id.to_string(),
            status,
            decision,
            cost,
            latency_ms,
            updated_at: Utc::now(),
        };
        if let Err(err) = self.checkpoints.update_index(task_id, &entry).await {
            warn!(%task_id, %err, "failed to update runs index");
        }
    }

    /// Persistence failures degrade resumability but never fail the run.
    async fn checkpoint<T: Serialize>(&self, task_id: &str, stage: &str, data: &T) {
        match serde_json::to_value(data) {
            Ok(value) => {
                if let Err(err) = self.checkpoints.save(task_id, stage, &value).await {
                    warn!(%task_id, stage, %err, "failed to write checkpoint");
                }
            }
            Err(err) => warn!(%task_id, stage, %err, "failed to serialize checkpoint"),
        }
    }

    async fn mailbox_for(&self, task_id: &str) -> Arc<HumanMailbox> {
        let mut mailboxes = self.mailboxes.write().await;
        Arc::clone(
            mailboxes
                .entry(task_id.to_string())
                .or_insert_with(|| Arc::new(HumanMailbox::new())),
        )
    }
}

fn emit(sink: &EventSink, event: PipelineEvent) {
    if let Some(tx) = sink {
        // A dropped receiver means the caller stopped listening; the run
        // continues and checkpoints stay consistent.
        let _ = tx.send(event);
    }
}

fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}

/// Cross-layer signals for the next critique, derived from the evidence
/// base and the previous round.
fn derive_signals(
    evidence: &EvidencePack,
    prev: Option<&CritiqueOutput>,
) -> Vec<CrossLayerSignal> {
    let mut signals = Vec::new();
    if evidence.sample_matches.is_empty() {
        signals.push(CrossLayerSignal {
            kind: CrossLayerSignalKind::EvidenceGap,
            dimension: Dimension::CriticalInterpretation,
        });
    }
    if evidence.terminology_hits.is_empty() {
        signals.push(CrossLayerSignal {
            kind: CrossLayerSignalKind::EvidenceGap,
            dimension: Dimension::CulturalContext,
        });
    }
    if let Some(prev) = prev {
        let risky = prev.scored_candidates.iter().any(|s| {
            s.risk_tags
                .iter()
                .any(|t| t.severity >= RiskSeverity::High)
        });
        if risky {
            signals.push(CrossLayerSignal {
                kind: CrossLayerSignalKind::Conflict,
                dimension: Dimension::CulturalContext,
            });
        }
        for dimension in &prev.rerun_hint {
            if matches!(
                dimension,
                Dimension::CriticalInterpretation | Dimension::Aesthetic
            ) {
                signals.push(CrossLayerSignal {
                    kind: CrossLayerSignalKind::Reinterpret,
                    dimension: *dimension,
                });
            }
        }
    }
    signals
}
