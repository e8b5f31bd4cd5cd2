//! Archival adapters: audit artifacts from a completed run.

use std::path::PathBuf;

use async_trait::async_trait;
use futures::future::try_join_all;
use serde_json::json;
use tracing::info;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{ArchiveManifest, RunTrajectory};
use crate::domain::ports::Archiver;

use super::checkpoint::sanitize_task_id;

/// Writes the three audit documents under `<root>/archives/<task>/`.
pub struct FsArchiver {
    root: PathBuf,
}

impl FsArchiver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl Archiver for FsArchiver {
    async fn archive(&self, trajectory: &RunTrajectory) -> DomainResult<ArchiveManifest> {
        let dir = self
            .root
            .join("archives")
            .join(sanitize_task_id(&trajectory.task_id));
        tokio::fs::create_dir_all(&dir).await?;

        // How the evidence informed each round.
        let evidence_chain = json!({
            "task_id": trajectory.task_id,
            "subject": trajectory.subject,
            "tradition": trajectory.tradition,
            "evidence": trajectory.evidence,
            "recorded_at": trajectory.recorded_at,
        });
        // Every critique and the decision it led to.
        let critique_card = json!({
            "task_id": trajectory.task_id,
            "rounds": trajectory
                .rounds
                .iter()
                .map(|r| json!({
                    "round": r.round,
                    "critique": r.critique,
                    "decision": r.decision,
                }))
                .collect::<Vec<_>>(),
            "output": trajectory.output,
        });
        // The exact generation parameters behind every candidate.
        let params_snapshot = json!({
            "task_id": trajectory.task_id,
            "rounds": trajectory
                .rounds
                .iter()
                .map(|r| json!({
                    "round": r.round,
                    "model_ref": r.draft.model_ref,
                    "candidates": r.draft.candidates.iter().map(|c| json!({
                        "candidate_id": c.candidate_id,
                        "generation_parameters": c.generation_parameters,
                        "provenance": c.provenance,
                        "artifact_location": c.artifact_location,
                    })).collect::<Vec<_>>(),
                }))
                .collect::<Vec<_>>(),
        });

        let documents = [
            ("evidence_chain.json", evidence_chain),
            ("critique_card.json", critique_card),
            ("params_snapshot.json", params_snapshot),
        ];
        let paths: Vec<String> = try_join_all(documents.iter().map(|(name, document)| {
            let path = dir.join(name);
            async move {
                tokio::fs::write(&path, serde_json::to_vec_pretty(document)?).await?;
                Ok::<_, DomainError>(path.display().to_string())
            }
        }))
        .await?;

        info!(task_id = %trajectory.task_id, dir = %dir.display(), "run archived");
        Ok(ArchiveManifest {
            evidence_chain: paths[0].clone(),
            critique_card: paths[1].clone(),
            params_snapshot: paths[2].clone(),
        })
    }
}

/// Archiver that records nothing; for tests and archive-less deployments.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopArchiver;

#[async_trait]
impl Archiver for NoopArchiver {
    async fn archive(&self, trajectory: &RunTrajectory) -> DomainResult<ArchiveManifest> {
        let key = sanitize_task_id(&trajectory.task_id);
        Ok(ArchiveManifest {
            evidence_chain: format!("noop://{key}/evidence_chain"),
            critique_card: format!("noop://{key}/critique_card"),
            params_snapshot: format!("noop://{key}/params_snapshot"),
        })
    }
}
