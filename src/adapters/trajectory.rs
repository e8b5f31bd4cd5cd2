//! Trajectory stores: one JSON document per completed run.

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::errors::DomainResult;
use crate::domain::models::RunTrajectory;
use crate::domain::ports::TrajectoryStore;

use super::checkpoint::sanitize_task_id;

/// Filesystem-backed trajectory persistence under `<root>/trajectories/`.
pub struct FsTrajectoryStore {
    root: PathBuf,
}

impl FsTrajectoryStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, task_id: &str) -> PathBuf {
        self.root
            .join("trajectories")
            .join(format!("{}.json", sanitize_task_id(task_id)))
    }
}

#[async_trait]
impl TrajectoryStore for FsTrajectoryStore {
    async fn record(&self, trajectory: &RunTrajectory) -> DomainResult<()> {
        let path = self.path_for(&trajectory.task_id);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, serde_json::to_vec_pretty(trajectory)?).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    async fn load(&self, task_id: &str) -> DomainResult<Option<RunTrajectory>> {
        match tokio::fs::read(self.path_for(task_id)).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }
}

/// In-memory trajectory store for tests.
#[derive(Default)]
pub struct MemoryTrajectoryStore {
    records: RwLock<HashMap<String, RunTrajectory>>,
}

impl MemoryTrajectoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl TrajectoryStore for MemoryTrajectoryStore {
    async fn record(&self, trajectory: &RunTrajectory) -> DomainResult<()> {
        self.records
            .write()
            .await
            .insert(trajectory.task_id.clone(), trajectory.clone());
        Ok(())
    }

    async fn load(&self, task_id: &str) -> DomainResult<Option<RunTrajectory>> {
        Ok(self.records.read().await.get(task_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    use crate::domain::models::EvidencePack;

    fn trajectory(task_id: &str) -> RunTrajectory {
        RunTrajectory {
            task_id: task_id.to_string(),
            subject: "s".to_string(),
            tradition: "chinese_ink".to_string(),
            evidence: EvidencePack::default(),
            rounds: vec![],
            output: None,
            recorded_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_fs_record_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsTrajectoryStore::new(dir.path());
        store.record(&trajectory("t-1")).await.unwrap();

        let loaded = store.load("t-1").await.unwrap().unwrap();
        assert_eq!(loaded.task_id, "t-1");
        assert!(store.load("t-2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_fs_record_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsTrajectoryStore::new(dir.path());
        store.record(&trajectory("t-1")).await.unwrap();
        let mut updated = trajectory("t-1");
        updated.subject = "updated".to_string();
        store.record(&updated).await.unwrap();
        assert_eq!(store.load("t-1").await.unwrap().unwrap().subject, "updated");
    }

    #[tokio::test]
    async fn test_memory_store() {
        let store = MemoryTrajectoryStore::new();
        assert!(store.is_empty().await);
        store.record(&trajectory("t-1")).await.unwrap();
        assert_eq!(store.len().await, 1);
        assert!(store.load("t-1").await.unwrap().is_some());
    }
}
