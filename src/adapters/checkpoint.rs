//! Checkpoint stores: filesystem-backed for deployments, in-memory for
//! tests.
//!
//! Layout under the store root:
//!
//! ```text
//! checkpoints/<task>/<stage>.json   one document per (task, stage)
//! outputs/<task>.json               terminal PipelineOutput
//! runs_index.json                   task_id -> RunSummary
//! ```
//!
//! Every write lands in a temporary file first and is renamed into place,
//! so a reader racing a writer always observes the last fully-written
//! version. Index updates additionally serialize through a mutex so two
//! tasks finishing at once cannot drop each other's rows.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{PipelineOutput, RunSummary};
use crate::domain::ports::CheckpointStore;

/// Reduce a task id to a filesystem- and namespace-safe key.
///
/// Anything outside `[A-Za-z0-9._-]` maps to `_`; an empty id becomes
/// `"_"` so it still produces a usable path component.
pub fn sanitize_task_id(task_id: &str) -> String {
    let sanitized: String = task_id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if sanitized.is_empty() {
        "_".to_string()
    } else {
        sanitized
    }
}

async fn write_atomic(path: &Path, contents: &[u8]) -> DomainResult<()> {
    let parent = path
        .parent()
        .ok_or_else(|| DomainError::PersistenceError(format!("no parent for {}", path.display())))?;
    tokio::fs::create_dir_all(parent).await?;
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, contents).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}

async fn read_json(path: &Path) -> DomainResult<Option<Value>> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err.into()),
    }
}

/// Whole-document JSON checkpoint storage on the local filesystem.
pub struct FsCheckpointStore {
    root: PathBuf,
    index_lock: Mutex<()>,
}

impl FsCheckpointStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            index_lock: Mutex::new(()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn stage_path(&self, task_id: &str, stage: &str) -> PathBuf {
        self.root
            .join("checkpoints")
            .join(sanitize_task_id(task_id))
            .join(format!("{}.json", sanitize_task_id(stage)))
    }

    fn output_path(&self, task_id: &str) -> PathBuf {
        self.root
            .join("outputs")
            .join(format!("{}.json", sanitize_task_id(task_id)))
    }

    fn index_path(&self) -> PathBuf {
        self.root.join("runs_index.json")
    }
}

#[async_trait]
impl CheckpointStore for FsCheckpointStore {
    async fn save(&self, task_id: &str, stage: &str, data: &Value) -> DomainResult<()> {
        let path = self.stage_path(task_id, stage);
        write_atomic(&path, &serde_json::to_vec_pretty(data)?).await?;
        debug!(%task_id, stage, path = %path.display(), "checkpoint written");
        Ok(())
    }

    async fn load(&self, task_id: &str, stage: &str) -> DomainResult<Option<Value>> {
        read_json(&self.stage_path(task_id, stage)).await
    }

    async fn save_output(&self, task_id: &str, output: &PipelineOutput) -> DomainResult<()> {
        let path = self.output_path(task_id);
        write_atomic(&path, &serde_json::to_vec_pretty(output)?).await
    }

    async fn load_output(&self, task_id: &str) -> DomainResult<Option<PipelineOutput>> {
        match read_json(&self.output_path(task_id)).await? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    async fn update_index(&self, task_id: &str, entry: &RunSummary) -> DomainResult<()> {
        let _guard = self.index_lock.lock().await;
        let mut index: HashMap<String, RunSummary> = match read_json(&self.index_path()).await? {
            Some(value) => serde_json::from_value(value)?,
            None => HashMap::new(),
        };
        index.insert(task_id.to_string(), entry.clone());
        write_atomic(&self.index_path(), &serde_json::to_vec_pretty(&index)?).await
    }

    async fn load_index(&self) -> DomainResult<HashMap<String, RunSummary>> {
        match read_json(&self.index_path()).await? {
            Some(value) => Ok(serde_json::from_value(value)?),
            None => Ok(HashMap::new()),
        }
    }
}

/// In-memory checkpoint store for tests.
#[derive(Default)]
pub struct MemoryCheckpointStore {
    stages: RwLock<HashMap<(String, String), Value>>,
    outputs: RwLock<HashMap<String, PipelineOutput>>,
    index: RwLock<HashMap<String, RunSummary>>,
    fail_writes: bool,
}

impl MemoryCheckpointStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose every write fails, for exercising the
    /// degraded-resumability path.
    pub fn failing() -> Self {
        Self {
            fail_writes: true,
            ..Self::default()
        }
    }

    fn check_writable(&self) -> DomainResult<()> {
        if self.fail_writes {
            return Err(DomainError::PersistenceError(
                "checkpoint store unavailable".to_string(),
            ));
        }
        Ok(())
    }

    /// Number of stage checkpoints currently held.
    pub async fn stage_count(&self) -> usize {
        self.stages.read().await.len()
    }
}

#[async_trait]
impl CheckpointStore for MemoryCheckpointStore {
    async fn save(&self, task_id: &str, stage: &str, data: &Value) -> DomainResult<()> {
        self.check_writable()?;
        self.stages
            .write()
            .await
            .insert((task_id.to_string(), stage.to_string()), data.clone());
        Ok(())
    }

    async fn load(&self, task_id: &str, stage: &str) -> DomainResult<Option<Value>> {
        Ok(self
            .stages
            .read()
            .await
            .get(&(task_id.to_string(), stage.to_string()))
            .cloned())
    }

    async fn save_output(&self, task_id: &str, output: &PipelineOutput) -> DomainResult<()> {
        self.check_writable()?;
        self.outputs
            .write()
            .await
            .insert(task_id.to_string(), output.clone());
        Ok(())
    }

    async fn load_output(&self, task_id: &str) -> DomainResult<Option<PipelineOutput>> {
        Ok(self.outputs.read().await.get(task_id).cloned())
    }

    async fn update_index(&self, task_id: &str, entry: &RunSummary) -> DomainResult<()> {
        self.check_writable()?;
        self.index
            .write()
            .await
            .insert(task_id.to_string(), entry.clone());
        Ok(())
    }

    async fn load_index(&self) -> DomainResult<HashMap<String, RunSummary>> {
        Ok(self.index.read().await.clone())
    }
}
