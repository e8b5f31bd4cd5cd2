//! Durable per-stage checkpoint storage.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::errors::DomainResult;
use crate::domain::models::{PipelineOutput, RunSummary};

/// Whole-document checkpoint storage keyed by task identity.
///
/// All writes are complete-document overwrites; there is no partial
/// patching. A missing checkpoint is `Ok(None)`, never an error. Readers of
/// the index must always observe the last fully-written version even while
/// a write is in progress.
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    /// Save (overwrite) the checkpoint for `(task_id, stage)`.
    async fn save(&self, task_id: &str, stage: &str, data: &Value) -> DomainResult<()>;

    /// Load the checkpoint for `(task_id, stage)`, if one exists.
    async fn load(&self, task_id: &str, stage: &str) -> DomainResult<Option<Value>>;

    /// Save the terminal output document for the task.
    async fn save_output(&self, task_id: &str, output: &PipelineOutput) -> DomainResult<()>;

    /// Load the terminal output document, if the run finished.
    async fn load_output(&self, task_id: &str) -> DomainResult<Option<PipelineOutput>>;

    /// Upsert this task's row in the runs index.
    async fn update_index(&self, task_id: &str, entry: &RunSummary) -> DomainResult<()>;

    /// Load the whole runs index (empty if none exists yet).
    async fn load_index(&self) -> DomainResult<HashMap<String, RunSummary>>;
}
