//! Trajectory persistence boundary.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::RunTrajectory;

/// Stores completed run trajectories for later retrieval.
#[async_trait]
pub trait TrajectoryStore: Send + Sync {
    async fn record(&self, trajectory: &RunTrajectory) -> DomainResult<()>;

    async fn load(&self, task_id: &str) -> DomainResult<Option<RunTrajectory>>;
}
