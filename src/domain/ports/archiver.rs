//! Archival collaborator boundary.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::{ArchiveManifest, RunTrajectory};

/// Produces durable audit artifacts from a completed run's history.
///
/// Invoked only after a terminal decision, and optionally skipped.
#[async_trait]
pub trait Archiver: Send + Sync {
    async fn archive(&self, trajectory: &RunTrajectory) -> DomainResult<ArchiveManifest>;
}
