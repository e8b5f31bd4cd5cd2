//! Evidence collaborator boundary.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::EvidencePack;

/// Supplies evidence for `(subject, tradition)`.
///
/// The retrieval mechanism (keyword, semantic index, curated corpus) is the
/// implementation's concern; the pipeline consumes the pack as an opaque
/// input.
#[async_trait]
pub trait Scout: Send + Sync {
    async fn gather(&self, subject: &str, tradition: &str) -> DomainResult<EvidencePack>;
}
