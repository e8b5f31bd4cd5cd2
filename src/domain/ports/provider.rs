//! Generation backend capability.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::GenerationRequest;

/// A generation backend.
///
/// This is a closed capability interface: implementations are the fixed set
/// of adapters in [`crate::adapters::providers`], assembled into an ordered
/// fallback chain at orchestrator setup. There is no runtime plugin
/// registry.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Short stable name used in provenance and logs.
    fn name(&self) -> &str;

    /// The model this provider serves, recorded in candidate provenance.
    fn model_ref(&self) -> &str;

    /// Cheap availability probe. A `false` here makes the fallback chain
    /// skip the provider without consuming a retry.
    async fn available(&self) -> bool;

    /// Produce one artifact and return its location.
    async fn generate(&self, request: &GenerationRequest) -> DomainResult<String>;
}
