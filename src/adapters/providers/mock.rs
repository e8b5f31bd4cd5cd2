//! Deterministic mock provider.
//!
//! The mock never blocks, never depends on anything external, and derives
//! its artifact path purely from the request, so two runs with the same
//! seeds produce identical candidates. By convention it terminates every
//! fallback chain.

use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::GenerationRequest;
use crate::domain::ports::Provider;

/// Mock behavior configuration.
#[derive(Debug, Clone)]
pub struct MockBehavior {
    /// Whether every call fails.
    pub fail: bool,
    /// Whether the availability probe reports the provider down.
    pub unavailable: bool,
    /// Error message when failing.
    pub error_message: String,
}

impl Default for MockBehavior {
    fn default() -> Self {
        Self {
            fail: false,
            unavailable: false,
            error_message: "mock failure".to_string(),
        }
    }
}

/// Deterministic mock provider for tests and as chain terminator.
pub struct MockProvider {
    name: String,
    model_ref: String,
    behavior: MockBehavior,
    calls: AtomicU32,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::named("mock")
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            model_ref: "mock-diffusion-v1".to_string(),
            behavior: MockBehavior::default(),
            calls: AtomicU32::new(0),
        }
    }

    /// A provider whose every generate call fails.
    pub fn always_failing(name: impl Into<String>) -> Self {
        Self {
            behavior: MockBehavior {
                fail: true,
                ..MockBehavior::default()
            },
            ..Self::named(name)
        }
    }

    /// A provider whose availability probe reports it down.
    pub fn unavailable(name: impl Into<String>) -> Self {
        Self {
            behavior: MockBehavior {
                unavailable: true,
                ..MockBehavior::default()
            },
            ..Self::named(name)
        }
    }

    /// How many generate calls this provider has received.
    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::Relaxed)
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Provider for MockProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn model_ref(&self) -> &str {
        &self.model_ref
    }

    async fn available(&self) -> bool {
        !self.behavior.unavailable
    }

    async fn generate(&self, request: &GenerationRequest) -> DomainResult<String> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        if self.behavior.fail {
            return Err(DomainError::ProviderFailed {
                provider: self.name.clone(),
                message: self.behavior.error_message.clone(),
            });
        }
        Ok(format!(
            "mock/{:016x}-{}x{}-s{}.png",
            request.seed, request.width, request.height, request.steps
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(seed: u64) -> GenerationRequest {
        GenerationRequest {
            prompt: "p".to_string(),
            negative_prompt: String::new(),
            seed,
            width: 512,
            height: 512,
            steps: 30,
            sampler: "euler_a".to_string(),
            mask_hint: None,
        }
    }

    #[tokio::test]
    async fn test_mock_generate_is_deterministic() {
        let provider = MockProvider::new();
        let a = provider.generate(&request(42)).await.unwrap();
        let b = provider.generate(&request(42)).await.unwrap();
        assert_eq!(a, b);
        assert_eq!(provider.call_count(), 2);
    }

    #[tokio::test]
    async fn test_distinct_seeds_distinct_artifacts() {
        let provider = MockProvider::new();
        let a = provider.generate(&request(1)).await.unwrap();
        let b = provider.generate(&request(2)).await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_failing_mock() {
        let provider = MockProvider::always_failing("broken");
        assert!(provider.available().await);
        assert!(provider.generate(&request(1)).await.is_err());
    }

    #[tokio::test]
    async fn test_unavailable_mock() {
        let provider = MockProvider::unavailable("down");
        assert!(!provider.available().await);
    }
}
