//! Domain errors for the Atelier pipeline.

use thiserror::Error;

/// Domain-level errors that can occur in the Atelier system.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    #[error("Invalid state transition from {from} to {to}: {reason}")]
    InvalidStateTransition {
        from: String,
        to: String,
        reason: String,
    },

    #[error("Provider {provider} unavailable: {reason}")]
    ProviderUnavailable { provider: String, reason: String },

    #[error("Provider {provider} failed: {message}")]
    ProviderFailed { provider: String, message: String },

    #[error("Provider chain exhausted after {attempts} attempts: {last_error}")]
    ProviderChainExhausted { attempts: u32, last_error: String },

    #[error("Persistence error: {0}")]
    PersistenceError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Evidence lookup failed: {0}")]
    EvidenceLookupFailed(String),

    #[error("Execution failed: {0}")]
    ExecutionFailed(String),
}

pub type DomainResult<T> = Result<T, DomainError>;

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        DomainError::SerializationError(err.to_string())
    }
}

impl From<std::io::Error> for DomainError {
    fn from(err: std::io::Error) -> Self {
        DomainError::PersistenceError(err.to_string())
    }
}
