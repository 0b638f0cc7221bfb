//! Error taxonomy for the accounting engine
//!
//! Validation and integrity failures are the caller's (or the data's) fault
//! and are never retried; external-service and concurrency failures are
//! transient and retryable. Callers can branch on [`PaperbotError::is_retryable`].

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PaperbotError {
    /// Bad input rejected synchronously, nothing was applied.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A stored record failed required-field checks. The record is skipped
    /// by the reader; this variant surfaces only when a whole document is
    /// unreadable.
    #[error("stored data failed integrity checks: {0}")]
    DataIntegrity(String),

    /// Price lookup or balance fetch failed. Degrades the computation that
    /// needed it; retryable.
    #[error("external service failure: {0}")]
    ExternalService(String),

    /// Could not acquire the store lock within the bounded wait. Retryable,
    /// nothing was written.
    #[error("store busy: {0}")]
    Concurrency(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl PaperbotError {
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            PaperbotError::ExternalService(_) | PaperbotError::Concurrency(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, PaperbotError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(PaperbotError::ExternalService("oracle down".into()).is_retryable());
        assert!(PaperbotError::Concurrency("lock timeout".into()).is_retryable());
        assert!(!PaperbotError::Validation("bad range".into()).is_retryable());
        assert!(!PaperbotError::DataIntegrity("missing field".into()).is_retryable());
    }
}
