//! Error types for remote object store operations.

use thiserror::Error;

/// Result type for object store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur talking to the remote object store.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// No object exists at the requested key.
    ///
    /// Absence is a normal branch condition for callers, not a failure.
    #[error("remote object not found: {0}")]
    NotFound(String),

    /// Any non-absence failure: network, authentication, backend fault.
    ///
    /// Transport errors propagate uncaught and abort the calling operation.
    #[error("remote store transport failure: {0}")]
    Transport(String),
}

impl StoreError {
    /// Whether this error is the absence of an object rather than a fault.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_display() {
        let err = StoreError::NotFound("metadata/versions.list".to_string());
        assert!(err.to_string().contains("not found"));
        assert!(err.to_string().contains("metadata/versions.list"));
    }

    #[test]
    fn test_transport_display() {
        let err = StoreError::Transport("connection reset".to_string());
        assert!(err.to_string().contains("transport failure"));
        assert!(err.to_string().contains("connection reset"));
    }

    #[test]
    fn test_is_not_found() {
        assert!(StoreError::NotFound("k".to_string()).is_not_found());
        assert!(!StoreError::Transport("boom".to_string()).is_not_found());
    }
}
