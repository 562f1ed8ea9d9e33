//! Error types for registry operations.

use std::io;
use std::path::PathBuf;

use crate::lock::LockError;
use crate::store::StoreError;

/// Result type for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Errors that can occur during registry synchronization and orchestration.
#[derive(Debug)]
pub enum RegistryError {
    /// Remote object store failure.
    Store(StoreError),

    /// Distributed lock acquisition failure.
    Lock(LockError),

    /// Failed to read a local file.
    ReadFailed { path: PathBuf, source: io::Error },

    /// Failed to write a local file.
    WriteFailed { path: PathBuf, source: io::Error },

    /// A remote stream failed while being copied.
    FetchFailed { key: String, source: io::Error },

    /// A path reference could not be mapped to a remote key.
    InvalidPath(String),

    /// Local store collaborator failure.
    LocalStore(String),
}

impl std::fmt::Display for RegistryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Store(e) => write!(f, "remote store error: {}", e),
            Self::Lock(e) => write!(f, "upload lock error: {}", e),
            Self::ReadFailed { path, source } => {
                write!(f, "failed to read {}: {}", path.display(), source)
            }
            Self::WriteFailed { path, source } => {
                write!(f, "failed to write {}: {}", path.display(), source)
            }
            Self::FetchFailed { key, source } => {
                write!(f, "failed to fetch {}: {}", key, source)
            }
            Self::InvalidPath(msg) => write!(f, "invalid path: {}", msg),
            Self::LocalStore(msg) => write!(f, "local store error: {}", msg),
        }
    }
}

impl std::error::Error for RegistryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Store(e) => Some(e),
            Self::Lock(e) => Some(e),
            Self::ReadFailed { source, .. } => Some(source),
            Self::WriteFailed { source, .. } => Some(source),
            Self::FetchFailed { source, .. } => Some(source),
            Self::InvalidPath(_) | Self::LocalStore(_) => None,
        }
    }
}

impl From<StoreError> for RegistryError {
    fn from(e: StoreError) -> Self {
        Self::Store(e)
    }
}

impl From<LockError> for RegistryError {
    fn from(e: LockError) -> Self {
        Self::Lock(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_store_error_display() {
        let err = RegistryError::from(StoreError::NotFound("metadata/versions.list".to_string()));
        assert!(err.to_string().contains("remote store error"));
        assert!(err.to_string().contains("metadata/versions.list"));
    }

    #[test]
    fn test_read_failed_display() {
        let err = RegistryError::ReadFailed {
            path: PathBuf::from("/data/versions.list"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(err.to_string().contains("/data/versions.list"));
        assert!(err.to_string().contains("denied"));
    }

    #[test]
    fn test_error_source_chain() {
        let err = RegistryError::FetchFailed {
            key: "artifacts/gems/rack-2.2.4.gem".to_string(),
            source: io::Error::new(io::ErrorKind::UnexpectedEof, "short read"),
        };
        assert!(err.source().is_some());

        let err = RegistryError::InvalidPath("no basename".to_string());
        assert!(err.source().is_none());
    }
}
