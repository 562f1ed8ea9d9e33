//! Collaborator contracts consumed by the registry.
//!
//! The local gem store owns the on-disk layout, the gem ingestion pipeline,
//! and index regeneration. This crate never touches those concerns directly;
//! it drives them through [`LocalStore`] and keeps the remote object store in
//! step around them.

use std::path::{Path, PathBuf};

use super::error::RegistryResult;
use crate::gem::GemFile;

/// Progress callback forwarded through [`LocalStore::reindex`].
///
/// Receives a short human-readable description of each reindex step.
pub type ReindexProgress<'a> = &'a (dyn Fn(&str) + Send + Sync);

/// The local on-disk gem store collaborator.
///
/// Implementations own path layout and ingestion semantics; the registry only
/// relies on the behaviors documented here.
pub trait LocalStore: Send + Sync {
    /// Persist a gem through the store's normal ingestion path.
    ///
    /// Ingestion may rewrite the catalog index files. Overwrite semantics are
    /// the implementation's own.
    fn create(&self, gem: &GemFile, overwrite: bool) -> RegistryResult<()>;

    /// Delete the gem at `path_ref` from the local store.
    fn delete(&self, path_ref: &Path) -> RegistryResult<()>;

    /// Absolute on-disk path for a registry-relative path reference.
    ///
    /// Pure; the returned path may or may not exist.
    fn local_path(&self, path_ref: &Path) -> PathBuf;

    /// Local-update bookkeeping hook.
    ///
    /// Invoked after every lazy-update attempt for `path_ref`, whether or not
    /// a remote fetch occurred.
    fn update_local_file(&self, path_ref: &Path) -> RegistryResult<()>;

    /// Ensure the store's data directory structure exists, creating it if
    /// missing.
    fn prepare_data_folders(&self) -> RegistryResult<()>;

    /// Rebuild the store's catalog indexes from its on-disk contents.
    fn reindex(&self, progress: ReindexProgress<'_>) -> RegistryResult<()>;
}
