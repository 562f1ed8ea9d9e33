//! Catalog index synchronization.
//!
//! The gem catalog is described by a fixed set of index files mirrored
//! between each instance's data directory and the `metadata/` namespace of
//! the shared remote store. Staleness is inferred from a single designated
//! freshness probe: the local mtime of [`freshness_probe`] is compared
//! against its remote last-modified timestamp, and one stale probe triggers a
//! full re-pull of every tracked index file — there is no per-file diffing.
//!
//! Pushes and pulls are sequences of independent whole-object transfers in a
//! fixed order (binary files, then text files). The sequence is not atomic: a
//! failure mid-way leaves the accepted mixed state described in the crate
//! docs, and the next successful cycle converges it.

use std::fs::{self, File};
use std::io;
use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tracing::{debug, info};

use super::error::{RegistryError, RegistryResult};
use super::traits::LocalStore;
use crate::store::key;
use crate::store::{ObjectStore, StoreError};

/// Compressed catalog index files, pulled and pushed first.
pub const BINARY_INDEX_FILES: [&str; 3] = [
    "specs.4.8.gz",
    "latest_specs.4.8.gz",
    "prerelease_specs.4.8.gz",
];

/// Plain-text catalog index files (legacy and current formats).
///
/// The last entry is the freshness probe for the whole catalog.
pub const TEXT_INDEX_FILES: [&str; 5] = [
    "specs.4.8",
    "latest_specs.4.8",
    "prerelease_specs.4.8",
    "names.list",
    "versions.list",
];

/// The index file whose timestamps stand in for whole-catalog staleness.
pub fn freshness_probe() -> &'static str {
    TEXT_INDEX_FILES[TEXT_INDEX_FILES.len() - 1]
}

/// Every tracked index file, in bulk-transfer order (binary, then text).
pub(crate) fn all_index_files() -> impl Iterator<Item = &'static str> {
    BINARY_INDEX_FILES
        .iter()
        .chain(TEXT_INDEX_FILES.iter())
        .copied()
}

/// Keeps the local catalog index files in step with the remote store.
///
/// Concurrent callers within one process are serialized by an internal mutex
/// around the freshness-check-and-refresh sequence. Cross-process ordering is
/// the caller's concern (the registry holds the distributed upload lock
/// around mutating sequences).
pub struct IndexSynchronizer {
    store: Arc<dyn ObjectStore>,
    local: Arc<dyn LocalStore>,
    refresh_mutex: Mutex<()>,
}

impl IndexSynchronizer {
    /// Create a synchronizer over the given collaborators.
    pub fn new(store: Arc<dyn ObjectStore>, local: Arc<dyn LocalStore>) -> Self {
        Self {
            store,
            local,
            refresh_mutex: Mutex::new(()),
        }
    }

    /// Whether the remote catalog is newer than the local copy.
    ///
    /// Probes the remote last-modified timestamp of [`freshness_probe`]:
    ///
    /// - probe absent remotely: `false` — local state, if any, is
    ///   authoritative
    /// - probe absent locally: `true`
    /// - otherwise: `true` iff the local mtime is strictly earlier than the
    ///   remote timestamp (equal or newer means no update)
    pub fn remote_changed(&self) -> RegistryResult<bool> {
        let probe = freshness_probe();
        let remote_key = key::metadata_key(probe);

        let remote_ts = match self.store.last_modified(&remote_key) {
            Ok(ts) => ts,
            Err(StoreError::NotFound(_)) => {
                info!(probe, "freshness probe absent remotely, local catalog is authoritative");
                return Ok(false);
            }
            Err(e) => return Err(e.into()),
        };

        let local_path = self.local.local_path(Path::new(probe));
        if !local_path.exists() {
            return Ok(true);
        }

        let mtime = fs::metadata(&local_path)
            .and_then(|meta| meta.modified())
            .map_err(|e| RegistryError::ReadFailed {
                path: local_path.clone(),
                source: e,
            })?;

        Ok(DateTime::<Utc>::from(mtime) < remote_ts)
    }

    /// Pull the full index set from the remote store if it has changed.
    ///
    /// Serialized within the process. When the freshness probe reports a
    /// change, the data directory structure is bootstrapped via the local
    /// store and every tracked index file is re-pulled, each one overwriting
    /// its local copy unconditionally.
    pub fn update_local(&self) -> RegistryResult<()> {
        let _refresh_hold = self.refresh_mutex.lock();

        if !self.remote_changed()? {
            return Ok(());
        }

        info!("remote catalog changed, pulling index files");
        self.local.prepare_data_folders()?;

        for name in all_index_files() {
            self.pull_index_file(name)?;
        }

        Ok(())
    }

    /// Push the full index set to the remote store.
    ///
    /// Index files missing locally are pushed as empty payloads so the remote
    /// never retains stale content for a file the local side no longer has.
    pub fn push(&self) -> RegistryResult<()> {
        for name in all_index_files() {
            let remote_key = key::metadata_key(name);
            let local_path = self.local.local_path(Path::new(name));

            if local_path.exists() {
                let content = fs::read(&local_path).map_err(|e| RegistryError::ReadFailed {
                    path: local_path.clone(),
                    source: e,
                })?;
                self.store.write(&remote_key, &content)?;
            } else {
                self.store.write(&remote_key, &[])?;
            }
        }

        debug!("pushed index files to remote store");
        Ok(())
    }

    /// Pull one index file, overwriting the local copy.
    ///
    /// A file absent remotely is skipped; any local copy stays untouched.
    fn pull_index_file(&self, name: &str) -> RegistryResult<()> {
        let remote_key = key::metadata_key(name);

        let mut reader = match self.store.read(&remote_key) {
            Ok(reader) => reader,
            Err(StoreError::NotFound(_)) => {
                debug!(file = name, "index file absent remotely, skipping pull");
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        let local_path = self.local.local_path(Path::new(name));
        let mut file = File::create(&local_path).map_err(|e| RegistryError::WriteFailed {
            path: local_path.clone(),
            source: e,
        })?;

        io::copy(&mut reader, &mut file).map_err(|e| RegistryError::FetchFailed {
            key: remote_key,
            source: e,
        })?;

        Ok(())
    }
}
