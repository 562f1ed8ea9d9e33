//! Fetch-on-miss retrieval for ephemeral cache entries.
//!
//! Cache entries (dependency listings, quick-index fragments) are cheap to
//! regenerate but expensive to regenerate everywhere, so instances share them
//! through the `cache/` namespace of the remote store. The proxy wraps the
//! server's cache-file reads and writes:
//!
//! - [`CacheProxy::pre_read`] materializes a missing local file from the
//!   remote copy, if one exists
//! - [`CacheProxy::post_write`] publishes the local file, last writer wins
//!
//! Only the basename of the local file participates in the key mapping.

use std::fs::{self, File};
use std::io;
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info};

use super::error::{RegistryError, RegistryResult};
use crate::store::key;
use crate::store::ObjectStore;

/// Remote-backed retrieval path for ephemeral cache files.
pub struct CacheProxy {
    store: Arc<dyn ObjectStore>,
}

impl CacheProxy {
    /// Create a proxy over the given remote store.
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    /// Materialize `path` from the remote store if it is missing locally.
    ///
    /// A present local file is served as-is with no remote contact. A file
    /// absent both locally and remotely is a miss; no local file is created.
    pub fn pre_read(&self, path: &Path) -> RegistryResult<()> {
        if path.exists() {
            debug!(path = %path.display(), "cache hit");
            return Ok(());
        }

        let remote_key = self.remote_key(path)?;
        if !self.store.exists(&remote_key)? {
            debug!(key = %remote_key, "cache miss, absent remotely");
            return Ok(());
        }

        let mut reader = self.store.read(&remote_key)?;
        let mut file = File::create(path).map_err(|e| RegistryError::WriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;
        io::copy(&mut reader, &mut file).map_err(|e| RegistryError::FetchFailed {
            key: remote_key.clone(),
            source: e,
        })?;

        info!(key = %remote_key, path = %path.display(), "materialized cache entry from remote store");
        Ok(())
    }

    /// Publish the local file at `path` to the remote store.
    ///
    /// Unconditional whole-object overwrite; concurrent publishers are
    /// last-writer-wins.
    pub fn post_write(&self, path: &Path) -> RegistryResult<()> {
        let remote_key = self.remote_key(path)?;

        let content = fs::read(path).map_err(|e| RegistryError::ReadFailed {
            path: path.to_path_buf(),
            source: e,
        })?;
        self.store.write(&remote_key, &content)?;

        debug!(key = %remote_key, bytes = content.len(), "published cache entry");
        Ok(())
    }

    fn remote_key(&self, path: &Path) -> RegistryResult<String> {
        key::cache_key(path)
            .ok_or_else(|| RegistryError::InvalidPath(format!("no file name in {}", path.display())))
    }
}
