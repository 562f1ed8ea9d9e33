//! Gem registry orchestration.
//!
//! [`GemRegistry`] ties the collaborators together: every mutation keeps the
//! local store and the shared remote store in step, and the create path is
//! the one critical section serialized across instances.
//!
//! Lock nesting in [`GemRegistry::create`] is fixed: the process-local create
//! mutex is taken first, the distributed upload lock second, and both release
//! in reverse order when their guards drop. Taking the distributed lock first
//! could leave a process holding it while blocked on a local mutex already
//! held by a sibling thread.
//!
//! Read-side operations ([`GemRegistry::update_local_file`],
//! [`GemRegistry::reindex`], freshness checks) skip the distributed lock:
//! they are idempotent and convergent under repetition, so benign
//! cross-process races only cost duplicate work.

use std::fs::{self, File};
use std::io::{self, Read};
use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info};

use super::cache::CacheProxy;
use super::error::{RegistryError, RegistryResult};
use super::index::IndexSynchronizer;
use super::traits::{LocalStore, ReindexProgress};
use crate::config::RegistryConfig;
use crate::gem::{parse_gem_filename, GemFile};
use crate::lock::UploadLock;
use crate::store::key;
use crate::store::ObjectStore;

/// Orchestrates gem create / delete / lazy-update / reindex against the
/// shared remote store.
pub struct GemRegistry {
    store: Arc<dyn ObjectStore>,
    local: Arc<dyn LocalStore>,
    upload_lock: Arc<dyn UploadLock>,
    index: IndexSynchronizer,
    config: RegistryConfig,
    create_mutex: Mutex<()>,
}

impl GemRegistry {
    /// Create a registry over explicitly injected collaborators.
    pub fn new(
        store: Arc<dyn ObjectStore>,
        local: Arc<dyn LocalStore>,
        upload_lock: Arc<dyn UploadLock>,
        config: RegistryConfig,
    ) -> Self {
        let index = IndexSynchronizer::new(Arc::clone(&store), Arc::clone(&local));
        Self {
            store,
            local,
            upload_lock,
            index,
            config,
            create_mutex: Mutex::new(()),
        }
    }

    /// A cache proxy sharing this registry's remote store.
    pub fn cache_proxy(&self) -> CacheProxy {
        CacheProxy::new(Arc::clone(&self.store))
    }

    /// Add a gem to the registry.
    ///
    /// Runs under both exclusion layers (process-local mutex outer,
    /// distributed upload lock inner). Inside the critical section the local
    /// catalog is refreshed first so the subsequent push cannot clobber newer
    /// remote state, then the gem is ingested locally, its bytes uploaded,
    /// and the full index set pushed.
    pub fn create(&self, gem: &GemFile, overwrite: bool) -> RegistryResult<()> {
        let _process_hold = self.create_mutex.lock();
        let _upload_hold = self.upload_lock.acquire(&self.config.upload_lock_name)?;

        self.index.update_local()?;
        self.local.create(gem, overwrite)?;

        let remote_key = key::artifact_key(&gem.path_ref());
        self.store.write(&remote_key, gem.content())?;
        match parse_gem_filename(gem.name()) {
            Some((name, version)) => {
                info!(gem = %name, version = %version, bytes = gem.len(), "uploaded gem to remote store");
            }
            None => info!(gem = gem.name(), bytes = gem.len(), "uploaded gem to remote store"),
        }

        self.index.push()
    }

    /// Remove a gem locally and from the remote store.
    ///
    /// Not distributed-locked. Peer instances are not notified: each keeps
    /// serving its cached copy until its own next freshness cycle.
    pub fn delete(&self, path_ref: &Path) -> RegistryResult<()> {
        self.local.delete(path_ref)?;
        self.store.delete(&key::artifact_key(path_ref))?;

        info!(path = %path_ref.display(), "deleted gem locally and remotely");
        Ok(())
    }

    /// Lazily materialize a gem that exists remotely but not locally.
    ///
    /// The remote object is read fully into memory (bounded only by gem
    /// size), ingested through the local store's normal path, and the index
    /// set pushed since ingestion may have rewritten it. The local store's
    /// bookkeeping hook runs on every call, fetch or not.
    pub fn update_local_file(&self, path_ref: &Path) -> RegistryResult<()> {
        if !self.local.local_path(path_ref).exists() {
            let remote_key = key::artifact_key(path_ref);

            if self.store.exists(&remote_key)? {
                let mut content = Vec::new();
                self.store
                    .read(&remote_key)?
                    .read_to_end(&mut content)
                    .map_err(|e| RegistryError::FetchFailed {
                        key: remote_key.clone(),
                        source: e,
                    })?;

                let name = path_ref
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .ok_or_else(|| {
                        RegistryError::InvalidPath(format!(
                            "no file name in {}",
                            path_ref.display()
                        ))
                    })?;

                debug!(gem = %name, bytes = content.len(), "materialized gem from remote store");
                self.local.create(&GemFile::new(name, content), true)?;
                self.index.push()?;
            }
        }

        self.local.update_local_file(path_ref)
    }

    /// Reconcile every local gem against the remote artifact namespace, then
    /// rebuild the local catalog.
    ///
    /// A gem is re-downloaded when the local copy is absent or its byte
    /// length differs from the remote content length. Size equality is the
    /// only check; same-size content divergence goes undetected.
    pub fn reindex(&self, progress: ReindexProgress<'_>) -> RegistryResult<()> {
        self.local.prepare_data_folders()?;

        for object in self.store.list(key::ARTIFACT_PREFIX)? {
            let object = object?;
            let path_ref = match key::artifact_path(&object.key) {
                Some(path_ref) => path_ref,
                None => continue,
            };

            let local_path = self.local.local_path(&path_ref);
            let needs_download = match fs::metadata(&local_path) {
                Ok(meta) => meta.len() != object.content_length,
                Err(_) => true,
            };

            if needs_download {
                self.download_artifact(&object.key, &local_path)?;
            }
        }

        self.local.reindex(progress)
    }

    /// Refresh the local catalog without mutating any gem.
    ///
    /// Pre-read hook for serving paths that need current metadata.
    pub fn access_metadata(&self) -> RegistryResult<()> {
        self.index.update_local()
    }

    /// Stream a remote artifact over its local path.
    fn download_artifact(&self, remote_key: &str, local_path: &Path) -> RegistryResult<()> {
        let mut reader = self.store.read(remote_key)?;
        let mut file = File::create(local_path).map_err(|e| RegistryError::WriteFailed {
            path: local_path.to_path_buf(),
            source: e,
        })?;
        io::copy(&mut reader, &mut file).map_err(|e| RegistryError::FetchFailed {
            key: remote_key.to_string(),
            source: e,
        })?;

        debug!(key = remote_key, "refreshed gem from remote store");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gem::gem_path_ref;
    use crate::lock::NamedLock;
    use crate::registry::testing::TempGemStore;
    use crate::store::{MemoryStore, StoreResult};
    use tempfile::TempDir;

    fn fixture() -> (TempDir, Arc<MemoryStore>, Arc<TempGemStore>, GemRegistry) {
        let temp = TempDir::new().unwrap();
        let store = Arc::new(MemoryStore::new());
        let local = Arc::new(TempGemStore::new(temp.path()));
        let registry = GemRegistry::new(
            store.clone(),
            local.clone(),
            Arc::new(NamedLock::new()),
            RegistryConfig::new(),
        );
        (temp, store, local, registry)
    }

    fn remote_bytes(store: &MemoryStore, key: &str) -> Vec<u8> {
        let mut content = Vec::new();
        store.read(key).unwrap().read_to_end(&mut content).unwrap();
        content
    }

    #[test]
    fn test_create_persists_locally_and_remotely() {
        let (_temp, store, local, registry) = fixture();
        let gem = GemFile::new("rack-2.2.4.gem", b"gem bytes".to_vec());

        registry.create(&gem, false).unwrap();

        let local_path = local.local_path(&gem.path_ref());
        assert_eq!(fs::read(local_path).unwrap(), b"gem bytes");
        assert_eq!(
            remote_bytes(&store, "artifacts/gems/rack-2.2.4.gem"),
            b"gem bytes"
        );
    }

    #[test]
    fn test_create_pushes_index_files() {
        let (_temp, store, _local, registry) = fixture();
        let gem = GemFile::new("rack-2.2.4.gem", b"gem bytes".to_vec());

        registry.create(&gem, false).unwrap();

        // Ingestion rewrote the text indexes; create pushed every tracked
        // file, placeholders included.
        for name in crate::registry::index::all_index_files() {
            assert!(store.exists(&key::metadata_key(name)).unwrap());
        }
        let versions = remote_bytes(&store, &key::metadata_key("versions.list"));
        assert!(String::from_utf8(versions).unwrap().contains("rack-2.2.4.gem"));
    }

    #[test]
    fn test_create_refreshes_before_pushing() {
        let (_temp, store, local, registry) = fixture();

        // Another instance already published a catalog.
        store
            .write(&key::metadata_key("versions.list"), b"upstream-gem.gem\n")
            .unwrap();

        let gem = GemFile::new("rack-2.2.4.gem", b"gem bytes".to_vec());
        registry.create(&gem, false).unwrap();

        // The upstream entry was pulled before local ingestion appended.
        let versions =
            fs::read_to_string(local.local_path(Path::new("versions.list"))).unwrap();
        assert!(versions.contains("upstream-gem.gem"));
        assert!(versions.contains("rack-2.2.4.gem"));
    }

    #[test]
    fn test_delete_removes_both_copies() {
        let (_temp, store, local, registry) = fixture();
        let gem = GemFile::new("rack-2.2.4.gem", b"gem bytes".to_vec());
        registry.create(&gem, false).unwrap();

        registry.delete(&gem.path_ref()).unwrap();

        assert!(!local.local_path(&gem.path_ref()).exists());
        assert!(!store.exists("artifacts/gems/rack-2.2.4.gem").unwrap());
    }

    #[test]
    fn test_update_local_file_materializes_missing_gem() {
        let (_temp, store, local, registry) = fixture();
        let path_ref = gem_path_ref("rack-2.2.4.gem");

        store
            .write("artifacts/gems/rack-2.2.4.gem", b"gem bytes")
            .unwrap();

        registry.update_local_file(&path_ref).unwrap();

        assert_eq!(fs::read(local.local_path(&path_ref)).unwrap(), b"gem bytes");
        assert_eq!(local.update_calls(), 1);
    }

    #[test]
    fn test_update_local_file_no_remote_copy() {
        let (_temp, _store, local, registry) = fixture();
        let path_ref = gem_path_ref("rack-2.2.4.gem");

        registry.update_local_file(&path_ref).unwrap();

        // No fetch happened, the bookkeeping hook still ran.
        assert!(!local.local_path(&path_ref).exists());
        assert_eq!(local.update_calls(), 1);
    }

    #[test]
    fn test_update_local_file_present_locally_skips_remote() {
        let (_temp, store, local, registry) = fixture();
        let gem = GemFile::new("rack-2.2.4.gem", b"local".to_vec());
        registry.create(&gem, false).unwrap();

        // Remote divergence must not be observed.
        store
            .write("artifacts/gems/rack-2.2.4.gem", b"remote")
            .unwrap();

        registry.update_local_file(&gem.path_ref()).unwrap();
        assert_eq!(fs::read(local.local_path(&gem.path_ref())).unwrap(), b"local");
    }

    #[test]
    fn test_reindex_downloads_missing_gem() {
        let (_temp, store, local, registry) = fixture();
        store
            .write("artifacts/gems/rack-2.2.4.gem", b"gem bytes")
            .unwrap();

        registry.reindex(&|_| {}).unwrap();

        let path = local.local_path(&gem_path_ref("rack-2.2.4.gem"));
        assert_eq!(fs::read(path).unwrap(), b"gem bytes");
        assert_eq!(local.reindex_calls(), 1);
    }

    #[test]
    fn test_reindex_downloads_on_size_mismatch() {
        let (_temp, store, local, registry) = fixture();
        store
            .write("artifacts/gems/rack-2.2.4.gem", b"longer remote copy")
            .unwrap();

        local.prepare_data_folders().unwrap();
        let path = local.local_path(&gem_path_ref("rack-2.2.4.gem"));
        fs::write(&path, b"short").unwrap();

        registry.reindex(&|_| {}).unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"longer remote copy");
    }

    #[test]
    fn test_reindex_ignores_same_size_divergence() {
        let (_temp, store, local, registry) = fixture();
        store
            .write("artifacts/gems/rack-2.2.4.gem", b"AAAA")
            .unwrap();

        local.prepare_data_folders().unwrap();
        let path = local.local_path(&gem_path_ref("rack-2.2.4.gem"));
        fs::write(&path, b"BBBB").unwrap();

        registry.reindex(&|_| {}).unwrap();

        // Size-only equality: the diverged local copy survives.
        assert_eq!(fs::read(&path).unwrap(), b"BBBB");
    }

    #[test]
    fn test_reindex_forwards_progress_to_local_store() {
        let (_temp, _store, _local, registry) = fixture();

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = {
            let seen = Arc::clone(&seen);
            move |step: &str| seen.lock().push(step.to_string())
        };

        registry.reindex(&sink).unwrap();
        assert!(!seen.lock().is_empty());
    }

    #[test]
    fn test_access_metadata_pulls_current_catalog() {
        let (_temp, store, local, registry) = fixture();
        store
            .write(&key::metadata_key("versions.list"), b"upstream-gem.gem\n")
            .unwrap();

        registry.access_metadata().unwrap();

        let versions =
            fs::read_to_string(local.local_path(Path::new("versions.list"))).unwrap();
        assert!(versions.contains("upstream-gem.gem"));
    }

    #[test]
    fn test_create_propagates_transport_errors_and_releases_locks() {
        struct FailingStore(MemoryStore);

        impl ObjectStore for FailingStore {
            fn exists(&self, key: &str) -> StoreResult<bool> {
                self.0.exists(key)
            }
            fn read(&self, key: &str) -> StoreResult<Box<dyn Read + Send>> {
                self.0.read(key)
            }
            fn write(&self, _key: &str, _content: &[u8]) -> StoreResult<()> {
                Err(crate::store::StoreError::Transport("backend down".to_string()))
            }
            fn delete(&self, key: &str) -> StoreResult<()> {
                self.0.delete(key)
            }
            fn last_modified(&self, key: &str) -> StoreResult<chrono::DateTime<chrono::Utc>> {
                self.0.last_modified(key)
            }
            fn list(
                &self,
                prefix: &str,
            ) -> StoreResult<Box<dyn Iterator<Item = StoreResult<crate::store::RemoteObject>> + Send>>
            {
                self.0.list(prefix)
            }
        }

        let temp = TempDir::new().unwrap();
        let local = Arc::new(TempGemStore::new(temp.path()));
        let registry = GemRegistry::new(
            Arc::new(FailingStore(MemoryStore::new())),
            local,
            Arc::new(NamedLock::new()),
            RegistryConfig::new(),
        );

        let gem = GemFile::new("rack-2.2.4.gem", b"gem bytes".to_vec());
        assert!(registry.create(&gem, false).is_err());

        // Both locks released on the error path: a second create must not
        // deadlock.
        assert!(registry.create(&gem, false).is_err());
    }
}
