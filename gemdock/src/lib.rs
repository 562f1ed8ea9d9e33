//! Gemdock - synchronization core for a private gem repository.
//!
//! A gemdock deployment runs several independent server instances, each with
//! a local on-disk gem store for fast serving, all sharing one authoritative
//! remote object store. This crate is the layer that keeps those local caches
//! consistent with the shared store:
//!
//! - staleness detection for the catalog index files, driven by a single
//!   freshness-probe timestamp ([`registry::IndexSynchronizer`])
//! - distributed locking around the create/push critical section
//!   ([`lock::UploadLock`])
//! - lazy fetch-on-miss retrieval of gems and ephemeral cache entries
//!   ([`registry::GemRegistry`], [`registry::CacheProxy`])
//!
//! The remote store's client, the local store's on-disk layout, and the
//! serving surface are all injected collaborators; this crate defines their
//! contracts and the orchestration between them.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use gemdock::{GemFile, GemRegistry, MemoryStore, NamedLock, RegistryConfig};
//! # use gemdock::registry::{LocalStore, RegistryResult, ReindexProgress};
//! # use std::path::{Path, PathBuf};
//! # struct NullStore;
//! # impl LocalStore for NullStore {
//! #     fn create(&self, _: &GemFile, _: bool) -> RegistryResult<()> { Ok(()) }
//! #     fn delete(&self, _: &Path) -> RegistryResult<()> { Ok(()) }
//! #     fn local_path(&self, path_ref: &Path) -> PathBuf { PathBuf::from("/nonexistent").join(path_ref) }
//! #     fn update_local_file(&self, _: &Path) -> RegistryResult<()> { Ok(()) }
//! #     fn prepare_data_folders(&self) -> RegistryResult<()> { Ok(()) }
//! #     fn reindex(&self, _: ReindexProgress<'_>) -> RegistryResult<()> { Ok(()) }
//! # }
//!
//! let registry = GemRegistry::new(
//!     Arc::new(MemoryStore::new()),
//!     Arc::new(NullStore),
//!     Arc::new(NamedLock::new()),
//!     RegistryConfig::new(),
//! );
//!
//! let gem = GemFile::new("rack-2.2.4.gem", b"...".to_vec());
//! registry.create(&gem, false)?;
//! # Ok::<(), gemdock::registry::RegistryError>(())
//! ```

pub mod config;
pub mod gem;
pub mod lock;
pub mod registry;
pub mod store;

pub use config::RegistryConfig;
pub use gem::GemFile;
pub use lock::{LockError, LockGuard, LockResult, NamedLock, UploadLock};
pub use registry::{
    CacheProxy, GemRegistry, IndexSynchronizer, LocalStore, RegistryError, RegistryResult,
};
pub use store::{MemoryStore, ObjectStore, RemoteObject, StoreError, StoreResult};
