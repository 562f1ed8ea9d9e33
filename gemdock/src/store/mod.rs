//! Remote object store contract and key mapping.
//!
//! Every server instance shares one authoritative remote object store. This
//! module defines the contract the rest of the crate consumes:
//!
//! - [`ObjectStore`]: existence checks, streamed reads, whole-object writes,
//!   deletes, last-modified queries, and prefixed listing
//! - [`key`]: the deterministic mapping from registry path references to
//!   namespaced remote keys (`artifacts/`, `metadata/`, `cache/`)
//! - [`MemoryStore`]: an in-memory implementation for tests and single-node
//!   embedding
//!
//! Concrete backends (S3-compatible stores, filesystem shares, ...) live with
//! the embedding server and are injected; only the contract is defined here.
//!
//! # Error Model
//!
//! Absence (`StoreError::NotFound`) is a normal branch condition that drives
//! existence-based logic throughout the registry. Every other failure is
//! `StoreError::Transport` and aborts the calling operation; no call in this
//! crate retries.

mod error;
pub mod key;
mod memory;

use std::io::Read;

use chrono::{DateTime, Utc};

pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;

/// A remote object as reported by a prefixed listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteObject {
    /// Full remote key, including its namespace prefix.
    pub key: String,

    /// Size of the stored object in bytes.
    pub content_length: u64,
}

/// Contract over the shared remote object store.
///
/// All operations are synchronous blocking calls. Writes are whole-object
/// overwrites; the store offers no conditional put or compare-and-swap, so
/// concurrent writers are last-writer-wins.
pub trait ObjectStore: Send + Sync {
    /// Whether an object exists at `key`.
    fn exists(&self, key: &str) -> StoreResult<bool>;

    /// Open a chunked byte stream over the object at `key`.
    ///
    /// Readers hold bounded memory; callers stream into their destination.
    ///
    /// # Errors
    ///
    /// `StoreError::NotFound` when the key is absent.
    fn read(&self, key: &str) -> StoreResult<Box<dyn Read + Send>>;

    /// Overwrite the object at `key` with `content`.
    fn write(&self, key: &str, content: &[u8]) -> StoreResult<()>;

    /// Delete the object at `key`. Deleting an absent key is not an error.
    fn delete(&self, key: &str) -> StoreResult<()>;

    /// Last-modified timestamp of the object at `key`.
    ///
    /// # Errors
    ///
    /// `StoreError::NotFound` when the key is absent.
    fn last_modified(&self, key: &str) -> StoreResult<DateTime<Utc>>;

    /// List every object whose key starts with `prefix`.
    ///
    /// The sequence is lazy and finite, and is not restartable once
    /// iteration has begun.
    fn list(
        &self,
        prefix: &str,
    ) -> StoreResult<Box<dyn Iterator<Item = StoreResult<RemoteObject>> + Send>>;
}
