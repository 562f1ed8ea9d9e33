//! In-memory object store.
//!
//! A `BTreeMap`-backed implementation of [`ObjectStore`] used by the test
//! suite and embeddable for single-node deployments. Every write records a
//! fresh last-modified timestamp, matching the behavior of real object
//! storage backends; listings come back in key order.

use std::collections::BTreeMap;
use std::io::{Cursor, Read};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use super::error::{StoreError, StoreResult};
use super::{ObjectStore, RemoteObject};

/// A stored object and its write timestamp.
#[derive(Debug, Clone)]
struct Entry {
    content: Vec<u8>,
    last_modified: DateTime<Utc>,
}

/// In-memory [`ObjectStore`] implementation.
///
/// Reads return an owned snapshot of the object, so a concurrent overwrite
/// never tears an in-flight stream. Listing snapshots the matching keys up
/// front; objects written after iteration begins are not observed.
#[derive(Debug, Default)]
pub struct MemoryStore {
    objects: RwLock<BTreeMap<String, Entry>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of objects currently stored, across all namespaces.
    pub fn object_count(&self) -> usize {
        self.objects.read().len()
    }
}

impl ObjectStore for MemoryStore {
    fn exists(&self, key: &str) -> StoreResult<bool> {
        Ok(self.objects.read().contains_key(key))
    }

    fn read(&self, key: &str) -> StoreResult<Box<dyn Read + Send>> {
        let objects = self.objects.read();
        let entry = objects
            .get(key)
            .ok_or_else(|| StoreError::NotFound(key.to_string()))?;
        Ok(Box::new(Cursor::new(entry.content.clone())))
    }

    fn write(&self, key: &str, content: &[u8]) -> StoreResult<()> {
        self.objects.write().insert(
            key.to_string(),
            Entry {
                content: content.to_vec(),
                last_modified: Utc::now(),
            },
        );
        Ok(())
    }

    fn delete(&self, key: &str) -> StoreResult<()> {
        self.objects.write().remove(key);
        Ok(())
    }

    fn last_modified(&self, key: &str) -> StoreResult<DateTime<Utc>> {
        self.objects
            .read()
            .get(key)
            .map(|entry| entry.last_modified)
            .ok_or_else(|| StoreError::NotFound(key.to_string()))
    }

    fn list(
        &self,
        prefix: &str,
    ) -> StoreResult<Box<dyn Iterator<Item = StoreResult<RemoteObject>> + Send>> {
        let snapshot: Vec<RemoteObject> = self
            .objects
            .read()
            .range(prefix.to_string()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, entry)| RemoteObject {
                key: key.clone(),
                content_length: entry.content.len() as u64,
            })
            .collect();
        Ok(Box::new(snapshot.into_iter().map(Ok)))
    }
}
