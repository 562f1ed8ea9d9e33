//! Upload locking.
//!
//! Mutating the shared remote store (gem upload plus the metadata push that
//! follows it) must be serialized across every server instance. The
//! [`UploadLock`] trait is that contract: a blocking, name-keyed critical
//! section entry implementable atop any cross-process mutual-exclusion
//! primitive — a file lock, a database row lock, a lease service. No backend
//! is hard-wired; the embedding server injects one.
//!
//! Acquisition returns an opaque [`LockGuard`]. Dropping the guard releases
//! the lock, so release happens on every exit path, error or not.
//!
//! [`NamedLock`] is the bundled in-process implementation, sufficient for a
//! single-process deployment and for tests.

use std::any::Any;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use parking_lot::{Condvar, Mutex};

/// Result type for lock operations.
pub type LockResult<T> = Result<T, LockError>;

/// Errors that can occur acquiring a lock.
#[derive(Debug)]
pub enum LockError {
    /// The lock backend failed (lost lease, unreachable coordinator, ...).
    Backend(String),
}

impl fmt::Display for LockError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LockError::Backend(msg) => write!(f, "lock backend failure: {}", msg),
        }
    }
}

impl std::error::Error for LockError {}

/// Opaque hold on a named lock.
///
/// The guard owns whatever backend state represents the acquisition; dropping
/// it releases the lock.
pub struct LockGuard {
    _token: Box<dyn Any + Send>,
}

impl LockGuard {
    /// Wrap a backend's release token into an opaque guard.
    pub fn new(token: impl Any + Send) -> Self {
        Self {
            _token: Box::new(token),
        }
    }
}

impl fmt::Debug for LockGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LockGuard").finish_non_exhaustive()
    }
}

/// Cross-process mutual exclusion keyed by name.
pub trait UploadLock: Send + Sync {
    /// Block until the named lock is held, then return its guard.
    fn acquire(&self, name: &str) -> LockResult<LockGuard>;
}

/// Shared state of a [`NamedLock`]: the set of currently held names.
#[derive(Default)]
struct NamedLockState {
    held: Mutex<HashSet<String>>,
    released: Condvar,
}

/// In-process [`UploadLock`] implementation.
///
/// Tracks held names in a mutex-guarded set; acquirers of a held name wait on
/// a condvar until the holder's guard drops. Clones share the same state, so
/// one `NamedLock` handed to several components still serializes them.
///
/// Only correct within a single process. Multi-instance deployments inject a
/// cross-process backend instead.
#[derive(Clone, Default)]
pub struct NamedLock {
    state: Arc<NamedLockState>,
}

impl NamedLock {
    /// Create a lock with no held names.
    pub fn new() -> Self {
        Self::default()
    }
}

impl UploadLock for NamedLock {
    fn acquire(&self, name: &str) -> LockResult<LockGuard> {
        let mut held = self.state.held.lock();
        while held.contains(name) {
            self.state.released.wait(&mut held);
        }
        held.insert(name.to_string());

        Ok(LockGuard::new(NamedHold {
            state: Arc::clone(&self.state),
            name: name.to_string(),
        }))
    }
}

/// Release token for [`NamedLock`]; removes the name and wakes waiters.
struct NamedHold {
    state: Arc<NamedLockState>,
    name: String,
}

impl Drop for NamedHold {
    fn drop(&mut self) {
        self.state.held.lock().remove(&self.name);
        self.state.released.notify_all();
    }
}
