//! Registry configuration.

/// Default name of the distributed lock serializing gem uploads.
///
/// Every instance sharing one remote store must agree on this name; the
/// default only changes when several logical registries share one lock
/// backend.
pub const DEFAULT_UPLOAD_LOCK_NAME: &str = "gemdock-upload";

/// Configuration for a [`GemRegistry`](crate::registry::GemRegistry).
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Name of the distributed lock held around create-and-push sequences.
    pub upload_lock_name: String,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            upload_lock_name: DEFAULT_UPLOAD_LOCK_NAME.to_string(),
        }
    }
}

impl RegistryConfig {
    /// Create a config with the documented defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the upload lock name.
    pub fn with_upload_lock_name(mut self, name: impl Into<String>) -> Self {
        self.upload_lock_name = name.into();
        self
    }
}
