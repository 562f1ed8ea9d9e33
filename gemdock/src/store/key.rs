//! Remote key namespaces and path-reference mapping.
//!
//! The remote store is shared by every instance, so keys are partitioned into
//! three fixed namespaces:
//!
//! - `artifacts/` — gem binary content, keyed by full path reference
//! - `metadata/` — the fixed set of catalog index files, keyed by file name
//! - `cache/` — ephemeral cache entries, keyed by basename only
//!
//! The artifact mapping is pure and reversible: a path reference derives
//! exactly one key, and that key derives the path reference back. The cache
//! mapping is one-directional; only the basename of the local file survives.

use std::path::{Component, Path, PathBuf};

/// Namespace prefix for gem binary content.
pub const ARTIFACT_PREFIX: &str = "artifacts/";

/// Namespace prefix for catalog index files.
pub const METADATA_PREFIX: &str = "metadata/";

/// Namespace prefix for ephemeral cache entries.
pub const CACHE_PREFIX: &str = "cache/";

/// Remote key for a gem's binary content.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use gemdock::store::key::artifact_key;
///
/// assert_eq!(artifact_key(Path::new("gems/rack-2.2.4.gem")), "artifacts/gems/rack-2.2.4.gem");
/// ```
pub fn artifact_key(path_ref: &Path) -> String {
    format!("{}{}", ARTIFACT_PREFIX, key_suffix(path_ref))
}

/// Path reference for an artifact-namespace key.
///
/// Inverse of [`artifact_key`]. Returns `None` for keys outside the artifact
/// namespace.
pub fn artifact_path(key: &str) -> Option<PathBuf> {
    key.strip_prefix(ARTIFACT_PREFIX)
        .filter(|suffix| !suffix.is_empty())
        .map(|suffix| suffix.split('/').collect())
}

/// Remote key for a catalog index file name.
pub fn metadata_key(name: &str) -> String {
    format!("{}{}", METADATA_PREFIX, name)
}

/// Remote key for an ephemeral cache entry.
///
/// Only the basename of the local file is used; directory structure does not
/// survive the mapping. Returns `None` when the path has no final component.
pub fn cache_key(path: &Path) -> Option<String> {
    path.file_name()
        .map(|name| format!("{}{}", CACHE_PREFIX, name.to_string_lossy()))
}

/// Normalize a relative path reference into a `/`-separated key suffix.
fn key_suffix(path_ref: &Path) -> String {
    path_ref
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
