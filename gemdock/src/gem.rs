//! Gem file payloads and naming conventions.
//!
//! This module is the single source of truth for how gem files are named and
//! addressed inside the registry:
//!
//! - `GemFile`: an immutable gem payload (file name + raw bytes)
//! - Path references: registry-relative paths identifying a gem
//!   (e.g. `gems/rack-2.2.4.gem`)
//! - Filename parsing: splitting `rack-2.2.4.gem` into a gem name and a
//!   semantic version
//!
//! All other modules should use these helpers rather than constructing names
//! directly, so the registry and the local store agree on addressing.

use std::path::PathBuf;

use bytes::Bytes;
use semver::Version;

/// Registry subdirectory holding gem files.
const GEMS_DIR: &str = "gems";

/// Filename extension for gem files.
const GEM_EXTENSION: &str = ".gem";

/// An immutable gem payload.
///
/// The registry only moves these bytes between the local store and the remote
/// object store; it never inspects or rewrites them. The payload is a
/// [`Bytes`] so clones are cheap reference bumps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GemFile {
    /// File name of the gem (e.g. `rack-2.2.4.gem`).
    name: String,

    /// Raw gem bytes.
    content: Bytes,
}

impl GemFile {
    /// Create a gem file from a name and its raw content.
    pub fn new(name: impl Into<String>, content: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }

    /// File name of the gem (e.g. `rack-2.2.4.gem`).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Raw gem bytes.
    pub fn content(&self) -> &[u8] {
        &self.content
    }

    /// Size of the payload in bytes.
    pub fn len(&self) -> usize {
        self.content.len()
    }

    /// Whether the payload is empty.
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Registry-relative path reference for this gem.
    pub fn path_ref(&self) -> PathBuf {
        gem_path_ref(&self.name)
    }
}

/// Registry-relative path reference for a gem file name.
///
/// # Examples
///
/// ```
/// use gemdock::gem::gem_path_ref;
///
/// assert_eq!(gem_path_ref("rack-2.2.4.gem"), std::path::PathBuf::from("gems/rack-2.2.4.gem"));
/// ```
pub fn gem_path_ref(name: &str) -> PathBuf {
    PathBuf::from(GEMS_DIR).join(name)
}

/// Parse a gem file name into its gem name and version.
///
/// Gem names may themselves contain hyphens (`rack-test`), so the split point
/// is the last hyphen whose remainder parses as a semantic version.
///
/// Returns `None` when the name has no `.gem` extension or no parseable
/// version component.
///
/// # Examples
///
/// ```
/// use semver::Version;
/// use gemdock::gem::parse_gem_filename;
///
/// assert_eq!(
///     parse_gem_filename("rack-2.2.4.gem"),
///     Some(("rack".to_string(), Version::new(2, 2, 4)))
/// );
/// assert_eq!(
///     parse_gem_filename("rack-test-0.8.3.gem"),
///     Some(("rack-test".to_string(), Version::new(0, 8, 3)))
/// );
/// assert_eq!(parse_gem_filename("rack.gem"), None);
/// ```
pub fn parse_gem_filename(filename: &str) -> Option<(String, Version)> {
    let stem = filename.strip_suffix(GEM_EXTENSION)?;

    // Walk hyphens right-to-left so multi-hyphen gem names resolve to the
    // longest name with a valid trailing version.
    for (idx, _) in stem.match_indices('-').rev() {
        let (name, version) = (&stem[..idx], &stem[idx + 1..]);
        if name.is_empty() {
            continue;
        }
        if let Ok(version) = Version::parse(version) {
            return Some((name.to_string(), version));
        }
    }

    None
}

/// Format a gem name and version back into a gem file name.
///
/// Inverse of [`parse_gem_filename`].
pub fn gem_filename(name: &str, version: &Version) -> String {
    format!("{}-{}{}", name, version, GEM_EXTENSION)
}
