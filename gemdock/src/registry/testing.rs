//! Test double for the local gem store collaborator.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use super::error::{RegistryError, RegistryResult};
use super::traits::{LocalStore, ReindexProgress};
use crate::gem::{gem_path_ref, GemFile};

/// Directory-backed [`LocalStore`] used across the unit tests.
///
/// Ingestion is deliberately simple: the gem payload lands under `gems/` and
/// its file name is appended to the `names.list` and `versions.list` text
/// indexes, which is enough to observe "ingestion rewrites indexes" behavior.
pub(crate) struct TempGemStore {
    root: PathBuf,
    update_calls: AtomicUsize,
    reindex_calls: AtomicUsize,
}

impl TempGemStore {
    pub(crate) fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            update_calls: AtomicUsize::new(0),
            reindex_calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn update_calls(&self) -> usize {
        self.update_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn reindex_calls(&self) -> usize {
        self.reindex_calls.load(Ordering::SeqCst)
    }

    fn append_line(&self, index_name: &str, line: &str) -> RegistryResult<()> {
        let path = self.root.join(index_name);
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| RegistryError::WriteFailed {
                path: path.clone(),
                source: e,
            })?;
        writeln!(file, "{}", line).map_err(|e| RegistryError::WriteFailed { path, source: e })
    }
}

impl LocalStore for TempGemStore {
    fn create(&self, gem: &GemFile, overwrite: bool) -> RegistryResult<()> {
        self.prepare_data_folders()?;

        let path = self.local_path(&gem_path_ref(gem.name()));
        if path.exists() && !overwrite {
            return Err(RegistryError::LocalStore(format!(
                "gem already exists: {}",
                gem.name()
            )));
        }
        fs::write(&path, gem.content()).map_err(|e| RegistryError::WriteFailed {
            path: path.clone(),
            source: e,
        })?;

        self.append_line("names.list", gem.name())?;
        self.append_line("versions.list", gem.name())?;
        Ok(())
    }

    fn delete(&self, path_ref: &Path) -> RegistryResult<()> {
        let path = self.local_path(path_ref);
        fs::remove_file(&path).map_err(|e| RegistryError::WriteFailed { path, source: e })
    }

    fn local_path(&self, path_ref: &Path) -> PathBuf {
        self.root.join(path_ref)
    }

    fn update_local_file(&self, _path_ref: &Path) -> RegistryResult<()> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn prepare_data_folders(&self) -> RegistryResult<()> {
        let gems_dir = self.root.join("gems");
        fs::create_dir_all(&gems_dir).map_err(|e| RegistryError::WriteFailed {
            path: gems_dir,
            source: e,
        })
    }

    fn reindex(&self, progress: ReindexProgress<'_>) -> RegistryResult<()> {
        self.reindex_calls.fetch_add(1, Ordering::SeqCst);
        progress("rebuilding catalog indexes");
        Ok(())
    }
}
