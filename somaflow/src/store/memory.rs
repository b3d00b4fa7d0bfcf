//! In-memory artifact store for tests.

use super::ArtifactStore;
use parking_lot::Mutex;
use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Artifact store backed by a map of path to size.
///
/// Clones share the same contents, so a test can hand one clone to the
/// driver and keep another to inspect the result.
#[derive(Debug, Clone, Default)]
pub struct InMemoryArtifactStore {
    files: Arc<Mutex<BTreeMap<PathBuf, u64>>>,
    dirs: Arc<Mutex<BTreeSet<PathBuf>>>,
}

impl InMemoryArtifactStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates or replaces a file of the given size.
    pub fn put(&self, path: impl Into<PathBuf>, size: u64) {
        self.files.lock().insert(path.into(), size);
    }

    /// Removes a file, returning its size if it existed.
    pub fn remove(&self, path: impl AsRef<Path>) -> Option<u64> {
        self.files.lock().remove(path.as_ref())
    }

    /// Returns the size of a file without going through the trait.
    #[must_use]
    pub fn get(&self, path: impl AsRef<Path>) -> Option<u64> {
        self.files.lock().get(path.as_ref()).copied()
    }

    /// Returns true if a directory was created through the store.
    #[must_use]
    pub fn has_dir(&self, path: impl AsRef<Path>) -> bool {
        self.dirs.lock().contains(path.as_ref())
    }

    /// Returns every stored file path.
    #[must_use]
    pub fn paths(&self) -> Vec<PathBuf> {
        self.files.lock().keys().cloned().collect()
    }

    /// Returns the number of files.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.lock().len()
    }

    /// Returns true if the store holds no files.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.lock().is_empty()
    }
}

impl ArtifactStore for InMemoryArtifactStore {
    fn size(&self, path: &Path) -> io::Result<Option<u64>> {
        Ok(self.files.lock().get(path).copied())
    }

    fn list(&self, dir: &Path) -> io::Result<Vec<PathBuf>> {
        Ok(self
            .files
            .lock()
            .keys()
            .filter(|p| p.parent() == Some(dir))
            .cloned()
            .collect())
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        let mut files = self.files.lock();
        let size = files.remove(from).ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("{} does not exist", from.display()))
        })?;
        files.insert(to.to_path_buf(), size);
        Ok(())
    }

    fn create_dir_all(&self, dir: &Path) -> io::Result<()> {
        let mut dirs = self.dirs.lock();
        for ancestor in dir.ancestors().filter(|a| !a.as_os_str().is_empty()) {
            dirs.insert(ancestor.to_path_buf());
        }
        Ok(())
    }
}
