//! Filesystem-backed artifact store.

use super::ArtifactStore;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// The production store: plain files on local disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsArtifactStore;

impl FsArtifactStore {
    /// Creates a new filesystem store.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl ArtifactStore for FsArtifactStore {
    fn size(&self, path: &Path) -> io::Result<Option<u64>> {
        match fs::metadata(path) {
            Ok(meta) if meta.is_file() => Ok(Some(meta.len())),
            Ok(_) => Ok(None),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn list(&self, dir: &Path) -> io::Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            // metadata() follows symlinks, so linked read files are listed too
            if fs::metadata(&path).map(|m| m.is_file()).unwrap_or(false) {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        fs::rename(from, to)
    }

    fn create_dir_all(&self, dir: &Path) -> io::Result<()> {
        fs::create_dir_all(dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_size_of_missing_and_empty_files() {
        let dir = TempDir::new().unwrap();
        let store = FsArtifactStore::new();
        let path = dir.path().join("s1.bam");

        assert_eq!(store.size(&path).unwrap(), None);

        fs::write(&path, b"").unwrap();
        assert_eq!(store.size(&path).unwrap(), Some(0));

        fs::write(&path, b"BAM\x01").unwrap();
        assert_eq!(store.size(&path).unwrap(), Some(4));
    }

    #[test]
    fn test_directory_is_not_an_artifact() {
        let dir = TempDir::new().unwrap();
        let store = FsArtifactStore::new();
        fs::create_dir(dir.path().join("strelka_somatic")).unwrap();

        assert_eq!(store.size(&dir.path().join("strelka_somatic")).unwrap(), None);
    }

    #[test]
    fn test_list_returns_sorted_files_only() {
        let dir = TempDir::new().unwrap();
        let store = FsArtifactStore::new();
        fs::write(dir.path().join("b.fastq.gz"), b"x").unwrap();
        fs::write(dir.path().join("a.fastq.gz"), b"x").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();

        let listed = store.list(dir.path()).unwrap();
        assert_eq!(
            listed,
            vec![dir.path().join("a.fastq.gz"), dir.path().join("b.fastq.gz")]
        );
    }

    #[test]
    fn test_rename_replaces_target() {
        let dir = TempDir::new().unwrap();
        let store = FsArtifactStore::new();
        let staging = dir.path().join("s1.bam.partial");
        let target = dir.path().join("s1.bam");
        fs::write(&staging, b"new").unwrap();
        fs::write(&target, b"").unwrap();

        store.rename(&staging, &target).unwrap();

        assert_eq!(fs::read(&target).unwrap(), b"new");
        assert!(!staging.exists());
    }
}
