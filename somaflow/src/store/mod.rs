//! Artifact storage and the idempotency gate.
//!
//! The filesystem is the only persisted state of a pipeline run. Stages ask
//! the store whether their declared output is already complete and skip
//! themselves if it is. The [`ArtifactStore`] trait keeps that question
//! answerable by an in-memory fake in tests.

mod fs;
mod gate;
mod memory;

pub use fs::FsArtifactStore;
pub use gate::{check_gate, is_complete, should_run, GateDecision};
pub use memory::InMemoryArtifactStore;

use std::fmt::Debug;
use std::io;
use std::path::{Path, PathBuf};

/// Capabilities the orchestrator needs from durable storage.
pub trait ArtifactStore: Send + Sync + Debug {
    /// Returns the size of the file at `path`, or `None` if it does not exist.
    fn size(&self, path: &Path) -> io::Result<Option<u64>>;

    /// Lists the regular files directly inside `dir`, sorted by path.
    fn list(&self, dir: &Path) -> io::Result<Vec<PathBuf>>;

    /// Atomically moves `from` onto `to`, replacing any existing file.
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;

    /// Creates `dir` and all of its parents.
    fn create_dir_all(&self, dir: &Path) -> io::Result<()>;

    /// Returns true if a file exists at `path`, whatever its size.
    fn exists(&self, path: &Path) -> io::Result<bool> {
        Ok(self.size(path)?.is_some())
    }
}
