//! The idempotency gate.
//!
//! A stage is skipped iff its declared output exists with a non-zero size.
//! The check is re-run against the store every time; nothing is cached, so
//! an artifact deleted by hand between two stages is rebuilt.

use super::ArtifactStore;
use crate::core::Artifact;
use std::io;

/// Result of checking an output artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// No file at the artifact path.
    Absent,
    /// A zero-byte file, typically left by an interrupted run.
    Empty,
    /// A non-empty file; the stage can be skipped.
    Complete {
        /// Size in bytes.
        size: u64,
    },
}

impl GateDecision {
    /// Returns true if the stage producing the artifact has to run.
    #[must_use]
    pub const fn should_run(self) -> bool {
        !matches!(self, Self::Complete { .. })
    }
}

/// Inspects `artifact` in `store`.
///
/// # Errors
///
/// Returns the underlying IO error if the store cannot be queried.
pub fn check_gate(store: &dyn ArtifactStore, artifact: &Artifact) -> io::Result<GateDecision> {
    Ok(match store.size(artifact.path())? {
        None => GateDecision::Absent,
        Some(0) => GateDecision::Empty,
        Some(size) => GateDecision::Complete { size },
    })
}

/// Returns true if the stage producing `artifact` has to run.
///
/// # Errors
///
/// Returns the underlying IO error if the store cannot be queried.
pub fn should_run(store: &dyn ArtifactStore, artifact: &Artifact) -> io::Result<bool> {
    Ok(check_gate(store, artifact)?.should_run())
}

/// Returns true if `artifact` exists with a non-zero size.
///
/// # Errors
///
/// Returns the underlying IO error if the store cannot be queried.
pub fn is_complete(store: &dyn ArtifactStore, artifact: &Artifact) -> io::Result<bool> {
    Ok(!should_run(store, artifact)?)
}
