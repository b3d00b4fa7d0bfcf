//! Artifact naming.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Suffix appended to an artifact path while a tool is still writing it.
pub const STAGING_SUFFIX: &str = ".partial";

/// Suffix of a BAM companion index.
pub const INDEX_SUFFIX: &str = ".bai";

/// Processing phase of an alignment artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Per-pair output of the aligner.
    Unsorted,
    /// Coordinate-sorted per-pair artifact.
    Sorted,
    /// All sorted artifacts of a cohort combined.
    Merged,
    /// Merged artifact with duplicates marked.
    Final,
}

impl Phase {
    /// File suffix for the phase.
    #[must_use]
    pub const fn suffix(self) -> &'static str {
        match self {
            Self::Unsorted => ".bam",
            Self::Sorted => ".sorted.bam",
            Self::Merged => ".merged.bam",
            Self::Final => ".final.bam",
        }
    }

    /// Phases produced by consolidation. Files carrying one of these
    /// suffixes are never treated as unsorted inputs.
    pub const CONSOLIDATED: [Self; 3] = [Self::Sorted, Self::Merged, Self::Final];

    /// Returns true if `file_name` carries the suffix of a consolidated phase.
    #[must_use]
    pub fn is_consolidated_name(file_name: &str) -> bool {
        Self::CONSOLIDATED
            .iter()
            .any(|phase| file_name.ends_with(phase.suffix()))
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unsorted => write!(f, "unsorted"),
            Self::Sorted => write!(f, "sorted"),
            Self::Merged => write!(f, "merged"),
            Self::Final => write!(f, "final"),
        }
    }
}

/// A file on durable storage produced or consumed by a stage.
///
/// An artifact counts as complete only when it exists with a non-zero size;
/// the check itself lives in [`crate::store`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Artifact {
    path: PathBuf,
}

impl Artifact {
    /// Wraps an existing path.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Derives `<dir>/<stem><phase suffix>`.
    #[must_use]
    pub fn for_phase(dir: impl AsRef<Path>, stem: &str, phase: Phase) -> Self {
        Self::new(dir.as_ref().join(format!("{stem}{}", phase.suffix())))
    }

    /// The companion index, `<path>.bai`.
    #[must_use]
    pub fn index(&self) -> Self {
        self.suffixed(INDEX_SUFFIX)
    }

    /// A companion file named `<path><suffix>`, e.g. `hg38.fa.fai`.
    #[must_use]
    pub fn suffixed(&self, suffix: &str) -> Self {
        Self::new(append_to_path(&self.path, suffix))
    }

    /// The temporary path a tool writes to before the artifact is published.
    #[must_use]
    pub fn staging_path(&self) -> PathBuf {
        append_to_path(&self.path, STAGING_SUFFIX)
    }

    /// Derives a sibling artifact in another phase from an unsorted one.
    ///
    /// `s1.bam` becomes `s1.sorted.bam` for [`Phase::Sorted`].
    #[must_use]
    pub fn with_phase(&self, phase: Phase) -> Self {
        let name = self.file_name();
        let stem = name.strip_suffix(Phase::Unsorted.suffix()).unwrap_or(&name);
        let dir = self.path.parent().unwrap_or_else(|| Path::new(""));
        Self::for_phase(dir, stem, phase)
    }

    /// The artifact path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The final path component, lossily converted.
    #[must_use]
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

impl fmt::Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

impl AsRef<Path> for Artifact {
    fn as_ref(&self) -> &Path {
        &self.path
    }
}

fn append_to_path(path: &Path, suffix: &str) -> PathBuf {
    let mut os = path.as_os_str().to_owned();
    os.push(suffix);
    PathBuf::from(os)
}
