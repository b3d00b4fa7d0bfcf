//! Stage status and kind enums.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of work a stage performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    /// Download and decompress the reference sequence.
    FetchReference,
    /// Build an index over the reference sequence.
    IndexReference,
    /// Align one read pair into an unsorted artifact.
    Align,
    /// Coordinate-sort one unsorted artifact.
    Sort,
    /// Build a companion index for a BAM artifact.
    Index,
    /// Combine all sorted artifacts of a cohort.
    Merge,
    /// Mark duplicates in the merged artifact.
    MarkDuplicates,
    /// Configure or run the somatic variant workflow.
    CallVariants,
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FetchReference => write!(f, "fetch_reference"),
            Self::IndexReference => write!(f, "index_reference"),
            Self::Align => write!(f, "align"),
            Self::Sort => write!(f, "sort"),
            Self::Index => write!(f, "index"),
            Self::Merge => write!(f, "merge"),
            Self::MarkDuplicates => write!(f, "mark_duplicates"),
            Self::CallVariants => write!(f, "call_variants"),
        }
    }
}

/// What the driver did with a stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    /// Stage tools ran and the output is complete.
    Completed,
    /// The output was already complete, nothing ran.
    Skipped,
}

impl fmt::Display for StageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Completed => write!(f, "completed"),
            Self::Skipped => write!(f, "skipped"),
        }
    }
}
