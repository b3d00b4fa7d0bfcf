//! Cohorts and read pairs.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Label of the normal (germline) cohort.
pub const NORMAL: &str = "normal";

/// Label of the tumor cohort.
pub const TUMOR: &str = "tumor";

/// A sample group defined by a directory and a filename prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cohort {
    /// Label used as sample and library name and as the stem of the
    /// cohort-level artifacts.
    pub label: String,
    /// Directory holding the cohort's read files.
    pub directory: PathBuf,
    /// Prefix every read file of the cohort starts with.
    pub prefix: String,
}

impl Cohort {
    /// Creates a cohort.
    #[must_use]
    pub fn new(label: impl Into<String>, directory: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            directory: directory.into(),
            prefix: prefix.into(),
        }
    }

    /// Creates the normal cohort.
    #[must_use]
    pub fn normal(directory: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self::new(NORMAL, directory, prefix)
    }

    /// Creates the tumor cohort.
    #[must_use]
    pub fn tumor(directory: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self::new(TUMOR, directory, prefix)
    }
}

impl fmt::Display for Cohort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}/{}*)", self.label, self.directory.display(), self.prefix)
    }
}

/// Two mate files of one read group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadPair {
    /// Identifier shared by both mates, derived from the first-mate name.
    pub read_group: String,
    /// First-mate file.
    pub first: PathBuf,
    /// Second-mate file.
    pub second: PathBuf,
}

impl ReadPair {
    /// Creates a read pair.
    #[must_use]
    pub fn new(read_group: impl Into<String>, first: impl Into<PathBuf>, second: impl Into<PathBuf>) -> Self {
        Self {
            read_group: read_group.into(),
            first: first.into(),
            second: second.into(),
        }
    }

    /// The `@RG` header line handed to the aligner, with literal `\t`
    /// separators as the aligner expects on its command line.
    #[must_use]
    pub fn read_group_header(&self, cohort_label: &str) -> String {
        format!(
            "@RG\\tID:{}\\tSM:{cohort_label}\\tLB:{cohort_label}\\tPL:ILLUMINA",
            self.read_group
        )
    }
}
