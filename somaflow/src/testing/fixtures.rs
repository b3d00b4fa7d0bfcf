//! Test fixtures.

use crate::config::PipelineConfig;
use crate::store::InMemoryArtifactStore;
use std::path::Path;

/// Directory of the normal cohort's read files in fixtures.
pub const NORMAL_DIR: &str = "/data/normal";

/// Directory of the tumor cohort's read files in fixtures.
pub const TUMOR_DIR: &str = "/data/tumor";

/// A configuration with fixed paths and parallelism.
#[must_use]
pub fn test_config() -> PipelineConfig {
    PipelineConfig::default()
        .with_processors(4)
        .with_memory_gb(8)
        .with_reference_dir("/refs")
        .with_work_dir("/work")
}

/// Writes `<rg>.R1.fastq.gz` and `<rg>.R2.fastq.gz` into `dir` for each
/// read group.
pub fn seed_read_pairs(store: &InMemoryArtifactStore, dir: impl AsRef<Path>, read_groups: &[&str]) {
    for rg in read_groups {
        for mate in ["R1", "R2"] {
            store.put(dir.as_ref().join(format!("{rg}.{mate}.fastq.gz")), 4096);
        }
    }
}
