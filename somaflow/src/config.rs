//! Startup configuration.
//!
//! The configuration is built once in `main`, validated, and then passed by
//! reference into every stage builder. Nothing reads it from the environment.

use crate::errors::PipelineError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default remote location of the reference genome.
pub const DEFAULT_REFERENCE_URL: &str =
    "https://hgdownload.soe.ucsc.edu/goldenPath/hg38/bigZips/hg38.fa.gz";

/// Default memory budget handed to the sort and variant-calling tools.
pub const DEFAULT_MEMORY_GB: u32 = 16;

/// Capacity of the duplicate marker's overflow list.
pub const DEFAULT_OVERFLOW_LIST_SIZE: u64 = 600_000;

/// Capacity of the duplicate marker's hash table.
pub const DEFAULT_HASH_TABLE_SIZE: u64 = 500_000;

/// Programs used for each external collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolPrograms {
    /// Downloader for the reference archive.
    pub downloader: String,
    /// Decompressor for the reference archive.
    pub decompressor: String,
    /// Short-read aligner (also builds the aligner index).
    pub aligner: String,
    /// SAM to BAM converter and FASTA indexer.
    pub converter: String,
    /// Sort, index, merge and duplicate marking.
    pub bam_tool: String,
    /// Somatic workflow configuration script.
    pub workflow_configurator: String,
}

impl Default for ToolPrograms {
    fn default() -> Self {
        Self {
            downloader: "wget".to_string(),
            decompressor: "gunzip".to_string(),
            aligner: "bwa".to_string(),
            converter: "samtools".to_string(),
            bam_tool: "sambamba".to_string(),
            workflow_configurator: "configureStrelkaSomaticWorkflow.py".to_string(),
        }
    }
}

impl ToolPrograms {
    fn entries(&self) -> [(&'static str, &str); 6] {
        [
            ("downloader", &self.downloader),
            ("decompressor", &self.decompressor),
            ("aligner", &self.aligner),
            ("converter", &self.converter),
            ("bam_tool", &self.bam_tool),
            ("workflow_configurator", &self.workflow_configurator),
        ]
    }
}

/// Naming convention for paired read files.
///
/// A first-mate file looks like `<read-group><separator><first_marker>.<ext>`
/// for one of the configured extensions, e.g. `s1.R1.fastq.gz`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MateConvention {
    /// Marker of the first mate.
    pub first_marker: String,
    /// Marker of the second mate.
    pub second_marker: String,
    /// Separator placed between the read-group id and the marker.
    pub separator: String,
    /// Accepted file extensions, without a leading dot.
    pub extensions: Vec<String>,
}

impl Default for MateConvention {
    fn default() -> Self {
        Self {
            first_marker: "R1".to_string(),
            second_marker: "R2".to_string(),
            separator: ".".to_string(),
            extensions: vec!["fastq.gz".to_string(), "fq.gz".to_string()],
        }
    }
}

/// Immutable configuration for one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Degree of parallelism handed to every tool.
    pub processors: usize,
    /// Memory budget in GiB for sorting and variant calling.
    pub memory_gb: u32,
    /// Remote location of the gzip-compressed reference FASTA.
    pub reference_url: String,
    /// Local directory holding the reference and its indexes.
    pub reference_dir: PathBuf,
    /// Directory where all intermediate and final artifacts are written.
    pub work_dir: PathBuf,
    /// Run directory of the somatic workflow, relative to `work_dir`.
    pub workflow_dir: String,
    /// Overflow list capacity for duplicate marking.
    pub overflow_list_size: u64,
    /// Hash table capacity for duplicate marking.
    pub hash_table_size: u64,
    /// Read file naming convention.
    pub mates: MateConvention,
    /// External programs.
    pub tools: ToolPrograms,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        let processors = std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get);

        Self {
            processors,
            memory_gb: DEFAULT_MEMORY_GB,
            reference_url: DEFAULT_REFERENCE_URL.to_string(),
            reference_dir: PathBuf::from("reference"),
            work_dir: PathBuf::from("."),
            workflow_dir: "strelka_somatic".to_string(),
            overflow_list_size: DEFAULT_OVERFLOW_LIST_SIZE,
            hash_table_size: DEFAULT_HASH_TABLE_SIZE,
            mates: MateConvention::default(),
            tools: ToolPrograms::default(),
        }
    }
}

impl PipelineConfig {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the parallelism degree.
    #[must_use]
    pub fn with_processors(mut self, processors: usize) -> Self {
        self.processors = processors;
        self
    }

    /// Sets the memory budget.
    #[must_use]
    pub fn with_memory_gb(mut self, memory_gb: u32) -> Self {
        self.memory_gb = memory_gb;
        self
    }

    /// Sets the working directory.
    #[must_use]
    pub fn with_work_dir(mut self, work_dir: impl Into<PathBuf>) -> Self {
        self.work_dir = work_dir.into();
        self
    }

    /// Sets the reference directory.
    #[must_use]
    pub fn with_reference_dir(mut self, reference_dir: impl Into<PathBuf>) -> Self {
        self.reference_dir = reference_dir.into();
        self
    }

    /// Sets the external programs.
    #[must_use]
    pub fn with_tools(mut self, tools: ToolPrograms) -> Self {
        self.tools = tools;
        self
    }

    /// File name of the uncompressed reference, derived from the URL.
    #[must_use]
    pub fn reference_file_name(&self) -> String {
        let last = self
            .reference_url
            .rsplit('/')
            .next()
            .filter(|s| !s.is_empty())
            .unwrap_or("reference.fa.gz");
        last.strip_suffix(".gz").unwrap_or(last).to_string()
    }

    /// Path of the uncompressed reference FASTA.
    #[must_use]
    pub fn reference_fasta(&self) -> PathBuf {
        self.reference_dir.join(self.reference_file_name())
    }

    /// Resolves a file name against the working directory.
    #[must_use]
    pub fn work_path(&self, name: impl AsRef<Path>) -> PathBuf {
        self.work_dir.join(name)
    }

    /// Checks that the configuration can drive the tools.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::Config` describing the first bad field.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.processors == 0 {
            return Err(PipelineError::Config("processors must be at least 1".to_string()));
        }
        if self.memory_gb == 0 {
            return Err(PipelineError::Config("memory_gb must be at least 1".to_string()));
        }
        if self.mates.first_marker == self.mates.second_marker {
            return Err(PipelineError::Config(format!(
                "mate markers must differ (both are '{}')",
                self.mates.first_marker
            )));
        }
        if self.mates.extensions.is_empty() {
            return Err(PipelineError::Config("at least one read extension is required".to_string()));
        }
        if let Some((name, _)) = self.tools.entries().into_iter().find(|(_, p)| p.trim().is_empty()) {
            return Err(PipelineError::Config(format!("tool program '{name}' is empty")));
        }
        Ok(())
    }
}
