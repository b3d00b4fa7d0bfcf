//! # Somaflow
//!
//! Idempotent staged orchestration of a tumor/normal somatic variant calling
//! pipeline.
//!
//! Somaflow drives external tools through a fixed sequence of stages:
//!
//! - **Reference preparation**: download, decompress and index the genome
//! - **Alignment**: one unsorted BAM per read pair of each cohort
//! - **Consolidation**: sort, index, merge and mark duplicates per cohort
//! - **Variant calling**: configure and run the somatic workflow
//!
//! Every stage with a declared output is skipped when that output already
//! exists with a non-zero size, so an interrupted run resumes at the first
//! incomplete artifact.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use somaflow::prelude::*;
//! use std::sync::Arc;
//!
//! let driver = Driver::new(
//!     PipelineConfig::default(),
//!     Arc::new(FsArtifactStore::new()),
//!     Arc::new(TokioProcessRunner::new()),
//! );
//! let report = driver
//!     .run(&Cohort::normal("reads/normal", "s"), &Cohort::tumor("reads/tumor", "t"))
//!     .await?;
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, missing_docs, rust_2018_idioms)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod config;
pub mod context;
pub mod core;
pub mod errors;
pub mod events;
pub mod inputs;
pub mod logging;
pub mod pipeline;
pub mod process;
pub mod stages;
pub mod store;
pub mod testing;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{MateConvention, PipelineConfig, ToolPrograms};
    pub use crate::context::{RunContext, RunIdentity};
    pub use crate::core::{Artifact, Phase, StageKind, StageOutcome, StageStatus};
    pub use crate::errors::{
        ContractErrorInfo, InputIntegrityError, MissingArtifactError, PipelineError,
        PipelineValidationError, ToolError,
    };
    pub use crate::events::{EventSink, LoggingEventSink, NoOpEventSink};
    pub use crate::inputs::{Cohort, ReadPair, ReadPairSource};
    pub use crate::pipeline::{Driver, PipelinePlan, RunReport};
    pub use crate::process::{Invocation, ProcessRunner, StageExecutor, TokioProcessRunner};
    pub use crate::stages::StageDescriptor;
    pub use crate::store::{ArtifactStore, FsArtifactStore, InMemoryArtifactStore};
}
