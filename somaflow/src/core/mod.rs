//! Core domain model types for somaflow.
//!
//! This module contains the fundamental types used throughout the crate:
//! - Artifact naming by processing phase
//! - Stage status and kind enums
//! - Per-stage outcomes

mod artifact;
mod outcome;
mod status;

pub use artifact::{Artifact, Phase, INDEX_SUFFIX, STAGING_SUFFIX};
pub use outcome::StageOutcome;
pub use status::{StageKind, StageStatus};
