//! Stage descriptors and the builders that produce them.
//!
//! A stage is pure data: a name, the artifacts it reads, the artifact it
//! declares as output and the invocations that produce it. The driver owns
//! gating and execution, so every builder here is a plain function of the
//! configuration and the resolved inputs.

mod alignment;
mod consolidation;
mod reference;
mod variants;

pub use alignment::{alignment_stage, alignment_stages, unsorted_artifact};
pub use consolidation::{consolidation_stages, final_artifact, merged_artifact, unsorted_inputs};
pub use reference::reference_stages;
pub use variants::variant_calling_stages;

use crate::core::{Artifact, StageKind};
use crate::process::Invocation;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One step of the pipeline plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageDescriptor {
    /// Unique stage name, e.g. `align:normal:s1`.
    pub name: String,
    /// What the stage does.
    pub kind: StageKind,
    /// Artifacts that must be complete before the stage runs.
    pub inputs: Vec<Artifact>,
    /// The declared output. `None` means the stage always runs.
    pub output: Option<Artifact>,
    /// True if the tools write to the output's staging path, which the
    /// executor then renames onto the output.
    pub staged: bool,
    /// Directories created before the tools run.
    pub directories: Vec<PathBuf>,
    /// Invocations run in order.
    pub invocations: Vec<Invocation>,
}

impl StageDescriptor {
    /// Creates a descriptor with no inputs, output or invocations.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: StageKind) -> Self {
        Self {
            name: name.into(),
            kind,
            inputs: Vec::new(),
            output: None,
            staged: false,
            directories: Vec::new(),
            invocations: Vec::new(),
        }
    }

    /// Adds an input artifact.
    #[must_use]
    pub fn input(mut self, artifact: Artifact) -> Self {
        self.inputs.push(artifact);
        self
    }

    /// Adds several input artifacts.
    #[must_use]
    pub fn inputs(mut self, artifacts: impl IntoIterator<Item = Artifact>) -> Self {
        self.inputs.extend(artifacts);
        self
    }

    /// Declares the output artifact, written in place by the tools.
    #[must_use]
    pub fn output(mut self, artifact: Artifact) -> Self {
        self.output = Some(artifact);
        self
    }

    /// Declares the output artifact, written to its staging path.
    #[must_use]
    pub fn staged_output(mut self, artifact: Artifact) -> Self {
        self.output = Some(artifact);
        self.staged = true;
        self
    }

    /// Adds a directory to create before running.
    #[must_use]
    pub fn directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.directories.push(dir.into());
        self
    }

    /// Appends an invocation.
    #[must_use]
    pub fn invocation(mut self, invocation: Invocation) -> Self {
        self.invocations.push(invocation);
        self
    }

    /// Returns true if the idempotency gate applies to this stage.
    #[must_use]
    pub const fn is_gated(&self) -> bool {
        self.output.is_some()
    }
}
