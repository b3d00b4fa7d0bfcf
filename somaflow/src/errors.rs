//! Error types for the somaflow orchestrator.
//!
//! Every error is fatal for the run: nothing in the orchestrator retries or
//! recovers locally. The taxonomy separates what the operator has to fix
//! (input layout, plan consistency) from what an external tool reported.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use thiserror::Error;

/// The main error type for pipeline operations.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The cohort inputs on disk are inconsistent.
    #[error("{0}")]
    InputIntegrity(#[from] InputIntegrityError),

    /// The stage plan failed validation before execution.
    #[error("{0}")]
    Validation(#[from] PipelineValidationError),

    /// A precursor artifact was missing when its consumer was about to run.
    #[error("{0}")]
    MissingArtifact(#[from] MissingArtifactError),

    /// An external tool could not be started or reported failure.
    #[error("{0}")]
    Tool(#[from] ToolError),

    /// The startup configuration is unusable.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while resolving read pairs for a cohort.
#[derive(Debug, Clone, Error)]
pub enum InputIntegrityError {
    /// A first-mate file has no second-mate partner.
    #[error("Missing second mate for '{}': expected '{}'", first_mate.display(), expected.display())]
    MissingMate {
        /// The first-mate file that was found.
        first_mate: PathBuf,
        /// The second-mate file that should exist next to it.
        expected: PathBuf,
    },

    /// Two first-mate files map to the same read-group identifier.
    #[error("Duplicate read group '{read_group}' in cohort '{cohort}': '{}' and '{}'", first.display(), second.display())]
    DuplicateReadGroup {
        /// The cohort label.
        cohort: String,
        /// The clashing read-group identifier.
        read_group: String,
        /// The first file that produced the identifier.
        first: PathBuf,
        /// The second file that produced the identifier.
        second: PathBuf,
    },

    /// The cohort directory could not be listed.
    #[error("Cannot list input directory '{}': {reason}", directory.display())]
    UnreadableDirectory {
        /// The directory.
        directory: PathBuf,
        /// The underlying reason.
        reason: String,
    },
}

impl InputIntegrityError {
    /// Creates a missing-mate error.
    #[must_use]
    pub fn missing_mate(first_mate: impl Into<PathBuf>, expected: impl Into<PathBuf>) -> Self {
        Self::MissingMate {
            first_mate: first_mate.into(),
            expected: expected.into(),
        }
    }

    /// Creates a duplicate read-group error.
    #[must_use]
    pub fn duplicate_read_group(
        cohort: impl Into<String>,
        read_group: impl Into<String>,
        first: impl Into<PathBuf>,
        second: impl Into<PathBuf>,
    ) -> Self {
        Self::DuplicateReadGroup {
            cohort: cohort.into(),
            read_group: read_group.into(),
            first: first.into(),
            second: second.into(),
        }
    }
}

/// Metadata about a plan validation error for better diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ContractErrorInfo {
    /// Error code (e.g., "PLAN-DUPLICATE-OUTPUT").
    pub code: String,
    /// Short summary of the error.
    pub summary: String,
    /// Hint for fixing the error.
    pub fix_hint: Option<String>,
    /// Additional context key-value pairs.
    #[serde(default)]
    pub context: HashMap<String, String>,
}

impl ContractErrorInfo {
    /// Creates a new contract error info.
    #[must_use]
    pub fn new(code: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            summary: summary.into(),
            fix_hint: None,
            context: HashMap::new(),
        }
    }

    /// Sets the fix hint.
    #[must_use]
    pub fn with_fix_hint(mut self, hint: impl Into<String>) -> Self {
        self.fix_hint = Some(hint.into());
        self
    }

    /// Adds a single context entry.
    #[must_use]
    pub fn with_context_entry(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }
}

/// Error raised when the stage plan is inconsistent.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct PipelineValidationError {
    /// The error message.
    pub message: String,
    /// The stages involved in the error.
    pub stages: Vec<String>,
    /// Optional contract error info.
    pub error_info: Option<ContractErrorInfo>,
}

impl PipelineValidationError {
    /// Creates a new pipeline validation error.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            stages: Vec::new(),
            error_info: None,
        }
    }

    /// Sets the stages involved.
    #[must_use]
    pub fn with_stages(mut self, stages: Vec<String>) -> Self {
        self.stages = stages;
        self
    }

    /// Sets the contract error info.
    #[must_use]
    pub fn with_error_info(mut self, info: ContractErrorInfo) -> Self {
        self.error_info = Some(info);
        self
    }

    /// Returns the error code, if any.
    #[must_use]
    pub fn code(&self) -> Option<&str> {
        self.error_info.as_ref().map(|info| info.code.as_str())
    }
}

/// Error raised when a stage input is not complete at execution time.
#[derive(Debug, Clone, Error)]
#[error("Stage '{stage}' requires '{}' which is missing or empty", artifact.display())]
pub struct MissingArtifactError {
    /// The stage that needed the artifact.
    pub stage: String,
    /// The absent artifact.
    pub artifact: PathBuf,
}

impl MissingArtifactError {
    /// Creates a new missing artifact error.
    #[must_use]
    pub fn new(stage: impl Into<String>, artifact: impl Into<PathBuf>) -> Self {
        Self {
            stage: stage.into(),
            artifact: artifact.into(),
        }
    }
}

/// Errors related to external tool execution.
#[derive(Debug, Clone, Error)]
pub enum ToolError {
    /// The program could not be started.
    #[error("Failed to start '{program}' for stage '{stage}': {reason}")]
    SpawnFailed {
        /// The stage name.
        stage: String,
        /// The program that failed to start.
        program: String,
        /// The reason for failure.
        reason: String,
    },

    /// The program exited unsuccessfully.
    #[error("Stage '{stage}' failed: `{command}` exited with {status}")]
    NonZeroExit {
        /// The stage name.
        stage: String,
        /// The rendered command line.
        command: String,
        /// The exit status description (code or signal).
        status: String,
    },

    /// The tools exited cleanly but the declared output is absent.
    #[error("Stage '{stage}' completed but did not produce '{}'", output.display())]
    OutputNotProduced {
        /// The stage name.
        stage: String,
        /// The declared output artifact.
        output: PathBuf,
    },
}

impl ToolError {
    /// Creates a spawn failure error.
    #[must_use]
    pub fn spawn_failed(
        stage: impl Into<String>,
        program: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::SpawnFailed {
            stage: stage.into(),
            program: program.into(),
            reason: reason.into(),
        }
    }

    /// Creates a non-zero exit error.
    #[must_use]
    pub fn non_zero_exit(
        stage: impl Into<String>,
        command: impl Into<String>,
        status: impl Into<String>,
    ) -> Self {
        Self::NonZeroExit {
            stage: stage.into(),
            command: command.into(),
            status: status.into(),
        }
    }

    /// Creates an output-not-produced error.
    #[must_use]
    pub fn output_not_produced(stage: impl Into<String>, output: impl Into<PathBuf>) -> Self {
        Self::OutputNotProduced {
            stage: stage.into(),
            output: output.into(),
        }
    }

    /// Returns the stage the error belongs to.
    #[must_use]
    pub fn stage(&self) -> &str {
        match self {
            Self::SpawnFailed { stage, .. }
            | Self::NonZeroExit { stage, .. }
            | Self::OutputNotProduced { stage, .. } => stage,
        }
    }
}
