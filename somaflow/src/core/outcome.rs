//! Per-stage outcome recorded by the driver.

use super::StageStatus;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// What happened to one stage during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageOutcome {
    /// The stage name.
    pub stage: String,
    /// Terminal status.
    pub status: StageStatus,
    /// Wall-clock time spent in the stage's tools.
    pub duration: Duration,
    /// Why the stage was skipped, when it was.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_reason: Option<String>,
}

impl StageOutcome {
    /// Creates a completed outcome.
    #[must_use]
    pub fn completed(stage: impl Into<String>, duration: Duration) -> Self {
        Self {
            stage: stage.into(),
            status: StageStatus::Completed,
            duration,
            skip_reason: None,
        }
    }

    /// Creates a skipped outcome.
    #[must_use]
    pub fn skipped(stage: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            stage: stage.into(),
            status: StageStatus::Skipped,
            duration: Duration::ZERO,
            skip_reason: Some(reason.into()),
        }
    }

    /// Returns true if tools ran for this stage.
    #[must_use]
    pub fn ran(&self) -> bool {
        self.status == StageStatus::Completed
    }
}
