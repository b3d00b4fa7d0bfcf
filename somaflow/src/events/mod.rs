//! Run lifecycle events.
//!
//! The driver reports every stage transition to an [`EventSink`]. The binary
//! logs them through tracing; tests collect them.

mod sink;

pub use sink::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink, RecordedEvent};

/// Event emitted once before the first stage.
pub const PIPELINE_STARTED: &str = "pipeline.started";
/// Event emitted after the last stage succeeded.
pub const PIPELINE_COMPLETED: &str = "pipeline.completed";
/// Event emitted when a run stops on an error.
pub const PIPELINE_FAILED: &str = "pipeline.failed";
/// Event emitted when a stage's tools are about to run.
pub const STAGE_STARTED: &str = "stage.started";
/// Event emitted when the gate skips a stage.
pub const STAGE_SKIPPED: &str = "stage.skipped";
/// Event emitted when a stage's tools finished and its output is complete.
pub const STAGE_COMPLETED: &str = "stage.completed";
/// Event emitted when a stage fails.
pub const STAGE_FAILED: &str = "stage.failed";
