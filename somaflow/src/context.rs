//! Run identity and event context.

use crate::events::{EventSink, NoOpEventSink};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Identifies one invocation of the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunIdentity {
    /// The unique ID for this run.
    pub run_id: Uuid,
    /// When the run started.
    pub started_at: DateTime<Utc>,
}

impl RunIdentity {
    /// Creates a new run identity with a generated ID.
    #[must_use]
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
        }
    }
}

impl Default for RunIdentity {
    fn default() -> Self {
        Self::new()
    }
}

/// Context shared by every stage of a run.
pub struct RunContext {
    identity: RunIdentity,
    event_sink: Arc<dyn EventSink>,
}

impl fmt::Debug for RunContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunContext")
            .field("identity", &self.identity)
            .finish_non_exhaustive()
    }
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new(RunIdentity::new())
    }
}

impl RunContext {
    /// Creates a context that discards events.
    #[must_use]
    pub fn new(identity: RunIdentity) -> Self {
        Self {
            identity,
            event_sink: Arc::new(NoOpEventSink),
        }
    }

    /// Sets the event sink.
    #[must_use]
    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.event_sink = sink;
        self
    }

    /// Returns the run identity.
    #[must_use]
    pub const fn identity(&self) -> &RunIdentity {
        &self.identity
    }

    /// Emits an event, adding the run ID to object payloads.
    pub fn emit_event(&self, event_type: &str, data: Option<serde_json::Value>) {
        let mut enriched = data.unwrap_or_else(|| serde_json::json!({}));
        if let serde_json::Value::Object(ref mut map) = enriched {
            map.insert(
                "run_id".to_string(),
                serde_json::json!(self.identity.run_id.to_string()),
            );
        }
        self.event_sink.emit(event_type, Some(enriched));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::CollectingEventSink;

    #[test]
    fn test_identities_are_unique() {
        assert_ne!(RunIdentity::new().run_id, RunIdentity::new().run_id);
    }

    #[test]
    fn test_events_carry_run_id() {
        let sink = Arc::new(CollectingEventSink::new());
        let identity = RunIdentity::new();
        let expected = identity.run_id.to_string();
        let ctx = RunContext::new(identity).with_event_sink(sink.clone());

        ctx.emit_event("stage.started", Some(serde_json::json!({"stage": "align:s1"})));
        ctx.emit_event("pipeline.completed", None);

        let events = sink.events();
        assert_eq!(events.len(), 2);
        for (_, data) in events {
            let data = data.unwrap();
            assert_eq!(data["run_id"], serde_json::json!(expected));
        }
    }
}
