//! The stage executor.

use super::{Invocation, ProcessRunner};
use crate::core::Artifact;
use crate::errors::{PipelineError, ToolError};
use crate::logging::format_duration;
use crate::store::ArtifactStore;
use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Runs the invocations of a stage one after another and times them.
#[derive(Debug, Clone)]
pub struct StageExecutor {
    runner: Arc<dyn ProcessRunner>,
    store: Arc<dyn ArtifactStore>,
}

impl StageExecutor {
    /// Creates an executor over a process runner and the artifact store
    /// staged outputs are published in.
    #[must_use]
    pub fn new(runner: Arc<dyn ProcessRunner>, store: Arc<dyn ArtifactStore>) -> Self {
        Self { runner, store }
    }

    /// Runs one invocation to completion and reports its wall-clock time.
    ///
    /// # Errors
    ///
    /// Returns the runner's `ToolError` unchanged.
    pub async fn execute(&self, stage: &str, invocation: &Invocation) -> Result<Duration, ToolError> {
        info!(stage = %stage, command = %invocation, "Running");
        let start = Instant::now();

        self.runner.run(stage, invocation).await?;

        let elapsed = start.elapsed();
        info!(
            stage = %stage,
            elapsed = %format_duration(elapsed),
            "{} finished",
            invocation.program()
        );
        Ok(elapsed)
    }

    /// Runs `invocations` in order, stopping at the first failure.
    ///
    /// # Errors
    ///
    /// Returns the first `ToolError`; later invocations are not started.
    pub async fn execute_all(&self, stage: &str, invocations: &[Invocation]) -> Result<Duration, ToolError> {
        let mut total = Duration::ZERO;
        for invocation in invocations {
            total += self.execute(stage, invocation).await?;
        }
        Ok(total)
    }

    /// Moves a staged output onto its final path.
    ///
    /// # Errors
    ///
    /// Returns `ToolError::OutputNotProduced` if the tool left nothing at
    /// the staging path, or the IO error of a failed rename.
    pub fn publish(&self, stage: &str, output: &Artifact) -> Result<(), PipelineError> {
        let staging = output.staging_path();
        match self.store.rename(&staging, output.path()) {
            Ok(()) => {
                debug!(stage = %stage, artifact = %output, "Published");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(ToolError::output_not_produced(stage, output.path()).into())
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::MockProcessRunner;
    use crate::store::InMemoryArtifactStore;
    use mockall::Sequence;

    fn executor(mock: MockProcessRunner, store: &InMemoryArtifactStore) -> StageExecutor {
        StageExecutor::new(Arc::new(mock), Arc::new(store.clone()))
    }

    #[tokio::test]
    async fn test_execute_all_runs_in_order() {
        let mut mock = MockProcessRunner::new();
        let mut seq = Sequence::new();
        mock.expect_run()
            .withf(|_, inv| inv.program() == "wget")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));
        mock.expect_run()
            .withf(|_, inv| inv.program() == "gunzip")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));

        let store = InMemoryArtifactStore::new();
        let exec = executor(mock, &store);
        let invocations = [Invocation::new("wget"), Invocation::new("gunzip")];

        exec.execute_all("fetch_reference", &invocations).await.unwrap();
    }

    #[tokio::test]
    async fn test_execute_all_stops_at_first_failure() {
        let mut mock = MockProcessRunner::new();
        mock.expect_run()
            .withf(|_, inv| inv.program() == "wget")
            .times(1)
            .returning(|stage, inv| Err(ToolError::non_zero_exit(stage, inv.command_line(), "exit code 4")));
        mock.expect_run()
            .withf(|_, inv| inv.program() == "gunzip")
            .times(0);

        let store = InMemoryArtifactStore::new();
        let exec = executor(mock, &store);
        let invocations = [Invocation::new("wget"), Invocation::new("gunzip")];

        let err = exec.execute_all("fetch_reference", &invocations).await.unwrap_err();
        assert_eq!(err.stage(), "fetch_reference");
    }

    #[test]
    fn test_publish_moves_staged_output() {
        let store = InMemoryArtifactStore::new();
        store.put("/work/s1.sorted.bam.partial", 12);
        let exec = executor(MockProcessRunner::new(), &store);

        exec.publish("sort:s1", &Artifact::new("/work/s1.sorted.bam")).unwrap();

        assert_eq!(store.get("/work/s1.sorted.bam"), Some(12));
        assert_eq!(store.get("/work/s1.sorted.bam.partial"), None);
    }

    #[test]
    fn test_publish_without_staged_output() {
        let store = InMemoryArtifactStore::new();
        let exec = executor(MockProcessRunner::new(), &store);

        let err = exec.publish("sort:s1", &Artifact::new("/work/s1.sorted.bam")).unwrap_err();
        assert!(matches!(err, PipelineError::Tool(ToolError::OutputNotProduced { .. })));
    }
}
