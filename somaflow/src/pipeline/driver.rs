//! The pipeline driver.

use super::PipelinePlan;
use crate::config::PipelineConfig;
use crate::context::RunContext;
use crate::core::{StageOutcome, StageStatus};
use crate::errors::{MissingArtifactError, PipelineError, ToolError};
use crate::events::{
    PIPELINE_COMPLETED, PIPELINE_FAILED, PIPELINE_STARTED, STAGE_COMPLETED, STAGE_FAILED, STAGE_SKIPPED,
    STAGE_STARTED,
};
use crate::inputs::Cohort;
use crate::logging::format_duration;
use crate::process::{ProcessRunner, StageExecutor};
use crate::stages::StageDescriptor;
use crate::store::{check_gate, is_complete, ArtifactStore, GateDecision};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};
use uuid::Uuid;

/// Summary of a finished run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    /// The run ID.
    pub run_id: Uuid,
    /// One outcome per stage, in execution order.
    pub outcomes: Vec<StageOutcome>,
    /// Wall-clock time of the whole run.
    pub elapsed: Duration,
}

impl RunReport {
    /// Number of stages whose tools ran.
    #[must_use]
    pub fn completed(&self) -> usize {
        self.count(StageStatus::Completed)
    }

    /// Number of stages skipped by the gate.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.count(StageStatus::Skipped)
    }

    /// Looks up the outcome of a stage.
    #[must_use]
    pub fn outcome(&self, stage: &str) -> Option<&StageOutcome> {
        self.outcomes.iter().find(|o| o.stage == stage)
    }

    /// One-line human-readable summary.
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "{} stages: {} ran, {} skipped in {}",
            self.outcomes.len(),
            self.completed(),
            self.skipped(),
            format_duration(self.elapsed)
        )
    }

    fn count(&self, status: StageStatus) -> usize {
        self.outcomes.iter().filter(|o| o.status == status).count()
    }
}

/// Builds the plan for two cohorts and executes it stage by stage.
///
/// Stages run strictly one after another; the driver awaits every
/// invocation before looking at the next stage. The first error stops the
/// run.
#[derive(Debug)]
pub struct Driver {
    config: PipelineConfig,
    store: Arc<dyn ArtifactStore>,
    executor: StageExecutor,
    ctx: RunContext,
}

impl Driver {
    /// Creates a driver.
    #[must_use]
    pub fn new(config: PipelineConfig, store: Arc<dyn ArtifactStore>, runner: Arc<dyn ProcessRunner>) -> Self {
        let executor = StageExecutor::new(runner, Arc::clone(&store));
        Self {
            config,
            store,
            executor,
            ctx: RunContext::default(),
        }
    }

    /// Sets the run context.
    #[must_use]
    pub fn with_context(mut self, ctx: RunContext) -> Self {
        self.ctx = ctx;
        self
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Builds the plan for `normal` and `tumor` without running anything.
    ///
    /// # Errors
    ///
    /// See [`PipelinePlan::build`].
    pub fn plan(&self, normal: &Cohort, tumor: &Cohort) -> Result<PipelinePlan, PipelineError> {
        PipelinePlan::build(&self.config, normal, tumor, self.store.as_ref())
    }

    /// Runs the whole pipeline for `normal` and `tumor`.
    ///
    /// # Errors
    ///
    /// Returns the first planning or execution error.
    pub async fn run(&self, normal: &Cohort, tumor: &Cohort) -> Result<RunReport, PipelineError> {
        let plan = self.plan(normal, tumor)?;
        self.execute(&plan).await
    }

    /// Executes a plan in order.
    ///
    /// # Errors
    ///
    /// Returns the first stage error. Stages after it are not looked at.
    pub async fn execute(&self, plan: &PipelinePlan) -> Result<RunReport, PipelineError> {
        let start = Instant::now();
        self.ctx.emit_event(PIPELINE_STARTED, Some(serde_json::json!({ "stages": plan.len() })));

        let mut outcomes = Vec::with_capacity(plan.len());
        for stage in plan.stages() {
            match self.run_stage(stage).await {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => {
                    error!(stage = %stage.name, "{e}");
                    self.ctx.emit_event(
                        PIPELINE_FAILED,
                        Some(serde_json::json!({ "stage": stage.name, "error": e.to_string() })),
                    );
                    return Err(e);
                }
            }
        }

        let report = RunReport {
            run_id: self.ctx.identity().run_id,
            outcomes,
            elapsed: start.elapsed(),
        };
        self.ctx.emit_event(
            PIPELINE_COMPLETED,
            Some(serde_json::json!({
                "completed": report.completed(),
                "skipped": report.skipped(),
                "elapsed_ms": u64::try_from(report.elapsed.as_millis()).unwrap_or(u64::MAX),
            })),
        );
        Ok(report)
    }

    async fn run_stage(&self, stage: &StageDescriptor) -> Result<StageOutcome, PipelineError> {
        if let Some(output) = &stage.output {
            match check_gate(self.store.as_ref(), output)? {
                GateDecision::Complete { size } => {
                    info!(stage = %stage.name, artifact = %output, size, "Output exists, skipping");
                    self.ctx.emit_event(
                        STAGE_SKIPPED,
                        Some(serde_json::json!({ "stage": stage.name, "artifact": output })),
                    );
                    return Ok(StageOutcome::skipped(&stage.name, format!("{output} already exists")));
                }
                GateDecision::Empty => {
                    warn!(stage = %stage.name, artifact = %output, "Output is empty, recomputing");
                }
                GateDecision::Absent => {}
            }
        }

        for input in &stage.inputs {
            if !is_complete(self.store.as_ref(), input)? {
                self.fail(stage);
                return Err(MissingArtifactError::new(&stage.name, input.path()).into());
            }
        }
        for dir in &stage.directories {
            self.store.create_dir_all(dir)?;
        }

        self.ctx.emit_event(
            STAGE_STARTED,
            Some(serde_json::json!({ "stage": stage.name, "kind": stage.kind })),
        );

        let duration = match self.executor.execute_all(&stage.name, &stage.invocations).await {
            Ok(duration) => duration,
            Err(e) => {
                self.fail(stage);
                return Err(e.into());
            }
        };

        if let Some(output) = &stage.output {
            let published = if stage.staged {
                self.executor.publish(&stage.name, output)
            } else {
                Ok(())
            };
            if let Err(e) = published {
                self.fail(stage);
                return Err(e);
            }
            if !is_complete(self.store.as_ref(), output)? {
                self.fail(stage);
                return Err(ToolError::output_not_produced(&stage.name, output.path()).into());
            }
        }

        info!(stage = %stage.name, elapsed = %format_duration(duration), "Stage completed");
        self.ctx.emit_event(
            STAGE_COMPLETED,
            Some(serde_json::json!({
                "stage": stage.name,
                "duration_ms": u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
            })),
        );
        Ok(StageOutcome::completed(&stage.name, duration))
    }

    fn fail(&self, stage: &StageDescriptor) {
        self.ctx
            .emit_event(STAGE_FAILED, Some(serde_json::json!({ "stage": stage.name })));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_counts() {
        let report = RunReport {
            run_id: Uuid::new_v4(),
            outcomes: vec![
                StageOutcome::skipped("fetch_reference", "exists"),
                StageOutcome::completed("align:normal:s1", Duration::from_secs(75)),
                StageOutcome::completed("sort:normal:s1", Duration::from_secs(5)),
            ],
            elapsed: Duration::from_secs(80),
        };

        assert_eq!(report.completed(), 2);
        assert_eq!(report.skipped(), 1);
        assert!(report.outcome("sort:normal:s1").unwrap().ran());
        assert_eq!(report.summary(), "3 stages: 2 ran, 1 skipped in 1m 20s");
    }
}
