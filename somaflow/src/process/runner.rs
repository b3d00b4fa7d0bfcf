//! Running invocations as child processes.

use super::Invocation;
use crate::errors::ToolError;
use async_trait::async_trait;
use std::fmt::Debug;
use std::process::{ExitStatus, Stdio};
use tokio::process::{Child, Command};
use tracing::debug;

/// Runs one invocation to completion.
///
/// The exit status is the only success signal. Implementations must not
/// return before every process of a pipe chain has exited.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProcessRunner: Send + Sync + Debug {
    /// Runs `invocation` on behalf of `stage`.
    async fn run(&self, stage: &str, invocation: &Invocation) -> Result<(), ToolError>;
}

/// Runs invocations as real child processes.
///
/// Standard error of every process, and standard output of the last one,
/// are inherited so the tools talk directly to the operator.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioProcessRunner;

impl TokioProcessRunner {
    /// Creates a new runner.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Spawns every step of the chain into `children`, stopping at the
    /// first step that cannot be started.
    fn spawn_chain<'i>(
        stage: &str,
        invocation: &'i Invocation,
        children: &mut Vec<(&'i Invocation, Child)>,
    ) -> Result<(), ToolError> {
        let steps: Vec<&Invocation> = invocation.chain().collect();
        let last = steps.len() - 1;
        let mut upstream: Option<Stdio> = None;

        for (i, step) in steps.into_iter().enumerate() {
            let mut command = Command::new(step.program());
            command.args(step.arguments()).stderr(Stdio::inherit());
            if let Some(stdin) = upstream.take() {
                command.stdin(stdin);
            }
            if i < last {
                command.stdout(Stdio::piped());
            }

            let mut child = command
                .spawn()
                .map_err(|e| ToolError::spawn_failed(stage, step.program(), e.to_string()))?;

            if i < last {
                let stdout = child.stdout.take().ok_or_else(|| {
                    ToolError::spawn_failed(stage, step.program(), "standard output was not captured")
                })?;
                let stdio: Stdio = stdout
                    .try_into()
                    .map_err(|e: std::io::Error| ToolError::spawn_failed(stage, step.program(), e.to_string()))?;
                upstream = Some(stdio);
            }

            children.push((step, child));
        }

        Ok(())
    }
}

#[async_trait]
impl ProcessRunner for TokioProcessRunner {
    async fn run(&self, stage: &str, invocation: &Invocation) -> Result<(), ToolError> {
        debug!(stage = %stage, command = %invocation, "Spawning");
        let mut children = Vec::new();
        if let Err(e) = Self::spawn_chain(stage, invocation, &mut children) {
            // Upstream steps already started would otherwise keep running
            // with nobody reading their output.
            for (step, mut child) in children {
                if let Err(kill) = child.kill().await {
                    debug!(stage = %stage, program = step.program(), "Could not stop: {kill}");
                }
            }
            return Err(e);
        }

        // Wait for every process so none is left behind, then report the
        // first failure in pipe order.
        let mut failure: Option<ToolError> = None;
        for (step, mut child) in children {
            let result = child.wait().await;
            if failure.is_some() {
                continue;
            }
            failure = match result {
                Ok(status) if status.success() => None,
                Ok(status) => Some(ToolError::non_zero_exit(
                    stage,
                    step.own_command_line(),
                    describe_status(status),
                )),
                Err(e) => Some(ToolError::spawn_failed(stage, step.program(), e.to_string())),
            };
        }

        failure.map_or(Ok(()), Err)
    }
}

fn describe_status(status: ExitStatus) -> String {
    status
        .code()
        .map_or_else(|| status.to_string(), |code| format!("exit code {code}"))
}
