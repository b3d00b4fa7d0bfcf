//! External process execution.
//!
//! This module provides:
//! - Typed invocation descriptors
//! - The process runner seam and its tokio implementation
//! - The stage executor that times invocations and publishes staged outputs

mod executor;
mod invocation;
mod runner;

pub use executor::StageExecutor;
pub use invocation::Invocation;
pub use runner::{ProcessRunner, TokioProcessRunner};

#[cfg(test)]
pub use runner::MockProcessRunner;
