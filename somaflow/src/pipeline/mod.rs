//! Pipeline planning and execution.
//!
//! This module provides:
//! - The validated, ordered stage plan
//! - The driver that gates and executes each stage in turn

mod driver;
#[cfg(test)]
mod integration_tests;
mod plan;

pub use driver::{Driver, RunReport};
pub use plan::PipelinePlan;
