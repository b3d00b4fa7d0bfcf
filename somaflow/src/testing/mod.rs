//! Testing utilities for somaflow pipelines.
//!
//! This module provides:
//! - A recording process runner that fakes tool side effects
//! - Fixtures for seeding cohort read files

mod fixtures;
mod mocks;

pub use fixtures::{seed_read_pairs, test_config, NORMAL_DIR, TUMOR_DIR};
pub use mocks::{RecordedCall, RecordingRunner, SIMULATED_SIZE};
