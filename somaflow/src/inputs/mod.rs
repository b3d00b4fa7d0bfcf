//! Cohort inputs.
//!
//! This module provides:
//! - Cohort and read-pair types
//! - The resolver turning a directory and prefix into read pairs

mod cohort;
mod resolver;

pub use cohort::{Cohort, ReadPair, NORMAL, TUMOR};
pub use resolver::{ReadPairSource, ReadPairs};
