//! Per-pair alignment.

use super::reference::{aligner_index, reference_fasta};
use super::StageDescriptor;
use crate::config::PipelineConfig;
use crate::core::{Artifact, Phase, StageKind};
use crate::inputs::{Cohort, ReadPair};
use crate::process::Invocation;

/// The unsorted artifact produced for `pair`.
#[must_use]
pub fn unsorted_artifact(config: &PipelineConfig, pair: &ReadPair) -> Artifact {
    Artifact::for_phase(&config.work_dir, &pair.read_group, Phase::Unsorted)
}

/// Builds the alignment stage of one pair.
///
/// The aligner streams SAM into the converter, which writes BAM to the
/// output's staging path.
#[must_use]
pub fn alignment_stage(config: &PipelineConfig, cohort: &Cohort, pair: &ReadPair) -> StageDescriptor {
    let fasta = reference_fasta(config);
    let output = unsorted_artifact(config, pair);
    let tools = &config.tools;

    let align = Invocation::new(&tools.aligner)
        .arg("mem")
        .arg("-t")
        .arg(config.processors.to_string())
        .arg("-R")
        .arg(pair.read_group_header(&cohort.label))
        .arg_path(&fasta)
        .arg_path(&pair.first)
        .arg_path(&pair.second);
    let convert = Invocation::new(&tools.converter)
        .args(["view", "-b", "-o"])
        .arg_path(output.staging_path())
        .arg("-");

    StageDescriptor::new(format!("align:{}:{}", cohort.label, pair.read_group), StageKind::Align)
        .input(fasta.clone())
        .input(aligner_index(config))
        .inputs([Artifact::new(&pair.first), Artifact::new(&pair.second)])
        .staged_output(output)
        .invocation(align.pipe(convert))
}

/// Builds one alignment stage per pair, in pair order.
#[must_use]
pub fn alignment_stages(config: &PipelineConfig, cohort: &Cohort, pairs: &[ReadPair]) -> Vec<StageDescriptor> {
    pairs
        .iter()
        .map(|pair| alignment_stage(config, cohort, pair))
        .collect()
}
