//! Reference preparation.
//!
//! Three independently gated stages: fetch the sequence, build the aligner
//! index and build the FASTA index. The tools choose their own output names
//! here, so none of these stages is staged.

use super::StageDescriptor;
use crate::config::PipelineConfig;
use crate::core::{Artifact, StageKind};
use crate::process::Invocation;

/// `bwa index` writes the suffix array after `.pac`, `.ann`, `.amb` and
/// `.bwt`, so a non-empty `.sa` is the only proof the index is whole.
const ALIGNER_INDEX_SUFFIX: &str = ".sa";

const FASTA_INDEX_SUFFIX: &str = ".fai";

/// The uncompressed reference sequence.
pub(crate) fn reference_fasta(config: &PipelineConfig) -> Artifact {
    Artifact::new(config.reference_fasta())
}

/// The file marking the aligner index as built.
pub(crate) fn aligner_index(config: &PipelineConfig) -> Artifact {
    reference_fasta(config).suffixed(ALIGNER_INDEX_SUFFIX)
}

/// The FASTA index the variant caller needs.
pub(crate) fn fasta_index(config: &PipelineConfig) -> Artifact {
    reference_fasta(config).suffixed(FASTA_INDEX_SUFFIX)
}

/// Builds the reference preparation stages.
#[must_use]
pub fn reference_stages(config: &PipelineConfig) -> Vec<StageDescriptor> {
    let fasta = reference_fasta(config);
    let archive = fasta.suffixed(".gz");
    let tools = &config.tools;

    let fetch = StageDescriptor::new("fetch_reference", StageKind::FetchReference)
        .output(fasta.clone())
        .directory(&config.reference_dir)
        .invocation(
            Invocation::new(&tools.downloader)
                .args(["-q", "-O"])
                .arg_path(&archive)
                .arg(&config.reference_url),
        )
        .invocation(Invocation::new(&tools.decompressor).arg("-f").arg_path(&archive));

    let index = StageDescriptor::new("index_reference", StageKind::IndexReference)
        .input(fasta.clone())
        .output(aligner_index(config))
        .invocation(Invocation::new(&tools.aligner).arg("index").arg_path(&fasta));

    let faidx = StageDescriptor::new("faidx_reference", StageKind::IndexReference)
        .input(fasta.clone())
        .output(fasta_index(config))
        .invocation(Invocation::new(&tools.converter).arg("faidx").arg_path(&fasta));

    vec![fetch, index, faidx]
}
