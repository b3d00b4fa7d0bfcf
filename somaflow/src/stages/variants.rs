//! Somatic variant calling.
//!
//! Neither stage declares an output: the workflow is configured and run on
//! every invocation of the pipeline.

use super::reference::{fasta_index, reference_fasta};
use super::StageDescriptor;
use crate::config::PipelineConfig;
use crate::core::{Artifact, StageKind};
use crate::process::Invocation;

/// Name of the script the configurator writes into the run directory.
const WORKFLOW_SCRIPT: &str = "runWorkflow.py";

/// Builds the configure and run stages over both final artifacts.
#[must_use]
pub fn variant_calling_stages(
    config: &PipelineConfig,
    normal_final: &Artifact,
    tumor_final: &Artifact,
) -> Vec<StageDescriptor> {
    let fasta = reference_fasta(config);
    let run_dir = config.work_path(&config.workflow_dir);

    let configure = StageDescriptor::new("configure_variant_calling", StageKind::CallVariants)
        .inputs([
            normal_final.clone(),
            normal_final.index(),
            tumor_final.clone(),
            tumor_final.index(),
            fasta.clone(),
            fasta_index(config),
        ])
        .invocation(
            Invocation::new(&config.tools.workflow_configurator)
                .arg("--normalBam")
                .arg_path(normal_final)
                .arg("--tumorBam")
                .arg_path(tumor_final)
                .arg("--referenceFasta")
                .arg_path(&fasta)
                .arg("--runDir")
                .arg_path(&run_dir),
        );

    let run = StageDescriptor::new("run_variant_calling", StageKind::CallVariants).invocation(
        Invocation::new(run_dir.join(WORKFLOW_SCRIPT).to_string_lossy())
            .args(["-m", "local", "-j"])
            .arg(config.processors.to_string())
            .arg("-g")
            .arg(config.memory_gb.to_string()),
    );

    vec![configure, run]
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_variant_calling_contract() {
        let config = PipelineConfig::default()
            .with_processors(8)
            .with_memory_gb(32)
            .with_reference_dir("/refs")
            .with_work_dir("/work");
        let normal = Artifact::new("/work/normal.final.bam");
        let tumor = Artifact::new("/work/tumor.final.bam");

        let stages = variant_calling_stages(&config, &normal, &tumor);

        assert_eq!(stages.len(), 2);
        assert!(stages.iter().all(|s| !s.is_gated()));
        assert_eq!(
            stages[0].invocations[0].command_line(),
            "configureStrelkaSomaticWorkflow.py --normalBam /work/normal.final.bam --tumorBam /work/tumor.final.bam --referenceFasta /refs/hg38.fa --runDir /work/strelka_somatic"
        );
        assert_eq!(
            stages[1].invocations[0].command_line(),
            "/work/strelka_somatic/runWorkflow.py -m local -j 8 -g 32"
        );
    }

    #[test]
    fn test_configure_requires_indexed_inputs() {
        let config = PipelineConfig::default().with_reference_dir("/refs");
        let normal = Artifact::new("normal.final.bam");
        let tumor = Artifact::new("tumor.final.bam");

        let stages = variant_calling_stages(&config, &normal, &tumor);

        assert!(stages[0].inputs.contains(&Artifact::new("tumor.final.bam.bai")));
        assert!(stages[0].inputs.contains(&Artifact::new("/refs/hg38.fa.fai")));
    }
}
