//! The ordered stage plan.

use crate::config::PipelineConfig;
use crate::errors::{ContractErrorInfo, PipelineError, PipelineValidationError};
use crate::inputs::{Cohort, ReadPair, ReadPairSource};
use crate::stages::{
    alignment_stages, consolidation_stages, final_artifact, reference_stages, unsorted_inputs,
    variant_calling_stages, StageDescriptor,
};
use crate::store::{is_complete, ArtifactStore};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

/// An ordered, validated list of stages.
///
/// The order is the fixed pipeline order: reference preparation, alignment
/// of the normal cohort, alignment of the tumor cohort, consolidation of
/// each cohort in the same order, then variant calling.
#[derive(Debug, Clone, Serialize)]
pub struct PipelinePlan {
    stages: Vec<StageDescriptor>,
}

impl PipelinePlan {
    /// Resolves both cohorts and builds the full plan.
    ///
    /// Read pairs of both cohorts are resolved before anything else, so an
    /// input integrity problem in either cohort surfaces before any tool
    /// has run.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::Config` for an unusable configuration,
    /// `PipelineError::InputIntegrity` for inconsistent read files and
    /// `PipelineError::Validation` if the plan is inconsistent.
    pub fn build(
        config: &PipelineConfig,
        normal: &Cohort,
        tumor: &Cohort,
        store: &dyn ArtifactStore,
    ) -> Result<Self, PipelineError> {
        config.validate()?;

        let normal_pairs = resolve(config, normal, store)?;
        let tumor_pairs = resolve(config, tumor, store)?;

        let mut stages = reference_stages(config);
        let normal_align = alignment_stages(config, normal, &normal_pairs);
        let tumor_align = alignment_stages(config, tumor, &tumor_pairs);

        let normal_planned = planned_outputs(&normal_align);
        let tumor_planned = planned_outputs(&tumor_align);
        let normal_unsorted = unsorted_inputs(store, config, normal, &normal_planned, &tumor_planned)?;
        let tumor_unsorted = unsorted_inputs(store, config, tumor, &tumor_planned, &normal_planned)?;
        for (cohort, unsorted) in [(normal, &normal_unsorted), (tumor, &tumor_unsorted)] {
            if unsorted.is_empty() {
                return Err(empty_cohort(cohort).into());
            }
        }

        stages.extend(normal_align);
        stages.extend(tumor_align);
        stages.extend(consolidation_stages(config, normal, &normal_unsorted));
        stages.extend(consolidation_stages(config, tumor, &tumor_unsorted));
        stages.extend(variant_calling_stages(
            config,
            &final_artifact(config, normal),
            &final_artifact(config, tumor),
        ));

        let plan = Self { stages };
        plan.validate(store)?;
        info!(
            stages = plan.len(),
            normal_pairs = normal_pairs.len(),
            tumor_pairs = tumor_pairs.len(),
            "Pipeline plan built"
        );
        Ok(plan)
    }

    /// Wraps an explicit list of stages without validating it.
    #[must_use]
    pub fn from_stages(stages: Vec<StageDescriptor>) -> Self {
        Self { stages }
    }

    /// Checks the plan against the store.
    ///
    /// A plan is valid when it is non-empty, stage names and declared
    /// outputs are unique, and every input is either declared by an earlier
    /// stage or already complete in the store.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::Validation` describing the first violation,
    /// or `PipelineError::Io` if the store cannot be queried.
    pub fn validate(&self, store: &dyn ArtifactStore) -> Result<(), PipelineError> {
        if self.stages.is_empty() {
            return Err(PipelineValidationError::new("Pipeline plan has no stages")
                .with_error_info(
                    ContractErrorInfo::new("PLAN-EMPTY", "Cannot execute an empty plan")
                        .with_fix_hint("Build the plan from two cohorts with read files."),
                )
                .into());
        }

        let mut names = HashSet::new();
        let mut producers: HashMap<&std::path::Path, &str> = HashMap::new();

        for stage in &self.stages {
            if !names.insert(stage.name.as_str()) {
                return Err(PipelineValidationError::new(format!("Duplicate stage name '{}'", stage.name))
                    .with_stages(vec![stage.name.clone()])
                    .with_error_info(ContractErrorInfo::new(
                        "PLAN-DUPLICATE-STAGE",
                        format!("Stage '{}' appears more than once", stage.name),
                    ))
                    .into());
            }

            for input in &stage.inputs {
                if producers.contains_key(input.path()) {
                    continue;
                }
                if !is_complete(store, input)? {
                    return Err(PipelineValidationError::new(format!(
                        "Stage '{}' requires '{input}' which no earlier stage produces and which is not on disk",
                        stage.name
                    ))
                    .with_stages(vec![stage.name.clone()])
                    .with_error_info(
                        ContractErrorInfo::new("PLAN-UNSATISFIED-INPUT", format!("Input '{input}' is never produced"))
                            .with_fix_hint("Check that the artifact exists and is not empty.")
                            .with_context_entry("artifact", input.to_string()),
                    )
                    .into());
                }
            }

            if let Some(output) = &stage.output {
                if let Some(previous) = producers.insert(output.path(), &stage.name) {
                    return Err(PipelineValidationError::new(format!(
                        "Stages '{previous}' and '{}' both produce '{output}'",
                        stage.name
                    ))
                    .with_stages(vec![previous.to_string(), stage.name.clone()])
                    .with_error_info(
                        ContractErrorInfo::new("PLAN-DUPLICATE-OUTPUT", "Two stages write one artifact")
                            .with_fix_hint("Read-group identifiers must be unique across both cohorts.")
                            .with_context_entry("artifact", output.to_string()),
                    )
                    .into());
                }
            }
        }

        debug!(stages = self.stages.len(), "Plan validated");
        Ok(())
    }

    /// The stages in execution order.
    #[must_use]
    pub fn stages(&self) -> &[StageDescriptor] {
        &self.stages
    }

    /// Looks up a stage by name.
    #[must_use]
    pub fn stage(&self, name: &str) -> Option<&StageDescriptor> {
        self.stages.iter().find(|s| s.name == name)
    }

    /// Returns the number of stages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Returns true if the plan has no stages.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

fn resolve(config: &PipelineConfig, cohort: &Cohort, store: &dyn ArtifactStore) -> Result<Vec<ReadPair>, PipelineError> {
    let pairs = ReadPairSource::new(cohort, store, &config.mates)?.resolve_all()?;
    info!(cohort = %cohort.label, pairs = pairs.len(), "Resolved read pairs");
    Ok(pairs)
}

fn planned_outputs(stages: &[StageDescriptor]) -> Vec<crate::core::Artifact> {
    stages.iter().filter_map(|s| s.output.clone()).collect()
}

fn empty_cohort(cohort: &Cohort) -> PipelineValidationError {
    PipelineValidationError::new(format!(
        "Cohort '{}' has no read pairs and no aligned artifacts",
        cohort.label
    ))
    .with_error_info(
        ContractErrorInfo::new("PLAN-EMPTY-COHORT", format!("Nothing to consolidate for '{}'", cohort.label))
            .with_fix_hint("Check the directory and prefix given for the cohort.")
            .with_context_entry("directory", cohort.directory.display().to_string())
            .with_context_entry("prefix", cohort.prefix.clone()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Artifact, StageKind};
    use crate::process::Invocation;
    use crate::store::InMemoryArtifactStore;
    use pretty_assertions::assert_eq;

    fn config() -> PipelineConfig {
        PipelineConfig::default()
            .with_processors(2)
            .with_reference_dir("/refs")
            .with_work_dir("/work")
    }

    fn seeded_store() -> InMemoryArtifactStore {
        let store = InMemoryArtifactStore::new();
        for name in ["s1.R1.fastq.gz", "s1.R2.fastq.gz", "s2.R1.fastq.gz", "s2.R2.fastq.gz"] {
            store.put(format!("/data/normal/{name}"), 100);
        }
        for name in ["t1.R1.fastq.gz", "t1.R2.fastq.gz"] {
            store.put(format!("/data/tumor/{name}"), 100);
        }
        store
    }

    #[test]
    fn test_plan_order() {
        let store = seeded_store();
        let plan = PipelinePlan::build(
            &config(),
            &Cohort::normal("/data/normal", "s"),
            &Cohort::tumor("/data/tumor", "t"),
            &store,
        )
        .unwrap();

        let names: Vec<_> = plan.stages().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "fetch_reference",
                "index_reference",
                "faidx_reference",
                "align:normal:s1",
                "align:normal:s2",
                "align:tumor:t1",
                "sort:normal:s1",
                "index:normal:s1",
                "sort:normal:s2",
                "index:normal:s2",
                "merge:normal",
                "markdup:normal",
                "index:normal:final",
                "sort:tumor:t1",
                "index:tumor:t1",
                "merge:tumor",
                "markdup:tumor",
                "index:tumor:final",
                "configure_variant_calling",
                "run_variant_calling",
            ]
        );
    }

    #[test]
    fn test_build_fails_on_missing_mate_in_second_cohort() {
        let store = seeded_store();
        store.put("/data/tumor/t2.R1.fastq.gz", 100);

        let err = PipelinePlan::build(
            &config(),
            &Cohort::normal("/data/normal", "s"),
            &Cohort::tumor("/data/tumor", "t"),
            &store,
        )
        .unwrap_err();

        assert!(matches!(err, PipelineError::InputIntegrity(_)));
        assert!(err.to_string().contains("t2.R1.fastq.gz"));
    }

    #[test]
    fn test_empty_cohort_is_rejected() {
        let store = seeded_store();
        let err = PipelinePlan::build(
            &config(),
            &Cohort::normal("/data/normal", "s"),
            &Cohort::tumor("/data/tumor", "x"),
            &store,
        )
        .unwrap_err();

        match err {
            PipelineError::Validation(v) => assert_eq!(v.code(), Some("PLAN-EMPTY-COHORT")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_previously_aligned_artifacts_are_consolidated() {
        let store = seeded_store();
        store.put("/work/s0.bam", 500);

        let plan = PipelinePlan::build(
            &config(),
            &Cohort::normal("/data/normal", "s"),
            &Cohort::tumor("/data/tumor", "t"),
            &store,
        )
        .unwrap();

        assert!(plan.stage("sort:normal:s0").is_some());
        assert!(plan.stage("align:normal:s0").is_none());
    }

    #[test]
    fn test_shared_read_group_across_cohorts_is_rejected() {
        let store = seeded_store();
        store.put("/data/tumor/s1.R1.fastq.gz", 100);
        store.put("/data/tumor/s1.R2.fastq.gz", 100);

        let err = PipelinePlan::build(
            &config(),
            &Cohort::normal("/data/normal", "s"),
            &Cohort::tumor("/data/tumor", "s"),
            &store,
        )
        .unwrap_err();

        match err {
            PipelineError::Validation(v) => {
                assert_eq!(v.code(), Some("PLAN-DUPLICATE-OUTPUT"));
                assert_eq!(v.stages, vec!["align:normal:s1".to_string(), "align:tumor:s1".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_validate_empty_plan() {
        let err = PipelinePlan::from_stages(Vec::new())
            .validate(&InMemoryArtifactStore::new())
            .unwrap_err();
        assert!(matches!(err, PipelineError::Validation(ref v) if v.code() == Some("PLAN-EMPTY")));
    }

    #[test]
    fn test_validate_unsatisfied_input() {
        let stage = StageDescriptor::new("sort:normal:s1", StageKind::Sort)
            .input(Artifact::new("/work/s1.bam"))
            .staged_output(Artifact::new("/work/s1.sorted.bam"))
            .invocation(Invocation::new("sambamba"));

        let err = PipelinePlan::from_stages(vec![stage])
            .validate(&InMemoryArtifactStore::new())
            .unwrap_err();
        assert!(matches!(err, PipelineError::Validation(ref v) if v.code() == Some("PLAN-UNSATISFIED-INPUT")));
    }

    #[test]
    fn test_validate_input_satisfied_by_store() {
        let store = InMemoryArtifactStore::new();
        store.put("/work/s1.bam", 1);
        let stage = StageDescriptor::new("sort:normal:s1", StageKind::Sort)
            .input(Artifact::new("/work/s1.bam"))
            .staged_output(Artifact::new("/work/s1.sorted.bam"));

        PipelinePlan::from_stages(vec![stage]).validate(&store).unwrap();
    }

    #[test]
    fn test_validate_duplicate_stage_name() {
        let a = StageDescriptor::new("merge:normal", StageKind::Merge);
        let b = StageDescriptor::new("merge:normal", StageKind::Merge);

        let err = PipelinePlan::from_stages(vec![a, b])
            .validate(&InMemoryArtifactStore::new())
            .unwrap_err();
        assert!(matches!(err, PipelineError::Validation(ref v) if v.code() == Some("PLAN-DUPLICATE-STAGE")));
    }
}
