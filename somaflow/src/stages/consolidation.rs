//! Consolidation of a cohort's alignments.
//!
//! Every unsorted artifact is sorted and indexed on its own, then all sorted
//! artifacts are merged into one, duplicates are marked and the result is
//! indexed. Each step is gated on its own output, so a rerun picks up at the
//! first missing file.

use super::StageDescriptor;
use crate::config::PipelineConfig;
use crate::core::{Artifact, Phase, StageKind};
use crate::inputs::Cohort;
use crate::process::Invocation;
use crate::store::ArtifactStore;
use std::collections::BTreeSet;
use std::io;

/// The merged artifact of a cohort, `<label>.merged.bam`.
#[must_use]
pub fn merged_artifact(config: &PipelineConfig, cohort: &Cohort) -> Artifact {
    Artifact::for_phase(&config.work_dir, &cohort.label, Phase::Merged)
}

/// The duplicate-marked artifact of a cohort, `<label>.final.bam`.
#[must_use]
pub fn final_artifact(config: &PipelineConfig, cohort: &Cohort) -> Artifact {
    Artifact::for_phase(&config.work_dir, &cohort.label, Phase::Final)
}

/// Collects the unsorted artifacts of a cohort.
///
/// This is the union of `planned` (outputs of this run's alignment stages)
/// and every `<prefix>*.bam` already in the working directory that does not
/// carry a sorted, merged or final suffix. Both cohorts share the working
/// directory, so artifacts in `foreign` (the other cohort's planned
/// alignments) are never picked up by the scan, even when this cohort's
/// prefix matches their names. A missing working directory contributes
/// nothing.
///
/// # Errors
///
/// Returns the IO error of a failed directory listing.
pub fn unsorted_inputs(
    store: &dyn ArtifactStore,
    config: &PipelineConfig,
    cohort: &Cohort,
    planned: &[Artifact],
    foreign: &[Artifact],
) -> io::Result<Vec<Artifact>> {
    let mut found: BTreeSet<Artifact> = planned.iter().cloned().collect();

    let listing = match store.list(&config.work_dir) {
        Ok(listing) => listing,
        Err(e) if e.kind() == io::ErrorKind::NotFound => Vec::new(),
        Err(e) => return Err(e),
    };
    for path in listing {
        let artifact = Artifact::new(path);
        let name = artifact.file_name();
        if name.starts_with(&cohort.prefix)
            && name.ends_with(Phase::Unsorted.suffix())
            && !Phase::is_consolidated_name(&name)
            && !foreign.contains(&artifact)
        {
            found.insert(artifact);
        }
    }

    Ok(found.into_iter().collect())
}

/// Builds the consolidation stages of a cohort over `unsorted`.
#[must_use]
pub fn consolidation_stages(config: &PipelineConfig, cohort: &Cohort, unsorted: &[Artifact]) -> Vec<StageDescriptor> {
    let tools = &config.tools;
    let threads = config.processors.to_string();
    let label = &cohort.label;
    let mut stages = Vec::with_capacity(unsorted.len() * 2 + 3);
    let mut sorted_all = Vec::with_capacity(unsorted.len());

    for input in unsorted {
        let sorted = input.with_phase(Phase::Sorted);
        let name = input.file_name();
        let stem = name.strip_suffix(Phase::Unsorted.suffix()).unwrap_or(&name);

        stages.push(
            StageDescriptor::new(format!("sort:{label}:{stem}"), StageKind::Sort)
                .input(input.clone())
                .staged_output(sorted.clone())
                .invocation(
                    Invocation::new(&tools.bam_tool)
                        .args(["sort", "-t", threads.as_str(), "-m"])
                        .arg(format!("{}G", config.memory_gb))
                        .arg("-o")
                        .arg_path(sorted.staging_path())
                        .arg_path(input),
                ),
        );
        stages.push(index_stage(config, format!("index:{label}:{stem}"), &sorted));
        sorted_all.push(sorted);
    }

    let merged = merged_artifact(config, cohort);
    stages.push(
        StageDescriptor::new(format!("merge:{label}"), StageKind::Merge)
            .inputs(sorted_all.iter().cloned())
            .inputs(sorted_all.iter().map(Artifact::index))
            .staged_output(merged.clone())
            .invocation(
                Invocation::new(&tools.bam_tool)
                    .args(["merge", "-t", threads.as_str()])
                    .arg_path(merged.staging_path())
                    .args(sorted_all.iter().map(|a| a.path().to_string_lossy().into_owned())),
            ),
    );

    let final_bam = final_artifact(config, cohort);
    stages.push(
        StageDescriptor::new(format!("markdup:{label}"), StageKind::MarkDuplicates)
            .input(merged.clone())
            .staged_output(final_bam.clone())
            .invocation(
                Invocation::new(&tools.bam_tool)
                    .args(["markdup", "-t", threads.as_str()])
                    .arg(format!("--overflow-list-size={}", config.overflow_list_size))
                    .arg(format!("--hash-table-size={}", config.hash_table_size))
                    .arg_path(&merged)
                    .arg_path(final_bam.staging_path()),
            ),
    );
    stages.push(index_stage(config, format!("index:{label}:final"), &final_bam));

    stages
}

fn index_stage(config: &PipelineConfig, name: String, bam: &Artifact) -> StageDescriptor {
    let index = bam.index();
    StageDescriptor::new(name, StageKind::Index)
        .input(bam.clone())
        .staged_output(index.clone())
        .invocation(
            Invocation::new(&config.tools.bam_tool)
                .args(["index", "-t"])
                .arg(config.processors.to_string())
                .arg_path(bam)
                .arg_path(index.staging_path()),
        )
}
