//! End-to-end runs of the driver against the recording runner.

#[cfg(test)]
mod tests {
    use crate::context::{RunContext, RunIdentity};
    use crate::core::{StageStatus, STAGING_SUFFIX};
    use crate::errors::{PipelineError, ToolError};
    use crate::events::{CollectingEventSink, STAGE_SKIPPED};
    use crate::inputs::Cohort;
    use crate::pipeline::Driver;
    use crate::store::InMemoryArtifactStore;
    use crate::testing::{seed_read_pairs, test_config, RecordingRunner, NORMAL_DIR, TUMOR_DIR};
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    struct Harness {
        store: InMemoryArtifactStore,
        runner: Arc<RecordingRunner>,
        sink: Arc<CollectingEventSink>,
        driver: Driver,
    }

    fn harness(store: InMemoryArtifactStore) -> Harness {
        let runner = Arc::new(RecordingRunner::new(store.clone()));
        let sink = Arc::new(CollectingEventSink::new());
        let driver = Driver::new(test_config(), Arc::new(store.clone()), runner.clone())
            .with_context(RunContext::new(RunIdentity::new()).with_event_sink(sink.clone()));
        Harness {
            store,
            runner,
            sink,
            driver,
        }
    }

    fn seeded() -> InMemoryArtifactStore {
        let store = InMemoryArtifactStore::new();
        seed_read_pairs(&store, NORMAL_DIR, &["s1", "s2"]);
        seed_read_pairs(&store, TUMOR_DIR, &["t1"]);
        store
    }

    fn normal() -> Cohort {
        Cohort::normal(NORMAL_DIR, "s")
    }

    fn tumor() -> Cohort {
        Cohort::tumor(TUMOR_DIR, "t")
    }

    #[tokio::test]
    async fn test_full_run_produces_cohort_artifacts() {
        let h = harness(seeded());

        let report = h.driver.run(&normal(), &tumor()).await.unwrap();

        for path in [
            "/work/s1.bam",
            "/work/s2.bam",
            "/work/s1.sorted.bam",
            "/work/s1.sorted.bam.bai",
            "/work/s2.sorted.bam",
            "/work/s2.sorted.bam.bai",
            "/work/normal.merged.bam",
            "/work/normal.final.bam",
            "/work/normal.final.bam.bai",
            "/work/t1.bam",
            "/work/tumor.final.bam",
            "/work/tumor.final.bam.bai",
            "/refs/hg38.fa",
            "/refs/hg38.fa.bwt",
            "/refs/hg38.fa.sa",
            "/refs/hg38.fa.fai",
        ] {
            assert!(h.store.get(path).is_some(), "missing {path}");
        }
        assert!(h.store.has_dir("/refs"));
        assert!(!h
            .store
            .paths()
            .iter()
            .any(|p| p.to_string_lossy().ends_with(STAGING_SUFFIX)));
        assert_eq!(report.skipped(), 0);
        assert_eq!(report.completed(), report.outcomes.len());
    }

    #[tokio::test]
    async fn test_exactly_one_merged_and_final_per_cohort() {
        let h = harness(seeded());
        h.driver.run(&normal(), &tumor()).await.unwrap();

        let names: Vec<String> = h
            .store
            .paths()
            .iter()
            .filter_map(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
            .collect();
        let merged: Vec<_> = names.iter().filter(|n| n.ends_with(".merged.bam")).collect();
        let finals: Vec<_> = names.iter().filter(|n| n.ends_with(".final.bam")).collect();

        assert_eq!(merged, vec!["normal.merged.bam", "tumor.merged.bam"]);
        assert_eq!(finals, vec!["normal.final.bam", "tumor.final.bam"]);
        // normal: 2 sorts, 2 indexes, merge, markdup, final index; tumor: 1 + 1 + 3
        assert_eq!(h.runner.calls_to("sambamba"), 12);
    }

    #[tokio::test]
    async fn test_rerun_invokes_only_variant_calling() {
        let h = harness(seeded());
        h.driver.run(&normal(), &tumor()).await.unwrap();
        let before = h.store.paths().len();
        h.runner.reset();
        h.sink.clear();

        let report = h.driver.run(&normal(), &tumor()).await.unwrap();

        assert_eq!(
            h.runner.stages(),
            vec!["configure_variant_calling", "run_variant_calling"]
        );
        assert_eq!(h.store.paths().len(), before);
        assert_eq!(report.completed(), 2);
        assert_eq!(report.skipped(), report.outcomes.len() - 2);
        assert_eq!(h.sink.events_of_type(STAGE_SKIPPED).len(), report.skipped());
    }

    #[tokio::test]
    async fn test_rerun_with_overlapping_prefixes_is_a_no_op() {
        let store = InMemoryArtifactStore::new();
        seed_read_pairs(&store, NORMAL_DIR, &["S1"]);
        seed_read_pairs(&store, TUMOR_DIR, &["S_T1"]);
        let h = harness(store);
        let normal = Cohort::normal(NORMAL_DIR, "S");
        let tumor = Cohort::tumor(TUMOR_DIR, "S_T");

        let first = h.driver.run(&normal, &tumor).await.unwrap();
        h.runner.reset();
        let second = h.driver.run(&normal, &tumor).await.unwrap();

        assert_eq!(first.outcomes.len(), second.outcomes.len());
        assert!(second.outcome("sort:normal:S_T1").is_none());
        assert_eq!(
            h.runner.stages(),
            vec!["configure_variant_calling", "run_variant_calling"]
        );
    }

    #[tokio::test]
    async fn test_existing_artifact_is_left_untouched() {
        let store = seeded();
        store.put("/work/s1.bam", 77);
        let h = harness(store);

        let report = h.driver.run(&normal(), &tumor()).await.unwrap();

        assert_eq!(h.store.get("/work/s1.bam"), Some(77));
        assert_eq!(
            report.outcome("align:normal:s1").map(|o| o.status),
            Some(StageStatus::Skipped)
        );
        assert!(!h.runner.stages().contains(&"align:normal:s1".to_string()));
    }

    #[tokio::test]
    async fn test_zero_byte_artifact_is_recomputed() {
        let store = seeded();
        store.put("/work/s2.sorted.bam", 0);
        let h = harness(store);

        let report = h.driver.run(&normal(), &tumor()).await.unwrap();

        assert_eq!(
            report.outcome("sort:normal:s2").map(|o| o.status),
            Some(StageStatus::Completed)
        );
        assert!(h.store.get("/work/s2.sorted.bam").unwrap() > 0);
    }

    #[tokio::test]
    async fn test_interrupted_aligner_index_is_rebuilt() {
        let store = seeded();
        store.put("/refs/hg38.fa", 10);
        store.put("/refs/hg38.fa.fai", 10);
        // killed during suffix array construction
        store.put("/refs/hg38.fa.bwt", 10);
        let h = harness(store);

        let report = h.driver.run(&normal(), &tumor()).await.unwrap();

        assert_eq!(
            report.outcome("index_reference").map(|o| o.status),
            Some(StageStatus::Completed)
        );
        assert_eq!(h.runner.stages().first().map(String::as_str), Some("index_reference"));
        assert!(h.store.get("/refs/hg38.fa.sa").is_some());
    }

    #[tokio::test]
    async fn test_missing_mate_aborts_before_any_tool() {
        let store = seeded();
        store.put(format!("{TUMOR_DIR}/t2.R1.fastq.gz"), 4096);
        let h = harness(store);

        let err = h.driver.run(&normal(), &tumor()).await.unwrap_err();

        assert!(matches!(err, PipelineError::InputIntegrity(_)));
        assert!(err.to_string().contains("t2.R1.fastq.gz"));
        assert_eq!(h.runner.call_count(), 0);
        assert!(h.sink.is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_read_group_is_rejected() {
        let store = seeded();
        store.put(format!("{NORMAL_DIR}/s1.R1.fq.gz"), 4096);
        store.put(format!("{NORMAL_DIR}/s1.R2.fq.gz"), 4096);
        let h = harness(store);

        let err = h.driver.run(&normal(), &tumor()).await.unwrap_err();

        assert!(matches!(err, PipelineError::InputIntegrity(_)));
        assert_eq!(h.runner.call_count(), 0);
    }

    #[tokio::test]
    async fn test_tool_failure_stops_the_run() {
        let h = harness(seeded());
        h.runner.fail_program("sambamba");

        let err = h.driver.run(&normal(), &tumor()).await.unwrap_err();

        match err {
            PipelineError::Tool(ToolError::NonZeroExit { stage, command, .. }) => {
                assert_eq!(stage, "sort:normal:s1");
                assert!(command.starts_with("sambamba sort"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(h.runner.calls_to("sambamba"), 1);
        assert!(h.store.get("/work/s1.sorted.bam").is_none());
        assert!(!h.sink.events_of_type("pipeline.failed").is_empty());
    }

    #[tokio::test]
    async fn test_output_not_produced_is_fatal() {
        let h = harness(seeded());
        h.runner.silence_program("gunzip");

        let err = h.driver.run(&normal(), &tumor()).await.unwrap_err();

        assert!(matches!(
            err,
            PipelineError::Tool(ToolError::OutputNotProduced { ref stage, .. }) if stage == "fetch_reference"
        ));
    }

    #[tokio::test]
    async fn test_staged_output_missing_after_success() {
        let h = harness(seeded());
        h.runner.silence_program("samtools");
        // faidx runs samtools too, so the reference has to be in place already.
        h.store.put("/refs/hg38.fa", 10);
        h.store.put("/refs/hg38.fa.sa", 10);
        h.store.put("/refs/hg38.fa.fai", 10);

        let err = h.driver.run(&normal(), &tumor()).await.unwrap_err();

        assert!(matches!(
            err,
            PipelineError::Tool(ToolError::OutputNotProduced { ref stage, .. }) if stage == "align:normal:s1"
        ));
        assert!(h.store.get("/work/s1.bam").is_none());
    }

    #[tokio::test]
    async fn test_deleted_precursor_is_rebuilt_on_rerun() {
        let h = harness(seeded());
        h.driver.run(&normal(), &tumor()).await.unwrap();
        h.store.remove("/work/tumor.merged.bam");
        h.store.remove("/work/tumor.final.bam");
        h.store.remove("/work/tumor.final.bam.bai");
        h.runner.reset();

        h.driver.run(&normal(), &tumor()).await.unwrap();

        assert_eq!(
            h.runner.stages(),
            vec![
                "merge:tumor",
                "markdup:tumor",
                "index:tumor:final",
                "configure_variant_calling",
                "run_variant_calling",
            ]
        );
    }

    #[tokio::test]
    async fn test_events_for_a_fresh_run() {
        let h = harness(seeded());
        let report = h.driver.run(&normal(), &tumor()).await.unwrap();

        let types = h.sink.event_types();
        assert_eq!(types.first().map(String::as_str), Some("pipeline.started"));
        assert_eq!(types.last().map(String::as_str), Some("pipeline.completed"));
        assert_eq!(h.sink.events_of_type("stage.completed").len(), report.outcomes.len());
    }
}
