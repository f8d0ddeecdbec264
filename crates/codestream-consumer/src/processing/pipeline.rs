//! Pipeline orchestrator
//!
//! One invocation per upload: fresh file + timer ledger, the three engine
//! stages in order, then the commits (clones, file record, timing sample,
//! last-processed pointer) and the periodic-report check. A failure in any
//! stage aborts the rest of that invocation only; nothing is committed for
//! it and nothing is retried.

use bytes::Bytes;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

use super::report::OperationalSummary;
use crate::config::PipelineConfig;
use crate::engine::AnalysisEngine;
use crate::error::{Error, Result};
use crate::storage::{SharedStores, StatsLedger};
use crate::timer::{MATCH, TOTAL};
use crate::types::{FileRecord, ProcessedFile, SourceFile, Stage, TimingEntry};

/// Outcome of a completed invocation
#[derive(Debug, Clone)]
pub struct Completion {
    pub file: ProcessedFile,
    /// Clone groups committed by this invocation
    pub clones_found: usize,
    /// Commit ordinal of the file record (1 for the first committed file)
    pub processed_count: usize,
    /// Set when this completion triggered the periodic report
    pub report: Option<OperationalSummary>,
}

/// Orchestrates the analysis stages and store commits for each upload
#[derive(Clone)]
pub struct Pipeline {
    engine: Arc<dyn AnalysisEngine>,
    stores: SharedStores,
    report_frequency: usize,
    stage_timeout: Option<Duration>,
    report_url: String,
}

impl Pipeline {
    pub fn new(
        engine: Arc<dyn AnalysisEngine>,
        stores: SharedStores,
        config: &PipelineConfig,
        report_url: impl Into<String>,
    ) -> Self {
        Self {
            engine,
            stores,
            report_frequency: config.report_frequency,
            stage_timeout: config.stage_timeout_secs.map(Duration::from_secs),
            report_url: report_url.into(),
        }
    }

    pub fn engine(&self) -> &Arc<dyn AnalysisEngine> {
        &self.engine
    }

    pub fn stores(&self) -> &SharedStores {
        &self.stores
    }

    /// Decode raw upload bytes and process them
    ///
    /// Content that is not UTF-8 fails before any stage runs.
    pub async fn process_upload(
        &self,
        name: String,
        data: Bytes,
        cancel: &CancellationToken,
    ) -> Result<Completion> {
        let contents = match String::from_utf8(data.to_vec()) {
            Ok(contents) => contents,
            Err(e) => {
                let err = Error::upload_read(&name, e.to_string());
                tracing::error!("[{}] Upload rejected: {}", name, err);
                return Err(err);
            }
        };
        self.process(name, contents, cancel).await
    }

    /// Run one file through every stage and commit the results
    ///
    /// Errors are logged here; the caller only decides what to do with the
    /// outcome.
    pub async fn process(
        &self,
        name: String,
        contents: String,
        cancel: &CancellationToken,
    ) -> Result<Completion> {
        let result = self.run(SourceFile::new(name.clone(), contents), cancel).await;
        if let Err(e) = &result {
            match e.stage_kind() {
                Some(stage) => tracing::error!("[{}] Failed at {}: {}", name, stage, e),
                None => tracing::error!("[{}] Failed: {}", name, e),
            }
        }
        result
    }

    async fn run(&self, mut file: SourceFile, cancel: &CancellationToken) -> Result<Completion> {
        file.timers.start(TOTAL)?;
        let file = self.run_stage(Stage::Preprocess, file, cancel).await?;
        let mut file = self.run_stage(Stage::Transform, file, cancel).await?;

        file.timers.start(MATCH)?;
        let mut file = self.run_stage(Stage::MatchDetect, file, cancel).await?;

        // Commits start here; no cancellation checks past this point
        let clones = std::mem::take(&mut file.clones);
        let clones_found = clones.len();
        self.stores.clones.append(clones);
        file.timers.end(MATCH)?;

        let record = Arc::new(FileRecord::from_source(&file));
        let processed_count = self.stores.files.append(Arc::clone(&record));
        file.timers.end(TOTAL)?;

        let timers = file.timers.snapshot();
        self.stores.stats.record(TimingEntry {
            file_name: record.name.clone(),
            total_nanos: timers.nanos(TOTAL).unwrap_or_default(),
            match_nanos: timers.nanos(MATCH).unwrap_or_default(),
            line_count: record.line_count,
        });

        let processed = ProcessedFile { record, timers };
        self.stores.last_processed.set(processed.clone());

        tracing::info!(
            "[{}] COMPLETE: {} lines, {} clones, {}",
            processed.record.name,
            processed.record.line_count,
            clones_found,
            processed.timers.render_micros()
        );

        let report = self.maybe_report(processed_count, &processed);

        Ok(Completion {
            file: processed,
            clones_found,
            processed_count,
            report,
        })
    }

    async fn run_stage(
        &self,
        stage: Stage,
        file: SourceFile,
        cancel: &CancellationToken,
    ) -> Result<SourceFile> {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled(file.name));
        }

        let name = file.name.clone();
        tracing::debug!("[{}] Running {}", name, stage);

        let fut = match stage {
            Stage::Preprocess => self.engine.preprocess(file),
            Stage::Transform => self.engine.transform(file),
            Stage::MatchDetect => self.engine.match_detect(file),
        };

        match self.stage_timeout {
            Some(limit) => timeout(limit, fut).await.map_err(|_| Error::StageTimeout {
                stage,
                filename: name.clone(),
                secs: limit.as_secs(),
            })?,
            None => fut.await,
        }
    }

    fn maybe_report(
        &self,
        processed_count: usize,
        processed: &ProcessedFile,
    ) -> Option<OperationalSummary> {
        if !StatsLedger::report_due(processed_count, self.report_frequency) {
            return None;
        }

        let summary = OperationalSummary {
            processed_files: processed_count,
            clones: self.stores.clones.count(),
            last_file: processed.record.name.clone(),
            last_timers: processed.timers.clone(),
            url: self.report_url.clone(),
        };
        summary.emit();
        Some(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DetectorConfig;
    use crate::engine::CloneDetector;
    use crate::types::{CloneGroup, CloneTarget};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Engine with fixed output, failing for names starting with `fail_prefix`
    #[derive(Default)]
    struct ScriptedEngine {
        fail_at: Option<Stage>,
        fail_prefix: &'static str,
        clones_per_file: usize,
        delay: Option<Duration>,
        processed: AtomicUsize,
    }

    impl ScriptedEngine {
        fn check(&self, stage: Stage, file: &SourceFile) -> Result<()> {
            if self.fail_at == Some(stage) && file.name.starts_with(self.fail_prefix) {
                return Err(Error::stage(stage, &file.name, "scripted failure"));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl AnalysisEngine for ScriptedEngine {
        async fn preprocess(&self, file: SourceFile) -> Result<SourceFile> {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.check(Stage::Preprocess, &file)?;
            Ok(file)
        }

        async fn transform(&self, file: SourceFile) -> Result<SourceFile> {
            tokio::task::yield_now().await;
            self.check(Stage::Transform, &file)?;
            Ok(file)
        }

        async fn match_detect(&self, mut file: SourceFile) -> Result<SourceFile> {
            tokio::task::yield_now().await;
            self.check(Stage::MatchDetect, &file)?;
            file.clones = (0..self.clones_per_file)
                .map(|i| CloneGroup {
                    source_name: file.name.clone(),
                    source_start_line: i + 1,
                    source_end_line: i + 5,
                    original_code: String::new(),
                    targets: vec![CloneTarget {
                        name: "seed.c".to_string(),
                        start_line: 1,
                    }],
                })
                .collect();
            self.processed.fetch_add(1, Ordering::SeqCst);
            Ok(file)
        }

        fn processed_file_count(&self) -> usize {
            self.processed.load(Ordering::SeqCst)
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    fn pipeline_with(engine: ScriptedEngine, report_frequency: usize) -> Pipeline {
        let config = PipelineConfig {
            report_frequency,
            stage_timeout_secs: None,
        };
        Pipeline::new(Arc::new(engine), SharedStores::new(), &config, "http://localhost:8080/")
    }

    fn detector_pipeline() -> Pipeline {
        let stores = SharedStores::new();
        let engine = CloneDetector::new(DetectorConfig::default(), Arc::clone(&stores.files));
        Pipeline::new(Arc::new(engine), stores, &PipelineConfig::default(), "http://localhost/")
    }

    fn lines(n: usize, prefix: &str) -> String {
        (1..=n).map(|i| format!("let {}{} = {};\n", prefix, i, i * 7)).collect()
    }

    #[tokio::test]
    async fn test_ten_line_file_without_duplicates() {
        let pipeline = detector_pipeline();
        let token = CancellationToken::new();

        let done = pipeline
            .process("ten.js".to_string(), lines(10, "x"), &token)
            .await
            .unwrap();

        let stores = pipeline.stores();
        assert_eq!(stores.files.count(), 1);
        assert_eq!(stores.clones.count(), 0);
        assert_eq!(done.clones_found, 0);
        let rows = stores.stats.rows();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].line_count, 10);
        assert_eq!(rows[0].file_name, "ten.js");
    }

    #[tokio::test]
    async fn test_identical_files_create_one_clone_group() {
        let pipeline = detector_pipeline();
        let token = CancellationToken::new();
        let contents = lines(50, "v");

        pipeline
            .process("A.js".to_string(), contents.clone(), &token)
            .await
            .unwrap();
        let done = pipeline
            .process("B.js".to_string(), contents, &token)
            .await
            .unwrap();

        let stores = pipeline.stores();
        assert_eq!(done.clones_found, 1);
        assert_eq!(stores.clones.count(), 1);
        let clone = &stores.clones.iterate()[0];
        assert_eq!(clone.source_name, "B.js");
        assert!(clone
            .targets
            .iter()
            .any(|t| t.name == "A.js" && t.start_line == 1));
        assert_eq!(stores.files.filenames(), vec!["A.js", "B.js"]);
    }

    #[tokio::test]
    async fn test_total_covers_match_window() {
        let pipeline = detector_pipeline();
        let token = CancellationToken::new();
        for i in 0..5 {
            let done = pipeline
                .process(format!("f{}.js", i), lines(30, "same"), &token)
                .await
                .unwrap();
            let total = done.file.timers.nanos(TOTAL).unwrap();
            let matched = done.file.timers.nanos(MATCH).unwrap();
            assert!(total >= matched);
        }
        for row in pipeline.stores().stats.rows() {
            assert!(row.total_nanos >= row.match_nanos);
        }
    }

    #[tokio::test]
    async fn test_match_failure_commits_nothing() {
        let engine = ScriptedEngine {
            fail_at: Some(Stage::MatchDetect),
            fail_prefix: "bad",
            clones_per_file: 2,
            ..Default::default()
        };
        let pipeline = pipeline_with(engine, 100);
        let token = CancellationToken::new();

        let err = pipeline
            .process("bad.c".to_string(), "int x;".to_string(), &token)
            .await
            .unwrap_err();
        assert_eq!(err.stage_kind(), Some(Stage::MatchDetect));

        let stores = pipeline.stores();
        assert_eq!(stores.files.count(), 0);
        assert_eq!(stores.clones.count(), 0);
        assert!(stores.stats.is_empty());
        assert!(stores.last_processed.get().is_none());
    }

    #[tokio::test]
    async fn test_preprocess_failure_leaves_earlier_commits() {
        let engine = ScriptedEngine {
            fail_at: Some(Stage::Preprocess),
            fail_prefix: "bad",
            clones_per_file: 1,
            ..Default::default()
        };
        let pipeline = pipeline_with(engine, 100);
        let token = CancellationToken::new();

        pipeline
            .process("good.c".to_string(), "int x;".to_string(), &token)
            .await
            .unwrap();
        assert!(pipeline
            .process("bad.c".to_string(), "int y;".to_string(), &token)
            .await
            .is_err());

        let stores = pipeline.stores();
        assert_eq!(stores.files.filenames(), vec!["good.c"]);
        assert_eq!(stores.clones.count(), 1);
        let last = stores.last_processed.get().unwrap();
        assert_eq!(last.record.name, "good.c");
    }

    #[tokio::test]
    async fn test_invalid_utf8_fails_before_stages() {
        let pipeline = pipeline_with(ScriptedEngine::default(), 100);
        let token = CancellationToken::new();

        let err = pipeline
            .process_upload("bin.c".to_string(), Bytes::from_static(&[0xff, 0xfe, 0x00]), &token)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::UploadRead { .. }));
        assert_eq!(pipeline.engine().processed_file_count(), 0);
        assert_eq!(pipeline.stores().files.count(), 0);
    }

    #[tokio::test]
    async fn test_cancelled_token_stops_before_stages() {
        let pipeline = pipeline_with(ScriptedEngine::default(), 100);
        let token = CancellationToken::new();
        token.cancel();

        let err = pipeline
            .process("a.c".to_string(), "int x;".to_string(), &token)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Cancelled(_)));
        assert_eq!(pipeline.stores().files.count(), 0);
    }

    #[tokio::test]
    async fn test_stage_timeout() {
        let engine = ScriptedEngine {
            delay: Some(Duration::from_secs(30)),
            ..Default::default()
        };
        let config = PipelineConfig {
            report_frequency: 100,
            stage_timeout_secs: Some(1),
        };
        let pipeline = Pipeline::new(Arc::new(engine), SharedStores::new(), &config, "");
        let token = CancellationToken::new();

        let err = pipeline
            .process("slow.c".to_string(), "int x;".to_string(), &token)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::StageTimeout { stage: Stage::Preprocess, secs: 1, .. }
        ));
        assert_eq!(pipeline.stores().files.count(), 0);
    }

    #[tokio::test]
    async fn test_resubmission_yields_independent_records() {
        let engine = ScriptedEngine {
            clones_per_file: 3,
            ..Default::default()
        };
        let pipeline = pipeline_with(engine, 100);
        let token = CancellationToken::new();

        let first = pipeline
            .process("dup.c".to_string(), "int x;".to_string(), &token)
            .await
            .unwrap();
        let second = pipeline
            .process("dup.c".to_string(), "int x;".to_string(), &token)
            .await
            .unwrap();

        assert_ne!(first.file.record.id, second.file.record.id);
        assert_eq!(first.clones_found, second.clones_found);
        assert_eq!(pipeline.stores().files.filenames(), vec!["dup.c", "dup.c"]);
        assert_eq!(pipeline.stores().clones.count(), 6);
    }

    #[tokio::test]
    async fn test_150_sequential_uploads_report_once() {
        let pipeline = pipeline_with(ScriptedEngine::default(), 100);
        let token = CancellationToken::new();

        let mut reports = Vec::new();
        for i in 1..=150 {
            let done = pipeline
                .process(format!("f{}.c", i), "int x;".to_string(), &token)
                .await
                .unwrap();
            if let Some(report) = done.report {
                reports.push((i, report));
            }
        }

        assert_eq!(reports.len(), 1);
        let (at, report) = &reports[0];
        assert_eq!(*at, 100);
        assert_eq!(report.processed_files, 100);
        assert_eq!(report.last_file, "f100.c");
        assert!(report.last_timers.get(TOTAL).is_some());
    }

    #[tokio::test]
    async fn test_report_follows_commit_ordinal_not_engine_count() {
        let engine = ScriptedEngine {
            processed: AtomicUsize::new(99),
            ..Default::default()
        };
        let pipeline = pipeline_with(engine, 100);
        let token = CancellationToken::new();

        let mut fired = Vec::new();
        for i in 1..=100 {
            let done = pipeline
                .process(format!("g{}.c", i), "int y;".to_string(), &token)
                .await
                .unwrap();
            if done.report.is_some() {
                fired.push(i);
            }
        }

        assert_eq!(pipeline.engine().processed_file_count(), 199);
        assert_eq!(fired, vec![100]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_uploads_count_successes() {
        let engine = ScriptedEngine {
            fail_at: Some(Stage::Transform),
            fail_prefix: "bad",
            clones_per_file: 2,
            ..Default::default()
        };
        let pipeline = pipeline_with(engine, 10);
        let token = CancellationToken::new();

        let handles: Vec<_> = (0..60)
            .map(|i| {
                let pipeline = pipeline.clone();
                let token = token.clone();
                let name = if i % 4 == 0 {
                    format!("bad{}.c", i)
                } else {
                    format!("ok{}.c", i)
                };
                tokio::spawn(async move {
                    pipeline.process(name, "int x;\n".to_string(), &token).await
                })
            })
            .collect();

        // Clone count never goes backwards while pipelines are running
        let clones = Arc::clone(&pipeline.stores().clones);
        let watcher = tokio::spawn(async move {
            let mut last = 0;
            for _ in 0..200 {
                let now = clones.count();
                assert!(now >= last);
                last = now;
                tokio::task::yield_now().await;
            }
        });

        let results = futures::future::join_all(handles).await;
        watcher.await.unwrap();

        let outcomes: Vec<_> = results.into_iter().map(|r| r.unwrap()).collect();
        let succeeded = outcomes.iter().filter(|r| r.is_ok()).count();
        let reports = outcomes
            .iter()
            .filter(|r| matches!(r, Ok(c) if c.report.is_some()))
            .count();

        let stores = pipeline.stores();
        assert_eq!(succeeded, 45);
        assert_eq!(stores.files.count(), succeeded);
        assert_eq!(stores.clones.count(), succeeded * 2);
        assert_eq!(stores.stats.len(), succeeded);
        assert_eq!(reports, succeeded / 10);

        let mut ordinals: Vec<_> = outcomes
            .iter()
            .filter_map(|r| r.as_ref().ok().map(|c| c.processed_count))
            .collect();
        ordinals.sort_unstable();
        assert_eq!(ordinals, (1..=succeeded).collect::<Vec<_>>());
    }
}
