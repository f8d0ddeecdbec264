//! Application state for the consumer server

use bytes::Bytes;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::config::ConsumerConfig;
use crate::engine::{AnalysisEngine, CloneDetector};
use crate::error::Result;
use crate::processing::{Completion, Pipeline};
use crate::storage::SharedStores;
use crate::timer::TimerSnapshot;
use crate::types::{CloneGroup, StatisticsSummary, TimingEntry, TimingSummary};

/// Shared application state
///
/// Created at service start and dropped at service stop; every handler and
/// pipeline task works through a clone of this handle.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Configuration
    config: ConsumerConfig,
    /// Orchestrator shared by all uploads
    pipeline: Pipeline,
    /// Parent of every pipeline's cancellation token
    cancel: CancellationToken,
    /// In-flight pipeline tasks
    tasks: TaskTracker,
}

impl AppState {
    /// Create state with the default clone detector
    pub fn new(config: ConsumerConfig) -> Self {
        let stores = SharedStores::new();
        let engine = Arc::new(CloneDetector::new(
            config.detector.clone(),
            Arc::clone(&stores.files),
        ));
        Self::with_engine(config, stores, engine)
    }

    /// Create state around an arbitrary analysis engine
    pub fn with_engine(
        config: ConsumerConfig,
        stores: SharedStores,
        engine: Arc<dyn AnalysisEngine>,
    ) -> Self {
        tracing::info!(
            "Initializing consumer state (engine: {}, report every {} files)",
            engine.name(),
            config.pipeline.report_frequency
        );

        let pipeline = Pipeline::new(engine, stores, &config.pipeline, config.server.base_url.clone());

        Self {
            inner: Arc::new(AppStateInner {
                config,
                pipeline,
                cancel: CancellationToken::new(),
                tasks: TaskTracker::new(),
            }),
        }
    }

    /// Get configuration
    pub fn config(&self) -> &ConsumerConfig {
        &self.inner.config
    }

    /// Get the pipeline
    pub fn pipeline(&self) -> &Pipeline {
        &self.inner.pipeline
    }

    /// Token every pipeline observes between stages
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.inner.cancel
    }

    /// Start processing an upload on its own task and return immediately
    ///
    /// The pipeline runs to completion or failure regardless of what happens
    /// to the request that submitted it. The handle is only for callers that
    /// want to wait; the HTTP layer drops it.
    pub fn submit(&self, name: String, data: Bytes) -> JoinHandle<Result<Completion>> {
        let pipeline = self.inner.pipeline.clone();
        let token = self.inner.cancel.child_token();
        self.inner
            .tasks
            .spawn(async move { pipeline.process_upload(name, data, &token).await })
    }

    /// Number of pipelines still running
    pub fn in_flight(&self) -> usize {
        self.inner.tasks.len()
    }

    /// Stop accepting new pipelines and wait for running ones to settle
    pub async fn shutdown(&self) {
        self.inner.tasks.close();
        tracing::info!("Waiting for {} in-flight pipelines", self.inner.tasks.len());
        self.inner.tasks.wait().await;
        tracing::info!("All pipelines settled");
    }

    /// File and clone counts
    pub fn statistics_summary(&self) -> StatisticsSummary {
        let stores = self.inner.pipeline.stores();
        StatisticsSummary {
            files: stores.files.count(),
            clones: stores.clones.count(),
        }
    }

    /// Engine's running processed-file count
    pub fn processed_file_count(&self) -> usize {
        self.inner.pipeline.engine().processed_file_count()
    }

    /// Timers of the most recent completion
    pub fn last_processed_timers(&self) -> Option<TimerSnapshot> {
        self.inner.pipeline.stores().last_processed.timers()
    }

    /// Name of the most recent completion
    pub fn last_processed_name(&self) -> Option<String> {
        self.inner
            .pipeline
            .stores()
            .last_processed
            .get()
            .map(|f| f.record.name.clone())
    }

    /// Clone groups in commit order
    pub fn list_clones(&self) -> Vec<Arc<CloneGroup>> {
        self.inner.pipeline.stores().clones.iterate()
    }

    /// Processed file names in commit order
    pub fn list_processed_files(&self) -> Vec<String> {
        self.inner.pipeline.stores().files.filenames()
    }

    /// Averages over the timing history
    pub fn timing_history_summary(&self) -> TimingSummary {
        self.inner.pipeline.stores().stats.summary()
    }

    /// Every timing sample in record order
    pub fn timing_history_rows(&self) -> Vec<TimingEntry> {
        self.inner.pipeline.stores().stats.rows()
    }
}
