//! Default analysis engine: line-window fingerprinting

use async_trait::async_trait;
use std::sync::Arc;

use super::fingerprint::{chunk_lines, detect_clones, normalize_lines};
use super::AnalysisEngine;
use crate::config::DetectorConfig;
use crate::error::{Error, Result};
use crate::storage::FileStore;
use crate::types::{SourceFile, Stage};

/// Clone detector matching each new file against every committed file
pub struct CloneDetector {
    config: DetectorConfig,
    file_store: Arc<FileStore>,
}

impl CloneDetector {
    /// Create a detector reading previously processed files from `file_store`
    pub fn new(config: DetectorConfig, file_store: Arc<FileStore>) -> Self {
        Self { config, file_store }
    }
}

#[async_trait]
impl AnalysisEngine for CloneDetector {
    async fn preprocess(&self, mut file: SourceFile) -> Result<SourceFile> {
        file.lines = normalize_lines(&file.contents);
        if file.lines.is_empty() {
            return Err(Error::stage(
                Stage::Preprocess,
                &file.name,
                "no source lines left after normalization",
            ));
        }
        tracing::debug!("[{}] {} normalized lines", file.name, file.lines.len());
        Ok(file)
    }

    async fn transform(&self, mut file: SourceFile) -> Result<SourceFile> {
        if file.lines.is_empty() {
            return Err(Error::stage(
                Stage::Transform,
                &file.name,
                "file was not preprocessed",
            ));
        }
        file.chunks = chunk_lines(&file.lines, self.config.chunk_size);
        tracing::debug!("[{}] {} chunks", file.name, file.chunks.len());
        Ok(file)
    }

    async fn match_detect(&self, file: SourceFile) -> Result<SourceFile> {
        let others = self.file_store.iterate();
        let min_clone_lines = self.config.min_clone_lines;
        let name = file.name.clone();

        // Matching scans the whole store; keep it off the async workers
        tokio::task::spawn_blocking(move || {
            let mut file = file;
            file.clones = detect_clones(&file, &others, min_clone_lines);
            tracing::debug!(
                "[{}] {} clones against {} files",
                file.name,
                file.clones.len(),
                others.len()
            );
            file
        })
        .await
        .map_err(|e| Error::stage(Stage::MatchDetect, name, e.to_string()))
    }

    fn processed_file_count(&self) -> usize {
        self.file_store.count()
    }

    fn name(&self) -> &str {
        "clone-detector"
    }
}
