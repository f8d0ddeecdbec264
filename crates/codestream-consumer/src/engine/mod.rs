//! Analysis engine abstraction
//!
//! The pipeline drives every upload through `preprocess`, `transform` and
//! `match_detect` in that order. Each stage takes the file by value and hands
//! it back enriched, or fails with [`Error::Stage`](crate::error::Error).

mod detector;
mod fingerprint;

pub use detector::CloneDetector;
pub use fingerprint::{chunk_lines, detect_clones, normalize_lines};

use async_trait::async_trait;

use crate::error::Result;
use crate::types::SourceFile;

/// Trait for the stages that find clones in a file
///
/// Implementations:
/// - `CloneDetector`: line-window fingerprinting against the file store
#[async_trait]
pub trait AnalysisEngine: Send + Sync {
    /// Normalize the raw contents into comparable lines
    async fn preprocess(&self, file: SourceFile) -> Result<SourceFile>;

    /// Turn normalized lines into fingerprinted chunks
    async fn transform(&self, file: SourceFile) -> Result<SourceFile>;

    /// Compare the file's chunks against previously processed files
    async fn match_detect(&self, file: SourceFile) -> Result<SourceFile>;

    /// Running count of processed files
    ///
    /// Informational only. The pipeline gates periodic reports on the file
    /// store's commit ordinal, not on this counter.
    fn processed_file_count(&self) -> usize;

    /// Engine name for logging
    fn name(&self) -> &str;
}
