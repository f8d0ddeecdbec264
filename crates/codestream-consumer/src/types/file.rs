//! File types flowing through and out of the pipeline

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use super::CloneGroup;
use crate::timer::{TimerLedger, TimerSnapshot};

/// A normalized source line with its original 1-based line number
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLine {
    pub number: usize,
    pub text: String,
}

/// Fingerprinted window of normalized lines
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Original line of the first line in the window
    pub start_line: usize,
    /// Original line of the last line in the window
    pub end_line: usize,
    /// Hex SHA-256 of the normalized window
    pub fingerprint: String,
}

/// A file while it is being processed
///
/// Owned by a single pipeline invocation; the analysis engine takes it by
/// value at each stage and hands it back enriched.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub name: String,
    pub contents: String,
    /// Filled by `preprocess`
    pub lines: Vec<SourceLine>,
    /// Filled by `transform`
    pub chunks: Vec<Chunk>,
    /// Filled by `match_detect`
    pub clones: Vec<CloneGroup>,
    pub timers: TimerLedger,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, contents: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            contents: contents.into(),
            lines: Vec::new(),
            chunks: Vec::new(),
            clones: Vec::new(),
            timers: TimerLedger::new(),
        }
    }

    /// Number of lines in the contents, at least 1
    pub fn line_count(&self) -> usize {
        line_count(&self.contents)
    }

    /// Text of original lines `start..=end` (1-based), newline-terminated
    pub fn span_text(&self, start: usize, end: usize) -> String {
        self.contents
            .lines()
            .skip(start.saturating_sub(1))
            .take(end.saturating_sub(start) + 1)
            .fold(String::new(), |mut out, line| {
                out.push_str(line);
                out.push('\n');
                out
            })
    }
}

/// Count lines the way a line iterator does; a trailing newline adds nothing
///
/// This is not a count of line breaks: `"a\nb"` is 2 lines and `"a\nb\n"`
/// is also 2, where splitting on `'\n'` would give 2 and 3.
pub fn line_count(contents: &str) -> usize {
    contents.lines().count().max(1)
}

/// Record of a file whose pipeline completed; immutable once committed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileRecord {
    pub id: Uuid,
    pub name: String,
    pub contents: String,
    pub line_count: usize,
    /// Fingerprints later files are matched against
    pub chunks: Vec<Chunk>,
    pub processed_at: DateTime<Utc>,
}

impl FileRecord {
    pub fn from_source(file: &SourceFile) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: file.name.clone(),
            contents: file.contents.clone(),
            line_count: file.line_count(),
            chunks: file.chunks.clone(),
            processed_at: Utc::now(),
        }
    }
}

/// A committed record together with the timers of its completed run
#[derive(Debug, Clone, Serialize)]
pub struct ProcessedFile {
    pub record: Arc<FileRecord>,
    pub timers: TimerSnapshot,
}
