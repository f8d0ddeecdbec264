//! Core types for the clone-detection pipeline

pub mod clone;
pub mod file;
pub mod stats;

pub use clone::{CloneGroup, CloneTarget};
pub use file::{Chunk, FileRecord, ProcessedFile, SourceFile, SourceLine};
pub use stats::{StatisticsSummary, TimingEntry, TimingSummary};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Analysis engine stage
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Preprocess,
    Transform,
    MatchDetect,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Preprocess => "preprocess",
            Stage::Transform => "transform",
            Stage::MatchDetect => "match_detect",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
