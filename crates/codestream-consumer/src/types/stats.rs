//! Timing samples and the summaries derived from them

use serde::{Deserialize, Serialize};

/// One completed invocation's timing sample
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimingEntry {
    pub file_name: String,
    pub total_nanos: u64,
    pub match_nanos: u64,
    pub line_count: usize,
}

impl TimingEntry {
    pub fn total_micros(&self) -> u64 {
        self.total_nanos / 1_000
    }

    pub fn match_micros(&self) -> u64 {
        self.match_nanos / 1_000
    }

    /// Total µs per line
    pub fn per_line_cost(&self) -> f64 {
        if self.line_count == 0 {
            return 0.0;
        }
        self.total_nanos as f64 / 1_000.0 / self.line_count as f64
    }
}

/// Averages over the full timing history
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimingSummary {
    pub samples: usize,
    pub avg_total_micros: u64,
    pub avg_match_micros: u64,
    /// Σ total / Σ lines, in µs
    pub avg_per_line_micros: f64,
}

/// File and clone counts for the report header
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatisticsSummary {
    pub files: usize,
    pub clones: usize,
}
