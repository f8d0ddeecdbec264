//! Append-only history of per-file timing samples

use parking_lot::RwLock;

use crate::types::{TimingEntry, TimingSummary};

/// Shared timing history
#[derive(Debug, Default)]
pub struct StatsLedger {
    entries: RwLock<Vec<TimingEntry>>,
}

impl StatsLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a sample and return the number of samples after it
    pub fn record(&self, entry: TimingEntry) -> usize {
        let mut entries = self.entries.write();
        entries.push(entry);
        entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Snapshot of every sample in record order
    pub fn rows(&self) -> Vec<TimingEntry> {
        self.entries.read().clone()
    }

    /// Averages over the whole history
    ///
    /// Scans every sample on each call, which is O(n) per query. Sums are
    /// accumulated in integer nanoseconds and divided once.
    pub fn summary(&self) -> TimingSummary {
        let entries = self.entries.read();
        let samples = entries.len();
        if samples == 0 {
            return TimingSummary::default();
        }

        let (total_sum, match_sum, line_sum) = entries.iter().fold(
            (0u128, 0u128, 0u128),
            |(total, matched, lines), e| {
                (
                    total + u128::from(e.total_nanos),
                    matched + u128::from(e.match_nanos),
                    lines + e.line_count as u128,
                )
            },
        );
        drop(entries);

        let n = samples as u128;
        let avg_per_line_micros = if line_sum == 0 {
            0.0
        } else {
            (total_sum / line_sum) as f64 / 1_000.0
        };

        TimingSummary {
            samples,
            avg_total_micros: (total_sum / n / 1_000) as u64,
            avg_match_micros: (match_sum / n / 1_000) as u64,
            avg_per_line_micros,
        }
    }

    /// Whether the `processed_count`-th completion triggers a periodic report
    ///
    /// `processed_count` is the post-increment count, so the first completion
    /// is 1. Fires on every positive multiple of `frequency`; a frequency of 0
    /// disables reporting.
    pub fn report_due(processed_count: usize, frequency: usize) -> bool {
        frequency > 0 && processed_count > 0 && processed_count % frequency == 0
    }
}
