//! Periodic operational summary

use serde::Serialize;

use crate::timer::TimerSnapshot;

/// Summary logged every `report_frequency` completions
#[derive(Debug, Clone, Serialize)]
pub struct OperationalSummary {
    pub processed_files: usize,
    pub clones: usize,
    pub last_file: String,
    pub last_timers: TimerSnapshot,
    pub url: String,
}

impl OperationalSummary {
    /// Write the summary to the operational log
    pub fn emit(&self) {
        tracing::info!(
            "Processed {} files and found {} clones.",
            self.processed_files,
            self.clones
        );
        tracing::info!(
            "Timers for last file processed ({}): {}",
            self.last_file,
            self.last_timers.render_micros()
        );
        tracing::info!("List of found clones available at {}", self.url);
    }
}
