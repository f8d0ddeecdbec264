//! JSON read-side endpoints

use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;

use crate::server::state::AppState;
use crate::timer::TimerSnapshot;
use crate::types::{CloneGroup, StatisticsSummary, TimingEntry, TimingSummary};

#[derive(Debug, Serialize)]
pub struct StatisticsResponse {
    #[serde(flatten)]
    pub summary: StatisticsSummary,
    /// Engine's running processed-file count
    pub processed: usize,
    /// Pipelines still running
    pub in_flight: usize,
}

#[derive(Debug, Serialize)]
pub struct TimingHistoryResponse {
    pub summary: TimingSummary,
    pub rows: Vec<TimingRow>,
}

#[derive(Debug, Serialize)]
pub struct TimingRow {
    pub file_name: String,
    pub total_micros: u64,
    pub match_micros: u64,
    pub line_count: usize,
    pub micros_per_line: f64,
}

impl From<TimingEntry> for TimingRow {
    fn from(entry: TimingEntry) -> Self {
        Self {
            micros_per_line: entry.per_line_cost(),
            total_micros: entry.total_micros(),
            match_micros: entry.match_micros(),
            line_count: entry.line_count,
            file_name: entry.file_name,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LastProcessedResponse {
    pub name: Option<String>,
    pub timers: Option<TimerSnapshot>,
}

/// GET /api/stats
pub async fn statistics(State(state): State<AppState>) -> Json<StatisticsResponse> {
    Json(StatisticsResponse {
        summary: state.statistics_summary(),
        processed: state.processed_file_count(),
        in_flight: state.in_flight(),
    })
}

/// GET /api/clones
pub async fn list_clones(State(state): State<AppState>) -> Json<Vec<Arc<CloneGroup>>> {
    Json(state.list_clones())
}

/// GET /api/files
pub async fn list_files(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.list_processed_files())
}

/// GET /api/timers
pub async fn timing_history(State(state): State<AppState>) -> Json<TimingHistoryResponse> {
    Json(TimingHistoryResponse {
        summary: state.timing_history_summary(),
        rows: state
            .timing_history_rows()
            .into_iter()
            .map(TimingRow::from)
            .collect(),
    })
}

/// GET /api/last
pub async fn last_processed(State(state): State<AppState>) -> Json<LastProcessedResponse> {
    Json(LastProcessedResponse {
        name: state.last_processed_name(),
        timers: state.last_processed_timers(),
    })
}
