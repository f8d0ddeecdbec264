//! HTTP routes for the consumer server

pub mod api;
pub mod reports;
pub mod upload;

use axum::{routing::get, Router};

use crate::server::state::AppState;

/// Upload endpoint and HTML report pages
pub fn report_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(reports::view_clones).post(upload::receive_file))
        .route("/timers", get(reports::view_timers))
}

/// JSON read-side endpoints
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/stats", get(api::statistics))
        .route("/clones", get(api::list_clones))
        .route("/files", get(api::list_files))
        .route("/timers", get(api::timing_history))
        .route("/last", get(api::last_processed))
        .route("/info", get(info))
}

/// API info endpoint
async fn info() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "name": "codestream-consumer",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Clone-detection ingestion service",
        "endpoints": {
            "POST /": "Upload a file (multipart fields: name, data)",
            "GET /": "Clone report",
            "GET /timers": "Timing statistics",
            "GET /api/stats": "File and clone counts",
            "GET /api/clones": "All clone groups",
            "GET /api/files": "Processed file names",
            "GET /api/timers": "Timing summary and history",
            "GET /api/last": "Timers of the last processed file"
        }
    }))
}
