//! HTML report endpoints

use axum::{extract::State, response::Html};

use crate::server::pages;
use crate::server::state::AppState;

/// GET / - Clone report
pub async fn view_clones(State(state): State<AppState>) -> Html<String> {
    Html(pages::clones_page(&state))
}

/// GET /timers - Timing statistics
pub async fn view_timers(State(state): State<AppState>) -> Html<String> {
    Html(pages::timers_page(&state))
}
