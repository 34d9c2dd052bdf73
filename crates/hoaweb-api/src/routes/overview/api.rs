//! Overview API endpoints - JSON API

use crate::AppState;
use axum::{extract::State, Json};
use hoaweb_core::OverviewBundle;

/// Overview bundle; the planner summary reflects the live planner edits
pub async fn api_overview(State(state): State<AppState>) -> Json<OverviewBundle> {
    let dashboard = state.dashboard.read().await;
    let mut bundle = dashboard.overview();
    bundle.planner = state.planner.read().await.summary();
    Json(bundle)
}
