//! Year API endpoints - JSON API

use crate::AppState;
use axum::{
    extract::{Path, State},
    Json,
};
use hoaweb_core::YearBundle;

/// History years of the dataset
pub async fn api_years(State(state): State<AppState>) -> Json<Vec<i32>> {
    let dashboard = state.dashboard.read().await;
    Json(dashboard.dataset().years())
}

/// Year drill-down; a year without data answers with the empty state
pub async fn api_year(State(state): State<AppState>, Path(year): Path<i32>) -> Json<YearBundle> {
    let dashboard = state.dashboard.read().await;
    Json(dashboard.year_view(year))
}
