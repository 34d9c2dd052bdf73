//! Settings API endpoints - JSON API

use crate::AppState;
use axum::{extract::State, Json};
use hoaweb_config::Config;

/// Effective configuration, defaults filled in
pub async fn api_settings(State(state): State<AppState>) -> Json<Config> {
    Json(state.config.clone())
}
