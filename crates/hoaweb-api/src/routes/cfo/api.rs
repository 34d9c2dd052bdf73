//! CFO API endpoints - JSON API

use crate::{ApiError, ApiResult, AppState};
use axum::{
    extract::{Query, State},
    Json,
};
use hoaweb_config::Scenario;
use hoaweb_core::CfoBundle;
use std::collections::HashMap;

/// CFO bundle for `?scenario=base|optimistic|conservative`
pub async fn api_cfo(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult<Json<CfoBundle>> {
    let scenario = match params.get("scenario") {
        Some(raw) => raw.parse::<Scenario>().map_err(ApiError::bad_request)?,
        None => state.config.forecast.default_scenario,
    };
    let dashboard = state.dashboard.read().await;
    Ok(Json(dashboard.cfo(scenario)))
}
