//! Planner API endpoints - JSON API

use crate::{ApiError, ApiResult, AppState};
use axum::{
    extract::{Path, State},
    Json,
};
use hoaweb_core::budget::{PlannerRow, PlannerSummary};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub struct PlannerResponse {
    pub rows: Vec<PlannerRow>,
    pub summary: PlannerSummary,
}

#[derive(Debug, Deserialize)]
pub struct BudgetBody {
    pub amount: Decimal,
}

pub async fn api_planner(State(state): State<AppState>) -> Json<PlannerResponse> {
    let planner = state.planner.read().await;
    Json(PlannerResponse {
        rows: planner.rows.clone(),
        summary: planner.summary(),
    })
}

pub async fn api_planner_set(
    State(state): State<AppState>,
    Path(category): Path<String>,
    Json(body): Json<BudgetBody>,
) -> ApiResult<Json<PlannerSummary>> {
    let mut planner = state.planner.write().await;
    let summary = planner
        .set_budget(&category, body.amount)
        .map_err(|e| ApiError::from_core(e, "planner_set"))?;
    Ok(Json(summary))
}

pub async fn api_planner_suggested(
    State(state): State<AppState>,
    Path(category): Path<String>,
) -> ApiResult<Json<PlannerSummary>> {
    let mut planner = state.planner.write().await;
    let summary = planner
        .use_suggested(&category)
        .map_err(|e| ApiError::from_core(e, "planner_suggested"))?;
    Ok(Json(summary))
}

#[cfg(test)]
mod tests {
    use crate::test_support::{send, state};
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn test_planner_edit_flows_into_overview() {
        let state = state();
        let (status, body) = send(&state, "GET", "/api/planner", None).await;
        assert_eq!(status, StatusCode::OK);
        // Water avg 350 -> 360.5 -> 361 (half up)
        assert_eq!(body["rows"][0]["category"], "Water");
        assert_eq!(body["rows"][0]["suggested"], "361");

        let (status, body) = send(&state, "PUT", "/api/planner/Water", Some(json!({"amount": 400}))).await;
        assert_eq!(status, StatusCode::OK);
        // Electric avg 225 -> 231.75 -> 232
        assert_eq!(body["total_budget"], "632");

        let (_, body) = send(&state, "GET", "/api/overview", None).await;
        assert_eq!(body["planner"]["total_budget"], "632");

        let (_, body) = send(&state, "POST", "/api/planner/Water/suggested", None).await;
        assert_eq!(body["total_budget"], "593");

        let (status, _) = send(&state, "PUT", "/api/planner/Gas", Some(json!({"amount": 1}))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
