//! Budget API endpoints - JSON API
//!
//! Endpoints:
//! - api_budget: Current page bundle (opens the page on first use)
//! - api_set_line: Edit one income or expense line
//! - api_use_suggested: Reset one line to its suggested value
//! - api_add_project / api_update_project / api_remove_project: Special projects
//! - api_set_storm_fund: Storm fund set-aside
//!
//! Every mutation answers with the recomputed page bundle.

use crate::{ApiError, ApiResult, AppState};
use axum::{
    extract::{Path, State},
    Json,
};
use hoaweb_core::error::ErrorContext;
use hoaweb_core::{BudgetPage, BudgetSummary, BudgetView, CoreResult, LineRef};
use rust_decimal::Decimal;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct LineEdit {
    #[serde(flatten)]
    pub line: LineRef,
    pub amount: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct NewProject {
    pub name: String,
    #[serde(default)]
    pub amount: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct ProjectUpdate {
    pub name: Option<String>,
    pub amount: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
pub struct AmountBody {
    pub amount: Decimal,
}

/// Run one operation on the page of `year`, opening it if needed
async fn with_page<F>(state: &AppState, year: i32, operation: &str, edit: F) -> ApiResult<Json<BudgetView>>
where
    F: FnOnce(&mut BudgetPage) -> CoreResult<BudgetSummary>,
{
    let context = ErrorContext::new(operation).with_year(year);
    // dashboard before budgets, the same order reload takes them
    let dashboard = state.dashboard.read().await;
    let mut budgets = state.budgets.write().await;
    if !budgets.contains_key(&year) {
        let page = dashboard
            .budget_page(year)
            .map_err(|e| ApiError::logged(e, &context))?;
        budgets.insert(year, page);
    }
    let page = budgets
        .get_mut(&year)
        .ok_or_else(|| ApiError::from(hoaweb_core::CoreError::BudgetNotAvailable { year }))?;

    let summary = edit(page).map_err(|e| ApiError::logged(e, &context))?;
    Ok(Json(BudgetView::new(page, summary)))
}

pub async fn api_budget(State(state): State<AppState>, Path(year): Path<i32>) -> ApiResult<Json<BudgetView>> {
    with_page(&state, year, "budget_view", |page| page.summary()).await
}

pub async fn api_set_line(
    State(state): State<AppState>,
    Path(year): Path<i32>,
    Json(body): Json<LineEdit>,
) -> ApiResult<Json<BudgetView>> {
    with_page(&state, year, "set_amount", |page| page.set_amount(&body.line, body.amount)).await
}

pub async fn api_use_suggested(
    State(state): State<AppState>,
    Path(year): Path<i32>,
    Json(line): Json<LineRef>,
) -> ApiResult<Json<BudgetView>> {
    with_page(&state, year, "use_suggested", |page| page.use_suggested(&line)).await
}

pub async fn api_add_project(
    State(state): State<AppState>,
    Path(year): Path<i32>,
    Json(body): Json<NewProject>,
) -> ApiResult<Json<BudgetView>> {
    with_page(&state, year, "add_special_project", |page| {
        page.add_special_project(&body.name, body.amount)
    })
    .await
}

pub async fn api_update_project(
    State(state): State<AppState>,
    Path((year, id)): Path<(i32, String)>,
    Json(body): Json<ProjectUpdate>,
) -> ApiResult<Json<BudgetView>> {
    if body.name.is_none() && body.amount.is_none() {
        return Err(ApiError::bad_request("Provide a name, an amount or both"));
    }
    with_page(&state, year, "update_special_project", |page| {
        page.update_special_project(&id, body.name.as_deref(), body.amount)
    })
    .await
}

pub async fn api_remove_project(
    State(state): State<AppState>,
    Path((year, id)): Path<(i32, String)>,
) -> ApiResult<Json<BudgetView>> {
    with_page(&state, year, "remove_special_project", |page| page.remove_special_project(&id)).await
}

pub async fn api_set_storm_fund(
    State(state): State<AppState>,
    Path(year): Path<i32>,
    Json(body): Json<AmountBody>,
) -> ApiResult<Json<BudgetView>> {
    with_page(&state, year, "set_storm_fund", |page| page.set_storm_fund(body.amount)).await
}

#[cfg(test)]
mod tests {
    use crate::test_support::{send, state};
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn test_budget_page_and_line_edit() {
        let state = state();
        let (status, body) = send(&state, "GET", "/api/budget/2026", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["summary"]["net"], "420");
        assert_eq!(body["summary"]["reserve_source"], "actuals");

        let edit = json!({"kind": "expense", "category": "Utilities", "name": "Water", "amount": 500});
        let (status, body) = send(&state, "PUT", "/api/budget/2026/lines", Some(edit)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["summary"]["net"], "340");

        let reset = json!({"kind": "expense", "category": "Utilities", "name": "Water"});
        let (_, body) = send(&state, "POST", "/api/budget/2026/lines/suggested", Some(reset)).await;
        assert_eq!(body["summary"]["net"], "420");
    }

    #[tokio::test]
    async fn test_unknown_line_and_negative_amount() {
        let state = state();
        let edit = json!({"kind": "income", "name": "Parking", "amount": 5});
        let (status, body) = send(&state, "PUT", "/api/budget/2026/lines", Some(edit)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "LINE_ITEM_NOT_FOUND");

        let edit = json!({"kind": "income", "name": "Annual Dues Income", "amount": -5});
        let (status, _) = send(&state, "PUT", "/api/budget/2026/lines", Some(edit)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_special_projects_lifecycle() {
        let state = state();
        let (_, body) = send(
            &state,
            "POST",
            "/api/budget/2026/projects",
            Some(json!({"name": "Traffic Study", "amount": 100})),
        )
        .await;
        assert_eq!(body["special_projects"][0]["id"], "special_0");
        assert_eq!(body["summary"]["special_projects_total"], "100");

        let (_, body) = send(
            &state,
            "PUT",
            "/api/budget/2026/projects/special_0",
            Some(json!({"name": "Traffic Calming", "amount": 150})),
        )
        .await;
        assert_eq!(body["special_projects"][0]["name"], "Traffic Calming");
        assert_eq!(body["summary"]["net"], "270");

        let (status, body) = send(&state, "DELETE", "/api/budget/2026/projects/special_0", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["special_projects"], json!([]));

        let (status, _) = send(&state, "DELETE", "/api/budget/2026/projects/special_0", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_rejected_project_update_changes_nothing() {
        let state = state();
        send(
            &state,
            "POST",
            "/api/budget/2026/projects",
            Some(json!({"name": "Traffic Study", "amount": 100})),
        )
        .await;

        let (status, body) = send(
            &state,
            "PUT",
            "/api/budget/2026/projects/special_0",
            Some(json!({"name": "Renamed", "amount": -5})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "INVALID_AMOUNT");

        let (_, body) = send(&state, "GET", "/api/budget/2026", None).await;
        assert_eq!(body["special_projects"][0]["name"], "Traffic Study");
        assert_eq!(body["special_projects"][0]["amount"], "100");
    }

    #[tokio::test]
    async fn test_next_year_reads_handoff() {
        let state = state();
        send(
            &state,
            "PUT",
            "/api/budget/2026/storm-fund",
            Some(json!({"amount": 1000})),
        )
        .await;
        let (status, body) = send(&state, "GET", "/api/budget/2027", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["summary"]["reserve_source"], "handoff");
        // 2025 closes at 10350, 2026 plan net 420
        assert_eq!(body["summary"]["reserve"]["starting"], "10770");

        let (status, body) = send(&state, "GET", "/api/budget/2031", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "BUDGET_NOT_AVAILABLE");
    }
}
