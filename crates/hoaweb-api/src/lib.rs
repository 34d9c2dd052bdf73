//! JSON HTTP API for the dashboard
//!
//! Routes are organized into modules:
//! - routes::overview: Multi-year overview bundle
//! - routes::years: Per-year drill-down
//! - routes::cfo: CFO analytics with scenario selection
//! - routes::budget: Budget pages and editor operations
//! - routes::planner: Historical category planner
//! - routes::settings: Effective configuration

pub mod error;
pub mod routes;

use axum::{
    extract::State,
    routing::{get, post, put},
    Json, Router,
};
use hoaweb_config::Config;
use hoaweb_core::{BudgetPage, CategoryPlanner, Dashboard};
use hoaweb_loader::LoaderRef;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::RwLock;
use tower_http::cors::{Any, CorsLayer};

pub use error::{ApiError, ApiResult};

/// Application state
#[derive(Clone)]
pub struct AppState {
    pub dashboard: Arc<RwLock<Dashboard>>,
    /// Open budget pages by year; each keeps its edits until reload
    pub budgets: Arc<RwLock<HashMap<i32, BudgetPage>>>,
    pub planner: Arc<RwLock<CategoryPlanner>>,
    pub loader: LoaderRef,
    pub config: Config,
}

impl AppState {
    pub fn new(dashboard: Dashboard, loader: LoaderRef) -> Self {
        let config = dashboard.config().clone();
        let planner = dashboard.planner();
        Self {
            dashboard: Arc::new(RwLock::new(dashboard)),
            budgets: Arc::new(RwLock::new(HashMap::new())),
            planner: Arc::new(RwLock::new(planner)),
            loader,
            config,
        }
    }
}

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    use routes::budget::{
        api_add_project, api_budget, api_remove_project, api_set_line, api_set_storm_fund,
        api_update_project, api_use_suggested,
    };
    use routes::cfo::api_cfo;
    use routes::overview::api_overview;
    use routes::planner::{api_planner, api_planner_set, api_planner_suggested};
    use routes::settings::api_settings;
    use routes::years::{api_year, api_years};

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/overview", get(api_overview))
        .route("/api/years", get(api_years))
        .route("/api/years/:year", get(api_year))
        .route("/api/cfo", get(api_cfo))
        .route("/api/budget/:year", get(api_budget))
        .route("/api/budget/:year/lines", put(api_set_line))
        .route("/api/budget/:year/lines/suggested", post(api_use_suggested))
        .route("/api/budget/:year/projects", post(api_add_project))
        .route(
            "/api/budget/:year/projects/:id",
            put(api_update_project).delete(api_remove_project),
        )
        .route("/api/budget/:year/storm-fund", put(api_set_storm_fund))
        .route("/api/planner", get(api_planner))
        .route("/api/planner/:category", put(api_planner_set))
        .route("/api/planner/:category/suggested", post(api_planner_suggested))
        .route("/api/settings", get(api_settings))
        .route("/api/reload", post(api_reload))
        .with_state(state)
        .layer(cors)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

/// Reload dataset and plans from disk; open budget pages and planner edits are dropped
async fn api_reload(State(state): State<AppState>) -> ApiResult<Json<serde_json::Value>> {
    let mut dashboard = state.dashboard.write().await;
    dashboard
        .reload(state.loader.clone())
        .await
        .map_err(|e| ApiError::from_core(e, "reload"))?;

    state.budgets.write().await.clear();
    *state.planner.write().await = dashboard.planner();

    Ok(Json(serde_json::json!({
        "success": true,
        "message": "Financial data reloaded",
        "years": dashboard.dataset().years(),
    })))
}

/// Start the HTTP server
pub async fn start_server(state: AppState) -> std::io::Result<()> {
    let addr = format!("{}:{}", state.config.server.host, state.config.server.port);
    let router = create_router(state);

    let listener = TcpListener::bind(&addr).await?;
    log::info!("Starting hoaweb server on http://{}", addr);
    log::info!("JSON API under /api (overview, years, cfo, budget, planner, settings)");

    axum::serve(listener, router).await?;
    log::info!("Server stopped");
    Ok(())
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use hoaweb_core::MemoryHandoffStore;
    use hoaweb_loader::{BudgetPlan, FinancialDataset, JsonDatasetLoader, LoadedData};
    use std::collections::BTreeMap;

    pub fn state() -> AppState {
        let dataset: FinancialDataset = serde_json::from_str(
            r#"{
                "pnl_data": {
                    "2024": {"income": {"Annual Dues Income": 1000}, "expenses": {"Water": 300, "Electric": 200}},
                    "2025": {"income": {"Annual Dues Income": 1000}, "expenses": {"Water": 400, "Electric": 250}}
                },
                "transactions": [
                    {"date": "2025-01-05", "amount": 120, "year": 2025, "month": 1, "category": "Water", "vendor": "City Utilities"}
                ]
            }"#,
        )
        .unwrap();
        let plan: BudgetPlan = serde_json::from_str(
            r#"{"income": {"Annual Dues Income": 1100}, "expenses": {"Utilities": {"Water": 420, "Electric": 260}}}"#,
        )
        .unwrap();
        let mut plans = BTreeMap::new();
        plans.insert(2026, plan);

        let mut config = Config::default();
        config.data.path = std::path::PathBuf::from("./does-not-exist");
        config.reserve.anchor_balance = rust_decimal_macros::dec!(10000);
        let dashboard = Dashboard::from_data(
            config,
            LoadedData { dataset, plans },
            Arc::new(MemoryHandoffStore::new()),
        );
        AppState::new(dashboard, Arc::new(JsonDatasetLoader))
    }

    pub async fn send(
        state: &AppState,
        method: &str,
        uri: &str,
        body: Option<serde_json::Value>,
    ) -> (axum::http::StatusCode, serde_json::Value) {
        use tower::ServiceExt;

        let request = axum::http::Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(match body {
                Some(json) => axum::body::Body::from(json.to_string()),
                None => axum::body::Body::empty(),
            })
            .unwrap();
        let response = create_router(state.clone()).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, json)
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::{send, state};
    use axum::http::StatusCode;

    #[tokio::test]
    async fn test_health() {
        let (status, _) = send(&state(), "GET", "/api/health", None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_reload_failure_keeps_state() {
        let state = state();
        let (status, body) = send(&state, "POST", "/api/reload", None).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"]["code"], "LOAD_FAILED");

        let (status, body) = send(&state, "GET", "/api/overview", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["latest_year"], 2025);
    }

    #[tokio::test]
    async fn test_settings() {
        let (status, body) = send(&state(), "GET", "/api/settings", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["server"]["port"], 8081);
        assert_eq!(body["reserve"]["handoff_key_pattern"], "end{year}ReserveFund");
    }
}
