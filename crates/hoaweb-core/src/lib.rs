//! Dashboard core: category reconciliation, aggregation, forecasting and
//! budget planning over a loaded financial dataset.
//!
//! [`Dashboard`] is the explicit context every view is built from. It owns
//! the immutable input data, the configuration and the hand-off store; all
//! view builders are pure functions of that state.

pub mod aggregator;
pub mod analytics;
pub mod budget;
pub mod error;
pub mod forecast;
pub mod handoff;
pub mod matcher;
pub mod metrics;
pub mod period;
pub mod reports;
pub mod types;

use hoaweb_config::{Config, Scenario};
use hoaweb_loader::{load_all, BudgetPlan, FinancialDataset, LoadedData, LoaderRef};
use rust_decimal::Decimal;

pub use budget::{
    BudgetEditor, BudgetPage, BudgetSummary, CategoryPlanner, LineItem, LineRef, ReserveSource,
    SpecialProject, StartingReserve,
};
pub use error::{CoreError, CoreResult, ErrorSeverity};
pub use handoff::{FileHandoffStore, HandoffRef, HandoffStore, MemoryHandoffStore};
pub use matcher::{CategoryMatcher, KeywordTable, OTHER};
pub use period::YearScope;
pub use reports::{BudgetView, CfoBundle, OverviewBundle, YearBundle};
pub use types::{LabelMatching, Ranking};

use aggregator::{Metric, YearTotals};
use forecast::{GrowthRules, ReserveStep};
use reports::{ChartPoint, MonthlyChart, StatCard};

/// Years projected by the CFO forecast and cash-flow views
const FORECAST_HORIZON: usize = 2;

/// Loaded dashboard state
pub struct Dashboard {
    config: Config,
    data: LoadedData,
    rules: GrowthRules,
    keywords: KeywordTable,
    handoff: HandoffRef,
}

impl Dashboard {
    /// Build from already loaded data
    pub fn from_data(config: Config, data: LoadedData, handoff: HandoffRef) -> Self {
        Self {
            rules: GrowthRules::from(&config.forecast),
            keywords: KeywordTable::from_rules(&config.matcher.keywords),
            config,
            data,
            handoff,
        }
    }

    /// Load the dataset and budget plans; any load failure is fatal
    pub async fn load(config: Config, loader: LoaderRef, handoff: HandoffRef) -> CoreResult<Self> {
        let data = load_all(loader.as_ref(), &config.dataset_path(), &config.budget_plan_glob()).await?;
        log::info!(
            "Loaded {} year(s), {} transaction(s), {} budget plan(s)",
            data.dataset.years().len(),
            data.dataset.transactions.len(),
            data.plans.len()
        );
        Ok(Self::from_data(config, data, handoff))
    }

    /// Re-read the dataset and plans; the current state is kept on failure
    pub async fn reload(&mut self, loader: LoaderRef) -> CoreResult<()> {
        let data = load_all(
            loader.as_ref(),
            &self.config.dataset_path(),
            &self.config.budget_plan_glob(),
        )
        .await?;
        self.data = data;
        log::info!("Reloaded financial data");
        Ok(())
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn dataset(&self) -> &FinancialDataset {
        &self.data.dataset
    }

    pub fn rules(&self) -> &GrowthRules {
        &self.rules
    }

    pub fn handoff(&self) -> &HandoffRef {
        &self.handoff
    }

    fn label_max_len(&self) -> usize {
        self.config.views.label_max_len
    }

    /// Top `k` categories charted by a view; each view keeps its own ranking
    fn candidates(&self, ranking: Ranking, year: i32, k: usize) -> Vec<String> {
        aggregator::top_categories(self.dataset(), ranking.scope(year), k)
    }

    fn stat_cards(&self, year: i32) -> Vec<StatCard> {
        let dataset = self.dataset();
        let totals = aggregator::year_totals(dataset, year);
        let yoy = |metric| aggregator::year_over_year(dataset, metric, year);
        let prior = aggregator::year_totals(dataset, year - 1);
        let margin = metrics::margin(totals.net, totals.income);
        let prior_margin = prior
            .has_data
            .then(|| metrics::margin(prior.net, prior.income));

        vec![
            StatCard::new("Total Income", totals.income, yoy(Metric::Income)),
            StatCard::new("Total Expenses", totals.expenses, yoy(Metric::Expenses)),
            StatCard::new("Net Income", totals.net, yoy(Metric::Net)),
            StatCard::new("Operating Margin", margin, prior_margin.map(|p| margin - p)),
        ]
    }

    // ==================== Views ====================

    /// Overview across every history year
    pub fn overview(&self) -> OverviewBundle {
        let dataset = self.dataset();
        let views = &self.config.views;
        let years = dataset.years();
        let latest_year = dataset.latest_year();

        let candidates = self.candidates(
            Ranking::MultiYear,
            latest_year.unwrap_or_default(),
            views.overview_top_categories,
        );
        let matcher = CategoryMatcher::new(
            &candidates,
            &self.keywords,
            LabelMatching::from_enabled(views.overview_match_labels),
        );
        let monthly = years
            .iter()
            .map(|y| {
                let rollup = aggregator::monthly_rollup(dataset, YearScope::Year(*y), &matcher);
                MonthlyChart::from_rollup(&rollup, self.label_max_len())
            })
            .collect();

        let expense_chart = aggregator::rank_categories(dataset, YearScope::All)
            .into_iter()
            .take(views.expense_chart_top)
            .map(|c| ChartPoint {
                label: hoaweb_utils::truncate_label(&c.category, self.label_max_len()),
                value: c.amount,
            })
            .collect();

        let mut vendors = aggregator::totals_by_vendor(dataset, YearScope::All);
        vendors.truncate(views.top_vendors);

        OverviewBundle {
            stat_cards: latest_year.map(|y| self.stat_cards(y)).unwrap_or_default(),
            monthly,
            expense_chart,
            vendors,
            trends: aggregator::category_trends(dataset, views.trend_top_categories),
            planner: self.planner().summary(),
            years,
            latest_year,
        }
    }

    /// Drill-down of a single year. A year without a snapshot is the empty
    /// state, not an error.
    pub fn year_view(&self, year: i32) -> YearBundle {
        let dataset = self.dataset();
        let views = &self.config.views;
        if dataset.snapshot(year).is_none() {
            log::debug!("No P&L snapshot for {}", year);
            return YearBundle::empty(year);
        }

        let scope = YearScope::Year(year);
        let candidates = self.candidates(Ranking::SingleYear, year, views.year_top_categories);
        let matcher = CategoryMatcher::new(
            &candidates,
            &self.keywords,
            LabelMatching::from_enabled(views.year_match_labels),
        );
        let rollup = aggregator::monthly_rollup(dataset, scope, &matcher);

        let mut vendors = aggregator::totals_by_vendor(dataset, scope);
        vendors.truncate(views.top_vendors);

        let totals: YearTotals = aggregator::year_totals(dataset, year);
        let starting = forecast::closing_reserve(dataset, &self.config.reserve, year - 1);

        YearBundle {
            year,
            has_data: true,
            stat_cards: self.stat_cards(year),
            monthly: Some(MonthlyChart::from_rollup(&rollup, self.label_max_len())),
            breakdown: Some(aggregator::expense_breakdown(dataset, year, views.expense_chart_top)),
            vendors,
            details: aggregator::category_details(dataset, year),
            highlights: aggregator::month_highlights(dataset, year, views.month_highlights),
            reserve: Some(ReserveStep::new(
                year,
                starting,
                totals.net,
                self.config.reserve.storm_fund,
            )),
        }
    }

    /// CFO analytics under one scenario
    pub fn cfo(&self, scenario: Scenario) -> CfoBundle {
        let dataset = self.dataset();
        CfoBundle {
            scenario,
            kpis: analytics::kpis(dataset),
            variance: analytics::variance(dataset),
            forecast: analytics::scenario_forecast(dataset, &self.rules, scenario, FORECAST_HORIZON),
            forecast_table: analytics::forecast_table(dataset, &self.rules),
            cash_flow: analytics::cash_flow(dataset, &self.rules, FORECAST_HORIZON),
            expense_trends: aggregator::category_trends(dataset, self.config.views.cfo_top_categories),
            reserve: analytics::reserve_analysis(dataset),
            insights: analytics::insights(dataset),
            recommendations: analytics::recommendations(dataset, &self.rules),
        }
    }

    /// Historical category planner, freshly seeded
    pub fn planner(&self) -> CategoryPlanner {
        CategoryPlanner::new(self.dataset(), &self.rules)
    }

    // ==================== Budget pages ====================

    /// Years with a budget page: the plan year through one past the last plan file
    pub fn budget_years(&self) -> Vec<i32> {
        match (self.data.plan_year(), self.data.plans.keys().next_back()) {
            (Some(first), Some(last)) => (first..=last + 1).collect(),
            _ => Vec::new(),
        }
    }

    /// First plan year; errors name the year the caller asked for
    fn plan_year(&self, requested: i32) -> CoreResult<i32> {
        self.data
            .plan_year()
            .ok_or(CoreError::BudgetNotAvailable { year: requested })
    }

    /// Seeded (unedited) plan of a budget year. A year with its own plan file
    /// is taken as-is; any other year grows the previous year's seeded plan.
    pub fn seeded_plan(&self, year: i32) -> CoreResult<BudgetPlan> {
        Ok(self.seeded_editor(year)?.to_plan())
    }

    fn seeded_editor(&self, year: i32) -> CoreResult<BudgetEditor> {
        if !self.budget_years().contains(&year) {
            return Err(CoreError::BudgetNotAvailable { year });
        }
        let storm_fund = self.config.reserve.storm_fund;
        match self.data.plans.get(&year) {
            Some(plan) => Ok(BudgetEditor::from_plan(year, plan, storm_fund)),
            None => {
                let prior = self.seeded_plan(year - 1)?;
                Ok(BudgetEditor::grown_from(year, &prior, &self.rules, storm_fund))
            }
        }
    }

    /// Reserve at the end of the last actual year
    pub fn actual_closing_reserve(&self) -> Decimal {
        let reserve = &self.config.reserve;
        let year = self.dataset().latest_year().unwrap_or(reserve.anchor_year);
        forecast::closing_reserve(self.dataset(), reserve, year)
    }

    /// Starting reserve of a budget year computed from seeded plans only,
    /// without reading any hand-off slot
    pub fn planned_starting_reserve(&self, year: i32) -> CoreResult<Decimal> {
        let plan_year = self.plan_year(year)?;
        if year <= plan_year {
            return Ok(self.actual_closing_reserve());
        }
        let prior_start = self.planned_starting_reserve(year - 1)?;
        Ok(prior_start + self.seeded_plan(year - 1)?.net())
    }

    /// Open a budget page seeded for `year`
    pub fn budget_page(&self, year: i32) -> CoreResult<BudgetPage> {
        let plan_year = self.plan_year(year)?;
        let editor = self.seeded_editor(year)?;
        let reserve = &self.config.reserve;

        let starting = if year == plan_year {
            StartingReserve::Fixed {
                amount: self.actual_closing_reserve(),
            }
        } else {
            StartingReserve::Chained {
                key: reserve.handoff_key(year - 1),
                fallback: self.planned_starting_reserve(year)?,
            }
        };

        log::debug!("Opened budget page {} (plan year {})", year, plan_year);
        Ok(BudgetPage::new(
            editor,
            plan_year,
            starting,
            reserve.handoff_key(year),
            self.handoff.clone(),
        ))
    }

    /// Current bundle of a page; recomputing also publishes its hand-off value
    pub fn budget_view(&self, page: &BudgetPage) -> CoreResult<BudgetView> {
        let summary = page.summary()?;
        Ok(BudgetView::new(page, summary))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::collections::BTreeMap;
    use std::sync::Arc;

    fn dataset() -> FinancialDataset {
        serde_json::from_str(
            r#"{
                "pnl_data": {
                    "2024": {
                        "income": {"Annual Dues Income": 1000},
                        "expenses": {"Water": 300, "Electric": 200}
                    },
                    "2025": {
                        "income": {"Annual Dues Income": 1000, "Late Fees": 50},
                        "expenses": {"Water": 400, "Electric": 250, "Pool": 100}
                    }
                },
                "transactions": [
                    {"date": "2025-01-05", "amount": 120, "year": 2025, "month": 1, "category": "Water", "vendor": "City Utilities", "memo": ""},
                    {"date": "2025-01-20", "amount": 80, "year": 2025, "month": 1, "category": "Misc", "vendor": "FPL Electric", "memo": ""},
                    {"date": "2025-02-11", "amount": 60, "year": 2025, "month": 2, "category": "Pool", "vendor": "Unknown", "memo": "chemicals"},
                    {"date": "2025-02-12", "amount": -30, "year": 2025, "month": 2, "category": "Water", "vendor": "City Utilities", "memo": "refund"},
                    {"date": "2024-03-01", "amount": 90, "year": 2024, "month": 3, "category": "Electric", "vendor": "FPL Electric", "memo": ""}
                ]
            }"#,
        )
        .unwrap()
    }

    fn plan_2026() -> BudgetPlan {
        serde_json::from_str(
            r#"{
                "income": {"Annual Dues Income": 1100, "Late Fees": 50},
                "expenses": {"Utilities": {"Water": 420, "Electric": 260}, "Amenities": {"Pool": 110}}
            }"#,
        )
        .unwrap()
    }

    fn dashboard() -> Dashboard {
        let mut plans = BTreeMap::new();
        plans.insert(2026, plan_2026());
        let data = LoadedData {
            dataset: dataset(),
            plans,
        };
        let mut config = Config::default();
        config.reserve.anchor_year = 2024;
        config.reserve.anchor_balance = dec!(10000);
        config.reserve.storm_fund = dec!(5000);
        Dashboard::from_data(config, data, Arc::new(MemoryHandoffStore::new()))
    }

    #[test]
    fn test_overview_bundle() {
        let dash = dashboard();
        let overview = dash.overview();
        assert_eq!(overview.years, vec![2024, 2025]);
        assert_eq!(overview.latest_year, Some(2025));
        assert_eq!(overview.stat_cards[0].value, dec!(1050));
        assert_eq!(overview.stat_cards[0].change, Some(dec!(5)));
        assert_eq!(overview.monthly.len(), 2);
        // FPL Electric lands on Electric through the vendor in heuristic mode
        let jan = &overview.monthly[1];
        let electric = jan.series.iter().find(|s| s.category == "Electric").unwrap();
        assert_eq!(electric.values[0], dec!(80));
        assert_eq!(overview.expense_chart[0].label, "Water");
        // refunds and "Unknown" stay out of the vendor rollup
        assert_eq!(overview.vendors[0].vendor, "FPL Electric");
        assert_eq!(overview.vendors[0].total, dec!(170));
        assert_eq!(overview.vendors.len(), 2);
    }

    #[test]
    fn test_year_view_and_empty_state() {
        let dash = dashboard();
        let view = dash.year_view(2025);
        assert!(view.has_data);
        let monthly = view.monthly.as_ref().unwrap();
        // exact matching: the "Misc" row goes to Other
        let other = monthly.series.iter().find(|s| s.category == OTHER).unwrap();
        assert_eq!(other.values[0], dec!(80));
        let breakdown = view.breakdown.as_ref().unwrap();
        assert_eq!(breakdown.bucket_sum(), dec!(750));
        let reserve = view.reserve.as_ref().unwrap();
        assert_eq!(reserve.starting, dec!(10000));
        assert_eq!(reserve.ending, dec!(10300));

        let empty = dash.year_view(2019);
        assert!(!empty.has_data);
        assert!(empty.stat_cards.is_empty());
    }

    #[test]
    fn test_cfo_bundle_scenario() {
        let dash = dashboard();
        let base = dash.cfo(Scenario::Base);
        let optimistic = dash.cfo(Scenario::Optimistic);
        assert_eq!(base.forecast.len(), 2);
        assert_eq!(optimistic.forecast[0].income, base.forecast[0].income * dec!(1.05));
        assert_eq!(base.cash_flow.len(), 4);
    }

    #[test]
    fn test_budget_years() {
        let dash = dashboard();
        assert_eq!(dash.budget_years(), vec![2026, 2027]);
        assert!(matches!(
            dash.budget_page(2028),
            Err(CoreError::BudgetNotAvailable { year: 2028 })
        ));
    }

    #[test]
    fn test_plan_year_page_starts_from_actuals() {
        let dash = dashboard();
        let page = dash.budget_page(2026).unwrap();
        let summary = page.summary().unwrap();
        // 10000 + (1050 - 750)
        assert_eq!(summary.reserve.starting, dec!(10300));
        assert_eq!(summary.reserve_source, ReserveSource::Actuals);
        assert_eq!(summary.net, dec!(360));
        assert_eq!(summary.reserve.ending, dec!(10660));
        assert_eq!(summary.reserve.spendable, dec!(5300));
        assert_eq!(
            dash.handoff().get("end2026ReserveFund").as_deref(),
            Some("10660")
        );
    }

    #[test]
    fn test_following_year_seeded_by_growth() {
        let dash = dashboard();
        let page = dash.budget_page(2027).unwrap();
        let dues = page.editor.line(&LineRef::income("Annual Dues Income")).unwrap();
        assert_eq!(dues.amount, dec!(1210));
        let late = page.editor.line(&LineRef::income("Late Fees")).unwrap();
        // 51.5 rounds half up
        assert_eq!(late.amount, dec!(52));
        let water = page.editor.line(&LineRef::expense("Utilities", "Water")).unwrap();
        assert_eq!(water.amount, dec!(433));
    }

    #[test]
    fn test_handoff_fallback_round_trip() {
        let dash = dashboard();

        // primary path: the 2026 page publishes, 2027 reads it
        let page_2026 = dash.budget_page(2026).unwrap();
        page_2026.summary().unwrap();
        let page_2027 = dash.budget_page(2027).unwrap();
        let via_handoff = page_2027.summary().unwrap();
        assert_eq!(via_handoff.reserve_source, ReserveSource::Handoff);

        // fallback path: slot cleared, recomputed from the 2026 plan totals
        dash.handoff().remove("end2026ReserveFund").unwrap();
        let via_fallback = page_2027.summary().unwrap();
        assert_eq!(via_fallback.reserve_source, ReserveSource::Fallback);
        assert_eq!(via_fallback.reserve.starting, via_handoff.reserve.starting);
        assert_eq!(via_fallback.reserve.starting, dec!(10660));
    }

    #[test]
    fn test_edit_on_prior_page_flows_to_next() {
        let dash = dashboard();
        let mut page_2026 = dash.budget_page(2026).unwrap();
        let page_2027 = dash.budget_page(2027).unwrap();

        page_2026
            .add_special_project("Entrance Sign", dec!(660))
            .unwrap();
        let summary = page_2027.summary().unwrap();
        assert_eq!(summary.reserve.starting, dec!(10000));
        assert_eq!(summary.reserve_source, ReserveSource::Handoff);
    }

    #[test]
    fn test_budget_view_groups_expenses() {
        let dash = dashboard();
        let page = dash.budget_page(2026).unwrap();
        let view = dash.budget_view(&page).unwrap();
        assert_eq!(view.expenses.len(), 2);
        assert_eq!(view.expenses[0].category, "Utilities");
        assert_eq!(view.expenses[0].total, dec!(680));
        assert_eq!(view.plan_year, 2026);
    }

    #[test]
    fn test_no_plans_means_no_budget() {
        let data = LoadedData {
            dataset: dataset(),
            plans: BTreeMap::new(),
        };
        let dash = Dashboard::from_data(Config::default(), data, Arc::new(MemoryHandoffStore::new()));
        assert!(dash.budget_years().is_empty());
        assert!(matches!(
            dash.budget_page(2026),
            Err(CoreError::BudgetNotAvailable { year: 2026 })
        ));
        assert!(matches!(
            dash.planned_starting_reserve(2027),
            Err(CoreError::BudgetNotAvailable { year: 2027 })
        ));
    }

    #[tokio::test]
    async fn test_load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("data.json"),
            serde_json::to_string(&dataset()).unwrap(),
        )
        .unwrap();
        std::fs::write(
            dir.path().join("budget-2026-data.json"),
            serde_json::to_string(&plan_2026()).unwrap(),
        )
        .unwrap();

        let mut config = Config::default();
        config.data.path = dir.path().to_path_buf();
        let loader: LoaderRef = Arc::new(hoaweb_loader::JsonDatasetLoader);
        let handoff: HandoffRef = Arc::new(FileHandoffStore::open(config.handoff_path()));

        let mut dash = Dashboard::load(config, loader.clone(), handoff).await.unwrap();
        assert_eq!(dash.budget_years(), vec![2026, 2027]);
        dash.reload(loader).await.unwrap();

        std::fs::remove_file(dir.path().join("data.json")).unwrap();
        let loader: LoaderRef = Arc::new(hoaweb_loader::JsonDatasetLoader);
        assert!(dash.reload(loader).await.is_err());
        assert_eq!(dash.dataset().years(), vec![2024, 2025]);
    }
}
