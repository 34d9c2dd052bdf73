//! View bundles handed to the rendering layer

use hoaweb_config::Scenario;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::aggregator::{
    CategoryDetail, CategoryTrend, ExpenseBreakdown, MonthHighlight, MonthlyRollup, VendorTotal,
    MONTHS,
};
use crate::analytics::{
    CashFlowPoint, ForecastRow, Insight, KpiSummary, Recommendation, ReserveAnalysis, VarianceRow,
};
use crate::budget::{BudgetPage, BudgetSummary, LineItem, PlannerSummary, SpecialProject};
use crate::forecast::{Projection, ReserveStep};
use hoaweb_utils::truncate_label;

/// Headline figure with its year-over-year change
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatCard {
    pub label: String,
    pub value: Decimal,
    /// Omitted when the prior year is missing or zero
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change: Option<Decimal>,
}

impl StatCard {
    pub fn new(label: &str, value: Decimal, change: Option<Decimal>) -> Self {
        Self {
            label: label.to_string(),
            value,
            change,
        }
    }
}

/// Chart point with a display label
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartPoint {
    pub label: String,
    pub value: Decimal,
}

/// One line of a monthly chart
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartSeries {
    pub label: String,
    pub category: String,
    pub values: Vec<Decimal>,
}

/// Twelve-month stacked chart built from a rollup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthlyChart {
    pub title: String,
    pub labels: Vec<String>,
    pub series: Vec<ChartSeries>,
    pub totals: Vec<Decimal>,
}

impl MonthlyChart {
    /// Candidate series in ranked order, then "Other"
    pub fn from_rollup(rollup: &MonthlyRollup, label_max_len: usize) -> Self {
        let mut series: Vec<ChartSeries> = rollup
            .categories
            .iter()
            .map(|category| ChartSeries {
                label: truncate_label(category, label_max_len),
                category: category.clone(),
                values: rollup.series(category),
            })
            .collect();
        series.push(ChartSeries {
            label: crate::matcher::OTHER.to_string(),
            category: crate::matcher::OTHER.to_string(),
            values: rollup.series(crate::matcher::OTHER),
        });

        Self {
            title: rollup.scope.description(),
            labels: MONTHS.iter().map(|m| m.to_string()).collect(),
            series,
            totals: rollup.months.iter().map(|m| m.total).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverviewBundle {
    pub years: Vec<i32>,
    pub latest_year: Option<i32>,
    pub stat_cards: Vec<StatCard>,
    /// One chart per history year over the same multi-year candidates
    pub monthly: Vec<MonthlyChart>,
    pub expense_chart: Vec<ChartPoint>,
    pub vendors: Vec<VendorTotal>,
    pub trends: Vec<CategoryTrend>,
    pub planner: PlannerSummary,
}

/// Drill-down of one year; `has_data` false is the empty state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YearBundle {
    pub year: i32,
    pub has_data: bool,
    pub stat_cards: Vec<StatCard>,
    pub monthly: Option<MonthlyChart>,
    pub breakdown: Option<ExpenseBreakdown>,
    pub vendors: Vec<VendorTotal>,
    pub details: Vec<CategoryDetail>,
    pub highlights: Vec<MonthHighlight>,
    pub reserve: Option<ReserveStep>,
}

impl YearBundle {
    pub fn empty(year: i32) -> Self {
        Self {
            year,
            has_data: false,
            stat_cards: Vec::new(),
            monthly: None,
            breakdown: None,
            vendors: Vec::new(),
            details: Vec::new(),
            highlights: Vec::new(),
            reserve: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CfoBundle {
    pub scenario: Scenario,
    pub kpis: KpiSummary,
    pub variance: Vec<VarianceRow>,
    pub forecast: Vec<Projection>,
    pub forecast_table: Vec<ForecastRow>,
    pub cash_flow: Vec<CashFlowPoint>,
    pub expense_trends: Vec<CategoryTrend>,
    pub reserve: ReserveAnalysis,
    pub insights: Vec<Insight>,
    pub recommendations: Vec<Recommendation>,
}

/// Expense lines of one category
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpenseGroup {
    pub category: String,
    pub lines: Vec<LineItem>,
    pub total: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetView {
    pub year: i32,
    pub plan_year: i32,
    pub income: Vec<LineItem>,
    pub expenses: Vec<ExpenseGroup>,
    pub special_projects: Vec<SpecialProject>,
    pub summary: BudgetSummary,
}

impl BudgetView {
    pub fn new(page: &BudgetPage, summary: BudgetSummary) -> Self {
        let editor = &page.editor;
        let expenses = editor
            .categories()
            .into_iter()
            .map(|category| {
                let lines: Vec<LineItem> = editor
                    .expenses
                    .iter()
                    .filter(|l| l.category.as_deref() == Some(category))
                    .cloned()
                    .collect();
                ExpenseGroup {
                    category: category.to_string(),
                    total: lines.iter().map(|l| l.amount).sum(),
                    lines,
                }
            })
            .collect();

        Self {
            year: editor.year,
            plan_year: page.plan_year,
            income: editor.income.clone(),
            expenses,
            special_projects: editor.special_projects.clone(),
            summary,
        }
    }
}
