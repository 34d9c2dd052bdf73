//! CFO analytics: KPIs, variance, forecast tables, reserve coverage,
//! insights and recommendations over the history years.

use hoaweb_config::Scenario;
use hoaweb_loader::FinancialDataset;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::aggregator::{growth, year_totals, Metric, YearTotals};
use crate::forecast::{project_chain, GrowthRules, Projection};
use crate::metrics;
use crate::types::{InsightKind, Priority, ReserveHealth};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YearKpi {
    pub year: i32,
    pub income: Decimal,
    pub expenses: Decimal,
    pub net: Decimal,
    pub margin: Decimal,
    /// `expenses / income * 100`, 0 without income
    pub expense_ratio: Decimal,
}

impl From<&YearTotals> for YearKpi {
    fn from(t: &YearTotals) -> Self {
        Self {
            year: t.year,
            income: t.income,
            expenses: t.expenses,
            net: t.net,
            margin: metrics::margin(t.net, t.income),
            expense_ratio: metrics::share(t.expenses, t.income),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KpiSummary {
    pub years: Vec<YearKpi>,
    pub average_income: Decimal,
    pub average_expenses: Decimal,
    pub average_margin: Decimal,
    /// First to last history year
    pub income_growth: Option<Decimal>,
    pub expense_growth: Option<Decimal>,
    /// Latest margin less the first year's margin, in points
    pub margin_change: Decimal,
    /// Latest margin above the previous year's
    pub margin_improving: bool,
}

fn history(dataset: &FinancialDataset) -> Vec<YearTotals> {
    dataset.years().into_iter().map(|y| year_totals(dataset, y)).collect()
}

fn first_last(dataset: &FinancialDataset) -> Option<(i32, i32)> {
    let years = dataset.years();
    Some((*years.first()?, *years.last()?))
}

pub fn kpis(dataset: &FinancialDataset) -> KpiSummary {
    let years: Vec<YearKpi> = history(dataset).iter().map(YearKpi::from).collect();
    let column = |f: fn(&YearKpi) -> Decimal| years.iter().map(f).collect::<Vec<_>>();

    let (income_growth, expense_growth) = match first_last(dataset) {
        Some((first, last)) => (
            growth(dataset, Metric::Income, first, last),
            growth(dataset, Metric::Expenses, first, last),
        ),
        None => (None, None),
    };

    let latest = years.last().map(|k| k.margin).unwrap_or_default();
    let first = years.first().map(|k| k.margin).unwrap_or_default();
    let previous = years
        .len()
        .checked_sub(2)
        .and_then(|i| years.get(i))
        .map(|k| k.margin);

    KpiSummary {
        average_income: metrics::average(&column(|k| k.income)),
        average_expenses: metrics::average(&column(|k| k.expenses)),
        average_margin: metrics::average(&column(|k| k.margin)),
        income_growth,
        expense_growth,
        margin_change: latest - first,
        margin_improving: previous.map(|p| latest > p).unwrap_or(false),
        years,
    }
}

/// One metric across the history years
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VarianceRow {
    pub metric: Metric,
    pub values: Vec<Decimal>,
    /// Latest vs previous year, percent; income and expenses only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yoy_percent: Option<Decimal>,
    /// Latest vs first year, percent; income and expenses only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub multi_year_percent: Option<Decimal>,
    pub yoy_delta: Decimal,
    pub multi_year_delta: Decimal,
}

pub fn variance(dataset: &FinancialDataset) -> Vec<VarianceRow> {
    let totals = history(dataset);
    let years: Vec<i32> = totals.iter().map(|t| t.year).collect();

    [Metric::Income, Metric::Expenses, Metric::Net]
        .into_iter()
        .map(|metric| {
            let values: Vec<Decimal> = totals.iter().map(|t| t.metric(metric)).collect();
            let last = values.last().copied().unwrap_or_default();
            let prev = values.len().checked_sub(2).map(|i| values[i]).unwrap_or_default();
            let first = values.first().copied().unwrap_or_default();
            let percent = |from: usize| match (metric, years.get(from), years.last()) {
                (Metric::Net, _, _) => None,
                (_, Some(a), Some(b)) if a != b => growth(dataset, metric, *a, *b),
                _ => None,
            };
            VarianceRow {
                metric,
                yoy_percent: percent(years.len().saturating_sub(2)),
                multi_year_percent: percent(0),
                yoy_delta: if values.len() >= 2 { last - prev } else { Decimal::ZERO },
                multi_year_delta: last - first,
                values,
            }
        })
        .collect()
}

/// Category forecast row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastRow {
    pub category: String,
    /// One value per history year, zero where absent
    pub values: Vec<Decimal>,
    pub average: Decimal,
    pub first_year: Decimal,
    pub second_year: Decimal,
    /// Second forecast year vs latest actual, percent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change: Option<Decimal>,
}

pub fn forecast_table(dataset: &FinancialDataset, rules: &GrowthRules) -> Vec<ForecastRow> {
    let years = dataset.years();
    let mut categories: Vec<&str> = Vec::new();
    for snap in years.iter().filter_map(|y| dataset.snapshot(*y)) {
        for category in snap.expenses.keys().map(String::as_str) {
            if !categories.contains(&category) {
                categories.push(category);
            }
        }
    }

    let mut rows: Vec<ForecastRow> = categories
        .into_iter()
        .map(|category| {
            let values: Vec<Decimal> = years
                .iter()
                .map(|y| {
                    dataset
                        .snapshot(*y)
                        .and_then(|s| s.expenses.get(category).copied())
                        .unwrap_or_default()
                })
                .collect();
            let average = metrics::average(&values);
            let first_year = metrics::grow(average, rules.expense_inflation);
            let second_year = metrics::grow(first_year, rules.expense_inflation);
            let latest = values.last().copied().unwrap_or_default();
            ForecastRow {
                category: category.to_string(),
                average,
                first_year,
                second_year,
                change: metrics::percent_change(latest, second_year),
                values,
            }
        })
        .collect();
    rows.sort_by(|a, b| b.average.cmp(&a.average));
    rows
}

/// A year on the cash-flow chart
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CashFlowPoint {
    pub year: i32,
    pub net: Decimal,
    pub projected: bool,
}

/// Historical nets followed by `horizon` base-scenario projected nets
pub fn cash_flow(dataset: &FinancialDataset, rules: &GrowthRules, horizon: usize) -> Vec<CashFlowPoint> {
    let mut points: Vec<CashFlowPoint> = history(dataset)
        .into_iter()
        .map(|t| CashFlowPoint {
            year: t.year,
            net: t.net,
            projected: false,
        })
        .collect();
    if let Some(base) = dataset.latest_year() {
        points.extend(
            project_chain(dataset, base, horizon, rules, Scenario::Base)
                .into_iter()
                .map(|p| CashFlowPoint {
                    year: p.year,
                    net: p.net,
                    projected: true,
                }),
        );
    }
    points
}

/// Forecast for the active scenario
pub fn scenario_forecast(
    dataset: &FinancialDataset,
    rules: &GrowthRules,
    scenario: Scenario,
    horizon: usize,
) -> Vec<Projection> {
    match dataset.latest_year() {
        Some(base) => project_chain(dataset, base, horizon, rules, scenario),
        None => Vec::new(),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReserveAnalysis {
    pub cumulative_net: Decimal,
    pub average_expenses: Decimal,
    pub months_of_reserves: Decimal,
    pub health: ReserveHealth,
    /// Six months of average expenses
    pub recommended: Decimal,
}

pub fn reserve_analysis(dataset: &FinancialDataset) -> ReserveAnalysis {
    let totals = history(dataset);
    let cumulative_net: Decimal = totals.iter().map(|t| t.net).sum();
    let expenses: Vec<Decimal> = totals.iter().map(|t| t.expenses).collect();
    let average_expenses = metrics::average(&expenses);
    let months_of_reserves = if average_expenses.is_zero() {
        Decimal::ZERO
    } else {
        cumulative_net / average_expenses * dec!(12)
    };
    let health = if months_of_reserves < dec!(3) {
        ReserveHealth::Critical
    } else if months_of_reserves < dec!(6) {
        ReserveHealth::Low
    } else {
        ReserveHealth::Healthy
    };

    ReserveAnalysis {
        cumulative_net,
        average_expenses,
        months_of_reserves,
        health,
        recommended: average_expenses * dec!(0.5),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Insight {
    pub kind: InsightKind,
    pub title: String,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    pub priority: Priority,
    pub title: String,
    pub text: String,
}

/// Values of each category over the years where it is present
fn category_histories(dataset: &FinancialDataset) -> Vec<(String, Vec<Decimal>)> {
    let mut histories: Vec<(String, Vec<Decimal>)> = Vec::new();
    for snap in dataset.years().into_iter().filter_map(|y| dataset.snapshot(y)) {
        for (category, amount) in snap.expenses.iter() {
            match histories.iter_mut().find(|(c, _)| c == category) {
                Some((_, values)) => values.push(*amount),
                None => histories.push((category.to_string(), vec![*amount])),
            }
        }
    }
    histories
}

fn pct(value: Decimal, dp: u32) -> String {
    value.round_dp(dp).to_string()
}

pub fn insights(dataset: &FinancialDataset) -> Vec<Insight> {
    let mut insights = Vec::new();
    let Some((first, last)) = first_last(dataset) else {
        return insights;
    };
    let income_growth = growth(dataset, Metric::Income, first, last);
    let expense_growth = growth(dataset, Metric::Expenses, first, last);

    if let Some(g) = income_growth.filter(|g| *g > dec!(5)) {
        insights.push(Insight {
            kind: InsightKind::Positive,
            title: "Strong Income Growth".to_string(),
            text: format!("Income has grown {}% from {} to {}.", pct(g, 1), first, last),
        });
    }

    if let (Some(e), Some(i)) = (expense_growth, income_growth) {
        if e > i {
            insights.push(Insight {
                kind: InsightKind::Warning,
                title: "Expense Growth Exceeding Income".to_string(),
                text: format!(
                    "Expenses grew {}% while income grew {}%, narrowing margins.",
                    pct(e, 1),
                    pct(i, 1)
                ),
            });
        }
    }

    let mut drivers: Vec<(String, Decimal)> = category_histories(dataset)
        .into_iter()
        .map(|(c, values)| (c, metrics::average(&values)))
        .collect();
    drivers.sort_by(|a, b| b.1.cmp(&a.1));
    drivers.truncate(3);
    if !drivers.is_empty() {
        let latest = year_totals(dataset, last);
        let names: Vec<&str> = drivers.iter().map(|(c, _)| c.as_str()).collect();
        let share = metrics::share(drivers.iter().map(|(_, a)| *a).sum(), latest.expenses);
        insights.push(Insight {
            kind: InsightKind::Info,
            title: "Top Expense Drivers".to_string(),
            text: format!(
                "Largest expenses: {}. These represent {}% of total expenses.",
                names.join(", "),
                pct(share, 0)
            ),
        });
    }

    let latest = year_totals(dataset, last);
    let margin = metrics::margin(latest.net, latest.income);
    if margin < Decimal::ZERO {
        insights.push(Insight {
            kind: InsightKind::Danger,
            title: "Negative Operating Margin".to_string(),
            text: format!(
                "{} shows a negative margin of {}%, indicating expenses exceed income.",
                last,
                pct(margin, 1)
            ),
        });
    }

    insights
}

pub fn recommendations(dataset: &FinancialDataset, rules: &GrowthRules) -> Vec<Recommendation> {
    let mut recs = vec![Recommendation {
        priority: Priority::High,
        title: format!("Implement {}% Dues Increase", pct(rules.dues_growth * dec!(100), 0)),
        text: "The planned dues increase is needed to restore positive operating margins.".to_string(),
    }];

    let totals = history(dataset);
    if let [.., previous, latest] = totals.as_slice() {
        if latest.expenses > previous.expenses {
            let yoy = metrics::percent_change(previous.expenses, latest.expenses).unwrap_or_default();
            recs.push(Recommendation {
                priority: Priority::Medium,
                title: "Review Expense Growth".to_string(),
                text: format!(
                    "Expenses grew {}% in {}. Conduct a line-item review to find savings.",
                    pct(yoy, 1),
                    latest.year
                ),
            });
        }
    }

    let cumulative: Decimal = totals.iter().map(|t| t.net).sum();
    if cumulative < Decimal::ZERO {
        recs.push(Recommendation {
            priority: Priority::High,
            title: "Build Reserve Fund".to_string(),
            text: "Net income trends suggest the reserve fund may be declining. Build reserves to six months of operating expenses.".to_string(),
        });
    }

    let mut growing: Vec<(String, Decimal)> = category_histories(dataset)
        .into_iter()
        .filter(|(_, v)| v.len() >= 2 && v[v.len() - 1] > v[0])
        .filter_map(|(c, v)| metrics::percent_change(v[0], v[v.len() - 1]).map(|g| (c, g)))
        .collect();
    growing.sort_by(|a, b| b.1.cmp(&a.1));
    growing.truncate(3);
    if !growing.is_empty() {
        let list: Vec<String> = growing
            .iter()
            .map(|(c, g)| format!("{} (+{}%)", c, pct(*g, 0)))
            .collect();
        recs.push(Recommendation {
            priority: Priority::Medium,
            title: "Monitor Growing Expense Categories".to_string(),
            text: format!("Top growing expenses: {}.", list.join(", ")),
        });
    }

    recs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three_years() -> FinancialDataset {
        serde_json::from_str(
            r#"{"pnl_data": {
                "2023": {"income": {"A": 100}, "expenses": {"B": 50}},
                "2024": {"income": {"A": 110}, "expenses": {"B": 55}},
                "2025": {"income": {"A": 121}, "expenses": {"B": 60.5}}
            }}"#,
        )
        .unwrap()
    }

    fn losing() -> FinancialDataset {
        serde_json::from_str(
            r#"{"pnl_data": {
                "2024": {"income": {"Annual Dues Income": 100}, "expenses": {"Water": 40, "Legal Fees": 0, "Gas": 30}},
                "2025": {"income": {"Annual Dues Income": 100}, "expenses": {"Water": 80, "Legal Fees": 50, "Gas": 20}}
            }}"#,
        )
        .unwrap()
    }

    #[test]
    fn test_end_to_end_growth_and_margin() {
        let summary = kpis(&three_years());
        assert_eq!(summary.income_growth, Some(dec!(21)));
        assert_eq!(summary.expense_growth, Some(dec!(21)));
        let latest = summary.years.last().unwrap();
        assert_eq!(latest.margin, dec!(50));
        assert_eq!(latest.expense_ratio, dec!(50));
        assert_eq!(summary.average_income, dec!(331) / dec!(3));
        assert_eq!(summary.margin_change, Decimal::ZERO);
        assert!(!summary.margin_improving);
    }

    #[test]
    fn test_variance_rows() {
        let rows = variance(&three_years());
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].yoy_percent, Some(dec!(10)));
        assert_eq!(rows[0].multi_year_percent, Some(dec!(21)));
        assert_eq!(rows[2].metric, Metric::Net);
        assert_eq!(rows[2].yoy_percent, None);
        assert_eq!(rows[2].yoy_delta, dec!(5.5));
        assert_eq!(rows[2].multi_year_delta, dec!(10.5));
    }

    #[test]
    fn test_forecast_table() {
        let rows = forecast_table(&three_years(), &GrowthRules::default());
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].average, dec!(55.5));
        assert_eq!(rows[0].first_year, dec!(57.165));
        assert_eq!(rows[0].second_year, dec!(58.87995));
        assert!(rows[0].change.is_some());

        let rows = forecast_table(&losing(), &GrowthRules::default());
        assert_eq!(rows[0].category, "Water");
        // latest actual never zero here; an absent latest value omits the change
        let data: FinancialDataset = serde_json::from_str(
            r#"{"pnl_data": {"2024": {"expenses": {"Pool": 10}}, "2025": {"expenses": {}}}}"#,
        )
        .unwrap();
        assert_eq!(forecast_table(&data, &GrowthRules::default())[0].change, None);
    }

    #[test]
    fn test_reserve_analysis_bands() {
        let analysis = reserve_analysis(&three_years());
        // cumulative 50+55+60.5=165.5, avg expenses 55.1666..
        assert_eq!(analysis.cumulative_net, dec!(165.5));
        assert_eq!(analysis.health, ReserveHealth::Healthy);

        let analysis = reserve_analysis(&losing());
        assert_eq!(analysis.cumulative_net, dec!(-20));
        assert_eq!(analysis.health, ReserveHealth::Critical);
        assert_eq!(analysis.recommended, dec!(55));

        let empty = reserve_analysis(&FinancialDataset::default());
        assert_eq!(empty.months_of_reserves, Decimal::ZERO);
    }

    #[test]
    fn test_insights() {
        let found = insights(&three_years());
        let titles: Vec<&str> = found.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["Strong Income Growth", "Top Expense Drivers"]);

        let found = insights(&losing());
        let kinds: Vec<InsightKind> = found.iter().map(|i| i.kind).collect();
        assert_eq!(
            kinds,
            vec![InsightKind::Warning, InsightKind::Info, InsightKind::Danger]
        );
        assert!(insights(&FinancialDataset::default()).is_empty());
    }

    #[test]
    fn test_recommendations() {
        let recs = recommendations(&losing(), &GrowthRules::default());
        let titles: Vec<&str> = recs.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(
            titles,
            vec![
                "Implement 10% Dues Increase",
                "Review Expense Growth",
                "Build Reserve Fund",
                "Monitor Growing Expense Categories"
            ]
        );
        // Legal Fees grew from zero and is skipped; Gas shrank
        assert_eq!(recs[3].text, "Top growing expenses: Water (+100%).");
    }

    #[test]
    fn test_cash_flow_appends_projection() {
        let points = cash_flow(&three_years(), &GrowthRules::default(), 2);
        assert_eq!(points.len(), 5);
        assert!(!points[2].projected);
        assert!(points[3].projected);
        assert_eq!(points[3].year, 2026);
        // A is not the dues line: 121*1.03 - 60.5*1.03
        assert_eq!(points[3].net, dec!(62.315));
    }
}
