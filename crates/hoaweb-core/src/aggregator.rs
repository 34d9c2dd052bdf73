//! Aggregation of P&L snapshots and the transaction ledger.
//!
//! Snapshot totals are ground truth for every headline figure. Rollups built
//! from transactions are a reconciliation view and never replace them. Only
//! positive-amount transactions (outflows) take part in category and vendor
//! rollups.

use hoaweb_loader::{FinancialDataset, Transaction};
use indexmap::IndexMap;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::matcher::{CategoryMatcher, OTHER};
use crate::metrics;
use crate::period::{outflows, YearScope};

pub const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Headline figure of a year
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Income,
    Expenses,
    Net,
}

/// Snapshot totals for one year
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YearTotals {
    pub year: i32,
    pub income: Decimal,
    pub expenses: Decimal,
    pub net: Decimal,
    /// False when the year has no P&L snapshot; the figures are then zero
    pub has_data: bool,
}

impl YearTotals {
    pub fn metric(&self, metric: Metric) -> Decimal {
        match metric {
            Metric::Income => self.income,
            Metric::Expenses => self.expenses,
            Metric::Net => self.net,
        }
    }
}

pub fn year_totals(dataset: &FinancialDataset, year: i32) -> YearTotals {
    match dataset.snapshot(year) {
        Some(snap) => {
            let income = snap.total_income();
            let expenses = snap.total_expenses();
            YearTotals {
                year,
                income,
                expenses,
                net: income - expenses,
                has_data: true,
            }
        }
        None => YearTotals {
            year,
            income: Decimal::ZERO,
            expenses: Decimal::ZERO,
            net: Decimal::ZERO,
            has_data: false,
        },
    }
}

/// Year-over-year change in percent.
///
/// `None` when the prior year is missing or its value is exactly zero.
pub fn year_over_year(dataset: &FinancialDataset, metric: Metric, year: i32) -> Option<Decimal> {
    growth(dataset, metric, year - 1, year)
}

/// Change between two years in percent; `None` when `from` is missing or zero
pub fn growth(dataset: &FinancialDataset, metric: Metric, from: i32, to: i32) -> Option<Decimal> {
    let before = dataset.snapshot(from)?;
    let after = dataset.snapshot(to)?;
    let value = |snap: &hoaweb_loader::PnlSnapshot| match metric {
        Metric::Income => snap.total_income(),
        Metric::Expenses => snap.total_expenses(),
        Metric::Net => snap.net(),
    };
    metrics::percent_change(value(before), value(after))
}

/// A category and an amount
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryAmount {
    pub category: String,
    pub amount: Decimal,
}

/// Expense categories with their snapshot totals across `scope`, largest
/// first. Ties keep the order in which a category first appears in the
/// snapshots (stable sort).
pub fn rank_categories(dataset: &FinancialDataset, scope: YearScope) -> Vec<CategoryAmount> {
    let mut totals: IndexMap<&str, Decimal> = IndexMap::new();
    for year in scope.years(dataset) {
        let Some(snap) = dataset.snapshot(year) else {
            continue;
        };
        for (category, amount) in snap.expenses.iter() {
            *totals.entry(category.as_str()).or_default() += *amount;
        }
    }

    let mut ranked: Vec<CategoryAmount> = totals
        .iter()
        .map(|(category, amount)| CategoryAmount {
            category: category.to_string(),
            amount: *amount,
        })
        .collect();
    ranked.sort_by(|a, b| b.amount.cmp(&a.amount));
    ranked
}

/// Names of the top `k` categories
pub fn top_categories(dataset: &FinancialDataset, scope: YearScope, k: usize) -> Vec<String> {
    rank_categories(dataset, scope)
        .into_iter()
        .take(k)
        .map(|c| c.category)
        .collect()
}

/// Transaction totals of one calendar month
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthTotals {
    pub month: u32,
    pub label: String,
    /// Every candidate in ranked order, then "Other"
    pub by_category: IndexMap<String, Decimal>,
    pub total: Decimal,
}

/// Outflows of a scope split by month and charted category
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthlyRollup {
    pub scope: YearScope,
    pub categories: Vec<String>,
    pub months: Vec<MonthTotals>,
}

impl MonthlyRollup {
    /// Twelve-month series of one bucket
    pub fn series(&self, category: &str) -> Vec<Decimal> {
        self.months
            .iter()
            .map(|m| m.by_category.get(category).copied().unwrap_or_default())
            .collect()
    }

    pub fn category_total(&self, category: &str) -> Decimal {
        self.series(category).into_iter().sum()
    }

    pub fn total(&self) -> Decimal {
        self.months.iter().map(|m| m.total).sum()
    }
}

/// Sum outflows per month and category. Each transaction lands in exactly
/// one bucket: the category the matcher resolves, or "Other".
pub fn monthly_rollup(
    dataset: &FinancialDataset,
    scope: YearScope,
    matcher: &CategoryMatcher<'_>,
) -> MonthlyRollup {
    let mut months: Vec<MonthTotals> = MONTHS
        .iter()
        .enumerate()
        .map(|(idx, label)| {
            let mut by_category: IndexMap<String, Decimal> = matcher
                .candidates()
                .iter()
                .map(|c| (c.clone(), Decimal::ZERO))
                .collect();
            by_category.insert(OTHER.to_string(), Decimal::ZERO);
            MonthTotals {
                month: idx as u32 + 1,
                label: label.to_string(),
                by_category,
                total: Decimal::ZERO,
            }
        })
        .collect();

    for txn in outflows(dataset, scope) {
        let Some(bucket) = month_index(txn).and_then(|idx| months.get_mut(idx)) else {
            log::debug!("Skipping transaction on {} with month {}", txn.date, txn.month);
            continue;
        };
        let category = matcher.bucket(txn);
        if let Some(total) = bucket.by_category.get_mut(category) {
            *total += txn.amount;
        }
        bucket.total += txn.amount;
    }

    MonthlyRollup {
        scope,
        categories: matcher.candidates().to_vec(),
        months,
    }
}

fn month_index(txn: &Transaction) -> Option<usize> {
    (1..=12).contains(&txn.month).then(|| txn.month as usize - 1)
}

/// Spending with one vendor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VendorTotal {
    pub vendor: String,
    pub total: Decimal,
    pub count: usize,
    pub average: Decimal,
}

/// Outflows per vendor, largest first, "Unknown" and empty vendors excluded.
/// The full list is the aggregate; views take the top N for display.
pub fn totals_by_vendor(dataset: &FinancialDataset, scope: YearScope) -> Vec<VendorTotal> {
    let mut totals: IndexMap<&str, (Decimal, usize)> = IndexMap::new();
    for txn in outflows(dataset, scope).filter(|t| t.has_vendor()) {
        let (total, count) = totals.entry(txn.vendor.as_str()).or_default();
        *total += txn.amount;
        *count += 1;
    }

    let mut vendors: Vec<VendorTotal> = totals
        .iter()
        .map(|(vendor, (total, count))| VendorTotal {
            vendor: vendor.to_string(),
            total: *total,
            count: *count,
            average: *total / Decimal::from(*count),
        })
        .collect();
    vendors.sort_by(|a, b| b.total.cmp(&a.total));
    vendors
}

/// Snapshot expenses split into the top `k` categories and an "Other" remainder
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpenseBreakdown {
    pub year: i32,
    pub categories: Vec<CategoryAmount>,
    pub other: Decimal,
    pub total: Decimal,
}

impl ExpenseBreakdown {
    /// Sum of every bucket; always equals `total`
    pub fn bucket_sum(&self) -> Decimal {
        self.categories.iter().map(|c| c.amount).sum::<Decimal>() + self.other
    }
}

pub fn expense_breakdown(dataset: &FinancialDataset, year: i32, k: usize) -> ExpenseBreakdown {
    let ranked = rank_categories(dataset, YearScope::Year(year));
    let total: Decimal = ranked.iter().map(|c| c.amount).sum();
    let categories: Vec<CategoryAmount> = ranked.into_iter().take(k).collect();
    let shown: Decimal = categories.iter().map(|c| c.amount).sum();

    ExpenseBreakdown {
        year,
        categories,
        other: total - shown,
        total,
    }
}

/// A snapshot category with the year's transactions filed under it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryDetail {
    pub category: String,
    pub amount: Decimal,
    /// Share of the year's total expenses in percent
    pub share: Decimal,
    pub transactions: Vec<Transaction>,
}

/// Expense table of a year: snapshot categories largest first, each with the
/// outflows whose raw category equals it, in date order.
pub fn category_details(dataset: &FinancialDataset, year: i32) -> Vec<CategoryDetail> {
    let ranked = rank_categories(dataset, YearScope::Year(year));
    let total: Decimal = ranked.iter().map(|c| c.amount).sum();

    ranked
        .into_iter()
        .map(|c| {
            let mut transactions: Vec<Transaction> = outflows(dataset, YearScope::Year(year))
                .filter(|t| t.category == c.category)
                .cloned()
                .collect();
            transactions.sort_by_key(|t| t.date);
            CategoryDetail {
                share: metrics::share(c.amount, total),
                category: c.category,
                amount: c.amount,
                transactions,
            }
        })
        .collect()
}

/// Largest raw categories of one month
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthHighlight {
    pub month: u32,
    pub label: String,
    pub top: Vec<CategoryAmount>,
    /// Sum of the listed categories only
    pub top_total: Decimal,
}

pub fn month_highlights(dataset: &FinancialDataset, year: i32, n: usize) -> Vec<MonthHighlight> {
    let mut per_month: Vec<IndexMap<&str, Decimal>> = vec![IndexMap::new(); 12];
    for txn in outflows(dataset, YearScope::Year(year)) {
        let Some(map) = month_index(txn).and_then(|idx| per_month.get_mut(idx)) else {
            continue;
        };
        *map.entry(txn.category.as_str()).or_default() += txn.amount;
    }

    per_month
        .into_iter()
        .enumerate()
        .map(|(idx, map)| {
            let mut top: Vec<CategoryAmount> = map
                .iter()
                .map(|(category, amount)| CategoryAmount {
                    category: category.to_string(),
                    amount: *amount,
                })
                .collect();
            top.sort_by(|a, b| b.amount.cmp(&a.amount));
            top.truncate(n);
            MonthHighlight {
                month: idx as u32 + 1,
                label: MONTHS[idx].to_string(),
                top_total: top.iter().map(|c| c.amount).sum(),
                top,
            }
        })
        .collect()
}

/// Snapshot values of one category across years
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryTrend {
    pub category: String,
    /// One value per requested year; zero when the year lacks the category
    pub values: Vec<Decimal>,
    pub total: Decimal,
}

/// Per-year values of the top `k` categories by multi-year total
pub fn category_trends(dataset: &FinancialDataset, k: usize) -> Vec<CategoryTrend> {
    let years = dataset.years();
    rank_categories(dataset, YearScope::All)
        .into_iter()
        .take(k)
        .map(|c| CategoryTrend {
            values: years
                .iter()
                .map(|y| {
                    dataset
                        .snapshot(*y)
                        .and_then(|s| s.expenses.get(&c.category).copied())
                        .unwrap_or_default()
                })
                .collect(),
            category: c.category,
            total: c.amount,
        })
        .collect()
}
