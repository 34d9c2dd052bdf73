//! Forecast engine
//!
//! Projects income and expense lines forward with fixed growth rules and
//! chains the reserve fund from year to year:
//! `reserve(Y) = reserve(Y-1) + income(Y) - expenses(Y)`.

use hoaweb_config::{ForecastConfig, ReserveConfig, Scenario};
use hoaweb_loader::FinancialDataset;
use indexmap::IndexMap;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::aggregator::year_totals;

/// Growth rates and scenario multipliers
#[derive(Debug, Clone, PartialEq)]
pub struct GrowthRules {
    pub dues_line: String,
    pub dues_growth: Decimal,
    pub other_income_growth: Decimal,
    pub expense_inflation: Decimal,
    pub optimistic_income_multiplier: Decimal,
    pub conservative_expense_multiplier: Decimal,
}

impl Default for GrowthRules {
    fn default() -> Self {
        Self::from(&ForecastConfig::default())
    }
}

impl From<&ForecastConfig> for GrowthRules {
    fn from(config: &ForecastConfig) -> Self {
        Self {
            dues_line: config.dues_line.clone(),
            dues_growth: config.dues_growth,
            other_income_growth: config.other_income_growth,
            expense_inflation: config.expense_inflation,
            optimistic_income_multiplier: config.optimistic_income_multiplier,
            conservative_expense_multiplier: config.conservative_expense_multiplier,
        }
    }
}

impl GrowthRules {
    /// Yearly multiplier of an income line: dues grow faster than the rest
    pub fn income_factor(&self, line: &str) -> Decimal {
        if line == self.dues_line {
            Decimal::ONE + self.dues_growth
        } else {
            Decimal::ONE + self.other_income_growth
        }
    }

    pub fn expense_factor(&self) -> Decimal {
        Decimal::ONE + self.expense_inflation
    }

    /// `(income, expense)` multipliers applied to projected totals
    pub fn scenario_multipliers(&self, scenario: Scenario) -> (Decimal, Decimal) {
        match scenario {
            Scenario::Base => (Decimal::ONE, Decimal::ONE),
            Scenario::Optimistic => (self.optimistic_income_multiplier, Decimal::ONE),
            Scenario::Conservative => (Decimal::ONE, self.conservative_expense_multiplier),
        }
    }
}

/// One projected year
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Projection {
    pub year: i32,
    pub scenario: Scenario,
    /// Per-line projections before any scenario multiplier
    pub income_lines: IndexMap<String, Decimal>,
    pub expense_lines: IndexMap<String, Decimal>,
    /// Totals after the scenario multiplier
    pub income: Decimal,
    pub expenses: Decimal,
    pub net: Decimal,
}

/// Grow every line independently, then apply the scenario to the totals.
pub fn project_year(
    year: i32,
    base_income: &IndexMap<String, Decimal>,
    base_expenses: &IndexMap<String, Decimal>,
    rules: &GrowthRules,
    scenario: Scenario,
) -> Projection {
    let income_lines: IndexMap<String, Decimal> = base_income
        .iter()
        .map(|(name, amount)| (name.clone(), *amount * rules.income_factor(name)))
        .collect();
    let expense_lines: IndexMap<String, Decimal> = base_expenses
        .iter()
        .map(|(name, amount)| (name.clone(), *amount * rules.expense_factor()))
        .collect();

    let (income_mult, expense_mult) = rules.scenario_multipliers(scenario);
    let income = income_lines.values().copied().sum::<Decimal>() * income_mult;
    let expenses = expense_lines.values().copied().sum::<Decimal>() * expense_mult;

    Projection {
        year,
        scenario,
        income_lines,
        expense_lines,
        income,
        expenses,
        net: income - expenses,
    }
}

/// Project `count` years after `base_year` from that year's snapshot.
///
/// Each year grows the previous year's unadjusted lines; the scenario is
/// re-applied to every year's totals, so switching scenario reruns the chain.
pub fn project_chain(
    dataset: &FinancialDataset,
    base_year: i32,
    count: usize,
    rules: &GrowthRules,
    scenario: Scenario,
) -> Vec<Projection> {
    let Some(snapshot) = dataset.snapshot(base_year) else {
        return Vec::new();
    };

    let mut projections: Vec<Projection> = Vec::with_capacity(count);
    let mut income = snapshot.income.clone();
    let mut expenses = snapshot.expenses.clone();
    for step in 1..=count {
        let projection = project_year(base_year + step as i32, &income, &expenses, rules, scenario);
        income = projection.income_lines.clone();
        expenses = projection.expense_lines.clone();
        projections.push(projection);
    }
    projections
}

/// Closing reserve of an actual year, chained from the anchor balance with
/// snapshot net income. Years without a snapshot contribute nothing.
pub fn closing_reserve(dataset: &FinancialDataset, reserve: &ReserveConfig, year: i32) -> Decimal {
    let mut balance = reserve.anchor_balance;
    if year >= reserve.anchor_year {
        for y in (reserve.anchor_year + 1)..=year {
            balance += year_totals(dataset, y).net;
        }
    } else {
        for y in ((year + 1)..=reserve.anchor_year).rev() {
            balance -= year_totals(dataset, y).net;
        }
    }
    balance
}

/// Reserve movement over one year
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReserveStep {
    pub year: i32,
    pub starting: Decimal,
    pub net: Decimal,
    pub ending: Decimal,
    pub storm_fund: Decimal,
    /// Starting reserve less the storm fund set-aside
    pub spendable: Decimal,
}

impl ReserveStep {
    pub fn new(year: i32, starting: Decimal, net: Decimal, storm_fund: Decimal) -> Self {
        Self {
            year,
            starting,
            net,
            ending: starting + net,
            storm_fund,
            spendable: starting - storm_fund,
        }
    }
}
