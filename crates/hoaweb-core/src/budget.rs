//! Budget editor state
//!
//! A budget page is an explicit state value: income lines, expense lines
//! grouped by category, free-form special projects and a storm fund. Every
//! edit recomputes the whole summary synchronously; there is no other
//! source of truth.

use hoaweb_loader::{BudgetPlan, FinancialDataset};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::forecast::{GrowthRules, ReserveStep};
use crate::handoff::{self, HandoffRef};
use crate::metrics;
use crate::types::LineKind;
use hoaweb_utils::{line_item_id, slug};

/// One editable budget line
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineItem {
    pub id: String,
    pub kind: LineKind,
    /// Expense category; `None` for income lines
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub name: String,
    /// Value the suggestion was derived from
    pub prior: Decimal,
    pub suggested: Decimal,
    pub amount: Decimal,
}

/// Address of a budget line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum LineRef {
    Income { name: String },
    Expense { category: String, name: String },
}

impl LineRef {
    pub fn income(name: &str) -> Self {
        LineRef::Income {
            name: name.to_string(),
        }
    }

    pub fn expense(category: &str, name: &str) -> Self {
        LineRef::Expense {
            category: category.to_string(),
            name: name.to_string(),
        }
    }
}

impl std::fmt::Display for LineRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LineRef::Income { name } => write!(f, "income / {}", name),
            LineRef::Expense { category, name } => write!(f, "{} / {}", category, name),
        }
    }
}

/// User-added expense line outside the canonical categories
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecialProject {
    pub id: String,
    pub name: String,
    pub amount: Decimal,
}

/// Where the starting reserve of a page came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReserveSource {
    /// Closing reserve of the last actual year
    Actuals,
    /// Published by the previous year's page
    Handoff,
    /// Recomputed from the previous year's plan totals
    Fallback,
}

/// How a page obtains its starting reserve
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum StartingReserve {
    /// Known from actual results
    Fixed { amount: Decimal },
    /// Read from the hand-off slot on every recompute, with a fallback value
    Chained { key: String, fallback: Decimal },
}

impl StartingReserve {
    pub fn resolve(&self, store: &HandoffRef) -> (Decimal, ReserveSource) {
        match self {
            StartingReserve::Fixed { amount } => (*amount, ReserveSource::Actuals),
            StartingReserve::Chained { key, fallback } => {
                match handoff::read_reserve(store.as_ref(), key) {
                    Some(value) => (value, ReserveSource::Handoff),
                    None => {
                        log::warn!("Hand-off {} unavailable, using plan fallback {}", key, fallback);
                        (*fallback, ReserveSource::Fallback)
                    }
                }
            }
        }
    }
}

/// Derived totals of a budget page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetSummary {
    pub year: i32,
    pub total_income: Decimal,
    /// Canonical lines plus special projects
    pub total_expenses: Decimal,
    pub special_projects_total: Decimal,
    pub net: Decimal,
    /// `net / income * 100`, 0 without income
    pub margin: Decimal,
    pub reserve: ReserveStep,
    pub reserve_source: ReserveSource,
}

/// Editable budget of one year
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetEditor {
    pub year: i32,
    pub income: Vec<LineItem>,
    pub expenses: Vec<LineItem>,
    pub special_projects: Vec<SpecialProject>,
    pub storm_fund: Decimal,
    next_project: u64,
}

fn expense_line(category: &str, name: &str, prior: Decimal, suggested: Decimal) -> LineItem {
    LineItem {
        id: line_item_id(Some(category), name),
        kind: LineKind::Expense,
        category: Some(category.to_string()),
        name: name.to_string(),
        prior,
        suggested,
        amount: suggested,
    }
}

fn income_line(name: &str, prior: Decimal, suggested: Decimal) -> LineItem {
    LineItem {
        id: line_item_id(None, name),
        kind: LineKind::Income,
        category: None,
        name: name.to_string(),
        prior,
        suggested,
        amount: suggested,
    }
}

fn check_amount(value: Decimal) -> CoreResult<()> {
    if value < Decimal::ZERO {
        return Err(CoreError::InvalidAmount {
            message: format!("{} is negative", value),
        });
    }
    if value > metrics::MAX_AMOUNT {
        return Err(CoreError::InvalidAmount {
            message: format!("{} exceeds the limit of {}", value, metrics::MAX_AMOUNT),
        });
    }
    Ok(())
}

impl BudgetEditor {
    /// Editor seeded with the plan's values as they are
    pub fn from_plan(year: i32, plan: &BudgetPlan, storm_fund: Decimal) -> Self {
        let income = plan
            .income
            .iter()
            .map(|(name, amount)| income_line(name, *amount, *amount))
            .collect();
        let expenses = plan
            .expenses
            .iter()
            .flat_map(|(category, lines)| {
                lines
                    .iter()
                    .map(move |(name, amount)| expense_line(category, name, *amount, *amount))
            })
            .collect();

        Self {
            year,
            income,
            expenses,
            special_projects: Vec::new(),
            storm_fund,
            next_project: 0,
        }
    }

    /// Editor seeded from the prior year's plan: every line becomes
    /// `round(prior * factor)`, with the dues line on its own factor.
    pub fn grown_from(year: i32, prior: &BudgetPlan, rules: &GrowthRules, storm_fund: Decimal) -> Self {
        let income = prior
            .income
            .iter()
            .map(|(name, amount)| {
                income_line(name, *amount, metrics::round_whole(*amount * rules.income_factor(name)))
            })
            .collect();
        let factor = rules.expense_factor();
        let expenses = prior
            .expenses
            .iter()
            .flat_map(|(category, lines)| {
                lines.iter().map(move |(name, amount)| {
                    expense_line(category, name, *amount, metrics::round_whole(*amount * factor))
                })
            })
            .collect();

        Self {
            year,
            income,
            expenses,
            special_projects: Vec::new(),
            storm_fund,
            next_project: 0,
        }
    }

    /// Current amounts as a plan snapshot (special projects excluded)
    pub fn to_plan(&self) -> BudgetPlan {
        let mut plan = BudgetPlan::default();
        for line in &self.income {
            plan.income.insert(line.name.clone(), line.amount);
        }
        for line in &self.expenses {
            plan.expenses
                .entry(line.category.clone().unwrap_or_default())
                .or_default()
                .insert(line.name.clone(), line.amount);
        }
        plan
    }

    /// Expense categories in seed order
    pub fn categories(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for line in &self.expenses {
            if let Some(category) = line.category.as_deref() {
                if !seen.contains(&category) {
                    seen.push(category);
                }
            }
        }
        seen
    }

    fn line_mut(&mut self, line: &LineRef) -> CoreResult<&mut LineItem> {
        let found = match line {
            LineRef::Income { name } => self.income.iter_mut().find(|l| &l.name == name),
            LineRef::Expense { category, name } => self
                .expenses
                .iter_mut()
                .find(|l| l.category.as_deref() == Some(category.as_str()) && &l.name == name),
        };
        found.ok_or_else(|| {
            log::warn!("Edit for unknown budget line {}", line);
            CoreError::LineItemNotFound {
                line: line.to_string(),
            }
        })
    }

    fn project_mut(&mut self, id: &str) -> CoreResult<&mut SpecialProject> {
        self.special_projects
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| CoreError::ProjectNotFound { id: id.to_string() })
    }

    pub fn line(&self, line: &LineRef) -> Option<&LineItem> {
        match line {
            LineRef::Income { name } => self.income.iter().find(|l| &l.name == name),
            LineRef::Expense { category, name } => self
                .expenses
                .iter()
                .find(|l| l.category.as_deref() == Some(category.as_str()) && &l.name == name),
        }
    }

    pub fn set_amount(&mut self, line: &LineRef, value: Decimal) -> CoreResult<()> {
        check_amount(value)?;
        let item = self.line_mut(line)?;
        item.amount = value;
        log::debug!("Budget {}: {} = {}", self.year, line, value);
        Ok(())
    }

    pub fn use_suggested(&mut self, line: &LineRef) -> CoreResult<()> {
        let item = self.line_mut(line)?;
        item.amount = item.suggested;
        Ok(())
    }

    /// Append a project; ids come from a counter that never reuses a value
    pub fn add_special_project(&mut self, name: &str, amount: Decimal) -> CoreResult<&SpecialProject> {
        check_amount(amount)?;
        let id = format!("special_{}", self.next_project);
        self.next_project += 1;
        self.special_projects.push(SpecialProject {
            id,
            name: name.to_string(),
            amount,
        });
        let index = self.special_projects.len() - 1;
        Ok(&self.special_projects[index])
    }

    pub fn rename_special_project(&mut self, id: &str, name: &str) -> CoreResult<()> {
        self.project_mut(id)?.name = name.to_string();
        Ok(())
    }

    /// Rename and re-price in one step; nothing changes unless both succeed
    pub fn update_special_project(
        &mut self,
        id: &str,
        name: Option<&str>,
        amount: Option<Decimal>,
    ) -> CoreResult<()> {
        if let Some(value) = amount {
            check_amount(value)?;
        }
        let project = self.project_mut(id)?;
        if let Some(name) = name {
            project.name = name.to_string();
        }
        if let Some(value) = amount {
            project.amount = value;
        }
        Ok(())
    }

    pub fn set_special_project_amount(&mut self, id: &str, value: Decimal) -> CoreResult<()> {
        check_amount(value)?;
        self.project_mut(id)?.amount = value;
        Ok(())
    }

    pub fn remove_special_project(&mut self, id: &str) -> CoreResult<SpecialProject> {
        let idx = self
            .special_projects
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| CoreError::ProjectNotFound { id: id.to_string() })?;
        Ok(self.special_projects.remove(idx))
    }

    pub fn set_storm_fund(&mut self, value: Decimal) -> CoreResult<()> {
        check_amount(value)?;
        self.storm_fund = value;
        Ok(())
    }

    pub fn total_income(&self) -> Decimal {
        self.income.iter().map(|l| l.amount).sum()
    }

    pub fn special_projects_total(&self) -> Decimal {
        self.special_projects.iter().map(|p| p.amount).sum()
    }

    pub fn total_expenses(&self) -> Decimal {
        self.expenses.iter().map(|l| l.amount).sum::<Decimal>() + self.special_projects_total()
    }

    pub fn net(&self) -> Decimal {
        self.total_income() - self.total_expenses()
    }

    /// Recompute every derived figure for a given starting reserve
    pub fn summarize(&self, starting: Decimal, source: ReserveSource) -> BudgetSummary {
        let total_income = self.total_income();
        let total_expenses = self.total_expenses();
        let net = total_income - total_expenses;
        BudgetSummary {
            year: self.year,
            total_income,
            total_expenses,
            special_projects_total: self.special_projects_total(),
            net,
            margin: metrics::margin(net, total_income),
            reserve: ReserveStep::new(self.year, starting, net, self.storm_fund),
            reserve_source: source,
        }
    }
}

/// A budget page: editor state plus its reserve wiring.
///
/// Every operation recomputes the summary and publishes the closing reserve
/// to the page's hand-off slot.
pub struct BudgetPage {
    pub editor: BudgetEditor,
    pub plan_year: i32,
    starting: StartingReserve,
    publish_key: String,
    handoff: HandoffRef,
}

impl BudgetPage {
    pub fn new(
        editor: BudgetEditor,
        plan_year: i32,
        starting: StartingReserve,
        publish_key: String,
        handoff: HandoffRef,
    ) -> Self {
        Self {
            editor,
            plan_year,
            starting,
            publish_key,
            handoff,
        }
    }

    pub fn starting_reserve(&self) -> &StartingReserve {
        &self.starting
    }

    pub fn publish_key(&self) -> &str {
        &self.publish_key
    }

    /// Recompute the summary and write the closing reserve to the hand-off slot
    pub fn summary(&self) -> CoreResult<BudgetSummary> {
        let (starting, source) = self.starting.resolve(&self.handoff);
        let summary = self.editor.summarize(starting, source);
        handoff::write_reserve(self.handoff.as_ref(), &self.publish_key, summary.reserve.ending)?;
        Ok(summary)
    }

    pub fn set_amount(&mut self, line: &LineRef, value: Decimal) -> CoreResult<BudgetSummary> {
        self.editor.set_amount(line, value)?;
        self.summary()
    }

    pub fn use_suggested(&mut self, line: &LineRef) -> CoreResult<BudgetSummary> {
        self.editor.use_suggested(line)?;
        self.summary()
    }

    pub fn add_special_project(&mut self, name: &str, amount: Decimal) -> CoreResult<BudgetSummary> {
        self.editor.add_special_project(name, amount)?;
        self.summary()
    }

    pub fn update_special_project(
        &mut self,
        id: &str,
        name: Option<&str>,
        amount: Option<Decimal>,
    ) -> CoreResult<BudgetSummary> {
        self.editor.update_special_project(id, name, amount)?;
        self.summary()
    }

    pub fn remove_special_project(&mut self, id: &str) -> CoreResult<BudgetSummary> {
        self.editor.remove_special_project(id)?;
        self.summary()
    }

    pub fn set_storm_fund(&mut self, value: Decimal) -> CoreResult<BudgetSummary> {
        self.editor.set_storm_fund(value)?;
        self.summary()
    }
}

// ==================== Historical planner ====================

/// One category of the history-based planner
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannerRow {
    pub id: String,
    pub category: String,
    /// Average across history years; a missing year counts as zero
    pub average: Decimal,
    pub latest: Decimal,
    pub suggested: Decimal,
    pub budget: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannerSummary {
    pub total_budget: Decimal,
    /// Total budget less the latest year's actual expenses
    pub vs_latest: Decimal,
    /// Average of yearly expense totals
    pub average_total: Decimal,
    pub latest_year: Option<i32>,
}

/// Next-year budget drafted from history: `round(avg * (1 + inflation))`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryPlanner {
    pub rows: Vec<PlannerRow>,
    latest_total: Decimal,
    average_total: Decimal,
    latest_year: Option<i32>,
}

impl CategoryPlanner {
    pub fn new(dataset: &FinancialDataset, rules: &GrowthRules) -> Self {
        let years = dataset.years();
        let mut categories: Vec<&str> = Vec::new();
        for year in &years {
            if let Some(snap) = dataset.snapshot(*year) {
                for category in snap.expenses.keys().map(String::as_str) {
                    if !categories.contains(&category) {
                        categories.push(category);
                    }
                }
            }
        }

        let value = |year: i32, category: &str| {
            dataset
                .snapshot(year)
                .and_then(|s| s.expenses.get(category).copied())
                .unwrap_or_default()
        };
        let latest_year = years.last().copied();

        let mut rows: Vec<PlannerRow> = categories
            .into_iter()
            .map(|category| {
                let values: Vec<Decimal> = years.iter().map(|y| value(*y, category)).collect();
                let average = metrics::average(&values);
                let suggested = metrics::round_whole(average * rules.expense_factor());
                PlannerRow {
                    id: format!("budget_{}", slug(category)),
                    category: category.to_string(),
                    average,
                    latest: latest_year.map(|y| value(y, category)).unwrap_or_default(),
                    suggested,
                    budget: suggested,
                }
            })
            .collect();
        rows.sort_by(|a, b| b.average.cmp(&a.average));

        let totals: Vec<Decimal> = years
            .iter()
            .map(|y| dataset.snapshot(*y).map(|s| s.total_expenses()).unwrap_or_default())
            .collect();

        Self {
            rows,
            latest_total: latest_year
                .and_then(|y| dataset.snapshot(y))
                .map(|s| s.total_expenses())
                .unwrap_or_default(),
            average_total: metrics::average(&totals),
            latest_year,
        }
    }

    fn row_mut(&mut self, category: &str) -> CoreResult<&mut PlannerRow> {
        self.rows
            .iter_mut()
            .find(|r| r.category == category)
            .ok_or_else(|| CoreError::LineItemNotFound {
                line: category.to_string(),
            })
    }

    pub fn set_budget(&mut self, category: &str, value: Decimal) -> CoreResult<PlannerSummary> {
        check_amount(value)?;
        self.row_mut(category)?.budget = value;
        Ok(self.summary())
    }

    pub fn use_suggested(&mut self, category: &str) -> CoreResult<PlannerSummary> {
        let row = self.row_mut(category)?;
        row.budget = row.suggested;
        Ok(self.summary())
    }

    pub fn summary(&self) -> PlannerSummary {
        let total_budget: Decimal = self.rows.iter().map(|r| r.budget).sum();
        PlannerSummary {
            total_budget,
            vs_latest: total_budget - self.latest_total,
            average_total: self.average_total,
            latest_year: self.latest_year,
        }
    }
}
