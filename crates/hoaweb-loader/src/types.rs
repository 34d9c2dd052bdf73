//! Input data model: transactions, P&L snapshots and budget plans

use chrono::NaiveDate;
use rust_decimal::Decimal;
use indexmap::IndexMap;
use serde::de::Deserializer;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ==================== Financial dataset ====================

fn default_vendor() -> String {
    "Unknown".to_string()
}

/// Reads a string field that may be `null`, treating null as empty
fn nullable_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Reads a mapping that may be `null`, treating null as empty.
///
/// Keys keep document order: category rankings break ties by the order a
/// category first appeared. A repeated key keeps its first position and
/// takes the last value.
fn nullable_map<'de, D, V>(deserializer: D) -> Result<IndexMap<String, V>, D::Error>
where
    D: Deserializer<'de>,
    V: Deserialize<'de>,
{
    Ok(Option::<IndexMap<String, V>>::deserialize(deserializer)?.unwrap_or_default())
}

/// A single ledger row.
///
/// Positive amounts are outflows. Rows are immutable once loaded and carry
/// no id; their position in the ledger is their identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub date: NaiveDate,
    pub amount: Decimal,
    pub year: i32,
    pub month: u32,
    /// Free-text category; empty when the source had none
    #[serde(default, deserialize_with = "nullable_string")]
    pub category: String,
    #[serde(default = "default_vendor", deserialize_with = "nullable_string")]
    pub vendor: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub memo: String,
    /// Source document type (Bill, Check, ...)
    #[serde(default, rename = "type", deserialize_with = "nullable_string")]
    pub kind: String,
}

impl Transaction {
    /// Outflows are the only rows that take part in expense and vendor rollups
    pub fn is_outflow(&self) -> bool {
        self.amount > Decimal::ZERO
    }

    /// Vendor is usable for the vendor rollup
    pub fn has_vendor(&self) -> bool {
        !self.vendor.is_empty() && self.vendor != "Unknown"
    }
}

/// Authoritative income/expense totals for one fiscal year
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PnlSnapshot {
    #[serde(default, deserialize_with = "nullable_map")]
    pub income: IndexMap<String, Decimal>,
    #[serde(default, deserialize_with = "nullable_map")]
    pub expenses: IndexMap<String, Decimal>,
}

impl PnlSnapshot {
    pub fn total_income(&self) -> Decimal {
        self.income.values().copied().sum()
    }

    pub fn total_expenses(&self) -> Decimal {
        self.expenses.values().copied().sum()
    }

    pub fn net(&self) -> Decimal {
        self.total_income() - self.total_expenses()
    }
}

/// Everything in `data.json`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FinancialDataset {
    #[serde(default)]
    pub pnl_data: BTreeMap<i32, PnlSnapshot>,
    #[serde(default)]
    pub transactions: Vec<Transaction>,
    /// Explicit history years; derived from `pnl_data` when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub years: Option<Vec<i32>>,
}

impl FinancialDataset {
    /// History years in ascending order
    pub fn years(&self) -> Vec<i32> {
        match &self.years {
            Some(years) if !years.is_empty() => {
                let mut years = years.clone();
                years.sort_unstable();
                years.dedup();
                years
            }
            _ => self.pnl_data.keys().copied().collect(),
        }
    }

    pub fn snapshot(&self, year: i32) -> Option<&PnlSnapshot> {
        self.pnl_data.get(&year)
    }

    /// Latest year that has a P&L snapshot
    pub fn latest_year(&self) -> Option<i32> {
        self.years()
            .into_iter()
            .rev()
            .find(|y| self.pnl_data.contains_key(y))
    }
}

// ==================== Budget plan ====================

/// A budget snapshot: flat income lines and expense lines grouped by category
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BudgetPlan {
    #[serde(default, deserialize_with = "nullable_map")]
    pub income: IndexMap<String, Decimal>,
    #[serde(default, deserialize_with = "nullable_map")]
    pub expenses: IndexMap<String, IndexMap<String, Decimal>>,
}

impl BudgetPlan {
    pub fn total_income(&self) -> Decimal {
        self.income.values().copied().sum()
    }

    pub fn total_expenses(&self) -> Decimal {
        self.expenses
            .values()
            .flat_map(|lines| lines.values().copied())
            .sum()
    }

    pub fn net(&self) -> Decimal {
        self.total_income() - self.total_expenses()
    }
}
