//! Year scoping for transaction rollups

use hoaweb_loader::{FinancialDataset, Transaction};
use serde::{Deserialize, Serialize};

/// Which fiscal years a rollup covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "scope", content = "year")]
pub enum YearScope {
    /// Every history year
    All,
    /// A single fiscal year
    Year(i32),
}

impl Default for YearScope {
    fn default() -> Self {
        YearScope::All
    }
}

impl YearScope {
    pub fn contains(&self, year: i32) -> bool {
        match self {
            YearScope::All => true,
            YearScope::Year(y) => *y == year,
        }
    }

    /// History years of the dataset that fall in this scope
    pub fn years(&self, dataset: &FinancialDataset) -> Vec<i32> {
        dataset
            .years()
            .into_iter()
            .filter(|y| self.contains(*y))
            .collect()
    }

    pub fn description(&self) -> String {
        match self {
            YearScope::All => "All Years".to_string(),
            YearScope::Year(y) => y.to_string(),
        }
    }
}

/// Filtering by year scope
pub trait PeriodFilter {
    fn in_scope(&self, scope: &YearScope) -> bool;
}

impl PeriodFilter for Transaction {
    fn in_scope(&self, scope: &YearScope) -> bool {
        scope.contains(self.year)
    }
}

/// Positive-amount transactions inside a scope, in ledger order
pub fn outflows<'a>(
    dataset: &'a FinancialDataset,
    scope: YearScope,
) -> impl Iterator<Item = &'a Transaction> + 'a {
    dataset
        .transactions
        .iter()
        .filter(move |t| t.in_scope(&scope) && t.is_outflow())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset() -> FinancialDataset {
        serde_json::from_str(
            r#"{
                "pnl_data": {"2023": {}, "2024": {}, "2025": {}},
                "transactions": [
                    {"date": "2024-02-01", "amount": 10, "year": 2024, "month": 2},
                    {"date": "2024-02-03", "amount": -4, "year": 2024, "month": 2},
                    {"date": "2025-06-01", "amount": 7, "year": 2025, "month": 6}
                ]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_scope_years() {
        let data = dataset();
        assert_eq!(YearScope::All.years(&data), vec![2023, 2024, 2025]);
        assert_eq!(YearScope::Year(2024).years(&data), vec![2024]);
        assert!(YearScope::Year(2030).years(&data).is_empty());
    }

    #[test]
    fn test_outflows_skip_non_positive() {
        let data = dataset();
        assert_eq!(outflows(&data, YearScope::Year(2024)).count(), 1);
        assert_eq!(outflows(&data, YearScope::All).count(), 2);
    }

    #[test]
    fn test_scope_description() {
        assert_eq!(YearScope::All.description(), "All Years");
        assert_eq!(YearScope::Year(2025).description(), "2025");
    }
}
