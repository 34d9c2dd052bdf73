//! Basic types shared by the dashboard views

use serde::{Deserialize, Serialize};

use crate::period::YearScope;

/// How the candidate category list for a rollup is ranked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ranking {
    /// By the target year's snapshot total
    SingleYear,
    /// By the total across every history year
    MultiYear,
}

impl Default for Ranking {
    fn default() -> Self {
        Ranking::MultiYear
    }
}

impl Ranking {
    /// Years whose snapshot totals rank the candidates of a view on `year`
    pub fn scope(self, year: i32) -> YearScope {
        match self {
            Ranking::SingleYear => YearScope::Year(year),
            Ranking::MultiYear => YearScope::All,
        }
    }
}

impl std::str::FromStr for Ranking {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "single_year" | "single" => Ok(Ranking::SingleYear),
            "multi_year" | "multi" => Ok(Ranking::MultiYear),
            _ => Err(format!("Invalid ranking: {}", s)),
        }
    }
}

impl std::fmt::Display for Ranking {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Ranking::SingleYear => write!(f, "single_year"),
            Ranking::MultiYear => write!(f, "multi_year"),
        }
    }
}

/// How a transaction is assigned to a charted category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelMatching {
    /// Substring and keyword heuristics over category, vendor, then memo
    Heuristic,
    /// The raw category field must equal a candidate
    Exact,
}

impl Default for LabelMatching {
    fn default() -> Self {
        LabelMatching::Heuristic
    }
}

impl LabelMatching {
    pub fn from_enabled(enabled: bool) -> Self {
        if enabled {
            LabelMatching::Heuristic
        } else {
            LabelMatching::Exact
        }
    }
}

/// Budget line kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineKind {
    Income,
    Expense,
}

impl std::fmt::Display for LineKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LineKind::Income => write!(f, "income"),
            LineKind::Expense => write!(f, "expense"),
        }
    }
}

/// Tone of a CFO insight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsightKind {
    Positive,
    Warning,
    Info,
    Danger,
}

/// Recommendation priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

/// Reserve coverage band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReserveHealth {
    Critical,
    Low,
    Healthy,
}

impl std::fmt::Display for ReserveHealth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReserveHealth::Critical => write!(f, "Critical"),
            ReserveHealth::Low => write!(f, "Low"),
            ReserveHealth::Healthy => write!(f, "Healthy"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ranking_from_str() {
        assert_eq!("single_year".parse::<Ranking>().unwrap(), Ranking::SingleYear);
        assert_eq!("MULTI".parse::<Ranking>().unwrap(), Ranking::MultiYear);
        assert!("weekly".parse::<Ranking>().is_err());
        assert_eq!(Ranking::SingleYear.to_string(), "single_year");
        assert_eq!(Ranking::SingleYear.scope(2025), YearScope::Year(2025));
        assert_eq!(Ranking::MultiYear.scope(2025), YearScope::All);
    }

    #[test]
    fn test_label_matching_from_flag() {
        assert_eq!(LabelMatching::from_enabled(true), LabelMatching::Heuristic);
        assert_eq!(LabelMatching::from_enabled(false), LabelMatching::Exact);
    }

    #[test]
    fn test_line_kind_serde() {
        let kind: LineKind = serde_json::from_str("\"expense\"").unwrap();
        assert_eq!(kind, LineKind::Expense);
        assert_eq!(serde_json::to_string(&LineKind::Income).unwrap(), "\"income\"");
    }
}
