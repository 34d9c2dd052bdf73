//! Financial data loading
//!
//! Reads the financial dataset (`data.json`) and the budget plan snapshots
//! (`budget-<year>-data.json`) from disk. Nothing downstream runs until both
//! are in memory.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub mod error;
pub mod types;

pub use error::LoadError;
pub use types::{BudgetPlan, FinancialDataset, PnlSnapshot, Transaction};

static PLAN_YEAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{4})").expect("plan year pattern is valid"));

/// Extract the plan year from a file name such as `budget-2026-data.json`
pub fn plan_year_from_path(path: &Path) -> Result<i32, LoadError> {
    let invalid = || LoadError::InvalidPlanFilename {
        path: path.to_string_lossy().to_string(),
    };
    let name = path.file_name().and_then(|n| n.to_str()).ok_or_else(invalid)?;
    let caps = PLAN_YEAR.captures(name).ok_or_else(invalid)?;
    caps[1].parse::<i32>().map_err(|_| invalid())
}

/// A budget plan file found on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanFile {
    pub year: i32,
    pub path: PathBuf,
}

/// Dataset plus every discovered budget plan, keyed by plan year
#[derive(Debug, Clone, Default)]
pub struct LoadedData {
    pub dataset: FinancialDataset,
    pub plans: BTreeMap<i32, BudgetPlan>,
}

impl LoadedData {
    /// Earliest year with a budget plan snapshot
    pub fn plan_year(&self) -> Option<i32> {
        self.plans.keys().next().copied()
    }
}

// ==================== Loader Trait ====================

/// Loader reference type
pub type LoaderRef = Arc<dyn DatasetLoader>;

/// Source of the financial dataset and budget plans
#[async_trait]
pub trait DatasetLoader: Send + Sync {
    /// Load the P&L snapshots and transaction ledger
    async fn load_dataset(&self, path: &Path) -> Result<FinancialDataset, LoadError>;

    /// Load one budget plan snapshot
    async fn load_plan(&self, path: &Path) -> Result<BudgetPlan, LoadError>;

    /// Find budget plan files matching a glob pattern
    async fn discover_plans(&self, pattern: &str) -> Result<Vec<PlanFile>, LoadError>;
}

/// Reads the JSON files from the local filesystem
#[derive(Debug, Default)]
pub struct JsonDatasetLoader;

async fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, LoadError> {
    let content = tokio::fs::read_to_string(path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => LoadError::DatasetMissing {
            path: path.to_string_lossy().to_string(),
        },
        _ => LoadError::IoError(e),
    })?;

    serde_json::from_str(&content).map_err(|e| LoadError::MalformedJson {
        path: path.to_string_lossy().to_string(),
        message: e.to_string(),
    })
}

#[async_trait]
impl DatasetLoader for JsonDatasetLoader {
    async fn load_dataset(&self, path: &Path) -> Result<FinancialDataset, LoadError> {
        let dataset: FinancialDataset = read_json(path).await?;
        log::info!(
            "Loaded {} P&L years and {} transactions from {}",
            dataset.pnl_data.len(),
            dataset.transactions.len(),
            path.display()
        );
        Ok(dataset)
    }

    async fn load_plan(&self, path: &Path) -> Result<BudgetPlan, LoadError> {
        read_json(path).await
    }

    async fn discover_plans(&self, pattern: &str) -> Result<Vec<PlanFile>, LoadError> {
        let paths = glob::glob(pattern).map_err(|e| LoadError::InvalidPattern {
            pattern: pattern.to_string(),
            message: e.to_string(),
        })?;

        let mut plans = Vec::new();
        for entry in paths.flatten() {
            if !entry.is_file() {
                continue;
            }
            match plan_year_from_path(&entry) {
                Ok(year) => plans.push(PlanFile { year, path: entry }),
                Err(e) => log::warn!("Skipping budget plan: {}", e),
            }
        }
        plans.sort_by_key(|p| p.year);
        Ok(plans)
    }
}

/// Load the dataset and all budget plans concurrently
pub async fn load_all(
    loader: &dyn DatasetLoader,
    dataset_path: &Path,
    plan_pattern: &str,
) -> Result<LoadedData, LoadError> {
    let load_plans = async {
        let mut plans = BTreeMap::new();
        for file in loader.discover_plans(plan_pattern).await? {
            let plan = loader.load_plan(&file.path).await?;
            if plans.insert(file.year, plan).is_some() {
                log::warn!("Duplicate budget plan for {}, using {}", file.year, file.path.display());
            }
        }
        Ok::<_, LoadError>(plans)
    };

    let (dataset, plans) = tokio::try_join!(loader.load_dataset(dataset_path), load_plans)?;
    log::info!("Discovered {} budget plan(s): {:?}", plans.len(), plans.keys().collect::<Vec<_>>());

    Ok(LoadedData { dataset, plans })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const DATASET: &str = r#"{
        "pnl_data": {
            "2024": {"income": {"Annual Dues Income": 100}, "expenses": {"Water": 40}},
            "2025": {"income": {"Annual Dues Income": 110}, "expenses": {"Water": 45}}
        },
        "transactions": [
            {"date": "2025-01-05", "amount": 45, "year": 2025, "month": 1, "category": "Water", "vendor": "City", "memo": ""}
        ]
    }"#;

    const PLAN: &str = r#"{"income": {"Annual Dues Income": 120}, "expenses": {"Utilities": {"Water": 50}}}"#;

    #[test]
    fn test_plan_year_from_path() {
        assert_eq!(plan_year_from_path(Path::new("/data/budget-2026-data.json")).unwrap(), 2026);
        assert!(matches!(
            plan_year_from_path(Path::new("budget-next-data.json")),
            Err(LoadError::InvalidPlanFilename { .. })
        ));
    }

    #[tokio::test]
    async fn test_load_all_reads_dataset_and_plans() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("data.json"), DATASET).unwrap();
        std::fs::write(dir.path().join("budget-2026-data.json"), PLAN).unwrap();
        std::fs::write(dir.path().join("budget-2027-data.json"), PLAN).unwrap();
        std::fs::write(dir.path().join("budget-draft-data.json"), PLAN).unwrap();

        let pattern = dir.path().join("budget-*-data.json");
        let loaded = load_all(
            &JsonDatasetLoader,
            &dir.path().join("data.json"),
            &pattern.to_string_lossy(),
        )
        .await
        .unwrap();

        assert_eq!(loaded.dataset.years(), vec![2024, 2025]);
        assert_eq!(loaded.dataset.transactions.len(), 1);
        assert_eq!(loaded.plans.len(), 2);
        assert_eq!(loaded.plan_year(), Some(2026));
        assert_eq!(loaded.plans[&2026].total_income(), dec!(120));
    }

    #[tokio::test]
    async fn test_missing_dataset_is_load_failure() {
        let dir = tempfile::tempdir().unwrap();
        let pattern = dir.path().join("budget-*-data.json");
        let err = load_all(
            &JsonDatasetLoader,
            &dir.path().join("data.json"),
            &pattern.to_string_lossy(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, LoadError::DatasetMissing { .. }));
    }

    #[tokio::test]
    async fn test_malformed_dataset() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        std::fs::write(&path, "{ not json").unwrap();
        let err = JsonDatasetLoader.load_dataset(&path).await.unwrap_err();
        assert!(matches!(err, LoadError::MalformedJson { .. }));
    }
}
