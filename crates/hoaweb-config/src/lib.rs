//! Configuration management for hoaweb
//!
//! This module handles loading, validation, and management of
//! hoaweb configuration from YAML files. Every forecasting constant
//! (growth rates, scenario multipliers, reserve anchor, storm fund)
//! lives here so views never hard-code them.

pub mod error;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub use error::ConfigError;

// ==================== Configuration Types ====================

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,
    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8081
}

/// Data directory configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Directory holding the dataset, budget plans and hand-off file
    #[serde(default = "default_data_path")]
    pub path: PathBuf,
    /// Financial dataset (P&L snapshots + transaction ledger)
    #[serde(default = "default_dataset_file")]
    pub dataset_file: String,
    /// Glob used to discover budget plan snapshots; the year is read from the file name
    #[serde(default = "default_budget_plan_pattern")]
    pub budget_plan_pattern: String,
    /// Key/value file standing in for client-local storage
    #[serde(default = "default_handoff_file")]
    pub handoff_file: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            path: default_data_path(),
            dataset_file: default_dataset_file(),
            budget_plan_pattern: default_budget_plan_pattern(),
            handoff_file: default_handoff_file(),
        }
    }
}

fn default_data_path() -> PathBuf {
    PathBuf::from("./data")
}

fn default_dataset_file() -> String {
    "data.json".to_string()
}

fn default_budget_plan_pattern() -> String {
    "budget-*-data.json".to_string()
}

fn default_handoff_file() -> String {
    "handoff.json".to_string()
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Forecast scenario presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scenario {
    /// No adjustment
    Base,
    /// Projected income total scaled up
    Optimistic,
    /// Projected expense total scaled up
    Conservative,
}

impl Default for Scenario {
    fn default() -> Self {
        Scenario::Base
    }
}

impl std::str::FromStr for Scenario {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "base" => Ok(Scenario::Base),
            "optimistic" => Ok(Scenario::Optimistic),
            "conservative" => Ok(Scenario::Conservative),
            _ => Err(format!("Invalid scenario: {}", s)),
        }
    }
}

impl std::fmt::Display for Scenario {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Scenario::Base => write!(f, "base"),
            Scenario::Optimistic => write!(f, "optimistic"),
            Scenario::Conservative => write!(f, "conservative"),
        }
    }
}

/// Growth rules applied when projecting a year forward
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastConfig {
    /// Income line that follows the dues growth rate
    #[serde(default = "default_dues_line")]
    pub dues_line: String,
    /// Yearly dues increase (0.10 = 10%)
    #[serde(default = "default_dues_growth")]
    pub dues_growth: Decimal,
    /// Yearly growth of every other income line
    #[serde(default = "default_three_percent")]
    pub other_income_growth: Decimal,
    /// Yearly inflation applied to every expense line
    #[serde(default = "default_three_percent")]
    pub expense_inflation: Decimal,
    /// Multiplier on total projected income in the optimistic scenario
    #[serde(default = "default_optimistic_multiplier")]
    pub optimistic_income_multiplier: Decimal,
    /// Multiplier on total projected expenses in the conservative scenario
    #[serde(default = "default_conservative_multiplier")]
    pub conservative_expense_multiplier: Decimal,
    /// Scenario used when a request does not name one
    #[serde(default)]
    pub default_scenario: Scenario,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            dues_line: default_dues_line(),
            dues_growth: default_dues_growth(),
            other_income_growth: default_three_percent(),
            expense_inflation: default_three_percent(),
            optimistic_income_multiplier: default_optimistic_multiplier(),
            conservative_expense_multiplier: default_conservative_multiplier(),
            default_scenario: Scenario::Base,
        }
    }
}

fn default_dues_line() -> String {
    "Annual Dues Income".to_string()
}

fn default_dues_growth() -> Decimal {
    Decimal::new(10, 2)
}

fn default_three_percent() -> Decimal {
    Decimal::new(3, 2)
}

fn default_optimistic_multiplier() -> Decimal {
    Decimal::new(105, 2)
}

fn default_conservative_multiplier() -> Decimal {
    Decimal::new(102, 2)
}

/// Reserve fund chaining
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReserveConfig {
    /// Year whose closing balance is known
    #[serde(default = "default_anchor_year")]
    pub anchor_year: i32,
    /// Closing reserve balance of the anchor year
    #[serde(default = "default_anchor_balance")]
    pub anchor_balance: Decimal,
    /// Storm fund set aside from the reserve before reporting the spendable part
    #[serde(default = "default_storm_fund")]
    pub storm_fund: Decimal,
    /// Hand-off slot name; `{year}` is replaced by the year the value closes
    #[serde(default = "default_handoff_key_pattern")]
    pub handoff_key_pattern: String,
}

impl Default for ReserveConfig {
    fn default() -> Self {
        Self {
            anchor_year: default_anchor_year(),
            anchor_balance: default_anchor_balance(),
            storm_fund: default_storm_fund(),
            handoff_key_pattern: default_handoff_key_pattern(),
        }
    }
}

impl ReserveConfig {
    /// Slot name holding the end-of-year reserve of `year`
    pub fn handoff_key(&self, year: i32) -> String {
        self.handoff_key_pattern.replace("{year}", &year.to_string())
    }
}

fn default_anchor_year() -> i32 {
    2024
}

fn default_anchor_balance() -> Decimal {
    Decimal::new(32667214, 2)
}

fn default_storm_fund() -> Decimal {
    Decimal::new(375000, 0)
}

fn default_handoff_key_pattern() -> String {
    "end{year}ReserveFund".to_string()
}

/// Per-view sizing and matching switches
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewsConfig {
    /// Categories charted on the overview monthly rollup (ranked by multi-year total)
    #[serde(default = "default_ten")]
    pub overview_top_categories: usize,
    /// Resolve overview transactions through the label matcher
    #[serde(default = "default_true")]
    pub overview_match_labels: bool,
    /// Categories charted on the year drill-down (ranked by that year's total)
    #[serde(default = "default_twelve")]
    pub year_top_categories: usize,
    /// Resolve year drill-down transactions through the label matcher
    #[serde(default = "default_false")]
    pub year_match_labels: bool,
    /// Categories in the multi-year trend lines
    #[serde(default = "default_eight")]
    pub trend_top_categories: usize,
    /// Categories in the CFO expense trend chart
    #[serde(default = "default_ten")]
    pub cfo_top_categories: usize,
    /// Bars in the expense-by-category chart
    #[serde(default = "default_fifteen")]
    pub expense_chart_top: usize,
    /// Vendors listed in the vendor table and chart
    #[serde(default = "default_ten")]
    pub top_vendors: usize,
    /// Categories listed per month in the monthly highlights
    #[serde(default = "default_five")]
    pub month_highlights: usize,
    /// Maximum chart label length
    #[serde(default = "default_label_max_len")]
    pub label_max_len: usize,
}

impl Default for ViewsConfig {
    fn default() -> Self {
        Self {
            overview_top_categories: 10,
            overview_match_labels: true,
            year_top_categories: 12,
            year_match_labels: false,
            trend_top_categories: 8,
            cfo_top_categories: 10,
            expense_chart_top: 15,
            top_vendors: 10,
            month_highlights: 5,
            label_max_len: 30,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_false() -> bool {
    false
}

fn default_five() -> usize {
    5
}

fn default_eight() -> usize {
    8
}

fn default_ten() -> usize {
    10
}

fn default_twelve() -> usize {
    12
}

fn default_fifteen() -> usize {
    15
}

fn default_label_max_len() -> usize {
    30
}

/// A keyword → category rule used when direct label matching fails
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordRule {
    /// Lowercase fragment searched for in the label
    pub keyword: String,
    /// Canonical category the keyword stands for
    pub category: String,
}

/// Category matcher settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MatcherConfig {
    /// Ordered keyword table; empty means the built-in table
    #[serde(default)]
    pub keywords: Vec<KeywordRule>,
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Server settings
    #[serde(default)]
    pub server: ServerConfig,
    /// Data directory settings
    #[serde(default)]
    pub data: DataConfig,
    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Forecast growth rules
    #[serde(default)]
    pub forecast: ForecastConfig,
    /// Reserve fund chaining
    #[serde(default)]
    pub reserve: ReserveConfig,
    /// View sizing
    #[serde(default)]
    pub views: ViewsConfig,
    /// Category matcher
    #[serde(default)]
    pub matcher: MatcherConfig,
}

impl Config {
    /// Load configuration from a YAML file
    pub fn load(path: PathBuf) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(&path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ConfigError::FileNotFound {
                path: path.to_string_lossy().to_string(),
            },
            _ => ConfigError::IoError,
        })?;

        Self::from_yaml(&content)
    }

    /// Parse and validate configuration from YAML text
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(content)
            .map_err(|e| ConfigError::InvalidYaml { message: e.to_string() })?;

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.port".to_string(),
                reason: "Port must be greater than 0".to_string(),
            });
        }

        let rates = [
            ("forecast.dues_growth", self.forecast.dues_growth),
            ("forecast.other_income_growth", self.forecast.other_income_growth),
            ("forecast.expense_inflation", self.forecast.expense_inflation),
        ];
        for (field, value) in rates {
            if value.is_sign_negative() && !value.is_zero() {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    reason: "Growth rates cannot be negative".to_string(),
                });
            }
        }

        let multipliers = [
            ("forecast.optimistic_income_multiplier", self.forecast.optimistic_income_multiplier),
            ("forecast.conservative_expense_multiplier", self.forecast.conservative_expense_multiplier),
        ];
        for (field, value) in multipliers {
            if value <= Decimal::ZERO {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    reason: "Scenario multipliers must be greater than 0".to_string(),
                });
            }
        }

        if self.reserve.storm_fund < Decimal::ZERO {
            return Err(ConfigError::InvalidValue {
                field: "reserve.storm_fund".to_string(),
                reason: "Storm fund cannot be negative".to_string(),
            });
        }

        if !self.reserve.handoff_key_pattern.contains("{year}") {
            return Err(ConfigError::InvalidValue {
                field: "reserve.handoff_key_pattern".to_string(),
                reason: "Pattern must contain the {year} placeholder".to_string(),
            });
        }

        let sizes = [
            ("views.overview_top_categories", self.views.overview_top_categories),
            ("views.year_top_categories", self.views.year_top_categories),
            ("views.trend_top_categories", self.views.trend_top_categories),
            ("views.cfo_top_categories", self.views.cfo_top_categories),
            ("views.expense_chart_top", self.views.expense_chart_top),
            ("views.top_vendors", self.views.top_vendors),
            ("views.month_highlights", self.views.month_highlights),
            ("views.label_max_len", self.views.label_max_len),
        ];
        for (field, value) in sizes {
            if value == 0 {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    reason: "Value must be at least 1".to_string(),
                });
            }
        }

        if let Some(rule) = self.matcher.keywords.iter().find(|r| r.keyword.trim().is_empty()) {
            return Err(ConfigError::ValidationError {
                message: format!("Keyword rule for '{}' has an empty keyword", rule.category),
            });
        }

        Ok(())
    }

    /// Generate a default configuration file
    pub fn generate_default() -> &'static str {
        include_str!("../templates/default_config.yaml")
    }

    /// Full path to the financial dataset
    pub fn dataset_path(&self) -> PathBuf {
        self.data.path.join(&self.data.dataset_file)
    }

    /// Glob pattern (as a string) matching budget plan files
    pub fn budget_plan_glob(&self) -> String {
        self.data
            .path
            .join(&self.data.budget_plan_pattern)
            .to_string_lossy()
            .to_string()
    }

    /// Full path to the hand-off key/value file
    pub fn handoff_path(&self) -> PathBuf {
        self.data.path.join(&self.data.handoff_file)
    }
}

// ==================== Tests ====================
