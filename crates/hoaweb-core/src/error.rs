//! Error types for hoaweb-core
//!
//! Data-shape problems never surface here once the dataset has loaded:
//! missing years render as empty views, ratio denominators are guarded and
//! unmatched labels fall into "Other". What remains are load failures and
//! invalid budget edits.

use hoaweb_loader::LoadError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;
use thiserror::Error;

/// Stable machine-readable error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Dataset or plan could not be read
    LoadFailed,
    /// No budget page can be built for the year
    BudgetNotAvailable,
    LineItemNotFound,
    ProjectNotFound,
    InvalidAmount,
    ValidationError,
    ConfigError,
    IoError,
    InternalError,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::LoadFailed => "LOAD_FAILED",
            ErrorCode::BudgetNotAvailable => "BUDGET_NOT_AVAILABLE",
            ErrorCode::LineItemNotFound => "LINE_ITEM_NOT_FOUND",
            ErrorCode::ProjectNotFound => "PROJECT_NOT_FOUND",
            ErrorCode::InvalidAmount => "INVALID_AMOUNT",
            ErrorCode::ValidationError => "VALIDATION_ERROR",
            ErrorCode::ConfigError => "CONFIG_ERROR",
            ErrorCode::IoError => "IO_ERROR",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        }
    }

    /// How loudly an error with this code is reported
    pub fn severity(self) -> ErrorSeverity {
        match self {
            ErrorCode::BudgetNotAvailable => ErrorSeverity::Info,
            ErrorCode::LineItemNotFound
            | ErrorCode::ProjectNotFound
            | ErrorCode::InvalidAmount
            | ErrorCode::ValidationError => ErrorSeverity::Warning,
            ErrorCode::LoadFailed | ErrorCode::IoError => ErrorSeverity::Error,
            ErrorCode::ConfigError | ErrorCode::InternalError => ErrorSeverity::Critical,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ErrorSeverity::Info => "info",
            ErrorSeverity::Warning => "warning",
            ErrorSeverity::Error => "error",
            ErrorSeverity::Critical => "critical",
        };
        f.write_str(label)
    }
}

/// Error body handed to API clients
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetails {
    pub code: ErrorCode,
    pub severity: ErrorSeverity,
    pub message: String,
    /// Offending year, line or value
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
}

impl ErrorDetails {
    pub fn new(code: ErrorCode, message: String) -> Self {
        Self {
            code,
            severity: code.severity(),
            message,
            context: None,
            suggestions: Vec::new(),
        }
    }

    pub fn with_context(mut self, context: serde_json::Value) -> Self {
        self.context = Some(context);
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }
}

impl fmt::Display for ErrorDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.code, self.severity, self.message)?;
        for hint in &self.suggestions {
            write!(f, "; {}", hint)?;
        }
        Ok(())
    }
}

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Failed to load financial data: {message}")]
    LoadFailed { message: String },

    #[error("No budget available for {year}")]
    BudgetNotAvailable { year: i32 },

    #[error("Budget line not found: {line}")]
    LineItemNotFound { line: String },

    #[error("Special project not found: {id}")]
    ProjectNotFound { id: String },

    #[error("Invalid amount: {message}")]
    InvalidAmount { message: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Hand-off store I/O failed: {message}")]
    IoError { message: String },

    #[error("Internal error: {message}")]
    InternalError { message: String },
}

pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    pub fn code(&self) -> ErrorCode {
        match self {
            CoreError::LoadFailed { .. } => ErrorCode::LoadFailed,
            CoreError::BudgetNotAvailable { .. } => ErrorCode::BudgetNotAvailable,
            CoreError::LineItemNotFound { .. } => ErrorCode::LineItemNotFound,
            CoreError::ProjectNotFound { .. } => ErrorCode::ProjectNotFound,
            CoreError::InvalidAmount { .. } => ErrorCode::InvalidAmount,
            CoreError::ValidationError { .. } => ErrorCode::ValidationError,
            CoreError::ConfigError { .. } => ErrorCode::ConfigError,
            CoreError::IoError { .. } => ErrorCode::IoError,
            CoreError::InternalError { .. } => ErrorCode::InternalError,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        self.code().severity()
    }

    /// Client-facing body with context and hints where there are any
    pub fn to_details(&self) -> ErrorDetails {
        let details = ErrorDetails::new(self.code(), self.to_string());
        match self {
            CoreError::LoadFailed { .. } => details
                .with_suggestion("Check that data.json exists in the configured data directory.")
                .with_suggestion("Use POST /api/reload after fixing the file."),
            CoreError::BudgetNotAvailable { year } => details
                .with_context(serde_json::json!({ "year": year }))
                .with_suggestion(format!(
                    "Add a budget-{}-data.json plan or a plan for an earlier year.",
                    year
                )),
            CoreError::LineItemNotFound { line } => details
                .with_context(serde_json::json!({ "line": line }))
                .with_suggestion("Use GET /api/budget/:year to list editable lines."),
            CoreError::ProjectNotFound { id } => {
                details.with_context(serde_json::json!({ "project": id }))
            }
            _ => details,
        }
    }
}

impl From<io::Error> for CoreError {
    fn from(error: io::Error) -> Self {
        CoreError::IoError {
            message: error.to_string(),
        }
    }
}

impl From<LoadError> for CoreError {
    fn from(error: LoadError) -> Self {
        CoreError::LoadFailed {
            message: error.to_string(),
        }
    }
}

impl From<hoaweb_config::ConfigError> for CoreError {
    fn from(error: hoaweb_config::ConfigError) -> Self {
        CoreError::ConfigError {
            message: error.to_string(),
        }
    }
}

/// Where an error happened: the operation and, for budget edits, the year
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    pub operation: String,
    pub year: Option<i32>,
}

impl ErrorContext {
    pub fn new(operation: &str) -> Self {
        Self {
            operation: operation.to_string(),
            year: None,
        }
    }

    pub fn with_year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.year {
            Some(year) => write!(f, "{} [{}]", self.operation, year),
            None => f.write_str(&self.operation),
        }
    }
}

pub trait ErrorLogger {
    fn log_error(&self, error: &CoreError, context: &ErrorContext);
    fn log_warning(&self, message: &str, context: &ErrorContext);
}

/// Logs through the `log` facade under the `hoaweb::error` target
#[derive(Default)]
pub struct DefaultErrorLogger;

impl ErrorLogger for DefaultErrorLogger {
    fn log_error(&self, error: &CoreError, context: &ErrorContext) {
        match error.severity() {
            ErrorSeverity::Info => log::info!(target: "hoaweb::error", "{}: {}", context, error),
            ErrorSeverity::Warning => {
                log::warn!(target: "hoaweb::error", "{}: [{}] {}", context, error.code(), error)
            }
            ErrorSeverity::Error | ErrorSeverity::Critical => {
                log::error!(target: "hoaweb::error", "{}: [{}] {}", context, error.code(), error)
            }
        }
    }

    fn log_warning(&self, message: &str, context: &ErrorContext) {
        log::warn!(target: "hoaweb::error", "{}: {}", context, message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_display() {
        assert_eq!(ErrorCode::LoadFailed.to_string(), "LOAD_FAILED");
        assert_eq!(ErrorCode::LineItemNotFound.to_string(), "LINE_ITEM_NOT_FOUND");
        let json = serde_json::to_string(&ErrorCode::BudgetNotAvailable).unwrap();
        assert_eq!(json, "\"BUDGET_NOT_AVAILABLE\"");
    }

    #[test]
    fn test_core_error_severity() {
        let error = CoreError::ProjectNotFound { id: "special_3".to_string() };
        assert_eq!(error.severity(), ErrorSeverity::Warning);
        assert_eq!(CoreError::BudgetNotAvailable { year: 2020 }.severity(), ErrorSeverity::Info);
        let error = CoreError::ConfigError { message: "bad".to_string() };
        assert_eq!(error.severity(), ErrorSeverity::Critical);
        assert!(ErrorSeverity::Critical > ErrorSeverity::Warning);
    }

    #[test]
    fn test_error_details_line_item() {
        let error = CoreError::LineItemNotFound {
            line: "Utilities / Electric".to_string(),
        };
        let details = error.to_details();
        assert_eq!(details.code, ErrorCode::LineItemNotFound);
        assert_eq!(details.severity, ErrorSeverity::Warning);
        assert!(details.message.contains("Utilities / Electric"));
        assert_eq!(details.context.as_ref().unwrap()["line"], "Utilities / Electric");
        assert!(!details.suggestions.is_empty());
        assert!(details.to_string().starts_with("LINE_ITEM_NOT_FOUND (warning)"));
    }

    #[test]
    fn test_load_and_io_errors_convert() {
        let error: CoreError = LoadError::DatasetMissing { path: "data.json".to_string() }.into();
        assert_eq!(error.code(), ErrorCode::LoadFailed);
        assert!(error.to_string().contains("data.json"));

        let error: CoreError = io::Error::new(io::ErrorKind::PermissionDenied, "read-only").into();
        assert_eq!(error.code(), ErrorCode::IoError);
        assert!(error.to_string().contains("read-only"));
    }

    #[test]
    fn test_error_context_display() {
        assert_eq!(ErrorContext::new("reload").to_string(), "reload");
        let context = ErrorContext::new("set_amount").with_year(2026);
        assert_eq!(context.to_string(), "set_amount [2026]");
        DefaultErrorLogger.log_warning("ignored", &context);
    }
}
