//! Year routes - Per-year drill-down

pub mod api;

pub use api::{api_year, api_years};
