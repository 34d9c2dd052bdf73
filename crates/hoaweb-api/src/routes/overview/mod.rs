//! Overview routes - Multi-year dashboard

pub mod api;

pub use api::api_overview;
