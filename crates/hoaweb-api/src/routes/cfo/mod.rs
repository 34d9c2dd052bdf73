//! CFO routes - KPIs, variance, forecast and recommendations

pub mod api;

pub use api::api_cfo;
