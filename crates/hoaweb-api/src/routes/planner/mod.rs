//! Planner routes - History-based category budget

pub mod api;

pub use api::{api_planner, api_planner_set, api_planner_suggested};
