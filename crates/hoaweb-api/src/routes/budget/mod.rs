//! Budget routes - Budget pages and editor operations

pub mod api;

pub use api::{
    api_add_project, api_budget, api_remove_project, api_set_line, api_set_storm_fund,
    api_update_project, api_use_suggested,
};
