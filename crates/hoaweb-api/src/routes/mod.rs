//! Route modules for the API server
//!
//! Each module follows the same structure:
//! - mod.rs: Module declaration and exports
//! - api.rs: JSON API endpoints

pub mod budget;
pub mod cfo;
pub mod overview;
pub mod planner;
pub mod settings;
pub mod years;
