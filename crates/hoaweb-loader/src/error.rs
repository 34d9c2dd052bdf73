//! Error types for hoaweb-loader

use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Dataset not found: {path}")]
    DatasetMissing { path: String },

    #[error("Malformed JSON in {path}: {message}")]
    MalformedJson { path: String, message: String },

    #[error("Cannot read year from budget plan file name: {path}")]
    InvalidPlanFilename { path: String },

    #[error("Invalid file pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
}
