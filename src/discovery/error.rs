//! Error types for the discovery module

use thiserror::Error;

/// Errors raised while loading or saving the pair configuration table
#[derive(Error, Debug)]
pub enum DiscoveryError {
    /// Invalid row or configuration value
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// I/O error (file operations)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV encoding or decoding error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
