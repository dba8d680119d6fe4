//! Error types for the CLI application.

use loadout_query::QueryError;
use loadout_store::StoreError;
use loadout_tracker::TrackerError;
use thiserror::Error;

/// Result type alias for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Reconciliation or tracker configuration error
    #[error("Tracker error: {0}")]
    Tracker(#[from] TrackerError),

    /// History database error
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Query service error
    #[error("Query error: {0}")]
    Query(#[from] QueryError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
