//! Error types for tracker operations

use loadout_domain::LineageError;
use thiserror::Error;

/// Errors that can occur while building or using a [`crate::LineageTracker`]
#[derive(Error, Debug)]
pub enum TrackerError {
    /// Reconciliation precondition or validation failure
    #[error(transparent)]
    Lineage(#[from] LineageError),

    /// Configuration value out of range
    #[error("Configuration error: {0}")]
    Config(String),

    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse config TOML: {0}")]
    TomlParse(#[from] toml::de::Error),
}

impl TrackerError {
    /// The underlying domain error, if any
    pub fn as_lineage(&self) -> Option<&LineageError> {
        match self {
            TrackerError::Lineage(e) => Some(e),
            _ => None,
        }
    }
}

/// Result alias for tracker operations
pub type Result<T> = std::result::Result<T, TrackerError>;
