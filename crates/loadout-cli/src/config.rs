//! Configuration management for the CLI.
//!
//! ```toml
//! [settings]
//! database = "/var/lib/loadout/lineage.db"
//! format = "table"
//! color = true
//!
//! [tracker]
//! stale_freshness_threshold = 0.5
//!
//! [tracker.reliability]
//! community_wiki = 0.65
//!
//! [query]
//! operation_timeout_ms = 5000
//! ```

use crate::error::{CliError, Result};
use loadout_query::QueryConfig;
use loadout_tracker::TrackerConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// CLI configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Global settings
    #[serde(default)]
    pub settings: Settings,

    /// Reconciliation parameters
    #[serde(default)]
    pub tracker: TrackerConfig,

    /// History store access
    #[serde(default)]
    pub query: QueryConfig,
}

/// Global CLI settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// History database path (default: `~/.loadout/lineage.db`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<PathBuf>,

    /// Enable colored output
    #[serde(default = "default_true")]
    pub color: bool,

    /// Default output format
    #[serde(default = "default_format")]
    pub format: OutputFormat,
}

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Table format
    Table,
    /// JSON format
    Json,
    /// Quiet (minimal) format
    Quiet,
}

impl Config {
    /// Get the loadout home directory.
    pub fn home() -> Result<PathBuf> {
        let home = dirs::home_dir().ok_or_else(|| CliError::Config("Could not find home directory".into()))?;
        Ok(home.join(".loadout"))
    }

    /// Get the default configuration file path.
    pub fn path() -> Result<PathBuf> {
        Ok(Self::home()?.join("config.toml"))
    }

    /// Load configuration from the default path, or defaults if it is missing.
    pub fn load() -> Result<Self> {
        let path = Self::path()?;
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load and validate configuration from a specific file.
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse and validate configuration TOML.
    pub fn parse(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.tracker.validate()?;
        config.query.validate()?;
        Ok(config)
    }

    /// Resolve the history database path.
    ///
    /// An explicit override wins over the configured path, which wins over
    /// `~/.loadout/lineage.db`.
    pub fn database_path(&self, override_path: Option<&str>) -> Result<PathBuf> {
        if let Some(path) = override_path {
            return Ok(PathBuf::from(path));
        }
        if let Some(path) = &self.settings.database {
            return Ok(path.clone());
        }
        Ok(Self::home()?.join("lineage.db"))
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database: None,
            color: true,
            format: OutputFormat::Table,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_format() -> OutputFormat {
    OutputFormat::Table
}
