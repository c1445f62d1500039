//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/bloomstats/config.toml`
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/bloomstats/` (~/.config/bloomstats/)
//! - Data: `$XDG_DATA_HOME/bloomstats/` (~/.local/share/bloomstats/)
//! - State/Logs: `$XDG_STATE_HOME/bloomstats/` (~/.local/state/bloomstats/)

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::PathBuf;

/// Returns a best-effort home directory path.
fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns XDG_CONFIG_HOME or ~/.config
fn xdg_config_home() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
}

/// Returns XDG_DATA_HOME or ~/.local/share
fn xdg_data_home() -> PathBuf {
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/share"))
}

/// Returns XDG_STATE_HOME or ~/.local/state
fn xdg_state_home() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/state"))
}

/// Main configuration struct
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Reporting defaults
    #[serde(default)]
    pub reporting: ReportingConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Database configuration
#[derive(Debug, Deserialize, Default)]
pub struct DatabaseConfig {
    /// Database file path; defaults to the XDG data dir when unset
    pub path: Option<PathBuf>,
}

/// Defaults for report parameters the shell fills in when a request
/// leaves them out.
#[derive(Debug, Deserialize)]
pub struct ReportingConfig {
    /// Days covered by a trend report when no range is given
    #[serde(default = "default_trend_days")]
    pub default_trend_days: u32,

    /// Retention period (in granularity units) when none is given
    #[serde(default = "default_retention_period")]
    pub default_retention_period: u32,
}

impl Default for ReportingConfig {
    fn default() -> Self {
        Self {
            default_trend_days: default_trend_days(),
            default_retention_period: default_retention_period(),
        }
    }
}

fn default_trend_days() -> u32 {
    7
}

fn default_retention_period() -> u32 {
    7
}

/// Logging configuration
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            return Ok(Config::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file {:?}: {}", path, e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;

        Ok(config)
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/bloomstats/config.toml` (~/.config/bloomstats/config.toml)
    pub fn config_path() -> PathBuf {
        xdg_config_home().join("bloomstats").join("config.toml")
    }

    /// Returns the data directory path (for the SQLite database)
    ///
    /// `$XDG_DATA_HOME/bloomstats/` (~/.local/share/bloomstats/)
    pub fn data_dir() -> PathBuf {
        xdg_data_home().join("bloomstats")
    }

    /// Returns the state directory path (for logs)
    ///
    /// `$XDG_STATE_HOME/bloomstats/` (~/.local/state/bloomstats/)
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join("bloomstats")
    }

    /// Returns the database file path, honoring the config override
    ///
    /// Default: `$XDG_DATA_HOME/bloomstats/data.db`
    pub fn database_path(&self) -> PathBuf {
        self.database
            .path
            .clone()
            .unwrap_or_else(|| Self::data_dir().join("data.db"))
    }

    /// Returns the log file path
    ///
    /// `$XDG_STATE_HOME/bloomstats/bloomstats.log`
    pub fn log_path() -> PathBuf {
        Self::state_dir().join("bloomstats.log")
    }
}
