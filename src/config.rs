//! Configuration management for listening-analytics

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::types::UserId;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Database settings
    pub database: DatabaseConfig,

    /// Report settings
    pub analytics: AnalyticsConfig,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,

    /// Data directory (default: ~/.local/share/listening-analytics)
    pub data_dir: Option<PathBuf>,

    /// Listener used when the CLI is not given `--user`
    pub user_id: i64,
}

/// Database configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Database file path (default: `<data_dir>/analytics.duckdb`)
    pub path: Option<String>,
}

/// Report and live-view settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    /// Entries kept in the top artists / top songs lists
    pub top_n: u32,

    /// Entries kept in the day streak list
    pub streak_limit: u32,

    /// How often the current-month view re-reads storage, e.g. "30s"
    pub refresh_interval: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            data_dir: None,
            user_id: 1,
        }
    }
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            top_n: 5,
            streak_limit: 10,
            refresh_interval: "30s".to_string(),
        }
    }
}

impl AnalyticsConfig {
    /// Parse the refresh interval.
    pub fn refresh_interval(&self) -> Result<Duration> {
        humantime::parse_duration(&self.refresh_interval).map_err(|e| {
            Error::config(format!(
                "refresh_interval '{}' is not a duration: {e}",
                self.refresh_interval
            ))
        })
    }
}

impl Config {
    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    /// Save configuration to a specific path
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Get the default configuration file path
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| Error::config("Could not determine config directory"))?;
        Ok(config_dir.join(crate::APP_NAME).join("config.toml"))
    }

    /// Get the data directory
    pub fn data_dir(&self) -> Result<PathBuf> {
        if let Some(ref dir) = self.general.data_dir {
            Ok(dir.clone())
        } else {
            let data_dir = dirs::data_local_dir()
                .ok_or_else(|| Error::config("Could not determine data directory"))?;
            Ok(data_dir.join(crate::APP_NAME))
        }
    }

    /// Get the database path
    pub fn database_path(&self) -> Result<PathBuf> {
        if let Some(ref path) = self.database.path {
            return Ok(PathBuf::from(path));
        }
        Ok(self.data_dir()?.join("analytics.duckdb"))
    }

    /// Default listener for CLI commands
    #[must_use]
    pub const fn user_id(&self) -> UserId {
        UserId::new(self.general.user_id)
    }

    /// Validate configuration values.
    ///
    /// Call this after loading to ensure all values are within acceptable ranges.
    pub fn validate(&self) -> Result<()> {
        if self.analytics.top_n == 0 {
            return Err(Error::config("top_n must be at least 1"));
        }

        if self.analytics.streak_limit == 0 {
            return Err(Error::config("streak_limit must be at least 1"));
        }

        if self.analytics.refresh_interval()?.is_zero() {
            return Err(Error::config("refresh_interval must be greater than zero"));
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.to_lowercase().as_str()) {
            return Err(Error::config(format!(
                "log_level must be one of {:?}, got '{}'",
                valid_levels, self.general.log_level
            )));
        }

        Ok(())
    }
}
