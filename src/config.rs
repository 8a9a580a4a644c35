//! # Configuration Management
//!
//! This module handles loading and parsing configuration from the tide-panel.toml file.
//! It provides a centralized way to configure the location, the two remote sources,
//! how tide labels are aligned to dates, and how moon phases are named.
//!
//! Every section is optional: a file containing only `[location]` keeps the
//! defaults for everything else.

use crate::alignment::AlignmentStrategy;
use crate::lunar::PhasePartition;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};

/// Default configuration file, looked up in the working directory.
pub const CONFIG_FILE: &str = "tide-panel.toml";

/// Errors raised while reading or writing the configuration file.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config IO: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config file format: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("config serialization: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid moon phase partition: {0}")]
    InvalidPartition(String),
}

/// Application configuration loaded from tide-panel.toml
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Where the panel is for
    pub location: LocationConfig,
    /// Daily weather forecast source
    pub forecast: ForecastConfig,
    /// Tide table source and parsing
    pub tides: TideConfig,
    /// Moon phase naming
    pub moon: MoonConfig,
}

/// Fixed location shown on the panel
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LocationConfig {
    /// Human-readable name for the panel title
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    /// IANA timezone the forecast API reports days in
    pub timezone: String,
}

/// Forecast API settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ForecastConfig {
    /// Endpoint of an Open-Meteo compatible daily forecast API
    pub url: String,
    /// Transport timeout; `None` leaves the client default
    pub timeout_secs: Option<u64>,
}

/// Tide page settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TideConfig {
    /// Page holding the tide table
    pub url: String,
    /// User-Agent header sent with the page request
    pub user_agent: String,
    pub timeout_secs: u64,
    /// Text that identifies the date column of the tide table
    pub date_marker: String,
    /// Text that identifies the time column of the tide table
    pub time_marker: String,
    /// How page date labels are matched to calendar dates
    pub alignment: AlignmentStrategy,
}

/// Moon phase naming
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct MoonConfig {
    /// Buckets mapping a phase fraction to a phase name
    pub partition: PhasePartition,
}

impl Default for LocationConfig {
    fn default() -> Self {
        LocationConfig {
            name: "Le Havre".to_string(),
            latitude: 49.4938,
            longitude: 0.1077,
            timezone: "Europe/Paris".to_string(),
        }
    }
}

impl Default for ForecastConfig {
    fn default() -> Self {
        ForecastConfig {
            url: "https://api.open-meteo.com/v1/forecast".to_string(),
            timeout_secs: Some(10),
        }
    }
}

impl Default for TideConfig {
    fn default() -> Self {
        TideConfig {
            url: "https://maree.info/19".to_string(),
            user_agent: "Mozilla/5.0".to_string(),
            timeout_secs: 10,
            date_marker: "Date".to_string(),
            time_marker: "Heure".to_string(),
            alignment: AlignmentStrategy::default(),
        }
    }
}

impl Config {
    /// Load configuration from tide-panel.toml file
    /// Falls back to default configuration if file doesn't exist or is invalid
    pub fn load() -> Self {
        Self::load_from_path(CONFIG_FILE)
    }

    /// Load configuration from specified path
    /// Falls back to default configuration if file doesn't exist or is invalid
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match Self::try_load_from_path(path) {
            Ok(config) => {
                info!(location = %config.location.name, "loaded configuration");
                config
            }
            Err(ConfigError::Io(_)) => {
                info!(path = %path.display(), "no config file found, using default configuration (Le Havre)");
                Self::default()
            }
            Err(e) => {
                warn!("{e}; using default configuration (Le Havre)");
                Self::default()
            }
        }
    }

    /// Load and validate configuration, reporting why it could not be used.
    pub fn try_load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse and validate configuration text.
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.moon
            .partition
            .validate()
            .map_err(ConfigError::InvalidPartition)
    }

    /// Save current configuration to the given path
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(&path, contents)?;
        info!(path = %path.as_ref().display(), "configuration saved");
        Ok(())
    }
}
