//! Configuration management
//!
//! This module handles loading and managing configuration from:
//! - Command-line arguments
//! - Environment variables
//! - Configuration files (TOML)
//! - Defaults

use crate::error::{Error, Result};
use crate::state_machine::Pacing;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub timing: TimingConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Run loop pacing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingConfig {
    /// One-time delay before the first tick
    #[serde(default)]
    pub delay_ms: u64,

    /// Pause between ticks
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    /// Latency between detecting pending input and consuming it
    #[serde(default = "default_consume_delay_ms")]
    pub consume_delay_ms: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path
    pub file: Option<PathBuf>,
}

// Default value functions

fn default_interval_ms() -> u64 {
    500
}

fn default_consume_delay_ms() -> u64 {
    1000
}

fn default_log_level() -> String {
    "info".to_string()
}

// Default implementations

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            delay_ms: 0,
            interval_ms: default_interval_ms(),
            consume_delay_ms: default_consume_delay_ms(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

impl From<&TimingConfig> for Pacing {
    fn from(timing: &TimingConfig) -> Self {
        Pacing {
            delay: Duration::from_millis(timing.delay_ms),
            interval: Duration::from_millis(timing.interval_ms),
            consume_delay: Duration::from_millis(timing.consume_delay_ms),
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let contents = std::fs::read_to_string(&path)
            .map_err(|e| Error::Config(format!("Failed to read config file {:?}: {}", path, e)))?;

        let config: Config = toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse config file {:?}: {}", path, e)))?;

        Ok(config)
    }

    /// Load configuration from default locations
    ///
    /// Searches in order:
    /// 1. ./moore-fsm.toml
    /// 2. ~/.moore-fsm/config.toml
    /// 3. /etc/moore-fsm/config.toml
    pub fn load() -> Result<Self> {
        let mut paths = vec![PathBuf::from("moore-fsm.toml")];
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".moore-fsm").join("config.toml"));
        }
        paths.push(PathBuf::from("/etc/moore-fsm/config.toml"));

        for path in paths {
            if path.exists() {
                tracing::info!("Loading config from {:?}", path);
                return Self::from_file(path);
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Config::default())
    }

    /// Pacing for a machine built from this configuration
    pub fn pacing(&self) -> Pacing {
        Pacing::from(&self.timing)
    }
}
