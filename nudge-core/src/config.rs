//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/nudge/config.toml`
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/nudge/` (~/.config/nudge/)
//! - Data: `$XDG_DATA_HOME/nudge/` (~/.local/share/nudge/)
//! - State/Logs: `$XDG_STATE_HOME/nudge/` (~/.local/state/nudge/)

use crate::error::{Error, Result};
use crate::types::{SensitivityLevel, SuggestionPreferences};
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
    /// Engine configuration
    #[serde(default)]
    pub engine: EngineConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Suggestion engine configuration
///
/// These are the starting preferences for a session whose user has not
/// customized anything yet; sessions evolve their own copy from there.
#[derive(Debug, Deserialize, Clone)]
pub struct EngineConfig {
    /// Minimum relevance score a suggestion needs to surface
    #[serde(default = "default_min_relevance_threshold")]
    pub min_relevance_threshold: f64,

    /// Daily suggestion cap
    #[serde(default = "default_max_suggestions_per_day")]
    pub max_suggestions_per_day: u32,

    /// Suggestions shown at once
    #[serde(default = "default_max_suggestions_visible")]
    pub max_suggestions_visible: usize,

    /// Global sensitivity (low, medium, high)
    #[serde(default = "default_sensitivity")]
    pub sensitivity: SensitivityLevel,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_relevance_threshold: default_min_relevance_threshold(),
            max_suggestions_per_day: default_max_suggestions_per_day(),
            max_suggestions_visible: default_max_suggestions_visible(),
            sensitivity: default_sensitivity(),
        }
    }
}

impl EngineConfig {
    /// Validate configuration, returning error message if invalid
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.min_relevance_threshold) {
            return Err(Error::Config(
                "engine.min_relevance_threshold must be between 0.0 and 1.0".to_string(),
            ));
        }
        if self.max_suggestions_visible == 0 {
            return Err(Error::Config(
                "engine.max_suggestions_visible must be at least 1".to_string(),
            ));
        }
        if self.max_suggestions_per_day == 0 {
            return Err(Error::Config(
                "engine.max_suggestions_per_day must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Starting preferences for a user who has not customized anything.
    pub fn default_preferences(&self) -> SuggestionPreferences {
        SuggestionPreferences {
            min_relevance_threshold: self.min_relevance_threshold,
            max_suggestions_per_day: self.max_suggestions_per_day,
            max_suggestions_visible: self.max_suggestions_visible,
            sensitivity_level: self.sensitivity,
            ..SuggestionPreferences::default()
        }
    }
}

fn default_min_relevance_threshold() -> f64 {
    0.5
}

fn default_max_suggestions_per_day() -> u32 {
    10
}

fn default_max_suggestions_visible() -> usize {
    3
}

fn default_sensitivity() -> SensitivityLevel {
    SensitivityLevel::Medium
}

/// Logging configuration
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Maximum number of log files to keep
    #[serde(default = "default_max_log_files")]
    pub max_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            max_files: default_max_log_files(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_log_files() -> usize {
    5
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

        config.engine.validate()?;
        Ok(config)
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/nudge/config.toml` (~/.config/nudge/config.toml)
    pub fn config_path() -> PathBuf {
        xdg_config_home().join("nudge").join("config.toml")
    }

    /// Returns the data directory path (default location of the JSONL
    /// event export the CLI reads)
    ///
    /// `$XDG_DATA_HOME/nudge/` (~/.local/share/nudge/)
    pub fn data_dir() -> PathBuf {
        xdg_data_home().join("nudge")
    }

    /// Returns the state directory path (for logs)
    ///
    /// `$XDG_STATE_HOME/nudge/` (~/.local/state/nudge/)
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join("nudge")
    }

    /// Returns the log file path
    ///
    /// `$XDG_STATE_HOME/nudge/nudge.log` (~/.local/state/nudge/nudge.log)
    pub fn log_path() -> PathBuf {
        Self::state_dir().join("nudge.log")
    }

    /// Ensure XDG base directory environment variables are set.
    ///
    /// This is mainly for CLI binaries that want explicit, stable path behavior
    /// before invoking other components that read these env vars.
    pub fn ensure_xdg_env() {
        let home = home_dir();

        if std::env::var("XDG_DATA_HOME").is_err() {
            std::env::set_var("XDG_DATA_HOME", home.join(".local/share"));
        }

        if std::env::var("XDG_STATE_HOME").is_err() {
            std::env::set_var("XDG_STATE_HOME", home.join(".local/state"));
        }

        if std::env::var("XDG_CONFIG_HOME").is_err() {
            std::env::set_var("XDG_CONFIG_HOME", home.join(".config"));
        }
    }
}
