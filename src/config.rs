//! Configuration management for the LogDumper demo
//!
//! The library never reads files on its own; this is the binary's configuration,
//! loaded from TOML.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::logger::LoggerOptions;

/// Environment variable pointing at an explicit config file
pub const CONFIG_ENV: &str = "LOGDUMPER_CONFIG";

/// Where the DevTools panel is docked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PanelPosition {
    Top,
    #[default]
    Bottom,
}

/// DevTools panel options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DevToolsConfig {
    /// Dock position
    #[serde(default)]
    pub position: PanelPosition,

    /// Start collapsed to a single status line (default: true)
    #[serde(default = "default_collapsed")]
    pub default_collapsed: bool,

    /// Maximum height of the expanded panel in rows (default: 16)
    #[serde(default = "default_max_height")]
    pub max_height: u16,
}

fn default_collapsed() -> bool {
    true
}

fn default_max_height() -> u16 {
    16
}

impl Default for DevToolsConfig {
    fn default() -> Self {
        Self {
            position: PanelPosition::default(),
            default_collapsed: default_collapsed(),
            max_height: default_max_height(),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Options of the root logger
    #[serde(default)]
    pub logger: LoggerOptions,

    /// DevTools panel options
    #[serde(default)]
    pub devtools: DevToolsConfig,
}

impl Config {
    /// Load configuration from `$LOGDUMPER_CONFIG` or `~/.logdumper/config.toml`,
    /// or return the default if neither exists
    pub fn load() -> Result<Self> {
        match config_file_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load configuration from a specific file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> crate::Result<Self> {
        Ok(toml::from_str(content)?)
    }
}

/// Get the base configuration directory (~/.logdumper)
pub fn config_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".logdumper"))
}

/// Get the directory holding the log files (~/.logdumper/logs)
pub fn logs_dir() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("logs"))
}

/// Get the path to the config file, honouring `$LOGDUMPER_CONFIG`
pub fn config_file_path() -> Option<PathBuf> {
    match std::env::var_os(CONFIG_ENV) {
        Some(path) if !path.is_empty() => Some(PathBuf::from(path)),
        _ => config_dir().map(|dir| dir.join("config.toml")),
    }
}
