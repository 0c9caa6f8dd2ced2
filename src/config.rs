//! Application configuration, loaded from an optional YAML file.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::state::DisplayMode;

pub const DEFAULT_CONFIG_PATH: &str = "config.yaml";

/// Which set of modes the mode key cycles through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModeCycle {
    /// All four modes.
    #[default]
    Full,
    /// High-importance, all, and rates only.
    Restricted,
}

/// Whether a forced refresh starts a cycle while the loop is paused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForceRefreshPolicy {
    #[default]
    BypassPause,
    RespectPause,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum RendererKind {
    /// Widget dashboard (ratatui).
    #[default]
    Widget,
    /// Plain ANSI output.
    Plain,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Seconds between refresh cycles.
    pub refresh_interval: u64,
    /// Mode code 0-3 the dashboard starts in.
    pub default_display_mode: u8,
    pub mode_cycle: ModeCycle,
    pub force_refresh: ForceRefreshPolicy,
    pub renderer: RendererKind,
    pub source: SourceConfig,
    pub ui: UiConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

/// Column widths, in terminal cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub time_width: usize,
    pub importance_width: usize,
    pub value_width: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub dir: PathBuf,
    pub file: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            refresh_interval: 15,
            default_display_mode: 0,
            mode_cycle: ModeCycle::default(),
            force_refresh: ForceRefreshPolicy::default(),
            renderer: RendererKind::default(),
            source: SourceConfig::default(),
            ui: UiConfig::default(),
            log: LogConfig::default(),
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: "https://rl.fx678.com".to_string(),
            timeout_secs: 10,
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            time_width: 6,
            importance_width: 4,
            value_width: 12,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("./logs"),
            file: "fxwatch.log".to_string(),
        }
    }
}

impl AppConfig {
    /// Load the config at `path`, falling back to defaults when the file does
    /// not exist. Unreadable or malformed files are errors.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        let config = Self::from_yaml(&text).map_err(|err| match err {
            ConfigError::Parse { source, .. } => ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })?;
        Ok(config)
    }

    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        // An empty file deserializes to unit, not a mapping.
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(text).map_err(|source| ConfigError::Parse {
            path: PathBuf::new(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.refresh_interval == 0 {
            return Err(ConfigError::Invalid(
                "refresh_interval must be at least 1 second".into(),
            ));
        }
        if DisplayMode::from_code(self.default_display_mode).is_none() {
            return Err(ConfigError::Invalid(format!(
                "default_display_mode must be 0-3, got {}",
                self.default_display_mode
            )));
        }
        Ok(())
    }

    pub fn refresh_period(&self) -> Duration {
        Duration::from_secs(self.refresh_interval)
    }

    pub fn initial_mode(&self) -> DisplayMode {
        DisplayMode::from_code(self.default_display_mode).unwrap_or_default()
    }
}
