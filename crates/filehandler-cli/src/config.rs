//! Layered TOML configuration.
//!
//! Precedence order (highest to lowest):
//! 1. Command-line arguments
//! 2. Project config (./.filehandler.toml)
//! 3. User config (~/.filehandler.toml)
//! 4. Built-in defaults

use anyhow::{Context, Result};
use colored::Colorize;
use filehandler_backend::HandlerOptions;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// File name of both the user and the project config.
pub const CONFIG_FILE_NAME: &str = ".filehandler.toml";

/// Log file used when nothing else is configured.
pub const DEFAULT_LOG_FILE: &str = "filehandler.log";

/// Written by `config init`.
pub const DEFAULT_CONFIG: &str = r#"# filehandler configuration file

# Defaults for the load command (and the reading side of convert)
[load]
# Text encoding for txt and json files; "none" disables decoding
# encoding = "utf-8"

# Transfer mode; a mode containing "b" reads raw bytes
# mode = "r"

# Spread the batch over a worker pool
# parallel = false

# Worker count (defaults to the number of CPUs)
# workers = 4

# Defaults for the write command (and the writing side of convert)
[write]
# encoding = "utf-8"
# mode = "w"
# parallel = false

# Seconds to wait between retries when a target is locked
# backoff_secs = 5

[logging]
# Level written to the log file: error, warn, info, debug, trace, off
# level = "info"

# Append-only log file; an empty string disables it
# file = "filehandler.log"

# Show progress bars
# progress = true
"#;

/// Effective configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Defaults for reading
    #[serde(skip_serializing_if = "Option::is_none")]
    pub load: Option<IoConfig>,

    /// Defaults for writing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub write: Option<IoConfig>,

    /// Log and progress settings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logging: Option<LoggingConfig>,
}

/// Settings of one direction (`[load]` or `[write]`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IoConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encoding: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub parallel: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub workers: Option<usize>,

    /// Only meaningful for `[write]`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backoff_secs: Option<u64>,
}

/// `[logging]` table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<bool>,
}

impl IoConfig {
    /// Field-wise overlay: values set in `over` win.
    #[must_use]
    pub fn overlay(self, over: Self) -> Self {
        Self {
            encoding: over.encoding.or(self.encoding),
            mode: over.mode.or(self.mode),
            parallel: over.parallel.or(self.parallel),
            workers: over.workers.or(self.workers),
            backoff_secs: over.backoff_secs.or(self.backoff_secs),
        }
    }

    /// Handler options for this section.
    #[must_use]
    pub fn to_options(&self) -> HandlerOptions {
        let mut options = HandlerOptions::default()
            .with_parallel(self.parallel.unwrap_or(false))
            .with_workers(self.workers);
        if let Some(encoding) = self.encoding.as_deref() {
            options = options.with_encoding(Some(encoding));
        }
        if let Some(mode) = &self.mode {
            options = options.with_mode(mode.clone());
        }
        if let Some(secs) = self.backoff_secs {
            options = options.with_backoff(Duration::from_secs(secs));
        }
        options
    }
}

impl LoggingConfig {
    #[must_use]
    pub fn overlay(self, over: Self) -> Self {
        Self {
            level: over.level.or(self.level),
            file: over.file.or(self.file),
            progress: over.progress.or(self.progress),
        }
    }
}

fn overlay_section<T>(base: Option<T>, over: Option<T>, merge: fn(T, T) -> T) -> Option<T> {
    match (base, over) {
        (Some(base), Some(over)) => Some(merge(base, over)),
        (base, over) => over.or(base),
    }
}

impl Config {
    /// Load configuration from file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// User config path (~/.filehandler.toml), if a home directory exists.
    pub fn user_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(CONFIG_FILE_NAME))
    }

    /// Project config path (./.filehandler.toml).
    pub fn project_path() -> PathBuf {
        PathBuf::from(CONFIG_FILE_NAME)
    }

    fn load_if_present(path: &Path) -> Option<Self> {
        if !path.exists() {
            return None;
        }
        match Self::load_from_file(path) {
            Ok(config) => Some(config),
            Err(e) => {
                eprintln!("{} {e:#}", "Warning:".yellow().bold());
                None
            }
        }
    }

    /// Find and merge the user and project configs. Unreadable files are
    /// reported and skipped.
    pub fn discover() -> Self {
        let user = Self::user_path().and_then(|p| Self::load_if_present(&p));
        let project = Self::load_if_present(&Self::project_path());
        Self::merge(user, project)
    }

    /// Merge configs, `project` over `user`.
    pub fn merge(user: Option<Self>, project: Option<Self>) -> Self {
        let user = user.unwrap_or_default();
        let project = project.unwrap_or_default();
        Self {
            load: overlay_section(user.load, project.load, IoConfig::overlay),
            write: overlay_section(user.write, project.write, IoConfig::overlay),
            logging: overlay_section(user.logging, project.logging, LoggingConfig::overlay),
        }
    }

    /// `[load]`, or defaults.
    pub fn load_section(&self) -> IoConfig {
        self.load.clone().unwrap_or_default()
    }

    /// `[write]`, or defaults.
    pub fn write_section(&self) -> IoConfig {
        self.write.clone().unwrap_or_default()
    }

    /// `[logging]`, or defaults.
    pub fn logging_section(&self) -> LoggingConfig {
        self.logging.clone().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_parses_to_empty_sections() {
        let config: Config = toml::from_str(DEFAULT_CONFIG).unwrap();
        assert_eq!(config.load, Some(IoConfig::default()));
        assert_eq!(config.write, Some(IoConfig::default()));
        assert_eq!(config.logging, Some(LoggingConfig::default()));
    }

    #[test]
    fn test_project_overrides_user_field_by_field() {
        let user: Config = toml::from_str(
            "[load]\nencoding = \"latin1\"\nparallel = true\n[logging]\nlevel = \"debug\"\n",
        )
        .unwrap();
        let project: Config = toml::from_str("[load]\nencoding = \"utf-8\"\n").unwrap();

        let merged = Config::merge(Some(user), Some(project));
        let load = merged.load_section();
        assert_eq!(load.encoding.as_deref(), Some("utf-8"));
        assert_eq!(load.parallel, Some(true));
        assert_eq!(merged.logging_section().level.as_deref(), Some("debug"));
        assert_eq!(merged.write, None);
    }

    #[test]
    fn test_section_to_options() {
        let section = IoConfig {
            encoding: Some("none".into()),
            mode: Some("wb".into()),
            parallel: Some(true),
            workers: Some(2),
            backoff_secs: Some(0),
        };
        let options = section.to_options();
        assert_eq!(options.encoding.as_deref(), Some("none"));
        assert_eq!(options.mode.as_deref(), Some("wb"));
        assert!(options.parallel);
        assert_eq!(options.workers, Some(2));
        assert_eq!(options.backoff, Duration::ZERO);
    }

    #[test]
    fn test_wrong_value_type_is_an_error() {
        let err = toml::from_str::<Config>("[load]\nparallel = \"yes\"\n").unwrap_err();
        assert!(err.to_string().contains("expected a boolean"));
    }
}
