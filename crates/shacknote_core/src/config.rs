//! Application configuration resolved from the environment.
//!
//! # Responsibility
//! - Resolve database path, log directory, log level and list page size.
//! - Keep every default in one place for CLI and embedding hosts.
//!
//! # Invariants
//! - Blank environment values are treated as unset.
//! - Resolved paths are absolute.
//! - `page_size` is at least 1.

use crate::logging::{default_log_level, normalize_level};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

pub const ENV_HOME: &str = "SHACKNOTE_HOME";
pub const ENV_DB_PATH: &str = "SHACKNOTE_DB_PATH";
pub const ENV_LOG_DIR: &str = "SHACKNOTE_LOG_DIR";
pub const ENV_LOG_LEVEL: &str = "SHACKNOTE_LOG_LEVEL";
pub const ENV_PAGE_SIZE: &str = "SHACKNOTE_PAGE_SIZE";

const DB_FILE_NAME: &str = "notes.db";
const LOG_DIR_NAME: &str = "logs";
const DATA_DIR_NAME: &str = ".shacknote";
pub const DEFAULT_PAGE_SIZE: u32 = 20;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidPageSize(String),
    InvalidLogLevel(String),
    InvalidPath { path: PathBuf, reason: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidPageSize(value) => {
                write!(f, "page size must be a positive integer, got `{value}`")
            }
            Self::InvalidLogLevel(message) => write!(f, "{message}"),
            Self::InvalidPath { path, reason } => {
                write!(f, "invalid path `{}`: {reason}", path.display())
            }
        }
    }
}

impl Error for ConfigError {}

/// Resolved application settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub log_dir: PathBuf,
    pub log_level: &'static str,
    pub page_size: u32,
}

impl AppConfig {
    /// Resolves settings from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolves settings from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let data_dir = match get(ENV_HOME) {
            Some(home) => PathBuf::from(home),
            None => default_data_dir(get("HOME")),
        };

        let db_path = match get(ENV_DB_PATH) {
            Some(path) => PathBuf::from(path),
            None => data_dir.join(DB_FILE_NAME),
        };
        let log_dir = match get(ENV_LOG_DIR) {
            Some(path) => PathBuf::from(path),
            None => data_dir.join(LOG_DIR_NAME),
        };
        let log_level = match get(ENV_LOG_LEVEL) {
            Some(level) => normalize_level(&level).map_err(ConfigError::InvalidLogLevel)?,
            None => default_log_level(),
        };
        let page_size = match get(ENV_PAGE_SIZE) {
            Some(value) => parse_page_size(&value)?,
            None => DEFAULT_PAGE_SIZE,
        };

        Ok(Self {
            db_path: absolutize(&db_path)?,
            log_dir: absolutize(&log_dir)?,
            log_level,
            page_size,
        })
    }

    pub fn with_db_path(mut self, path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        self.db_path = absolutize(path.as_ref())?;
        Ok(self)
    }

    pub fn with_log_dir(mut self, path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        self.log_dir = absolutize(path.as_ref())?;
        Ok(self)
    }

    pub fn with_log_level(mut self, level: &str) -> Result<Self, ConfigError> {
        self.log_level = normalize_level(level).map_err(ConfigError::InvalidLogLevel)?;
        Ok(self)
    }

    pub fn with_page_size(mut self, page_size: u32) -> Result<Self, ConfigError> {
        if page_size == 0 {
            return Err(ConfigError::InvalidPageSize(page_size.to_string()));
        }
        self.page_size = page_size;
        Ok(self)
    }
}

/// Parses a positive page size.
pub fn parse_page_size(value: &str) -> Result<u32, ConfigError> {
    match value.trim().parse::<u32>() {
        Ok(size) if size > 0 => Ok(size),
        _ => Err(ConfigError::InvalidPageSize(value.to_string())),
    }
}

fn default_data_dir(home: Option<String>) -> PathBuf {
    match home {
        Some(home) => PathBuf::from(home).join(DATA_DIR_NAME),
        None => std::env::temp_dir().join("shacknote"),
    }
}

fn absolutize(path: &Path) -> Result<PathBuf, ConfigError> {
    std::path::absolute(path).map_err(|err| ConfigError::InvalidPath {
        path: path.to_path_buf(),
        reason: err.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::{
        parse_page_size, AppConfig, ConfigError, DEFAULT_PAGE_SIZE, ENV_DB_PATH, ENV_HOME,
        ENV_LOG_LEVEL, ENV_PAGE_SIZE,
    };
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_derive_from_home_directory() {
        let config = AppConfig::from_lookup(lookup(&[("HOME", "/home/ada")])).unwrap();
        assert_eq!(config.db_path, PathBuf::from("/home/ada/.shacknote/notes.db"));
        assert_eq!(config.log_dir, PathBuf::from("/home/ada/.shacknote/logs"));
        assert_eq!(config.page_size, DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn explicit_variables_override_defaults() {
        let config = AppConfig::from_lookup(lookup(&[
            (ENV_HOME, "/data/notes"),
            (ENV_DB_PATH, "/var/lib/notes.sqlite3"),
            (ENV_LOG_LEVEL, "WARNING"),
            (ENV_PAGE_SIZE, "5"),
        ]))
        .unwrap();
        assert_eq!(config.db_path, PathBuf::from("/var/lib/notes.sqlite3"));
        assert_eq!(config.log_dir, PathBuf::from("/data/notes/logs"));
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.page_size, 5);
    }

    #[test]
    fn blank_variables_are_treated_as_unset() {
        let config =
            AppConfig::from_lookup(lookup(&[("HOME", "/h"), (ENV_DB_PATH, "   ")])).unwrap();
        assert_eq!(config.db_path, PathBuf::from("/h/.shacknote/notes.db"));
    }

    #[test]
    fn invalid_page_size_is_rejected() {
        let err = AppConfig::from_lookup(lookup(&[("HOME", "/h"), (ENV_PAGE_SIZE, "0")]))
            .unwrap_err();
        assert_eq!(err, ConfigError::InvalidPageSize("0".to_string()));
        assert!(parse_page_size("ten").is_err());
    }

    #[test]
    fn relative_overrides_become_absolute() {
        let config = AppConfig::from_lookup(lookup(&[("HOME", "/h")]))
            .unwrap()
            .with_db_path("local.db")
            .unwrap();
        assert!(config.db_path.is_absolute());
        assert!(config.db_path.ends_with("local.db"));
    }
}
