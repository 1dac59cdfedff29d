//! Command-line arguments.

use clap::Parser;
use shacknote_core::{AppConfig, ConfigError};
use std::path::PathBuf;

/// ShackNote: local notes in a terminal window.
#[derive(Debug, Parser)]
#[command(name = "shacknote", author, version, about, long_about = None)]
pub struct Cli {
    /// Notes database file (default: $SHACKNOTE_DB_PATH or ~/.shacknote/notes.db)
    #[arg(long, value_name = "FILE")]
    pub db: Option<PathBuf>,

    /// Directory for rolling log files
    #[arg(long, value_name = "DIR")]
    pub log_dir: Option<PathBuf>,

    /// trace|debug|info|warn|error
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Notes loaded per page in the list view
    #[arg(long, value_name = "N")]
    pub page_size: Option<u32>,

    /// Run one raw bridge request (JSON) and print the envelope
    #[arg(long, value_name = "JSON")]
    pub request: Option<String>,
}

impl Cli {
    /// Environment-derived config with flag overrides applied.
    pub fn resolve_config(&self) -> Result<AppConfig, ConfigError> {
        let mut config = AppConfig::from_env()?;
        if let Some(db) = &self.db {
            config = config.with_db_path(db)?;
        }
        if let Some(log_dir) = &self.log_dir {
            config = config.with_log_dir(log_dir)?;
        }
        if let Some(level) = &self.log_level {
            config = config.with_log_level(level)?;
        }
        if let Some(page_size) = self.page_size {
            config = config.with_page_size(page_size)?;
        }
        Ok(config)
    }
}
