//! Command-line arguments and resolved runtime configuration.
//!
//! # Responsibility
//! - Parse flags with clap.
//! - Resolve database and log locations from flags, environment, and the
//!   platform data directory, in that order.

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use tasklist_core::LogLevel;

const DB_PATH_ENV: &str = "TASKLIST_DB_PATH";
const APP_DIR_NAME: &str = "tasklist";
const DB_FILE_NAME: &str = "tasks.sqlite3";
const LOG_DIR_NAME: &str = "logs";

#[derive(Debug, Parser)]
#[command(name = "tasklist")]
#[command(about = "Local task list kept in sync across every open terminal", long_about = None)]
#[command(version)]
pub struct Cli {
    /// SQLite file holding the task slot (overrides TASKLIST_DB_PATH).
    #[arg(long)]
    pub db: Option<PathBuf>,

    /// trace|debug|info|warn|error; defaults to debug in debug builds.
    #[arg(long)]
    pub log_level: Option<String>,

    /// Directory for rolling log files.
    #[arg(long)]
    pub log_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub log_dir: PathBuf,
    pub log_level: LogLevel,
}

impl AppConfig {
    pub fn resolve(cli: &Cli) -> Result<Self> {
        let env_db = std::env::var(DB_PATH_ENV).ok();
        Self::resolve_with(cli, env_db.as_deref(), dirs::data_local_dir())
    }

    fn resolve_with(cli: &Cli, env_db: Option<&str>, data_dir: Option<PathBuf>) -> Result<Self> {
        let app_dir = data_dir
            .unwrap_or_else(std::env::temp_dir)
            .join(APP_DIR_NAME);

        let db_path = match (&cli.db, env_db.map(str::trim)) {
            (Some(path), _) => path.clone(),
            (None, Some(raw)) if !raw.is_empty() => PathBuf::from(raw),
            _ => app_dir.join(DB_FILE_NAME),
        };

        let log_dir = match &cli.log_dir {
            Some(dir) => absolutize(dir)?,
            None => app_dir.join(LOG_DIR_NAME),
        };

        let log_level = match cli.log_level.as_deref() {
            Some(raw) => raw.parse::<LogLevel>()?,
            None => LogLevel::build_default(),
        };

        Ok(Self {
            db_path,
            log_dir,
            log_level,
        })
    }
}

fn absolutize(path: &Path) -> Result<PathBuf> {
    if path.as_os_str().is_empty() {
        bail!("--log-dir cannot be empty");
    }
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().context("failed to read current directory")?;
    Ok(cwd.join(path))
}
