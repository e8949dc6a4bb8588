//! Data directory resolution for promptly.
//!
//! All local state lives under one data directory:
//!
//! ```text
//! <data_dir>/
//!   config.yaml     optional configuration
//!   device.json     device persistence (local profile, flags, snapshots)
//!   prompts/        one YAML file per prompt
//!   events.ndjson   activity log
//! ```
//!
//! The directory is chosen from `--data-dir`, then `PROMPTLY_HOME`, then
//! `./.promptly`.

use crate::error::{PromptlyError, Result};
use std::env;
use std::path::{Path, PathBuf};

/// Environment variable naming the data directory.
pub const ENV_HOME: &str = "PROMPTLY_HOME";

/// Data directory used when nothing else is configured, relative to cwd.
pub const DEFAULT_DATA_DIR: &str = ".promptly";

/// Resolved paths for promptly's local state. All paths are absolute.
#[derive(Debug, Clone)]
pub struct AppContext {
    pub data_dir: PathBuf,
    pub config_path: PathBuf,
    pub device_path: PathBuf,
    pub prompts_dir: PathBuf,
    pub events_path: PathBuf,
}

impl AppContext {
    /// Resolve from an explicit directory, the environment, or the cwd.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        let cwd = env::current_dir().map_err(|e| {
            PromptlyError::UserError(format!("failed to get current working directory: {}", e))
        })?;
        let from_env = env::var_os(ENV_HOME)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);
        Ok(Self::resolve_with(explicit, from_env.as_deref(), &cwd))
    }

    /// Resolution without touching the process environment.
    pub fn resolve_with(explicit: Option<&Path>, from_env: Option<&Path>, cwd: &Path) -> Self {
        let chosen = explicit
            .or(from_env)
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));
        let data_dir = if chosen.is_absolute() {
            chosen
        } else {
            cwd.join(chosen)
        };
        Self::at(data_dir)
    }

    /// Context rooted at `data_dir`.
    pub fn at<P: AsRef<Path>>(data_dir: P) -> Self {
        let data_dir = data_dir.as_ref().to_path_buf();
        Self {
            config_path: data_dir.join("config.yaml"),
            device_path: data_dir.join("device.json"),
            prompts_dir: data_dir.join("prompts"),
            events_path: data_dir.join("events.ndjson"),
            data_dir,
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.prompts_dir.is_dir()
    }

    /// Error unless `promptly init` has been run for this directory.
    pub fn ensure_initialized(&self) -> Result<()> {
        if self.is_initialized() {
            return Ok(());
        }
        Err(PromptlyError::UserError(format!(
            "promptly is not initialized.\n\
             Expected prompt library at: {}\n\n\
             Run `promptly init` to create it.",
            self.prompts_dir.display()
        )))
    }
}
