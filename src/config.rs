use anyhow::{Context, Result};
use std::env;
use std::fs;
use std::path::PathBuf;

/// Name the shell uses in its prompt and error messages.
pub const SHELL_NAME: &str = "seashell";

/// Overrides the directory holding bookmarks, the cron file and helper scripts.
pub const HOME_VAR: &str = "SEASHELL_HOME";

/// Log filter in `env_logger` syntax, e.g. `debug` or `seashell::executor=trace`.
pub const LOG_VAR: &str = "SEASHELL_LOG";

const DEFAULT_LOG_FILTER: &str = "warn";

/// Startup configuration, read once from the process environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Where builtins keep their files.
    pub config_dir: PathBuf,
    /// Filter handed to the logger.
    pub log_filter: String,
}

impl Config {
    pub fn from_env() -> Self {
        let config_dir = env::var_os(HOME_VAR)
            .filter(|dir| !dir.is_empty())
            .map(PathBuf::from)
            .or_else(|| dirs::config_dir().map(|dir| dir.join(SHELL_NAME)))
            .unwrap_or_else(|| PathBuf::from("."));
        let log_filter = env::var(LOG_VAR).unwrap_or_else(|_| DEFAULT_LOG_FILTER.to_string());
        Self {
            config_dir,
            log_filter,
        }
    }

    /// Configuration rooted at an explicit directory.
    pub fn with_config_dir(config_dir: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: config_dir.into(),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }

    /// Directory bookmarks of `shortdir`.
    pub fn bookmarks_file(&self) -> PathBuf {
        self.config_dir.join("chdirMem.txt")
    }

    /// Crontab written by `goodMorning`.
    pub fn cron_file(&self) -> PathBuf {
        self.config_dir.join("cronfile.txt")
    }

    /// Script launched by `baca`.
    pub fn animation_script(&self) -> PathBuf {
        self.config_dir.join("chimneyAnimation.py")
    }

    /// Creates the configuration directory if it does not exist yet.
    pub fn ensure_config_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.config_dir).with_context(|| {
            format!(
                "can't create config directory {}",
                self.config_dir.display()
            )
        })
    }
}
