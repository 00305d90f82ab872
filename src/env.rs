use crate::config::Config;
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::env as stdenv;
use std::fs;
use std::path::{Path, PathBuf};

/// State handed to every builtin invocation.
///
/// The context contains:
/// - `vars`: a snapshot of the environment taken at startup (`PATH`, `USER`, `HOME`).
/// - `current_dir`: the working directory shown in the prompt.
/// - `config`: where builtins keep their files.
#[derive(Debug, Clone)]
pub struct ShellContext {
    pub vars: HashMap<String, String>,
    pub current_dir: PathBuf,
    pub config: Config,
}

impl ShellContext {
    /// Capture the current process state into a new context.
    pub fn new(config: Config) -> Self {
        let vars = stdenv::vars().collect();
        let current_dir = stdenv::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self {
            vars,
            current_dir,
            config,
        }
    }

    /// Get the value of an environment variable.
    ///
    /// Looks up the key in `self.vars` first, falling back to `std::env::var`.
    pub fn get_var(&self, key: &str) -> Option<String> {
        self.vars
            .get(key)
            .cloned()
            .or_else(|| stdenv::var(key).ok())
    }

    /// Set or override a variable in the snapshot.
    pub fn set_var(&mut self, key: impl Into<String>, val: impl Into<String>) {
        self.vars.insert(key.into(), val.into());
    }

    pub fn user(&self) -> String {
        self.get_var("USER").unwrap_or_default()
    }

    /// Changes the working directory of the shell process.
    ///
    /// Relative targets are resolved against `current_dir`. Spawned programs
    /// inherit the new directory.
    pub fn change_dir(&mut self, target: &Path) -> Result<()> {
        let new_dir = if target.is_absolute() {
            target.to_path_buf()
        } else {
            self.current_dir.join(target)
        };
        let canonical = fs::canonicalize(&new_dir)
            .with_context(|| format!("{}", new_dir.display()))?;
        stdenv::set_current_dir(&canonical)
            .with_context(|| format!("{}", canonical.display()))?;
        self.current_dir = canonical;
        Ok(())
    }
}
