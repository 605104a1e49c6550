//! Global context for fedtypes operations.
//!
//! Provides centralized access to the working directory and the
//! configuration locations derived from it.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::util::config::{global_config_path, load_config, project_config_path, Config};

/// Global context containing configuration and paths.
#[derive(Debug, Clone)]
pub struct GlobalContext {
    /// Current working directory
    cwd: PathBuf,

    /// Global config file (~/.fedtypes/config.toml), when a home directory exists
    global_config: Option<PathBuf>,
}

impl GlobalContext {
    /// Create a new GlobalContext rooted at the process working directory.
    pub fn new() -> Result<Self> {
        let cwd = std::env::current_dir().context("failed to get current directory")?;

        Ok(GlobalContext {
            cwd,
            global_config: global_config_path(),
        })
    }

    /// Create a GlobalContext with a specific working directory.
    pub fn with_cwd(cwd: PathBuf) -> Result<Self> {
        let mut ctx = Self::new()?;
        ctx.cwd = cwd;
        Ok(ctx)
    }

    /// Ignore the user-wide config file.
    pub fn without_global_config(mut self) -> Self {
        self.global_config = None;
        self
    }

    /// Get the current working directory.
    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// Get the project-local fedtypes directory.
    pub fn project_dir(&self) -> PathBuf {
        self.cwd.join(".fedtypes")
    }

    /// Get the project config file path.
    pub fn project_config_path(&self) -> PathBuf {
        project_config_path(&self.cwd)
    }

    /// Load the merged global and project configuration.
    pub fn load_config(&self) -> Config {
        load_config(self.global_config.as_deref(), &self.project_config_path())
    }
}
