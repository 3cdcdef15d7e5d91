//! Global context for cmakegen operations.
//!
//! Provides centralized access to the working directory, output settings and
//! configuration file locations.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::util::config::{self, Config};

/// Global context containing configuration and paths.
#[derive(Debug, Clone)]
pub struct GlobalContext {
    /// Current working directory
    cwd: PathBuf,

    /// Whether to use verbose output
    verbose: bool,

    /// Whether to use colors in output
    color: bool,

    /// Global config file, if a home directory is known
    global_config: Option<PathBuf>,
}

impl GlobalContext {
    /// Create a new GlobalContext with defaults.
    pub fn new() -> Result<Self> {
        let cwd = std::env::current_dir().context("failed to get current directory")?;
        Ok(Self::with_cwd(cwd))
    }

    /// Create a GlobalContext rooted at a specific directory.
    pub fn with_cwd(cwd: PathBuf) -> Self {
        GlobalContext {
            cwd,
            verbose: false,
            color: true,
            global_config: config::global_config_path(),
        }
    }

    /// Set verbose output.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Set colored output.
    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    /// Override the global config location (None disables it).
    pub fn with_global_config(mut self, path: Option<PathBuf>) -> Self {
        self.global_config = path;
        self
    }

    /// Get the current working directory.
    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// Check if verbose output is enabled.
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    /// Check if colored output is enabled.
    pub fn color(&self) -> bool {
        self.color
    }

    /// Load the merged configuration for a solution root.
    pub fn load_config(&self, solution_root: &Path) -> Config {
        config::load_config(
            self.global_config.as_deref(),
            &config::project_config_path(solution_root),
        )
    }
}
