//! Global context for Packwright operations.
//!
//! Provides centralized access to configuration, paths, and environment.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::util::config::{self, Config, HOME_ENV};

/// Global context containing configuration and paths.
#[derive(Debug, Clone)]
pub struct GlobalContext {
    /// Current working directory
    cwd: PathBuf,

    /// User-wide packwright directory (~/.packwright/)
    config_dir: PathBuf,

    /// Whether to use colors in output
    color: bool,
}

impl GlobalContext {
    /// Create a new GlobalContext with defaults.
    pub fn new() -> Result<Self> {
        let cwd = std::env::current_dir().context("failed to get current directory")?;
        let config_dir =
            config::global_config_dir().unwrap_or_else(|| PathBuf::from(".packwright"));

        Ok(GlobalContext {
            cwd,
            config_dir,
            color: true,
        })
    }

    /// Create a GlobalContext with a specific working directory.
    pub fn with_cwd(cwd: PathBuf) -> Result<Self> {
        let mut ctx = Self::new()?;
        ctx.cwd = cwd;
        Ok(ctx)
    }

    /// Use a different user-wide directory.
    pub fn with_config_dir(mut self, dir: PathBuf) -> Self {
        self.config_dir = dir;
        self
    }

    /// Set color output.
    pub fn set_color(&mut self, color: bool) {
        self.color = color;
    }

    /// Get the current working directory.
    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// Resolve a possibly relative path against the working directory.
    pub fn absolute(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.cwd.join(path)
        }
    }

    /// Get the user-wide packwright directory (~/.packwright/).
    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Get the global configuration file path.
    pub fn config_path(&self) -> PathBuf {
        self.config_dir.join("config.toml")
    }

    /// Load the global config merged with the config of the project at `base_dir`.
    pub fn load_config(&self, base_dir: &Path) -> Config {
        config::load_config(&self.config_path(), &config::project_config_path(base_dir))
    }

    /// Pick the installation home: flag, then `PACKWRIGHT_HOME`, then config,
    /// then the user-wide directory.
    pub fn resolve_home(&self, flag: Option<&Path>, config: &Config) -> PathBuf {
        if let Some(home) = flag {
            return self.absolute(home);
        }
        if let Some(home) = std::env::var_os(HOME_ENV).filter(|v| !v.is_empty()) {
            return self.absolute(Path::new(&home));
        }
        if let Some(home) = config.compile.home.as_deref() {
            return self.absolute(home);
        }
        self.config_dir.clone()
    }

    /// Check if color output is enabled.
    pub fn color(&self) -> bool {
        self.color
    }
}
