//! Configuration file support for Packwright.
//!
//! Packwright supports two configuration file locations:
//! - Global: `~/.packwright/config.toml` - User-wide defaults
//! - Project: `<basedir>/.packwright/config.toml` - Project-specific overrides
//!
//! Project config takes precedence over global config. Command-line flags
//! take precedence over both.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::info::InstallerKind;
use crate::util::substitute::MissingTokenPolicy;

/// Environment variable that overrides the installation home.
pub const HOME_ENV: &str = "PACKWRIGHT_HOME";

/// Packwright configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Compilation settings
    pub compile: CompileConfig,

    /// Token substitution settings
    pub substitution: SubstitutionConfig,
}

/// Compilation-related configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CompileConfig {
    /// Installation home holding built-in resources (`bin/`, `lib/`)
    pub home: Option<PathBuf>,

    /// Extra built-in resource roots searched after the home
    pub resource_dirs: Vec<PathBuf>,

    /// Installer kind (standard, web)
    pub kind: Option<String>,
}

/// Substitution-related configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SubstitutionConfig {
    /// Policy for undefined compile-time properties
    pub properties: Option<MissingTokenPolicy>,

    /// Policy for undefined install-time variables
    pub variables: Option<MissingTokenPolicy>,
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Load configuration with fallback to defaults if file doesn't exist.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {}: {}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: Config) {
        if other.compile.home.is_some() {
            self.compile.home = other.compile.home;
        }
        if !other.compile.resource_dirs.is_empty() {
            self.compile.resource_dirs = other.compile.resource_dirs;
        }
        if other.compile.kind.is_some() {
            self.compile.kind = other.compile.kind;
        }

        if other.substitution.properties.is_some() {
            self.substitution.properties = other.substitution.properties;
        }
        if other.substitution.variables.is_some() {
            self.substitution.variables = other.substitution.variables;
        }
    }

    /// Parse the installer kind from config string.
    pub fn kind(&self) -> Option<InstallerKind> {
        self.compile.kind.as_ref().and_then(|s| s.parse().ok())
    }
}

/// Load merged configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (`.packwright/config.toml`)
/// 2. Global config (`~/.packwright/config.toml`)
/// 3. Defaults
pub fn load_config(global_path: &Path, project_path: &Path) -> Config {
    let mut config = Config::default();

    if global_path.exists() {
        config.merge(Config::load_or_default(global_path));
    }

    if project_path.exists() {
        config.merge(Config::load_or_default(project_path));
    }

    config
}

/// Get the global packwright config directory (~/.packwright).
pub fn global_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".packwright"))
}

/// Get the project config path (`<basedir>/.packwright/config.toml`).
pub fn project_config_path(base_dir: &Path) -> PathBuf {
    base_dir.join(".packwright").join("config.toml")
}
