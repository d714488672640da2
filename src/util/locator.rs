//! Resource lookup against the project base directory and the built-in search path.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Where a resource is looked up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceScope {
    /// Relative to the project base directory.
    Project,
    /// Bundled asset under the installation home or an extra resource root.
    Builtin,
}

/// A resource could not be located.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("resource `{path}` not found (searched {})", searched_display(.searched))]
pub struct LocateError {
    pub path: String,
    pub searched: Vec<PathBuf>,
}

fn searched_display(searched: &[PathBuf]) -> String {
    searched
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Resolves relative paths to existing files.
#[derive(Debug, Clone)]
pub struct ResourceLocator {
    base_dir: PathBuf,
    search_path: Vec<PathBuf>,
}

impl ResourceLocator {
    /// `search_path` lists the built-in roots in lookup order.
    pub fn new(base_dir: impl Into<PathBuf>, search_path: Vec<PathBuf>) -> Self {
        ResourceLocator {
            base_dir: base_dir.into(),
            search_path,
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Resolve `path` against the base directory; absolute paths are kept.
    ///
    /// The result may not exist.
    pub fn project_path(&self, path: &str) -> PathBuf {
        let candidate = Path::new(path);
        if candidate.is_absolute() {
            candidate.to_path_buf()
        } else {
            self.base_dir.join(candidate)
        }
    }

    /// Locate an existing resource.
    pub fn locate(&self, scope: ResourceScope, path: &str) -> Result<PathBuf, LocateError> {
        let candidates: Vec<PathBuf> = match scope {
            ResourceScope::Project => vec![self.project_path(path)],
            ResourceScope::Builtin if Path::new(path).is_absolute() => vec![PathBuf::from(path)],
            ResourceScope::Builtin => self.search_path.iter().map(|root| root.join(path)).collect(),
        };

        match candidates.iter().find(|c| c.exists()) {
            Some(found) => Ok(found.clone()),
            None => Err(LocateError {
                path: path.to_string(),
                searched: candidates,
            }),
        }
    }

    /// Like [`locate`](Self::locate), but `None` instead of an error.
    pub fn find(&self, scope: ResourceScope, path: &str) -> Option<PathBuf> {
        self.locate(scope, path).ok()
    }
}
