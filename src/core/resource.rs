//! Located content registered for packaging.

use std::path::PathBuf;
use std::str::FromStr;

use serde::Serialize;

use crate::core::os::OsConstraint;

/// A named resource ready for packaging.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resource {
    pub id: String,
    /// Final content location after the transform pipeline.
    pub location: PathBuf,
    /// The location as declared, before any transform.
    pub origin: PathBuf,
    pub transcoded: bool,
    pub canonicalized: bool,
    pub substituted: bool,
}

impl Resource {
    /// A resource registered exactly as located.
    pub fn plain(id: impl Into<String>, location: PathBuf) -> Self {
        Resource {
            id: id.into(),
            origin: location.clone(),
            location,
            transcoded: false,
            canonicalized: false,
            substituted: false,
        }
    }
}

/// Strings and flag of one installer language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LangPack {
    pub iso3: String,
    pub strings: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flag: Option<PathBuf>,
}

/// Which runtime a library is staged for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LibraryStage {
    #[default]
    Install,
    Both,
    Uninstall,
}

impl LibraryStage {
    pub const EXPECTED: &'static str = "install, both, uninstall";

    pub fn for_uninstaller(self) -> bool {
        self != LibraryStage::Install
    }
}

impl FromStr for LibraryStage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "install" => Ok(LibraryStage::Install),
            "both" => Ok(LibraryStage::Both),
            "uninstall" => Ok(LibraryStage::Uninstall),
            _ => Err(format!("invalid stage '{}'", s)),
        }
    }
}

/// A platform library shipped with the installer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NativeLibrary {
    pub kind: String,
    pub name: String,
    pub location: PathBuf,
    pub os_constraints: Vec<OsConstraint>,
    pub for_uninstaller: bool,
}

/// A library merged into the installer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JarContent {
    pub location: PathBuf,
    /// Path inside the installer's resources, when bundled from the home.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bundled_as: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CustomDataKind {
    UninstallerJar,
    UninstallerLib,
    InstallerListener,
    UninstallerListener,
}

/// Extra material staged for the installer or uninstaller runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CustomData {
    pub kind: CustomDataKind,
    /// Class names, library names or contained file paths, depending on `kind`.
    pub names: Vec<String>,
    pub os_constraints: Vec<OsConstraint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<PathBuf>,
}

/// A condition checked before installation starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstallerRequirement {
    pub condition: String,
    pub message: String,
}
