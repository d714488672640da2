//! Packs and the entries they carry.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::Serialize;

use crate::core::os::OsConstraint;
use crate::util::substitute::SubstitutionType;

/// Metadata contributed to a file by compiler hooks.
pub type FileMetadata = BTreeMap<String, String>;

/// How an existing target file is treated at install time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OverrideType {
    #[default]
    Update,
    True,
    False,
    AskTrue,
    AskFalse,
}

impl OverrideType {
    pub const EXPECTED: &'static str = "true, false, asktrue, askfalse, update";
}

impl FromStr for OverrideType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "update" => Ok(OverrideType::Update),
            "true" => Ok(OverrideType::True),
            "false" => Ok(OverrideType::False),
            "asktrue" => Ok(OverrideType::AskTrue),
            "askfalse" => Ok(OverrideType::AskFalse),
            _ => Err(format!("invalid override type '{}'", s)),
        }
    }
}

/// How a target file that is in use is handled at install time.
///
/// Only meaningful on Windows targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Blockable {
    #[default]
    None,
    Auto,
    Force,
}

impl Blockable {
    pub const EXPECTED: &'static str = "none, auto, force";
}

impl FromStr for Blockable {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(Blockable::None),
            "auto" => Ok(Blockable::Auto),
            "force" => Ok(Blockable::Force),
            _ => Err(format!("invalid blockable type '{}'", s)),
        }
    }
}

/// One file (or empty directory) installed by a pack.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PackFile {
    /// Absolute, existing source location.
    pub source: PathBuf,
    /// Target path, relative to the install root or carrying install-time tokens.
    pub target: String,
    pub is_directory: bool,
    pub size: u64,
    pub os_constraints: Vec<OsConstraint>,
    pub override_type: OverrideType,
    pub blockable: Blockable,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: FileMetadata,
}

/// When an executable runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutableStage {
    #[default]
    Never,
    PostInstall,
    Uninstall,
}

impl FromStr for ExecutableStage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "never" => Ok(ExecutableStage::Never),
            "postinstall" => Ok(ExecutableStage::PostInstall),
            "uninstall" => Ok(ExecutableStage::Uninstall),
            _ => Err(format!("invalid executable stage '{}'", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutableKind {
    #[default]
    Bin,
    Jar,
}

impl FromStr for ExecutableKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bin" => Ok(ExecutableKind::Bin),
            "jar" => Ok(ExecutableKind::Jar),
            _ => Err(format!("invalid executable type '{}'", s)),
        }
    }
}

/// What the installer does when an executable fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureAction {
    #[default]
    Ask,
    Abort,
    Warn,
    Ignore,
}

impl FromStr for FailureAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ask" => Ok(FailureAction::Ask),
            "abort" => Ok(FailureAction::Abort),
            "warn" => Ok(FailureAction::Warn),
            "ignore" => Ok(FailureAction::Ignore),
            _ => Err(format!("invalid failure action '{}'", s)),
        }
    }
}

/// A file executed at install or uninstall time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Executable {
    pub target: String,
    pub stage: ExecutableStage,
    pub kind: ExecutableKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub main_class: Option<String>,
    pub on_failure: FailureAction,
    pub keep: bool,
    pub args: Vec<String>,
    pub os_constraints: Vec<OsConstraint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
}

/// A target file whose variables are substituted at install time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Parsable {
    pub target: String,
    pub kind: SubstitutionType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encoding: Option<String>,
    pub os_constraints: Vec<OsConstraint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
}

/// Files removed during an update if they are not part of the pack.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UpdateCheck {
    pub includes: Vec<String>,
    pub excludes: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub case_sensitive: Option<bool>,
}

/// A named unit of installable content.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Pack {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub description: String,
    pub required: bool,
    pub hidden: bool,
    pub preselected: bool,
    pub loose: bool,
    pub uninstall: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclude_group: Option<String>,
    pub install_groups: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_id: Option<String>,
    pub os_constraints: Vec<OsConstraint>,
    pub dependencies: Vec<String>,
    pub files: Vec<PackFile>,
    pub executables: Vec<Executable>,
    pub parsables: Vec<Parsable>,
    pub update_checks: Vec<UpdateCheck>,
    pub validators: Vec<String>,
}

impl Pack {
    /// A pack with the given name and description and every other field defaulted.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Pack {
            name: name.into(),
            id: None,
            description: description.into(),
            required: false,
            hidden: false,
            preselected: true,
            loose: false,
            uninstall: true,
            group: None,
            exclude_group: None,
            install_groups: Vec::new(),
            parent: None,
            condition: None,
            image_id: None,
            os_constraints: Vec::new(),
            dependencies: Vec::new(),
            files: Vec::new(),
            executables: Vec::new(),
            parsables: Vec::new(),
            update_checks: Vec::new(),
            validators: Vec::new(),
        }
    }

    /// Total size in bytes of the pack's files.
    pub fn size(&self) -> u64 {
        self.files.iter().map(|f| f.size).sum()
    }
}

impl fmt::Display for Pack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}
