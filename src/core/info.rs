//! Installer-wide metadata: application info, GUI preferences and packaging.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;

/// Default packager implementation.
pub const DEFAULT_PACKAGER: &str = "packwright.packager.Packager";

/// Default unpacker implementation.
pub const DEFAULT_UNPACKER: &str = "packwright.installer.Unpacker";

/// The kind of installer being produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InstallerKind {
    #[default]
    Standard,
    /// Pack content is downloaded from `webdir` at install time.
    Web,
}

impl FromStr for InstallerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "standard" => Ok(InstallerKind::Standard),
            "web" => Ok(InstallerKind::Web),
            _ => Err(format!(
                "invalid installer kind '{}'; expected 'standard' or 'web'",
                s
            )),
        }
    }
}

impl fmt::Display for InstallerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InstallerKind::Standard => write!(f, "standard"),
            InstallerKind::Web => write!(f, "web"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Author {
    pub name: String,
    pub email: String,
}

/// Whether the installer reboots the machine when it finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RebootAction {
    #[default]
    Ignore,
    Notice,
    Ask,
    Always,
}

impl RebootAction {
    pub const EXPECTED: &'static str = "ignore, notice, ask, always";
}

impl FromStr for RebootAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ignore" => Ok(RebootAction::Ignore),
            "notice" => Ok(RebootAction::Notice),
            "ask" => Ok(RebootAction::Ask),
            "always" => Ok(RebootAction::Always),
            _ => Err(format!("invalid reboot action '{}'", s)),
        }
    }
}

/// The `<info>` block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Info {
    pub app_name: String,
    pub app_version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_subpath: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub authors: Vec<Author>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub web_dir: Option<String>,
    pub requires_privileges: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub privileges_condition: Option<String>,
    pub uninstaller_requires_privileges: bool,
    pub reboot_action: RebootAction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reboot_condition: Option<String>,
    /// Uninstaller jar name, `None` when no uninstaller is written.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uninstaller_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uninstaller_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uninstaller_condition: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary_log_path: Option<String>,
    pub write_installation_information: bool,
    pub unpacker_class: String,
}

impl Info {
    pub fn writes_uninstaller(&self) -> bool {
        self.uninstaller_name.is_some()
    }
}

/// Look-and-feel selection for one OS family.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LookAndFeel {
    pub name: String,
    pub os_families: Vec<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub params: BTreeMap<String, String>,
}

/// The `<guiprefs>` block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GuiPrefs {
    pub resizable: bool,
    pub width: i64,
    pub height: i64,
    pub look_and_feels: Vec<LookAndFeel>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub modifiers: BTreeMap<String, String>,
}

/// Known look-and-feels and their bundled libraries.
pub const LOOK_AND_FEEL_JARS: &[(&str, &str)] = &[
    ("liquid", "liquidlnf.jar"),
    ("kunststoff", "kunststoff.jar"),
    ("metouia", "metouia.jar"),
    ("looks", "looks.jar"),
    ("substance", "substance.jar"),
    ("nimbus", "nimbus.jar"),
];

/// The bundled library for a look-and-feel name.
pub fn look_and_feel_jar(name: &str) -> Option<&'static str> {
    LOOK_AND_FEEL_JARS
        .iter()
        .find(|(laf, _)| *laf == name)
        .map(|(_, jar)| *jar)
}

/// The packager and unpacker implementations the back end should use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Packaging {
    pub packager_class: String,
    pub unpacker_class: String,
    /// Serialized `<options>` subtree handed to the packager.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub packager_options: Option<String>,
}

impl Default for Packaging {
    fn default() -> Self {
        Packaging {
            packager_class: DEFAULT_PACKAGER.to_string(),
            unpacker_class: DEFAULT_UNPACKER.to_string(),
            packager_options: None,
        }
    }
}
