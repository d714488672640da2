//! Installer panels.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::str::FromStr;

use serde::Serialize;

use crate::core::os::OsConstraint;

/// When a panel action runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionStage {
    PreConstruct,
    PreActivate,
    PreValidate,
    PostValidate,
}

impl ActionStage {
    pub const EXPECTED: &'static str = "preconstruct, preactivate, prevalidate, postvalidate";
}

impl FromStr for ActionStage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "preconstruct" => Ok(ActionStage::PreConstruct),
            "preactivate" => Ok(ActionStage::PreActivate),
            "prevalidate" => Ok(ActionStage::PreValidate),
            "postvalidate" => Ok(ActionStage::PostValidate),
            _ => Err(format!("invalid action stage '{}'", s)),
        }
    }
}

/// A class run around a panel, with its own configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PanelAction {
    pub class_name: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub configuration: BTreeMap<String, String>,
}

/// One page of the installer UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Panel {
    /// Class name as written in the manifest.
    pub class_name: String,
    /// Fully qualified class name, when a bundled jar provided one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qualified_class_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jar: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    pub os_constraints: Vec<OsConstraint>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub configuration: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validator: Option<String>,
    /// Locale (ISO3) to help resource id.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub helps: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub actions: BTreeMap<ActionStage, Vec<PanelAction>>,
}

impl Panel {
    pub fn new(class_name: impl Into<String>) -> Self {
        Panel {
            class_name: class_name.into(),
            qualified_class_name: None,
            jar: None,
            id: None,
            condition: None,
            os_constraints: Vec::new(),
            configuration: BTreeMap::new(),
            validator: None,
            helps: BTreeMap::new(),
            actions: BTreeMap::new(),
        }
    }

    /// Id if set, otherwise the class name.
    pub fn key(&self) -> &str {
        self.id.as_deref().unwrap_or(&self.class_name)
    }

    /// Actions registered for one stage, in declaration order.
    pub fn actions_at(&self, stage: ActionStage) -> &[PanelAction] {
        self.actions.get(&stage).map(Vec::as_slice).unwrap_or(&[])
    }
}
