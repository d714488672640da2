//! The compiled installation model and its hand-off to a packager.

use anyhow::Result;
use serde::Serialize;

use crate::core::info::{GuiPrefs, Info, InstallerKind, Packaging};
use crate::core::pack::Pack;
use crate::core::panel::Panel;
use crate::core::resource::{
    CustomData, InstallerRequirement, JarContent, LangPack, NativeLibrary, Resource,
};
use crate::core::rules::{Condition, ConditionRegistry, DynamicVariable, DynamicVariableRegistry};
use crate::util::diagnostic::Diagnostics;
use crate::util::fs::Scratch;
use crate::util::substitute::VariableTable;

/// Receives the compiled model, one call per entity.
pub trait PackagerSink {
    fn set_packaging(&mut self, packaging: &Packaging) -> Result<()>;
    fn set_info(&mut self, info: &Info) -> Result<()>;
    fn set_gui_prefs(&mut self, prefs: &GuiPrefs) -> Result<()>;
    fn add_lang_pack(&mut self, lang_pack: &LangPack) -> Result<()>;
    fn add_resource(&mut self, resource: &Resource) -> Result<()>;
    fn add_native_library(&mut self, native: &NativeLibrary) -> Result<()>;
    fn add_jar_content(&mut self, jar: &JarContent) -> Result<()>;
    fn add_custom_data(&mut self, data: &CustomData) -> Result<()>;
    fn add_panel(&mut self, panel: &Panel) -> Result<()>;
    fn add_pack(&mut self, pack: &Pack) -> Result<()>;
    fn add_variable(&mut self, name: &str, value: &str) -> Result<()>;
    fn add_condition(&mut self, condition: &Condition) -> Result<()>;
    fn add_dynamic_variable(&mut self, variable: &DynamicVariable) -> Result<()>;
    fn add_installer_requirement(&mut self, requirement: &InstallerRequirement) -> Result<()>;
}

/// A fully resolved and validated installation.
///
/// Transient files referenced by the model live in a scratch directory owned
/// by this value and are removed when it is dropped.
#[derive(Debug, Serialize)]
pub struct CompiledInstallation {
    pub kind: InstallerKind,
    pub packaging: Packaging,
    pub info: Info,
    pub gui_prefs: GuiPrefs,
    pub lang_packs: Vec<LangPack>,
    pub resources: Vec<Resource>,
    pub natives: Vec<NativeLibrary>,
    pub jars: Vec<JarContent>,
    pub custom_data: Vec<CustomData>,
    pub panels: Vec<Panel>,
    pub packs: Vec<Pack>,
    pub variables: VariableTable,
    pub conditions: ConditionRegistry,
    pub dynamic_variables: DynamicVariableRegistry,
    pub requirements: Vec<InstallerRequirement>,
    pub diagnostics: Diagnostics,
    #[serde(skip)]
    pub(crate) scratch: Scratch,
}

impl CompiledInstallation {
    /// Look up a pack by name.
    pub fn pack(&self, name: &str) -> Option<&Pack> {
        self.packs.iter().find(|p| p.name == name)
    }

    /// Look up a resource by id.
    pub fn resource(&self, id: &str) -> Option<&Resource> {
        self.resources.iter().find(|r| r.id == id)
    }

    /// Hand every entity to `sink`, in packaging order.
    pub fn deliver(&self, sink: &mut dyn PackagerSink) -> Result<()> {
        sink.set_packaging(&self.packaging)?;
        sink.set_info(&self.info)?;
        sink.set_gui_prefs(&self.gui_prefs)?;
        for lang_pack in &self.lang_packs {
            sink.add_lang_pack(lang_pack)?;
        }
        for resource in &self.resources {
            sink.add_resource(resource)?;
        }
        for native in &self.natives {
            sink.add_native_library(native)?;
        }
        for jar in &self.jars {
            sink.add_jar_content(jar)?;
        }
        for data in &self.custom_data {
            sink.add_custom_data(data)?;
        }
        for panel in &self.panels {
            sink.add_panel(panel)?;
        }
        for pack in &self.packs {
            sink.add_pack(pack)?;
        }
        for (name, value) in self.variables.iter() {
            sink.add_variable(name, value)?;
        }
        for condition in self.conditions.iter() {
            sink.add_condition(condition)?;
        }
        for (_, candidates) in self.dynamic_variables.iter() {
            for variable in candidates {
                sink.add_dynamic_variable(variable)?;
            }
        }
        for requirement in &self.requirements {
            sink.add_installer_requirement(requirement)?;
        }
        Ok(())
    }

    /// Serialize the model as pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
