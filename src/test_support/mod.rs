//! Test utilities for packwright unit tests.
//!
//! Fixtures write a project directory and an installation home to disk;
//! [`RecordingSink`] captures what a compiled installation hands to a
//! packager.
//!
//! # Example
//!
//! ```rust,ignore
//! use packwright::test_support::{manifests, ProjectFixture};
//!
//! #[test]
//! fn test_example() {
//!     let tmp = tempfile::TempDir::new().unwrap();
//!     let project = ProjectFixture::new()
//!         .with_manifest(manifests::installation("", manifests::pack("core", "")))
//!         .write_to(tmp.path())
//!         .unwrap();
//!     let installation = project.compile().unwrap();
//! }
//! ```

pub mod fixtures;

use anyhow::{bail, Result};

use crate::core::info::{GuiPrefs, Info, Packaging};
use crate::core::installation::PackagerSink;
use crate::core::pack::Pack;
use crate::core::panel::Panel;
use crate::core::resource::{
    CustomData, InstallerRequirement, JarContent, LangPack, NativeLibrary, Resource,
};
use crate::core::rules::{Condition, DynamicVariable};

// Re-export fixtures for convenience
pub use fixtures::*;

/// Packager sink that records one line per call.
///
/// Optionally fails on the first call whose line starts with a prefix.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    pub calls: Vec<String>,
    fail_on: Option<String>,
}

impl RecordingSink {
    pub fn new() -> Self {
        RecordingSink::default()
    }

    /// Fail when a call starting with `prefix` is recorded.
    pub fn failing_on(prefix: impl Into<String>) -> Self {
        RecordingSink {
            calls: Vec::new(),
            fail_on: Some(prefix.into()),
        }
    }

    /// Recorded calls of one kind, e.g. `"pack"`.
    pub fn calls_of(&self, kind: &str) -> Vec<&str> {
        self.calls
            .iter()
            .filter_map(|call| call.strip_prefix(kind)?.strip_prefix(' '))
            .collect()
    }

    /// Call kinds in the order they first appeared.
    pub fn kinds(&self) -> Vec<&str> {
        let mut kinds: Vec<&str> = Vec::new();
        for call in &self.calls {
            let kind = call.split(' ').next().unwrap_or_default();
            if !kinds.contains(&kind) {
                kinds.push(kind);
            }
        }
        kinds
    }

    fn record(&mut self, call: String) -> Result<()> {
        if let Some(prefix) = &self.fail_on {
            if call.starts_with(prefix.as_str()) {
                bail!("sink rejected `{}`", call);
            }
        }
        self.calls.push(call);
        Ok(())
    }
}

impl PackagerSink for RecordingSink {
    fn set_packaging(&mut self, packaging: &Packaging) -> Result<()> {
        self.record(format!("packaging {}", packaging.packager_class))
    }

    fn set_info(&mut self, info: &Info) -> Result<()> {
        self.record(format!("info {}", info.app_name))
    }

    fn set_gui_prefs(&mut self, prefs: &GuiPrefs) -> Result<()> {
        self.record(format!("guiprefs {}x{}", prefs.width, prefs.height))
    }

    fn add_lang_pack(&mut self, lang_pack: &LangPack) -> Result<()> {
        self.record(format!("langpack {}", lang_pack.iso3))
    }

    fn add_resource(&mut self, resource: &Resource) -> Result<()> {
        self.record(format!("resource {}", resource.id))
    }

    fn add_native_library(&mut self, native: &NativeLibrary) -> Result<()> {
        self.record(format!("native {}", native.name))
    }

    fn add_jar_content(&mut self, jar: &JarContent) -> Result<()> {
        self.record(format!("jar {}", jar.location.display()))
    }

    fn add_custom_data(&mut self, data: &CustomData) -> Result<()> {
        self.record(format!("customdata {}", data.names.join(",")))
    }

    fn add_panel(&mut self, panel: &Panel) -> Result<()> {
        self.record(format!("panel {}", panel.key()))
    }

    fn add_pack(&mut self, pack: &Pack) -> Result<()> {
        self.record(format!("pack {}", pack.name))
    }

    fn add_variable(&mut self, name: &str, value: &str) -> Result<()> {
        self.record(format!("variable {}={}", name, value))
    }

    fn add_condition(&mut self, condition: &Condition) -> Result<()> {
        self.record(format!("condition {}", condition.id))
    }

    fn add_dynamic_variable(&mut self, variable: &DynamicVariable) -> Result<()> {
        self.record(format!("dynamicvariable {}={}", variable.name, variable.value))
    }

    fn add_installer_requirement(&mut self, requirement: &InstallerRequirement) -> Result<()> {
        self.record(format!("requirement {}", requirement.condition))
    }
}
