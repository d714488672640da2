//! Core data structures for Packwright.
//!
//! This module contains the resolved installation model:
//! - Packs and their files, executables and parsables
//! - Panels, resources, language packs and libraries
//! - Conditions and dynamic variables
//! - The compiled installation handed to a packager

pub mod info;
pub mod installation;
pub mod os;
pub mod pack;
pub mod panel;
pub mod resource;
pub mod rules;

pub use info::{GuiPrefs, Info, InstallerKind, Packaging};
pub use installation::{CompiledInstallation, PackagerSink};
pub use os::OsConstraint;
pub use pack::{Blockable, OverrideType, Pack, PackFile};
pub use panel::{ActionStage, Panel};
pub use resource::{CustomData, CustomDataKind, InstallerRequirement, Resource};
pub use rules::{Condition, ConditionFactory, DynamicVariable};
