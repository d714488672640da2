//! State shared by every compilation phase.

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::core::info::{GuiPrefs, Info, InstallerKind, Packaging};
use crate::core::installation::CompiledInstallation;
use crate::core::pack::Pack;
use crate::core::panel::Panel;
use crate::core::resource::{CustomData, InstallerRequirement, JarContent, LangPack, NativeLibrary};
use crate::core::rules::{ConditionFactory, ConditionRegistry, DynamicVariableRegistry};
use crate::hooks::{HookDispatcher, HookRegistry, HookState, Phase};
use crate::ops::compile::CompileOptions;
use crate::ops::document::Document;
use crate::ops::resources::ResourceRegistry;
use crate::util::diagnostic::{Diagnostic, Diagnostics};
use crate::util::fs::Scratch;
use crate::util::locator::ResourceLocator;
use crate::util::substitute::{PropertyTable, VariableTable};

/// Mutable state of one compilation run.
///
/// Created by [`compile`](crate::ops::compile) and consumed into a
/// [`CompiledInstallation`] once every phase has run.
pub struct CompilerContext<'a> {
    pub kind: InstallerKind,
    pub locator: ResourceLocator,
    pub properties: PropertyTable,
    pub variables: VariableTable,
    pub conditions: ConditionRegistry,
    pub dynamic_variables: DynamicVariableRegistry,
    pub resources: ResourceRegistry,
    pub hooks: HookDispatcher,
    pub hook_registry: &'a HookRegistry,
    pub condition_factory: &'a dyn ConditionFactory,
    pub diagnostics: Diagnostics,
    pub scratch: Scratch,
    /// Documents currently being expanded, outermost first.
    pub include_chain: Vec<PathBuf>,

    pub packaging: Packaging,
    pub info: Info,
    pub gui_prefs: GuiPrefs,
    pub lang_packs: Vec<LangPack>,
    pub natives: Vec<NativeLibrary>,
    pub jars: Vec<JarContent>,
    pub custom_data: Vec<CustomData>,
    pub panels: Vec<Panel>,
    pub packs: Vec<Pack>,
    pub requirements: Vec<InstallerRequirement>,
}

impl<'a> CompilerContext<'a> {
    pub fn new(
        options: &CompileOptions,
        hook_registry: &'a HookRegistry,
        condition_factory: &'a dyn ConditionFactory,
    ) -> Result<Self> {
        Ok(CompilerContext {
            kind: options.kind,
            locator: ResourceLocator::new(options.base_dir.clone(), options.search_path()),
            properties: PropertyTable::new(options.property_policy),
            variables: VariableTable::new(options.variable_policy),
            conditions: ConditionRegistry::new(),
            dynamic_variables: DynamicVariableRegistry::new(),
            resources: ResourceRegistry::new(),
            hooks: HookDispatcher::new(),
            hook_registry,
            condition_factory,
            diagnostics: Diagnostics::new(),
            scratch: Scratch::new()?,
            include_chain: Vec::new(),
            packaging: Packaging::default(),
            info: Info::default(),
            gui_prefs: GuiPrefs::default(),
            lang_packs: Vec::new(),
            natives: Vec::new(),
            jars: Vec::new(),
            custom_data: Vec::new(),
            panels: Vec::new(),
            packs: Vec::new(),
            requirements: Vec::new(),
        })
    }

    pub fn base_dir(&self) -> &Path {
        self.locator.base_dir()
    }

    /// Record a warning attributed to a document.
    pub fn warn(&mut self, file: Option<&Path>, message: impl Into<String>) {
        let diagnostic =
            Diagnostic::warning(message).with_optional_location(file.map(Path::to_path_buf));
        self.diagnostics.warn(diagnostic);
    }

    /// Tell every hook that `phase` changed state.
    pub fn notify(&mut self, phase: Phase, state: HookState, document: &Document) -> Result<()> {
        self.hooks
            .notify(phase, state, &document.root)
            .map_err(|failure| {
                document
                    .scope
                    .hook_failed(&document.root, &failure.hook, failure.error.0)
            })?;
        Ok(())
    }

    /// Run `body` as `phase`, bracketed by hook notifications.
    pub fn phase<F>(&mut self, phase: Phase, document: &Document, body: F) -> Result<()>
    where
        F: FnOnce(&mut Self, &Document) -> Result<()>,
    {
        tracing::debug!("phase {}", phase);
        self.notify(phase, HookState::Begin, document)?;
        body(self, document)?;
        self.notify(phase, HookState::End, document)
    }

    pub fn into_installation(self) -> CompiledInstallation {
        CompiledInstallation {
            kind: self.kind,
            packaging: self.packaging,
            info: self.info,
            gui_prefs: self.gui_prefs,
            lang_packs: self.lang_packs,
            resources: self.resources.into_resources(),
            natives: self.natives,
            jars: self.jars,
            custom_data: self.custom_data,
            panels: self.panels,
            packs: self.packs,
            variables: self.variables,
            conditions: self.conditions,
            dynamic_variables: self.dynamic_variables,
            requirements: self.requirements,
            diagnostics: self.diagnostics,
            scratch: self.scratch,
        }
    }
}
