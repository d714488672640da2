//! Compiler hooks.
//!
//! A hook is told when each compilation phase begins and ends, and may
//! contribute metadata to every file added to a pack. Hooks are selected by
//! name from a static [`HookRegistry`] and run in declaration order by a
//! [`HookDispatcher`].

pub mod builtin;

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use serde::Serialize;
use thiserror::Error;

use crate::core::pack::FileMetadata;
use crate::util::xml::Element;

/// A named compilation phase, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Properties,
    Packaging,
    Listeners,
    Variables,
    DynamicVariables,
    Conditions,
    Info,
    GuiPrefs,
    LangPacks,
    Resources,
    NativeLibraries,
    Jars,
    Panels,
    Packs,
    InstallerRequirements,
    StringBundles,
}

impl Phase {
    pub fn name(self) -> &'static str {
        match self {
            Phase::Packaging => "packaging",
            Phase::Listeners => "listeners",
            Phase::Properties => "properties",
            Phase::Variables => "variables",
            Phase::DynamicVariables => "dynamic_variables",
            Phase::Conditions => "conditions",
            Phase::Info => "info",
            Phase::GuiPrefs => "gui_prefs",
            Phase::LangPacks => "lang_packs",
            Phase::Resources => "resources",
            Phase::NativeLibraries => "native_libraries",
            Phase::Jars => "jars",
            Phase::Panels => "panels",
            Phase::Packs => "packs",
            Phase::InstallerRequirements => "installer_requirements",
            Phase::StringBundles => "string_bundles",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookState {
    Begin,
    End,
}

/// A hook refused to continue.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct HookError(pub String);

impl HookError {
    pub fn new(message: impl Into<String>) -> Self {
        HookError(message.into())
    }
}

/// The file a hook is asked to describe.
#[derive(Debug, Clone, Copy)]
pub struct FileContext<'a> {
    /// The `<file>`, `<singlefile>` or `<fileset>` declaration.
    pub element: &'a Element,
    pub source: &'a Path,
    pub target: &'a str,
}

/// A compile-time extension.
pub trait CompilerHook {
    /// Name used in diagnostics.
    fn name(&self) -> &str;

    /// Called when a phase begins and ends.
    fn notify(
        &mut self,
        _phase: Phase,
        _state: HookState,
        _document: &Element,
    ) -> Result<(), HookError> {
        Ok(())
    }

    /// Revise the metadata accumulated for one file so far.
    fn revise_metadata(
        &mut self,
        metadata: FileMetadata,
        _file: FileContext<'_>,
    ) -> Result<FileMetadata, HookError> {
        Ok(metadata)
    }
}

/// A hook failure together with the hook that reported it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookFailure {
    pub hook: String,
    pub error: HookError,
}

/// Runs registered hooks in order.
#[derive(Default)]
pub struct HookDispatcher {
    hooks: Vec<Box<dyn CompilerHook>>,
}

impl HookDispatcher {
    pub fn new() -> Self {
        HookDispatcher { hooks: Vec::new() }
    }

    pub fn register(&mut self, hook: Box<dyn CompilerHook>) {
        tracing::debug!("registered compiler hook `{}`", hook.name());
        self.hooks.push(hook);
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Notify every hook; the first failure stops the dispatch.
    pub fn notify(
        &mut self,
        phase: Phase,
        state: HookState,
        document: &Element,
    ) -> Result<(), HookFailure> {
        for hook in &mut self.hooks {
            hook.notify(phase, state, document)
                .map_err(|error| HookFailure {
                    hook: hook.name().to_string(),
                    error,
                })?;
        }
        Ok(())
    }

    /// Fold the metadata of one file through every hook, in order.
    pub fn revise_metadata(&mut self, file: FileContext<'_>) -> Result<FileMetadata, HookFailure> {
        self.hooks
            .iter_mut()
            .try_fold(FileMetadata::new(), |metadata, hook| {
                hook.revise_metadata(metadata, file)
                    .map_err(|error| HookFailure {
                        hook: hook.name().to_string(),
                        error,
                    })
            })
    }
}

impl fmt::Debug for HookDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<_> = self.hooks.iter().map(|h| h.name()).collect();
        f.debug_struct("HookDispatcher").field("hooks", &names).finish()
    }
}

/// Constructs a hook instance.
pub type HookFactory = fn() -> Box<dyn CompilerHook>;

/// Hooks that manifests may name in `<listener compiler="..">`.
pub struct HookRegistry {
    factories: BTreeMap<String, HookFactory>,
}

impl HookRegistry {
    /// Create a registry with all built-in hooks.
    pub fn new() -> Self {
        let mut registry = HookRegistry {
            factories: BTreeMap::new(),
        };
        registry.register(builtin::ADDITIONAL_DATA, builtin::AdditionalDataHook::boxed);
        registry.register(builtin::PHASE_TRACE, builtin::PhaseTraceHook::boxed);
        registry
    }

    /// Create a registry with no hooks.
    pub fn empty() -> Self {
        HookRegistry {
            factories: BTreeMap::new(),
        }
    }

    pub fn register(&mut self, name: impl Into<String>, factory: HookFactory) {
        self.factories.insert(name.into(), factory);
    }

    /// Instantiate a hook by name.
    pub fn create(&self, name: &str) -> Option<Box<dyn CompilerHook>> {
        self.factories.get(name).map(|factory| factory())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }
}

impl Default for HookRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.factories.keys()).finish()
    }
}
