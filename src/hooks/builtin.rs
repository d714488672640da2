//! Hooks shipped with the compiler.

use crate::core::pack::FileMetadata;
use crate::hooks::{CompilerHook, FileContext, HookError, HookState, Phase};
use crate::util::xml::{self, Element};

pub const ADDITIONAL_DATA: &str = "AdditionalData";
pub const PHASE_TRACE: &str = "PhaseTrace";

/// Copies `<additionaldata key=".." value=".."/>` children of a file
/// declaration into the file's metadata.
#[derive(Debug, Default)]
pub struct AdditionalDataHook;

impl AdditionalDataHook {
    pub fn boxed() -> Box<dyn CompilerHook> {
        Box::new(AdditionalDataHook)
    }
}

impl CompilerHook for AdditionalDataHook {
    fn name(&self) -> &str {
        ADDITIONAL_DATA
    }

    fn revise_metadata(
        &mut self,
        mut metadata: FileMetadata,
        file: FileContext<'_>,
    ) -> Result<FileMetadata, HookError> {
        for entry in xml::children_named(file.element, "additionaldata") {
            let key = xml::attr(entry, "key")
                .filter(|k| !k.is_empty())
                .ok_or_else(|| HookError::new("<additionaldata> requires attribute 'key'"))?;
            let value = xml::attr(entry, "value").unwrap_or_default();
            metadata.insert(key.to_string(), value.to_string());
        }
        Ok(metadata)
    }
}

/// Logs every phase transition at debug level.
#[derive(Debug, Default)]
pub struct PhaseTraceHook {
    depth: usize,
}

impl PhaseTraceHook {
    pub fn boxed() -> Box<dyn CompilerHook> {
        Box::new(PhaseTraceHook::default())
    }
}

impl CompilerHook for PhaseTraceHook {
    fn name(&self) -> &str {
        PHASE_TRACE
    }

    fn notify(
        &mut self,
        phase: Phase,
        state: HookState,
        document: &Element,
    ) -> Result<(), HookError> {
        match state {
            HookState::Begin => {
                tracing::debug!(
                    "{:indent$}begin {} <{}>",
                    "",
                    phase,
                    document.name,
                    indent = self.depth * 2
                );
                self.depth += 1;
            }
            HookState::End => {
                self.depth = self.depth.saturating_sub(1);
                tracing::debug!("{:indent$}end {}", "", phase, indent = self.depth * 2);
            }
        }
        Ok(())
    }
}
