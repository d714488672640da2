//! Compilation error types and diagnostics.

use std::path::{Path, PathBuf};

use miette::Diagnostic as MietteDiagnostic;
use thiserror::Error;

use crate::util::diagnostic::{suggestions, Diagnostic};

/// A fatal problem that aborts compilation.
///
/// Every variant that originates from a manifest element carries the
/// rendered element header and the document it came from.
#[derive(Debug, Error, MietteDiagnostic)]
pub enum CompileError {
    #[error("{element}: {message}")]
    #[diagnostic(code(packwright::manifest::structure))]
    Structural {
        file: Option<PathBuf>,
        element: String,
        message: String,
    },

    #[error("{element}: invalid value `{value}` for `{attribute}`")]
    #[diagnostic(
        code(packwright::manifest::invalid_value),
        help("expected one of: {expected}")
    )]
    InvalidValue {
        file: Option<PathBuf>,
        element: String,
        attribute: String,
        value: String,
        expected: String,
    },

    #[error("{element}: {what} not found: {path}")]
    #[diagnostic(code(packwright::resource::not_found))]
    NotFound {
        file: Option<PathBuf>,
        element: String,
        what: String,
        path: String,
    },

    #[error("pack `{pack}` depends on unknown pack `{dependency}`")]
    #[diagnostic(code(packwright::graph::unresolved_dependency))]
    UnresolvedDependency { pack: String, dependency: String },

    #[error("required pack `{pack}` cannot be in exclude group `{group}`")]
    #[diagnostic(code(packwright::pack::required_in_exclude_group))]
    RequiredInExcludeGroup {
        file: Option<PathBuf>,
        pack: String,
        group: String,
    },

    #[error("dependency cycle between packs: {}", packs.join(" -> "))]
    #[diagnostic(code(packwright::graph::cycle))]
    DependencyCycle { packs: Vec<String> },

    #[error("document {} includes itself", document.display())]
    #[diagnostic(code(packwright::include::cycle))]
    InclusionCycle {
        document: PathBuf,
        chain: Vec<PathBuf>,
    },

    #[error("{element}: undefined {table} `{name}`")]
    #[diagnostic(code(packwright::substitute::undefined))]
    UndefinedToken {
        file: Option<PathBuf>,
        element: String,
        table: String,
        name: String,
    },

    #[error("hook `{hook}` failed on {element}: {message}")]
    #[diagnostic(code(packwright::hook::failed))]
    Hook {
        file: Option<PathBuf>,
        hook: String,
        element: String,
        message: String,
    },
}

fn with_file(diag: Diagnostic, file: &Option<PathBuf>) -> Diagnostic {
    diag.with_optional_location(file.clone())
}

fn show(path: &Path) -> String {
    path.display().to_string()
}

impl CompileError {
    /// The manifest file the error originated from, if known.
    pub fn file(&self) -> Option<&Path> {
        match self {
            CompileError::Structural { file, .. }
            | CompileError::InvalidValue { file, .. }
            | CompileError::NotFound { file, .. }
            | CompileError::RequiredInExcludeGroup { file, .. }
            | CompileError::UndefinedToken { file, .. }
            | CompileError::Hook { file, .. } => file.as_deref(),
            CompileError::InclusionCycle { document, .. } => Some(document),
            CompileError::UnresolvedDependency { .. } | CompileError::DependencyCycle { .. } => {
                None
            }
        }
    }

    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            CompileError::Structural {
                file,
                element,
                message,
            } => with_file(
                Diagnostic::error(message.clone()).with_context(format!("in {}", element)),
                file,
            ),

            CompileError::InvalidValue {
                file,
                element,
                attribute,
                value,
                expected,
            } => with_file(
                Diagnostic::error(format!("invalid value `{}` for `{}`", value, attribute))
                    .with_context(format!("in {}", element))
                    .with_suggestion(format!("Use one of: {}", expected)),
                file,
            ),

            CompileError::NotFound {
                file,
                element,
                what,
                path,
            } => with_file(
                Diagnostic::error(format!("{} not found: {}", what, path))
                    .with_context(format!("in {}", element))
                    .with_suggestion(suggestions::MISSING_FILE),
                file,
            ),

            CompileError::UnresolvedDependency { pack, dependency } => Diagnostic::error(
                format!("pack `{}` depends on unknown pack `{}`", pack, dependency),
            )
            .with_suggestion(suggestions::UNKNOWN_PACK),

            CompileError::RequiredInExcludeGroup { file, pack, group } => with_file(
                Diagnostic::error(format!(
                    "required pack `{}` cannot be in exclude group `{}`",
                    pack, group
                ))
                .with_suggestion("Set required=\"no\"")
                .with_suggestion("Remove the excludeGroup attribute"),
                file,
            ),

            CompileError::DependencyCycle { packs } => {
                Diagnostic::error("dependency cycle between packs")
                    .with_context(format!("cycle: {}", packs.join(" -> ")))
                    .with_suggestion("Remove one of the <depends> entries")
            }

            CompileError::InclusionCycle { document, chain } => {
                let chain: Vec<_> = chain.iter().map(|p| show(p)).collect();
                Diagnostic::error(format!("document {} includes itself", show(document)))
                    .with_context(format!("inclusion chain: {}", chain.join(" -> ")))
                    .with_location(document.clone())
            }

            CompileError::UndefinedToken {
                file,
                element,
                table,
                name,
            } => with_file(
                Diagnostic::error(format!("undefined {} `{}`", table, name))
                    .with_context(format!("in {}", element))
                    .with_suggestion(suggestions::UNDEFINED_TOKEN),
                file,
            ),

            CompileError::Hook {
                file,
                hook,
                element,
                message,
            } => with_file(
                Diagnostic::error(format!("hook `{}` failed: {}", hook, message))
                    .with_context(format!("in {}", element)),
                file,
            ),
        }
    }
}

/// Find a `CompileError` anywhere in an error chain.
pub fn find_compile_error(err: &anyhow::Error) -> Option<&CompileError> {
    err.chain().find_map(|cause| cause.downcast_ref::<CompileError>())
}
