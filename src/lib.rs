//! Packwright - an installer manifest compiler
//!
//! This crate reads an XML installation manifest, resolves every file,
//! resource and rule it declares, and produces a validated
//! [`CompiledInstallation`] ready to hand to a packager.

pub mod core;
pub mod hooks;
pub mod ops;
pub mod util;

/// Test utilities for Packwright unit tests.
///
/// This module is only available when compiling with `--cfg test` or
/// running tests. It provides on-disk project fixtures and a recording
/// packager sink.
#[cfg(test)]
pub mod test_support;

pub use core::{CompiledInstallation, InstallerKind, Pack, PackFile, PackagerSink};
pub use hooks::{CompilerHook, HookRegistry};
pub use ops::{compile, compile_with, CompileError, CompileOptions, ManifestSource};
pub use util::context::GlobalContext;
