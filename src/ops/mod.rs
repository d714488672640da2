//! High-level operations.
//!
//! This module contains the manifest compiler: document loading, the
//! per-section readers run as compilation phases, and whole-model
//! validation.

pub mod compile;
pub mod context;
pub mod document;
pub mod errors;
pub mod info;
pub mod libraries;
pub mod packs;
pub mod panels;
pub mod properties;
pub mod resources;
pub mod rules;
pub mod scope;
pub mod validate;

pub use compile::{compile, compile_with, manifest_base_dir, CompileOptions};
pub use context::CompilerContext;
pub use document::{Document, ManifestSource};
pub use errors::{find_compile_error, CompileError};
pub use properties::parse_java_properties;
pub use resources::ResourceRegistry;
