//! Shared utilities

pub mod archive;
pub mod config;
pub mod context;
pub mod diagnostic;
pub mod fileset;
pub mod fs;
pub mod locator;
pub mod substitute;
pub mod xml;

pub use config::Config;
pub use context::GlobalContext;
pub use diagnostic::{Diagnostic, Diagnostics};
