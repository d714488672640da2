//! Test fixtures for common compile scenarios.
//!
//! This module provides on-disk project and home layouts plus manifest
//! templates for the compile tests.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::core::installation::CompiledInstallation;
use crate::ops::compile::{compile, CompileOptions};
use crate::ops::document::ManifestSource;

/// Manifest file name inside a written project.
pub const MANIFEST_NAME: &str = "install.xml";

/// Fixture for a project directory and its installation home.
#[derive(Debug, Clone)]
pub struct ProjectFixture {
    /// Root manifest content.
    pub manifest: String,
    /// Project files (path relative to project root -> content).
    pub files: BTreeMap<PathBuf, Vec<u8>>,
    /// Empty directories relative to the project root.
    pub dirs: Vec<PathBuf>,
    /// Built-in resources (path relative to the home -> content).
    pub home_files: BTreeMap<PathBuf, Vec<u8>>,
}

impl ProjectFixture {
    /// A project whose home carries the English language pack and the
    /// uninstaller runtime.
    pub fn new() -> Self {
        ProjectFixture::bare()
            .with_home_file(
                "bin/langpacks/installer/eng.xml",
                r#"<langpack><str id="installer.title" txt="Installer"/></langpack>"#,
            )
            .with_home_file("bin/langpacks/flags/eng.gif", "GIF89a")
            .with_home_file("lib/uninstaller.jar", "PK")
    }

    /// A project with an empty home.
    pub fn bare() -> Self {
        ProjectFixture {
            manifest: String::new(),
            files: BTreeMap::new(),
            dirs: Vec::new(),
            home_files: BTreeMap::new(),
        }
    }

    /// Set the manifest content.
    pub fn with_manifest(mut self, manifest: impl Into<String>) -> Self {
        self.manifest = manifest.into();
        self
    }

    /// Add a project file.
    pub fn with_file(mut self, path: impl Into<PathBuf>, content: impl AsRef<[u8]>) -> Self {
        self.files.insert(path.into(), content.as_ref().to_vec());
        self
    }

    /// Add an empty project directory.
    pub fn with_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.dirs.push(path.into());
        self
    }

    /// Add a built-in resource to the home.
    pub fn with_home_file(mut self, path: impl Into<PathBuf>, content: impl AsRef<[u8]>) -> Self {
        self.home_files.insert(path.into(), content.as_ref().to_vec());
        self
    }

    /// Write this fixture below `base_path` as `project/` and `home/`.
    pub fn write_to(&self, base_path: &Path) -> std::io::Result<WrittenProject> {
        let root = base_path.join("project");
        let home = base_path.join("home");
        std::fs::create_dir_all(&root)?;
        std::fs::create_dir_all(&home)?;

        let manifest = root.join(MANIFEST_NAME);
        std::fs::write(&manifest, &self.manifest)?;

        for (rel_path, content) in &self.files {
            write_file(&root.join(rel_path), content)?;
        }
        for dir in &self.dirs {
            std::fs::create_dir_all(root.join(dir))?;
        }
        for (rel_path, content) in &self.home_files {
            write_file(&home.join(rel_path), content)?;
        }

        Ok(WrittenProject {
            root,
            home,
            manifest,
        })
    }
}

impl Default for ProjectFixture {
    fn default() -> Self {
        ProjectFixture::new()
    }
}

fn write_file(path: &Path, content: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, content)
}

/// A fixture written to disk.
#[derive(Debug, Clone)]
pub struct WrittenProject {
    pub root: PathBuf,
    pub home: PathBuf,
    pub manifest: PathBuf,
}

impl WrittenProject {
    /// A path inside the project.
    pub fn path(&self, rel_path: impl AsRef<Path>) -> PathBuf {
        self.root.join(rel_path)
    }

    pub fn options(&self) -> CompileOptions {
        CompileOptions::new(&self.root).with_home(&self.home)
    }

    pub fn source(&self) -> ManifestSource {
        ManifestSource::File(self.manifest.clone())
    }

    /// Compile the root manifest with default options.
    pub fn compile(&self) -> Result<CompiledInstallation> {
        compile(&self.source(), &self.options())
    }
}

/// Common manifest templates.
pub mod manifests {
    /// A root manifest with info, locale and one panel, plus `sections`
    /// before the `<packs>` block.
    pub fn installation(sections: &str, packs: impl AsRef<str>) -> String {
        format!(
            r#"<installation version="1.0">
  <info>
    <appname>Demo</appname>
    <appversion>1.0</appversion>
  </info>
  <locale><langpack iso3="eng"/></locale>
  <panels><panel classname="HelloPanel" jar=""/></panels>
  {sections}
  <packs>
    {packs}
  </packs>
</installation>
"#,
            sections = sections,
            packs = packs.as_ref()
        )
    }

    /// An optional pack with a description and `body`.
    pub fn pack(name: &str, body: &str) -> String {
        format!(
            r#"<pack name="{name}" required="no"><description>{name} pack</description>{body}</pack>"#
        )
    }

    /// An included manifest carrying only packs.
    pub fn included(packs: impl AsRef<str>) -> String {
        format!(
            r#"<installation version="1.0"><packs>{}</packs></installation>"#,
            packs.as_ref()
        )
    }

    /// A string bundle with one entry per id.
    pub fn string_bundle(ids: &[&str]) -> String {
        let entries: String = ids
            .iter()
            .map(|id| format!(r#"<str id="{id}" txt="{id} text"/>"#))
            .collect();
        format!("<langpack>{}</langpack>", entries)
    }
}
