//! Manifest documents: loading, validation and compile-time property substitution.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::ops::errors::CompileError;
use crate::ops::scope::SourceScope;
use crate::util::substitute::PropertyTable;
use crate::util::xml::{self, Element, XMLNode};

/// Required root element of every manifest.
pub const ROOT_ELEMENT: &str = "installation";

/// The only supported manifest format version.
pub const FORMAT_VERSION: &str = "1.0";

/// Entry holding the manifest inside a self-contained bundle.
pub const BUNDLED_MANIFEST: &str = "META-INF/installation.xml";

/// Where a root manifest comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManifestSource {
    File(PathBuf),
    Text(String),
}

/// A parsed and validated manifest document.
#[derive(Debug, Clone)]
pub struct Document {
    pub root: Element,
    pub path: Option<PathBuf>,
    pub scope: SourceScope,
}

impl Document {
    /// Load and validate a root manifest.
    pub fn load(source: &ManifestSource) -> Result<Document> {
        match source {
            ManifestSource::File(path) => Document::load_file(path),
            ManifestSource::Text(text) => {
                let root = xml::parse_str(text)?;
                Document::from_root(root, None)
            }
        }
    }

    /// Load and validate a manifest file.
    pub fn load_file(path: &Path) -> Result<Document> {
        let root = xml::parse_file(path)?;
        Document::from_root(root, Some(path.to_path_buf()))
    }

    /// Load the manifest packed inside a self-contained zip bundle.
    pub fn load_bundle(bundle: &Path) -> Result<Document> {
        let file = File::open(bundle)
            .with_context(|| format!("failed to open bundle {}", bundle.display()))?;
        let mut archive = zip::ZipArchive::new(file)
            .with_context(|| format!("{} is not a zip archive", bundle.display()))?;
        let mut entry = archive.by_name(BUNDLED_MANIFEST).with_context(|| {
            format!("{} has no {} entry", bundle.display(), BUNDLED_MANIFEST)
        })?;
        let mut text = String::new();
        entry
            .read_to_string(&mut text)
            .with_context(|| format!("failed to read {} from {}", BUNDLED_MANIFEST, bundle.display()))?;
        let root = xml::parse_reader(text.as_bytes(), &bundle.display().to_string())?;
        Document::from_root(root, Some(bundle.to_path_buf()))
    }

    fn from_root(root: Element, path: Option<PathBuf>) -> Result<Document> {
        let scope = SourceScope::new(path.clone());
        validate_root(&root, &scope)?;
        Ok(Document { root, path, scope })
    }

    pub fn file(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Replace `${name}` property tokens in every attribute and text node.
    ///
    /// The `<properties>` block is taken out of the tree for the pass and put
    /// back at its original position afterwards.
    pub fn substitute_properties(&mut self, properties: &PropertyTable) -> Result<()> {
        let index = xml::child_index(&self.root, "properties");
        let block = index.map(|i| self.root.children.remove(i));

        let result = substitute_element(&mut self.root, properties, &self.scope);

        if let (Some(index), Some(block)) = (index, block) {
            self.root.children.insert(index, block);
        }
        result.map_err(Into::into)
    }
}

fn validate_root(root: &Element, scope: &SourceScope) -> Result<(), CompileError> {
    if !root.name.eq_ignore_ascii_case(ROOT_ELEMENT) {
        return Err(scope.structural(
            root,
            format!(
                "this is not a manifest: root element is <{}>, expected <{}>",
                root.name, ROOT_ELEMENT
            ),
        ));
    }
    match xml::attr(root, "version") {
        Some(version) if version.trim().eq_ignore_ascii_case(FORMAT_VERSION) => Ok(()),
        Some(version) => Err(scope.structural(
            root,
            format!(
                "manifest version mismatch: found {}, expected {}",
                version, FORMAT_VERSION
            ),
        )),
        None => Err(scope.structural(
            root,
            format!("manifest version missing, expected {}", FORMAT_VERSION),
        )),
    }
}

fn substitute_element(
    element: &mut Element,
    properties: &PropertyTable,
    scope: &SourceScope,
) -> Result<(), CompileError> {
    let mut replaced = Vec::new();
    for (key, value) in element.attributes.iter() {
        let substituted = properties
            .substitute_properties(value)
            .map_err(|err| scope.undefined(element, err))?;
        if substituted != *value {
            replaced.push((key.clone(), substituted));
        }
    }
    for (key, value) in replaced {
        element.attributes.insert(key, value);
    }

    for index in 0..element.children.len() {
        let text = match &element.children[index] {
            XMLNode::Text(text) | XMLNode::CData(text) => Some(
                properties
                    .substitute_properties(text)
                    .map_err(|err| scope.undefined(element, err))?,
            ),
            _ => None,
        };
        match (&mut element.children[index], text) {
            (XMLNode::Text(slot), Some(text)) | (XMLNode::CData(slot), Some(text)) => {
                *slot = text
            }
            (XMLNode::Element(child), _) => substitute_element(child, properties, scope)?,
            _ => {}
        }
    }
    Ok(())
}
