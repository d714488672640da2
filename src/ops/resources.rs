//! Resource registration and localized string bundle merging.
//!
//! A `<res>` declaration runs through up to three transforms, in order:
//! transcoding to UTF-8, XML canonicalization, and install-time variable
//! substitution. Each transform writes a new scratch file; skipped
//! transforms pass the previous location through unchanged.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Result;
use encoding_rs::Encoding;

use crate::core::resource::Resource;
use crate::ops::context::CompilerContext;
use crate::ops::document::Document;
use crate::ops::scope::SourceScope;
use crate::util::fs::{self, Scratch};
use crate::util::locator::ResourceScope;
use crate::util::substitute::SubstitutionType;
use crate::util::xml::{self, Element, XMLNode};

/// Resources whose id starts with this prefix are localized string bundles.
pub const STRING_BUNDLE_PREFIX: &str = "packsLang.xml";

/// Entry element of a string bundle.
const STRING_ENTRY: &str = "str";

/// Registered resources, plus string bundles awaiting merge.
#[derive(Debug, Default)]
pub struct ResourceRegistry {
    resources: Vec<Resource>,
    bundles: BTreeMap<String, Vec<Resource>>,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        ResourceRegistry::default()
    }

    /// Register a resource.
    ///
    /// String bundles are held back for [`merge_string_bundles`](Self::merge_string_bundles).
    /// Any other resource replaces an earlier one with the same id in place.
    pub fn register(&mut self, resource: Resource) {
        if resource.id.starts_with(STRING_BUNDLE_PREFIX) {
            self.bundles
                .entry(resource.id.clone())
                .or_default()
                .push(resource);
            return;
        }
        self.insert(resource);
    }

    fn insert(&mut self, resource: Resource) {
        match self.resources.iter_mut().find(|r| r.id == resource.id) {
            Some(existing) => {
                tracing::debug!("resource `{}` redefined", resource.id);
                *existing = resource;
            }
            None => self.resources.push(resource),
        }
    }

    pub fn get(&self, id: &str) -> Option<&Resource> {
        self.resources.iter().find(|r| r.id == id)
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Number of string bundle sources waiting for merge under `id`.
    pub fn pending_bundle_sources(&self, id: &str) -> usize {
        self.bundles.get(id).map_or(0, Vec::len)
    }

    /// Register one resource per string bundle id.
    ///
    /// A single source is registered as is. With several sources the first
    /// one is the base document and the `<str>` entries of every later one
    /// are appended to it.
    pub fn merge_string_bundles(&mut self, scratch: &Scratch) -> Result<()> {
        let bundles = std::mem::take(&mut self.bundles);
        for (id, mut sources) in bundles {
            if sources.len() == 1 {
                self.insert(sources.remove(0));
                continue;
            }
            let Some((first, rest)) = sources.split_first() else {
                continue;
            };

            let mut merged = xml::parse_file(&first.location)?;
            for other in rest {
                let document = xml::parse_file(&other.location)?;
                for entry in xml::children_named(&document, STRING_ENTRY) {
                    merged.children.push(XMLNode::Element(entry.clone()));
                }
            }
            let text = xml::to_string(&merged)?;
            let location = scratch.file("strings-", ".xml", text.as_bytes())?;
            tracing::debug!("merged {} sources into string bundle `{}`", sources.len(), id);

            self.insert(Resource {
                id,
                location,
                origin: first.origin.clone(),
                transcoded: sources.iter().any(|s| s.transcoded),
                canonicalized: true,
                substituted: sources.iter().any(|s| s.substituted),
            });
        }
        Ok(())
    }

    pub fn into_resources(self) -> Vec<Resource> {
        self.resources
    }
}

/// Register every `<res>` of the document's `<resources>` block.
pub fn add_resources(ctx: &mut CompilerContext, doc: &Document) -> Result<()> {
    let Some(block) = xml::first_child(&doc.root, "resources") else {
        return Ok(());
    };
    for res in xml::children_named(block, "res") {
        add_resource(ctx, &doc.scope, res)?;
    }
    Ok(())
}

fn add_resource(ctx: &mut CompilerContext, scope: &SourceScope, res: &Element) -> Result<()> {
    let id = scope.require_attribute(res, "id")?;
    let src = scope.require_attribute(res, "src")?;
    let origin = ctx
        .locator
        .locate(ResourceScope::Project, src)
        .map_err(|_| scope.not_found(res, "resource", src))?;

    let mut resource = Resource::plain(id, origin);
    let suffix = suffix_of(&resource.origin);

    if let Some(label) = xml::attr(res, "encoding").filter(|e| !e.is_empty()) {
        let encoding = Encoding::for_label(label.as_bytes()).ok_or_else(|| {
            scope.invalid_value(res, "encoding", label, "a WHATWG encoding label")
        })?;
        let bytes = fs::read(&resource.location)?;
        let (text, _, had_errors) = encoding.decode(&bytes);
        if had_errors {
            ctx.warn(
                scope.file(),
                format!("Resource {} is not valid {}", src, encoding.name()),
            );
        }
        resource.location = ctx.scratch.file("res-", &suffix, text.as_bytes())?;
        resource.transcoded = true;
    }

    if scope.yes_no(res, "parsexml", false) {
        let document = xml::parse_file(&resource.location)?;
        let text = xml::to_string(&document)?;
        resource.location = ctx.scratch.file("res-", &suffix, text.as_bytes())?;
        resource.canonicalized = true;
    }

    if scope.yes_no(res, "parse", false) {
        if ctx.variables.is_empty() {
            ctx.warn(
                scope.file(),
                format!("No variables defined. {} not parsed.", src),
            );
        } else {
            let kind = SubstitutionType::lookup(xml::attr(res, "type"));
            let text = fs::read_to_string(&resource.location)?;
            let text = ctx
                .variables
                .substitute_variables(&text, kind)
                .map_err(|err| scope.undefined(res, err))?;
            resource.location = ctx.scratch.file("res-", &suffix, text.as_bytes())?;
            resource.substituted = true;
        }
    }

    tracing::debug!("resource `{}` -> {}", id, resource.location.display());
    ctx.resources.register(resource);
    Ok(())
}

/// Register a built-in resource from the installation home.
pub fn add_builtin_resource(
    ctx: &mut CompilerContext,
    scope: &SourceScope,
    element: &Element,
    id: &str,
    path: &str,
) -> Result<()> {
    let location = ctx
        .locator
        .locate(ResourceScope::Builtin, path)
        .map_err(|_| scope.not_found(element, "built-in resource", path))?;
    ctx.resources.register(Resource::plain(id, location));
    Ok(())
}

fn suffix_of(path: &Path) -> String {
    path.extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default()
}

/// Register a project file as a resource without transforms.
pub fn add_project_resource(
    ctx: &mut CompilerContext,
    scope: &SourceScope,
    element: &Element,
    id: &str,
    src: &str,
) -> Result<PathBuf> {
    let location = ctx
        .locator
        .locate(ResourceScope::Project, src)
        .map_err(|_| scope.not_found(element, "resource", src))?;
    ctx.resources.register(Resource::plain(id, location.clone()));
    Ok(location)
}

/// Merge string bundles once every document has registered its resources.
pub fn merge_string_bundles(ctx: &mut CompilerContext, _doc: &Document) -> Result<()> {
    ctx.resources.merge_string_bundles(&ctx.scratch)
}
