//! Listeners, native libraries and jars staged alongside the installer.

use std::path::PathBuf;

use anyhow::Result;

use crate::core::os::OsConstraint;
use crate::core::resource::{CustomData, CustomDataKind, JarContent, LibraryStage, NativeLibrary};
use crate::ops::context::CompilerContext;
use crate::ops::document::Document;
use crate::ops::resources::add_builtin_resource;
use crate::ops::scope::SourceScope;
use crate::util::archive;
use crate::util::locator::ResourceScope;
use crate::util::xml::{self, Element};

/// Resource id of the uninstaller extension runtime.
pub const UNINSTALLER_EXT_RESOURCE: &str = "installer.uninstaller-ext";

const UNINSTALLER_EXT_JAR: &str = "lib/uninstaller-ext.jar";

/// Register `<listeners>`: compiler hooks plus installer and uninstaller listeners.
pub fn add_listeners(ctx: &mut CompilerContext, doc: &Document) -> Result<()> {
    let Some(block) = xml::first_child(&doc.root, "listeners") else {
        return Ok(());
    };
    let scope = &doc.scope;

    for listener in xml::children_named(block, "listener") {
        let os_constraints = OsConstraint::from_element(listener);

        if let Some(name) = non_empty(listener, "compiler") {
            let hook = ctx.hook_registry.create(name).ok_or_else(|| {
                scope.structural(listener, format!("unknown compiler hook '{}'", name))
            })?;
            tracing::debug!("compiler hook {} registered", hook.name());
            ctx.hooks.register(hook);
        }

        let runtimes = [
            ("installer", CustomDataKind::InstallerListener),
            ("uninstaller", CustomDataKind::UninstallerListener),
        ];
        for (attribute, kind) in runtimes {
            let Some(class) = non_empty(listener, attribute) else {
                continue;
            };
            let jar = match non_empty(listener, "jar") {
                Some(jar) => jar.to_string(),
                None => format!("bin/customActions/{}.jar", class),
            };
            let location = ctx
                .locator
                .find(ResourceScope::Project, &jar)
                .or_else(|| ctx.locator.find(ResourceScope::Builtin, &jar));
            if location.is_none() {
                ctx.warn(
                    scope.file(),
                    format!("Jar {} for listener {} not found", jar, class),
                );
            }
            ctx.custom_data.push(CustomData {
                kind,
                names: vec![class.to_string()],
                os_constraints: os_constraints.clone(),
                location,
            });
        }
    }
    Ok(())
}

/// Register `<native>` libraries.
pub fn add_natives(ctx: &mut CompilerContext, doc: &Document) -> Result<()> {
    let scope = &doc.scope;
    for native in xml::children_named(&doc.root, "native") {
        let kind = scope.require_attribute(native, "type")?;
        let name = scope.require_attribute(native, "name")?;
        let stage = stage_of(ctx, scope, native);
        let os_constraints = OsConstraint::from_element(native);

        let location = match non_empty(native, "src") {
            Some(src) => ctx
                .locator
                .find(ResourceScope::Project, src)
                .or_else(|| ctx.locator.find(ResourceScope::Builtin, src))
                .ok_or_else(|| scope.not_found(native, "native library", src))?,
            None => {
                let path = format!("bin/native/{}/{}", kind, name);
                ctx.locator
                    .locate(ResourceScope::Builtin, &path)
                    .map_err(|_| scope.not_found(native, "native library", &path))?
            }
        };

        // The uninstaller copies its libraries out of the installer.
        ctx.natives.push(NativeLibrary {
            kind: kind.to_string(),
            name: name.to_string(),
            location: location.clone(),
            os_constraints: os_constraints.clone(),
            for_uninstaller: stage.for_uninstaller(),
        });

        if stage.for_uninstaller() {
            ctx.custom_data.push(CustomData {
                kind: CustomDataKind::UninstallerLib,
                names: vec![name.to_string()],
                os_constraints,
                location: Some(location),
            });
            if ctx.info.writes_uninstaller() {
                add_builtin_resource(
                    ctx,
                    scope,
                    native,
                    UNINSTALLER_EXT_RESOURCE,
                    UNINSTALLER_EXT_JAR,
                )?;
            }
        }
    }
    Ok(())
}

/// Register `<jar>` libraries merged into the installer or uninstaller.
pub fn add_jars(ctx: &mut CompilerContext, doc: &Document) -> Result<()> {
    let scope = &doc.scope;
    for jar in xml::children_named(&doc.root, "jar") {
        let src = scope.require_attribute(jar, "src")?;
        let stage = stage_of(ctx, scope, jar);
        let location: PathBuf = ctx
            .locator
            .locate(ResourceScope::Project, src)
            .map_err(|_| scope.not_found(jar, "jar", src))?;

        ctx.jars.push(JarContent {
            location: location.clone(),
            bundled_as: None,
        });
        if stage.for_uninstaller() {
            let names = archive::file_entries(&location)?;
            ctx.custom_data.push(CustomData {
                kind: CustomDataKind::UninstallerJar,
                names,
                os_constraints: OsConstraint::from_element(jar),
                location: Some(location),
            });
        }
    }
    Ok(())
}

/// The declared stage; unknown values fall back to `install` with a warning.
fn stage_of(ctx: &mut CompilerContext, scope: &SourceScope, element: &Element) -> LibraryStage {
    let Some(value) = xml::attr(element, "stage") else {
        return LibraryStage::default();
    };
    value.parse().unwrap_or_else(|_| {
        ctx.warn(
            scope.file(),
            format!(
                "Unknown stage '{}' on {} (expected {}), staging for the installer only",
                value,
                xml::describe(element),
                LibraryStage::EXPECTED
            ),
        );
        LibraryStage::default()
    })
}

fn non_empty<'a>(element: &'a Element, name: &str) -> Option<&'a str> {
    xml::attr(element, name).filter(|value| !value.is_empty())
}
