//! Installer-wide blocks: packaging, info, GUI preferences, locales and requirements.

use anyhow::Result;

use crate::core::info::{
    look_and_feel_jar, Author, InstallerKind, LookAndFeel, RebootAction, LOOK_AND_FEEL_JARS,
};
use crate::core::resource::{InstallerRequirement, JarContent, LangPack};
use crate::ops::context::CompilerContext;
use crate::ops::document::Document;
use crate::ops::properties::UNPACKER_CLASS;
use crate::ops::resources::add_builtin_resource;
use crate::ops::scope::{parse_bool, SourceScope};
use crate::util::locator::ResourceScope;
use crate::util::xml::{self, Element};

/// Resource id of the uninstaller runtime.
pub const UNINSTALLER_RESOURCE: &str = "installer.uninstaller";

const UNINSTALLER_JAR: &str = "lib/uninstaller.jar";
const DEFAULT_UNINSTALLER_NAME: &str = "uninstaller.jar";
const DEFAULT_UNINSTALLER_PATH: &str = "$INSTALL_PATH/Uninstaller";

/// Record the packager and unpacker implementations.
pub fn add_packaging(ctx: &mut CompilerContext, doc: &Document) -> Result<()> {
    if let Some(block) = xml::first_child(&doc.root, "packaging") {
        if let Some(packager) = xml::first_child(block, "packager") {
            ctx.packaging.packager_class = doc.scope.require_attribute(packager, "class")?.to_string();
            if let Some(options) = xml::first_child(packager, "options") {
                ctx.packaging.packager_options = Some(xml::to_string(options)?);
            }
        }
        if let Some(unpacker) = xml::first_child(block, "unpacker") {
            ctx.packaging.unpacker_class = doc.scope.require_attribute(unpacker, "class")?.to_string();
        }
    }
    let unpacker = ctx.packaging.unpacker_class.clone();
    ctx.properties.set(UNPACKER_CLASS, unpacker);
    Ok(())
}

/// Read the required `<info>` block.
pub fn add_info(ctx: &mut CompilerContext, doc: &Document) -> Result<()> {
    let scope = &doc.scope;
    let block = scope.require_child(&doc.root, "info")?;
    let info = &mut ctx.info;

    info.app_name = scope.require_content(scope.require_child(block, "appname")?)?;
    info.app_version = scope.require_content(scope.require_child(block, "appversion")?)?;
    info.app_subpath = text_of(block, "appsubpath");
    info.url = text_of(block, "url");

    if let Some(authors) = xml::first_child(block, "authors") {
        for author in xml::children_named(authors, "author") {
            info.authors.push(Author {
                name: scope.require_attribute(author, "name")?.to_string(),
                email: xml::attr(author, "email").unwrap_or_default().to_string(),
            });
        }
    }

    match ctx.kind {
        InstallerKind::Web => {
            let webdir = scope.require_child(block, "webdir")?;
            info.web_dir = Some(scope.require_content(webdir)?);
        }
        InstallerKind::Standard => {
            if xml::first_child(block, "webdir").is_some() {
                tracing::debug!("ignoring <webdir> for a standard installer");
            }
        }
    }

    if let Some(privileged) = xml::first_child(block, "run-privileged") {
        info.requires_privileges = true;
        info.privileges_condition = optional_attr(privileged, "condition");
        info.uninstaller_requires_privileges = scope.yes_no(privileged, "uninstaller", true);
    }

    if let Some(reboot) = xml::first_child(block, "rebootaction") {
        let value = scope.require_content(reboot)?;
        info.reboot_action = value
            .parse::<RebootAction>()
            .map_err(|_| scope.invalid_value(reboot, "rebootaction", &value, RebootAction::EXPECTED))?;
        info.reboot_condition = optional_attr(reboot, "condition");
    }

    if let Some(path) = text_of(block, "summarylogfilepath") {
        info.summary_log_path = Some(path);
    }

    info.write_installation_information = match xml::first_child(block, "writeinstallationinformation") {
        Some(element) => {
            let value = scope.require_content(element)?;
            parse_bool(&value).ok_or_else(|| {
                scope.invalid_value(element, "writeinstallationinformation", &value, "yes, no")
            })?
        }
        None => true,
    };

    info.unpacker_class = ctx.packaging.unpacker_class.clone();

    let uninstaller = xml::first_child(block, "uninstaller");
    let writes = uninstaller.map_or(true, |el| scope.yes_no(el, "write", true));
    if writes {
        let declared = |name: &str| uninstaller.and_then(|el| optional_attr(el, name));
        info.uninstaller_name =
            Some(declared("name").unwrap_or_else(|| DEFAULT_UNINSTALLER_NAME.to_string()));
        info.uninstaller_path =
            Some(declared("path").unwrap_or_else(|| DEFAULT_UNINSTALLER_PATH.to_string()));
        info.uninstaller_condition = declared("condition");
        let origin = uninstaller.unwrap_or(block);
        add_builtin_resource(ctx, scope, origin, UNINSTALLER_RESOURCE, UNINSTALLER_JAR)?;
    }

    tracing::debug!("application {} {}", ctx.info.app_name, ctx.info.app_version);
    Ok(())
}

fn text_of(element: &Element, child: &str) -> Option<String> {
    xml::first_child(element, child)
        .and_then(xml::content)
        .filter(|text| !text.is_empty())
}

fn optional_attr(element: &Element, name: &str) -> Option<String> {
    xml::attr(element, name)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// Read the optional `<guiprefs>` block.
pub fn add_gui_prefs(ctx: &mut CompilerContext, doc: &Document) -> Result<()> {
    let Some(block) = xml::first_child(&doc.root, "guiprefs") else {
        return Ok(());
    };
    let scope = &doc.scope;

    ctx.gui_prefs.resizable = scope.require_yes_no(block, "resizable")?;
    ctx.gui_prefs.width = scope.require_int(block, "width")?;
    ctx.gui_prefs.height = scope.require_int(block, "height")?;

    for laf in xml::children_named(block, "laf") {
        let look_and_feel = read_look_and_feel(scope, laf)?;
        if let Some(jar) = look_and_feel_jar(&look_and_feel.name) {
            add_look_and_feel_jar(ctx, scope, laf, jar)?;
        }
        ctx.gui_prefs.look_and_feels.push(look_and_feel);
    }

    for modifier in xml::children_named(block, "modifier") {
        let key = scope.require_attribute(modifier, "key")?;
        let value = scope.require_attribute(modifier, "value")?;
        ctx.gui_prefs.modifiers.insert(key.to_string(), value.to_string());
    }
    Ok(())
}

fn read_look_and_feel(scope: &SourceScope, laf: &Element) -> Result<LookAndFeel> {
    let name = scope.require_attribute(laf, "name")?;
    if look_and_feel_jar(name).is_none() {
        let known: Vec<&str> = LOOK_AND_FEEL_JARS.iter().map(|(name, _)| *name).collect();
        return Err(scope
            .invalid_value(laf, "name", name, &known.join(", "))
            .into());
    }

    let mut os_families = Vec::new();
    for os in xml::children_named(laf, "os") {
        os_families.push(scope.require_attribute(os, "family")?.to_string());
    }
    if os_families.is_empty() {
        return Err(scope
            .structural(laf, "<laf> requires at least one <os>")
            .into());
    }
    let mut params = std::collections::BTreeMap::new();
    for param in xml::children_named(laf, "param") {
        let name = scope.require_attribute(param, "name")?;
        let value = xml::attr(param, "value").unwrap_or_default();
        params.insert(name.to_string(), value.to_string());
    }

    Ok(LookAndFeel {
        name: name.to_string(),
        os_families,
        params,
    })
}

fn add_look_and_feel_jar(
    ctx: &mut CompilerContext,
    scope: &SourceScope,
    laf: &Element,
    jar: &str,
) -> Result<()> {
    let path = format!("lib/{}", jar);
    if ctx.jars.iter().any(|j| j.bundled_as.as_deref() == Some(path.as_str())) {
        return Ok(());
    }
    let location = ctx
        .locator
        .locate(ResourceScope::Builtin, &path)
        .map_err(|_| scope.not_found(laf, "look-and-feel library", &path))?;
    ctx.jars.push(JarContent {
        location,
        bundled_as: Some(path),
    });
    Ok(())
}

/// Register the `<locale>` language packs; at least one is required.
pub fn add_lang_packs(ctx: &mut CompilerContext, doc: &Document) -> Result<()> {
    let scope = &doc.scope;
    let locale = scope.require_child(&doc.root, "locale")?;
    let langpacks: Vec<&Element> = xml::children_named(locale, "langpack").collect();
    if langpacks.is_empty() {
        return Err(scope
            .structural(locale, "<locale> requires at least one <langpack>")
            .into());
    }

    for langpack in langpacks {
        let iso3 = scope.require_attribute(langpack, "iso3")?.to_ascii_lowercase();
        let strings_path = format!("bin/langpacks/installer/{}.xml", iso3);
        let strings = ctx
            .locator
            .locate(ResourceScope::Builtin, &strings_path)
            .map_err(|_| scope.not_found(langpack, "language pack", &strings_path))?;

        let flag_path = format!("bin/langpacks/flags/{}.gif", iso3);
        let flag = ctx.locator.find(ResourceScope::Builtin, &flag_path);
        if flag.is_none() {
            ctx.warn(scope.file(), format!("No flag found for language pack {}", iso3));
        }

        tracing::debug!("language pack {}", iso3);
        ctx.lang_packs.push(LangPack {
            iso3,
            strings,
            flag,
        });
    }
    Ok(())
}

/// Read `<installerrequirements>`.
pub fn add_installer_requirements(ctx: &mut CompilerContext, doc: &Document) -> Result<()> {
    let Some(block) = xml::first_child(&doc.root, "installerrequirements") else {
        return Ok(());
    };
    for requirement in xml::children_named(block, "installerrequirement") {
        ctx.requirements.push(InstallerRequirement {
            condition: doc.scope.require_attribute(requirement, "condition")?.to_string(),
            message: doc.scope.require_attribute(requirement, "message")?.to_string(),
        });
    }
    Ok(())
}
