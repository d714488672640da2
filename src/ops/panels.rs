//! The `<panels>` block.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Result;

use crate::core::os::OsConstraint;
use crate::core::panel::{ActionStage, Panel, PanelAction};
use crate::ops::context::CompilerContext;
use crate::ops::document::Document;
use crate::ops::resources::add_project_resource;
use crate::ops::scope::SourceScope;
use crate::util::archive;
use crate::util::locator::ResourceScope;
use crate::util::xml::{self, Element};

/// Register every panel; at least one is required.
pub fn add_panels(ctx: &mut CompilerContext, doc: &Document) -> Result<()> {
    let scope = &doc.scope;
    let block = scope.require_child(&doc.root, "panels")?;
    let panels: Vec<&Element> = xml::children_named(block, "panel").collect();
    if panels.is_empty() {
        return Err(scope
            .structural(block, "<panels> requires at least one <panel>")
            .into());
    }
    for element in panels {
        let panel = read_panel(ctx, scope, element)?;
        tracing::debug!("panel {}", panel.key());
        ctx.panels.push(panel);
    }
    Ok(())
}

fn read_panel(ctx: &mut CompilerContext, scope: &SourceScope, element: &Element) -> Result<Panel> {
    let class_name = scope.require_attribute(element, "classname")?;
    let mut panel = Panel::new(class_name);
    panel.id = owned(element, "id");
    panel.condition = owned(element, "condition");
    panel.os_constraints = OsConstraint::from_element(element);

    let jar = match xml::attr(element, "jar") {
        Some(jar) => jar.to_string(),
        None => format!("bin/panels/{}.jar", class_name),
    };
    if !jar.is_empty() {
        match ctx.locator.find(ResourceScope::Builtin, &jar) {
            Some(location) => {
                panel.qualified_class_name = qualified_name(&location, class_name)?;
                panel.jar = Some(location);
            }
            None => ctx.warn(
                scope.file(),
                format!("Panel jar {} for {} not found", jar, class_name),
            ),
        }
    }

    if let Some(configuration) = xml::first_child(element, "configuration") {
        panel.configuration = read_params(scope, configuration)?;
    }

    if let Some(validator) = xml::first_child(element, "validator") {
        panel.validator = Some(scope.require_attribute(validator, "classname")?.to_string());
    }

    let counter = ctx.panels.len() + 1;
    for help in xml::children_named(element, "help") {
        let iso3 = scope.require_attribute(help, "iso3")?;
        let src = scope.require_attribute(help, "src")?;
        let id = format!("{}_{}_help_{}.html", panel.key(), counter, iso3);
        add_project_resource(ctx, scope, help, &id, src)?;
        panel.helps.insert(iso3.to_string(), id);
    }

    if let Some(actions) = xml::first_child(element, "actions") {
        for action in xml::children_named(actions, "action") {
            let stage = scope
                .enumerated::<ActionStage>(action, "stage", ActionStage::EXPECTED)?
                .ok_or_else(|| scope.structural(action, "<action> requires attribute 'stage'"))?;
            let class_name = scope.require_attribute(action, "classname")?;
            panel.actions.entry(stage).or_default().push(PanelAction {
                class_name: class_name.to_string(),
                configuration: read_params(scope, action)?,
            });
        }
    }

    Ok(panel)
}

/// `<param name|key value>` children as a table.
/// Read `<param><key>..</key><value>..</value></param>` entries.
///
/// The attribute form `<param name=".." value=".."/>` is accepted as well.
fn read_params(scope: &SourceScope, element: &Element) -> Result<BTreeMap<String, String>> {
    let mut params = BTreeMap::new();
    for param in xml::children_named(element, "param") {
        let key = child_text(param, "key")
            .or_else(|| owned(param, "name"))
            .or_else(|| owned(param, "key"))
            .ok_or_else(|| scope.structural(param, "<param> requires a <key>"))?;
        let value = match xml::first_child(param, "value") {
            Some(value) => xml::content(value).unwrap_or_default(),
            None => xml::attr(param, "value").unwrap_or_default().to_string(),
        };
        params.insert(key, value);
    }
    Ok(params)
}

fn child_text(element: &Element, name: &str) -> Option<String> {
    xml::first_child(element, name)
        .and_then(xml::content)
        .filter(|text| !text.is_empty())
}

/// Fully qualified name of the first `.class` entry named after `class_name`.
fn qualified_name(jar: &Path, class_name: &str) -> Result<Option<String>> {
    let entries = archive::file_entries(jar)?;
    let found = entries.iter().find_map(|entry| {
        let path = entry.strip_suffix(".class")?;
        let stem = path.rsplit('/').next()?;
        (stem == class_name).then(|| path.replace('/', "."))
    });
    Ok(found)
}

fn owned(element: &Element, name: &str) -> Option<String> {
    xml::attr(element, name)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}
