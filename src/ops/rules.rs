//! Variables, dynamic variables and conditions.

use anyhow::Result;

use crate::core::rules::DynamicVariable;
use crate::ops::context::CompilerContext;
use crate::ops::document::Document;
use crate::util::xml;

/// Define `<variables><variable name value/>` entries.
pub fn add_variables(ctx: &mut CompilerContext, doc: &Document) -> Result<()> {
    let Some(block) = xml::first_child(&doc.root, "variables") else {
        return Ok(());
    };
    for variable in xml::children_named(block, "variable") {
        let name = doc.scope.require_attribute(variable, "name")?;
        let value = xml::attr(variable, "value").ok_or_else(|| {
            doc.scope
                .structural(variable, "<variable> requires attribute 'value'")
        })?;
        if ctx.variables.set(name, value).is_some() {
            ctx.warn(
                doc.file(),
                format!("Variable '{}' being overwritten", name),
            );
        }
    }
    Ok(())
}

/// Register `<dynamicvariables><variable ..>` candidates.
pub fn add_dynamic_variables(ctx: &mut CompilerContext, doc: &Document) -> Result<()> {
    let Some(block) = xml::first_child(&doc.root, "dynamicvariables") else {
        return Ok(());
    };
    for element in xml::children_named(block, "variable") {
        let name = doc.scope.require_attribute(element, "name")?;
        let value = match xml::attr(element, "value") {
            Some(value) => value.to_string(),
            None => xml::first_child(element, "value")
                .and_then(xml::content)
                .ok_or_else(|| {
                    doc.scope.structural(
                        element,
                        "dynamic variable requires a 'value' attribute or <value> child",
                    )
                })?,
        };

        let mut variable = DynamicVariable::new(name, value);
        variable.condition = xml::attr(element, "condition")
            .filter(|c| !c.is_empty())
            .map(str::to_string);
        variable.check_once = doc.scope.yes_no(element, "checkonce", false);
        variable.ignore_failure = doc.scope.yes_no(element, "ignorefailure", true);
        variable.unset = doc.scope.yes_no(element, "unset", true);

        let condition = variable.condition.clone();
        if ctx.dynamic_variables.register(variable) {
            let message = match condition {
                Some(condition) => format!(
                    "Dynamic variable '{}' with condition '{}' will be overwritten",
                    name, condition
                ),
                None => format!(
                    "Dynamic variable '{}' without condition will be overwritten",
                    name
                ),
            };
            ctx.warn(doc.file(), message);
        }
    }
    Ok(())
}

/// Register `<conditions><condition ..>` definitions.
pub fn add_conditions(ctx: &mut CompilerContext, doc: &Document) -> Result<()> {
    let Some(block) = xml::first_child(&doc.root, "conditions") else {
        return Ok(());
    };
    for element in xml::children_named(block, "condition") {
        let Some(condition) = ctx.condition_factory.create(element) else {
            ctx.warn(
                doc.file(),
                format!("Condition {} could not be created", xml::describe(element)),
            );
            continue;
        };
        let id = condition.id.clone();
        if ctx.conditions.add(condition).is_some() {
            ctx.warn(
                doc.file(),
                format!("Condition with id '{}' will be overwritten", id),
            );
        }
    }
    Ok(())
}
