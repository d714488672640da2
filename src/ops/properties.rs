//! Execution of `<properties>` declarations.
//!
//! Properties are defined in document order and each definition sees the
//! ones before it. A property, once defined, keeps its first value.

use std::path::Path;

use anyhow::Result;

use crate::ops::context::CompilerContext;
use crate::ops::document::Document;
use crate::ops::scope::SourceScope;
use crate::util::fs;
use crate::util::substitute::PropertyTable;
use crate::util::xml::{self, Element};

/// Built-in property holding the project base directory.
pub const BASEDIR: &str = "basedir";

/// Built-in property holding the root manifest path.
pub const MANIFEST_FILE: &str = "installation.file";

/// Property naming the unpacker implementation.
pub const UNPACKER_CLASS: &str = "UNPACKER_CLASS";

/// Execute every `<property>` of the document's `<properties>` block.
pub fn define_properties(ctx: &mut CompilerContext, doc: &Document) -> Result<()> {
    let Some(block) = xml::first_child(&doc.root, "properties") else {
        return Ok(());
    };
    for property in xml::children_named(block, "property") {
        execute(ctx, &doc.scope, property)?;
    }
    Ok(())
}

fn execute(ctx: &mut CompilerContext, scope: &SourceScope, property: &Element) -> Result<()> {
    let substitute = |props: &PropertyTable, value: &str| {
        props
            .substitute_properties(value)
            .map_err(|err| scope.undefined(property, err))
    };

    if let Some(name) = xml::attr(property, "name").filter(|n| !n.is_empty()) {
        let value = scope.require_attribute(property, "value")?;
        let value = substitute(&ctx.properties, value)?;
        if !ctx.properties.add(name, value) {
            tracing::debug!("property `{}` already defined, keeping first value", name);
        }
        return Ok(());
    }

    if let Some(file) = xml::attr(property, "file").filter(|f| !f.is_empty()) {
        let file = substitute(&ctx.properties, file)?;
        let path = ctx.locator.project_path(&file);
        if !path.is_file() {
            ctx.warn(
                scope.file(),
                format!("Unable to find property file: {}", path.display()),
            );
            return Ok(());
        }
        let prefix = xml::attr(property, "prefix").map(normalize_prefix);
        load_properties_file(&mut ctx.properties, &path, prefix.as_deref())?;
        return Ok(());
    }

    if let Some(env) = xml::attr(property, "environment").filter(|e| !e.is_empty()) {
        let prefix = normalize_prefix(env);
        for (key, value) in std::env::vars() {
            ctx.properties.add(format!("{}{}", prefix, key), value);
        }
        return Ok(());
    }

    Err(scope
        .structural(
            property,
            "<property> requires 'name' and 'value', 'file', or 'environment'",
        )
        .into())
}

fn normalize_prefix(prefix: &str) -> String {
    if prefix.is_empty() || prefix.ends_with('.') {
        prefix.to_string()
    } else {
        format!("{}.", prefix)
    }
}

fn load_properties_file(
    properties: &mut PropertyTable,
    path: &Path,
    prefix: Option<&str>,
) -> Result<()> {
    let text = fs::read_to_string(path)?;
    for (key, value) in parse_java_properties(&text) {
        let key = match prefix {
            Some(prefix) => format!("{}{}", prefix, key),
            None => key,
        };
        properties.add(key, value);
    }
    tracing::debug!("loaded properties from {}", path.display());
    Ok(())
}

/// Parse the `key=value` line format of Java `.properties` files.
///
/// Supports `#`/`!` comments, `=`, `:` or whitespace separators, trailing
/// backslash continuations and the usual escapes.
pub fn parse_java_properties(text: &str) -> Vec<(String, String)> {
    let mut entries = Vec::new();
    let mut logical = String::new();

    for raw in text.lines() {
        let line = raw.trim_start();
        if logical.is_empty() && (line.is_empty() || line.starts_with('#') || line.starts_with('!'))
        {
            continue;
        }

        if ends_with_continuation(line) {
            logical.push_str(&line[..line.len() - 1]);
            continue;
        }
        logical.push_str(line);

        if let Some(entry) = split_entry(&logical) {
            entries.push(entry);
        }
        logical.clear();
    }
    if !logical.is_empty() {
        if let Some(entry) = split_entry(&logical) {
            entries.push(entry);
        }
    }
    entries
}

fn ends_with_continuation(line: &str) -> bool {
    let slashes = line.chars().rev().take_while(|c| *c == '\\').count();
    slashes % 2 == 1
}

fn split_entry(line: &str) -> Option<(String, String)> {
    let mut key = String::new();
    let mut chars = line.chars().peekable();
    let mut escaped = false;

    while let Some(&c) = chars.peek() {
        if escaped {
            key.push(c);
            escaped = false;
            chars.next();
            continue;
        }
        match c {
            '\\' => escaped = true,
            '=' | ':' => break,
            c if c.is_whitespace() => break,
            c => key.push(c),
        }
        chars.next();
    }

    let rest: String = chars.collect();
    let rest = rest.trim_start();
    let rest = rest
        .strip_prefix('=')
        .or_else(|| rest.strip_prefix(':'))
        .unwrap_or(rest)
        .trim_start();

    if key.is_empty() {
        return None;
    }
    Some((key, unescape(rest)))
}

fn unescape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    Some(decoded) => out.push(decoded),
                    None => {
                        out.push_str("\\u");
                        out.push_str(&hex);
                    }
                }
            }
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}
