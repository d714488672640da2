//! Attribute and child access that reports failures against the declaring element.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::ops::errors::CompileError;
use crate::util::substitute::SubstitutionError;
use crate::util::xml::{self, Element};

/// The document an element was read from.
///
/// All structural errors raised through a scope carry the element header
/// and the document path.
#[derive(Debug, Clone, Default)]
pub struct SourceScope {
    file: Option<PathBuf>,
}

impl SourceScope {
    pub fn new(file: Option<PathBuf>) -> Self {
        SourceScope { file }
    }

    pub fn for_file(file: &Path) -> Self {
        SourceScope {
            file: Some(file.to_path_buf()),
        }
    }

    pub fn file(&self) -> Option<&Path> {
        self.file.as_deref()
    }

    pub fn structural(&self, element: &Element, message: impl Into<String>) -> CompileError {
        CompileError::Structural {
            file: self.file.clone(),
            element: xml::describe(element),
            message: message.into(),
        }
    }

    pub fn not_found(
        &self,
        element: &Element,
        what: impl Into<String>,
        path: impl Into<String>,
    ) -> CompileError {
        CompileError::NotFound {
            file: self.file.clone(),
            element: xml::describe(element),
            what: what.into(),
            path: path.into(),
        }
    }

    pub fn invalid_value(
        &self,
        element: &Element,
        attribute: &str,
        value: &str,
        expected: &str,
    ) -> CompileError {
        CompileError::InvalidValue {
            file: self.file.clone(),
            element: xml::describe(element),
            attribute: attribute.to_string(),
            value: value.to_string(),
            expected: expected.to_string(),
        }
    }

    pub fn undefined(&self, element: &Element, err: SubstitutionError) -> CompileError {
        CompileError::UndefinedToken {
            file: self.file.clone(),
            element: xml::describe(element),
            table: err.table.to_string(),
            name: err.name,
        }
    }

    pub fn hook_failed(
        &self,
        element: &Element,
        hook: &str,
        message: impl Into<String>,
    ) -> CompileError {
        CompileError::Hook {
            file: self.file.clone(),
            hook: hook.to_string(),
            element: xml::describe(element),
            message: message.into(),
        }
    }

    /// A required, non-empty attribute.
    pub fn require_attribute<'a>(
        &self,
        element: &'a Element,
        name: &str,
    ) -> Result<&'a str, CompileError> {
        match xml::attr(element, name) {
            Some(value) if !value.is_empty() => Ok(value),
            _ => Err(self.structural(
                element,
                format!("<{}> requires attribute '{}'", element.name, name),
            )),
        }
    }

    /// A required child element.
    pub fn require_child<'a>(
        &self,
        element: &'a Element,
        name: &str,
    ) -> Result<&'a Element, CompileError> {
        xml::first_child(element, name).ok_or_else(|| {
            self.structural(
                element,
                format!("<{}> requires child <{}>", element.name, name),
            )
        })
    }

    /// Required non-empty text content.
    pub fn require_content(&self, element: &Element) -> Result<String, CompileError> {
        match xml::content(element) {
            Some(text) if !text.is_empty() => Ok(text),
            _ => Err(self.structural(
                element,
                format!("<{}> requires text content", element.name),
            )),
        }
    }

    /// An optional boolean attribute, `yes`/`no` or `true`/`false`.
    ///
    /// Anything else falls back to `default`.
    pub fn yes_no(&self, element: &Element, name: &str, default: bool) -> bool {
        xml::attr(element, name)
            .and_then(parse_bool)
            .unwrap_or(default)
    }

    /// A required boolean attribute.
    pub fn require_yes_no(&self, element: &Element, name: &str) -> Result<bool, CompileError> {
        let value = self.require_attribute(element, name)?;
        parse_bool(value)
            .ok_or_else(|| self.invalid_value(element, name, value, "yes, no, true, false"))
    }

    /// A required integer attribute.
    pub fn require_int(&self, element: &Element, name: &str) -> Result<i64, CompileError> {
        let value = self.require_attribute(element, name)?;
        value
            .trim()
            .parse()
            .map_err(|_| self.invalid_value(element, name, value, "an integer"))
    }

    /// An optional enumerated attribute parsed with `FromStr`.
    pub fn enumerated<T>(
        &self,
        element: &Element,
        name: &str,
        expected: &str,
    ) -> Result<Option<T>, CompileError>
    where
        T: FromStr,
    {
        match xml::attr(element, name) {
            None => Ok(None),
            Some(value) => value
                .parse()
                .map(Some)
                .map_err(|_| self.invalid_value(element, name, value, expected)),
        }
    }
}

/// Parse `yes`/`no`/`true`/`false`, case-insensitively.
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "yes" | "true" => Some(true),
        "no" | "false" => Some(false),
        _ => None,
    }
}
