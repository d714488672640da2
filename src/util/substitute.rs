//! `${name}` token substitution.
//!
//! Two independent tables use the same token syntax:
//!
//! - [`PropertyTable`]: compile-time properties, applied eagerly to the whole
//!   manifest before it is interpreted.
//! - [`VariableTable`]: install-time variables, applied only to content that
//!   is explicitly marked for templating.
//!
//! The tables are separate types on purpose so install-time tokens are never
//! resolved by the compile-time pass. `$${` escapes a literal `${`.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use thiserror::Error;

static TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\$\{|\$\{([^}]*)\}").expect("token regex is valid"));

/// What to do with a token whose name has no value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingTokenPolicy {
    /// Fail the substitution.
    #[default]
    Reject,
    /// Leave the token in the text untouched.
    Keep,
}

impl FromStr for MissingTokenPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "reject" => Ok(MissingTokenPolicy::Reject),
            "keep" => Ok(MissingTokenPolicy::Keep),
            _ => Err(format!(
                "invalid missing-token policy '{}'; expected 'reject' or 'keep'",
                s
            )),
        }
    }
}

/// Escaping applied to substituted values, chosen by the content type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubstitutionType {
    #[default]
    Plain,
    Xml,
    Shell,
    JavaProperties,
}

impl SubstitutionType {
    /// Look up a type by its manifest name; unknown or absent names fall back to plain.
    pub fn lookup(name: Option<&str>) -> Self {
        match name.map(str::to_ascii_lowercase).as_deref() {
            Some("xml") => SubstitutionType::Xml,
            Some("shell") => SubstitutionType::Shell,
            Some("javaprop") | Some("java") => SubstitutionType::JavaProperties,
            _ => SubstitutionType::Plain,
        }
    }

    fn escape(self, value: &str) -> String {
        match self {
            SubstitutionType::Plain | SubstitutionType::Shell => value.to_string(),
            SubstitutionType::Xml => value
                .replace('&', "&amp;")
                .replace('<', "&lt;")
                .replace('>', "&gt;")
                .replace('"', "&quot;")
                .replace('\'', "&apos;"),
            SubstitutionType::JavaProperties => value
                .replace('\\', "\\\\")
                .replace('\n', "\\n")
                .replace('\r', "\\r")
                .replace('\t', "\\t"),
        }
    }
}

/// Which table a token was looked up in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenTable {
    Property,
    Variable,
}

impl fmt::Display for TokenTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenTable::Property => write!(f, "property"),
            TokenTable::Variable => write!(f, "variable"),
        }
    }
}

/// A token referenced a name with no value under the reject policy.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("undefined {table} `{name}`")]
pub struct SubstitutionError {
    pub table: TokenTable,
    pub name: String,
}

fn expand(
    text: &str,
    values: &BTreeMap<String, String>,
    policy: MissingTokenPolicy,
    table: TokenTable,
    kind: SubstitutionType,
) -> Result<String, SubstitutionError> {
    if !text.contains('$') {
        return Ok(text.to_string());
    }

    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for caps in TOKEN.captures_iter(text) {
        let whole = caps.get(0).expect("capture group 0 always matches");
        out.push_str(&text[last..whole.start()]);
        out.push_str(&replacement(&caps, values, policy, table, kind)?);
        last = whole.end();
    }
    out.push_str(&text[last..]);
    Ok(out)
}

fn replacement(
    caps: &Captures<'_>,
    values: &BTreeMap<String, String>,
    policy: MissingTokenPolicy,
    table: TokenTable,
    kind: SubstitutionType,
) -> Result<String, SubstitutionError> {
    let Some(name) = caps.get(1) else {
        return Ok("${".to_string());
    };
    match values.get(name.as_str()) {
        Some(value) => Ok(kind.escape(value)),
        None => match policy {
            MissingTokenPolicy::Keep => Ok(caps[0].to_string()),
            MissingTokenPolicy::Reject => Err(SubstitutionError {
                table,
                name: name.as_str().to_string(),
            }),
        },
    }
}

/// Compile-time property table.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PropertyTable {
    values: BTreeMap<String, String>,
    #[serde(skip)]
    missing: MissingTokenPolicy,
}

impl PropertyTable {
    /// Create an empty table with the given missing-token policy.
    pub fn new(missing: MissingTokenPolicy) -> Self {
        PropertyTable {
            values: BTreeMap::new(),
            missing,
        }
    }

    /// Define a property unless it already exists. Returns `true` if it was added.
    pub fn add(&mut self, name: impl Into<String>, value: impl Into<String>) -> bool {
        let name = name.into();
        if self.values.contains_key(&name) {
            return false;
        }
        self.values.insert(name, value.into());
        true
    }

    /// Define or replace a property.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Replace `${name}` tokens with property values.
    pub fn substitute_properties(&self, text: &str) -> Result<String, SubstitutionError> {
        expand(
            text,
            &self.values,
            self.missing,
            TokenTable::Property,
            SubstitutionType::Plain,
        )
    }
}

/// Install-time variable table.
#[derive(Debug, Clone, Default, Serialize)]
pub struct VariableTable {
    values: BTreeMap<String, String>,
    #[serde(skip)]
    missing: MissingTokenPolicy,
}

impl VariableTable {
    /// Create an empty table. Install-time substitution defaults to keeping unknown tokens.
    pub fn new(missing: MissingTokenPolicy) -> Self {
        VariableTable {
            values: BTreeMap::new(),
            missing,
        }
    }

    /// Define or redefine a variable, returning the previous value.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.values.insert(name.into(), value.into())
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Replace `${name}` tokens with variable values, escaping them for `kind`.
    pub fn substitute_variables(
        &self,
        text: &str,
        kind: SubstitutionType,
    ) -> Result<String, SubstitutionError> {
        expand(text, &self.values, self.missing, TokenTable::Variable, kind)
    }
}
