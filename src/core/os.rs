//! Operating-system constraints.

use serde::Serialize;

use crate::util::xml::{self, Element};

/// Restricts an entity to matching target systems.
///
/// Empty fields match anything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OsConstraint {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub family: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arch: Option<String>,
}

impl OsConstraint {
    pub fn family(family: impl Into<String>) -> Self {
        OsConstraint {
            family: Some(family.into()),
            ..OsConstraint::default()
        }
    }

    /// Read `<os>` children plus the legacy `os` attribute of `element`.
    pub fn from_element(element: &Element) -> Vec<OsConstraint> {
        let owned = |el: &Element, name: &str| {
            xml::attr(el, name)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        let mut constraints: Vec<_> = xml::children_named(element, "os")
            .map(|os| OsConstraint {
                family: owned(os, "family"),
                name: owned(os, "name"),
                version: owned(os, "version"),
                arch: owned(os, "arch"),
            })
            .collect();

        if let Some(family) = owned(element, "os") {
            constraints.push(OsConstraint::family(family));
        }
        constraints
    }

    /// Whether this constraint targets Windows systems.
    pub fn is_windows(&self) -> bool {
        let family = self
            .family
            .as_deref()
            .is_some_and(|f| f.eq_ignore_ascii_case("windows"));
        let name = self
            .name
            .as_deref()
            .is_some_and(|n| n.to_ascii_lowercase().starts_with("windows"));
        family || name
    }
}

/// Whether any constraint in the list targets Windows.
pub fn any_windows(constraints: &[OsConstraint]) -> bool {
    constraints.iter().any(OsConstraint::is_windows)
}
