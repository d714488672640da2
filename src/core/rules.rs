//! Conditions and dynamic variables.
//!
//! Condition expressions are not interpreted here. A [`ConditionFactory`]
//! turns a declaration into an identity plus an opaque definition, and the
//! registries only keep track of identity and overwrite semantics.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::util::xml::{self, Element};

/// A named boolean condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Condition {
    pub id: String,
    pub kind: String,
    /// Serialized declaration, interpreted by the installer runtime.
    pub definition: String,
}

/// Builds conditions from manifest declarations.
pub trait ConditionFactory {
    /// `None` when the declaration cannot be turned into a condition.
    fn create(&self, element: &Element) -> Option<Condition>;
}

/// Accepts any `<condition id=".." type="..">` and keeps its XML as the definition.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultConditionFactory;

impl ConditionFactory for DefaultConditionFactory {
    fn create(&self, element: &Element) -> Option<Condition> {
        let id = xml::attr(element, "id").filter(|v| !v.is_empty())?;
        let kind = xml::attr(element, "type").filter(|v| !v.is_empty())?;
        let definition = xml::to_string(element).ok()?;
        Some(Condition {
            id: id.to_string(),
            kind: kind.to_string(),
            definition,
        })
    }
}

/// Conditions by id.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct ConditionRegistry {
    conditions: BTreeMap<String, Condition>,
}

impl ConditionRegistry {
    pub fn new() -> Self {
        ConditionRegistry::default()
    }

    /// Register a condition, returning the one it replaced.
    pub fn add(&mut self, condition: Condition) -> Option<Condition> {
        self.conditions.insert(condition.id.clone(), condition)
    }

    pub fn get(&self, id: &str) -> Option<&Condition> {
        self.conditions.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.conditions.contains_key(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Condition> {
        self.conditions.values()
    }

    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }
}

/// One candidate value of a dynamic variable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DynamicVariable {
    pub name: String,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    pub check_once: bool,
    pub ignore_failure: bool,
    pub unset: bool,
}

impl DynamicVariable {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        DynamicVariable {
            name: name.into(),
            value: value.into(),
            condition: None,
            check_once: false,
            ignore_failure: true,
            unset: true,
        }
    }

    pub fn with_condition(mut self, condition: impl Into<String>) -> Self {
        self.condition = Some(condition.into());
        self
    }
}

/// Candidate lists of dynamic variables, by name.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct DynamicVariableRegistry {
    variables: BTreeMap<String, Vec<DynamicVariable>>,
}

impl DynamicVariableRegistry {
    pub fn new() -> Self {
        DynamicVariableRegistry::default()
    }

    /// Add a candidate.
    ///
    /// A previous candidate with the same name and condition (including no
    /// condition) is removed first, so the new one ends up last. Returns
    /// `true` when a candidate was replaced.
    pub fn register(&mut self, variable: DynamicVariable) -> bool {
        let list = self.variables.entry(variable.name.clone()).or_default();
        let before = list.len();
        list.retain(|existing| existing.condition != variable.condition);
        let replaced = list.len() != before;
        list.push(variable);
        replaced
    }

    /// Candidates for one name, in registration order.
    pub fn get(&self, name: &str) -> &[DynamicVariable] {
        self.variables.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.variables.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[DynamicVariable])> {
        self.variables
            .iter()
            .map(|(name, list)| (name.as_str(), list.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }
}
