use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::literal::{Condition, Effect, VARIABLE_PREFIX};

/// Type tag given to untyped parameters and objects. A parameter carrying
/// it accepts every object.
pub const UNIVERSAL_TYPE: &str = "object";

/// A typed schema variable, stored without its `?` prefix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub type_tag: String,
}

impl Parameter {
    pub fn new(name: impl Into<String>, type_tag: impl Into<String>) -> Self {
        let name = name.into();
        Parameter {
            name: name.trim_start_matches(VARIABLE_PREFIX).to_string(),
            type_tag: type_tag.into(),
        }
    }

    pub fn is_universal(&self) -> bool {
        self.type_tag == UNIVERSAL_TYPE
    }
}

/// A lifted action: typed parameters, precondition and effect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionSchema {
    pub name: String,
    pub parameters: Vec<Parameter>,
    pub precondition: Condition,
    pub effect: Effect,
}

impl ActionSchema {
    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.parameters.iter().find(|p| p.name == name)
    }

    /// Objects of a binding in parameter declaration order. Unbound
    /// parameters are skipped.
    pub fn bound_objects<'a>(&self, binding: &'a Binding) -> Vec<&'a str> {
        self.parameters
            .iter()
            .filter_map(|p| binding.get(&p.name))
            .collect()
    }
}

/// Immutable variable → object mapping. Keys are kept sorted so that the
/// canonical form, equality and hashing never depend on insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Binding(BTreeMap<String, String>);

impl Binding {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return a new binding extended with `var = object`. A leading `?` on
    /// the variable name is ignored.
    pub fn with(&self, var: impl AsRef<str>, object: impl Into<String>) -> Binding {
        let mut map = self.0.clone();
        map.insert(
            var.as_ref().trim_start_matches(VARIABLE_PREFIX).to_string(),
            object.into(),
        );
        Binding(map)
    }

    pub fn get(&self, var: &str) -> Option<&str> {
        self.0
            .get(var.trim_start_matches(VARIABLE_PREFIX))
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Stable textual key: `var=obj` pairs sorted by variable.
    pub fn canonical(&self) -> String {
        self.iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for Binding {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Binding::new(), |binding, (k, v)| binding.with(k, v))
    }
}

impl fmt::Display for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}}", self.canonical())
    }
}

/// A schema instantiated with a concrete binding.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GroundAction {
    pub action: String,
    pub binding: Binding,
}

impl GroundAction {
    pub fn new(action: impl Into<String>, binding: Binding) -> Self {
        GroundAction {
            action: action.into(),
            binding,
        }
    }

    /// Canonical identifier, e.g. `move(from=cell,to=corridor)`.
    pub fn key(&self) -> String {
        format!("{}({})", self.action, self.binding.canonical())
    }
}

impl fmt::Display for GroundAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}
