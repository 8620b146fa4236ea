use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use super::action::ActionSchema;
use super::literal::{Condition, Fact};
use super::object::ObjectRegistry;

/// A parsed planning domain: predicate registry and action table.
///
/// Action names are unique; the name index is rebuilt on deserialization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "DomainData", into = "DomainData")]
pub struct Domain {
    pub name: Option<String>,
    pub types: Vec<String>,
    pub predicates: Vec<String>,
    actions: Vec<ActionSchema>,
    index: FxHashMap<String, usize>,
    /// Action names that were declared more than once.
    pub redefined: Vec<String>,
}

/// Serialized form of a [`Domain`], without the name index.
#[derive(Serialize, Deserialize)]
struct DomainData {
    name: Option<String>,
    #[serde(default)]
    types: Vec<String>,
    #[serde(default)]
    predicates: Vec<String>,
    #[serde(default)]
    actions: Vec<ActionSchema>,
    #[serde(default)]
    redefined: Vec<String>,
}

impl From<DomainData> for Domain {
    fn from(data: DomainData) -> Self {
        let mut domain = Domain {
            name: data.name,
            types: data.types,
            predicates: data.predicates,
            redefined: data.redefined,
            ..Domain::default()
        };
        for schema in data.actions {
            domain.insert_action(schema);
        }
        domain
    }
}

impl From<Domain> for DomainData {
    fn from(domain: Domain) -> Self {
        DomainData {
            name: domain.name,
            types: domain.types,
            predicates: domain.predicates,
            actions: domain.actions,
            redefined: domain.redefined,
        }
    }
}

impl Domain {
    pub fn new(name: Option<String>) -> Self {
        Domain {
            name,
            ..Self::default()
        }
    }

    /// Add an action schema. A schema whose name is already present replaces
    /// the earlier one in place and is recorded in `redefined`.
    pub fn insert_action(&mut self, schema: ActionSchema) {
        match self.index.get(&schema.name) {
            Some(&idx) => {
                self.redefined.push(schema.name.clone());
                self.actions[idx] = schema;
            }
            None => {
                self.index.insert(schema.name.clone(), self.actions.len());
                self.actions.push(schema);
            }
        }
    }

    pub fn action(&self, name: &str) -> Option<&ActionSchema> {
        self.index.get(name).and_then(|&idx| self.actions.get(idx))
    }

    /// Schemas in declaration order.
    pub fn actions(&self) -> &[ActionSchema] {
        &self.actions
    }

    pub fn declares_predicate(&self, name: &str) -> bool {
        self.predicates.iter().any(|p| p == name)
    }
}

/// A parsed planning problem: objects, initial facts and goal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Problem {
    pub name: Option<String>,
    pub domain_name: Option<String>,
    pub objects: ObjectRegistry,
    pub init: Vec<Fact>,
    pub goal: Condition,
}

/// A domain together with one of its problems.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Story {
    pub domain: Domain,
    pub problem: Problem,
}
