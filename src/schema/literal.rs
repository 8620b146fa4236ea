use serde::{Deserialize, Serialize};
use std::fmt;

use super::action::Binding;

/// Prefix marking a schema variable inside a literal (`?from`).
pub const VARIABLE_PREFIX: char = '?';

/// A grounded predicate application such as `at-item key cell`.
///
/// Facts are compared by exact string identity. Whitespace is collapsed to
/// single spaces on construction; argument order is significant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fact(String);

impl Fact {
    /// Build a fact from raw literal text (the part between the parentheses).
    pub fn parse(text: &str) -> Fact {
        Fact(text.split_whitespace().collect::<Vec<_>>().join(" "))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The predicate name, i.e. the first token.
    pub fn predicate(&self) -> &str {
        self.0.split(' ').next().unwrap_or("")
    }
}

impl fmt::Display for Fact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Fact {
    fn from(text: &str) -> Self {
        Fact::parse(text)
    }
}

/// A possibly-lifted literal: predicate name plus argument tokens, where
/// arguments are either `?variables` or literal object names.
///
/// Anything nested deeper than a plain predicate application is kept as
/// opaque tokens and will simply never match a fact.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Literal {
    pub predicate: String,
    pub args: Vec<String>,
}

impl Literal {
    /// Parse the text between a literal's parentheses. Returns `None` for
    /// blank input.
    pub fn parse(text: &str) -> Option<Literal> {
        let mut tokens = text.split_whitespace();
        let predicate = tokens.next()?.to_string();
        Some(Literal {
            predicate,
            args: tokens.map(str::to_string).collect(),
        })
    }

    /// Variable names (without the `?` prefix) in argument order.
    pub fn variables(&self) -> impl Iterator<Item = &str> {
        self.args
            .iter()
            .filter_map(|arg| arg.strip_prefix(VARIABLE_PREFIX))
    }

    pub fn is_ground(&self) -> bool {
        self.variables().next().is_none()
    }

    /// Substitute bound variables with object names. Replacement is per
    /// whole token; unbound variables are left in place.
    pub fn ground(&self, binding: &Binding) -> Fact {
        let mut out = self.predicate.clone();
        for arg in &self.args {
            out.push(' ');
            let value = arg
                .strip_prefix(VARIABLE_PREFIX)
                .and_then(|var| binding.get(var))
                .unwrap_or(arg.as_str());
            out.push_str(value);
        }
        Fact(out)
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}", self.predicate)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        f.write_str(")")
    }
}

/// Conjunction of positive and negated literals. Used for preconditions
/// and, with ground arguments only, for goals.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    pub positive: Vec<Literal>,
    pub negative: Vec<Literal>,
}

impl Condition {
    pub fn is_empty(&self) -> bool {
        self.positive.is_empty() && self.negative.is_empty()
    }

    /// All literals, positive first.
    pub fn literals(&self) -> impl Iterator<Item = &Literal> {
        self.positive.iter().chain(self.negative.iter())
    }
}

/// Add and delete lists of an action.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Effect {
    pub add: Vec<Literal>,
    pub delete: Vec<Literal>,
}

impl Effect {
    pub fn literals(&self) -> impl Iterator<Item = &Literal> {
        self.add.iter().chain(self.delete.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fact_collapses_whitespace() {
        let fact = Fact::parse("  at-item   key\n  cell ");
        assert_eq!(fact.as_str(), "at-item key cell");
        assert_eq!(fact.predicate(), "at-item");
    }

    #[test]
    fn literal_parse_and_variables() {
        let lit = Literal::parse("door-between ?from ?to").unwrap();
        assert_eq!(lit.predicate, "door-between");
        assert_eq!(lit.variables().collect::<Vec<_>>(), vec!["from", "to"]);
        assert!(!lit.is_ground());
        assert!(Literal::parse("escaped").unwrap().is_ground());
        assert!(Literal::parse("   ").is_none());
    }

    #[test]
    fn ground_replaces_whole_tokens_only() {
        let lit = Literal::parse("link ?a ?ab a").unwrap();
        let binding = Binding::new().with("a", "cell").with("ab", "exit");
        assert_eq!(lit.ground(&binding).as_str(), "link cell exit a");
    }

    #[test]
    fn ground_leaves_unbound_variables() {
        let lit = Literal::parse("at ?r").unwrap();
        assert_eq!(lit.ground(&Binding::new()).as_str(), "at ?r");
    }

    #[test]
    fn literal_display() {
        let lit = Literal::parse("at ?r").unwrap();
        assert_eq!(lit.to_string(), "(at ?r)");
    }
}
