/// Domain and problem parsing — planning text to schema types.
///
/// Each section is isolated with the block extractor before field-level
/// parsing. Structural problems are collected rather than failing on the
/// first one, so a caller can report everything at once.

use log::{debug, warn};
use std::fmt;
use thiserror::Error;

use crate::core::blocks::{
    balanced_at, depth_one_groups, extract_after, extract_section, extract_sections,
    first_token, inner, section_body, strip_comments, BlockError,
};
use crate::schema::action::{ActionSchema, Parameter, UNIVERSAL_TYPE};
use crate::schema::literal::{Condition, Effect, Fact, Literal};
use crate::schema::object::{ObjectRegistry, TypedObject};
use crate::schema::story::{Domain, Problem, Story};

/// Which of the two input texts an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Document {
    Domain,
    Problem,
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Document::Domain => f.write_str("domain"),
            Document::Problem => f.write_str("problem"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("{document} text is empty")]
    EmptyDocument { document: Document },
    #[error("{document} is missing its ({section} ...) section")]
    MissingSection {
        document: Document,
        section: &'static str,
    },
    #[error("{document}: ({section} ...) block is never closed")]
    Unterminated { document: Document, section: String },
    #[error("domain: action block #{index} has no name")]
    UnnamedAction { index: usize },
    #[error(
        "action '{action}': parameter ?{parameter} has type '{type_tag}' but no object of that type exists"
    )]
    UnsatisfiableType {
        action: String,
        parameter: String,
        type_tag: String,
    },
}

/// Every error found while parsing a domain/problem pair.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParseErrors(pub Vec<ParseError>);

impl ParseErrors {
    pub fn iter(&self) -> impl Iterator<Item = &ParseError> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ParseErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<String> = self.0.iter().map(ToString::to_string).collect();
        write!(f, "{} parse error(s): {}", self.0.len(), messages.join("; "))
    }
}

impl std::error::Error for ParseErrors {}

impl From<Vec<ParseError>> for ParseErrors {
    fn from(errors: Vec<ParseError>) -> Self {
        ParseErrors(errors)
    }
}

/// Parse a domain/problem pair. Errors from both documents are reported
/// together and nothing is built if there are any.
pub fn parse(domain_text: &str, problem_text: &str) -> Result<Story, ParseErrors> {
    let domain = parse_domain(domain_text);
    let problem = parse_problem(problem_text);
    match (domain, problem) {
        (Ok(domain), Ok(problem)) => Ok(Story { domain, problem }),
        (domain, problem) => {
            let mut errors = domain.err().unwrap_or_default();
            errors.extend(problem.err().unwrap_or_default());
            Err(ParseErrors(errors))
        }
    }
}

/// Look up a section, recording a structural error if it is required and
/// absent or if it never closes.
fn section<'a>(
    text: &'a str,
    document: Document,
    marker: &'static str,
    required: bool,
    errors: &mut Vec<ParseError>,
) -> Option<&'a str> {
    match extract_section(text, marker) {
        Ok(block) => Some(section_body(block, marker)),
        Err(BlockError::NotFound) => {
            if required {
                errors.push(ParseError::MissingSection {
                    document,
                    section: marker,
                });
            }
            None
        }
        Err(BlockError::Unterminated(_)) => {
            errors.push(ParseError::Unterminated {
                document,
                section: marker.to_string(),
            });
            None
        }
    }
}

/// Name from a header such as `(domain escape-room)`.
fn header_name(text: &str, marker: &str) -> Option<String> {
    extract_section(text, marker)
        .ok()
        .and_then(|block| first_token(section_body(block, marker)))
        .map(str::to_string)
}

pub fn parse_domain(text: &str) -> Result<Domain, Vec<ParseError>> {
    let text = strip_comments(text);
    if text.trim().is_empty() {
        return Err(vec![ParseError::EmptyDocument {
            document: Document::Domain,
        }]);
    }

    let mut errors = Vec::new();
    let mut domain = Domain::new(header_name(&text, "domain"));

    if let Some(body) = section(&text, Document::Domain, ":types", false, &mut errors) {
        domain.types = typed_list(body).into_iter().map(|(name, _)| name).collect();
    }

    if let Some(body) = section(&text, Document::Domain, ":predicates", false, &mut errors) {
        domain.predicates = depth_one_groups(body)
            .into_iter()
            .filter_map(first_token)
            .map(str::to_string)
            .collect();
    }

    for (index, block) in extract_sections(&text, ":action").into_iter().enumerate() {
        let block = match block {
            Ok(block) => block,
            Err(_) => {
                errors.push(ParseError::Unterminated {
                    document: Document::Domain,
                    section: ":action".to_string(),
                });
                continue;
            }
        };
        match parse_action(block) {
            Some(schema) => {
                if domain.action(&schema.name).is_some() {
                    warn!("action '{}' is declared more than once; the last declaration wins", schema.name);
                }
                domain.insert_action(schema);
            }
            None => errors.push(ParseError::UnnamedAction { index }),
        }
    }

    if !errors.is_empty() {
        return Err(errors);
    }
    debug!(
        "parsed domain {:?}: {} actions, {} predicates, {} types",
        domain.name,
        domain.actions().len(),
        domain.predicates.len(),
        domain.types.len()
    );
    Ok(domain)
}

/// Parse one `(:action ...)` block. Returns `None` if the action has no name.
fn parse_action(block: &str) -> Option<ActionSchema> {
    let name = first_token(section_body(block, ":action"))
        .filter(|tok| !tok.starts_with(':') && !tok.starts_with('('))?;

    // The enclosing block is balanced, so any group inside it closes too.
    let parameters = extract_after(block, ":parameters")
        .map(parse_parameters)
        .unwrap_or_default();
    let precondition = extract_after(block, ":precondition")
        .map(parse_condition)
        .unwrap_or_default();
    let effect = match extract_after(block, ":effect") {
        Ok(group) => parse_effect(group),
        Err(_) => {
            warn!("action '{name}' has no :effect");
            Effect::default()
        }
    };

    Some(ActionSchema {
        name: name.to_string(),
        parameters,
        precondition,
        effect,
    })
}

/// Split a run-length typed list (`a b - t1 c - t2 d`) into `(name, type)`
/// pairs. A type applies to every untyped name since the previous one;
/// trailing names get the universal type.
fn typed_list(text: &str) -> Vec<(String, String)> {
    let mut out = Vec::new();
    let mut pending: Vec<&str> = Vec::new();
    let mut tokens = text.split_whitespace();
    while let Some(token) = tokens.next() {
        if token == "-" {
            let type_tag = tokens.next().unwrap_or(UNIVERSAL_TYPE);
            out.extend(
                pending
                    .drain(..)
                    .map(|name| (name.to_string(), type_tag.to_string())),
            );
        } else {
            pending.push(token);
        }
    }
    out.extend(
        pending
            .into_iter()
            .map(|name| (name.to_string(), UNIVERSAL_TYPE.to_string())),
    );
    out
}

/// Parse a parameter group such as `(?i - item ?from ?to - room)`.
pub fn parse_parameters(group: &str) -> Vec<Parameter> {
    typed_list(inner(group))
        .into_iter()
        .map(|(name, type_tag)| Parameter::new(name, type_tag))
        .collect()
}

/// Parse the body of an `(:objects ...)` section.
pub fn parse_objects(body: &str) -> ObjectRegistry {
    typed_list(body)
        .into_iter()
        .map(|(name, type_tag)| TypedObject::new(name, type_tag))
        .collect()
}

/// Strip a top-level `(and ...)` wrapper if present.
fn strip_conjunction(text: &str) -> &str {
    let Some(rest) = text.strip_prefix('(') else {
        return text;
    };
    let is_and = rest.trim_start().strip_prefix("and").is_some_and(|after| {
        after.is_empty() || after.starts_with(|c: char| c.is_whitespace() || c == '(' || c == ')')
    });
    if !is_and {
        return text;
    }
    match balanced_at(text, 0) {
        Ok(block) => section_body(block, "and"),
        Err(_) => text,
    }
}

/// Text after a leading `not` keyword, if the group is a negation.
fn negated(group: &str) -> Option<&str> {
    let rest = group.strip_prefix("not")?;
    (rest.is_empty() || rest.starts_with(|c: char| c.is_whitespace() || c == '(')).then_some(rest)
}

/// Split a single-level conjunction into positive and negated literals.
fn split_literals(text: &str) -> (Vec<Literal>, Vec<Literal>) {
    let mut positive = Vec::new();
    let mut negative = Vec::new();
    for group in depth_one_groups(strip_conjunction(text.trim())) {
        match negated(group) {
            Some(rest) => match depth_one_groups(rest).first().and_then(|g| Literal::parse(g)) {
                Some(literal) => negative.push(literal),
                None => warn!("dropping malformed negation '({group})'"),
            },
            None => positive.extend(Literal::parse(group)),
        }
    }
    (positive, negative)
}

/// Parse a precondition or goal.
pub fn parse_condition(text: &str) -> Condition {
    let (positive, negative) = split_literals(text);
    Condition { positive, negative }
}

/// Parse an effect; negated literals become deletes.
pub fn parse_effect(text: &str) -> Effect {
    let (add, delete) = split_literals(text);
    Effect { add, delete }
}

pub fn parse_problem(text: &str) -> Result<Problem, Vec<ParseError>> {
    let text = strip_comments(text);
    if text.trim().is_empty() {
        return Err(vec![ParseError::EmptyDocument {
            document: Document::Problem,
        }]);
    }

    let mut errors = Vec::new();
    let objects = section(&text, Document::Problem, ":objects", true, &mut errors);
    let init = section(&text, Document::Problem, ":init", true, &mut errors);
    let goal = section(&text, Document::Problem, ":goal", true, &mut errors);

    let (Some(objects), Some(init), Some(goal)) = (objects, init, goal) else {
        return Err(errors);
    };
    if !errors.is_empty() {
        return Err(errors);
    }

    let mut facts: Vec<Fact> = Vec::new();
    for group in depth_one_groups(init) {
        if negated(group).is_some() {
            warn!("ignoring negated initial fact '({group})'");
            continue;
        }
        let fact = Fact::parse(group);
        if !facts.contains(&fact) {
            facts.push(fact);
        }
    }

    let problem = Problem {
        name: header_name(&text, "problem"),
        domain_name: header_name(&text, ":domain"),
        objects: parse_objects(objects),
        init: facts,
        goal: parse_condition(goal),
    };
    debug!(
        "parsed problem {:?}: {} objects, {} initial facts, {} goal literals",
        problem.name,
        problem.objects.len(),
        problem.init.len(),
        problem.goal.positive.len() + problem.goal.negative.len()
    );
    Ok(problem)
}
