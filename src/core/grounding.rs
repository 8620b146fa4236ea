/// Grounding — enumerating type-compatible bindings and applicable actions.
///
/// Binding enumeration is a Cartesian product over per-parameter candidate
/// sets. `applicable_actions` walks that product depth-first and checks each
/// precondition literal as soon as all of its variables are bound, so dead
/// prefixes are never completed.

use log::{trace, warn};
use serde::{Deserialize, Serialize};

use crate::core::evaluator::evaluate_precondition;
use crate::core::parser::ParseError;
use crate::core::state::WorldState;
use crate::schema::action::{ActionSchema, Binding, GroundAction, Parameter};
use crate::schema::literal::Literal;
use crate::schema::object::ObjectRegistry;
use crate::schema::story::Domain;

/// What to do when no object carries a parameter's declared type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypeFallback {
    /// Use every object in the registry.
    #[default]
    Permissive,
    /// Offer no candidates; engine construction reports the parameter.
    Strict,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroundingOptions {
    #[serde(default)]
    pub type_fallback: TypeFallback,
    /// Stop grounding a schema after this many applicable bindings.
    #[serde(default)]
    pub max_bindings_per_schema: Option<usize>,
}

/// Candidate objects for one parameter.
pub fn candidates<'a>(
    parameter: &Parameter,
    objects: &'a ObjectRegistry,
    fallback: TypeFallback,
) -> Vec<&'a str> {
    if parameter.is_universal() {
        return objects.names().collect();
    }
    let typed = objects.of_type(&parameter.type_tag);
    if !typed.is_empty() {
        return typed;
    }
    match fallback {
        TypeFallback::Permissive => {
            trace!(
                "no objects of type '{}' for ?{}; using all objects",
                parameter.type_tag,
                parameter.name
            );
            objects.names().collect()
        }
        TypeFallback::Strict => Vec::new(),
    }
}

/// Every total binding over `parameters`, earlier parameters varying
/// slowest. The result size is the product of the candidate-set sizes.
pub fn enumerate_bindings(
    parameters: &[Parameter],
    objects: &ObjectRegistry,
    fallback: TypeFallback,
) -> Vec<Binding> {
    let mut bindings = vec![Binding::new()];
    for parameter in parameters {
        let options = candidates(parameter, objects, fallback);
        bindings = bindings
            .iter()
            .flat_map(|partial| options.iter().map(move |obj| partial.with(&parameter.name, *obj)))
            .collect();
    }
    bindings
}

/// Result of grounding one schema.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaGrounding {
    pub bindings: Vec<Binding>,
    /// True if `max_bindings_per_schema` cut the enumeration short.
    pub truncated: bool,
}

/// A precondition literal tagged with its polarity.
struct Check<'a> {
    literal: &'a Literal,
    positive: bool,
}

/// Bucket precondition literals by the depth at which they become ground:
/// index 0 holds literals without variables, index `i + 1` those whose last
/// variable is parameter `i`. Literals naming unknown variables go last.
fn schedule(schema: &ActionSchema) -> Vec<Vec<Check<'_>>> {
    let arity = schema.parameters.len();
    let mut levels: Vec<Vec<Check<'_>>> = (0..=arity).map(|_| Vec::new()).collect();
    let polarised = schema
        .precondition
        .positive
        .iter()
        .map(|literal| (literal, true))
        .chain(schema.precondition.negative.iter().map(|literal| (literal, false)));
    for (literal, positive) in polarised {
        let mut level = 0;
        for var in literal.variables() {
            let position = schema
                .parameters
                .iter()
                .position(|p| p.name == var)
                .map_or(arity, |idx| idx + 1);
            level = level.max(position);
        }
        levels[level].push(Check { literal, positive });
    }
    levels
}

fn passes(checks: &[Check<'_>], state: &WorldState, binding: &Binding) -> bool {
    checks
        .iter()
        .all(|check| state.contains(&check.literal.ground(binding)) == check.positive)
}

/// Applicable bindings of one schema in `state`, pruning partial bindings
/// as soon as a fully-bound literal fails.
pub fn ground_schema(
    schema: &ActionSchema,
    state: &WorldState,
    objects: &ObjectRegistry,
    options: &GroundingOptions,
) -> SchemaGrounding {
    let levels = schedule(schema);
    let domains: Vec<Vec<&str>> = schema
        .parameters
        .iter()
        .map(|p| candidates(p, objects, options.type_fallback))
        .collect();

    let mut out = SchemaGrounding::default();
    if !passes(&levels[0], state, &Binding::new()) {
        return out;
    }

    // Explicit DFS stack of (depth, partial binding).
    let mut stack = vec![(0usize, Binding::new())];
    while let Some((depth, partial)) = stack.pop() {
        if depth == schema.parameters.len() {
            if options
                .max_bindings_per_schema
                .is_some_and(|cap| out.bindings.len() >= cap)
            {
                out.truncated = true;
                break;
            }
            out.bindings.push(partial);
            continue;
        }
        let parameter = &schema.parameters[depth];
        // Push in reverse so the first candidate is expanded first.
        for obj in domains[depth].iter().rev() {
            let extended = partial.with(&parameter.name, *obj);
            if passes(&levels[depth + 1], state, &extended) {
                stack.push((depth + 1, extended));
            }
        }
    }

    if out.truncated {
        warn!(
            "grounding of '{}' truncated at {} bindings",
            schema.name,
            out.bindings.len()
        );
    }
    out
}

/// Applicable ground actions of a whole domain in one state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Grounding {
    pub actions: Vec<GroundAction>,
    /// True if any schema hit `max_bindings_per_schema`.
    pub truncated: bool,
}

/// Ground every schema in `state`, keeping track of whether the per-schema
/// cap dropped any applicable binding.
pub fn ground_all(
    schemas: &[ActionSchema],
    state: &WorldState,
    objects: &ObjectRegistry,
    options: &GroundingOptions,
) -> Grounding {
    let mut out = Grounding::default();
    for schema in schemas {
        let grounded = ground_schema(schema, state, objects, options);
        out.truncated |= grounded.truncated;
        out.actions.extend(
            grounded
                .bindings
                .into_iter()
                .map(|binding| GroundAction::new(schema.name.clone(), binding)),
        );
    }
    out
}

/// Every applicable ground action in `state`, schemas in declaration order
/// and bindings in enumeration order.
pub fn applicable_actions(
    schemas: &[ActionSchema],
    state: &WorldState,
    objects: &ObjectRegistry,
    options: &GroundingOptions,
) -> Vec<GroundAction> {
    ground_all(schemas, state, objects, options).actions
}

/// Reference implementation: full enumeration followed by filtering.
pub fn applicable_actions_unpruned(
    schemas: &[ActionSchema],
    state: &WorldState,
    objects: &ObjectRegistry,
    fallback: TypeFallback,
) -> Vec<GroundAction> {
    schemas
        .iter()
        .flat_map(|schema| {
            enumerate_bindings(&schema.parameters, objects, fallback)
                .into_iter()
                .filter(|binding| evaluate_precondition(&schema.precondition, state, binding))
                .map(|binding| GroundAction::new(schema.name.clone(), binding))
        })
        .collect()
}

/// Parameters whose declared type has no objects at all. Under
/// [`TypeFallback::Strict`] these are construction errors.
pub fn unsatisfiable_parameters(domain: &Domain, objects: &ObjectRegistry) -> Vec<ParseError> {
    domain
        .actions()
        .iter()
        .flat_map(|schema| {
            schema
                .parameters
                .iter()
                .filter(|p| !p.is_universal() && !objects.has_type(&p.type_tag))
                .map(|p| ParseError::UnsatisfiableType {
                    action: schema.name.clone(),
                    parameter: p.name.clone(),
                    type_tag: p.type_tag.clone(),
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::parser::{parse_domain, parse_objects};
    use crate::schema::object::TypedObject;

    const DOMAIN: &str = "(define (domain d)
        (:action move
          :parameters (?from - room ?to - room)
          :precondition (and (at ?from) (door ?from ?to) (not (locked ?from ?to)))
          :effect (and (at ?to) (not (at ?from))))
        (:action take
          :parameters (?i - item ?r - room)
          :precondition (and (at ?r) (item-at ?i ?r))
          :effect (and (has ?i) (not (item-at ?i ?r))))
        (:action wave
          :parameters (?x)
          :precondition (and)
          :effect (waved ?x)))";

    fn objects() -> ObjectRegistry {
        parse_objects("cell corridor exit - room key - item")
    }

    fn world(facts: &[&str]) -> WorldState {
        facts.iter().copied().collect()
    }

    #[test]
    fn candidates_by_type() {
        let objs = objects();
        let room = Parameter::new("r", "room");
        let any = Parameter::new("x", "object");
        assert_eq!(candidates(&room, &objs, TypeFallback::Strict), vec!["cell", "corridor", "exit"]);
        assert_eq!(candidates(&any, &objs, TypeFallback::Strict).len(), 4);
    }

    #[test]
    fn missing_type_follows_policy() {
        let objs = objects();
        let weapon = Parameter::new("w", "weapon");
        assert_eq!(candidates(&weapon, &objs, TypeFallback::Permissive).len(), 4);
        assert!(candidates(&weapon, &objs, TypeFallback::Strict).is_empty());
    }

    #[test]
    fn enumerate_is_a_cartesian_product() {
        let objs = objects();
        let params = vec![Parameter::new("i", "item"), Parameter::new("r", "room")];
        let bindings = enumerate_bindings(&params, &objs, TypeFallback::Permissive);
        assert_eq!(bindings.len(), 3);
        assert_eq!(bindings[0], Binding::new().with("i", "key").with("r", "cell"));
        assert_eq!(bindings[2], Binding::new().with("i", "key").with("r", "exit"));
        assert_eq!(enumerate_bindings(&[], &objs, TypeFallback::Permissive), vec![Binding::new()]);
    }

    #[test]
    fn applicable_actions_filters_by_precondition() {
        let domain = parse_domain(DOMAIN).unwrap();
        let state = world(&[
            "at cell",
            "door cell corridor",
            "door cell exit",
            "locked cell exit",
            "item-at key cell",
        ]);
        let actions = applicable_actions(domain.actions(), &state, &objects(), &GroundingOptions::default());
        let keys: Vec<String> = actions.iter().map(GroundAction::key).collect();
        assert_eq!(
            keys,
            vec![
                "move(from=cell,to=corridor)",
                "take(i=key,r=cell)",
                "wave(x=cell)",
                "wave(x=corridor)",
                "wave(x=exit)",
                "wave(x=key)",
            ]
        );
    }

    #[test]
    fn pruned_matches_full_enumeration() {
        let domain = parse_domain(DOMAIN).unwrap();
        let states = [
            world(&["at cell", "door cell corridor", "item-at key cell"]),
            world(&["at corridor", "door corridor exit", "door corridor cell", "locked corridor cell"]),
            world(&[]),
        ];
        for state in &states {
            assert_eq!(
                applicable_actions(domain.actions(), state, &objects(), &GroundingOptions::default()),
                applicable_actions_unpruned(domain.actions(), state, &objects(), TypeFallback::Permissive)
            );
        }
    }

    #[test]
    fn cap_truncates_per_schema() {
        let domain = parse_domain(DOMAIN).unwrap();
        let options = GroundingOptions {
            max_bindings_per_schema: Some(2),
            ..GroundingOptions::default()
        };
        let wave = domain.action("wave").unwrap();
        let grounding = ground_schema(wave, &WorldState::new(), &objects(), &options);
        assert_eq!(grounding.bindings.len(), 2);
        assert!(grounding.truncated);

        let options = GroundingOptions {
            max_bindings_per_schema: Some(4),
            ..GroundingOptions::default()
        };
        let grounding = ground_schema(wave, &WorldState::new(), &objects(), &options);
        assert_eq!(grounding.bindings.len(), 4);
        assert!(!grounding.truncated);
    }

    #[test]
    fn ground_all_reports_truncation() {
        let domain = parse_domain(DOMAIN).unwrap();
        let state = world(&["at cell", "door cell corridor", "item-at key cell"]);
        let full = ground_all(domain.actions(), &state, &objects(), &GroundingOptions::default());
        assert!(!full.truncated);
        assert_eq!(full.actions.len(), 6);

        let capped = GroundingOptions {
            max_bindings_per_schema: Some(1),
            ..GroundingOptions::default()
        };
        let grounding = ground_all(domain.actions(), &state, &objects(), &capped);
        assert!(grounding.truncated);
        assert_eq!(grounding.actions.len(), 3);
    }

    #[test]
    fn unsatisfiable_parameters_are_listed() {
        let domain = parse_domain(DOMAIN).unwrap();
        let objs: ObjectRegistry = vec![TypedObject::new("cell", "room")].into();
        let errors = unsatisfiable_parameters(&domain, &objs);
        assert_eq!(
            errors,
            vec![ParseError::UnsatisfiableType {
                action: "take".to_string(),
                parameter: "i".to_string(),
                type_tag: "item".to_string(),
            }]
        );
    }
}
