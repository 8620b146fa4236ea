/// State evaluation — literal grounding, condition checks and effect
/// simulation. Everything here is pure: inputs are borrowed and never
/// modified.

use crate::core::state::WorldState;
use crate::schema::action::Binding;
use crate::schema::literal::{Condition, Effect, Fact, Literal};

/// Substitute a binding into a lifted literal.
pub fn ground_literal(literal: &Literal, binding: &Binding) -> Fact {
    literal.ground(binding)
}

/// True if every positive literal is present and every negative literal is
/// absent once grounded with `binding`. Stops at the first failure.
pub fn evaluate_precondition(condition: &Condition, state: &WorldState, binding: &Binding) -> bool {
    condition
        .positive
        .iter()
        .all(|lit| state.contains(&lit.ground(binding)))
        && condition
            .negative
            .iter()
            .all(|lit| !state.contains(&lit.ground(binding)))
}

/// Goal check: the goal's arguments are already object names.
pub fn is_satisfied(goal: &Condition, state: &WorldState) -> bool {
    evaluate_precondition(goal, state, &Binding::new())
}

/// Copy `state`, add the grounded add list, then remove the grounded delete
/// list. The original state is left untouched.
pub fn simulate_effect(effect: &Effect, binding: &Binding, state: &WorldState) -> WorldState {
    let mut next = state.clone();
    for lit in &effect.add {
        next.insert(lit.ground(binding));
    }
    for lit in &effect.delete {
        next.remove(&lit.ground(binding));
    }
    next
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::parser::{parse_condition, parse_effect};

    fn world(facts: &[&str]) -> WorldState {
        facts.iter().copied().collect()
    }

    #[test]
    fn positive_and_negative_literals() {
        let cond = parse_condition("(and (at ?r) (not (door-locked ?r ?to)))");
        let state = world(&["at cell", "door-locked cell corridor"]);

        let locked = Binding::new().with("r", "cell").with("to", "corridor");
        let open = Binding::new().with("r", "cell").with("to", "exit");
        assert!(!evaluate_precondition(&cond, &state, &locked));
        assert!(evaluate_precondition(&cond, &state, &open));
    }

    #[test]
    fn evaluation_is_pure() {
        let cond = parse_condition("(and (at ?r))");
        let state = world(&["at cell"]);
        let binding = Binding::new().with("r", "cell");
        let before = state.clone();

        let first = evaluate_precondition(&cond, &state, &binding);
        let second = evaluate_precondition(&cond, &state, &binding);
        assert_eq!(first, second);
        assert_eq!(state, before);
        assert_eq!(binding.len(), 1);
    }

    #[test]
    fn empty_condition_always_holds() {
        assert!(is_satisfied(&Condition::default(), &WorldState::new()));
    }

    #[test]
    fn goal_with_negation() {
        let goal = parse_condition("(and (escaped) (not (at cell)))");
        assert!(is_satisfied(&goal, &world(&["escaped", "at exit"])));
        assert!(!is_satisfied(&goal, &world(&["escaped", "at cell"])));
    }

    #[test]
    fn simulate_effect_leaves_original() {
        let effect = parse_effect("(and (at ?to) (not (at ?from)))");
        let binding = Binding::new().with("from", "cell").with("to", "corridor");
        let state = world(&["at cell", "has key"]);

        let next = simulate_effect(&effect, &binding, &state);
        assert_eq!(next, world(&["at corridor", "has key"]));
        assert_eq!(state, world(&["at cell", "has key"]));
    }

    #[test]
    fn delete_wins_over_add_of_same_fact() {
        let effect = parse_effect("(and (lit ?x) (not (lit ?x)))");
        let binding = Binding::new().with("x", "lamp");
        let next = simulate_effect(&effect, &binding, &world(&["lit lamp"]));
        assert!(!next.contains(&Fact::parse("lit lamp")));
    }

    #[test]
    fn ground_literal_substitutes() {
        let lit = Literal::parse("unlocks ?i ?from ?to").unwrap();
        let binding: Binding = [("i", "key"), ("from", "cell"), ("to", "corridor")]
            .into_iter()
            .collect();
        assert_eq!(ground_literal(&lit, &binding), Fact::parse("unlocks key cell corridor"));
    }
}
