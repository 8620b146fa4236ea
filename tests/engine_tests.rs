/// Engine integration tests — playing bundled stories end to end.

use narrative_planner::core::engine::{EngineError, GameEngine};
use narrative_planner::core::grounding::{applicable_actions, GroundingOptions};
use narrative_planner::core::parser::parse;
use narrative_planner::core::state::{GameState, SavedState, WorldState};
use narrative_planner::schema::action::Binding;
use narrative_planner::schema::literal::Fact;

fn escape_room() -> GameEngine {
    GameEngine::builder()
        .domain_file("stories/escape_room/domain.pddl")
        .problem_file("stories/escape_room/problem.pddl")
        .build()
        .unwrap()
}

fn bind(pairs: &[(&str, &str)]) -> Binding {
    pairs.iter().copied().collect()
}

#[test]
fn escape_room_walkthrough_reaches_goal_at_step_five() {
    let mut engine = escape_room();
    let opening = engine.initialize();
    assert_eq!(opening.step, 0);
    assert_eq!(opening.facts.len(), 9);
    assert_eq!(opening.available_actions.len(), 1);
    assert_eq!(opening.available_actions[0].id, "pickup(i=key,r=cell)");

    let plan = [
        ("pickup", bind(&[("i", "key"), ("r", "cell")])),
        ("unlock-door", bind(&[("i", "key"), ("from", "cell"), ("to", "corridor")])),
        ("move", bind(&[("from", "cell"), ("to", "corridor")])),
        ("move", bind(&[("from", "corridor"), ("to", "exit")])),
        ("escape", bind(&[("r", "exit")])),
    ];

    let mut last = None;
    for (step, (name, binding)) in plan.iter().enumerate() {
        let turn = engine.execute_action(name, binding, None).unwrap();
        assert_eq!(turn.step as usize, step + 1);
        assert_eq!(turn.goal_reached, step == plan.len() - 1, "after {name}");
        last = Some(turn);
    }

    let last = last.unwrap();
    assert!(last.goal_reached);
    assert!(!last.dead_end);
    assert!(last.available_actions.is_empty());
    assert!(last.facts.contains(&Fact::parse("escaped")));
    assert!(engine.is_goal_reached());
    assert_eq!(engine.history().len(), 5);
    assert_eq!(engine.history()[4].action, "escape");
}

#[test]
fn unlock_door_display_hints() {
    let mut engine = escape_room();
    engine
        .execute_action("pickup", &bind(&[("i", "key"), ("r", "cell")]), None)
        .unwrap();
    let actions = engine.list_available_actions(None);
    assert_eq!(actions.len(), 1);
    assert_eq!(actions[0].display_text, "Unlock-Door (key, cell, corridor)");
    assert_eq!(actions[0].description, "Unlock-door with key, cell, corridor");
    assert_eq!(actions[0].id, "unlock-door(from=cell,i=key,to=corridor)");
}

#[test]
fn round_trip_move_is_annotated_as_revisit() {
    let mut engine = escape_room();
    engine
        .execute_action("pickup", &bind(&[("i", "key"), ("r", "cell")]), None)
        .unwrap();
    engine
        .execute_action(
            "unlock-door",
            &bind(&[("i", "key"), ("from", "cell"), ("to", "corridor")]),
            None,
        )
        .unwrap();
    let before_round_trip = engine.state().facts().signature();

    let turn = engine
        .execute_action("move", &bind(&[("from", "cell"), ("to", "corridor")]), None)
        .unwrap();
    let back = turn
        .available_actions
        .iter()
        .find(|a| a.id == "move(from=corridor,to=cell)")
        .unwrap();
    assert!(back.revisits);
    let forward = turn
        .available_actions
        .iter()
        .find(|a| a.id == "move(from=corridor,to=exit)")
        .unwrap();
    assert!(!forward.revisits);
    assert_eq!(turn.available_actions.last().map(|a| a.revisits), Some(true));

    engine
        .execute_action("move", &bind(&[("from", "corridor"), ("to", "cell")]), None)
        .unwrap();
    assert_eq!(engine.state().facts().signature(), before_round_trip);
}

#[test]
fn round_trip_returns_to_initial_signature() {
    let mut engine = GameEngine::builder()
        .domain_file("stories/simple_adventure/domain.pddl")
        .problem_file("stories/simple_adventure/problem.pddl")
        .build()
        .unwrap();
    let initial = engine.state().facts().signature();

    let turn = engine
        .execute_action("move", &bind(&[("from", "room1"), ("to", "room2")]), None)
        .unwrap();
    let back = turn
        .available_actions
        .iter()
        .find(|a| a.id == "move(from=room2,to=room1)")
        .unwrap();
    assert!(back.revisits);

    engine
        .execute_action("move", &bind(&[("from", "room2"), ("to", "room1")]), None)
        .unwrap();
    assert_eq!(engine.state().facts().signature(), initial);
}

const TRAP_DOMAIN: &str = "(define (domain trap)
    (:action step-forward
      :parameters ()
      :precondition (and (at start))
      :effect (and (at middle) (not (at start))))
    (:action fall
      :parameters ()
      :precondition (and (at middle))
      :effect (and (in-pit) (not (at middle))))
    (:action climb-out
      :parameters ()
      :precondition (and (at middle))
      :effect (and (free) (not (at middle)))))";

const TRAP_PROBLEM: &str = "(define (problem trap-1) (:domain trap)
    (:objects nobody)
    (:init (at start))
    (:goal (and (free))))";

#[test]
fn dead_end_is_reported() {
    let mut engine = GameEngine::builder()
        .domain(TRAP_DOMAIN)
        .problem(TRAP_PROBLEM)
        .build()
        .unwrap();

    let turn = engine.execute_action("step-forward", &Binding::new(), None).unwrap();
    assert!(!turn.dead_end);
    assert_eq!(turn.available_actions.len(), 2);

    let turn = engine.execute_action("fall", &Binding::new(), None).unwrap();
    assert!(turn.dead_end);
    assert!(!turn.goal_reached);
    assert!(turn.available_actions.is_empty());
    assert!(engine.is_dead_end());
}

#[test]
fn dead_end_matches_empty_applicable_set() {
    let story = parse(TRAP_DOMAIN, TRAP_PROBLEM).unwrap();
    let pit: WorldState = ["in-pit"].into_iter().collect();
    assert!(applicable_actions(
        story.domain.actions(),
        &pit,
        &story.problem.objects,
        &GroundingOptions::default()
    )
    .is_empty());
}

#[test]
fn rejected_actions_do_not_touch_state() {
    let mut engine = escape_room();
    let before = engine.serialize_state();

    let err = engine
        .execute_action("move", &bind(&[("from", "cell"), ("to", "corridor")]), None)
        .unwrap_err();
    assert!(matches!(err, EngineError::PreconditionNotSatisfied { .. }));
    assert!(err.to_string().contains("from=cell,to=corridor"));

    let err = engine.execute_action("teleport", &Binding::new(), None).unwrap_err();
    assert_eq!(err.to_string(), "unknown action: teleport");

    assert_eq!(engine.serialize_state(), before);
}

#[test]
fn effects_apply_all_or_nothing() {
    let mut engine = escape_room();
    engine
        .execute_action("pickup", &bind(&[("i", "key"), ("r", "cell")]), None)
        .unwrap();
    let turn = engine
        .execute_action(
            "unlock-door",
            &bind(&[("i", "key"), ("from", "cell"), ("to", "corridor")]),
            None,
        )
        .unwrap();
    assert!(!turn.facts.contains(&Fact::parse("door-locked cell corridor")));
    assert!(!turn.facts.contains(&Fact::parse("door-locked corridor cell")));
    assert!(turn.facts.contains(&Fact::parse("has key")));
    assert!(!turn.facts.contains(&Fact::parse("at-item key cell")));
}

#[test]
fn stateless_resume_between_requests() {
    let mut first = escape_room();
    first
        .execute_action("pickup", &bind(&[("i", "key"), ("r", "cell")]), None)
        .unwrap();
    let saved = first.serialize_state();
    let text = GameState::from_saved(saved.clone()).to_ron().unwrap();
    drop(first);

    let restored: SavedState = GameState::from_ron(&text).unwrap().to_saved();
    let mut second = GameEngine::builder()
        .domain_file("stories/escape_room/domain.pddl")
        .problem_file("stories/escape_room/problem.pddl")
        .with_saved_state(restored)
        .build()
        .unwrap();
    assert_eq!(second.serialize_state(), saved);
    assert_eq!(second.state().step_count(), 1);

    let turn = second
        .execute_action(
            "unlock-door",
            &bind(&[("i", "key"), ("from", "cell"), ("to", "corridor")]),
            None,
        )
        .unwrap();
    assert_eq!(turn.step, 2);
}

#[test]
fn missing_story_file_is_io_error() {
    let result = GameEngine::builder()
        .domain_file("stories/nowhere/domain.pddl")
        .problem_file("stories/escape_room/problem.pddl")
        .build();
    assert!(matches!(result, Err(EngineError::Io(_))));
}
