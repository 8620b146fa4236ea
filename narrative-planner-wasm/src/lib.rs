//! WASM bindings for narrative-planner — lets a web front end play and
//! validate stories.

use std::collections::BTreeMap;
use wasm_bindgen::prelude::*;

use narrative_planner::core::config::EngineConfig;
use narrative_planner::core::engine::GameEngine;
use narrative_planner::core::reachability::{check_reachable as check, SearchLimits};
use narrative_planner::core::state::SavedState;
use narrative_planner::core::validation::validate as validate_story;
use narrative_planner::schema::action::Binding;

// ---------------------------------------------------------------------------
// Embedded demo story — compiled into the WASM binary
// ---------------------------------------------------------------------------
mod data {
    pub const ESCAPE_ROOM_DOMAIN: &str = include_str!("../../stories/escape_room/domain.pddl");
    pub const ESCAPE_ROOM_PROBLEM: &str = include_str!("../../stories/escape_room/problem.pddl");
}

// ---------------------------------------------------------------------------
// JSON helper types for communication across the WASM boundary
// ---------------------------------------------------------------------------
#[derive(serde::Serialize)]
struct ReachabilityInfo {
    reachable: bool,
    message: String,
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, JsError> {
    serde_json::to_string(value).map_err(|e| JsError::new(&format!("Serialization error: {e}")))
}

/// Accepts `{"from": "cell", "?to": "corridor"}`; a leading `?` is optional.
fn parse_binding(binding_json: &str) -> Result<Binding, JsError> {
    if binding_json.trim().is_empty() {
        return Ok(Binding::new());
    }
    let pairs: BTreeMap<String, String> = serde_json::from_str(binding_json)
        .map_err(|e| JsError::new(&format!("Invalid binding JSON: {e}")))?;
    Ok(pairs.into_iter().collect())
}

// ---------------------------------------------------------------------------
// StorySession — one game in progress
// ---------------------------------------------------------------------------
#[wasm_bindgen]
pub struct StorySession {
    engine: GameEngine,
}

#[wasm_bindgen]
impl StorySession {
    /// Start a new session from domain and problem text.
    #[wasm_bindgen(constructor)]
    pub fn new(domain: &str, problem: &str) -> Result<StorySession, JsError> {
        let engine = GameEngine::builder()
            .domain(domain)
            .problem(problem)
            .build()
            .map_err(|e| JsError::new(&format!("Engine build error: {e}")))?;
        Ok(StorySession { engine })
    }

    /// Rebuild a session from text plus a state previously returned by
    /// `save`. The host can keep sessions stateless between requests.
    pub fn resume(domain: &str, problem: &str, state_json: &str) -> Result<StorySession, JsError> {
        let saved: SavedState = serde_json::from_str(state_json)
            .map_err(|e| JsError::new(&format!("Invalid state JSON: {e}")))?;
        let engine = GameEngine::builder()
            .domain(domain)
            .problem(problem)
            .with_saved_state(saved)
            .build()
            .map_err(|e| JsError::new(&format!("Engine build error: {e}")))?;
        Ok(StorySession { engine })
    }

    /// The bundled escape-room story.
    pub fn demo() -> Result<StorySession, JsError> {
        StorySession::new(data::ESCAPE_ROOM_DOMAIN, data::ESCAPE_ROOM_PROBLEM)
    }

    /// Reset to the initial facts. Returns the opening turn as JSON.
    pub fn initialize(&mut self) -> Result<String, JsError> {
        to_json(&self.engine.initialize())
    }

    /// JSON array of available actions. A `limit` of 0 means no limit.
    pub fn available_actions(&self, limit: usize) -> Result<String, JsError> {
        to_json(&self.engine.list_available_actions(non_zero(limit)))
    }

    /// Execute an action with a JSON object binding. Returns the turn report.
    pub fn execute(&mut self, action: &str, binding_json: &str, limit: usize) -> Result<String, JsError> {
        let binding = parse_binding(binding_json)?;
        let turn = self
            .engine
            .execute_action(action, &binding, non_zero(limit))
            .map_err(|e| JsError::new(&format!("Execution error: {e}")))?;
        to_json(&turn)
    }

    /// Current turn report without changing anything.
    pub fn current_state(&self, limit: usize) -> Result<String, JsError> {
        to_json(&self.engine.current_state(non_zero(limit)))
    }

    pub fn history(&self) -> Result<String, JsError> {
        to_json(&self.engine.history())
    }

    pub fn is_goal_reached(&self) -> bool {
        self.engine.is_goal_reached()
    }

    pub fn is_dead_end(&self) -> bool {
        self.engine.is_dead_end()
    }

    /// Serialize the session state as JSON.
    pub fn save(&self) -> Result<String, JsError> {
        to_json(&self.engine.serialize_state())
    }

    pub fn restore(&mut self, state_json: &str) -> Result<(), JsError> {
        let saved: SavedState = serde_json::from_str(state_json)
            .map_err(|e| JsError::new(&format!("Invalid state JSON: {e}")))?;
        self.engine.restore_state(saved);
        Ok(())
    }
}

fn non_zero(limit: usize) -> Option<usize> {
    (limit > 0).then_some(limit)
}

/// Check whether the goal is reachable. Returns `{"reachable", "message"}`.
#[wasm_bindgen]
pub fn check_reachable(
    domain: &str,
    problem: &str,
    max_depth: usize,
    max_states: usize,
) -> Result<String, JsError> {
    let limits = SearchLimits {
        max_depth,
        max_explored_states: max_states,
    };
    let result = check(domain, problem, limits).map_err(|e| JsError::new(&e.to_string()))?;
    to_json(&ReachabilityInfo {
        reachable: result.reachable(),
        message: result.message,
    })
}

/// Full validation report as JSON.
#[wasm_bindgen]
pub fn validate(domain: &str, problem: &str) -> Result<String, JsError> {
    to_json(&validate_story(domain, problem, &EngineConfig::default()))
}
