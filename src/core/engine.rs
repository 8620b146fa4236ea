/// The game engine: planning text → playable state machine.
///
/// Wires together parsing, grounding, evaluation and the per-session
/// [`GameState`]. One engine serves one session; concurrent use must be
/// serialized by the caller.

use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::config::{ConfigError, EngineConfig};
use crate::core::evaluator::{evaluate_precondition, is_satisfied, simulate_effect};
use crate::core::grounding::{applicable_actions, unsatisfiable_parameters, TypeFallback};
use crate::core::parser::{parse, ParseErrors};
use crate::core::state::{GameState, HistoryEntry, SavedState, WorldState};
use crate::schema::action::{ActionSchema, Binding, GroundAction};
use crate::schema::literal::Fact;
use crate::schema::story::Story;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Parse(#[from] ParseErrors),
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("unknown action: {0}")]
    UnknownAction(String),
    #[error("precondition of '{action}' not satisfied for {binding}")]
    PreconditionNotSatisfied { action: String, binding: Binding },
}

/// An applicable action as offered to a player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailableAction {
    /// Canonical identifier, stable across runs.
    pub id: String,
    pub action: String,
    pub binding: Binding,
    /// Taking this action leads back to an already visited state.
    pub revisits: bool,
    pub display_text: String,
    pub description: String,
}

/// Snapshot returned after initialization and after each executed action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnReport {
    pub step: u32,
    pub facts: Vec<Fact>,
    pub goal_reached: bool,
    /// No actions remain and the goal does not hold.
    pub dead_end: bool,
    pub available_actions: Vec<AvailableAction>,
}

pub struct GameEngine {
    story: Story,
    config: EngineConfig,
    state: GameState,
}

/// Builder for constructing a `GameEngine`.
#[derive(Default)]
pub struct GameEngineBuilder {
    domain_text: Option<String>,
    problem_text: Option<String>,
    domain_path: Option<PathBuf>,
    problem_path: Option<PathBuf>,
    config_path: Option<PathBuf>,
    /// Directly provided config (for testing without files).
    config: Option<EngineConfig>,
    /// Already parsed story; skips parsing entirely.
    story: Option<Story>,
    /// State to resume from instead of the problem's initial facts.
    saved: Option<SavedState>,
}

impl GameEngine {
    pub fn builder() -> GameEngineBuilder {
        GameEngineBuilder::default()
    }

    pub fn story(&self) -> &Story {
        &self.story
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn history(&self) -> &[HistoryEntry] {
        self.state.history()
    }

    /// Reset to the problem's initial facts and report the opening turn.
    pub fn initialize(&mut self) -> TurnReport {
        self.state = GameState::new(initial_world(&self.story));
        info!(
            "initialized story {:?} with {} facts",
            self.story.problem.name,
            self.state.facts().len()
        );
        self.report(None)
    }

    /// Applicable actions, those leading to unvisited states first, cut to
    /// `limit` (or the configured default) if given.
    pub fn list_available_actions(&self, limit: Option<usize>) -> Vec<AvailableAction> {
        let mut actions = self.annotated_actions();
        if let Some(limit) = limit.or(self.config.action_limit) {
            actions.truncate(limit);
        }
        actions
    }

    /// Check the caller's binding against the current state and apply the
    /// action's effect. On error the game state is untouched.
    pub fn execute_action(
        &mut self,
        name: &str,
        binding: &Binding,
        limit: Option<usize>,
    ) -> Result<TurnReport, EngineError> {
        let schema = self
            .story
            .domain
            .action(name)
            .ok_or_else(|| EngineError::UnknownAction(name.to_string()))?;
        if !evaluate_precondition(&schema.precondition, self.state.facts(), binding) {
            return Err(EngineError::PreconditionNotSatisfied {
                action: name.to_string(),
                binding: binding.clone(),
            });
        }

        let next = simulate_effect(&schema.effect, binding, self.state.facts());
        self.state.advance(next, name, binding);
        debug!("step {}: {} {}", self.state.step_count(), name, binding);

        let report = self.report(limit);
        if report.goal_reached {
            info!("goal reached after {} steps", report.step);
        } else if report.dead_end {
            info!("dead end reached after {} steps", report.step);
        }
        Ok(report)
    }

    pub fn is_goal_reached(&self) -> bool {
        is_satisfied(&self.story.problem.goal, self.state.facts())
    }

    /// The goal does not hold and no action is applicable.
    pub fn is_dead_end(&self) -> bool {
        !self.is_goal_reached() && self.ground_actions().is_empty()
    }

    /// Report on the current state without changing anything.
    pub fn current_state(&self, limit: Option<usize>) -> TurnReport {
        self.report(limit)
    }

    pub fn serialize_state(&self) -> SavedState {
        self.state.to_saved()
    }

    pub fn restore_state(&mut self, saved: SavedState) {
        self.state = GameState::from_saved(saved);
    }

    fn ground_actions(&self) -> Vec<GroundAction> {
        applicable_actions(
            self.story.domain.actions(),
            self.state.facts(),
            &self.story.problem.objects,
            &self.config.grounding,
        )
    }

    fn annotated_actions(&self) -> Vec<AvailableAction> {
        let mut fresh = Vec::new();
        let mut revisiting = Vec::new();
        for ground in self.ground_actions() {
            let Some(schema) = self.story.domain.action(&ground.action) else {
                continue;
            };
            let next = simulate_effect(&schema.effect, &ground.binding, self.state.facts());
            let revisits = self.state.has_visited(&next.signature());
            let action = describe(schema, ground, revisits);
            if revisits {
                revisiting.push(action);
            } else {
                fresh.push(action);
            }
        }
        fresh.extend(revisiting);
        fresh
    }

    fn report(&self, limit: Option<usize>) -> TurnReport {
        let goal_reached = self.is_goal_reached();
        let (available_actions, dead_end) = if goal_reached {
            (Vec::new(), false)
        } else {
            let mut actions = self.annotated_actions();
            let dead_end = actions.is_empty();
            if let Some(limit) = limit.or(self.config.action_limit) {
                actions.truncate(limit);
            }
            (actions, dead_end)
        };
        TurnReport {
            step: self.state.step_count(),
            facts: self.state.facts().sorted(),
            goal_reached,
            dead_end,
            available_actions,
        }
    }
}

fn initial_world(story: &Story) -> WorldState {
    story.problem.init.iter().cloned().collect()
}

/// `unlock-door` → `Unlock-Door`, `pick_up` → `Pick Up`.
fn title_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut boundary = true;
    for c in name.replace('_', " ").chars() {
        if c.is_alphabetic() {
            if boundary {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            boundary = false;
        } else {
            out.push(c);
            boundary = true;
        }
    }
    out
}

fn capitalize(name: &str) -> String {
    let lowered = name.replace('_', " ").to_lowercase();
    let mut chars = lowered.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn describe(schema: &ActionSchema, ground: GroundAction, revisits: bool) -> AvailableAction {
    let objects = schema.bound_objects(&ground.binding).join(", ");
    let (display_text, description) = if objects.is_empty() {
        (title_case(&schema.name), capitalize(&schema.name))
    } else {
        (
            format!("{} ({objects})", title_case(&schema.name)),
            format!("{} with {objects}", capitalize(&schema.name)),
        )
    };
    AvailableAction {
        id: ground.key(),
        action: ground.action,
        binding: ground.binding,
        revisits,
        display_text,
        description,
    }
}

impl GameEngineBuilder {
    pub fn domain(mut self, text: &str) -> Self {
        self.domain_text = Some(text.to_string());
        self
    }

    pub fn problem(mut self, text: &str) -> Self {
        self.problem_text = Some(text.to_string());
        self
    }

    pub fn domain_file(mut self, path: impl AsRef<Path>) -> Self {
        self.domain_path = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn problem_file(mut self, path: impl AsRef<Path>) -> Self {
        self.problem_path = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn config_file(mut self, path: impl AsRef<Path>) -> Self {
        self.config_path = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn with_story(mut self, story: Story) -> Self {
        self.story = Some(story);
        self
    }

    pub fn with_saved_state(mut self, saved: SavedState) -> Self {
        self.saved = Some(saved);
        self
    }

    pub fn build(self) -> Result<GameEngine, EngineError> {
        let config = match self.config_path {
            Some(ref path) => EngineConfig::load_from_ron(path)?,
            None => self.config.unwrap_or_default(),
        };

        let story = match self.story {
            Some(story) => story,
            None => {
                let domain = read_text(self.domain_text, self.domain_path.as_deref())?;
                let problem = read_text(self.problem_text, self.problem_path.as_deref())?;
                parse(&domain, &problem)?
            }
        };

        if config.grounding.type_fallback == TypeFallback::Strict {
            let errors = unsatisfiable_parameters(&story.domain, &story.problem.objects);
            if !errors.is_empty() {
                return Err(EngineError::Parse(ParseErrors(errors)));
            }
        }

        let state = match self.saved {
            Some(saved) => GameState::from_saved(saved),
            None => GameState::new(initial_world(&story)),
        };

        info!(
            "engine built for story {:?}: {} actions, {} objects",
            story.problem.name,
            story.domain.actions().len(),
            story.problem.objects.len()
        );
        Ok(GameEngine {
            story,
            config,
            state,
        })
    }
}

/// Inline text wins over a file path; neither yields empty text, which the
/// parser reports.
fn read_text(text: Option<String>, path: Option<&Path>) -> Result<String, std::io::Error> {
    match (text, path) {
        (Some(text), _) => Ok(text),
        (None, Some(path)) => std::fs::read_to_string(path),
        (None, None) => Ok(String::new()),
    }
}
