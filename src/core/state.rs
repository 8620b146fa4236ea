/// World and game state — fact sets, signatures, history and persistence.

use log::warn;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::schema::action::Binding;
use crate::schema::literal::Fact;

#[derive(Debug, Error)]
pub enum StateError {
    #[error("RON serialization error: {0}")]
    RonWrite(#[from] ron::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
}

/// A set of ground facts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorldState {
    facts: FxHashSet<Fact>,
}

impl WorldState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, fact: &Fact) -> bool {
        self.facts.contains(fact)
    }

    pub fn insert(&mut self, fact: Fact) -> bool {
        self.facts.insert(fact)
    }

    pub fn remove(&mut self, fact: &Fact) -> bool {
        self.facts.remove(fact)
    }

    pub fn len(&self) -> usize {
        self.facts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Fact> {
        self.facts.iter()
    }

    /// Facts in sorted order.
    pub fn sorted(&self) -> Vec<Fact> {
        let mut facts: Vec<Fact> = self.facts.iter().cloned().collect();
        facts.sort();
        facts
    }

    pub fn signature(&self) -> StateSignature {
        StateSignature(self.sorted())
    }
}

impl FromIterator<Fact> for WorldState {
    fn from_iter<I: IntoIterator<Item = Fact>>(iter: I) -> Self {
        WorldState {
            facts: iter.into_iter().collect(),
        }
    }
}

impl<'a> FromIterator<&'a str> for WorldState {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        iter.into_iter().map(Fact::parse).collect()
    }
}

/// Canonical hashable form of a world state: its sorted, deduplicated facts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateSignature(Vec<Fact>);

impl StateSignature {
    pub fn facts(&self) -> &[Fact] {
        &self.0
    }

    /// Build a signature from arbitrary facts, sorting and deduplicating.
    pub fn from_facts(facts: impl IntoIterator<Item = Fact>) -> Self {
        let mut facts: Vec<Fact> = facts.into_iter().collect();
        facts.sort();
        facts.dedup();
        StateSignature(facts)
    }
}

/// One executed step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub step: u32,
    pub action: String,
    pub binding: Binding,
}

/// Persisted form of a [`GameState`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedState {
    pub facts: Vec<Fact>,
    #[serde(default)]
    pub step_count: u32,
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
    #[serde(default)]
    pub visited: Vec<StateSignature>,
}

/// Mutable per-session state: current facts, step counter, history and the
/// signatures of every state seen so far.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameState {
    facts: WorldState,
    step_count: u32,
    history: Vec<HistoryEntry>,
    visited: FxHashSet<StateSignature>,
}

impl GameState {
    pub fn new(initial: WorldState) -> Self {
        let mut visited = FxHashSet::default();
        visited.insert(initial.signature());
        GameState {
            facts: initial,
            step_count: 0,
            history: Vec::new(),
            visited,
        }
    }

    pub fn facts(&self) -> &WorldState {
        &self.facts
    }

    pub fn step_count(&self) -> u32 {
        self.step_count
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    pub fn has_visited(&self, signature: &StateSignature) -> bool {
        self.visited.contains(signature)
    }

    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    /// Replace the world state with `next` as the result of one executed
    /// action. The swap is a single assignment, so no partial effect is
    /// ever observable.
    pub fn advance(&mut self, next: WorldState, action: &str, binding: &Binding) {
        self.visited.insert(next.signature());
        self.facts = next;
        self.step_count += 1;
        self.history.push(HistoryEntry {
            step: self.step_count,
            action: action.to_string(),
            binding: binding.clone(),
        });
    }

    pub fn to_saved(&self) -> SavedState {
        let mut visited: Vec<StateSignature> = self.visited.iter().cloned().collect();
        visited.sort();
        SavedState {
            facts: self.facts.sorted(),
            step_count: self.step_count,
            history: self.history.clone(),
            visited,
        }
    }

    /// Rebuild from a saved state. A save without visited signatures only
    /// loses revisit detection: the current state is treated as the sole
    /// visited one.
    pub fn from_saved(saved: SavedState) -> Self {
        let facts: WorldState = saved.facts.into_iter().collect();
        if saved.visited.is_empty() {
            warn!("saved state carries no visited signatures; revisit detection restarts here");
        }
        let mut visited: FxHashSet<StateSignature> = saved.visited.into_iter().collect();
        visited.insert(facts.signature());
        GameState {
            facts,
            step_count: saved.step_count,
            history: saved.history,
            visited,
        }
    }

    pub fn to_ron(&self) -> Result<String, StateError> {
        Ok(ron::ser::to_string_pretty(
            &self.to_saved(),
            ron::ser::PrettyConfig::default(),
        )?)
    }

    pub fn from_ron(input: &str) -> Result<Self, StateError> {
        let saved: SavedState = ron::from_str(input)?;
        Ok(Self::from_saved(saved))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world(facts: &[&str]) -> WorldState {
        facts.iter().copied().collect()
    }

    #[test]
    fn signature_ignores_insertion_order() {
        let a = world(&["at cell", "has key"]);
        let b = world(&["has key", "at cell", "at cell"]);
        assert_eq!(a.signature(), b.signature());
        assert_eq!(b.len(), 2);
    }

    #[test]
    fn new_state_has_visited_initial() {
        let initial = world(&["at cell"]);
        let state = GameState::new(initial.clone());
        assert!(state.has_visited(&initial.signature()));
        assert_eq!(state.step_count(), 0);
        assert!(state.history().is_empty());
    }

    #[test]
    fn advance_records_step_and_signature() {
        let mut state = GameState::new(world(&["at cell"]));
        let binding = Binding::new().with("from", "cell").with("to", "corridor");
        state.advance(world(&["at corridor"]), "move", &binding);

        assert_eq!(state.step_count(), 1);
        assert_eq!(state.history()[0].step, 1);
        assert_eq!(state.history()[0].action, "move");
        assert!(state.has_visited(&world(&["at corridor"]).signature()));
        assert_eq!(state.visited_count(), 2);
    }

    #[test]
    fn ron_round_trip() {
        let mut state = GameState::new(world(&["at cell", "has key"]));
        state.advance(world(&["at corridor", "has key"]), "move", &Binding::new());
        let text = state.to_ron().unwrap();
        let restored = GameState::from_ron(&text).unwrap();
        assert_eq!(restored, state);
    }

    #[test]
    fn restore_without_visited_falls_back_to_current() {
        let restored = GameState::from_ron("(facts: [\"at exit\"], step_count: 3)").unwrap();
        assert_eq!(restored.step_count(), 3);
        assert_eq!(restored.visited_count(), 1);
        assert!(restored.has_visited(&world(&["at exit"]).signature()));
    }

    #[test]
    fn malformed_save_is_an_error() {
        assert!(GameState::from_ron("(facts: 12)").is_err());
    }
}
