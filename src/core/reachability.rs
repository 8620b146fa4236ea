/// Reachability checking — bounded breadth-first search over the grounded
/// state graph, independent of any live game.

use log::{debug, info};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::core::evaluator::{is_satisfied, simulate_effect};
use crate::core::grounding::{ground_all, GroundingOptions};
use crate::core::parser::{parse, ParseErrors};
use crate::core::state::WorldState;
use crate::schema::story::Story;

/// Search bounds. Both must be finite for the search to terminate on
/// cyclic or highly branching domains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchLimits {
    pub max_depth: usize,
    pub max_explored_states: usize,
}

impl Default for SearchLimits {
    fn default() -> Self {
        Self {
            max_depth: 50,
            max_explored_states: 10_000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReachabilityOutcome {
    /// Goal found at this depth (shortest, since the search is breadth-first).
    Reachable { depth: usize },
    /// The explored-state bound was exceeded, or the per-schema grounding
    /// cap dropped successors, before a goal state was found.
    Inconclusive { explored: usize },
    /// The reachable state space (within the depth bound) has no goal state.
    Unreachable,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reachability {
    pub outcome: ReachabilityOutcome,
    pub message: String,
}

impl Reachability {
    fn new(outcome: ReachabilityOutcome) -> Self {
        let message = match outcome {
            ReachabilityOutcome::Reachable { depth } => format!("goal reachable in {depth} steps"),
            ReachabilityOutcome::Inconclusive { .. } => "inconclusive — assuming valid".to_string(),
            ReachabilityOutcome::Unreachable => "no reachable solution".to_string(),
        };
        Reachability { outcome, message }
    }

    /// Inconclusive searches count as reachable.
    pub fn reachable(&self) -> bool {
        !matches!(self.outcome, ReachabilityOutcome::Unreachable)
    }

    pub fn is_inconclusive(&self) -> bool {
        matches!(self.outcome, ReachabilityOutcome::Inconclusive { .. })
    }
}

/// Parse both texts and check that the goal is reachable from the initial
/// state.
pub fn check_reachable(
    domain_text: &str,
    problem_text: &str,
    limits: SearchLimits,
) -> Result<Reachability, ParseErrors> {
    let story = parse(domain_text, problem_text)?;
    Ok(check_story(&story, limits, &GroundingOptions::default()))
}

/// Breadth-first search from the story's initial state.
pub fn check_story(story: &Story, limits: SearchLimits, grounding: &GroundingOptions) -> Reachability {
    let domain = &story.domain;
    let problem = &story.problem;
    let initial: WorldState = problem.init.iter().cloned().collect();

    let mut seen = FxHashSet::default();
    seen.insert(initial.signature());
    let mut queue = VecDeque::from([(initial, 0usize)]);
    // Set once grounding drops a successor; an exhausted queue then proves nothing.
    let mut truncated = false;

    let outcome = loop {
        if seen.len() > limits.max_explored_states {
            break ReachabilityOutcome::Inconclusive { explored: seen.len() };
        }
        let Some((state, depth)) = queue.pop_front() else {
            break if truncated {
                ReachabilityOutcome::Inconclusive { explored: seen.len() }
            } else {
                ReachabilityOutcome::Unreachable
            };
        };
        if is_satisfied(&problem.goal, &state) {
            break ReachabilityOutcome::Reachable { depth };
        }
        if depth >= limits.max_depth {
            continue;
        }
        let successors = ground_all(domain.actions(), &state, &problem.objects, grounding);
        truncated |= successors.truncated;
        for ground in successors.actions {
            let Some(schema) = domain.action(&ground.action) else {
                continue;
            };
            let next = simulate_effect(&schema.effect, &ground.binding, &state);
            if seen.insert(next.signature()) {
                queue.push_back((next, depth + 1));
            }
        }
    };

    debug!("reachability search saw {} distinct states", seen.len());
    let result = Reachability::new(outcome);
    info!("reachability: {}", result.message);
    result
}
