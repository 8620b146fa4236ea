//! Narrative Planner — interactive stories as STRIPS planning problems.
//!
//! Parses a planning domain and problem written as parenthesised
//! S-expressions, grounds lifted actions over typed objects, and runs them
//! as a playable state machine. An independent breadth-first search
//! certifies that a story's goal is reachable before it is played.

pub mod core;
pub mod schema;
