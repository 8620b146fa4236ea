pub mod blocks;
pub mod config;
pub mod engine;
pub mod evaluator;
pub mod grounding;
pub mod parser;
pub mod reachability;
pub mod state;
pub mod validation;
