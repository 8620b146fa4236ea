pub mod action;
pub mod literal;
pub mod object;
pub mod story;
