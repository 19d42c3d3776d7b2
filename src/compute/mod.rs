//! Compute module - Virtual machine, environment and evolutionary search.

mod environment;
mod machine;

pub mod evolution;

pub use environment::*;
pub use machine::*;
