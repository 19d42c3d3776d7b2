//! Schema module - Configuration and result types for treasure searches.

mod config;
mod evolution;

pub use config::*;
pub use evolution::*;
