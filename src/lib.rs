//! Treasure Hunt - Evolving bytecode programs that collect treasures on a grid.
//!
//! A population of short 8-bit programs is run on a tiny self-modifying
//! virtual machine. Each run emits a sequence of grid moves, the moves are
//! replayed against a treasure grid, and the resulting fitness drives a
//! genetic algorithm until some program collects every treasure.
//!
//! # Architecture
//!
//! The crate is split into two main modules:
//!
//! - `schema`: Configuration, genome and result types
//! - `compute`: The virtual machine, the environment, and the evolutionary search
//!
//! # Example
//!
//! ```rust,no_run
//! use treasure_hunt::{EnvironmentConfig, EvolutionConfig, EvolutionEngine};
//!
//! let config = EvolutionConfig {
//!     environment: EnvironmentConfig {
//!         size: 7,
//!         start: (3, 6),
//!         treasures: vec![(4, 1), (2, 2), (6, 3)],
//!     },
//!     random_seed: Some(42),
//!     ..Default::default()
//! };
//!
//! let mut engine = EvolutionEngine::new(config).expect("valid config");
//! let result = engine.run();
//!
//! println!("Stopped: {:?} after {} generations",
//!     result.stats.stop_reason, result.stats.generations);
//! ```

pub mod compute;
pub mod schema;

// Re-export commonly used types
pub use compute::evolution::{Agent, EvolutionEngine};
pub use compute::{Environment, Machine, MachineError};
pub use schema::{EnvironmentConfig, EvolutionConfig, EvolutionResult, Move};
