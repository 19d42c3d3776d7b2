//! Evolutionary search for treasure-collecting programs.
//!
//! # Overview
//!
//! The evolutionary search system consists of:
//!
//! - **Agents** (`agent`): A genome plus the results of its last evaluation
//! - **Genome Operations** (`genome`): Random generation, crossover, and mutation
//! - **Population** (`population`): Elitism, tournament and diversify breeding
//! - **Schedule** (`schedule`): When to switch to diversify breeding
//! - **Search** (`search`): The generation loop tying it all together
//!
//! # Example
//!
//! ```rust,no_run
//! use treasure_hunt::compute::evolution::EvolutionEngine;
//! use treasure_hunt::schema::EvolutionConfig;
//!
//! let config = EvolutionConfig::default();
//! let mut engine = EvolutionEngine::new(config).expect("valid config");
//! let result = engine.run_with_callback(|progress| {
//!     println!("Generation {}: best fitness = {:.3}",
//!         progress.generation, progress.generation_best);
//! });
//!
//! if let Some(best) = &result.best {
//!     println!("Best path: {}", best.trajectory_codes());
//! }
//! ```
//!
//! # Breeding Modes
//!
//! - `Standard`: two tournaments over four random agents, fitness-ordered
//!   one-point crossover, light mutation
//! - `Diversify`: a random agent crossed with the best of three, rotation
//!   crossover, heavy mutation

mod agent;
mod genome;
mod population;
mod schedule;
mod search;

pub use agent::Agent;
pub use genome::{GenomeRng, MutationOperator};
pub use population::{
    DIVERSIFY_MUTATION_RATE, DIVERSIFY_SELF_MUTATION_RATE, Population, STANDARD_MUTATION_RATE,
    STANDARD_SELF_MUTATION_RATE, mutation_rate,
};
pub use schedule::{ScheduleStep, ShockSchedule};
pub use search::{BUDGET_EXCEEDED_FITNESS, EvolutionEngine, Outcome, evaluate_agent};
