//! Evolution configuration and result types.
//!
//! This module provides the plain data that flows in and out of the
//! evolutionary search: run parameters, the genome representation, and the
//! serializable history/result types consumed by external reporting.

use std::fs;
use std::ops::{Deref, DerefMut};
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{ConfigError, EnvironmentConfig};

/// Top-level configuration for an evolutionary treasure search.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EvolutionConfig {
    /// Treasure grid every agent is evaluated against.
    #[serde(default)]
    pub environment: EnvironmentConfig,
    /// Population and generation settings.
    #[serde(default)]
    pub population: PopulationConfig,
    /// Diversification shock schedule.
    #[serde(default)]
    pub shock: ShockConfig,
    /// Random seed for reproducibility.
    #[serde(default)]
    pub random_seed: Option<u64>,
}

/// Population settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PopulationConfig {
    /// Number of agents in the initial population.
    #[serde(default = "default_population_size")]
    pub size: usize,
    /// Number of bytes in every genome.
    #[serde(default = "default_genome_length")]
    pub genome_length: usize,
    /// Maximum number of generations to evaluate.
    #[serde(default = "default_max_generations")]
    pub max_generations: usize,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            size: default_population_size(),
            genome_length: default_genome_length(),
            max_generations: default_max_generations(),
        }
    }
}

fn default_population_size() -> usize {
    201
}
fn default_genome_length() -> usize {
    30
}
fn default_max_generations() -> usize {
    2000
}

/// Diversification shock schedule.
///
/// The first shock fires at generation `first_interval`; after that the
/// schedule widens and shocks fire on multiples of `later_interval`. Each
/// shock is followed by a random number of diversify-mode generations drawn
/// from `duration_bounds` (inclusive).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShockConfig {
    #[serde(default = "default_first_interval")]
    pub first_interval: usize,
    #[serde(default = "default_later_interval")]
    pub later_interval: usize,
    #[serde(default = "default_duration_bounds")]
    pub duration_bounds: (u32, u32),
}

impl Default for ShockConfig {
    fn default() -> Self {
        Self {
            first_interval: default_first_interval(),
            later_interval: default_later_interval(),
            duration_bounds: default_duration_bounds(),
        }
    }
}

fn default_first_interval() -> usize {
    200
}
fn default_later_interval() -> usize {
    500
}
fn default_duration_bounds() -> (u32, u32) {
    (20, 40)
}

/// An evolvable program: a fixed-length sequence of 8-bit instruction words.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Genome(Vec<u8>);

impl Genome {
    pub fn new(genes: Vec<u8>) -> Self {
        Self(genes)
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.0
    }
}

impl From<Vec<u8>> for Genome {
    fn from(genes: Vec<u8>) -> Self {
        Self(genes)
    }
}

impl Deref for Genome {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.0
    }
}

impl DerefMut for Genome {
    fn deref_mut(&mut self) -> &mut [u8] {
        &mut self.0
    }
}

/// Movement symbol emitted by the virtual machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Move {
    Up,
    Down,
    Right,
    Left,
}

impl Move {
    /// One-letter code used in compact trajectory dumps.
    pub fn code(self) -> char {
        match self {
            Move::Up => 'U',
            Move::Down => 'D',
            Move::Right => 'R',
            Move::Left => 'L',
        }
    }

    /// Position delta `(dx, dy)`; `y` grows downward.
    pub fn delta(self) -> (i32, i32) {
        match self {
            Move::Up => (0, -1),
            Move::Down => (0, 1),
            Move::Right => (1, 0),
            Move::Left => (-1, 0),
        }
    }
}

/// Selection/crossover regime used to breed a generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum BreedingMode {
    /// Tournament selection with fitness-ordered crossover.
    #[default]
    Standard,
    /// Random/best-of-three selection with unordered crossover and heavy mutation.
    Diversify,
}

/// Serializable view of an evaluated agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSnapshot {
    pub id: u64,
    pub genome: Genome,
    pub trajectory: Vec<Move>,
    pub fitness: f64,
    pub steps: usize,
    pub treasures_found: usize,
    /// Generation in which this agent was evaluated.
    pub generation: usize,
}

impl AgentSnapshot {
    /// Trajectory as a compact string of one-letter codes.
    pub fn trajectory_codes(&self) -> String {
        self.trajectory.iter().map(|m| m.code()).collect()
    }
}

/// Evolution history for plotting.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EvolutionHistory {
    /// Best fitness per generation.
    pub best_fitness: Vec<f64>,
    /// Average fitness per generation.
    pub avg_fitness: Vec<f64>,
    /// Generations at which a diversification shock fired.
    pub shocks: Vec<usize>,
}

/// Progress report delivered after each evaluated generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvolutionProgress {
    pub generation: usize,
    pub total_generations: usize,
    /// Best fitness in this generation.
    pub generation_best: f64,
    /// Best fitness seen so far.
    pub best_fitness: f64,
    pub avg_fitness: f64,
    /// Mode used to breed the next generation.
    pub next_mode: BreedingMode,
    /// Whether a diversification shock fired this generation.
    pub shock: bool,
    /// Diversify-mode generations left after this one.
    pub diversify_remaining: u32,
}

/// Final result of an evolution run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvolutionResult {
    /// The solving agent, or the best agent seen if no solution was found.
    /// `None` only when no generation was evaluated.
    pub best: Option<AgentSnapshot>,
    pub stats: EvolutionStats,
    pub history: EvolutionHistory,
}

impl EvolutionResult {
    pub fn solved(&self) -> bool {
        self.stats.stop_reason == StopReason::SolutionFound
    }
}

/// Statistics from an evolution run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvolutionStats {
    /// Number of generations evaluated.
    pub generations: usize,
    /// Total agent evaluations performed.
    pub total_evaluations: u64,
    /// Evaluations that hit the instruction budget.
    pub budget_exceeded: u64,
    pub best_fitness: f64,
    /// Time taken (in seconds).
    pub elapsed_seconds: f64,
    pub stop_reason: StopReason,
}

/// Reason evolution stopped.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum StopReason {
    /// An agent collected every treasure.
    SolutionFound,
    /// Generation budget exhausted.
    MaxGenerations,
}

// ============================================================================
// Validation
// ============================================================================

/// Evolution configuration validation errors.
#[derive(Debug, thiserror::Error)]
pub enum EvolutionConfigError {
    #[error("Population size must be at least 4")]
    PopulationTooSmall,
    #[error("Genome length must be at least 2")]
    GenomeTooShort,
    #[error("Generation budget must be positive")]
    NoGenerations,
    #[error("Invalid shock schedule: {0}")]
    InvalidShock(String),
    #[error("Environment validation failed: {0}")]
    Environment(#[from] ConfigError),
}

impl EvolutionConfig {
    /// Load a configuration from disk and validate it.
    ///
    /// A `.json` file holds either a full [`EvolutionConfig`] or a bare
    /// [`EnvironmentConfig`] (recognized by a top-level `treasures` key).
    /// Any other file is an environment in the line format. Environments
    /// loaded alone run with default evolution settings.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, EvolutionConfigError> {
        let path = path.as_ref();

        let config = if path.extension().is_some_and(|ext| ext == "json") {
            let contents = fs::read_to_string(path).map_err(ConfigError::from)?;
            let value: serde_json::Value =
                serde_json::from_str(&contents).map_err(ConfigError::from)?;
            if value.get("treasures").is_some() {
                Self {
                    environment: serde_json::from_value(value).map_err(ConfigError::from)?,
                    ..Default::default()
                }
            } else {
                serde_json::from_value(value).map_err(ConfigError::from)?
            }
        } else {
            Self {
                environment: EnvironmentConfig::load(path)?,
                ..Default::default()
            }
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate evolution configuration.
    pub fn validate(&self) -> Result<(), EvolutionConfigError> {
        self.environment.validate()?;

        // Standard breeding draws four distinct agents per pair
        if self.population.size < 4 {
            return Err(EvolutionConfigError::PopulationTooSmall);
        }
        // Swap mutation needs two distinct positions
        if self.population.genome_length < 2 {
            return Err(EvolutionConfigError::GenomeTooShort);
        }
        if self.population.max_generations == 0 {
            return Err(EvolutionConfigError::NoGenerations);
        }

        if self.shock.first_interval == 0 || self.shock.later_interval == 0 {
            return Err(EvolutionConfigError::InvalidShock(
                "intervals must be positive".to_string(),
            ));
        }
        let (min, max) = self.shock.duration_bounds;
        if min > max {
            return Err(EvolutionConfigError::InvalidShock(format!(
                "duration min ({}) > max ({})",
                min, max
            )));
        }

        Ok(())
    }
}
