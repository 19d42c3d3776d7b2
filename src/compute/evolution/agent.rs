//! The evolvable unit: a genome plus the results of its last evaluation.

use crate::schema::{AgentSnapshot, Genome, Move};

use super::genome::GenomeRng;

/// An individual in the population.
///
/// `id` is the agent's identity. Two agents with identical genomes are still
/// different individuals; selection compares ids, never genome contents.
#[derive(Debug, Clone)]
pub struct Agent {
    pub id: u64,
    pub genome: Genome,
    /// Moves emitted by the last execution; empty until evaluated.
    pub trajectory: Vec<Move>,
    pub fitness: f64,
    pub steps: usize,
    pub treasures_found: usize,
}

impl Agent {
    pub fn new(id: u64, genome: Genome) -> Self {
        Self {
            id,
            genome,
            trajectory: Vec::new(),
            fitness: 0.0,
            steps: 0,
            treasures_found: 0,
        }
    }

    /// Same genome, new identity, zeroed results.
    pub fn fresh_clone(&self, id: u64) -> Self {
        Self::new(id, self.genome.clone())
    }

    /// Whether `self` and `other` are the same individual.
    pub fn is_same(&self, other: &Agent) -> bool {
        self.id == other.id
    }

    /// Discard the results of a previous evaluation.
    pub fn reset_run(&mut self) {
        self.trajectory.clear();
        self.fitness = 0.0;
        self.steps = 0;
        self.treasures_found = 0;
    }

    /// Mutate the genome in place and return `self` for chaining.
    pub fn mutate(mut self, rate: f64, rng: &mut GenomeRng) -> Self {
        rng.mutate(&mut self.genome, rate);
        self
    }

    pub fn to_snapshot(&self, generation: usize) -> AgentSnapshot {
        AgentSnapshot {
            id: self.id,
            genome: self.genome.clone(),
            trajectory: self.trajectory.clone(),
            fitness: self.fitness,
            steps: self.steps,
            treasures_found: self.treasures_found,
            generation,
        }
    }
}
