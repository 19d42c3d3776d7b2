//! Population management and generation replacement.

use crate::schema::{BreedingMode, Genome};

use super::agent::Agent;
use super::genome::GenomeRng;

/// Mutation rate for standard-mode children of two different parents.
pub const STANDARD_MUTATION_RATE: f64 = 0.1;
/// Mutation rate for standard-mode children whose parents are one individual.
pub const STANDARD_SELF_MUTATION_RATE: f64 = 0.5;
/// Mutation rate for diversify-mode children of two different parents.
pub const DIVERSIFY_MUTATION_RATE: f64 = 0.7;
/// Mutation rate for diversify-mode children whose parents are one individual.
pub const DIVERSIFY_SELF_MUTATION_RATE: f64 = 0.9;

/// Agents per tournament pair in standard mode.
const TOURNAMENT_DRAWS: usize = 4;
/// Candidates for the best-of draw in diversify mode.
const BEST_OF_DRAWS: usize = 3;

/// Mutation rate applied to both children of `first` x `second`.
///
/// Parents count as identical only when they are the same individual.
pub fn mutation_rate(mode: BreedingMode, first: &Agent, second: &Agent) -> f64 {
    match (mode, first.is_same(second)) {
        (BreedingMode::Standard, false) => STANDARD_MUTATION_RATE,
        (BreedingMode::Standard, true) => STANDARD_SELF_MUTATION_RATE,
        (BreedingMode::Diversify, false) => DIVERSIFY_MUTATION_RATE,
        (BreedingMode::Diversify, true) => DIVERSIFY_SELF_MUTATION_RATE,
    }
}

/// The current generation plus the best-fitness record of past ones.
#[derive(Debug, Clone, Default)]
pub struct Population {
    generation: Vec<Agent>,
    /// Number of agents added at creation; drives how many pairs are bred.
    size: usize,
    fitness_history: Vec<f64>,
    next_id: u64,
}

impl Population {
    pub fn new() -> Self {
        Self::default()
    }

    /// Population of `size` uniformly random genomes.
    pub fn random(size: usize, genome_length: usize, rng: &mut GenomeRng) -> Self {
        let mut population = Self::new();
        for _ in 0..size {
            population.add_agent(rng.random_genome(genome_length));
        }
        population
    }

    /// Add an agent with a fresh identity.
    pub fn add_agent(&mut self, genome: Genome) -> u64 {
        let id = self.next_id();
        self.generation.push(Agent::new(id, genome));
        self.size += 1;
        id
    }

    fn next_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn agents(&self) -> &[Agent] {
        &self.generation
    }

    pub fn agents_mut(&mut self) -> &mut [Agent] {
        &mut self.generation
    }

    pub fn len(&self) -> usize {
        self.generation.len()
    }

    pub fn is_empty(&self) -> bool {
        self.generation.is_empty()
    }

    /// Configured size. The live generation may be one smaller.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Highest-fitness agent; the earliest one wins ties.
    pub fn best(&self) -> Option<&Agent> {
        self.generation
            .iter()
            .reduce(|best, agent| if agent.fitness > best.fitness { agent } else { best })
    }

    pub fn average_fitness(&self) -> f64 {
        if self.generation.is_empty() {
            return 0.0;
        }
        self.generation.iter().map(|a| a.fitness).sum::<f64>() / self.generation.len() as f64
    }

    /// Append the current generation's best fitness to the history.
    pub fn record_best(&mut self) -> Option<f64> {
        let best = self.best()?.fitness;
        self.fitness_history.push(best);
        Some(best)
    }

    /// Best fitness of every recorded generation, oldest first.
    pub fn fitness_history(&self) -> &[f64] {
        &self.fitness_history
    }

    /// Replace the generation with bred offspring.
    ///
    /// Slot 0 is a fresh copy of the best outgoing agent. The remaining
    /// slots are filled in pairs; when `size - 1` is odd the unpaired slot
    /// is left out.
    pub fn next_generation(&mut self, mode: BreedingMode, rng: &mut GenomeRng) {
        let mut ranked = std::mem::take(&mut self.generation);
        if ranked.is_empty() {
            return;
        }
        ranked.sort_by(|a, b| b.fitness.total_cmp(&a.fitness));

        let mut next = Vec::with_capacity(self.size);
        let elite_id = self.next_id();
        next.push(ranked[0].fresh_clone(elite_id));

        for _ in 0..self.size.saturating_sub(1) / 2 {
            let (first, second) = match mode {
                BreedingMode::Standard => self.breed_standard(&ranked, rng),
                BreedingMode::Diversify => self.breed_diversify(&ranked, rng),
            };
            next.push(first);
            next.push(second);
        }

        self.generation = next;
    }

    /// Two tournaments over four random agents, then fitness-ordered crossover.
    fn breed_standard(&mut self, ranked: &[Agent], rng: &mut GenomeRng) -> (Agent, Agent) {
        let picks = draw(ranked.len(), TOURNAMENT_DRAWS, rng);
        let parent1 = tournament(&ranked[picks[0]], &ranked[picks[1]], rng);
        let parent2 = tournament(&ranked[picks[2]], &ranked[picks[3]], rng);

        let (better, other) = if parent1.fitness > parent2.fitness {
            (parent1, parent2)
        } else {
            (parent2, parent1)
        };
        let (g1, g2) = rng.crossover(&better.genome, &other.genome);
        let rate = mutation_rate(BreedingMode::Standard, parent1, parent2);

        self.offspring(g1, g2, rate, rng)
    }

    /// A random agent crossed with the best of three random agents.
    fn breed_diversify(&mut self, ranked: &[Agent], rng: &mut GenomeRng) -> (Agent, Agent) {
        let parent1 = &ranked[rng.index(ranked.len())];
        let parent2 = draw(ranked.len(), BEST_OF_DRAWS, rng)
            .into_iter()
            .map(|idx| &ranked[idx])
            .reduce(|best, agent| if agent.fitness > best.fitness { agent } else { best })
            .unwrap_or(parent1);

        let (g1, g2) = rng.random_crossover(&parent1.genome, &parent2.genome);
        let rate = mutation_rate(BreedingMode::Diversify, parent1, parent2);

        self.offspring(g1, g2, rate, rng)
    }

    fn offspring(
        &mut self,
        g1: Genome,
        g2: Genome,
        rate: f64,
        rng: &mut GenomeRng,
    ) -> (Agent, Agent) {
        let first = Agent::new(self.next_id(), g1).mutate(rate, rng);
        let second = Agent::new(self.next_id(), g2).mutate(rate, rng);
        (first, second)
    }
}

/// Higher-fitness agent of the two; `b` wins ties between different agents.
fn tournament<'a>(a: &'a Agent, b: &'a Agent, rng: &mut GenomeRng) -> &'a Agent {
    if a.is_same(b) {
        return if rng.coin() { a } else { b };
    }
    if a.fitness > b.fitness { a } else { b }
}

/// `amount` distinct indices, or independent draws when there are too few agents.
fn draw(len: usize, amount: usize, rng: &mut GenomeRng) -> Vec<usize> {
    if len >= amount {
        rng.distinct_indices(len, amount)
    } else {
        (0..amount).map(|_| rng.index(len)).collect()
    }
}
