//! Evolution driver: evaluates generations and breeds the next one.

use std::time::Instant;

use log::{debug, info, trace};
use rayon::prelude::*;

use crate::compute::{Environment, EnvironmentState, Machine};
use crate::schema::{
    AgentSnapshot, BreedingMode, EvolutionConfig, EvolutionConfigError, EvolutionHistory,
    EvolutionProgress, EvolutionResult, EvolutionStats, StopReason,
};

use super::agent::Agent;
use super::genome::GenomeRng;
use super::population::Population;
use super::schedule::{ScheduleStep, ShockSchedule};

/// Fitness assigned to an agent whose program exceeds the instruction budget.
pub const BUDGET_EXCEEDED_FITNESS: f64 = -1.0;

/// Result of evaluating one agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Every treasure was collected.
    Solved,
    Unsolved,
    /// The program ran past the instruction budget.
    BudgetExceeded,
}

/// Run `agent`'s genome on `machine` and walk the result through `state`.
///
/// `state` is reset from `template` first and the agent's previous results
/// are discarded, so fitness is always recomputed from scratch.
pub fn evaluate_agent(
    agent: &mut Agent,
    machine: &mut Machine,
    state: &mut EnvironmentState,
    template: &Environment,
) -> Outcome {
    agent.reset_run();
    state.reset(template);

    match machine.run(&agent.genome) {
        Ok(trajectory) => {
            if state.evaluate(agent, trajectory) {
                Outcome::Solved
            } else {
                Outcome::Unsolved
            }
        }
        Err(err) => {
            trace!("Agent {}: {}", agent.id, err);
            agent.fitness = BUDGET_EXCEEDED_FITNESS;
            Outcome::BudgetExceeded
        }
    }
}

/// Evolution engine that runs the search.
pub struct EvolutionEngine {
    config: EvolutionConfig,
    rng: GenomeRng,
    environment: Environment,
    population: Population,
    schedule: ShockSchedule,
    history: EvolutionHistory,
    generation: usize,
    best: Option<AgentSnapshot>,
    evaluations: u64,
    budget_exceeded: u64,
}

impl EvolutionEngine {
    /// Create a new evolution engine from a validated configuration.
    pub fn new(config: EvolutionConfig) -> Result<Self, EvolutionConfigError> {
        config.validate()?;

        let rng = match config.random_seed {
            Some(seed) => GenomeRng::new(seed),
            None => GenomeRng::random(),
        };
        let environment = Environment::new(&config.environment);
        let schedule = ShockSchedule::new(&config.shock);

        Ok(Self {
            config,
            rng,
            environment,
            population: Population::new(),
            schedule,
            history: EvolutionHistory::default(),
            generation: 0,
            best: None,
            evaluations: 0,
            budget_exceeded: 0,
        })
    }

    /// Initialize the population with random genomes and reset run state.
    pub fn initialize(&mut self) {
        self.population = Population::random(
            self.config.population.size,
            self.config.population.genome_length,
            &mut self.rng,
        );
        self.schedule = ShockSchedule::new(&self.config.shock);
        self.history = EvolutionHistory::default();
        self.generation = 0;
        self.best = None;
        self.evaluations = 0;
        self.budget_exceeded = 0;
    }

    pub fn population(&self) -> &Population {
        &self.population
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    /// Evaluate all agents in parallel.
    ///
    /// Each worker owns its own machine and environment copy. Returns the
    /// index of the first agent, in population order, that found every
    /// treasure.
    pub fn evaluate_population(&mut self) -> Option<usize> {
        let template = &self.environment;

        let outcomes: Vec<Outcome> = self
            .population
            .agents_mut()
            .par_iter_mut()
            .map_init(
                || (Machine::new(), template.state()),
                |(machine, state), agent| evaluate_agent(agent, machine, state, template),
            )
            .collect();

        self.evaluations += outcomes.len() as u64;
        self.budget_exceeded += outcomes
            .iter()
            .filter(|&&o| o == Outcome::BudgetExceeded)
            .count() as u64;

        outcomes.iter().position(|&o| o == Outcome::Solved)
    }

    /// Remember the best agent of the current generation if it beats the
    /// best seen so far.
    fn track_best(&mut self) {
        let Some(candidate) = self.population.best() else {
            return;
        };
        let improved = self
            .best
            .as_ref()
            .is_none_or(|best| candidate.fitness > best.fitness);
        if improved {
            self.best = Some(candidate.to_snapshot(self.generation));
        }
    }

    fn progress(
        &self,
        generation_best: f64,
        avg_fitness: f64,
        step: ScheduleStep,
    ) -> EvolutionProgress {
        EvolutionProgress {
            generation: self.generation,
            total_generations: self.config.population.max_generations,
            generation_best,
            best_fitness: self
                .best
                .as_ref()
                .map_or(generation_best, |best| best.fitness),
            avg_fitness,
            next_mode: step.mode,
            shock: step.shock,
            diversify_remaining: self.schedule.remaining(),
        }
    }

    /// Run evolution with progress callback.
    pub fn run_with_callback<F>(&mut self, callback: F) -> EvolutionResult
    where
        F: Fn(&EvolutionProgress),
    {
        let start_time = Instant::now();
        self.initialize();

        let mut stop_reason = StopReason::MaxGenerations;
        let mut winner = None;
        let mut generations = 0;

        for generation in 0..self.config.population.max_generations {
            self.generation = generation;
            generations = generation + 1;

            let solver = self.evaluate_population();
            let generation_best = self.population.record_best().unwrap_or(0.0);
            let avg_fitness = self.population.average_fitness();
            self.history.avg_fitness.push(avg_fitness);
            self.track_best();

            if let Some(idx) = solver {
                let agent = &self.population.agents()[idx];
                info!(
                    "Solution found in generation {}: {} treasures in {} steps",
                    generation, agent.treasures_found, agent.steps
                );
                winner = Some(agent.to_snapshot(generation));
                stop_reason = StopReason::SolutionFound;

                let step = ScheduleStep {
                    mode: BreedingMode::Standard,
                    shock: false,
                };
                callback(&self.progress(generation_best, avg_fitness, step));
                break;
            }

            let step = self.schedule.advance(generation, &mut self.rng);
            if step.shock {
                info!(
                    "Diversification shock at generation {}: {} extra generations",
                    generation,
                    self.schedule.remaining()
                );
                self.history.shocks.push(generation);
            }

            debug!(
                "Generation {}: best={:.3} avg={:.3} next={:?}",
                generation, generation_best, avg_fitness, step.mode
            );
            callback(&self.progress(generation_best, avg_fitness, step));

            self.population.next_generation(step.mode, &mut self.rng);
        }

        let best = winner.or_else(|| self.best.clone());
        let best_fitness = best.as_ref().map_or(0.0, |b| b.fitness);

        EvolutionResult {
            best,
            stats: EvolutionStats {
                generations,
                total_evaluations: self.evaluations,
                budget_exceeded: self.budget_exceeded,
                best_fitness,
                elapsed_seconds: start_time.elapsed().as_secs_f64(),
                stop_reason,
            },
            history: EvolutionHistory {
                best_fitness: self.population.fitness_history().to_vec(),
                ..self.history.clone()
            },
        }
    }

    /// Run evolution (blocking).
    pub fn run(&mut self) -> EvolutionResult {
        self.run_with_callback(|_| {})
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::fitness;
    use crate::schema::{EnvironmentConfig, Genome, PopulationConfig, ShockConfig};
    use std::cell::Cell;

    /// The start is further away than any program can walk.
    fn unreachable_config(size: usize, max_generations: usize) -> EvolutionConfig {
        EvolutionConfig {
            environment: EnvironmentConfig {
                size: 4,
                start: (-1000, -1000),
                treasures: vec![(0, 0)],
            },
            population: PopulationConfig {
                size,
                genome_length: 30,
                max_generations,
            },
            random_seed: Some(42),
            ..Default::default()
        }
    }

    #[test]
    fn test_evolution_engine_creation() {
        let mut engine = EvolutionEngine::new(unreachable_config(10, 5)).unwrap();
        engine.initialize();
        assert_eq!(engine.population().len(), 10);
        assert_eq!(engine.environment().treasure_count(), 1);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = unreachable_config(2, 5);
        assert!(matches!(
            EvolutionEngine::new(config),
            Err(EvolutionConfigError::PopulationTooSmall)
        ));
    }

    #[test]
    fn test_budget_exceeded_agent() {
        let env = Environment::new(&EnvironmentConfig::default());
        let mut state = env.state();
        let mut machine = Machine::new();
        let mut agent = Agent::new(0, Genome::new(vec![0x80, 0xC5]));

        let outcome = evaluate_agent(&mut agent, &mut machine, &mut state, &env);

        assert_eq!(outcome, Outcome::BudgetExceeded);
        assert_eq!(agent.fitness, BUDGET_EXCEEDED_FITNESS);
        assert_eq!(agent.steps, 0);
        assert!(agent.trajectory.is_empty());
    }

    #[test]
    fn test_reevaluation_is_not_incremental() {
        let env = Environment::new(&EnvironmentConfig {
            size: 5,
            start: (0, 0),
            treasures: vec![(4, 4)],
        });
        let mut state = env.state();
        let mut machine = Machine::new();
        // Three Right moves (five set bits each)
        let mut agent = Agent::new(0, Genome::new(vec![0xC7, 0xC7, 0xC7]));

        let first = evaluate_agent(&mut agent, &mut machine, &mut state, &env);
        let snapshot = (agent.fitness, agent.steps, agent.trajectory.clone());
        let second = evaluate_agent(&mut agent, &mut machine, &mut state, &env);

        assert_eq!(first, Outcome::Unsolved);
        assert_eq!(second, Outcome::Unsolved);
        assert_eq!((agent.fitness, agent.steps, agent.trajectory.clone()), snapshot);
        assert_eq!(agent.steps, 3);
    }

    #[test]
    fn test_treasure_at_start_solves_immediately() {
        let config = EvolutionConfig {
            environment: EnvironmentConfig {
                size: 4,
                start: (0, 0),
                treasures: vec![(0, 0)],
            },
            population: PopulationConfig {
                size: 20,
                genome_length: 30,
                max_generations: 10,
            },
            random_seed: Some(1),
            ..Default::default()
        };

        let result = EvolutionEngine::new(config).unwrap().run();
        let best = result.best.as_ref().unwrap();

        assert!(result.solved());
        assert_eq!(result.stats.generations, 1);
        assert_eq!(best.generation, 0);
        assert_eq!(best.steps, 0);
        assert_eq!(best.fitness, 0.0);
        assert_eq!(best.treasures_found, 1);
        assert_eq!(result.history.best_fitness.len(), 1);
    }

    #[test]
    fn test_finds_adjacent_treasure() {
        let config = EvolutionConfig {
            environment: EnvironmentConfig {
                size: 5,
                start: (2, 2),
                treasures: vec![(3, 2)],
            },
            population: PopulationConfig {
                size: 21,
                genome_length: 30,
                max_generations: 50,
            },
            random_seed: Some(7),
            ..Default::default()
        };

        let result = EvolutionEngine::new(config).unwrap().run();
        let best = result.best.as_ref().unwrap();

        assert!(result.solved());
        assert_eq!(best.treasures_found, 1);
        assert!(best.steps >= 1);
        assert!(best.steps <= best.trajectory.len());
        assert!((best.fitness - fitness(1, best.steps)).abs() < 1e-9);
    }

    #[test]
    fn test_evolution_run_exhausts_budget() {
        let mut engine = EvolutionEngine::new(unreachable_config(9, 4)).unwrap();
        let reports = Cell::new(0);
        let result = engine.run_with_callback(|progress| {
            assert!(progress.generation < 4);
            reports.set(reports.get() + 1);
        });

        assert_eq!(result.stats.stop_reason, StopReason::MaxGenerations);
        assert_eq!(result.stats.generations, 4);
        assert_eq!(reports.get(), 4);
        assert_eq!(result.history.best_fitness.len(), 4);
        assert_eq!(result.history.avg_fitness.len(), 4);
        assert!(result.best.is_some());
        // 9 agents first, then 1 + 2 * 4 = 9 per generation
        assert_eq!(result.stats.total_evaluations, 36);

        let best = result.best.unwrap();
        let max = result
            .history
            .best_fitness
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max);
        assert_eq!(best.fitness, max);
    }

    #[test]
    fn test_shocks_recorded() {
        let mut config = unreachable_config(7, 8);
        config.shock = ShockConfig {
            first_interval: 2,
            later_interval: 3,
            duration_bounds: (1, 1),
        };

        let result = EvolutionEngine::new(config).unwrap().run();
        assert_eq!(result.history.shocks, vec![2, 3, 6]);
    }

    #[test]
    fn test_seeded_runs_reproducible() {
        let a = EvolutionEngine::new(unreachable_config(11, 6)).unwrap().run();
        let b = EvolutionEngine::new(unreachable_config(11, 6)).unwrap().run();

        assert_eq!(a.history.best_fitness, b.history.best_fitness);
        assert_eq!(a.history.avg_fitness, b.history.avg_fitness);
        assert_eq!(a.best.map(|s| s.genome), b.best.map(|s| s.genome));
    }
}
