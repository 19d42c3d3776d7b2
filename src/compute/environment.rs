//! Treasure environment and trajectory fitness evaluation.
//!
//! [`Environment`] is a read-only template built once from an
//! [`EnvironmentConfig`]. Each evaluation walks a [`EnvironmentState`], a
//! mutable working copy that is reset from the template before every agent,
//! so parallel workers never share mutable grid state.

use crate::schema::{EnvironmentConfig, Move, Position};

use super::evolution::Agent;

/// Fitness bonus for any walk that takes at least one step.
pub const STEP_BONUS: f64 = 0.1;

/// Fitness penalty per step taken.
pub const STEP_PENALTY: f64 = 0.01;

/// Fitness of a walk.
///
/// A walk with no steps scores zero regardless of treasures collected at the
/// start cell. Otherwise each treasure is worth one point, plus a flat
/// [`STEP_BONUS`], minus [`STEP_PENALTY`] per step.
pub fn fitness(treasures_found: usize, steps: usize) -> f64 {
    if steps == 0 {
        return 0.0;
    }
    treasures_found as f64 + STEP_BONUS - steps as f64 * STEP_PENALTY
}

/// Immutable treasure grid and start position.
#[derive(Debug, Clone)]
pub struct Environment {
    size: usize,
    start: Position,
    grid: Vec<bool>,
    treasure_count: usize,
}

impl Environment {
    /// Build the template from a validated `config`.
    pub fn new(config: &EnvironmentConfig) -> Self {
        debug_assert!(
            config.validate().is_ok(),
            "environment config must be validated before use"
        );

        let mut grid = vec![false; config.size * config.size];
        let mut treasure_count = 0;
        for &(x, y) in &config.treasures {
            if config.contains((x, y)) {
                let idx = y as usize * config.size + x as usize;
                if !grid[idx] {
                    grid[idx] = true;
                    treasure_count += 1;
                }
            }
        }

        Self {
            size: config.size,
            start: config.start,
            grid,
            treasure_count,
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn start(&self) -> Position {
        self.start
    }

    /// Total treasures on a fresh grid.
    pub fn treasure_count(&self) -> usize {
        self.treasure_count
    }

    /// Fresh working copy positioned at the start.
    pub fn state(&self) -> EnvironmentState {
        EnvironmentState {
            size: self.size,
            position: self.start,
            grid: self.grid.clone(),
            remaining: self.treasure_count,
            total: self.treasure_count,
        }
    }
}

/// Mutable working copy of an [`Environment`].
#[derive(Debug, Clone)]
pub struct EnvironmentState {
    size: usize,
    position: Position,
    grid: Vec<bool>,
    remaining: usize,
    total: usize,
}

impl EnvironmentState {
    /// Restore treasures and start position from `template`.
    pub fn reset(&mut self, template: &Environment) {
        self.size = template.size;
        self.position = template.start;
        self.grid.clone_from(&template.grid);
        self.remaining = template.treasure_count;
        self.total = template.treasure_count;
    }

    pub fn position(&self) -> Position {
        self.position
    }

    /// Treasures still on the grid.
    pub fn remaining(&self) -> usize {
        self.remaining
    }

    /// Walk `trajectory` from the current position, updating `agent`'s
    /// counters and fitness. Returns `true` when every treasure was found.
    ///
    /// Moves are never clamped. Off the grid the agent keeps walking and
    /// counting steps but cannot collect anything until it comes back.
    pub fn evaluate(&mut self, agent: &mut Agent, trajectory: Vec<Move>) -> bool {
        if self.collect() {
            agent.treasures_found += 1;
        }

        for &step in &trajectory {
            if agent.treasures_found == self.total {
                break;
            }
            self.apply(step);
            if self.collect() {
                agent.treasures_found += 1;
            }
            agent.steps += 1;
        }

        agent.fitness = fitness(agent.treasures_found, agent.steps);
        agent.trajectory = trajectory;

        agent.treasures_found == self.total
    }

    fn apply(&mut self, step: Move) {
        let (dx, dy) = step.delta();
        // A saturated coordinate is already far off the grid
        self.position = (
            self.position.0.saturating_add(dx),
            self.position.1.saturating_add(dy),
        );
    }

    /// Pick up a treasure at the current position, if any.
    fn collect(&mut self) -> bool {
        let Some(idx) = self.cell_index() else {
            return false;
        };
        if self.grid[idx] {
            self.grid[idx] = false;
            self.remaining -= 1;
            true
        } else {
            false
        }
    }

    fn cell_index(&self) -> Option<usize> {
        let (x, y) = self.position;
        let x = usize::try_from(x).ok().filter(|&x| x < self.size)?;
        let y = usize::try_from(y).ok().filter(|&y| y < self.size)?;
        Some(y * self.size + x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Genome;

    fn agent() -> Agent {
        Agent::new(0, Genome::new(vec![0; 4]))
    }

    fn environment(size: usize, start: Position, treasures: Vec<Position>) -> Environment {
        Environment::new(&EnvironmentConfig {
            size,
            start,
            treasures,
        })
    }

    #[test]
    fn test_fitness_formula() {
        assert!((fitness(2, 10) - 2.0).abs() < 1e-9);
        assert_eq!(fitness(3, 0), 0.0);
        assert!((fitness(0, 1) - 0.09).abs() < 1e-9);
    }

    #[test]
    fn test_treasure_at_start() {
        let env = environment(4, (0, 0), vec![(0, 0)]);
        let mut state = env.state();
        let mut agent = agent();

        let found = state.evaluate(&mut agent, vec![Move::Right, Move::Down]);

        assert!(found);
        assert_eq!(agent.steps, 0);
        assert_eq!(agent.treasures_found, 1);
        assert_eq!(agent.fitness, 0.0);
        assert_eq!(state.remaining(), 0);
    }

    #[test]
    fn test_stops_after_last_treasure() {
        let env = environment(5, (0, 0), vec![(1, 0), (1, 1)]);
        let mut state = env.state();
        let mut agent = agent();

        let trajectory = vec![Move::Right, Move::Down, Move::Left, Move::Left];
        let found = state.evaluate(&mut agent, trajectory.clone());

        assert!(found);
        assert_eq!(agent.steps, 2);
        assert_eq!(agent.treasures_found, 2);
        assert_eq!(state.position(), (1, 1));
        assert!((agent.fitness - 2.08).abs() < 1e-9);
        assert_eq!(agent.trajectory, trajectory);
    }

    #[test]
    fn test_out_of_bounds_is_not_fatal() {
        let env = environment(3, (0, 0), vec![(0, 1)]);
        let mut state = env.state();
        let mut agent = agent();

        let found = state.evaluate(
            &mut agent,
            vec![Move::Up, Move::Up, Move::Left, Move::Right, Move::Down, Move::Down],
        );

        assert!(!found);
        assert_eq!(agent.steps, 6);
        assert_eq!(agent.treasures_found, 0);
        assert_eq!(state.position(), (0, 0));
        assert!((agent.fitness - (0.1 - 0.06)).abs() < 1e-9);
    }

    #[test]
    fn test_far_off_grid_start_does_not_overflow() {
        let config = EnvironmentConfig {
            size: 3,
            start: (i32::MAX, i32::MIN),
            treasures: vec![(0, 0)],
        };
        assert!(config.validate().is_ok());
        let env = Environment::new(&config);
        let mut state = env.state();
        let mut agent = agent();

        let found = state.evaluate(&mut agent, vec![Move::Right, Move::Up, Move::Left]);

        assert!(!found);
        assert_eq!(agent.steps, 3);
        assert_eq!(agent.treasures_found, 0);
        assert_eq!(state.position(), (i32::MAX - 1, i32::MIN));
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "must be validated")]
    fn test_unvalidated_config_rejected() {
        environment(3, (0, 0), vec![(1, 1), (1, 1)]);
    }

    #[test]
    fn test_walk_back_into_grid_collects() {
        let env = environment(3, (0, 0), vec![(0, 0), (2, 0)]);
        let mut state = env.state();
        let mut agent = agent();

        let trajectory = vec![Move::Left, Move::Right, Move::Right, Move::Right];
        assert!(state.evaluate(&mut agent, trajectory));
        assert_eq!(agent.treasures_found, 2);
        assert_eq!(agent.steps, 4);
    }

    #[test]
    fn test_collected_treasure_is_cleared() {
        let env = environment(3, (0, 0), vec![(1, 0), (2, 2)]);
        let mut state = env.state();
        let mut agent = agent();

        let trajectory = vec![Move::Right, Move::Left, Move::Right];
        assert!(!state.evaluate(&mut agent, trajectory));
        assert_eq!(agent.treasures_found, 1);
        assert_eq!(state.remaining(), 1);
    }

    #[test]
    fn test_reset_restores_template() {
        let env = environment(3, (1, 1), vec![(1, 2)]);
        let mut state = env.state();
        let mut first = agent();
        assert!(state.evaluate(&mut first, vec![Move::Down]));
        assert_eq!(state.remaining(), 0);

        state.reset(&env);
        assert_eq!(state.position(), (1, 1));
        assert_eq!(state.remaining(), 1);

        let mut second = agent();
        assert!(state.evaluate(&mut second, vec![Move::Down]));
    }

    #[test]
    fn test_empty_trajectory() {
        let env = environment(3, (0, 0), vec![(2, 2)]);
        let mut state = env.state();
        let mut agent = agent();

        assert!(!state.evaluate(&mut agent, Vec::new()));
        assert_eq!(agent.fitness, 0.0);
        assert_eq!(env.treasure_count(), 1);
    }
}
