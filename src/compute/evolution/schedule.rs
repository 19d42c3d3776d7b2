//! Diversification shock schedule.

use crate::schema::{BreedingMode, ShockConfig};

use super::genome::GenomeRng;

/// Breeding decision for one generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleStep {
    pub mode: BreedingMode,
    /// A new shock fired at this generation.
    pub shock: bool,
}

/// Decides when the population breeds in diversify mode.
///
/// A shock fires on non-zero multiples of the current interval. The first
/// shock widens the interval to `later_interval` and every shock starts a
/// run of extra diversify generations of random length.
#[derive(Debug, Clone)]
pub struct ShockSchedule {
    interval: usize,
    later_interval: usize,
    duration_bounds: (u32, u32),
    remaining: u32,
}

impl ShockSchedule {
    pub fn new(config: &ShockConfig) -> Self {
        Self {
            interval: config.first_interval.max(1),
            later_interval: config.later_interval.max(1),
            duration_bounds: config.duration_bounds,
            remaining: 0,
        }
    }

    /// Breeding mode to use after evaluating `generation`.
    pub fn advance(&mut self, generation: usize, rng: &mut GenomeRng) -> ScheduleStep {
        if generation != 0 && generation % self.interval == 0 {
            self.interval = self.later_interval;
            let (min, max) = self.duration_bounds;
            self.remaining = rng.between(min, max);
            return ScheduleStep {
                mode: BreedingMode::Diversify,
                shock: true,
            };
        }

        let mode = if self.remaining > 0 {
            self.remaining -= 1;
            BreedingMode::Diversify
        } else {
            BreedingMode::Standard
        };
        ScheduleStep { mode, shock: false }
    }

    /// Extra diversify generations still pending.
    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Interval currently used to place shocks.
    pub fn interval(&self) -> usize {
        self.interval
    }
}
