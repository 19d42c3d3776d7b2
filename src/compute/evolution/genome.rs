//! Genome manipulation utilities for evolutionary search.
//!
//! Provides random generation, crossover, and mutation operations. All
//! randomness goes through [`GenomeRng`] so a seeded run is reproducible.

use rand::prelude::*;

use crate::schema::Genome;

/// Point mutations applied to a single gene.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationOperator {
    /// Exchange the values at two distinct random positions.
    Swap,
    /// Add one, wrapping 255 to 0.
    Increment,
    /// Subtract one, wrapping 0 to 255.
    Decrement,
}

impl MutationOperator {
    pub const ALL: [MutationOperator; 3] = [
        MutationOperator::Swap,
        MutationOperator::Increment,
        MutationOperator::Decrement,
    ];
}

/// Random number generator wrapper for genome operations.
pub struct GenomeRng {
    rng: StdRng,
}

impl GenomeRng {
    /// Create from seed.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Create with random seed.
    pub fn random() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Uniformly random genome of `length` bytes.
    pub fn random_genome(&mut self, length: usize) -> Genome {
        let mut genes = vec![0u8; length];
        self.rng.fill_bytes(&mut genes);
        Genome::new(genes)
    }

    /// Mutate a genome in place.
    ///
    /// Runs 0-4 sweeps when `rate < 0.5` and 3-9 sweeps otherwise. Every sweep
    /// visits each position and, with probability `rate`, applies one
    /// uniformly chosen [`MutationOperator`]. Sweeps compound.
    pub fn mutate(&mut self, genome: &mut Genome, rate: f64) {
        let rounds = self.sweep_rounds(rate);

        for _ in 0..rounds {
            for position in 0..genome.len() {
                if self.rng.r#gen::<f64>() < rate {
                    let operator = self.operator();
                    self.apply(genome, position, operator);
                }
            }
        }
    }

    /// Number of mutation sweeps for `rate`: 0-4 below 0.5, 3-9 from 0.5 up.
    pub fn sweep_rounds(&mut self, rate: f64) -> u32 {
        if rate < 0.5 {
            self.rng.gen_range(0..=4)
        } else {
            self.rng.gen_range(3..=9)
        }
    }

    /// Uniformly chosen mutation operator.
    pub fn operator(&mut self) -> MutationOperator {
        MutationOperator::ALL[self.rng.gen_range(0..MutationOperator::ALL.len())]
    }

    /// Apply `operator` at `position`.
    pub fn apply(&mut self, genome: &mut Genome, position: usize, operator: MutationOperator) {
        match operator {
            MutationOperator::Swap => {
                if genome.len() >= 2 {
                    let picks = rand::seq::index::sample(&mut self.rng, genome.len(), 2);
                    genome.swap(picks.index(0), picks.index(1));
                }
            }
            MutationOperator::Increment => {
                genome[position] = genome[position].wrapping_add(1);
            }
            MutationOperator::Decrement => {
                genome[position] = genome[position].wrapping_sub(1);
            }
        }
    }

    /// Fitness-ordered one-point crossover.
    ///
    /// With a cut point `p` in `0..=len`, the first child is `better[..p]`
    /// followed by the first `len - p` genes of `other`; the second child is
    /// `better[..p]` followed by `other[p..]`.
    pub fn crossover(&mut self, better: &Genome, other: &Genome) -> (Genome, Genome) {
        debug_assert_eq!(better.len(), other.len());
        let len = better.len();
        let cut = self.rng.gen_range(0..=len);

        let mut first = Vec::with_capacity(len);
        first.extend_from_slice(&better[..cut]);
        first.extend_from_slice(&other[..len - cut]);

        let mut second = Vec::with_capacity(len);
        second.extend_from_slice(&better[..cut]);
        second.extend_from_slice(&other[cut..]);

        (Genome::new(first), Genome::new(second))
    }

    /// Unordered rotation crossover used while diversifying.
    ///
    /// With a cut point `p`, children are `a[p..] ++ b[..p]` and
    /// `b[p..] ++ a[..p]`.
    pub fn random_crossover(&mut self, a: &Genome, b: &Genome) -> (Genome, Genome) {
        debug_assert_eq!(a.len(), b.len());
        let cut = self.rng.gen_range(0..=a.len());

        let first = [&a[cut..], &b[..cut]].concat();
        let second = [&b[cut..], &a[..cut]].concat();

        (Genome::new(first), Genome::new(second))
    }

    /// Uniform index in `0..len`.
    pub fn index(&mut self, len: usize) -> usize {
        self.rng.gen_range(0..len)
    }

    /// `amount` distinct uniform indices in `0..len`.
    pub fn distinct_indices(&mut self, len: usize, amount: usize) -> Vec<usize> {
        rand::seq::index::sample(&mut self.rng, len, amount).into_vec()
    }

    /// Fair coin flip.
    pub fn coin(&mut self) -> bool {
        self.rng.gen_bool(0.5)
    }

    /// Uniform integer in `min..=max`.
    pub fn between(&mut self, min: u32, max: u32) -> u32 {
        self.rng.gen_range(min..=max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_random_genome() {
        let mut rng = GenomeRng::new(42);
        let genome = rng.random_genome(30);
        assert_eq!(genome.len(), 30);

        let other = rng.random_genome(30);
        assert_ne!(genome, other);
    }

    #[test]
    fn test_seeded_reproducible() {
        let mut a = GenomeRng::new(7);
        let mut b = GenomeRng::new(7);
        assert_eq!(a.random_genome(16), b.random_genome(16));

        let mut ga = Genome::new(vec![10; 16]);
        let mut gb = ga.clone();
        a.mutate(&mut ga, 0.7);
        b.mutate(&mut gb, 0.7);
        assert_eq!(ga, gb);
    }

    #[test]
    fn test_apply_operators_wrap() {
        let mut rng = GenomeRng::new(1);
        let mut genome = Genome::new(vec![255, 0, 9]);

        rng.apply(&mut genome, 0, MutationOperator::Increment);
        rng.apply(&mut genome, 1, MutationOperator::Decrement);
        assert_eq!(&genome[..2], &[0, 255]);

        let before = genome.clone();
        rng.apply(&mut genome, 2, MutationOperator::Swap);
        let mut sorted_before = before.to_vec();
        let mut sorted_after = genome.to_vec();
        sorted_before.sort_unstable();
        sorted_after.sort_unstable();
        assert_eq!(sorted_before, sorted_after);
        let changed = before.iter().zip(genome.iter()).filter(|(a, b)| a != b).count();
        assert_eq!(changed, 2);
    }

    #[test]
    fn test_zero_rate_is_identity() {
        let mut rng = GenomeRng::new(3);
        let original = rng.random_genome(20);
        let mut genome = original.clone();
        for _ in 0..50 {
            rng.mutate(&mut genome, 0.0);
        }
        assert_eq!(genome, original);
    }

    #[test]
    fn test_high_rate_changes_genome() {
        let mut rng = GenomeRng::new(11);
        let original = Genome::new(vec![100; 30]);
        let mut genome = original.clone();
        rng.mutate(&mut genome, 1.0);
        assert_ne!(genome, original);
    }

    #[test]
    fn test_sweep_rounds_split_at_half() {
        let mut rng = GenomeRng::new(21);
        let observed = |rng: &mut GenomeRng, rate: f64| {
            let mut seen: Vec<u32> = (0..2000).map(|_| rng.sweep_rounds(rate)).collect();
            seen.sort_unstable();
            seen.dedup();
            seen
        };

        assert_eq!(observed(&mut rng, 0.0), (0..=4).collect::<Vec<_>>());
        assert_eq!(observed(&mut rng, 0.49), (0..=4).collect::<Vec<_>>());
        assert_eq!(observed(&mut rng, 0.5), (3..=9).collect::<Vec<_>>());
        assert_eq!(observed(&mut rng, 0.9), (3..=9).collect::<Vec<_>>());
    }

    #[test]
    fn test_operator_choice_covers_all() {
        let mut rng = GenomeRng::new(99);
        let mut seen = [false; 3];
        for _ in 0..200 {
            let idx = match rng.operator() {
                MutationOperator::Swap => 0,
                MutationOperator::Increment => 1,
                MutationOperator::Decrement => 2,
            };
            seen[idx] = true;
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn test_crossover_layout() {
        let better = Genome::new(vec![1, 2, 3, 4]);
        let other = Genome::new(vec![5, 6, 7, 8]);
        let mut rng = GenomeRng::new(0);

        for _ in 0..20 {
            let (first, second) = rng.crossover(&better, &other);
            let cut = first.iter().take_while(|&&g| g < 5).count();
            assert_eq!(&first[..cut], &better[..cut]);
            assert_eq!(&first[cut..], &other[..4 - cut]);
            assert_eq!(&second[..cut], &better[..cut]);
            assert_eq!(&second[cut..], &other[cut..]);
        }
    }

    #[test]
    fn test_random_crossover_layout() {
        let a = Genome::new(vec![1, 2, 3, 4]);
        let b = Genome::new(vec![5, 6, 7, 8]);
        let mut rng = GenomeRng::new(0);

        for _ in 0..20 {
            let (first, second) = rng.random_crossover(&a, &b);
            let cut = 4 - first.iter().take_while(|&&g| g < 5).count();
            assert_eq!(&first[..4 - cut], &a[cut..]);
            assert_eq!(&first[4 - cut..], &b[..cut]);
            assert_eq!(&second[..4 - cut], &b[cut..]);
            assert_eq!(&second[4 - cut..], &a[..cut]);
        }
    }

    #[test]
    fn test_distinct_indices() {
        let mut rng = GenomeRng::new(4);
        for _ in 0..50 {
            let mut picks = rng.distinct_indices(5, 4);
            picks.sort_unstable();
            picks.dedup();
            assert_eq!(picks.len(), 4);
            assert!(picks.iter().all(|&i| i < 5));
        }
    }

    proptest! {
        #[test]
        fn prop_mutation_preserves_length(
            genes in proptest::collection::vec(any::<u8>(), 2..64),
            rate in 0.0f64..=1.0,
            seed in any::<u64>(),
        ) {
            let mut rng = GenomeRng::new(seed);
            let mut genome = Genome::new(genes.clone());
            rng.mutate(&mut genome, rate);
            prop_assert_eq!(genome.len(), genes.len());
        }

        #[test]
        fn prop_crossover_preserves_length(
            pair in (1usize..64).prop_flat_map(|len| (
                proptest::collection::vec(any::<u8>(), len),
                proptest::collection::vec(any::<u8>(), len),
            )),
            seed in any::<u64>(),
        ) {
            let (a, b) = (Genome::new(pair.0), Genome::new(pair.1));
            let mut rng = GenomeRng::new(seed);

            let (c1, c2) = rng.crossover(&a, &b);
            prop_assert_eq!(c1.len(), a.len());
            prop_assert_eq!(c2.len(), a.len());

            let (r1, r2) = rng.random_crossover(&a, &b);
            prop_assert_eq!(r1.len(), a.len());
            prop_assert_eq!(r2.len(), a.len());
        }
    }
}
