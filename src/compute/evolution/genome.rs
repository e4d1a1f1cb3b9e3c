//! Move-sequence generation and mutation.

use rand::distributions::WeightedIndex;
use rand::prelude::*;

use crate::schema::Move;

/// Random number generator wrapper for genome operations.
///
/// One instance is owned by the engine and seeded once, so a fixed seed
/// reproduces every generated and mutated sequence.
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

    /// Uniformly random move.
    #[inline]
    pub fn random_move(&mut self) -> Move {
        Move::ALL[self.rng.gen_range(0..Move::COUNT as usize)]
    }

    /// Generate `len` uniformly random moves.
    pub fn random_moves(&mut self, len: usize) -> Vec<Move> {
        (0..len).map(|_| self.random_move()).collect()
    }

    /// Mutate each gene independently with probability `rate_percent / 100`.
    ///
    /// A mutated gene always changes: when the fresh draw equals the current
    /// move, the next move in compass order is used instead. Returns the
    /// number of mutated genes.
    pub fn mutate(&mut self, moves: &mut [Move], rate_percent: u32) -> usize {
        let mut mutated = 0;
        for gene in moves.iter_mut() {
            if self.rng.gen_range(0..100) < rate_percent {
                let fresh = self.random_move();
                *gene = if fresh == *gene { fresh.next() } else { fresh };
                mutated += 1;
            }
        }
        mutated
    }

    /// Uniform index in `[0, len)`.
    #[inline]
    pub fn pick_uniform(&mut self, len: usize) -> usize {
        self.rng.gen_range(0..len)
    }

    /// Index drawn with probability proportional to `weights`.
    ///
    /// Falls back to a uniform pick when the weights cannot form a
    /// distribution (all zero or non-finite).
    pub fn pick_weighted(&mut self, weights: &[f64]) -> usize {
        match WeightedIndex::new(weights) {
            Ok(dist) => dist.sample(&mut self.rng),
            Err(_) => self.pick_uniform(weights.len()),
        }
    }
}

/// Number of positions at which two move sequences differ.
pub fn hamming_distance(a: &[Move], b: &[Move]) -> usize {
    a.iter().zip(b).filter(|(x, y)| x != y).count()
        + a.len().abs_diff(b.len())
}
