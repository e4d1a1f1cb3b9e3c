//! Parallel fitness evaluation over a fixed worker pool.
//!
//! The population is cut into one contiguous slice per worker. Each worker
//! scores its own slice and nothing else; the call returns only once every
//! slice is done, and a failure in any slice discards the whole batch.

use std::ops::Range;
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::compute::{FitnessFunction, SimulationError};
use crate::schema::{Creature, Environment};

/// Dispatches fitness evaluation across a dedicated thread pool.
pub struct EvaluationCoordinator {
    pool: ThreadPool,
    workers: usize,
}

impl EvaluationCoordinator {
    /// Create a coordinator backed by exactly `workers` threads.
    pub fn new(workers: usize) -> Result<Self, EvaluationError> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("evaluator-{i}"))
            .build()
            .map_err(|e| EvaluationError::Pool {
                workers,
                message: e.to_string(),
            })?;

        Ok(Self { pool, workers })
    }

    /// Number of workers.
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Score every creature and return the scored copy, in the original order.
    ///
    /// `creatures` itself is never modified, so a failed evaluation leaves
    /// the caller's population exactly as it was.
    pub fn evaluate(
        &self,
        env: &Environment,
        fitness: &dyn FitnessFunction,
        creatures: &[Creature],
    ) -> Result<Vec<Creature>, EvaluationError> {
        let start = Instant::now();
        let mut scored = creatures.to_vec();
        let ranges = partition(scored.len(), self.workers);
        let slices = split_disjoint(&mut scored, &ranges);

        let results: Vec<Result<(), EvaluationError>> = self.pool.install(|| {
            slices
                .into_par_iter()
                .enumerate()
                .with_max_len(1)
                .map(|(worker, slice)| evaluate_slice(worker, env, fitness, slice))
                .collect()
        });
        results.into_iter().collect::<Result<(), _>>()?;

        log::debug!(
            "Evaluated {} creatures with {} on {} workers in {:.2?}",
            scored.len(),
            fitness.name(),
            self.workers,
            start.elapsed()
        );
        Ok(scored)
    }
}

/// Split `len` items into `workers` contiguous ranges whose sizes differ by
/// at most one. Larger ranges come first.
pub fn partition(len: usize, workers: usize) -> Vec<Range<usize>> {
    let workers = workers.max(1);
    let base = len / workers;
    let extra = len % workers;

    let mut start = 0;
    (0..workers)
        .map(|i| {
            let size = base + usize::from(i < extra);
            let range = start..start + size;
            start += size;
            range
        })
        .collect()
}

/// Borrow consecutive, non-overlapping sub-slices of `items`.
fn split_disjoint<'a, T>(mut rest: &'a mut [T], ranges: &[Range<usize>]) -> Vec<&'a mut [T]> {
    let mut slices = Vec::with_capacity(ranges.len());
    for range in ranges {
        let (head, tail) = std::mem::take(&mut rest).split_at_mut(range.len());
        slices.push(head);
        rest = tail;
    }
    slices
}

fn evaluate_slice(
    worker: usize,
    env: &Environment,
    fitness: &dyn FitnessFunction,
    slice: &mut [Creature],
) -> Result<(), EvaluationError> {
    let run = || -> Result<(), EvaluationError> {
        for creature in slice.iter_mut() {
            let outcome = fitness.evaluate(env, &creature.moves).map_err(|source| {
                EvaluationError::Simulation {
                    worker,
                    creature: creature.id,
                    source,
                }
            })?;
            creature.fitness = Some(outcome.fitness);
        }
        Ok(())
    };

    panic::catch_unwind(AssertUnwindSafe(run)).unwrap_or_else(|payload| {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        Err(EvaluationError::WorkerPanicked { worker, message })
    })
}

/// Errors raised while evaluating a generation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvaluationError {
    #[error("Worker {worker} failed on creature {creature}: {source}")]
    Simulation {
        worker: usize,
        creature: u64,
        #[source]
        source: SimulationError,
    },
    #[error("Worker {worker} panicked: {message}")]
    WorkerPanicked { worker: usize, message: String },
    #[error("Cannot start {workers} evaluation workers: {message}")]
    Pool { workers: usize, message: String },
}
