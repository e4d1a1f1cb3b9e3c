//! Generation loop: evaluate, select, reproduce.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::compute::{FitnessFunction, LARGE_BONUS, PathSimulator};
use crate::schema::{
    AdvanceReport, ConfigError, Creature, Environment, EvolutionHistory, EvolutionPhase,
    EvolutionProgress, ParentSelection, PopulationSnapshot, RunConfig, StopReason,
    validate_generation_count,
};

use super::coordinator::{EvaluationCoordinator, EvaluationError};
use super::genome::GenomeRng;
use super::selection::{best_index, truncate_worst};

/// Evolution engine that owns the population and drives generations.
pub struct EvolutionEngine {
    config: RunConfig,
    env: Environment,
    fitness: Box<dyn FitnessFunction>,
    coordinator: EvaluationCoordinator,
    rng: GenomeRng,
    seed: u64,
    population: Vec<Creature>,
    history: EvolutionHistory,
    generation: usize,
    phase: EvolutionPhase,
    next_id: u64,
    cancelled: Arc<AtomicBool>,
}

impl EvolutionEngine {
    /// Create an engine with a random first generation.
    pub fn new(config: RunConfig, env: Environment) -> Result<Self, EngineError> {
        config.validate()?;

        let seed = config.random_seed.unwrap_or_else(rand::random);
        let coordinator = EvaluationCoordinator::new(config.nb_processes)?;
        log::info!(
            "Starting evolution: {} creatures x {} moves, {} workers, seed {}",
            config.nb_creatures,
            config.nb_moves,
            config.nb_processes,
            seed
        );
        log::debug!(
            "Each generation keeps {} survivors and breeds {} replacements",
            config.survivor_count(),
            config.deletion_count()
        );

        let mut engine = Self {
            config,
            env,
            fitness: Box::new(PathSimulator),
            coordinator,
            rng: GenomeRng::new(seed),
            seed,
            population: Vec::new(),
            history: EvolutionHistory::default(),
            generation: 0,
            phase: EvolutionPhase::Idle,
            next_id: 0,
            cancelled: Arc::new(AtomicBool::new(false)),
        };
        engine.initialize();
        Ok(engine)
    }

    /// Replace the fitness function.
    pub fn with_fitness_function(mut self, fitness: impl FitnessFunction + 'static) -> Self {
        self.fitness = Box::new(fitness);
        self
    }

    /// Get cancellation handle. Raising it stops a multi-generation request
    /// at the next generation boundary.
    ///
    /// The flag is only read and cleared by multi-generation requests. One
    /// raised while none is running stays set and cancels the next such
    /// request before its first generation.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancelled)
    }

    fn initialize(&mut self) {
        self.population = (0..self.config.nb_creatures)
            .map(|_| {
                let id = self.allocate_id();
                Creature::new(id, self.rng.random_moves(self.config.nb_moves), 0)
            })
            .collect();
    }

    fn allocate_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn environment(&self) -> &Environment {
        &self.env
    }

    /// Seed of the random generator driving this run.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn population(&self) -> &[Creature] {
        &self.population
    }

    pub fn history(&self) -> &EvolutionHistory {
        &self.history
    }

    pub fn phase(&self) -> EvolutionPhase {
        self.phase
    }

    /// Number of completed generations.
    pub fn current_generation(&self) -> usize {
        self.generation
    }

    /// Top-ranked evaluated creature and its fitness, if any generation has
    /// been evaluated.
    pub fn best_creature(&self) -> Option<(&Creature, f64)> {
        let creature = &self.population[best_index(&self.population)?];
        creature.fitness.map(|fitness| (creature, fitness))
    }

    /// Serializable copy of the current population.
    pub fn snapshot(&self) -> PopulationSnapshot {
        PopulationSnapshot {
            generation: self.generation,
            creatures: self.population.clone(),
        }
    }

    /// Get current progress.
    pub fn progress(&self) -> EvolutionProgress {
        EvolutionProgress {
            generation: self.generation,
            best_fitness: self.history.best_fitness.last().copied().unwrap_or(0.0),
            avg_fitness: self.history.avg_fitness.last().copied().unwrap_or(0.0),
            reached_end: self.history.reached_end.last().copied().unwrap_or(0),
            phase: self.phase,
        }
    }

    /// Run exactly one generation.
    pub fn advance_one_generation(&mut self) -> Result<(), EngineError> {
        self.ensure_usable()?;
        self.step_generation()?;
        self.phase = EvolutionPhase::Done;
        Ok(())
    }

    /// Run `n` generations, `n` in `[1, 100]`.
    pub fn advance_n_generations(&mut self, n: usize) -> Result<AdvanceReport, EngineError> {
        self.advance_with_callback(n, |_| {})
    }

    /// Run `n` generations, reporting progress after each one.
    ///
    /// Generations run strictly one after another. Cancellation is checked
    /// only between generations.
    pub fn advance_with_callback<F>(&mut self, n: usize, callback: F) -> Result<AdvanceReport, EngineError>
    where
        F: Fn(&EvolutionProgress),
    {
        validate_generation_count(n)?;
        self.ensure_usable()?;

        for completed in 0..n {
            if self.cancelled.swap(false, Ordering::Relaxed) {
                log::info!("Run cancelled after {completed} of {n} generations");
                self.phase = EvolutionPhase::Done;
                return Ok(AdvanceReport {
                    completed,
                    stop_reason: StopReason::Cancelled,
                });
            }

            self.step_generation()?;
            callback(&self.progress());
        }

        self.phase = EvolutionPhase::Done;
        Ok(AdvanceReport {
            completed: n,
            stop_reason: StopReason::Completed,
        })
    }

    fn ensure_usable(&self) -> Result<(), EngineError> {
        if self.phase == EvolutionPhase::Faulted {
            return Err(EngineError::Faulted);
        }
        Ok(())
    }

    /// Evaluate, select and reproduce. Nothing is committed unless every
    /// stage succeeds.
    fn step_generation(&mut self) -> Result<(), EngineError> {
        self.phase = EvolutionPhase::Evaluating;
        let scored = match self
            .coordinator
            .evaluate(&self.env, self.fitness.as_ref(), &self.population)
        {
            Ok(scored) => scored,
            Err(err) => {
                log::warn!("Generation {} aborted: {err}", self.generation + 1);
                self.phase = EvolutionPhase::Idle;
                return Err(err.into());
            }
        };

        self.phase = EvolutionPhase::Selecting;
        let (best, avg, reached_end) = summarize(&scored);
        let mut survivors = scored;
        let removed = truncate_worst(&mut survivors, self.config.deletion_percentage)
            .ok_or_else(|| self.fault(InvariantViolation::Unevaluated))?;
        if survivors.is_empty() && !removed.is_empty() {
            return Err(self.fault(InvariantViolation::NoSurvivors));
        }

        self.phase = EvolutionPhase::Reproducing;
        let children = self.reproduce(&survivors, removed.len());
        survivors.extend(children);
        self.check_invariants(&survivors)
            .map_err(|violation| self.fault(violation))?;

        self.population = survivors;
        self.generation += 1;
        self.history.best_fitness.push(best);
        self.history.avg_fitness.push(avg);
        self.history.reached_end.push(reached_end);
        log::info!(
            "Generation {}: best={:.3}, avg={:.3}, reached end={}, replaced={}",
            self.generation,
            best,
            avg,
            reached_end,
            removed.len()
        );
        Ok(())
    }

    /// Clone `count` survivors and mutate the clones.
    fn reproduce(&mut self, survivors: &[Creature], count: usize) -> Vec<Creature> {
        let weights: Option<Vec<f64>> = match self.config.parent_selection {
            ParentSelection::Uniform => None,
            ParentSelection::FitnessWeighted => Some(
                survivors
                    .iter()
                    .map(|c| c.fitness.unwrap_or(0.0).max(0.0))
                    .collect(),
            ),
        };

        (0..count)
            .map(|_| {
                let idx = match &weights {
                    Some(weights) => self.rng.pick_weighted(weights),
                    None => self.rng.pick_uniform(survivors.len()),
                };
                let parent = &survivors[idx];
                let mut moves = parent.moves.clone();
                self.rng.mutate(&mut moves, self.config.mutation_rate);

                Creature {
                    id: self.allocate_id(),
                    moves,
                    fitness: None,
                    generation: self.generation + 1,
                    parent: Some(parent.id),
                }
            })
            .collect()
    }

    fn check_invariants(&self, creatures: &[Creature]) -> Result<(), InvariantViolation> {
        if creatures.len() != self.config.nb_creatures {
            return Err(InvariantViolation::PopulationSize {
                expected: self.config.nb_creatures,
                found: creatures.len(),
            });
        }
        if let Some(bad) = creatures
            .iter()
            .find(|c| c.moves.len() != self.config.nb_moves)
        {
            return Err(InvariantViolation::MoveCount {
                id: bad.id,
                expected: self.config.nb_moves,
                found: bad.moves.len(),
            });
        }
        Ok(())
    }

    fn fault(&mut self, violation: InvariantViolation) -> EngineError {
        log::error!("Invariant violated: {violation}");
        self.phase = EvolutionPhase::Faulted;
        EngineError::Invariant(violation)
    }
}

/// Best fitness, mean fitness and number of creatures that reached the end.
fn summarize(scored: &[Creature]) -> (f64, f64, usize) {
    let fitness = || scored.iter().filter_map(|c| c.fitness);
    let best = fitness().fold(f64::NEG_INFINITY, f64::max);
    let avg = fitness().sum::<f64>() / scored.len().max(1) as f64;
    let reached_end = fitness().filter(|&f| f >= LARGE_BONUS).count();
    (best, avg, reached_end)
}

/// Internal consistency failures. These indicate a bug and are fatal.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvariantViolation {
    #[error("population size drifted: expected {expected}, found {found}")]
    PopulationSize { expected: usize, found: usize },
    #[error("creature {id} has {found} moves, expected {expected}")]
    MoveCount { id: u64, expected: usize, found: usize },
    #[error("a creature reached selection without a fitness score")]
    Unevaluated,
    #[error("no survivors left to clone from")]
    NoSurvivors,
}

/// Errors returned by the generation loop.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Evaluation(#[from] EvaluationError),
    #[error("Invariant violated: {0}")]
    Invariant(#[from] InvariantViolation),
    #[error("Engine is faulted after an earlier invariant violation")]
    Faulted,
}
