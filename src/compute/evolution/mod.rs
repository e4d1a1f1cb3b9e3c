//! Generational search over move sequences.
//!
//! # Overview
//!
//! - **Genome Operations** (`genome`): random move sequences and mutation
//! - **Selection** (`selection`): fitness ranking and truncation of the worst
//! - **Coordinator** (`coordinator`): parallel evaluation on a fixed worker pool
//! - **Search** (`search`): the generation loop tying the stages together
//!
//! # Example
//!
//! ```rust,no_run
//! use grid_evolve::compute::evolution::EvolutionEngine;
//! use grid_evolve::schema::{Environment, RunConfig};
//!
//! let config = RunConfig::default();
//! let env = Environment::open(config.width, config.height).unwrap();
//!
//! let mut engine = EvolutionEngine::new(config, env).unwrap();
//! engine
//!     .advance_with_callback(10, |progress| {
//!         println!("Generation {}: best fitness = {:.3}",
//!             progress.generation, progress.best_fitness);
//!     })
//!     .unwrap();
//!
//! if let Some((best, fitness)) = engine.best_creature() {
//!     println!("Best: {} ({:.3})", best.moves_string(), fitness);
//! }
//! ```

mod coordinator;
mod genome;
mod search;
mod selection;

pub use coordinator::{EvaluationCoordinator, EvaluationError, partition};
pub use genome::{GenomeRng, hamming_distance};
pub use search::{EngineError, EvolutionEngine, InvariantViolation};
pub use selection::{best_index, rank_order, removal_count, truncate_worst};
