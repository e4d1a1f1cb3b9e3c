//! Grid Evolve - Genetic search for move sequences on a 2D grid.
//!
//! A population of creatures, each a fixed-length sequence of compass
//! moves, is evolved toward a target cell. Every generation is scored in
//! parallel, the worst fraction is discarded and replaced by mutated
//! clones of the survivors.
//!
//! # Architecture
//!
//! - `schema`: Configuration, environment and population types
//! - `compute`: Path simulation, fitness and the evolution engine
//! - `console`: Command line, board rendering and the interactive menu
//!
//! # Example
//!
//! ```rust,no_run
//! use grid_evolve::{
//!     compute::{evolution::EvolutionEngine, trace_path},
//!     console::render_board,
//!     schema::{Environment, RunConfig},
//! };
//!
//! let config = RunConfig::default();
//! let env = Environment::open(config.width, config.height).unwrap();
//! let mut engine = EvolutionEngine::new(config, env).unwrap();
//!
//! engine.advance_n_generations(50).unwrap();
//!
//! if let Some((best, fitness)) = engine.best_creature() {
//!     println!("{} scored {:.3}", best.moves_string(), fitness);
//!     let path = trace_path(engine.environment(), &best.moves);
//!     print!("{}", render_board(engine.environment(), Some(&path)));
//! }
//! ```

pub mod compute;
pub mod console;
pub mod schema;

// Re-export commonly used types
pub use compute::evolution::{EngineError, EvolutionEngine};
pub use compute::{FitnessFunction, Outcome, PathSimulator, Terminal};
pub use schema::{Coord, Creature, Environment, Move, RunConfig};
