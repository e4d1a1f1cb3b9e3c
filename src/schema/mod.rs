//! Schema module - Configuration, environment and evolution types.

mod config;
mod environment;
mod evolution;

pub use config::*;
pub use environment::*;
pub use evolution::*;
