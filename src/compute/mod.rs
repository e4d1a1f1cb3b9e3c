//! Compute module - Simulation and evolution.

mod simulator;

pub mod evolution;

pub use simulator::*;
