//! Move replay and fitness scoring.

use serde::{Deserialize, Serialize};

use crate::schema::{Coord, Environment, Move};

/// Bonus awarded for reaching the end cell. Strictly greater than anything
/// the distance term can contribute.
pub const LARGE_BONUS: f64 = 1000.0;

/// How a simulated walk ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Terminal {
    /// The end cell was reached; later moves were not played.
    ReachedEnd,
    /// Moves ran out and the last one was rejected by a wall or the grid edge.
    Blocked,
    /// Moves ran out without reaching the end.
    Exhausted,
}

/// Result of replaying one move sequence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Outcome {
    pub fitness: f64,
    pub terminal: Terminal,
    pub final_position: Coord,
    /// Moves consumed, rejected ones included.
    pub moves_used: usize,
    /// Moves left unplayed after reaching the end.
    pub unused_moves: usize,
}

/// Scores a move sequence against an environment.
///
/// Implementations are shared by every evaluation worker and must not keep
/// mutable state between calls.
pub trait FitnessFunction: Send + Sync {
    fn evaluate(&self, env: &Environment, moves: &[Move]) -> Result<Outcome, SimulationError>;

    /// Name used in logs.
    fn name(&self) -> &str;
}

/// Replays moves from the start cell, rejecting moves into walls or off the
/// grid, and stops as soon as the end cell is reached.
#[derive(Debug, Clone, Copy, Default)]
pub struct PathSimulator;

impl FitnessFunction for PathSimulator {
    fn evaluate(&self, env: &Environment, moves: &[Move]) -> Result<Outcome, SimulationError> {
        if moves.is_empty() {
            return Err(SimulationError::EmptyMoveSequence);
        }
        Ok(walk(env, moves, |_| {}))
    }

    fn name(&self) -> &str {
        "path"
    }
}

/// Cells visited by a creature, starting with the start cell. Rejected moves
/// add no entry.
pub fn trace_path(env: &Environment, moves: &[Move]) -> Vec<Coord> {
    let mut path = vec![env.start()];
    walk(env, moves, |pos| path.push(pos));
    path
}

/// Fitness for a walk ending at `final_position`.
pub fn score(env: &Environment, final_position: Coord, reached_end: bool, unused_moves: usize) -> f64 {
    let distance = final_position.manhattan(env.end()) as f64;
    let proximity = 1.0 / (1.0 + distance);
    if reached_end {
        LARGE_BONUS + unused_moves as f64 + proximity
    } else {
        proximity
    }
}

fn walk(env: &Environment, moves: &[Move], mut on_step: impl FnMut(Coord)) -> Outcome {
    let end = env.end();
    let mut position = env.start();
    let mut moves_used = 0;
    let mut last_rejected = false;

    if position != end {
        for &mv in moves {
            moves_used += 1;
            let candidate = mv.apply(position);
            last_rejected = !env.is_walkable(candidate);
            if last_rejected {
                continue;
            }

            position = candidate;
            on_step(position);
            if position == end {
                break;
            }
        }
    }

    let reached_end = position == end;
    let unused_moves = moves.len() - moves_used;
    let terminal = if reached_end {
        Terminal::ReachedEnd
    } else if last_rejected {
        Terminal::Blocked
    } else {
        Terminal::Exhausted
    };

    Outcome {
        fitness: score(env, position, reached_end, unused_moves),
        terminal,
        final_position: position,
        moves_used,
        unused_moves,
    }
}

/// Errors raised by a fitness function.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SimulationError {
    #[error("Move sequence is empty")]
    EmptyMoveSequence,
    #[error("{0}")]
    Failed(String),
}
