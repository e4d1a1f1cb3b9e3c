//! Evolution types: moves, creatures, progress and history.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::Coord;

/// One of the eight compass moves. `N` increases `y`.
///
/// Rendered boards print the highest row first, so `N` points toward the top
/// of the board and `NE` climbs from a bottom-left start toward a top-right end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum Move {
    N = 0,
    NE = 1,
    E = 2,
    SE = 3,
    S = 4,
    SW = 5,
    W = 6,
    NW = 7,
}

impl Move {
    /// Number of distinct moves.
    pub const COUNT: u8 = 8;

    /// All moves in index order.
    pub const ALL: [Move; 8] = [
        Move::N,
        Move::NE,
        Move::E,
        Move::SE,
        Move::S,
        Move::SW,
        Move::W,
        Move::NW,
    ];

    /// Move with the given index, if it is in `[0, 8)`.
    #[inline]
    pub fn from_index(index: u8) -> Option<Self> {
        Self::ALL.get(index as usize).copied()
    }

    #[inline]
    pub fn index(self) -> u8 {
        self as u8
    }

    /// The move following this one in compass order, wrapping from `NW` to `N`.
    #[inline]
    pub fn next(self) -> Self {
        Self::ALL[((self.index() + 1) % Self::COUNT) as usize]
    }

    /// Grid displacement `(dx, dy)`.
    #[inline]
    pub const fn delta(self) -> (i32, i32) {
        match self {
            Move::N => (0, 1),
            Move::NE => (1, 1),
            Move::E => (1, 0),
            Move::SE => (1, -1),
            Move::S => (0, -1),
            Move::SW => (-1, -1),
            Move::W => (-1, 0),
            Move::NW => (-1, 1),
        }
    }

    /// Apply this move to `from`, ignoring grid bounds.
    #[inline]
    pub fn apply(self, from: Coord) -> Coord {
        from.offset(self.delta())
    }
}

impl TryFrom<u8> for Move {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::from_index(value).ok_or(value)
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A candidate solution: a fixed-length move sequence and its fitness.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Creature {
    /// Stable identity, used only to break fitness ties.
    pub id: u64,
    /// The genome.
    pub moves: Vec<Move>,
    /// Fitness score, `None` until evaluated.
    pub fitness: Option<f64>,
    /// Generation the creature was born in.
    pub generation: usize,
    /// Id of the survivor this creature was cloned from.
    #[serde(default)]
    pub parent: Option<u64>,
}

impl Creature {
    /// Unevaluated creature without a parent.
    pub fn new(id: u64, moves: Vec<Move>, generation: usize) -> Self {
        Self {
            id,
            moves,
            fitness: None,
            generation,
            parent: None,
        }
    }

    #[inline]
    pub fn is_evaluated(&self) -> bool {
        self.fitness.is_some()
    }

    /// Move sequence as compass names separated by spaces.
    pub fn moves_string(&self) -> String {
        self.moves
            .iter()
            .map(|m| m.to_string())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Serializable view of the population at a generation boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopulationSnapshot {
    pub generation: usize,
    pub creatures: Vec<Creature>,
}

/// Per-generation statistics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvolutionHistory {
    /// Best fitness of each evaluated generation.
    pub best_fitness: Vec<f64>,
    /// Mean fitness of each evaluated generation.
    pub avg_fitness: Vec<f64>,
    /// Number of creatures that reached the end cell in each generation.
    pub reached_end: Vec<usize>,
}

impl EvolutionHistory {
    pub fn len(&self) -> usize {
        self.best_fitness.len()
    }

    pub fn is_empty(&self) -> bool {
        self.best_fitness.is_empty()
    }
}

/// Where the generation loop currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EvolutionPhase {
    /// Waiting for a request.
    Idle,
    /// Fitness evaluation in progress on the worker pool.
    Evaluating,
    /// Ranking and choosing creatures to discard.
    Selecting,
    /// Refilling the population with mutated clones.
    Reproducing,
    /// The last request finished.
    Done,
    /// An internal invariant was violated; the engine refuses further work.
    Faulted,
}

/// Why a multi-generation request stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopReason {
    /// Every requested generation completed.
    Completed,
    /// The cancel handle was raised between generations.
    Cancelled,
}

/// Progress report emitted after each completed generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvolutionProgress {
    /// Generations completed so far.
    pub generation: usize,
    /// Best fitness of the last evaluated generation.
    pub best_fitness: f64,
    /// Mean fitness of the last evaluated generation.
    pub avg_fitness: f64,
    /// Creatures that reached the end in the last evaluated generation.
    pub reached_end: usize,
    /// Current phase.
    pub phase: EvolutionPhase,
}

/// Outcome of a multi-generation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvanceReport {
    /// Generations completed by this request.
    pub completed: usize,
    pub stop_reason: StopReason,
}
