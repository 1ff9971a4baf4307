//! Core type definitions for the simulation.

use serde::{Deserialize, Serialize};
use std::fmt;

/// 2D position on the grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn add(&self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// Apply toroidal wrapping for given grid dimensions
    pub fn wrap(&self, width: i32, height: i32) -> Self {
        Self {
            x: self.x.rem_euclid(width),
            y: self.y.rem_euclid(height),
        }
    }

    /// Saturate into `[0, width) x [0, height)`
    pub fn clamp_to(&self, width: i32, height: i32) -> Self {
        Self {
            x: self.x.clamp(0, width - 1),
            y: self.y.clamp(0, height - 1),
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Von Neumann step direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    North,
    South,
    East,
    West,
}

impl Direction {
    pub fn to_delta(&self) -> (i32, i32) {
        match self {
            Direction::North => (0, -1),
            Direction::South => (0, 1),
            Direction::East => (1, 0),
            Direction::West => (-1, 0),
        }
    }

    /// Fixed iteration order used by every neighborhood query.
    pub fn all() -> [Direction; 4] {
        [
            Direction::South,
            Direction::North,
            Direction::East,
            Direction::West,
        ]
    }
}

/// How out-of-range coordinates are folded back onto the grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Topology {
    /// Modulo arithmetic on both axes (torus)
    #[default]
    Wrap,
    /// Saturate to the grid edge
    Clamp,
}

impl Topology {
    pub fn resolve(&self, pos: Position, width: i32, height: i32) -> Position {
        match self {
            Topology::Wrap => pos.wrap(width, height),
            Topology::Clamp => pos.clamp_to(width, height),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Species {
    Prey,
    Predator,
}

impl fmt::Display for Species {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Species::Prey => write!(f, "prey"),
            Species::Predator => write!(f, "predator"),
        }
    }
}

/// Per-cell species tag, as exposed to renderers and exporters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Cell {
    #[default]
    Empty,
    Prey,
    Predator,
}

impl Cell {
    /// Compact numeric tag: 0 empty, 1 prey, 2 predator.
    pub fn symbol(&self) -> u8 {
        match self {
            Cell::Empty => 0,
            Cell::Prey => 1,
            Cell::Predator => 2,
        }
    }

    pub fn species(&self) -> Option<Species> {
        match self {
            Cell::Empty => None,
            Cell::Prey => Some(Species::Prey),
            Cell::Predator => Some(Species::Predator),
        }
    }
}

impl From<Species> for Cell {
    fn from(species: Species) -> Self {
        match species {
            Species::Prey => Cell::Prey,
            Species::Predator => Cell::Predator,
        }
    }
}

/// One row of the population time series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopulationRecord {
    pub step: u64,
    pub prey: usize,
    pub predators: usize,
}

impl PopulationRecord {
    pub fn new(step: u64, prey: usize, predators: usize) -> Self {
        Self {
            step,
            prey,
            predators,
        }
    }
}
