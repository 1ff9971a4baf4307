//! Predator-prey world engine.
//!
//! This crate implements the 2D grid where prey and predators move, feed,
//! breed and die, plus the tick loop that drives them.

pub mod animal;
pub mod grid;
pub mod run;
pub mod simulation;

pub use animal::{Animal, AnimalKind, Metabolism};
pub use grid::{AnimalId, Grid, MoveOutcome};
pub use run::{RunJob, RunResult};
pub use simulation::{Simulation, SimulationState, SimulationTotals, TickReport};
