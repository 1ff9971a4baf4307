//! Simulation engine: owns the grid and drives the per-tick update.

use crate::animal::Animal;
use crate::grid::{Grid, MoveOutcome};
use lv_core::{Cell, HistorySummary, PopulationRecord, Position, Result, SimulationConfig};
use rand::seq::{index, SliceRandom};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, event, info, trace, warn, Level};

/// Lifecycle of a simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SimulationState {
    /// Freshly seeded, no tick executed yet
    Initialized,
    Running,
    /// Closed by [`Simulation::finish`]; further steps are ignored
    Terminated,
}

/// What happened during a single tick
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickReport {
    pub step: u64,
    pub prey_eaten: usize,
    pub starved: usize,
    pub births: usize,
    /// Offspring lost because no adjacent cell was free
    pub births_discarded: usize,
    pub blocked_moves: usize,
}

/// Running totals since construction or the last reset
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationTotals {
    pub births: u64,
    pub births_discarded: u64,
    pub prey_eaten: u64,
    pub starved: u64,
}

impl SimulationTotals {
    fn absorb(&mut self, report: &TickReport) {
        self.births += report.births as u64;
        self.births_discarded += report.births_discarded as u64;
        self.prey_eaten += report.prey_eaten as u64;
        self.starved += report.starved as u64;
    }
}

/// Where the starting population comes from
#[derive(Debug, Clone)]
enum Seeding {
    /// Distinct uniform-random cells, counts taken from the config
    Random,
    /// Explicit animals, re-placed on every reset
    Fixed(Vec<Animal>),
}

pub struct Simulation {
    grid: Grid,
    config: SimulationConfig,
    seeding: Seeding,
    rng: ChaCha8Rng,
    step_count: u64,
    state: SimulationState,
    history: Vec<PopulationRecord>,
    totals: SimulationTotals,
}

impl Simulation {
    /// Build a simulation seeded with the configured random population.
    pub fn new(config: SimulationConfig) -> Result<Self> {
        config.validate()?;
        Self::build(config, Seeding::Random)
    }

    /// Build a simulation from explicitly placed animals.
    ///
    /// The config's initial counts are ignored; everything else applies.
    pub fn with_animals(config: SimulationConfig, animals: Vec<Animal>) -> Result<Self> {
        config.validate_for_population(animals.len())?;
        Self::build(config, Seeding::Fixed(animals))
    }

    fn build(config: SimulationConfig, seeding: Seeding) -> Result<Self> {
        let rng = Self::make_rng(config.seed);
        let grid = Grid::from_config(&config.grid);

        let mut sim = Self {
            grid,
            config,
            seeding,
            rng,
            step_count: 0,
            state: SimulationState::Initialized,
            history: Vec::new(),
            totals: SimulationTotals::default(),
        };
        sim.populate()?;

        let (prey, predators) = sim.population_counts();
        info!(
            event = "simulation_created",
            width = sim.grid.width(),
            height = sim.grid.height(),
            topology = ?sim.grid.topology(),
            prey = prey,
            predators = predators,
            seed = ?sim.config.seed,
            "Simulation initialized"
        );

        Ok(sim)
    }

    fn make_rng(seed: Option<u64>) -> ChaCha8Rng {
        match seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        }
    }

    fn populate(&mut self) -> Result<()> {
        match &self.seeding {
            Seeding::Random => {
                let prey = &self.config.prey;
                let predator = &self.config.predator;
                let total = prey.initial_count + predator.initial_count;
                let sites = index::sample(&mut self.rng, self.grid.capacity(), total);

                for (n, site) in sites.into_iter().enumerate() {
                    let pos = self.grid.index_to_pos(site);
                    let animal = if n < prey.initial_count {
                        Animal::prey(pos, prey.reproduction_time)
                    } else {
                        Animal::predator(
                            pos,
                            predator.reproduction_time,
                            predator.initial_energy,
                            predator.energy_gain,
                            predator.energy_loss,
                        )
                    };
                    self.grid.place(animal)?;
                }
            }
            Seeding::Fixed(animals) => {
                for animal in animals {
                    self.grid.place(animal.clone())?;
                }
            }
        }

        if self.config.recording.enabled {
            self.record();
        }
        Ok(())
    }

    /// Advance one tick.
    ///
    /// Order: snapshot and shuffle, then for each surviving animal age, move,
    /// metabolize and reproduce; then place newborns, clear the dead and
    /// record. Only an internal invariant breach produces an error.
    pub fn step(&mut self) -> Result<TickReport> {
        if self.state == SimulationState::Terminated {
            warn!(tick = self.step_count, "Ignoring step on a terminated simulation");
            return Ok(TickReport {
                step: self.step_count,
                ..Default::default()
            });
        }

        self.state = SimulationState::Running;
        self.step_count += 1;
        let mut report = TickReport {
            step: self.step_count,
            ..Default::default()
        };

        // Freeze this tick's processing order; newborns never join it
        let mut snapshot = self.grid.animal_ids();
        snapshot.shuffle(&mut self.rng);

        let mut newborns = Vec::new();
        for &id in &snapshot {
            // Eaten earlier in this pass, or already starved
            match self.grid.get_mut(id) {
                Some(animal) if animal.is_alive() => animal.age(),
                _ => continue,
            }

            let (from, target) = match self.grid.get(id) {
                Some(animal) => (
                    animal.position,
                    animal.choose_move(&self.grid, &mut self.rng),
                ),
                None => continue,
            };

            if target != from {
                match self.grid.move_animal(from, target) {
                    MoveOutcome::Consumed => {
                        report.prey_eaten += 1;
                        trace!(
                            event = "predation",
                            tick = self.step_count,
                            x = target.x,
                            y = target.y,
                            "Predator ate prey"
                        );
                    }
                    MoveOutcome::Blocked => report.blocked_moves += 1,
                    MoveOutcome::Moved | MoveOutcome::Stayed => {}
                }
            }

            let Some(animal) = self.grid.get_mut(id) else {
                continue;
            };

            if animal.metabolize() {
                report.starved += 1;
                trace!(
                    event = "starvation",
                    tick = self.step_count,
                    x = animal.position.x,
                    y = animal.position.y,
                    "Predator starved"
                );
            }

            if let Some(child) = animal.reproduce() {
                newborns.push(child);
            }
        }

        for mut child in newborns {
            let sites = self.grid.empty_neighbors(child.position);
            match sites.choose(&mut self.rng) {
                Some(&site) => {
                    child.position = site;
                    self.grid.place(child)?;
                    report.births += 1;
                }
                None => {
                    report.births_discarded += 1;
                    trace!(
                        event = "birth_discarded",
                        tick = self.step_count,
                        species = %child.species(),
                        x = child.position.x,
                        y = child.position.y,
                        "No free cell for newborn"
                    );
                }
            }
        }

        for &id in &snapshot {
            let dead_at = self
                .grid
                .get(id)
                .filter(|animal| !animal.is_alive())
                .map(|animal| animal.position);
            if let Some(pos) = dead_at {
                self.grid.remove(pos);
            }
        }

        if self.config.recording.enabled && self.step_count % self.config.recording.interval == 0
        {
            self.record();
        }

        self.totals.absorb(&report);
        debug_assert!(self.grid.verify().is_ok());

        let (prey, predators) = self.population_counts();
        debug!(
            event = "tick",
            tick = self.step_count,
            prey = prey,
            predators = predators,
            prey_eaten = report.prey_eaten,
            starved = report.starved,
            births = report.births,
            births_discarded = report.births_discarded,
            "Tick complete"
        );

        Ok(report)
    }

    fn record(&mut self) {
        let (prey, predators) = self.population_counts();
        self.history
            .push(PopulationRecord::new(self.step_count, prey, predators));
    }

    /// `(prey, predators)` currently alive
    pub fn population_counts(&self) -> (usize, usize) {
        self.grid.population_counts()
    }

    /// True when either species has died out
    pub fn is_extinction(&self) -> bool {
        let (prey, predators) = self.population_counts();
        prey == 0 || predators == 0
    }

    /// Discard all state and seed a fresh population under the same config.
    ///
    /// A seeded simulation restarts its random sequence, so the next run
    /// replays the previous one exactly.
    pub fn reset(&mut self) -> Result<()> {
        self.grid.clear();
        self.step_count = 0;
        self.history.clear();
        self.totals = SimulationTotals::default();
        self.state = SimulationState::Initialized;
        if let Some(seed) = self.config.seed {
            self.rng = ChaCha8Rng::seed_from_u64(seed);
        }
        self.populate()?;

        info!(event = "simulation_reset", "Simulation reset");
        Ok(())
    }

    /// Mark the run as over and log its summary.
    pub fn finish(&mut self) {
        if self.state == SimulationState::Terminated {
            return;
        }
        self.state = SimulationState::Terminated;
        self.emit_episode_summary();
    }

    fn emit_episode_summary(&self) {
        let (prey, predators) = self.population_counts();
        let summary = HistorySummary::from_history(&self.history);

        info!(
            event = "episode_summary",
            final_tick = self.step_count,
            final_prey = prey,
            final_predators = predators,
            extinction = self.is_extinction(),
            max_prey = summary.prey.max,
            max_predators = summary.predators.max,
            prey_peaks = summary.prey.peaks,
            predator_peaks = summary.predators.peaks,
            total_births = self.totals.births,
            births_discarded = self.totals.births_discarded,
            prey_eaten = self.totals.prey_eaten,
            starved = self.totals.starved,
            "Episode complete"
        );

        event!(
            Level::INFO,
            gauge_name = "final_population",
            gauge_value = prey + predators,
            "Final population gauge"
        );
    }

    /// Log a population snapshot for the current tick
    pub fn log_population_snapshot(&self) {
        let (prey, predators) = self.population_counts();
        let energies: Vec<i32> = self.grid.animals().filter_map(|a| a.energy()).collect();
        let avg_energy = if energies.is_empty() {
            0
        } else {
            energies.iter().map(|&e| e as i64).sum::<i64>() / energies.len() as i64
        };

        info!(
            event = "population_metrics",
            tick = self.step_count,
            prey = prey,
            predators = predators,
            avg_predator_energy = avg_energy,
            max_predator_energy = energies.iter().max().copied().unwrap_or(0),
            total_births = self.totals.births,
            prey_eaten = self.totals.prey_eaten,
            "Population metrics snapshot"
        );
    }

    pub fn history(&self) -> &[PopulationRecord] {
        &self.history
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Species tag at a cell, for renderers
    pub fn cell(&self, pos: Position) -> Cell {
        self.grid.cell(pos)
    }

    pub fn step_count(&self) -> u64 {
        self.step_count
    }

    pub fn state(&self) -> SimulationState {
        self.state
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn totals(&self) -> &SimulationTotals {
        &self.totals
    }
}
