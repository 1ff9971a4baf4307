//! Headless run wrapper: drive a simulation to completion and collect results.

use crate::simulation::{Simulation, SimulationTotals};
use lv_core::{HistorySummary, PopulationRecord, Result, RunConfig, SimulationConfig};
use serde::{Deserialize, Serialize};
use tracing::info;

/// A self-contained run that can be executed in isolation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunJob {
    pub config: SimulationConfig,
    pub run: RunConfig,
}

impl RunJob {
    pub fn new(config: SimulationConfig, run: RunConfig) -> Self {
        Self { config, run }
    }

    /// Execute this run
    pub fn execute(self) -> Result<RunResult> {
        let mut simulation = Simulation::new(self.config)?;
        let mut extinct_at = None;

        let grid = &simulation.config().grid;
        info!(
            event = "run_started",
            width = grid.width,
            height = grid.height,
            max_steps = self.run.max_steps,
            stop_on_extinction = self.run.stop_on_extinction,
            "Starting run"
        );

        if simulation.is_extinction() {
            extinct_at = Some(0);
        }

        while simulation.step_count() < self.run.max_steps {
            if extinct_at.is_some() && self.run.stop_on_extinction {
                break;
            }

            simulation.step()?;
            let tick = simulation.step_count();

            if self.run.log_interval > 0 && tick % self.run.log_interval == 0 {
                simulation.log_population_snapshot();
            }

            if extinct_at.is_none() && simulation.is_extinction() {
                extinct_at = Some(tick);
                info!(event = "extinction", tick = tick, "A species died out");
            }
        }

        simulation.finish();

        Ok(RunResult {
            steps: simulation.step_count(),
            extinct_at,
            final_counts: simulation.population_counts(),
            summary: HistorySummary::from_history(simulation.history()),
            history: simulation.history().to_vec(),
            totals: simulation.totals().clone(),
        })
    }
}

/// Outcome of a [`RunJob`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    /// Ticks actually executed
    pub steps: u64,
    /// First tick at which either species was gone
    pub extinct_at: Option<u64>,
    /// `(prey, predators)` at the end
    pub final_counts: (usize, usize),
    pub history: Vec<PopulationRecord>,
    pub totals: SimulationTotals,
    pub summary: HistorySummary,
}
