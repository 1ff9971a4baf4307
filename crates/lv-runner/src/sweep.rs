//! Batch parameter sweeps: many seeded runs per parameter value.

use anyhow::{Context, Result};
use clap::ValueEnum;
use lv_core::{RunConfig, SimulationConfig};
use lv_world::{RunJob, RunResult};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info};

/// Config field a sweep varies
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SweepParameter {
    PreyReproductionTime,
    PredatorReproductionTime,
    PredatorInitialEnergy,
    PredatorEnergyGain,
    PredatorEnergyLoss,
    PreyCount,
    PredatorCount,
}

impl SweepParameter {
    /// Write `value` into the matching field of `config`.
    pub fn apply(self, config: &mut SimulationConfig, value: i64) -> Result<()> {
        match self {
            Self::PreyReproductionTime => config.prey.reproduction_time = to_field(self, value)?,
            Self::PredatorReproductionTime => {
                config.predator.reproduction_time = to_field(self, value)?
            }
            Self::PredatorInitialEnergy => config.predator.initial_energy = to_field(self, value)?,
            Self::PredatorEnergyGain => config.predator.energy_gain = to_field(self, value)?,
            Self::PredatorEnergyLoss => config.predator.energy_loss = to_field(self, value)?,
            Self::PreyCount => config.prey.initial_count = to_field(self, value)?,
            Self::PredatorCount => config.predator.initial_count = to_field(self, value)?,
        }
        Ok(())
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::PreyReproductionTime => "prey-reproduction-time",
            Self::PredatorReproductionTime => "predator-reproduction-time",
            Self::PredatorInitialEnergy => "predator-initial-energy",
            Self::PredatorEnergyGain => "predator-energy-gain",
            Self::PredatorEnergyLoss => "predator-energy-loss",
            Self::PreyCount => "prey-count",
            Self::PredatorCount => "predator-count",
        }
    }
}

fn to_field<T: TryFrom<i64>>(param: SweepParameter, value: i64) -> Result<T> {
    T::try_from(value)
        .ok()
        .with_context(|| format!("value {} is out of range for {}", value, param.name()))
}

/// Aggregate over all runs at one parameter value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepPoint {
    pub value: i64,
    pub runs: usize,
    /// Ticks until extinction, or the full run length if none occurred
    pub mean_survival_steps: f64,
    pub mean_max_prey: f64,
    pub mean_max_predators: f64,
    pub mean_prey_peaks: f64,
    pub extinction_fraction: f64,
}

impl SweepPoint {
    fn from_results(value: i64, results: &[RunResult]) -> Self {
        let n = results.len().max(1) as f64;
        let mean = |f: &dyn Fn(&RunResult) -> f64| results.iter().map(f).sum::<f64>() / n;

        Self {
            value,
            runs: results.len(),
            mean_survival_steps: mean(&|r| r.extinct_at.unwrap_or(r.steps) as f64),
            mean_max_prey: mean(&|r| r.summary.prey.max as f64),
            mean_max_predators: mean(&|r| r.summary.predators.max as f64),
            mean_prey_peaks: mean(&|r| r.summary.prey.peaks as f64),
            extinction_fraction: mean(&|r| if r.extinct_at.is_some() { 1.0 } else { 0.0 }),
        }
    }
}

pub struct SweepRunner {
    base: SimulationConfig,
    run: RunConfig,
    parameter: SweepParameter,
    runs: usize,
}

impl SweepRunner {
    pub fn new(base: SimulationConfig, run: RunConfig, parameter: SweepParameter, runs: usize) -> Self {
        Self {
            base,
            run,
            parameter,
            runs,
        }
    }

    /// Run every value in turn and aggregate.
    pub fn execute(&self, values: &[i64]) -> Result<Vec<SweepPoint>> {
        info!(
            event = "sweep_started",
            parameter = self.parameter.name(),
            values = values.len(),
            runs = self.runs,
            "Starting sweep"
        );

        values.iter().map(|&value| self.execute_value(value)).collect()
    }

    fn execute_value(&self, value: i64) -> Result<SweepPoint> {
        let start = Instant::now();
        let mut config = self.base.clone();
        self.parameter.apply(&mut config, value)?;

        let mut results = Vec::with_capacity(self.runs);
        for run_index in 0..self.runs {
            let mut config = config.clone();
            config.seed = self.base.seed.map(|seed| seed.wrapping_add(run_index as u64));

            let result = RunJob::new(config, self.run.clone())
                .execute()
                .with_context(|| {
                    format!("{}={} run {} failed", self.parameter.name(), value, run_index)
                })?;
            debug!(
                parameter = self.parameter.name(),
                value = value,
                run = run_index,
                steps = result.steps,
                extinct_at = ?result.extinct_at,
                "Sweep run complete"
            );
            results.push(result);
        }

        let point = SweepPoint::from_results(value, &results);
        info!(
            event = "sweep_point",
            parameter = self.parameter.name(),
            value = value,
            mean_survival_steps = point.mean_survival_steps,
            extinction_fraction = point.extinction_fraction,
            duration_ms = start.elapsed().as_millis() as u64,
            "Sweep value complete"
        );
        Ok(point)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lv_core::{GridConfig, PredatorConfig, PreyConfig, Topology};

    fn base_config() -> SimulationConfig {
        SimulationConfig {
            grid: GridConfig {
                width: 12,
                height: 12,
                topology: Topology::Wrap,
            },
            prey: PreyConfig {
                initial_count: 30,
                reproduction_time: 3,
            },
            predator: PredatorConfig {
                initial_count: 8,
                ..Default::default()
            },
            seed: Some(100),
            ..Default::default()
        }
    }

    fn short_run() -> RunConfig {
        RunConfig {
            max_steps: 20,
            stop_on_extinction: true,
            log_interval: 0,
        }
    }

    #[test]
    fn test_apply_sets_fields() {
        let mut config = SimulationConfig::default();
        SweepParameter::PreyReproductionTime.apply(&mut config, 5).unwrap();
        SweepParameter::PredatorEnergyGain.apply(&mut config, 7).unwrap();
        SweepParameter::PredatorCount.apply(&mut config, 12).unwrap();

        assert_eq!(config.prey.reproduction_time, 5);
        assert_eq!(config.predator.energy_gain, 7);
        assert_eq!(config.predator.initial_count, 12);
    }

    #[test]
    fn test_apply_rejects_out_of_range() {
        let mut config = SimulationConfig::default();
        assert!(SweepParameter::PreyCount.apply(&mut config, -1).is_err());
        assert!(SweepParameter::PreyReproductionTime
            .apply(&mut config, i64::MAX)
            .is_err());
    }

    #[test]
    fn test_sweep_aggregates_each_value() {
        let runner = SweepRunner::new(base_config(), short_run(), SweepParameter::PredatorCount, 3);
        let points = runner.execute(&[0, 4]).unwrap();

        assert_eq!(points.len(), 2);
        // No predators means extinction at tick 0 in every run
        assert_eq!(points[0].value, 0);
        assert_eq!(points[0].runs, 3);
        assert_eq!(points[0].extinction_fraction, 1.0);
        assert_eq!(points[0].mean_survival_steps, 0.0);
        assert_eq!(points[0].mean_max_predators, 0.0);

        assert_eq!(points[1].value, 4);
        assert!(points[1].mean_max_predators >= 4.0);
        assert!((0.0..=1.0).contains(&points[1].extinction_fraction));
    }

    #[test]
    fn test_seeded_sweep_is_reproducible() {
        let runner = SweepRunner::new(base_config(), short_run(), SweepParameter::PreyCount, 2);
        let a = runner.execute(&[20]).unwrap();
        let b = runner.execute(&[20]).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_invalid_value_fails_the_sweep() {
        let runner = SweepRunner::new(base_config(), short_run(), SweepParameter::PreyCount, 1);
        // 1000 prey do not fit on 144 cells
        assert!(runner.execute(&[1000]).is_err());
    }
}
