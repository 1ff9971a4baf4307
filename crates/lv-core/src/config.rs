//! Configuration types for the simulation.

use crate::{Error, Result, Topology};
use serde::{Deserialize, Serialize};

/// Largest accepted predator energy gain; the breeding check doubles it.
pub const MAX_ENERGY_GAIN: i32 = i32::MAX / 2;

/// Grid dimensions and edge behavior
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Width of the grid in cells
    pub width: i32,
    /// Height of the grid in cells
    pub height: i32,
    /// Wrap (torus) or clamp at the edges
    pub topology: Topology,
}

impl GridConfig {
    /// Number of cells, or `None` when a dimension is not positive.
    pub fn capacity(&self) -> Option<usize> {
        if self.width <= 0 || self.height <= 0 {
            return None;
        }
        (self.width as usize).checked_mul(self.height as usize)
    }
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            width: 100,
            height: 100,
            topology: Topology::Wrap,
        }
    }
}

/// Prey population parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreyConfig {
    /// Number of prey seeded at construction
    pub initial_count: usize,
    /// Ticks since last reproduction before a prey may reproduce
    pub reproduction_time: u32,
}

impl Default for PreyConfig {
    fn default() -> Self {
        Self {
            initial_count: 10,
            reproduction_time: 3,
        }
    }
}

/// Predator population and metabolism parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PredatorConfig {
    /// Number of predators seeded at construction
    pub initial_count: usize,
    /// Ticks since last reproduction before a predator may reproduce
    pub reproduction_time: u32,
    /// Energy of a freshly seeded predator
    pub initial_energy: i32,
    /// Energy gained per prey eaten
    pub energy_gain: i32,
    /// Energy lost every tick
    pub energy_loss: i32,
}

impl Default for PredatorConfig {
    fn default() -> Self {
        Self {
            initial_count: 100,
            reproduction_time: 8,
            initial_energy: 10,
            energy_gain: 4,
            energy_loss: 1,
        }
    }
}

/// History recording
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordingConfig {
    pub enabled: bool,
    /// Record every N ticks
    pub interval: u64,
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval: 1,
        }
    }
}

/// Immutable configuration handed to a simulation at construction
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub grid: GridConfig,
    pub prey: PreyConfig,
    pub predator: PredatorConfig,
    pub recording: RecordingConfig,
    /// Random seed for reproducibility (`None` draws from OS entropy)
    pub seed: Option<u64>,
}

impl SimulationConfig {
    /// Parse a JSON document; omitted sections keep their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn initial_population(&self) -> usize {
        self.prey.initial_count.saturating_add(self.predator.initial_count)
    }

    /// Check every construction-time constraint.
    pub fn validate(&self) -> Result<()> {
        self.validate_for_population(self.initial_population())
    }

    /// Like [`validate`](Self::validate), for a population placed by hand.
    pub fn validate_for_population(&self, population: usize) -> Result<()> {
        let capacity = self.grid.capacity().ok_or_else(|| {
            Error::Configuration(format!(
                "grid dimensions must be positive, got {}x{}",
                self.grid.width, self.grid.height
            ))
        })?;

        if self.recording.interval == 0 {
            return Err(Error::Configuration(
                "recording interval must be at least 1".to_string(),
            ));
        }

        if self.predator.energy_gain < 0 || self.predator.energy_loss < 0 {
            return Err(Error::Configuration(format!(
                "predator energy gain/loss must be non-negative, got {}/{}",
                self.predator.energy_gain, self.predator.energy_loss
            )));
        }

        if self.predator.energy_gain > MAX_ENERGY_GAIN {
            return Err(Error::Configuration(format!(
                "predator energy gain must be at most {}, got {}",
                MAX_ENERGY_GAIN, self.predator.energy_gain
            )));
        }

        if self.predator.initial_energy <= 0 {
            return Err(Error::Configuration(format!(
                "predator initial energy must be positive, got {}",
                self.predator.initial_energy
            )));
        }

        if population > capacity {
            return Err(Error::Configuration(format!(
                "too many animals ({}) for the grid ({} cells)",
                population, capacity
            )));
        }
        Ok(())
    }
}

/// Limits for a headless run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Maximum number of ticks to execute
    pub max_steps: u64,
    /// Stop as soon as either species dies out
    pub stop_on_extinction: bool,
    /// Emit a population snapshot log every N ticks (0 disables)
    pub log_interval: u64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            max_steps: 5000,
            stop_on_extinction: true,
            log_interval: 100,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_configs() {
        let config = SimulationConfig::default();
        assert_eq!(config.grid.width, 100);
        assert_eq!(config.grid.height, 100);
        assert_eq!(config.grid.topology, Topology::Wrap);
        assert_eq!(config.prey.reproduction_time, 3);
        assert_eq!(config.predator.initial_energy, 10);
        assert_eq!(config.predator.energy_gain, 4);
        assert!(config.recording.enabled);
        assert!(config.seed.is_none());
        assert!(config.validate().is_ok());

        let run = RunConfig::default();
        assert_eq!(run.max_steps, 5000);
    }

    #[test]
    fn test_capacity_exceeded() {
        let config = SimulationConfig {
            grid: GridConfig {
                width: 2,
                height: 2,
                topology: Topology::Wrap,
            },
            prey: PreyConfig {
                initial_count: 3,
                ..Default::default()
            },
            predator: PredatorConfig {
                initial_count: 3,
                ..Default::default()
            },
            ..Default::default()
        };

        let err = config.validate().unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn test_invalid_dimensions() {
        let mut config = SimulationConfig::default();
        config.grid.width = 0;
        assert!(matches!(config.validate(), Err(Error::Configuration(_))));
    }

    #[test]
    fn test_zero_recording_interval() {
        let mut config = SimulationConfig::default();
        config.recording.interval = 0;
        assert!(matches!(config.validate(), Err(Error::Configuration(_))));
    }

    #[test]
    fn test_energy_gain_upper_bound() {
        let mut config = SimulationConfig::default();
        config.predator.energy_gain = 1_500_000_000;
        assert!(matches!(config.validate(), Err(Error::Configuration(_))));

        config.predator.energy_gain = MAX_ENERGY_GAIN;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let json = r#"{ "grid": { "width": 20, "topology": "clamp" }, "seed": 7 }"#;
        let config = SimulationConfig::from_json(json).unwrap();
        assert_eq!(config.grid.width, 20);
        assert_eq!(config.grid.height, 100);
        assert_eq!(config.grid.topology, Topology::Clamp);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.predator, PredatorConfig::default());
    }
}
