//! Command-line runner for predator-prey simulations.

mod export;
mod sweep;
mod telemetry;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use lv_core::{RunConfig, SimulationConfig, Topology};
use lv_world::RunJob;
use std::path::{Path, PathBuf};
use sweep::{SweepParameter, SweepRunner};
use telemetry::LogFormat;
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "lv-sim",
    version,
    about = "Run spatial predator-prey simulations headlessly"
)]
struct Cli {
    /// Log output format.
    #[arg(long, value_enum, global = true, default_value_t = LogFormat::Pretty)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one simulation and export its population history.
    Run {
        #[command(flatten)]
        base: BaseArgs,
        /// Keep stepping after a species dies out.
        #[arg(long)]
        no_stop_on_extinction: bool,
        /// Record every N ticks.
        #[arg(long)]
        record_interval: Option<u64>,
        /// Write the history as CSV.
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Write the full run report as JSON.
        #[arg(long)]
        json: Option<PathBuf>,
    },
    /// Repeat runs across values of one parameter and aggregate the outcomes.
    Sweep {
        #[command(flatten)]
        base: BaseArgs,
        /// Parameter to vary.
        #[arg(long, value_enum)]
        param: SweepParameter,
        /// Comma-separated parameter values.
        #[arg(long, value_delimiter = ',', num_args = 1.., required = true)]
        values: Vec<i64>,
        /// Runs per value.
        #[arg(long, default_value_t = 5)]
        runs: usize,
        /// Write the aggregate table as CSV.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Options shared by every subcommand
#[derive(Args, Debug)]
struct BaseArgs {
    /// JSON config file; flags override its values.
    #[arg(short, long, env = "LV_SIM_CONFIG")]
    config: Option<PathBuf>,
    #[arg(long)]
    width: Option<i32>,
    #[arg(long)]
    height: Option<i32>,
    /// Clamp at the edges instead of wrapping.
    #[arg(long)]
    clamp: bool,
    /// Initial prey count.
    #[arg(long)]
    prey: Option<usize>,
    /// Initial predator count.
    #[arg(long)]
    predators: Option<usize>,
    #[arg(long)]
    seed: Option<u64>,
    /// Maximum ticks per run.
    #[arg(long)]
    steps: Option<u64>,
}

impl BaseArgs {
    /// Defaults, then the config file, then flags.
    fn simulation_config(&self) -> Result<SimulationConfig> {
        let mut config = match &self.config {
            Some(path) => load_config(path)?,
            None => SimulationConfig::default(),
        };

        if let Some(width) = self.width {
            config.grid.width = width;
        }
        if let Some(height) = self.height {
            config.grid.height = height;
        }
        if self.clamp {
            config.grid.topology = Topology::Clamp;
        }
        if let Some(prey) = self.prey {
            config.prey.initial_count = prey;
        }
        if let Some(predators) = self.predators {
            config.predator.initial_count = predators;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        Ok(config)
    }

    fn run_config(&self) -> RunConfig {
        let mut run = RunConfig::default();
        if let Some(steps) = self.steps {
            run.max_steps = steps;
        }
        run
    }
}

fn load_config(path: &Path) -> Result<SimulationConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    SimulationConfig::from_json(&text)
        .with_context(|| format!("failed to parse config {}", path.display()))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    telemetry::init_telemetry(cli.log_format)?;

    match cli.command {
        Command::Run {
            base,
            no_stop_on_extinction,
            record_interval,
            output,
            json,
        } => {
            let mut config = base.simulation_config()?;
            if let Some(interval) = record_interval {
                config.recording.interval = interval;
            }
            let mut run = base.run_config();
            run.stop_on_extinction = !no_stop_on_extinction;

            run_command(config, run, output.as_deref(), json.as_deref())
        }
        Command::Sweep {
            base,
            param,
            values,
            runs,
            output,
        } => {
            if runs == 0 {
                bail!("--runs must be at least 1");
            }
            let config = base.simulation_config()?;
            let run = base.run_config();
            sweep_command(config, run, param, &values, runs, output.as_deref())
        }
    }
}

fn run_command(
    config: SimulationConfig,
    run: RunConfig,
    output: Option<&Path>,
    json: Option<&Path>,
) -> Result<()> {
    let job = RunJob::new(config.clone(), run.clone());
    let result = job.execute().context("simulation failed")?;

    print!("{}", export::format_summary(&result));

    if let Some(path) = output {
        export::save_history(path, &result.history)?;
        info!(path = %path.display(), records = result.history.len(), "History written");
    }

    if let Some(path) = json {
        let report = export::RunReport {
            generated_at: Utc::now(),
            config: &config,
            run: &run,
            result: &result,
        };
        export::save_report(path, &report)?;
        info!(path = %path.display(), "Report written");
    }

    Ok(())
}

fn sweep_command(
    config: SimulationConfig,
    run: RunConfig,
    param: SweepParameter,
    values: &[i64],
    runs: usize,
    output: Option<&Path>,
) -> Result<()> {
    let runner = SweepRunner::new(config, run, param, runs);
    let points = runner.execute(values)?;

    print!("{}", export::format_sweep(param, &points));

    if let Some(path) = output {
        export::save_sweep(path, param, &points)?;
        info!(path = %path.display(), "Sweep table written");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_defaults() {
        let cli = Cli::try_parse_from([
            "lv-sim", "run", "--width", "30", "--height", "20", "--clamp", "--prey", "50",
            "--seed", "9", "--steps", "200", "--no-stop-on-extinction",
        ])
        .unwrap();

        let Command::Run {
            base,
            no_stop_on_extinction,
            ..
        } = cli.command
        else {
            panic!("expected run command");
        };
        let config = base.simulation_config().unwrap();
        assert_eq!(config.grid.width, 30);
        assert_eq!(config.grid.height, 20);
        assert_eq!(config.grid.topology, Topology::Clamp);
        assert_eq!(config.prey.initial_count, 50);
        assert_eq!(config.predator.initial_count, 100);
        assert_eq!(config.seed, Some(9));
        assert_eq!(base.run_config().max_steps, 200);
        assert!(no_stop_on_extinction);
    }

    #[test]
    fn test_sweep_values_parse() {
        let cli = Cli::try_parse_from([
            "lv-sim",
            "--log-format",
            "json",
            "sweep",
            "--param",
            "predator-energy-gain",
            "--values",
            "2,4,6",
            "--runs",
            "3",
        ])
        .unwrap();

        assert_eq!(cli.log_format, LogFormat::Json);
        let Command::Sweep {
            param,
            values,
            runs,
            ..
        } = cli.command
        else {
            panic!("expected sweep command");
        };
        assert_eq!(param, SweepParameter::PredatorEnergyGain);
        assert_eq!(values, vec![2, 4, 6]);
        assert_eq!(runs, 3);
    }

    #[test]
    fn test_config_file_then_flags() {
        let path = std::env::temp_dir().join(format!("lv-sim-config-{}.json", std::process::id()));
        std::fs::write(&path, r#"{ "grid": { "width": 40, "height": 40 }, "seed": 1 }"#).unwrap();

        let base = BaseArgs {
            config: Some(path.clone()),
            width: None,
            height: Some(25),
            clamp: false,
            prey: None,
            predators: None,
            seed: None,
            steps: None,
        };
        let config = base.simulation_config().unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.grid.width, 40);
        assert_eq!(config.grid.height, 25);
        assert_eq!(config.seed, Some(1));
    }

    #[test]
    fn test_missing_config_file_is_an_error() {
        let err = load_config(Path::new("/nonexistent/lv-sim.json")).unwrap_err();
        assert!(err.to_string().contains("failed to read config"));
    }
}
