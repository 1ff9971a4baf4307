//! History, report and sweep output.

use crate::sweep::{SweepParameter, SweepPoint};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use lv_core::{PopulationRecord, RunConfig, SimulationConfig};
use lv_world::RunResult;
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Full JSON report of one run
#[derive(Debug, Serialize)]
pub struct RunReport<'a> {
    pub generated_at: DateTime<Utc>,
    pub config: &'a SimulationConfig,
    pub run: &'a RunConfig,
    pub result: &'a RunResult,
}

pub fn write_history_csv<W: Write>(mut out: W, history: &[PopulationRecord]) -> std::io::Result<()> {
    writeln!(out, "step,prey,predators")?;
    for record in history {
        writeln!(out, "{},{},{}", record.step, record.prey, record.predators)?;
    }
    out.flush()
}

pub fn write_sweep_csv<W: Write>(
    mut out: W,
    parameter: SweepParameter,
    points: &[SweepPoint],
) -> std::io::Result<()> {
    writeln!(
        out,
        "{},runs,mean_survival_steps,mean_max_prey,mean_max_predators,mean_prey_peaks,extinction_fraction",
        parameter.name()
    )?;
    for p in points {
        writeln!(
            out,
            "{},{},{:.3},{:.3},{:.3},{:.3},{:.3}",
            p.value,
            p.runs,
            p.mean_survival_steps,
            p.mean_max_prey,
            p.mean_max_predators,
            p.mean_prey_peaks,
            p.extinction_fraction
        )?;
    }
    out.flush()
}

pub fn save_history(path: &Path, history: &[PopulationRecord]) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    write_history_csv(BufWriter::new(file), history)
        .with_context(|| format!("failed to write history to {}", path.display()))
}

pub fn save_sweep(path: &Path, parameter: SweepParameter, points: &[SweepPoint]) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    write_sweep_csv(BufWriter::new(file), parameter, points)
        .with_context(|| format!("failed to write sweep to {}", path.display()))
}

pub fn save_report(path: &Path, report: &RunReport<'_>) -> Result<()> {
    let json = serde_json::to_string_pretty(report).context("failed to serialize report")?;
    std::fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))
}

/// Human-readable run summary
pub fn format_summary(result: &RunResult) -> String {
    let (prey, predators) = result.final_counts;
    let s = &result.summary;
    let mut text = String::new();

    text.push_str(&format!("Steps run:        {}\n", result.steps));
    match result.extinct_at {
        Some(tick) => text.push_str(&format!("Extinction at:    tick {}\n", tick)),
        None => text.push_str("Extinction at:    none\n"),
    }
    text.push_str(&format!("Final population: {} prey, {} predators\n", prey, predators));
    text.push_str(&format!(
        "Prey:      mean {:.1}, std {:.1}, min {}, max {}, peaks {}\n",
        s.prey.mean, s.prey.std, s.prey.min, s.prey.max, s.prey.peaks
    ));
    text.push_str(&format!(
        "Predators: mean {:.1}, std {:.1}, min {}, max {}, peaks {}\n",
        s.predators.mean, s.predators.std, s.predators.min, s.predators.max, s.predators.peaks
    ));
    text.push_str(&format!(
        "Births {} (discarded {}), prey eaten {}, starved {}\n",
        result.totals.births,
        result.totals.births_discarded,
        result.totals.prey_eaten,
        result.totals.starved
    ));
    text
}

pub fn format_sweep(parameter: SweepParameter, points: &[SweepPoint]) -> String {
    let mut text = format!(
        "{:>10} {:>6} {:>10} {:>9} {:>9} {:>7} {:>8}\n",
        parameter.name(),
        "runs",
        "survival",
        "max prey",
        "max pred",
        "peaks",
        "extinct"
    );
    for p in points {
        text.push_str(&format!(
            "{:>10} {:>6} {:>10.1} {:>9.1} {:>9.1} {:>7.2} {:>8.2}\n",
            p.value,
            p.runs,
            p.mean_survival_steps,
            p.mean_max_prey,
            p.mean_max_predators,
            p.mean_prey_peaks,
            p.extinction_fraction
        ));
    }
    text
}
