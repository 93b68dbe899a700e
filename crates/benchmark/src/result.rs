//! Trial records and aggregated run statistics.

use crate::runner::RunConfig;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

/// Metrics of one completed trial.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialRecord {
    /// Trial number, also the RNG seed
    pub trial: u32,
    /// Number of items in the instance
    pub n: usize,
    /// Volume the solver packed
    pub packed_volume: u64,
    /// Container volume
    pub container_volume: u64,
    /// packed_volume / container_volume
    pub fill_ratio: f64,
    /// Items the solver left out
    pub miss: usize,
    /// Wall-clock seconds spent in the solver
    pub time_secs: f64,
}

impl TrialRecord {
    /// Creates a record, deriving the fill ratio.
    pub fn new(
        trial: u32,
        n: usize,
        packed_volume: u64,
        container_volume: u64,
        miss: usize,
        time_secs: f64,
    ) -> Self {
        let fill_ratio = if container_volume > 0 {
            packed_volume as f64 / container_volume as f64
        } else {
            0.0
        };

        Self {
            trial,
            n,
            packed_volume,
            container_volume,
            fill_ratio,
            miss,
            time_secs,
        }
    }

    /// Fill ratio in percent.
    pub fn fill_percent(&self) -> f64 {
        self.fill_ratio * 100.0
    }
}

/// A trial that did not complete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialFailure {
    pub trial: u32,
    /// Human-readable cause, including offending ids and positions
    pub reason: String,
    /// Whether the solver ran out of time
    pub timed_out: bool,
}

/// Means over the completed trials of a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    /// Trials that completed
    pub trials_run: usize,
    /// Trials that failed
    pub failed: usize,
    pub mean_n: f64,
    /// Mean fill ratio (0.0 - 1.0)
    pub mean_fill: f64,
    pub mean_miss: f64,
    pub mean_time_secs: f64,
}

impl Summary {
    /// Aggregates trial records.
    pub fn from_records(records: &[TrialRecord], failed: usize) -> Self {
        let trials_run = records.len();
        if trials_run == 0 {
            return Self {
                failed,
                ..Default::default()
            };
        }

        let count = trials_run as f64;
        Self {
            trials_run,
            failed,
            mean_n: records.iter().map(|r| r.n as f64).sum::<f64>() / count,
            mean_fill: records.iter().map(|r| r.fill_ratio).sum::<f64>() / count,
            mean_miss: records.iter().map(|r| r.miss as f64).sum::<f64>() / count,
            mean_time_secs: records.iter().map(|r| r.time_secs).sum::<f64>() / count,
        }
    }
}

/// Everything a run produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    /// Configuration the run used
    pub config: RunConfig,
    /// Solver name
    pub solver: String,
    /// Completed trials, in trial order
    pub trials: Vec<TrialRecord>,
    /// Failed trials, in trial order
    pub failures: Vec<TrialFailure>,
    pub summary: Summary,
}

impl Report {
    /// Assembles a report and computes its summary.
    pub fn new(
        config: RunConfig,
        solver: impl Into<String>,
        trials: Vec<TrialRecord>,
        failures: Vec<TrialFailure>,
    ) -> Self {
        let summary = Summary::from_records(&trials, failures.len());
        Self {
            config,
            solver: solver.into(),
            trials,
            failures,
            summary,
        }
    }

    /// Returns true if every trial completed.
    pub fn all_passed(&self) -> bool {
        self.failures.is_empty()
    }

    /// Saves the report to a JSON file.
    pub fn save_json(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)
    }

    /// Saves the per-trial records to a CSV file.
    pub fn save_csv(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        let mut file = File::create(path)?;
        self.write_csv(&mut file)
    }

    /// Writes the per-trial records as CSV.
    pub fn write_csv(&self, out: &mut impl Write) -> std::io::Result<()> {
        let gen = &self.config.generator;

        writeln!(
            out,
            "min_dim,max_dim,fill_pct,max_types,trial,n,packed_volume,container_volume,fill,miss,time_secs"
        )?;

        for run in &self.trials {
            writeln!(
                out,
                "{},{},{},{},{},{},{},{},{:.4},{},{:.4}",
                gen.min_dim,
                gen.max_dim,
                gen.fill_percent,
                gen.max_types,
                run.trial,
                run.n,
                run.packed_volume,
                run.container_volume,
                run.fill_ratio,
                run.miss,
                run.time_secs,
            )?;
        }

        Ok(())
    }

    /// Prints a summary table to stdout.
    pub fn print_summary(&self) {
        let gen = &self.config.generator;

        println!("\n{:=<72}", "");
        println!(
            "CONTAINER LOADING [{},{}] {} {}  solver={}",
            gen.min_dim, gen.max_dim, gen.fill_percent, gen.max_types, self.solver
        );
        println!("{:=<72}", "");
        println!(
            "{:>6} {:>8} {:>8} {:>8} {:>10}",
            "Trial", "n", "Fill%", "Miss", "Time(s)"
        );
        println!("{:-<72}", "");

        for run in &self.trials {
            println!(
                "{:>6} {:>8} {:>8.1} {:>8} {:>10.2}",
                run.trial,
                run.n,
                run.fill_percent(),
                run.miss,
                run.time_secs
            );
        }
        for failure in &self.failures {
            println!("{:>6} FAILED {}", failure.trial, failure.reason);
        }

        println!("{:-<72}", "");
        println!(
            "{:>6} {:>8.2} {:>8.1} {:>8.1} {:>10.2}",
            "mean",
            self.summary.mean_n,
            self.summary.mean_fill * 100.0,
            self.summary.mean_miss,
            self.summary.mean_time_secs
        );
        println!(
            "{} completed, {} failed",
            self.summary.trials_run, self.summary.failed
        );
        println!("{:=<72}\n", "");
    }
}
