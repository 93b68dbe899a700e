//! Append-only text trace of a benchmark run.
//!
//! The layout matches the classic `contload.out` file so that old and new
//! traces can be compared line by line:
//!
//! ```text
//! CONTAINER LOADING PROBLEM 50-100 90  0
//!  1: n=37 fill=0.0 miss=37 time=0.00
//!  2: n=36 fill=0.0 miss=36 time=0.00
//! mindim  = 50
//! ...
//! time    = 0.00
//! ```
//!
//! Every write is flushed, so a run that stops early never leaves a partial
//! trace behind.

use crate::generator::GeneratorConfig;
use crate::result::{Summary, TrialFailure, TrialRecord};
use contload_core::Instance;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

/// Line-oriented trace writer.
#[derive(Debug)]
pub struct TraceLog<W: Write> {
    out: W,
}

impl TraceLog<File> {
    /// Opens `path` for appending, creating it if needed.
    pub fn append_to(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self::new(file))
    }
}

impl TraceLog<io::Sink> {
    /// A trace that discards everything.
    pub fn discard() -> Self {
        Self::new(io::sink())
    }
}

impl<W: Write> TraceLog<W> {
    /// Wraps a writer.
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.out
    }

    /// Returns a reference to the underlying writer.
    pub fn get_ref(&self) -> &W {
        &self.out
    }

    /// Writes the run header.
    pub fn header(&mut self, config: &GeneratorConfig) -> io::Result<()> {
        writeln!(
            self.out,
            "\nCONTAINER LOADING PROBLEM {:2}-{:2} {:2} {:2}",
            config.min_dim, config.max_dim, config.fill_percent, config.max_types
        )?;
        self.out.flush()
    }

    /// Writes the one-line summary of a completed trial.
    pub fn trial(&mut self, record: &TrialRecord) -> io::Result<()> {
        writeln!(self.out, "{}", trial_line(record))?;
        self.out.flush()
    }

    /// Writes the diagnostic of a failed trial.
    pub fn failure(&mut self, failure: &TrialFailure) -> io::Result<()> {
        let mut lines = failure.reason.lines();
        writeln!(
            self.out,
            "{:2}: FAILED {}",
            failure.trial,
            lines.next().unwrap_or_default()
        )?;
        for line in lines {
            writeln!(self.out, "      {}", line)?;
        }
        self.out.flush()
    }

    /// Writes the full item table of an instance with its placement.
    pub fn instance(&mut self, instance: &Instance) -> io::Result<()> {
        writeln!(self.out, "printinstance n={}", instance.len())?;
        writeln!(self.out, " no [ dx, dy, dz]   x   y   z packed")?;
        for item in &instance.items {
            writeln!(
                self.out,
                "{:3} [{:3},{:3},{:3}] {:3} {:3} {:3} {}",
                item.id,
                item.dx,
                item.dy,
                item.dz,
                item.x,
                item.y,
                item.z,
                if item.chosen { "yes" } else { "no" }
            )?;
        }
        writeln!(
            self.out,
            "TOTAL VOLUME {} OF {} FILL {:.6}",
            instance.chosen_volume(),
            instance.container.volume(),
            instance.fill_ratio()
        )?;
        self.out.flush()
    }

    /// Writes the configuration and the means of the run.
    pub fn summary(&mut self, config: &GeneratorConfig, summary: &Summary) -> io::Result<()> {
        writeln!(self.out, "mindim  = {}", config.min_dim)?;
        writeln!(self.out, "maxdim  = {}", config.max_dim)?;
        writeln!(self.out, "fillpct = {}", config.fill_percent)?;
        writeln!(self.out, "maxtyp  = {}", config.max_types)?;
        writeln!(self.out, "n       = {:.2}", summary.mean_n)?;
        writeln!(self.out, "fill    = {:.1}", summary.mean_fill * 100.0)?;
        writeln!(self.out, "miss    = {:.1}", summary.mean_miss)?;
        writeln!(self.out, "time    = {:.2}", summary.mean_time_secs)?;
        if summary.failed > 0 {
            writeln!(self.out, "failed  = {}", summary.failed)?;
        }
        self.out.flush()
    }
}

/// Formats the per-trial line: `<trial>: n=<n> fill=<pct> miss=<miss> time=<seconds>`.
pub fn trial_line(record: &TrialRecord) -> String {
    format!(
        "{:2}: n={} fill={:.1} miss={} time={:.2}",
        record.trial,
        record.n,
        record.fill_percent(),
        record.miss,
        record.time_secs
    )
}
