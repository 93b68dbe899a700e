//! Benchmark harness for 3D container-loading heuristics.
//!
//! This crate provides:
//! - Reproducible instance generation (Pisinger-style random boxes)
//! - A trial runner that times an external solver and verifies its output
//! - Aggregated statistics with JSON/CSV export
//! - The append-only `contload.out` text trace
//! - Reference solvers: a reject-all baseline and an external command bridge
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use contload_benchmark::{RejectAllSolver, RunConfig, TraceLog, TrialRunner};
//!
//! let config = RunConfig::new(2, 50, 100, 50, 0);
//! let runner = TrialRunner::new(config, Arc::new(RejectAllSolver)).unwrap();
//! let report = runner.run(&mut TraceLog::discard()).unwrap();
//!
//! assert_eq!(report.trials[0].n, 37);
//! assert_eq!(report.summary.mean_fill, 0.0);
//! ```

mod generator;
mod result;
mod runner;
mod solvers;
mod trace;

pub use generator::{GeneratorConfig, InstanceGenerator, DEFAULT_MAX_ITEMS};
pub use result::{Report, Summary, TrialFailure, TrialRecord};
pub use runner::{FailurePolicy, RunConfig, TrialRunner, DEFAULT_TRIALS};
pub use solvers::{CommandSolver, RejectAllSolver};
pub use trace::{trial_line, TraceLog};
