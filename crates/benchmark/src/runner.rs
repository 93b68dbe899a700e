//! Trial runner: generate -> solve -> verify -> record.

use crate::generator::{GeneratorConfig, InstanceGenerator};
use crate::result::{Report, TrialFailure, TrialRecord};
use crate::trace::TraceLog;
use contload_core::{
    solve_with_timeout, verify, Error, Instance, Lrand48, Result, SolveRequest, Solver,
};
use instant::Instant;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Default number of trials per run.
pub const DEFAULT_TRIALS: u32 = 20;

/// What to do when a trial fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Stop the run and return the error.
    #[default]
    Abort,
    /// Record the failure and continue with the next trial.
    Skip,
}

/// Configuration of a benchmark run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Number of trials; trial `t` uses seed `t`.
    pub trials: u32,
    /// Time limit per solver call in milliseconds (None = unlimited).
    pub time_limit_ms: Option<u64>,
    /// Failure handling.
    pub on_failure: FailurePolicy,
    /// Run trials on the rayon thread pool.
    pub parallel: bool,
    /// Write every instance with its placement to the trace.
    pub dump_instances: bool,
    /// Instance generation parameters.
    pub generator: GeneratorConfig,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            trials: DEFAULT_TRIALS,
            generator: GeneratorConfig::default(),
            time_limit_ms: None,
            on_failure: FailurePolicy::Abort,
            parallel: false,
            dump_instances: false,
        }
    }
}

impl RunConfig {
    /// Creates a run of `trials` trials over the four classic inputs.
    pub fn new(trials: u32, min_dim: u32, max_dim: u32, fill_percent: u32, max_types: u32) -> Self {
        Self {
            trials,
            generator: GeneratorConfig::new(min_dim, max_dim, fill_percent, max_types),
            ..Default::default()
        }
    }

    /// Quick preset: five trials, one minute per solver call, failures skipped.
    pub fn quick(min_dim: u32, max_dim: u32, fill_percent: u32, max_types: u32) -> Self {
        Self {
            trials: 5,
            time_limit_ms: Some(60_000),
            on_failure: FailurePolicy::Skip,
            ..Self::new(5, min_dim, max_dim, fill_percent, max_types)
        }
    }

    /// Loads a configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Loads a configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Sets the generator parameters.
    pub fn with_generator(mut self, generator: GeneratorConfig) -> Self {
        self.generator = generator;
        self
    }

    /// Sets the number of trials.
    pub fn with_trials(mut self, trials: u32) -> Self {
        self.trials = trials;
        self
    }

    /// Sets the per-call solver time limit.
    pub fn with_time_limit(mut self, ms: u64) -> Self {
        self.time_limit_ms = Some(ms);
        self
    }

    /// Sets the failure policy.
    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.on_failure = policy;
        self
    }

    /// Enables or disables parallel trials.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Enables or disables instance dumps in the trace.
    pub fn with_instance_dump(mut self, dump: bool) -> Self {
        self.dump_instances = dump;
        self
    }

    /// Solver time limit as a duration.
    pub fn time_limit(&self) -> Option<Duration> {
        self.time_limit_ms.map(Duration::from_millis)
    }

    /// Checks the configuration before any trial starts.
    pub fn validate(&self) -> Result<()> {
        if self.trials == 0 {
            return Err(Error::Configuration("trials must be positive".to_string()));
        }
        if self.time_limit_ms == Some(0) {
            return Err(Error::Configuration(
                "time limit must be positive".to_string(),
            ));
        }
        self.generator.validate()
    }
}

/// Result of one trial, with the instance kept for the trace if requested.
struct TrialOutcome {
    trial: u32,
    result: Result<TrialRecord>,
    instance: Option<Instance>,
}

/// Runs benchmark trials against one solver.
pub struct TrialRunner {
    config: RunConfig,
    generator: InstanceGenerator,
    solver: Arc<dyn Solver>,
}

impl TrialRunner {
    /// Creates a runner. Fails with [`Error::Configuration`] on invalid input.
    pub fn new(config: RunConfig, solver: Arc<dyn Solver>) -> Result<Self> {
        config.validate()?;
        let generator = InstanceGenerator::new(config.generator.clone())?;
        Ok(Self {
            config,
            generator,
            solver,
        })
    }

    /// The configuration in use.
    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Runs a single trial with seed `trial`.
    pub fn run_trial(&self, trial: u32) -> Result<TrialRecord> {
        let mut slot = None;
        self.attempt(trial, &mut slot)
    }

    /// Runs all trials, writing progress to `trace`.
    ///
    /// With [`FailurePolicy::Abort`] the first failed trial ends the run: its
    /// diagnostic is written and flushed, then the error is returned. With
    /// [`FailurePolicy::Skip`] failures are recorded in the report and the
    /// means cover the completed trials only.
    pub fn run<W: Write>(&self, trace: &mut TraceLog<W>) -> Result<Report> {
        let gen = &self.config.generator;
        log::info!(
            "running {} trials of [{},{}] fill {}% types {} with solver '{}'",
            self.config.trials,
            gen.min_dim,
            gen.max_dim,
            gen.fill_percent,
            gen.max_types,
            self.solver.name()
        );
        trace.header(gen)?;

        let mut records = Vec::new();
        let mut failures = Vec::new();

        if self.config.parallel {
            // Under Abort, trials after the earliest failure are not started;
            // every trial before it still runs so the outcome matches a
            // sequential run.
            let abort = self.config.on_failure == FailurePolicy::Abort;
            let first_failure = AtomicU32::new(u32::MAX);
            let outcomes: Vec<Option<TrialOutcome>> = (1..=self.config.trials)
                .into_par_iter()
                .map(|trial| {
                    if abort && trial > first_failure.load(Ordering::Relaxed) {
                        return None;
                    }
                    let outcome = self.execute(trial);
                    if abort && outcome.result.is_err() {
                        first_failure.fetch_min(trial, Ordering::Relaxed);
                    }
                    Some(outcome)
                })
                .collect();
            for outcome in outcomes.into_iter().flatten() {
                self.record(outcome, trace, &mut records, &mut failures)?;
            }
        } else {
            for trial in 1..=self.config.trials {
                let outcome = self.execute(trial);
                self.record(outcome, trace, &mut records, &mut failures)?;
            }
        }

        let report = Report::new(
            self.config.clone(),
            self.solver.name(),
            records,
            failures,
        );
        trace.summary(gen, &report.summary)?;

        log::info!(
            "finished: {} completed, {} failed, mean fill {:.1}%",
            report.summary.trials_run,
            report.summary.failed,
            report.summary.mean_fill * 100.0
        );
        Ok(report)
    }

    fn execute(&self, trial: u32) -> TrialOutcome {
        let mut slot = None;
        let result = self.attempt(trial, &mut slot);
        TrialOutcome {
            trial,
            result,
            instance: if self.config.dump_instances { slot } else { None },
        }
    }

    /// One trial. The instance is left in `slot` so that it can still be
    /// dumped when the placement turns out to be invalid.
    fn attempt(&self, trial: u32, slot: &mut Option<Instance>) -> Result<TrialRecord> {
        let mut rng = Lrand48::new(trial);
        let instance = slot.insert(self.generator.generate(&mut rng)?);
        let request = SolveRequest::from_instance(instance);

        let start = Instant::now();
        let placement = solve_with_timeout(&self.solver, &request, self.config.time_limit())?;
        let time_secs = start.elapsed().as_secs_f64();

        let miss = instance.apply(&placement)?;
        verify(instance, placement.total_volume)?;

        let record = TrialRecord::new(
            trial,
            instance.len(),
            placement.total_volume,
            instance.container.volume(),
            miss,
            time_secs,
        );
        log::debug!(
            "trial {}: n={} fill={:.1}% miss={} time={:.3}s",
            trial,
            record.n,
            record.fill_percent(),
            record.miss,
            record.time_secs
        );
        Ok(record)
    }

    fn record<W: Write>(
        &self,
        outcome: TrialOutcome,
        trace: &mut TraceLog<W>,
        records: &mut Vec<TrialRecord>,
        failures: &mut Vec<TrialFailure>,
    ) -> Result<()> {
        if let Some(instance) = &outcome.instance {
            trace.instance(instance)?;
        }

        match outcome.result {
            Ok(record) => {
                trace.trial(&record)?;
                records.push(record);
                Ok(())
            }
            Err(err) => {
                log::error!("trial {} failed: {}", outcome.trial, err);
                let failure = TrialFailure {
                    trial: outcome.trial,
                    reason: err.to_string(),
                    timed_out: err.is_timeout(),
                };
                trace.failure(&failure)?;

                match self.config.on_failure {
                    FailurePolicy::Abort => Err(err.in_trial(outcome.trial)),
                    FailurePolicy::Skip => {
                        failures.push(failure);
                        Ok(())
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solvers::RejectAllSolver;
    use contload_core::{CancelToken, ItemPlacement, Placement};

    /// Stacks the first two boxes on top of each other at the origin.
    struct OverlappingSolver;

    impl Solver for OverlappingSolver {
        fn name(&self) -> &str {
            "overlapping"
        }

        fn solve(&self, request: &SolveRequest, _cancel: &CancelToken) -> Result<Placement> {
            let mut placement = Placement::none(request.len());
            let mut volume = 0;
            for (entry, dims) in placement.items.iter_mut().zip(&request.dimensions).take(2) {
                *entry = ItemPlacement::chosen_at([0, 0, 0]);
                volume += dims.iter().map(|&d| u64::from(d)).product::<u64>();
            }
            placement.total_volume = volume;
            Ok(placement)
        }
    }

    /// Overlaps boxes unless the instance has `accept_len` boxes; counts calls.
    struct SelectiveSolver {
        accept_len: usize,
        delay: Duration,
        calls: AtomicU32,
    }

    impl SelectiveSolver {
        fn new(accept_len: usize, delay_ms: u64) -> Self {
            Self {
                accept_len,
                delay: Duration::from_millis(delay_ms),
                calls: AtomicU32::new(0),
            }
        }
    }

    impl Solver for SelectiveSolver {
        fn name(&self) -> &str {
            "selective"
        }

        fn solve(&self, request: &SolveRequest, cancel: &CancelToken) -> Result<Placement> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            std::thread::sleep(self.delay);
            if request.len() == self.accept_len {
                Ok(Placement::none(request.len()))
            } else {
                OverlappingSolver.solve(request, cancel)
            }
        }
    }

    fn reject_all() -> Arc<dyn Solver> {
        Arc::new(RejectAllSolver)
    }

    fn trace_text(trace: TraceLog<Vec<u8>>) -> String {
        String::from_utf8(trace.into_inner()).unwrap()
    }

    #[test]
    fn test_run_reject_all() {
        let runner = TrialRunner::new(RunConfig::new(3, 50, 100, 50, 0), reject_all()).unwrap();
        let mut trace = TraceLog::new(Vec::new());
        let report = runner.run(&mut trace).unwrap();

        assert_eq!(report.trials.len(), 3);
        assert!(report.all_passed());
        assert_eq!(report.trials[0].n, 37);
        assert_eq!(report.trials[1].n, 36);
        for record in &report.trials {
            assert_eq!(record.miss, record.n);
            assert_eq!(record.packed_volume, 0);
            assert_eq!(record.fill_ratio, 0.0);
        }
        assert_eq!(report.summary.trials_run, 3);
        assert_eq!(report.summary.mean_fill, 0.0);
        assert_eq!(report.summary.mean_miss, report.summary.mean_n);

        let text = trace_text(trace);
        assert!(text.starts_with("\nCONTAINER LOADING PROBLEM 50-100 50  0\n"));
        assert!(text.contains(" 1: n=37 fill=0.0 miss=37 time="));
        assert!(text.contains(" 2: n=36 fill=0.0 miss=36 time="));
        assert!(text.contains("fillpct = 50\n"));
        assert!(text.ends_with(&format!("time    = {:.2}\n", report.summary.mean_time_secs)));
    }

    #[test]
    fn test_run_trial_is_reproducible() {
        let runner = TrialRunner::new(RunConfig::new(1, 30, 120, 90, 5), reject_all()).unwrap();
        let a = runner.run_trial(1).unwrap();
        let b = runner.run_trial(1).unwrap();
        assert_eq!(a.n, 34);
        assert_eq!(a.n, b.n);
        assert_eq!(a.miss, b.miss);
    }

    #[test]
    fn test_abort_on_invalid_solution() {
        let runner =
            TrialRunner::new(RunConfig::new(5, 50, 100, 50, 0), Arc::new(OverlappingSolver))
                .unwrap();
        let mut trace = TraceLog::new(Vec::new());

        let err = runner.run(&mut trace).unwrap_err();
        match err {
            Error::Trial { trial, source } => {
                assert_eq!(trial, 1);
                assert!(matches!(*source, Error::Verification(_)));
            }
            other => panic!("expected trial error, got {:?}", other),
        }

        let text = trace_text(trace);
        assert!(text.contains(" 1: FAILED invalid solution:"));
        assert!(text.contains("overlap items 1,2"));
        // no later trial ran
        assert!(!text.contains(" 2:"));
    }

    #[test]
    fn test_skip_failures() {
        let config = RunConfig::new(4, 50, 100, 50, 0).with_failure_policy(FailurePolicy::Skip);
        let runner = TrialRunner::new(config, Arc::new(OverlappingSolver)).unwrap();
        let report = runner.run(&mut TraceLog::discard()).unwrap();

        assert!(report.trials.is_empty());
        assert_eq!(report.failures.len(), 4);
        assert_eq!(report.summary.failed, 4);
        assert_eq!(
            report.failures.iter().map(|f| f.trial).collect::<Vec<_>>(),
            vec![1, 2, 3, 4]
        );
        assert!(report.failures.iter().all(|f| !f.timed_out));
    }

    #[test]
    fn test_capacity_failure_is_skipped() {
        let config = RunConfig::new(2, 1, 5, 50, 3).with_failure_policy(FailurePolicy::Skip);
        let runner = TrialRunner::new(config, reject_all()).unwrap();
        let report = runner.run(&mut TraceLog::discard()).unwrap();

        assert_eq!(report.failures.len(), 2);
        assert!(report.failures[0].reason.contains("item limit of 1000"));
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let config = RunConfig::new(6, 40, 90, 60, 3);
        let sequential = TrialRunner::new(config.clone(), reject_all())
            .unwrap()
            .run(&mut TraceLog::discard())
            .unwrap();
        let parallel = TrialRunner::new(config.with_parallel(true), reject_all())
            .unwrap()
            .run(&mut TraceLog::discard())
            .unwrap();

        let key = |r: &Report| {
            r.trials
                .iter()
                .map(|t| (t.trial, t.n, t.miss, t.packed_volume))
                .collect::<Vec<_>>()
        };
        assert_eq!(key(&sequential), key(&parallel));
    }

    #[test]
    fn test_parallel_abort_stops_remaining_trials() {
        let trials = (8 * rayon::current_num_threads()).max(16) as u32;
        let solver = Arc::new(SelectiveSolver::new(0, 20));
        let config = RunConfig::new(trials, 50, 100, 50, 0).with_parallel(true);
        let runner = TrialRunner::new(config, solver.clone()).unwrap();

        let err = runner.run(&mut TraceLog::discard()).unwrap_err();
        assert!(matches!(err, Error::Trial { trial: 1, .. }));
        assert!(solver.calls.load(Ordering::SeqCst) < trials);
    }

    #[test]
    fn test_parallel_abort_matches_sequential() {
        // trial 1 has 37 boxes and passes, trial 2 is the first failure
        let run = |parallel: bool| {
            let config = RunConfig::new(12, 50, 100, 50, 0).with_parallel(parallel);
            let runner = TrialRunner::new(config, Arc::new(SelectiveSolver::new(37, 0))).unwrap();
            let mut trace = TraceLog::new(Vec::new());
            let err = runner.run(&mut trace).unwrap_err();
            (err, trace_text(trace))
        };

        let (seq_err, seq_text) = run(false);
        let (par_err, par_text) = run(true);
        assert!(matches!(seq_err, Error::Trial { trial: 2, .. }));
        assert!(matches!(par_err, Error::Trial { trial: 2, .. }));
        for text in [&seq_text, &par_text] {
            assert!(text.contains(" 1: n=37 fill=0.0 miss=37"));
            assert!(text.contains(" 2: FAILED invalid solution:"));
            assert!(!text.contains(" 3:"));
        }
    }

    #[test]
    fn test_instance_dump_includes_failed_trial() {
        let config = RunConfig::new(1, 50, 100, 50, 0)
            .with_instance_dump(true)
            .with_failure_policy(FailurePolicy::Skip);
        let runner = TrialRunner::new(config, Arc::new(OverlappingSolver)).unwrap();
        let mut trace = TraceLog::new(Vec::new());
        runner.run(&mut trace).unwrap();

        let text = trace_text(trace);
        assert!(text.contains("printinstance n=37"));
        assert!(text.contains("  1 [ 84, 93, 91]   0   0   0 yes"));
    }

    #[test]
    fn test_invalid_config_rejected_before_running() {
        for config in [
            RunConfig::new(0, 50, 100, 50, 0),
            RunConfig::new(3, 0, 100, 50, 0),
            RunConfig::new(3, 50, 100, 50, 0).with_time_limit(0),
        ] {
            assert!(matches!(
                TrialRunner::new(config, reject_all()),
                Err(Error::Configuration(_))
            ));
        }
    }

    #[test]
    fn test_config_from_toml() {
        let config = RunConfig::from_toml_str(
            r#"
            trials = 7
            time_limit_ms = 2500
            on_failure = "skip"

            [generator]
            min_dim = 25
            max_dim = 50
            fill_percent = 30
            max_types = 4

            [generator.container]
            width = 100
            height = 120
            depth = 300
            "#,
        )
        .unwrap();

        assert_eq!(config.trials, 7);
        assert_eq!(config.time_limit(), Some(Duration::from_millis(2500)));
        assert_eq!(config.on_failure, FailurePolicy::Skip);
        assert_eq!(config.generator.max_types, 4);
        assert_eq!(config.generator.container.depth, 300);
        // omitted keys keep their defaults
        assert_eq!(config.generator.max_items, 1000);
        assert!(!config.parallel);
    }

    #[test]
    fn test_quick_preset() {
        let config = RunConfig::quick(50, 100, 90, 0);
        assert_eq!(config.trials, 5);
        assert_eq!(config.on_failure, FailurePolicy::Skip);
        assert!(config.validate().is_ok());
    }
}
