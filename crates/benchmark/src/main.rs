//! Container loading benchmark CLI

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use contload_benchmark::{
    CommandSolver, FailurePolicy, GeneratorConfig, InstanceGenerator, RejectAllSolver, RunConfig,
    TraceLog, TrialRunner,
};
use contload_core::{Lrand48, SolveRequest, Solver};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "contload-bench")]
#[command(about = "Benchmark harness for 3D container loading solvers")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run trials against a solver
    Run {
        #[command(flatten)]
        generator: GeneratorArgs,

        /// Number of trials (trial t uses seed t)
        #[arg(short = 'n', long)]
        trials: Option<u32>,

        /// Solver program; reads a request on stdin, writes a placement on stdout.
        /// Without it the reject-all baseline is used.
        #[arg(short, long)]
        solver: Option<String>,

        /// Argument passed to the solver program (repeatable)
        #[arg(long = "solver-arg", allow_hyphen_values = true)]
        solver_args: Vec<String>,

        /// Time limit per solver call in seconds
        #[arg(short, long)]
        time_limit: Option<u64>,

        /// Trace file, opened for appending
        #[arg(long, default_value = "contload.out")]
        trace: PathBuf,

        /// Output file for the report (JSON)
        #[arg(long)]
        json: Option<PathBuf>,

        /// Output file for per-trial CSV records
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Run trials in parallel
        #[arg(long)]
        parallel: bool,

        /// Record failed trials and keep going instead of stopping
        #[arg(long)]
        skip_failures: bool,

        /// Write every instance with its placement to the trace
        #[arg(long)]
        dump_instances: bool,
    },

    /// Write one generated instance as a solver request (JSON)
    Generate {
        #[command(flatten)]
        generator: GeneratorArgs,

        /// Seed (same as the trial number in `run`)
        #[arg(long, default_value = "1")]
        seed: u32,

        /// Output file; stdout if omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Instance parameters; each one overrides the value from `--config`.
#[derive(Args)]
struct GeneratorArgs {
    /// TOML run configuration
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Minimum box edge
    #[arg(long)]
    min_dim: Option<u32>,

    /// Maximum box edge
    #[arg(long)]
    max_dim: Option<u32>,

    /// Target fill of the container in percent
    #[arg(long)]
    fill: Option<u32>,

    /// Number of box types (0 = all boxes random)
    #[arg(long)]
    max_types: Option<u32>,

    /// Container width
    #[arg(long)]
    width: Option<u32>,

    /// Container height
    #[arg(long)]
    height: Option<u32>,

    /// Container depth
    #[arg(long)]
    depth: Option<u32>,

    /// Maximum number of boxes per instance
    #[arg(long)]
    max_items: Option<usize>,
}

impl GeneratorArgs {
    fn load(&self) -> anyhow::Result<RunConfig> {
        let mut config = match &self.config {
            Some(path) => RunConfig::from_toml_file(path)
                .with_context(|| format!("reading {}", path.display()))?,
            None => RunConfig::default(),
        };
        self.apply(&mut config.generator);
        Ok(config)
    }

    fn apply(&self, gen: &mut GeneratorConfig) {
        if let Some(v) = self.min_dim {
            gen.min_dim = v;
        }
        if let Some(v) = self.max_dim {
            gen.max_dim = v;
        }
        if let Some(v) = self.fill {
            gen.fill_percent = v;
        }
        if let Some(v) = self.max_types {
            gen.max_types = v;
        }
        if let Some(v) = self.width {
            gen.container.width = v;
        }
        if let Some(v) = self.height {
            gen.container.height = v;
        }
        if let Some(v) = self.depth {
            gen.container.depth = v;
        }
        if let Some(v) = self.max_items {
            gen.max_items = v;
        }
    }
}

fn enable_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    enable_logging();

    match cli.command {
        Commands::Run {
            generator,
            trials,
            solver,
            solver_args,
            time_limit,
            trace,
            json,
            csv,
            parallel,
            skip_failures,
            dump_instances,
        } => {
            let mut config = generator.load()?;
            if let Some(trials) = trials {
                config.trials = trials;
            }
            if let Some(secs) = time_limit {
                config = config.with_time_limit(secs.saturating_mul(1000));
            }
            if skip_failures {
                config = config.with_failure_policy(FailurePolicy::Skip);
            }
            config.parallel |= parallel;
            config.dump_instances |= dump_instances;

            let solver: Arc<dyn Solver> = match solver {
                Some(program) => Arc::new(CommandSolver::new(program, solver_args)),
                None => Arc::new(RejectAllSolver),
            };

            let runner = TrialRunner::new(config, solver)?;
            let mut trace_log = TraceLog::append_to(&trace)
                .with_context(|| format!("opening trace {}", trace.display()))?;
            let report = runner.run(&mut trace_log)?;

            report.print_summary();
            println!("Trace appended to: {}", trace.display());

            if let Some(path) = json {
                report.save_json(&path)?;
                println!("Results saved to: {}", path.display());
            }

            if let Some(path) = csv {
                report.save_csv(&path)?;
                println!("CSV saved to: {}", path.display());
            }

            if !report.all_passed() {
                eprintln!("{} trial(s) failed", report.failures.len());
            }
        }

        Commands::Generate {
            generator,
            seed,
            output,
        } => {
            let config = generator.load()?;
            let instance =
                InstanceGenerator::new(config.generator)?.generate(&mut Lrand48::new(seed))?;
            let json = serde_json::to_string_pretty(&SolveRequest::from_instance(&instance))?;

            match output {
                Some(path) => {
                    std::fs::write(&path, json)?;
                    println!(
                        "Instance with {} boxes saved to: {}",
                        instance.len(),
                        path.display()
                    );
                }
                None => println!("{}", json),
            }
        }
    }

    Ok(())
}
