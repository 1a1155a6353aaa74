//! Tessel CLI: collision detection runs, benchmarking and validation.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use tessel_bench::ScenarioKind;
use tessel_gpu::BackendKind;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "tessel")]
#[command(version, about = "Tessel: LBVH collision detection for deformable meshes")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Compute backend selection.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum Backend {
    /// Sequential workgroups, reproducible pair order.
    Cpu,
    /// Workgroups spread over a thread pool.
    Parallel,
}

impl From<Backend> for BackendKind {
    fn from(backend: Backend) -> Self {
        match backend {
            Backend::Cpu => BackendKind::Cpu,
            Backend::Parallel => BackendKind::Parallel,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Run detection cycles on one scenario and print the reports.
    Detect {
        /// Scenario (separated, overlapping, random_soup[:count[:seed]],
        /// folded_sheet, coincident, sphere).
        #[arg(short, long, default_value = "random_soup")]
        scenario: ScenarioKind,

        #[arg(short, long, value_enum, default_value_t = Backend::Parallel)]
        backend: Backend,

        /// Run config (TOML with optional [collision] and [solver] tables).
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Detection cycles to run.
        #[arg(long, default_value_t = 1)]
        cycles: u32,

        /// Forward detection events to the log.
        #[arg(long)]
        events: bool,
    },

    /// Run benchmark suite.
    Benchmark {
        /// Which scenario to run, or "all".
        #[arg(short, long, default_value = "all")]
        scenario: String,

        #[arg(short, long, value_enum, default_value_t = Backend::Parallel)]
        backend: Backend,

        /// Output CSV file path.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Validate a run config (.toml) or a mesh (.json).
    Validate {
        /// Path to config or mesh file.
        path: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let result = match cli.command {
        Commands::Detect {
            scenario,
            backend,
            config,
            cycles,
            events,
        } => commands::detect(scenario, backend.into(), config.as_deref(), cycles, events),
        Commands::Benchmark {
            scenario,
            backend,
            output,
        } => commands::benchmark(&scenario, backend.into(), output.as_deref()),
        Commands::Validate { path } => commands::validate(&path),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
