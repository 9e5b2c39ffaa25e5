//! Cascade Simulator CLI
//!
//! Run a fault-cascade simulation from a scenario file or from generated
//! topology parameters.
//!
//! # Example
//!
//! ```bash
//! # Reference setup: 50 nodes, 60% relays, 30 s horizon
//! cascade-sim --seed 42
//!
//! # Hand-written network, per-tick counts, JSON export
//! cascade-sim --scenario scenarios/three_node_path.toml --timeline --export run.json
//! ```

use cascade_cli::{
    ExportError, RunSummary, ScenarioConfig, ScenarioError, TopologySpec, execute, export,
    load_scenario, print_timeline, timeline,
};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Cascade Simulator
///
/// Simulates a fault spreading across a network with distance-dependent
/// delay and protective relays. Deterministic for a given scenario.
#[derive(Parser, Debug)]
#[command(name = "cascade-sim")]
#[command(version, about, long_about = None)]
struct Args {
    /// Scenario file (.ron, .toml or .json). Without it, a network is
    /// generated from the flags below.
    #[arg(long)]
    scenario: Option<PathBuf>,

    /// Number of nodes in a generated network
    #[arg(short = 'n', long)]
    nodes: Option<usize>,

    /// RNG seed for a generated network
    #[arg(long)]
    seed: Option<u64>,

    /// Probability that a generated node gets a relay (0.0-1.0)
    #[arg(long)]
    relay_ratio: Option<f64>,

    /// Redundant edges added to a generated tree, as a fraction of the node count
    #[arg(long)]
    redundancy_ratio: Option<f64>,

    /// Propagation delay per unit of edge length
    #[arg(long)]
    delay_coefficient: Option<f64>,

    /// Duration of one tick
    #[arg(long)]
    time_step: Option<f64>,

    /// Simulated horizon
    #[arg(long)]
    max_time: Option<f64>,

    /// Write the run to this file (.json or .bin)
    #[arg(long)]
    export: Option<PathBuf>,

    /// Print per-tick status counts
    #[arg(long)]
    timeline: bool,
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Scenario(#[from] ScenarioError),
    #[error(transparent)]
    Export(#[from] ExportError),
}

impl Args {
    /// Start from the scenario file (or defaults) and apply flag overrides.
    fn scenario_config(&self) -> Result<ScenarioConfig, ScenarioError> {
        let mut config = match &self.scenario {
            Some(path) => load_scenario(path)?,
            None => ScenarioConfig::default(),
        };

        if let Some(v) = self.delay_coefficient {
            config.delay_coefficient = v;
        }
        if let Some(v) = self.time_step {
            config.time_step = v;
        }
        if let Some(v) = self.max_time {
            config.max_time = v;
        }

        let topology_flags = self.nodes.is_some()
            || self.seed.is_some()
            || self.relay_ratio.is_some()
            || self.redundancy_ratio.is_some();
        match &mut config.topology {
            TopologySpec::Generated(topo) => {
                if let Some(v) = self.nodes {
                    topo.nodes = v;
                }
                if let Some(v) = self.seed {
                    topo.rng_seed = v;
                }
                if let Some(v) = self.relay_ratio {
                    topo.relay_ratio = v;
                }
                if let Some(v) = self.redundancy_ratio {
                    topo.redundancy_ratio = v;
                }
            }
            TopologySpec::Explicit(_) if topology_flags => {
                warn!("topology flags are ignored for an explicit scenario");
            }
            TopologySpec::Explicit(_) => {}
        }
        Ok(config)
    }
}

fn run(args: &Args) -> Result<(), CliError> {
    let config = args.scenario_config()?;
    info!(
        delay_coefficient = config.delay_coefficient,
        time_step = config.time_step,
        max_time = config.max_time,
        ticks = config.ticks(),
        "Starting simulation"
    );

    let outcome = execute(config.prepare()?)?;

    RunSummary::from_outcome(&outcome).print_summary();
    if args.timeline {
        print_timeline(&timeline(&outcome));
    }
    if let Some(path) = &args.export {
        export(&outcome, path)?;
        println!("\nExported to {}", path.display());
    }
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn,cascade=info")),
        )
        .init();

    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
