use clap::Args;
use serde_json::Value;
use std::time::Duration;

use canmort_core::monte_carlo::{
    run_monte_carlo_with_cancellation, CancellationToken, SimulationParams,
};
use canmort_core::EngineConfig;

use crate::input;

/// Arguments for the Monte Carlo rate-risk simulation
#[derive(Args)]
pub struct MonteCarloArgs {
    /// Path to JSON/YAML input file
    #[arg(long)]
    pub input: Option<String>,

    /// Override the number of simulated paths
    #[arg(long)]
    pub iterations: Option<u32>,

    /// Override the horizon in months
    #[arg(long)]
    pub horizon_months: Option<u32>,

    /// Seed for reproducible runs
    #[arg(long)]
    pub seed: Option<u64>,

    /// Abort the run after this many seconds
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Drop the per-path samples from the output
    #[arg(long)]
    pub no_sample_paths: bool,
}

pub fn run_monte_carlo(
    args: MonteCarloArgs,
    config: &EngineConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let mut params: SimulationParams = input::load(&args.input, "monte-carlo")?;
    if args.iterations.is_some() {
        params.iterations = args.iterations;
    }
    if args.horizon_months.is_some() {
        params.horizon_months = args.horizon_months;
    }
    if args.seed.is_some() {
        params.seed = args.seed;
    }

    let token = match args.timeout_secs {
        Some(secs) => CancellationToken::with_timeout(Duration::from_secs(secs)),
        None => CancellationToken::new(),
    };
    let mut output = run_monte_carlo_with_cancellation(&params, config, &token)?;
    if args.no_sample_paths {
        output.result.sample_paths.clear();
    }
    Ok(serde_json::to_value(output)?)
}
