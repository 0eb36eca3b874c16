mod commands;
mod config;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::EnvFilter;

use commands::monte_carlo::MonteCarloArgs;
use commands::payment::{BreakdownArgs, PaymentArgs, SkipArgs};
use commands::projection::ProjectionArgs;
use commands::rates::TriggerRateArgs;
use commands::renewal::{BlendExtendArgs, PenaltyArgs, PrepaymentLimitArgs};
use commands::schedule::ScheduleArgs;

/// Canadian mortgage amortization, renewal and rate-risk calculations
#[derive(Parser)]
#[command(
    name = "canmort",
    version,
    about = "Canadian mortgage amortization, renewal and rate-risk calculations",
    long_about = "A CLI for Canadian mortgage math with decimal precision: semi-annual \
                  compounding, accelerated payments, amortization schedules, trigger \
                  rates, blend-and-extend renewals, breakage penalties, Monte Carlo \
                  rate simulation and net-worth projections."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Engine config file (YAML or JSON); falls back to $CANMORT_CONFIG
    #[arg(long, global = true)]
    config: Option<String>,

    /// Log engine decisions to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Regular payment for a principal, rate and amortization
    Payment(PaymentArgs),
    /// Split one payment into interest and principal
    Breakdown(BreakdownArgs),
    /// Full amortization schedule with prepayments, renewals and skips
    Schedule(ScheduleArgs),
    /// Rate at which a fixed payment only covers interest
    TriggerRate(TriggerRateArgs),
    /// Cost of skipping a payment
    Skip(SkipArgs),
    /// Early renewal at a blended rate
    BlendExtend(BlendExtendArgs),
    /// Early-breakage penalty (3 months' interest vs IRD)
    Penalty(PenaltyArgs),
    /// Annual prepayment privilege and over-limit charge
    PrepaymentLimit(PrepaymentLimitArgs),
    /// Monte Carlo simulation of rate paths against a fixed payment
    MonteCarlo(MonteCarloArgs),
    /// Multi-year net-worth projection of surplus allocation
    Projection(ProjectionArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

/// Level from `RUST_LOG`, else `CANMORT_LOG`, else debug with `-v`, else warn.
fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_from_env("CANMORT_LOG"))
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "warn" }));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let engine_config = match config::load_config(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    };

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Payment(args) => commands::payment::run_payment(args),
        Commands::Breakdown(args) => commands::payment::run_breakdown(args),
        Commands::Schedule(args) => commands::schedule::run_schedule(args, &engine_config),
        Commands::TriggerRate(args) => commands::rates::run_trigger_rate(args),
        Commands::Skip(args) => commands::payment::run_skip(args, &engine_config),
        Commands::BlendExtend(args) => commands::renewal::run_blend_extend(args, &engine_config),
        Commands::Penalty(args) => commands::renewal::run_penalty(args),
        Commands::PrepaymentLimit(args) => {
            commands::renewal::run_prepayment_limit(args, &engine_config)
        }
        Commands::MonteCarlo(args) => commands::monte_carlo::run_monte_carlo(args, &engine_config),
        Commands::Projection(args) => commands::projection::run_projection(args, &engine_config),
        Commands::Version => {
            println!("canmort {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
