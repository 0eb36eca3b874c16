use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use canmort_core::amortization::schedule::{
    generate_schedule, generate_schedule_with_payment, ScheduleInput,
};
use canmort_core::EngineConfig;

use crate::input;

/// Arguments for amortization schedule generation
#[derive(Args)]
pub struct ScheduleArgs {
    /// Path to JSON/YAML input file
    #[arg(long)]
    pub input: Option<String>,

    /// Amortize against this payment instead of deriving one
    #[arg(long)]
    pub fixed_payment: Option<Decimal>,

    /// Omit the payment rows and print only the summary
    #[arg(long)]
    pub summary_only: bool,

    /// Keep only the first N payment rows
    #[arg(long)]
    pub rows: Option<usize>,
}

pub fn run_schedule(
    args: ScheduleArgs,
    config: &EngineConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let schedule_input: ScheduleInput = input::load(&args.input, "schedule")?;
    let mut output = match args.fixed_payment.or(schedule_input.fixed_payment) {
        Some(fixed) => generate_schedule_with_payment(&schedule_input, fixed, config)?,
        None => generate_schedule(&schedule_input, config)?,
    };

    if args.summary_only {
        output.result.payments.clear();
    } else if let Some(n) = args.rows {
        output.result.payments.truncate(n);
    }
    Ok(serde_json::to_value(output)?)
}
