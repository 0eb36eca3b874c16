use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use canmort_core::rates::trigger::{analyze_trigger_rate, TriggerRateInput};
use canmort_core::PaymentFrequency;

use crate::input;

/// Arguments for the trigger-rate solver
#[derive(Args)]
pub struct TriggerRateArgs {
    /// Path to JSON/YAML input file
    #[arg(long)]
    pub input: Option<String>,

    /// Fixed payment amount
    #[arg(long)]
    pub payment: Option<Decimal>,

    /// Outstanding balance
    #[arg(long)]
    pub balance: Option<Decimal>,

    /// Payment frequency
    #[arg(long, default_value = "monthly")]
    pub frequency: PaymentFrequency,

    /// Rate currently charged, as a decimal
    #[arg(long)]
    pub current_rate: Option<Decimal>,
}

pub fn run_trigger_rate(args: TriggerRateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let trigger_input = match (args.payment, args.balance) {
        (Some(payment_amount), Some(remaining_balance)) => TriggerRateInput {
            payment_amount,
            remaining_balance,
            frequency: args.frequency,
            current_rate: args.current_rate,
        },
        (None, None) => input::load(&args.input, "trigger-rate")?,
        _ => return Err("trigger-rate: --payment and --balance must be given together".into()),
    };
    let output = analyze_trigger_rate(&trigger_input)?;
    Ok(serde_json::to_value(output)?)
}
