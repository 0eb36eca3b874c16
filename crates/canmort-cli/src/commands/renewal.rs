use clap::Args;
use serde_json::Value;

use canmort_core::renewal::{
    analyze_prepayment_limit, calculate_blend_and_extend, calculate_penalty, BlendAndExtendInput,
    PenaltyInput, PrepaymentLimitInput,
};
use canmort_core::EngineConfig;

use crate::input;

/// Arguments for a blend-and-extend renewal
#[derive(Args)]
pub struct BlendExtendArgs {
    /// Path to JSON/YAML input file
    #[arg(long)]
    pub input: Option<String>,

    /// Override the target amortization in months
    #[arg(long)]
    pub extend_to_months: Option<u32>,
}

/// Arguments for the early-breakage penalty
#[derive(Args)]
pub struct PenaltyArgs {
    /// Path to JSON/YAML input file
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for the annual prepayment privilege check
#[derive(Args)]
pub struct PrepaymentLimitArgs {
    /// Path to JSON/YAML input file
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_blend_extend(
    args: BlendExtendArgs,
    config: &EngineConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let mut blend_input: BlendAndExtendInput = input::load(&args.input, "blend-extend")?;
    if args.extend_to_months.is_some() {
        blend_input.extend_to_months = args.extend_to_months;
    }
    let output = calculate_blend_and_extend(&blend_input, config)?;
    Ok(serde_json::to_value(output)?)
}

pub fn run_penalty(args: PenaltyArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let penalty_input: PenaltyInput = input::load(&args.input, "penalty")?;
    let output = calculate_penalty(&penalty_input)?;
    Ok(serde_json::to_value(output)?)
}

pub fn run_prepayment_limit(
    args: PrepaymentLimitArgs,
    config: &EngineConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let limit_input: PrepaymentLimitInput = input::load(&args.input, "prepayment-limit")?;
    let output = analyze_prepayment_limit(&limit_input, config)?;
    Ok(serde_json::to_value(output)?)
}
