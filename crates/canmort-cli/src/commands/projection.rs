use clap::Args;
use serde::Deserialize;
use serde_json::Value;

use canmort_core::projections::{
    compare_scenarios, generate_projections, NamedAllocation, ProjectionInput,
};
use canmort_core::EngineConfig;

use crate::input;

/// Arguments for the net-worth projection
#[derive(Args)]
pub struct ProjectionArgs {
    /// Path to JSON/YAML input file
    #[arg(long)]
    pub input: Option<String>,

    /// Input holds `base` plus named `scenarios`; rank them instead of projecting once
    #[arg(long)]
    pub compare: bool,

    /// Override the projection horizon in years
    #[arg(long)]
    pub max_years: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ComparisonRequest {
    base: ProjectionInput,
    scenarios: Vec<NamedAllocation>,
}

pub fn run_projection(
    args: ProjectionArgs,
    config: &EngineConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    if args.compare {
        let mut request: ComparisonRequest = input::load(&args.input, "projection")?;
        if let Some(years) = args.max_years {
            request.base.max_years = years;
        }
        let output = compare_scenarios(&request.base, &request.scenarios, config)?;
        return Ok(serde_json::to_value(output)?);
    }

    let mut projection_input: ProjectionInput = input::load(&args.input, "projection")?;
    if let Some(years) = args.max_years {
        projection_input.max_years = years;
    }
    let output = generate_projections(&projection_input, config)?;
    Ok(serde_json::to_value(output)?)
}
