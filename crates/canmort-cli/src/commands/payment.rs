use clap::Args;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;

use canmort_core::payments::calculator::{
    interest_only_payment, monthly_payment, payment, payment_breakdown, validate_payment,
    PaymentBreakdownInput, PaymentValidationInput,
};
use canmort_core::payments::skip::{analyze_skip, SkipInput};
use canmort_core::rates::conversion::{effective_annual_rate, effective_periodic_rate};
use canmort_core::rates::trigger::trigger_rate;
use canmort_core::types::{with_metadata, Money, Rate};
use canmort_core::{EngineConfig, PaymentFrequency};

use crate::input;

/// Arguments for the regular payment calculation
#[derive(Args)]
pub struct PaymentArgs {
    /// Path to JSON/YAML input file
    #[arg(long)]
    pub input: Option<String>,

    /// Mortgage principal
    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Annual nominal rate as a decimal (0.0549 = 5.49%)
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Amortization period in months
    #[arg(long)]
    pub amortization_months: Option<u32>,

    /// Payment frequency (monthly, semi-monthly, biweekly, accelerated-biweekly, weekly, accelerated-weekly)
    #[arg(long, default_value = "monthly")]
    pub frequency: PaymentFrequency,

    /// Quote every payment frequency instead of one
    #[arg(long)]
    pub all_frequencies: bool,
}

/// Arguments for splitting one payment into interest and principal
#[derive(Args)]
pub struct BreakdownArgs {
    /// Path to JSON/YAML input file
    #[arg(long)]
    pub input: Option<String>,

    /// Balance the lender reported after the payment; enables reconciliation
    #[arg(long)]
    pub reported_balance: Option<Decimal>,
}

/// Arguments for pricing a skipped payment
#[derive(Args)]
pub struct SkipArgs {
    /// Path to JSON/YAML input file
    #[arg(long)]
    pub input: Option<String>,
}

#[derive(Debug, serde::Deserialize)]
struct PaymentRequest {
    principal: Money,
    annual_rate: Rate,
    amortization_months: u32,
    #[serde(default = "default_frequency")]
    frequency: PaymentFrequency,
}

fn default_frequency() -> PaymentFrequency {
    PaymentFrequency::Monthly
}

#[derive(Debug, Serialize)]
struct PaymentQuote {
    frequency: PaymentFrequency,
    payment: Money,
    payments_per_year: u32,
    annual_payments: Money,
    periodic_rate: Rate,
    interest_only_payment: Money,
    trigger_rate: Option<Rate>,
}

#[derive(Debug, Serialize)]
struct PaymentOutput {
    principal: Money,
    annual_rate: Rate,
    effective_annual_rate: Rate,
    amortization_months: u32,
    monthly_payment: Money,
    #[serde(flatten)]
    quote: PaymentQuote,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    frequencies: Vec<PaymentQuote>,
}

fn quote(request: &PaymentRequest, frequency: PaymentFrequency) -> PaymentQuote {
    let amount = payment(
        request.principal,
        request.annual_rate,
        request.amortization_months,
        frequency,
    );
    let per_year = frequency.payments_per_year();
    PaymentQuote {
        frequency,
        payment: amount,
        payments_per_year: per_year,
        annual_payments: amount * Decimal::from(per_year),
        periodic_rate: effective_periodic_rate(request.annual_rate, frequency),
        interest_only_payment: interest_only_payment(request.principal, request.annual_rate, frequency),
        trigger_rate: trigger_rate(amount, request.principal, frequency),
    }
}

pub fn run_payment(args: PaymentArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let start = std::time::Instant::now();
    let request = match (args.principal, args.rate, args.amortization_months) {
        (Some(principal), Some(annual_rate), Some(amortization_months)) => PaymentRequest {
            principal,
            annual_rate,
            amortization_months,
            frequency: args.frequency,
        },
        (None, None, None) => input::load(&args.input, "payment")?,
        _ => {
            return Err(
                "payment: --principal, --rate and --amortization-months must be given together"
                    .into(),
            )
        }
    };
    if request.principal <= Decimal::ZERO {
        return Err("payment: principal must be positive".into());
    }
    if request.annual_rate < Decimal::ZERO {
        return Err("payment: rate must be >= 0".into());
    }
    if request.amortization_months == 0 {
        return Err("payment: amortization must be at least 1 month".into());
    }

    let frequencies = if args.all_frequencies {
        PaymentFrequency::ALL.iter().map(|f| quote(&request, *f)).collect()
    } else {
        Vec::new()
    };
    let output = PaymentOutput {
        principal: request.principal,
        annual_rate: request.annual_rate,
        effective_annual_rate: effective_annual_rate(request.annual_rate),
        amortization_months: request.amortization_months,
        monthly_payment: monthly_payment(
            request.principal,
            request.annual_rate,
            request.amortization_months,
        ),
        quote: quote(&request, request.frequency),
        frequencies,
    };

    let envelope = with_metadata(
        "Canadian mortgage payment (semi-annual compounding; accelerated = monthly / 2 or / 4)",
        &serde_json::json!({ "compounding": "semi-annual" }),
        Vec::new(),
        start.elapsed().as_micros() as u64,
        output,
    );
    Ok(serde_json::to_value(envelope)?)
}

pub fn run_breakdown(args: BreakdownArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let breakdown_input: PaymentBreakdownInput = input::load(&args.input, "breakdown")?;
    match args.reported_balance {
        Some(reported) => {
            let validation = validate_payment(&PaymentValidationInput {
                payment: breakdown_input,
                reported_remaining_balance: Some(reported),
                tolerance: Decimal::new(1, 2),
            });
            Ok(serde_json::to_value(validation)?)
        }
        None => Ok(serde_json::to_value(payment_breakdown(&breakdown_input))?),
    }
}

pub fn run_skip(args: SkipArgs, config: &EngineConfig) -> Result<Value, Box<dyn std::error::Error>> {
    let skip_input: SkipInput = input::load(&args.input, "skip")?;
    let output = analyze_skip(&skip_input, config)?;
    Ok(serde_json::to_value(output)?)
}
