//! Blend-and-extend: early renewal at a weighted mix of the expiring rate and
//! today's market rate, optionally stretching the amortization.

use rust_decimal::prelude::*;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

use crate::config::EngineConfig;
use crate::error::MortgageEngineError;
use crate::payments::calculator::payment;
use crate::rates::frequency::PaymentFrequency;
use crate::types::{round_cents, with_metadata, ComputationOutput, Money, Rate};
use crate::MortgageResult;

/// Blended rates are rounded to three decimals of the fraction (0.046).
const RATE_DP: u32 = 3;

/// Weighted blend of the old and market rates.
///
/// The old rate's weight is `remaining / (remaining + new_term)`, so more time
/// left on the old term pulls the result toward it. The result is rounded to
/// quoting precision and never leaves the interval between the two rates.
pub fn blended_rate(
    old_rate: Rate,
    new_market_rate: Rate,
    remaining_term_months: u32,
    new_term_months: u32,
) -> Rate {
    let total = remaining_term_months + new_term_months;
    if total == 0 {
        return new_market_rate;
    }
    let old_weight = Decimal::from(remaining_term_months) / Decimal::from(total);
    let blended = old_rate * old_weight + new_market_rate * (Decimal::ONE - old_weight);
    let lo = old_rate.min(new_market_rate);
    let hi = old_rate.max(new_market_rate);
    blended
        .round_dp_with_strategy(RATE_DP, RoundingStrategy::MidpointAwayFromZero)
        .clamp(lo, hi)
}

/// Amortization to use after the blend.
///
/// Defaults to the original amortization. An explicit target must be at
/// least the remaining amortization and at most `maximum`.
pub fn extended_amortization(
    remaining_months: u32,
    original_months: u32,
    extend_to: Option<u32>,
    maximum: u32,
) -> MortgageResult<u32> {
    let Some(requested) = extend_to else {
        return Ok(original_months);
    };
    if requested < remaining_months {
        return Err(MortgageEngineError::ExtensionShorterThanRemaining {
            requested,
            remaining: remaining_months,
        });
    }
    if requested > maximum {
        return Err(MortgageEngineError::ExtensionExceedsMaximum { requested, maximum });
    }
    Ok(requested)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlendAndExtendInput {
    pub old_rate: Rate,
    pub new_market_rate: Rate,
    pub remaining_balance: Money,
    /// Months left on the current term.
    pub remaining_term_months: u32,
    pub original_amortization_months: u32,
    pub remaining_amortization_months: u32,
    /// Target amortization; defaults to the original amortization.
    #[serde(default)]
    pub extend_to_months: Option<u32>,
    /// Length of the new term; defaults to the engine's `default_new_term_months`.
    #[serde(default)]
    pub new_term_months: Option<u32>,
    pub frequency: PaymentFrequency,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlendAndExtendResult {
    pub blended_rate: Rate,
    pub new_term_months: u32,
    pub extended_amortization_months: u32,
    /// At the blended rate over the extended amortization.
    pub new_payment_amount: Money,
    /// At the market rate over the extended amortization.
    pub market_rate_payment_amount: Money,
    /// At the old rate over the remaining amortization.
    pub old_rate_payment_amount: Money,
    /// Market payment minus blended payment.
    pub interest_savings_per_payment: Money,
    /// Per-payment savings over every payment of the new term.
    pub savings_over_term: Money,
    pub payment_change_vs_current: Money,
}

pub fn calculate_blend_and_extend(
    input: &BlendAndExtendInput,
    config: &EngineConfig,
) -> MortgageResult<ComputationOutput<BlendAndExtendResult>> {
    let start = Instant::now();
    let mut warnings = Vec::new();

    if input.remaining_balance <= Decimal::ZERO {
        return Err(MortgageEngineError::invalid("remaining_balance", "must be positive"));
    }
    if input.old_rate < Decimal::ZERO || input.new_market_rate < Decimal::ZERO {
        return Err(MortgageEngineError::invalid("rates", "must be >= 0"));
    }

    let extended = extended_amortization(
        input.remaining_amortization_months,
        input.original_amortization_months,
        input.extend_to_months,
        config.max_amortization_months,
    )?;
    let new_term = input.new_term_months.unwrap_or(config.default_new_term_months);
    let blended = blended_rate(
        input.old_rate,
        input.new_market_rate,
        input.remaining_term_months,
        new_term,
    );

    let f = input.frequency;
    let new_payment = payment(input.remaining_balance, blended, extended, f);
    let market_payment = payment(input.remaining_balance, input.new_market_rate, extended, f);
    let old_payment = payment(
        input.remaining_balance,
        input.old_rate,
        input.remaining_amortization_months,
        f,
    );
    let savings = market_payment - new_payment;
    let payments_in_term = Decimal::from(new_term) / dec!(12) * Decimal::from(f.payments_per_year());

    if input.new_market_rate > input.old_rate {
        warnings.push("Market rate is above the current rate; blending raises the rate".into());
    }
    if extended > input.remaining_amortization_months {
        warnings.push(format!(
            "Amortization extended by {} months increases total interest paid",
            extended - input.remaining_amortization_months
        ));
    }
    debug!(blended = %blended, extended, "blend and extend computed");

    let result = BlendAndExtendResult {
        blended_rate: blended,
        new_term_months: new_term,
        extended_amortization_months: extended,
        new_payment_amount: new_payment,
        market_rate_payment_amount: market_payment,
        old_rate_payment_amount: old_payment,
        interest_savings_per_payment: savings,
        savings_over_term: round_cents(savings * payments_in_term.floor()),
        payment_change_vs_current: new_payment - old_payment,
    };

    Ok(with_metadata(
        "Blend and extend: term-weighted rate blend with amortization extension",
        &serde_json::json!({
            "new_term_months": new_term,
            "max_amortization_months": config.max_amortization_months,
            "rate_rounding_decimals": RATE_DP,
            "frequency": f,
        }),
        warnings,
        start.elapsed().as_micros() as u64,
        result,
    ))
}
