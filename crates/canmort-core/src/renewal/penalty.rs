//! Early-breakage penalties: three months' interest versus the interest rate
//! differential (IRD), whichever is greater.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;

use crate::error::MortgageEngineError;
use crate::types::{round_cents, with_metadata, ComputationOutput, Money, Rate};
use crate::MortgageResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PenaltyMethod {
    #[serde(rename = "IRD")]
    Ird,
    #[serde(rename = "3-Month Interest")]
    ThreeMonthInterest,
    /// Open mortgages can be repaid without penalty.
    None,
}

impl fmt::Display for PenaltyMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PenaltyMethod::Ird => "IRD",
            PenaltyMethod::ThreeMonthInterest => "3-Month Interest",
            PenaltyMethod::None => "None",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PenaltyResult {
    pub penalty: Money,
    pub method: PenaltyMethod,
    pub three_month_interest: Money,
    pub ird: Money,
    /// Rate the IRD was measured against, when one applies.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comparison_rate: Option<Rate>,
}

/// `balance × rate × 3/12`. Zero for negative inputs.
pub fn three_month_interest_penalty(balance: Money, annual_rate: Rate) -> Money {
    if balance < Decimal::ZERO || annual_rate < Decimal::ZERO {
        return Decimal::ZERO;
    }
    balance * annual_rate * dec!(0.25)
}

/// `balance × (current − comparison) × months/12`.
///
/// Zero when the comparison rate is not below the current rate (the lender
/// can re-lend at least as profitably), when no months remain, or when any
/// input is negative.
pub fn ird_penalty(
    balance: Money,
    current_rate: Rate,
    comparison_rate: Rate,
    remaining_months: u32,
) -> Money {
    if balance < Decimal::ZERO
        || current_rate < Decimal::ZERO
        || comparison_rate < Decimal::ZERO
        || remaining_months == 0
        || comparison_rate >= current_rate
    {
        return Decimal::ZERO;
    }
    balance * (current_rate - comparison_rate) * Decimal::from(remaining_months) / dec!(12)
}

/// Greater of three months' interest and IRD. Ties go to three months' interest.
pub fn standard_penalty(
    balance: Money,
    current_rate: Rate,
    comparison_rate: Rate,
    remaining_months: u32,
) -> PenaltyResult {
    let three_month = round_cents(three_month_interest_penalty(balance, current_rate));
    let ird = round_cents(ird_penalty(balance, current_rate, comparison_rate, remaining_months));
    let (penalty, method) = if ird > three_month {
        (ird, PenaltyMethod::Ird)
    } else {
        (three_month, PenaltyMethod::ThreeMonthInterest)
    };
    PenaltyResult {
        penalty,
        method,
        three_month_interest: three_month,
        ird,
        comparison_rate: Some(comparison_rate),
    }
}

/// Lender policy used to pick the IRD comparison rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum PenaltyPolicy {
    /// Big-bank posted-rate method: the discount received at origination is
    /// taken off today's posted rate for the remaining term.
    IrdPostedRate {
        current_posted_rate: Rate,
        original_posted_rate: Rate,
    },
    /// Today's discounted market rate for the remaining term.
    IrdDiscountedRate { market_rate: Rate },
    /// A rate chosen by the lender at origination.
    IrdOriginationComparison { comparison_rate: Rate },
    ThreeMonthInterest,
    /// Variable-rate terms always pay three months' interest.
    VariableRate,
    OpenMortgage,
}

impl PenaltyPolicy {
    /// IRD comparison rate for a mortgage at `contract_rate`, if the policy uses one.
    pub fn comparison_rate(&self, contract_rate: Rate) -> Option<Rate> {
        match self {
            PenaltyPolicy::IrdPostedRate {
                current_posted_rate,
                original_posted_rate,
            } => {
                let discount = original_posted_rate - contract_rate;
                Some((current_posted_rate - discount).max(Decimal::ZERO))
            }
            PenaltyPolicy::IrdDiscountedRate { market_rate } => Some(*market_rate),
            PenaltyPolicy::IrdOriginationComparison { comparison_rate } => Some(*comparison_rate),
            PenaltyPolicy::ThreeMonthInterest
            | PenaltyPolicy::VariableRate
            | PenaltyPolicy::OpenMortgage => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PenaltyInput {
    pub balance: Money,
    /// Contract rate on the current term.
    pub current_rate: Rate,
    pub remaining_months: u32,
    pub policy: PenaltyPolicy,
}

pub fn calculate_penalty(input: &PenaltyInput) -> MortgageResult<ComputationOutput<PenaltyResult>> {
    let start = Instant::now();
    let mut warnings = Vec::new();

    if input.balance < Decimal::ZERO {
        return Err(MortgageEngineError::invalid("balance", "must be >= 0"));
    }
    if input.current_rate < Decimal::ZERO {
        return Err(MortgageEngineError::invalid("current_rate", "must be >= 0"));
    }

    let result = match &input.policy {
        PenaltyPolicy::OpenMortgage => PenaltyResult {
            penalty: Decimal::ZERO,
            method: PenaltyMethod::None,
            three_month_interest: Decimal::ZERO,
            ird: Decimal::ZERO,
            comparison_rate: None,
        },
        PenaltyPolicy::ThreeMonthInterest | PenaltyPolicy::VariableRate => {
            let three_month =
                round_cents(three_month_interest_penalty(input.balance, input.current_rate));
            PenaltyResult {
                penalty: three_month,
                method: PenaltyMethod::ThreeMonthInterest,
                three_month_interest: three_month,
                ird: Decimal::ZERO,
                comparison_rate: None,
            }
        }
        policy => {
            // Every remaining policy carries a comparison rate.
            let comparison = policy
                .comparison_rate(input.current_rate)
                .unwrap_or(input.current_rate);
            if comparison >= input.current_rate {
                warnings.push(
                    "Comparison rate is not below the contract rate; IRD is zero".to_string(),
                );
            }
            standard_penalty(
                input.balance,
                input.current_rate,
                comparison,
                input.remaining_months,
            )
        }
    };

    Ok(with_metadata(
        "Prepayment penalty: greater of 3 months' interest and IRD",
        &serde_json::json!({
            "policy": input.policy,
            "remaining_months": input.remaining_months,
        }),
        warnings,
        start.elapsed().as_micros() as u64,
        result,
    ))
}
