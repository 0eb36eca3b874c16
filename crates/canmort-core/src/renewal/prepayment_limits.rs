//! Annual prepayment privileges and the charge for paying past them.

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::amortization::calendar::days_in_month;
use crate::config::EngineConfig;
use crate::error::MortgageEngineError;
use crate::types::{round_cents, with_metadata, ComputationOutput, Money};
use crate::MortgageResult;

/// Privilege amount per prepayment year: `original × percent / 100`.
pub fn annual_prepayment_limit(original_amount: Money, limit_percent: Decimal) -> Money {
    if original_amount <= Decimal::ZERO || limit_percent <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    round_cents(original_amount * limit_percent / dec!(100))
}

pub fn is_within_prepayment_limit(
    amount: Money,
    used_this_year: Money,
    original_amount: Money,
    limit_percent: Decimal,
) -> bool {
    amount + used_this_year <= annual_prepayment_limit(original_amount, limit_percent)
}

/// Charge on the portion paid past the privilege. Zero when nothing is over.
pub fn over_limit_penalty(over_limit_amount: Money, penalty_percent: Decimal) -> Money {
    if over_limit_amount <= Decimal::ZERO || penalty_percent <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    round_cents(over_limit_amount * penalty_percent / dec!(100))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrepaymentPenaltyResult {
    pub annual_limit: Money,
    pub available: Money,
    /// Portion of the request covered by the privilege.
    pub within_limit: Money,
    pub over_limit: Money,
    pub penalty: Money,
    /// Requested amount plus penalty.
    pub total_cost: Money,
}

pub fn prepayment_with_penalty(
    requested: Money,
    used_this_year: Money,
    original_amount: Money,
    limit_percent: Decimal,
    penalty_percent: Decimal,
) -> PrepaymentPenaltyResult {
    let annual_limit = annual_prepayment_limit(original_amount, limit_percent);
    let available = (annual_limit - used_this_year).max(Decimal::ZERO);
    let over_limit = (requested - available).max(Decimal::ZERO);
    let penalty = over_limit_penalty(over_limit, penalty_percent);
    PrepaymentPenaltyResult {
        annual_limit,
        available,
        within_limit: requested - over_limit,
        over_limit,
        penalty,
        total_cost: requested + penalty,
    }
}

// ---------------------------------------------------------------------------
// Prepayment year
// ---------------------------------------------------------------------------

/// When the privilege resets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PrepaymentReset {
    /// January 1.
    #[default]
    Calendar,
    /// Every year on the mortgage anniversary.
    Anniversary { month: u32, day: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrepaymentYear {
    pub label: String,
    pub start: NaiveDate,
    /// Exclusive for anniversary years, Dec 31 for calendar years.
    pub end: NaiveDate,
}

fn anniversary_in(year: i32, month: u32, day: u32) -> MortgageResult<NaiveDate> {
    // Feb 29 anniversaries fall on Feb 28 in common years.
    let day = day.min(days_in_month(year, month));
    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| MortgageEngineError::DateError(format!("no anniversary {year}-{month}-{day}")))
}

/// Prepayment year containing `date`.
pub fn prepayment_year(date: NaiveDate, reset: PrepaymentReset) -> MortgageResult<PrepaymentYear> {
    match reset {
        PrepaymentReset::Calendar => {
            let year = date.year();
            let start = NaiveDate::from_ymd_opt(year, 1, 1);
            let end = NaiveDate::from_ymd_opt(year, 12, 31);
            match (start, end) {
                (Some(start), Some(end)) => Ok(PrepaymentYear {
                    label: format!("calendar-{year}"),
                    start,
                    end,
                }),
                _ => Err(MortgageEngineError::DateError(format!("year {year} out of range"))),
            }
        }
        PrepaymentReset::Anniversary { month, day } => {
            if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
                return Err(MortgageEngineError::invalid(
                    "reset",
                    format!("{month}/{day} is not a calendar day"),
                ));
            }
            let mut year = date.year();
            if date < anniversary_in(year, month, day)? {
                year -= 1;
            }
            Ok(PrepaymentYear {
                label: format!("anniversary-{year}"),
                start: anniversary_in(year, month, day)?,
                end: anniversary_in(year + 1, month, day)?,
            })
        }
    }
}

// ---------------------------------------------------------------------------
// Combined check
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrepaymentLimitInput {
    pub original_amount: Money,
    /// Annual privilege as a percent of the original amount (15 = 15%).
    pub limit_percent: Decimal,
    pub requested: Money,
    #[serde(default)]
    pub used_this_year: Money,
    /// Defaults to the engine's `prepayment.over_limit_penalty_percent`.
    #[serde(default)]
    pub penalty_percent: Option<Decimal>,
    #[serde(default)]
    pub payment_date: Option<NaiveDate>,
    #[serde(default)]
    pub reset: PrepaymentReset,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrepaymentLimitAnalysis {
    #[serde(flatten)]
    pub charge: PrepaymentPenaltyResult,
    pub is_within_limit: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prepayment_year: Option<PrepaymentYear>,
}

pub fn analyze_prepayment_limit(
    input: &PrepaymentLimitInput,
    config: &EngineConfig,
) -> MortgageResult<ComputationOutput<PrepaymentLimitAnalysis>> {
    let start = std::time::Instant::now();
    let mut warnings = Vec::new();

    if input.original_amount <= Decimal::ZERO {
        return Err(MortgageEngineError::invalid("original_amount", "must be positive"));
    }
    if input.limit_percent < Decimal::ZERO || input.limit_percent > dec!(100) {
        return Err(MortgageEngineError::invalid("limit_percent", "must be between 0 and 100"));
    }
    if input.requested < Decimal::ZERO || input.used_this_year < Decimal::ZERO {
        return Err(MortgageEngineError::invalid("requested", "amounts must be >= 0"));
    }

    let penalty_percent = input
        .penalty_percent
        .unwrap_or(config.prepayment.over_limit_penalty_percent);
    let charge = prepayment_with_penalty(
        input.requested,
        input.used_this_year,
        input.original_amount,
        input.limit_percent,
        penalty_percent,
    );
    if charge.over_limit > Decimal::ZERO {
        warnings.push(format!(
            "Prepayment exceeds the annual privilege by {}; {}% penalty applies",
            charge.over_limit, penalty_percent
        ));
    }
    let prepayment_year = input
        .payment_date
        .map(|d| prepayment_year(d, input.reset))
        .transpose()?;

    let analysis = PrepaymentLimitAnalysis {
        is_within_limit: charge.over_limit.is_zero(),
        charge,
        prepayment_year,
    };

    Ok(with_metadata(
        "Annual prepayment privilege with over-limit penalty",
        &serde_json::json!({
            "limit_percent": input.limit_percent.to_string(),
            "penalty_percent": penalty_percent.to_string(),
            "reset": input.reset,
        }),
        warnings,
        start.elapsed().as_micros() as u64,
        analysis,
    ))
}
