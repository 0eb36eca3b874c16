use chrono::{Datelike, NaiveDate};
use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

use crate::config::EngineConfig;
use crate::error::MortgageEngineError;
use crate::payments::calculator::interest_for_period;
use crate::rates::frequency::PaymentFrequency;
use crate::types::{round_cents, with_metadata, ComputationOutput, Money, Rate};
use crate::MortgageResult;

/// Effect of skipping one regular payment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkipImpact {
    pub interest_accrued: Money,
    pub new_balance: Money,
    pub extended_amortization_months: u32,
}

/// Interest for the skipped period capitalizes and amortization grows by one
/// period's worth of months.
pub fn skip_impact(
    balance: Money,
    annual_rate: Rate,
    frequency: PaymentFrequency,
    current_amortization_months: u32,
) -> SkipImpact {
    let interest_accrued = interest_for_period(balance.max(Decimal::ZERO), annual_rate, frequency);
    let extended = Decimal::from(current_amortization_months) + frequency.months_per_period();
    SkipImpact {
        interest_accrued,
        new_balance: round_cents(balance + interest_accrued),
        extended_amortization_months: extended
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_u32()
            .unwrap_or(u32::MAX),
    }
}

pub fn can_skip(skipped_this_year: u32, max_per_year: u32) -> bool {
    skipped_this_year < max_per_year
}

/// Anything that can report whether it was a skipped payment.
pub trait SkipRecord {
    fn payment_date(&self) -> NaiveDate;
    fn is_skipped(&self) -> bool;
    /// Interest capitalized by the skip; zero for regular payments.
    fn skipped_interest(&self) -> Money;
}

/// A previously skipped payment as the caller recorded it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedPaymentRecord {
    pub payment_date: NaiveDate,
    pub interest_accrued: Money,
}

impl SkipRecord for SkippedPaymentRecord {
    fn payment_date(&self) -> NaiveDate {
        self.payment_date
    }

    fn is_skipped(&self) -> bool {
        true
    }

    fn skipped_interest(&self) -> Money {
        self.interest_accrued
    }
}

pub fn count_skipped_in_year<R: SkipRecord>(records: &[R], year: i32) -> u32 {
    records
        .iter()
        .filter(|r| r.is_skipped() && r.payment_date().year() == year)
        .count() as u32
}

pub fn total_skipped_interest<R: SkipRecord>(records: &[R]) -> Money {
    records
        .iter()
        .filter(|r| r.is_skipped())
        .map(|r| r.skipped_interest())
        .sum()
}

// ---------------------------------------------------------------------------
// Skip request analysis
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkipInput {
    pub balance: Money,
    pub annual_rate: Rate,
    pub frequency: PaymentFrequency,
    pub current_amortization_months: u32,
    /// Due date of the payment to skip.
    pub skip_date: NaiveDate,
    #[serde(default)]
    pub previous_skips: Vec<SkippedPaymentRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkipAnalysis {
    pub impact: SkipImpact,
    pub skips_used_this_year: u32,
    pub skips_remaining_this_year: u32,
    /// Capitalized interest across all recorded skips including this one.
    pub total_skipped_interest: Money,
}

/// Price a skip request and enforce the per-calendar-year limit.
pub fn analyze_skip(
    input: &SkipInput,
    config: &EngineConfig,
) -> MortgageResult<ComputationOutput<SkipAnalysis>> {
    let start = Instant::now();
    let mut warnings = Vec::new();

    if input.balance <= Decimal::ZERO {
        return Err(MortgageEngineError::invalid(
            "balance",
            "must be positive to skip a payment",
        ));
    }
    if input.annual_rate < Decimal::ZERO {
        return Err(MortgageEngineError::invalid("annual_rate", "must be >= 0"));
    }

    let year = input.skip_date.year();
    let limit = config.max_skips_per_year;
    let used = count_skipped_in_year(&input.previous_skips, year);
    if !can_skip(used, limit) {
        return Err(MortgageEngineError::SkipLimitExceeded { year, limit });
    }

    let impact = skip_impact(
        input.balance,
        input.annual_rate,
        input.frequency,
        input.current_amortization_months,
    );
    debug!(
        year,
        used,
        interest = %impact.interest_accrued,
        "skip payment priced"
    );

    let used_after = used + 1;
    if used_after == limit {
        warnings.push(format!("This uses the last skip allowed in {year}"));
    }

    let analysis = SkipAnalysis {
        total_skipped_interest: total_skipped_interest(&input.previous_skips)
            + impact.interest_accrued,
        impact,
        skips_used_this_year: used_after,
        skips_remaining_this_year: limit - used_after,
    };

    Ok(with_metadata(
        "Skipped payment: period interest capitalized onto the balance",
        &serde_json::json!({
            "frequency": input.frequency,
            "max_skips_per_year": limit,
            "compounding": "semi-annual",
        }),
        warnings,
        start.elapsed().as_micros() as u64,
        analysis,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn skip_input(previous: Vec<SkippedPaymentRecord>) -> SkipInput {
        SkipInput {
            balance: dec!(400000),
            annual_rate: dec!(0.0549),
            frequency: PaymentFrequency::Monthly,
            current_amortization_months: 240,
            skip_date: date(2025, 7, 1),
            previous_skips: previous,
        }
    }

    #[test]
    fn test_skip_capitalizes_one_period_of_interest() {
        let impact = skip_impact(dec!(400000), dec!(0.0549), PaymentFrequency::Monthly, 240);
        // Semi-annual compounding puts this a little under 0.0549 / 12 * 400k = 1830.
        assert!((impact.interest_accrued - dec!(1809.41)).abs() <= dec!(0.01));
        assert!((impact.interest_accrued - dec!(1830)).abs() / dec!(1830) < dec!(0.05));
        assert_eq!(impact.new_balance, dec!(400000) + impact.interest_accrued);
        assert_eq!(impact.extended_amortization_months, 241);
    }

    #[test]
    fn test_weekly_skip_extension_rounds_to_whole_months() {
        let impact = skip_impact(dec!(300000), dec!(0.05), PaymentFrequency::Weekly, 240);
        assert_eq!(impact.extended_amortization_months, 240);
        let semi_monthly = skip_impact(dec!(300000), dec!(0.05), PaymentFrequency::SemiMonthly, 240);
        assert_eq!(semi_monthly.extended_amortization_months, 241);
    }

    #[test]
    fn test_can_skip_ceiling() {
        assert!(can_skip(0, 2));
        assert!(can_skip(1, 2));
        assert!(!can_skip(2, 2));
    }

    #[test]
    fn test_count_only_target_year() {
        let records = vec![
            SkippedPaymentRecord { payment_date: date(2024, 12, 1), interest_accrued: dec!(100) },
            SkippedPaymentRecord { payment_date: date(2025, 3, 1), interest_accrued: dec!(110) },
        ];
        assert_eq!(count_skipped_in_year(&records, 2025), 1);
        assert_eq!(total_skipped_interest(&records), dec!(210));
    }

    #[test]
    fn test_analyze_skip_enforces_limit() {
        let previous = vec![
            SkippedPaymentRecord { payment_date: date(2025, 1, 1), interest_accrued: dec!(1800) },
            SkippedPaymentRecord { payment_date: date(2025, 4, 1), interest_accrued: dec!(1800) },
        ];
        let err = analyze_skip(&skip_input(previous), &EngineConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            MortgageEngineError::SkipLimitExceeded { year: 2025, limit: 2 }
        ));
    }

    #[test]
    fn test_analyze_skip_reports_remaining() {
        let previous = vec![SkippedPaymentRecord {
            payment_date: date(2025, 1, 1),
            interest_accrued: dec!(1800),
        }];
        let out = analyze_skip(&skip_input(previous), &EngineConfig::default()).unwrap();
        assert_eq!(out.result.skips_used_this_year, 2);
        assert_eq!(out.result.skips_remaining_this_year, 0);
        assert_eq!(out.warnings.len(), 1);
        assert!(out.result.total_skipped_interest > dec!(3600));
    }
}
