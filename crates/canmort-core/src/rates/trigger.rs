//! Trigger rate: the annual rate at which a fixed payment only covers interest.

use rust_decimal::prelude::*;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::MortgageEngineError;
use crate::payments::calculator::interest_only_payment;
use crate::rates::conversion::effective_periodic_rate;
use crate::rates::frequency::PaymentFrequency;
use crate::types::{round_cents, with_metadata, ComputationOutput, Money, Rate};
use crate::MortgageResult;

/// Nominal annual rate (semi-annual compounding) whose periodic rate equals
/// `payment / balance`.
///
/// Returns `None` when either input is non-positive: there is no finite rate
/// at which a zero payment or a zero balance crosses the threshold.
pub fn trigger_rate(payment: Money, balance: Money, frequency: PaymentFrequency) -> Option<Rate> {
    if payment <= Decimal::ZERO || balance <= Decimal::ZERO {
        return None;
    }
    let periodic = payment / balance;
    let effective_annual =
        (Decimal::ONE + periodic).checked_powi(frequency.payments_per_year() as i64)? - Decimal::ONE;
    let half_year = (Decimal::ONE + effective_annual).sqrt()?;
    Some(dec!(2) * (half_year - Decimal::ONE))
}

/// True once the current rate has reached the trigger rate.
pub fn is_trigger_rate_hit(
    current_rate: Rate,
    payment: Money,
    balance: Money,
    frequency: PaymentFrequency,
) -> bool {
    trigger_rate(payment, balance, frequency).is_some_and(|trigger| current_rate >= trigger)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerRateInput {
    pub payment_amount: Money,
    pub remaining_balance: Money,
    pub frequency: PaymentFrequency,
    /// Rate currently charged; enables the headroom and shortfall figures.
    #[serde(default)]
    pub current_rate: Option<Rate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerRateAnalysis {
    pub trigger_rate: Rate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_rate: Option<Rate>,
    /// Trigger rate minus current rate. Negative once the trigger is hit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headroom: Option<Rate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interest_only_payment: Option<Money>,
    pub is_hit: bool,
    /// Amount the balance grows each period while the trigger is hit.
    pub negative_amortization_per_payment: Money,
}

pub fn analyze_trigger_rate(
    input: &TriggerRateInput,
) -> MortgageResult<ComputationOutput<TriggerRateAnalysis>> {
    let start = Instant::now();
    let mut warnings = Vec::new();

    let trigger = trigger_rate(input.payment_amount, input.remaining_balance, input.frequency)
        .ok_or_else(|| {
            MortgageEngineError::invalid(
                "payment_amount",
                "payment and remaining balance must both be positive",
            )
        })?;

    let interest_only = input
        .current_rate
        .map(|rate| interest_only_payment(input.remaining_balance, rate, input.frequency));
    let is_hit = input.current_rate.is_some_and(|rate| rate >= trigger);
    let negative_amortization_per_payment = match (is_hit, input.current_rate) {
        (true, Some(rate)) => {
            let interest = input.remaining_balance * effective_periodic_rate(rate, input.frequency);
            round_cents((interest - input.payment_amount).max(Decimal::ZERO))
        }
        _ => Decimal::ZERO,
    };

    let headroom = input.current_rate.map(|rate| trigger - rate);
    if let Some(h) = headroom {
        if !is_hit && h < dec!(0.005) {
            warnings.push(format!(
                "Current rate is within {:.2}% of the trigger rate",
                h * dec!(100)
            ));
        }
    }

    let analysis = TriggerRateAnalysis {
        trigger_rate: trigger,
        current_rate: input.current_rate,
        headroom,
        interest_only_payment: interest_only,
        is_hit,
        negative_amortization_per_payment,
    };

    Ok(with_metadata(
        "Trigger rate: inverse of semi-annual periodic rate at payment / balance",
        &serde_json::json!({
            "frequency": input.frequency,
            "payments_per_year": input.frequency.payments_per_year(),
        }),
        warnings,
        start.elapsed().as_micros() as u64,
        analysis,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(payment: Money, balance: Money, f: PaymentFrequency) -> Money {
        let rate = trigger_rate(payment, balance, f).unwrap();
        effective_periodic_rate(rate, f) * balance
    }

    #[test]
    fn test_round_trip_monthly() {
        let back = round_trip(dec!(3500), dec!(500000), PaymentFrequency::Monthly);
        assert!((back - dec!(3500)).abs() < dec!(0.01), "back={back}");
    }

    #[test]
    fn test_round_trip_biweekly_and_weekly() {
        let back = round_trip(dec!(1750), dec!(500000), PaymentFrequency::Biweekly);
        assert!((back - dec!(1750)).abs() < dec!(0.01));
        let back = round_trip(dec!(875), dec!(500000), PaymentFrequency::AcceleratedWeekly);
        assert!((back - dec!(875)).abs() < dec!(0.01));
    }

    #[test]
    fn test_trigger_rate_is_above_naive_annualization_of_monthly() {
        // Semi-annual nominal for 0.7%/month exceeds 12 * 0.7% = 8.4%.
        let rate = trigger_rate(dec!(3500), dec!(500000), PaymentFrequency::Monthly).unwrap();
        assert!(rate > dec!(0.084));
        assert!(rate < dec!(0.09));
    }

    #[test]
    fn test_degenerate_inputs_have_no_trigger() {
        assert!(trigger_rate(Decimal::ZERO, dec!(1000), PaymentFrequency::Monthly).is_none());
        assert!(trigger_rate(dec!(100), Decimal::ZERO, PaymentFrequency::Monthly).is_none());
        assert!(!is_trigger_rate_hit(dec!(0.2), dec!(100), Decimal::ZERO, PaymentFrequency::Monthly));
    }

    #[test]
    fn test_hit_detection() {
        let trigger = trigger_rate(dec!(2000), dec!(400000), PaymentFrequency::Monthly).unwrap();
        assert!(is_trigger_rate_hit(trigger, dec!(2000), dec!(400000), PaymentFrequency::Monthly));
        assert!(!is_trigger_rate_hit(
            trigger - dec!(0.001),
            dec!(2000),
            dec!(400000),
            PaymentFrequency::Monthly
        ));
    }

    #[test]
    fn test_analysis_reports_negative_amortization() {
        let input = TriggerRateInput {
            payment_amount: dec!(1500),
            remaining_balance: dec!(400000),
            frequency: PaymentFrequency::Monthly,
            current_rate: Some(dec!(0.0549)),
        };
        let out = analyze_trigger_rate(&input).unwrap().result;
        assert!(out.is_hit);
        assert!(out.headroom.unwrap() < Decimal::ZERO);
        // 1809.41 interest against a 1500 payment
        assert!((out.negative_amortization_per_payment - dec!(309.41)).abs() <= dec!(0.01));
    }

    #[test]
    fn test_analysis_rejects_zero_balance() {
        let input = TriggerRateInput {
            payment_amount: dec!(1500),
            remaining_balance: Decimal::ZERO,
            frequency: PaymentFrequency::Monthly,
            current_rate: None,
        };
        assert!(analyze_trigger_rate(&input).is_err());
    }
}
