//! Annuity payments, per-payment breakdowns and remaining amortization.
//!
//! All money returned from this module is rounded to cents, matching how
//! Canadian lenders post payments.

use rust_decimal::prelude::*;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::rates::conversion::effective_periodic_rate;
use crate::rates::frequency::PaymentFrequency;
use crate::types::{round_cents, Money, Rate};

/// Balances at or below this are treated as paid off.
pub const BALANCE_EPSILON: Decimal = dec!(0.01);

// ---------------------------------------------------------------------------
// Remaining amortization
// ---------------------------------------------------------------------------

/// Time left to pay a balance down to zero at the current payment.
///
/// `Undefined` means the payment no longer covers interest (trigger rate
/// hit), so the balance never reaches zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RemainingAmortization {
    Defined { months: u32 },
    Undefined,
}

impl RemainingAmortization {
    pub fn months(self) -> Option<u32> {
        match self {
            RemainingAmortization::Defined { months } => Some(months),
            RemainingAmortization::Undefined => None,
        }
    }

    pub fn is_defined(self) -> bool {
        self.months().is_some()
    }

    /// Legacy encoding: months, or -1 when undefined.
    pub fn as_sentinel(self) -> i64 {
        self.months().map_or(-1, i64::from)
    }
}

/// Closed-form remaining amortization: `n = -ln(1 - rB/P) / ln(1 + r)`,
/// converted from payment periods to whole months.
pub fn remaining_amortization(
    balance: Money,
    annual_rate: Rate,
    payment: Money,
    frequency: PaymentFrequency,
) -> RemainingAmortization {
    if balance <= BALANCE_EPSILON {
        return RemainingAmortization::Defined { months: 0 };
    }
    if payment <= Decimal::ZERO {
        return RemainingAmortization::Undefined;
    }

    let r = effective_periodic_rate(annual_rate, frequency);
    let periods = if r.is_zero() {
        balance / payment
    } else {
        let interest = balance * r;
        if payment <= interest {
            return RemainingAmortization::Undefined;
        }
        let remaining_share = Decimal::ONE - interest / payment;
        match (remaining_share.checked_ln(), (Decimal::ONE + r).checked_ln()) {
            (Some(num), Some(den)) if !den.is_zero() => -num / den,
            _ => return RemainingAmortization::Undefined,
        }
    };

    let months = periods / Decimal::from(frequency.payments_per_year()) * dec!(12);
    let months = months
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_u32()
        .unwrap_or(u32::MAX);
    RemainingAmortization::Defined { months }
}

// ---------------------------------------------------------------------------
// Payment amount
// ---------------------------------------------------------------------------

fn annuity(principal: Money, periodic_rate: Rate, periods: Decimal) -> Money {
    if periodic_rate.is_zero() {
        return principal / periods;
    }
    match (Decimal::ONE + periodic_rate).checked_powd(periods) {
        Some(growth) if growth > Decimal::ONE => {
            periodic_rate * principal / (Decimal::ONE - Decimal::ONE / growth)
        }
        // Growth too large to represent: the annuity has converged to interest-only.
        _ => periodic_rate * principal,
    }
}

/// Standard monthly annuity payment, rounded to cents.
pub fn monthly_payment(principal: Money, annual_rate: Rate, amortization_months: u32) -> Money {
    if principal <= Decimal::ZERO || amortization_months == 0 {
        return Decimal::ZERO;
    }
    let r = effective_periodic_rate(annual_rate, PaymentFrequency::Monthly);
    round_cents(annuity(principal, r, Decimal::from(amortization_months)))
}

/// Second step of the accelerated pipeline: monthly / 2 or monthly / 4.
/// Non-accelerated frequencies return the input unchanged.
pub fn apply_frequency_divisor(monthly: Money, frequency: PaymentFrequency) -> Money {
    match frequency.monthly_divisor() {
        Some(divisor) => round_cents(monthly / Decimal::from(divisor)),
        None => monthly,
    }
}

/// Regular payment for `frequency`.
///
/// Accelerated frequencies are never solved directly; they divide the monthly
/// payment. Degenerate inputs return zero.
pub fn payment(
    principal: Money,
    annual_rate: Rate,
    amortization_months: u32,
    frequency: PaymentFrequency,
) -> Money {
    if principal <= Decimal::ZERO || amortization_months == 0 {
        return Decimal::ZERO;
    }
    if frequency.is_accelerated() {
        let monthly = monthly_payment(principal, annual_rate, amortization_months);
        return apply_frequency_divisor(monthly, frequency);
    }

    let r = effective_periodic_rate(annual_rate, frequency);
    let periods = Decimal::from(amortization_months) / dec!(12)
        * Decimal::from(frequency.payments_per_year());
    round_cents(annuity(principal, r, periods))
}

/// Interest for one period on `balance`, rounded to cents.
pub fn interest_for_period(balance: Money, annual_rate: Rate, frequency: PaymentFrequency) -> Money {
    round_cents(balance * effective_periodic_rate(annual_rate, frequency))
}

/// Payment that exactly covers one period's interest (the trigger threshold).
pub fn interest_only_payment(
    balance: Money,
    annual_rate: Rate,
    frequency: PaymentFrequency,
) -> Money {
    if balance <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    interest_for_period(balance, annual_rate, frequency)
}

// ---------------------------------------------------------------------------
// Breakdown of a single payment
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentBreakdownInput {
    /// Balance before this payment.
    pub balance: Money,
    /// Amount paid this period, excluding any extra prepayment.
    pub payment_amount: Money,
    /// Contractual payment used for the trigger test; defaults to `payment_amount`.
    #[serde(default)]
    pub regular_payment_amount: Option<Money>,
    #[serde(default)]
    pub extra_prepayment_amount: Option<Money>,
    pub frequency: PaymentFrequency,
    pub annual_rate: Rate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentBreakdown {
    pub interest: Money,
    /// Scheduled principal from the regular payment.
    pub principal: Money,
    /// Extra prepayment actually applied (capped at the balance).
    pub extra_prepayment: Money,
    pub total_principal: Money,
    pub remaining_balance: Money,
    pub trigger_rate_hit: bool,
    pub remaining_amortization: RemainingAmortization,
}

impl PaymentBreakdown {
    fn zeroed(balance: Money) -> Self {
        Self {
            interest: Decimal::ZERO,
            principal: Decimal::ZERO,
            extra_prepayment: Decimal::ZERO,
            total_principal: Decimal::ZERO,
            remaining_balance: balance.max(Decimal::ZERO),
            trigger_rate_hit: false,
            remaining_amortization: RemainingAmortization::Defined { months: 0 },
        }
    }
}

/// Split one payment into interest and principal.
///
/// When the regular payment does not exceed the period's interest the trigger
/// rate is hit: principal is zero, the shortfall capitalizes and remaining
/// amortization is undefined.
pub fn payment_breakdown(input: &PaymentBreakdownInput) -> PaymentBreakdown {
    let balance = input.balance;
    let payment = input.payment_amount;
    if balance <= Decimal::ZERO || payment <= Decimal::ZERO {
        return PaymentBreakdown::zeroed(balance);
    }

    let regular = input.regular_payment_amount.unwrap_or(payment);
    let requested_extra = input
        .extra_prepayment_amount
        .unwrap_or(Decimal::ZERO)
        .max(Decimal::ZERO);
    let r = effective_periodic_rate(input.annual_rate, input.frequency);
    let interest = round_cents(balance * r);
    let trigger_rate_hit = regular <= balance * r;

    if trigger_rate_hit {
        let grown = balance + (interest - payment).max(Decimal::ZERO);
        let extra = requested_extra.min(grown);
        return PaymentBreakdown {
            interest,
            principal: Decimal::ZERO,
            extra_prepayment: extra,
            total_principal: extra,
            remaining_balance: round_cents((grown - extra).max(Decimal::ZERO)),
            trigger_rate_hit,
            remaining_amortization: RemainingAmortization::Undefined,
        };
    }

    let principal = (payment - interest).max(Decimal::ZERO).min(balance);
    let extra = requested_extra.min(balance - principal);
    let remaining_balance = round_cents((balance - principal - extra).max(Decimal::ZERO));

    PaymentBreakdown {
        interest,
        principal,
        extra_prepayment: extra,
        total_principal: principal + extra,
        remaining_balance,
        trigger_rate_hit,
        remaining_amortization: remaining_amortization(
            remaining_balance,
            input.annual_rate,
            payment,
            input.frequency,
        ),
    }
}

// ---------------------------------------------------------------------------
// Validation of a posted payment
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentValidationInput {
    pub payment: PaymentBreakdownInput,
    /// Balance the lender reported after the payment, if known.
    #[serde(default)]
    pub reported_remaining_balance: Option<Money>,
    #[serde(default = "default_tolerance")]
    pub tolerance: Money,
}

fn default_tolerance() -> Money {
    dec!(0.01)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentValidation {
    pub expected: PaymentBreakdown,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub balance_discrepancy: Option<Money>,
    pub matches: bool,
}

/// Recompute a posted payment and compare it with the lender's reported balance.
pub fn validate_payment(input: &PaymentValidationInput) -> PaymentValidation {
    let expected = payment_breakdown(&input.payment);
    let balance_discrepancy = input
        .reported_remaining_balance
        .map(|reported| reported - expected.remaining_balance);
    let matches = balance_discrepancy.map_or(true, |d| d.abs() <= input.tolerance);
    PaymentValidation {
        expected,
        balance_discrepancy,
        matches,
    }
}
