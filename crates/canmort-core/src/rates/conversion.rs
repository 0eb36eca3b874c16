//! Nominal-to-periodic rate conversion under Canadian semi-annual compounding.
//!
//! A quoted Canadian fixed mortgage rate is a nominal annual rate compounded
//! twice a year. The rate charged per payment is therefore never `annual / n`;
//! it is the n-th root of the effective annual rate.

use rust_decimal::prelude::*;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::rates::frequency::PaymentFrequency;
use crate::types::Rate;

/// Effective annual rate of a nominal rate compounded semi-annually.
pub fn effective_annual_rate(annual_rate: Rate) -> Rate {
    let half_year = Decimal::ONE + annual_rate / dec!(2);
    half_year * half_year - Decimal::ONE
}

/// Per-payment effective rate for `frequency`.
///
/// Accelerated frequencies use their true payments per year (26 or 52). A
/// zero rate yields zero; a rate so negative that the half-year growth
/// factor is not positive also yields zero.
pub fn effective_periodic_rate(annual_rate: Rate, frequency: PaymentFrequency) -> Rate {
    if annual_rate.is_zero() {
        return Decimal::ZERO;
    }
    let semi_annual = annual_rate / dec!(2);
    if Decimal::ONE + semi_annual <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    let effective_annual = effective_annual_rate(annual_rate);
    let exponent = Decimal::ONE / Decimal::from(frequency.payments_per_year());
    (Decimal::ONE + effective_annual)
        .checked_powd(exponent)
        .map(|growth| growth - Decimal::ONE)
        .unwrap_or(Decimal::ZERO)
}

/// Where an annual rate came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RateSource {
    Fixed,
    /// Lender prime plus a spread locked for the term (spread may be negative).
    Variable { prime_rate: Rate, locked_spread: Rate },
}

/// An annual nominal rate together with its source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateSnapshot {
    pub annual_rate: Rate,
    pub source: RateSource,
}

impl RateSnapshot {
    pub fn fixed(annual_rate: Rate) -> Self {
        Self {
            annual_rate,
            source: RateSource::Fixed,
        }
    }

    pub fn variable(prime_rate: Rate, locked_spread: Rate) -> Self {
        Self {
            annual_rate: prime_rate + locked_spread,
            source: RateSource::Variable {
                prime_rate,
                locked_spread,
            },
        }
    }

    pub fn periodic_rate(&self, frequency: PaymentFrequency) -> Rate {
        effective_periodic_rate(self.annual_rate, frequency)
    }
}

/// Outcome of applying contractual cap/floor limits to a proposed variable rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateAdjustment {
    pub rate: Rate,
    pub was_limited: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Clamp a proposed variable rate.
///
/// `floor` is an absolute minimum. `cap` is the largest increase allowed over
/// `current_rate`, so the ceiling is `current_rate + cap`.
pub fn apply_rate_limits(
    current_rate: Rate,
    proposed_rate: Rate,
    cap: Option<Rate>,
    floor: Option<Rate>,
) -> RateAdjustment {
    let mut rate = proposed_rate;
    if let Some(floor) = floor {
        rate = rate.max(floor);
    }
    if let Some(cap) = cap {
        rate = rate.min(current_rate + cap);
    }

    if rate == proposed_rate {
        return RateAdjustment {
            rate,
            was_limited: false,
            message: None,
        };
    }
    RateAdjustment {
        rate,
        was_limited: true,
        message: Some(format!(
            "Rate adjusted to {:.3}% due to cap/floor constraints",
            rate * dec!(100)
        )),
    }
}
