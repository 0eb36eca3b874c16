use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::MortgageEngineError;

/// How often a mortgage payment is made.
///
/// Accelerated variants share the periodicity of their plain counterparts;
/// only the payment amount differs (monthly / 2 or monthly / 4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PaymentFrequency {
    Monthly,
    SemiMonthly,
    Biweekly,
    AcceleratedBiweekly,
    Weekly,
    AcceleratedWeekly,
}

impl PaymentFrequency {
    pub const ALL: [PaymentFrequency; 6] = [
        PaymentFrequency::Monthly,
        PaymentFrequency::SemiMonthly,
        PaymentFrequency::Biweekly,
        PaymentFrequency::AcceleratedBiweekly,
        PaymentFrequency::Weekly,
        PaymentFrequency::AcceleratedWeekly,
    ];

    pub fn payments_per_year(self) -> u32 {
        match self {
            PaymentFrequency::Monthly => 12,
            PaymentFrequency::SemiMonthly => 24,
            PaymentFrequency::Biweekly | PaymentFrequency::AcceleratedBiweekly => 26,
            PaymentFrequency::Weekly | PaymentFrequency::AcceleratedWeekly => 52,
        }
    }

    pub fn is_accelerated(self) -> bool {
        self.monthly_divisor().is_some()
    }

    /// Divisor applied to the monthly payment for accelerated frequencies.
    pub fn monthly_divisor(self) -> Option<u32> {
        match self {
            PaymentFrequency::AcceleratedBiweekly => Some(2),
            PaymentFrequency::AcceleratedWeekly => Some(4),
            _ => None,
        }
    }

    /// Calendar months covered by one payment period (12 / payments per year).
    pub fn months_per_period(self) -> Decimal {
        Decimal::from(12) / Decimal::from(self.payments_per_year())
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PaymentFrequency::Monthly => "monthly",
            PaymentFrequency::SemiMonthly => "semi-monthly",
            PaymentFrequency::Biweekly => "biweekly",
            PaymentFrequency::AcceleratedBiweekly => "accelerated-biweekly",
            PaymentFrequency::Weekly => "weekly",
            PaymentFrequency::AcceleratedWeekly => "accelerated-weekly",
        }
    }
}

impl fmt::Display for PaymentFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentFrequency {
    type Err = MortgageEngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        PaymentFrequency::ALL
            .into_iter()
            .find(|f| f.as_str() == normalized)
            .ok_or_else(|| {
                MortgageEngineError::invalid(
                    "frequency",
                    format!("unknown payment frequency '{s}'"),
                )
            })
    }
}
