//! Engine-wide policy knobs.
//!
//! Every field has a default so a partial YAML/JSON file only needs to name
//! the values it overrides. Loading from disk is left to the caller.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::MortgageEngineError;
use crate::types::Rate;
use crate::MortgageResult;

/// Longest amortization a Canadian lender will write or extend to.
pub const MAX_AMORTIZATION_MONTHS: u32 = 360;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Hard stop for schedule generation when the loan never pays off.
    pub max_payments: u32,
    /// Skipped payments allowed per calendar year.
    pub max_skips_per_year: u32,
    /// Term length assumed for a blend-and-extend when none is given.
    pub default_new_term_months: u32,
    /// Upper bound for any amortization or extension.
    pub max_amortization_months: u32,
    /// Roll payment dates forward past weekends and Canadian statutory holidays.
    pub adjust_to_business_day: bool,
    pub monte_carlo: MonteCarloDefaults,
    pub prepayment: PrepaymentDefaults,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_payments: 600,
            max_skips_per_year: 2,
            default_new_term_months: 60,
            max_amortization_months: MAX_AMORTIZATION_MONTHS,
            adjust_to_business_day: false,
            monte_carlo: MonteCarloDefaults::default(),
            prepayment: PrepaymentDefaults::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonteCarloDefaults {
    pub iterations: u32,
    pub horizon_months: u32,
    /// Amortization used to derive the fixed payment when none is supplied.
    pub amortization_months: u32,
    pub sample_path_limit: usize,
    /// Rates are never simulated below this level.
    pub hard_rate_floor: f64,
}

impl Default for MonteCarloDefaults {
    fn default() -> Self {
        Self {
            iterations: 5_000,
            horizon_months: 60,
            amortization_months: 300,
            sample_path_limit: 50,
            hard_rate_floor: 0.01,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrepaymentDefaults {
    /// Percent charged on the portion of a prepayment above the annual privilege.
    pub over_limit_penalty_percent: Rate,
}

impl Default for PrepaymentDefaults {
    fn default() -> Self {
        Self {
            over_limit_penalty_percent: dec!(1.5),
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> MortgageResult<()> {
        if self.max_payments == 0 {
            return Err(config_error("max_payments must be at least 1"));
        }
        if self.max_amortization_months == 0 {
            return Err(config_error("max_amortization_months must be at least 1"));
        }
        if self.default_new_term_months == 0 {
            return Err(config_error("default_new_term_months must be at least 1"));
        }
        let mc = &self.monte_carlo;
        if mc.iterations < 100 {
            return Err(config_error("monte_carlo.iterations must be at least 100"));
        }
        if mc.horizon_months == 0 || mc.amortization_months == 0 {
            return Err(config_error(
                "monte_carlo horizon and amortization must be at least 1 month",
            ));
        }
        if !mc.hard_rate_floor.is_finite() || mc.hard_rate_floor < 0.0 {
            return Err(config_error("monte_carlo.hard_rate_floor must be >= 0"));
        }
        if self.prepayment.over_limit_penalty_percent < Decimal::ZERO {
            return Err(config_error(
                "prepayment.over_limit_penalty_percent must be >= 0",
            ));
        }
        Ok(())
    }
}

fn config_error(msg: &str) -> MortgageEngineError {
    MortgageEngineError::ConfigError(msg.to_string())
}
