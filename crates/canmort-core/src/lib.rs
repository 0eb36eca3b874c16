//! Canadian mortgage engine: semi-annual compounding, accelerated payments,
//! amortization schedules, trigger rates, renewals and penalties, plus a
//! Monte Carlo rate-risk simulator.

pub mod config;
pub mod error;
pub mod payments;
pub mod rates;
pub mod types;

#[cfg(feature = "amortization")]
pub mod amortization;

#[cfg(feature = "renewal")]
pub mod renewal;

#[cfg(feature = "projections")]
pub mod projections;

#[cfg(feature = "monte_carlo")]
pub mod monte_carlo;

pub use config::EngineConfig;
pub use error::MortgageEngineError;
pub use rates::frequency::PaymentFrequency;
pub use types::*;

/// Standard result type for all engine operations
pub type MortgageResult<T> = Result<T, MortgageEngineError>;
