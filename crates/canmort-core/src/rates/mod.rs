pub mod conversion;
pub mod frequency;
pub mod trigger;

pub use conversion::{effective_annual_rate, effective_periodic_rate, RateSnapshot, RateSource};
pub use frequency::PaymentFrequency;
pub use trigger::{is_trigger_rate_hit, trigger_rate};
