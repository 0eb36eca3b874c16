pub mod calculator;
pub mod skip;

pub use calculator::{
    interest_only_payment, payment, payment_breakdown, remaining_amortization,
    PaymentBreakdown, PaymentBreakdownInput, RemainingAmortization,
};
pub use skip::{can_skip, skip_impact, SkipImpact};
