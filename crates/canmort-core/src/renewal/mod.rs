pub mod blend_extend;
pub mod penalty;
pub mod prepayment_limits;

pub use blend_extend::{
    blended_rate, calculate_blend_and_extend, extended_amortization, BlendAndExtendInput,
    BlendAndExtendResult,
};
pub use penalty::{
    calculate_penalty, ird_penalty, standard_penalty, three_month_interest_penalty, PenaltyInput,
    PenaltyMethod, PenaltyPolicy, PenaltyResult,
};
pub use prepayment_limits::{
    analyze_prepayment_limit, annual_prepayment_limit, is_within_prepayment_limit,
    over_limit_penalty, prepayment_with_penalty, prepayment_year, PrepaymentLimitAnalysis,
    PrepaymentLimitInput, PrepaymentPenaltyResult, PrepaymentReset, PrepaymentYear,
};
