#![cfg(all(feature = "amortization", feature = "renewal"))]

use canmort_core::payments::calculator::{
    interest_only_payment, monthly_payment, payment, payment_breakdown, PaymentBreakdownInput,
    RemainingAmortization,
};
use canmort_core::payments::skip::skip_impact;
use canmort_core::rates::conversion::effective_periodic_rate;
use canmort_core::rates::trigger::trigger_rate;
use canmort_core::renewal::blend_extend::{calculate_blend_and_extend, BlendAndExtendInput};
use canmort_core::renewal::penalty::{standard_penalty, PenaltyMethod};
use canmort_core::{EngineConfig, MortgageEngineError, PaymentFrequency};
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

// ===========================================================================
// $400,000 at 5.49% over 25 years
// ===========================================================================

const BALANCE: Decimal = dec!(400000);
const RATE: Decimal = dec!(0.0549);

#[test]
fn test_monthly_payment_semi_annual_compounding() {
    assert_eq!(payment(BALANCE, RATE, 300, PaymentFrequency::Monthly), dec!(2439.24));
}

#[test]
fn test_interest_only_threshold() {
    // The figure lenders quote (~$1,830) uses a slightly different convention;
    // under semi-annual compounding the threshold is $1,809.41.
    let io = interest_only_payment(BALANCE, RATE, PaymentFrequency::Monthly);
    assert_eq!(io, dec!(1809.41));
    assert!((io - dec!(1830)).abs() / dec!(1830) < dec!(0.05));
}

#[test]
fn test_accelerated_payments_divide_monthly() {
    let monthly = monthly_payment(BALANCE, RATE, 300);
    assert_eq!(
        payment(BALANCE, RATE, 300, PaymentFrequency::AcceleratedBiweekly),
        dec!(1219.62)
    );
    assert_eq!(
        payment(BALANCE, RATE, 300, PaymentFrequency::AcceleratedWeekly),
        dec!(609.81)
    );
    assert_eq!(monthly, dec!(2439.24));
}

#[test]
fn test_accelerated_pays_more_per_year_than_regular() {
    let regular = payment(BALANCE, RATE, 300, PaymentFrequency::Biweekly);
    let accelerated = payment(BALANCE, RATE, 300, PaymentFrequency::AcceleratedBiweekly);
    assert!(accelerated > regular);
}

#[test]
fn test_first_payment_breakdown() {
    let b = payment_breakdown(&PaymentBreakdownInput {
        balance: BALANCE,
        payment_amount: dec!(2439.24),
        regular_payment_amount: None,
        extra_prepayment_amount: None,
        frequency: PaymentFrequency::Monthly,
        annual_rate: RATE,
    });
    assert_eq!(b.interest, dec!(1809.41));
    assert_eq!(b.principal, dec!(629.83));
    assert_eq!(b.remaining_balance, dec!(399370.17));
    assert!(!b.trigger_rate_hit);
    assert_eq!(b.remaining_amortization, RemainingAmortization::Defined { months: 299 });
}

#[test]
fn test_payment_below_interest_hits_trigger() {
    let b = payment_breakdown(&PaymentBreakdownInput {
        balance: BALANCE,
        payment_amount: dec!(1500),
        regular_payment_amount: None,
        extra_prepayment_amount: None,
        frequency: PaymentFrequency::Monthly,
        annual_rate: RATE,
    });
    assert!(b.trigger_rate_hit);
    assert_eq!(b.principal, Decimal::ZERO);
    assert_eq!(b.remaining_amortization.as_sentinel(), -1);
    assert_eq!(b.remaining_balance, dec!(400309.41));
}

#[test]
fn test_skip_scenario() {
    let impact = skip_impact(BALANCE, RATE, PaymentFrequency::Monthly, 300);
    assert_eq!(impact.interest_accrued, dec!(1809.41));
    assert_eq!(impact.new_balance, dec!(401809.41));
    assert_eq!(impact.extended_amortization_months, 301);
}

#[test]
fn test_trigger_rate_for_scenario_payment() {
    let trigger = trigger_rate(dec!(2439.24), BALANCE, PaymentFrequency::Monthly).unwrap();
    // Well above today's 5.49%.
    assert!(trigger > dec!(0.073) && trigger < dec!(0.075), "trigger={trigger}");
    let periodic = effective_periodic_rate(trigger, PaymentFrequency::Monthly);
    assert!((periodic * BALANCE - dec!(2439.24)).abs() < dec!(0.01));
}

// ===========================================================================
// Renewal
// ===========================================================================

#[test]
fn test_blend_and_extend_end_to_end() {
    let input = BlendAndExtendInput {
        old_rate: dec!(0.0219),
        new_market_rate: dec!(0.0489),
        remaining_balance: dec!(380000),
        remaining_term_months: 18,
        original_amortization_months: 300,
        remaining_amortization_months: 258,
        extend_to_months: Some(300),
        new_term_months: Some(60),
        frequency: PaymentFrequency::Monthly,
    };
    let out = calculate_blend_and_extend(&input, &EngineConfig::default()).unwrap();
    let r = &out.result;
    assert!(r.blended_rate > dec!(0.0219) && r.blended_rate < dec!(0.0489));
    assert_eq!(r.extended_amortization_months, 300);
    assert_eq!(
        r.interest_savings_per_payment,
        r.market_rate_payment_amount - r.new_payment_amount
    );
    assert_eq!(out.metadata.precision, "rust_decimal_128bit");
}

#[test]
fn test_blend_and_extend_beyond_360_is_typed_error() {
    let input = BlendAndExtendInput {
        old_rate: dec!(0.03),
        new_market_rate: dec!(0.05),
        remaining_balance: dec!(300000),
        remaining_term_months: 24,
        original_amortization_months: 300,
        remaining_amortization_months: 240,
        extend_to_months: Some(361),
        new_term_months: None,
        frequency: PaymentFrequency::Monthly,
    };
    let err = calculate_blend_and_extend(&input, &EngineConfig::default()).unwrap_err();
    assert!(matches!(
        err,
        MortgageEngineError::ExtensionExceedsMaximum { requested: 361, maximum: 360 }
    ));
}

#[test]
fn test_penalty_switches_method_at_crossover() {
    // 3-month interest on 300k at 5% is 3750. IRD with 12 months left and a
    // 1.25% spread is also 3750: the tie stays with 3-month interest.
    let tie = standard_penalty(dec!(300000), dec!(0.05), dec!(0.0375), 12);
    assert_eq!(tie.method, PenaltyMethod::ThreeMonthInterest);
    assert_eq!(tie.penalty, dec!(3750));

    let ird = standard_penalty(dec!(300000), dec!(0.05), dec!(0.0374), 12);
    assert_eq!(ird.method, PenaltyMethod::Ird);
    assert_eq!(ird.penalty, dec!(3780));
}
