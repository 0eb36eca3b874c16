#![cfg(feature = "amortization")]

use canmort_core::amortization::{
    generate_schedule, generate_schedule_with_payment, AmortizationSchedule, PrepaymentEvent,
    ScheduleInput, TermRenewal,
};
use canmort_core::payments::calculator::RemainingAmortization;
use canmort_core::{EngineConfig, PaymentFrequency};
use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn base_input() -> ScheduleInput {
    ScheduleInput {
        principal: dec!(400000),
        annual_rate: dec!(0.0549),
        amortization_months: 300,
        frequency: PaymentFrequency::Monthly,
        start_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
        prepayments: Vec::new(),
        term_renewals: Vec::new(),
        skipped_payments: Vec::new(),
        max_payments: None,
        fixed_payment: None,
    }
}

fn run(input: &ScheduleInput) -> AmortizationSchedule {
    generate_schedule(input, &EngineConfig::default()).unwrap().result
}

fn with_prepayment(event: PrepaymentEvent) -> AmortizationSchedule {
    let mut input = base_input();
    input.prepayments = vec![event];
    run(&input)
}

// ===========================================================================
// Prepayments shorten the loan and cut interest
// ===========================================================================

#[test]
fn test_every_prepayment_kind_beats_baseline() {
    let baseline = run(&base_input());
    let variants = [
        PrepaymentEvent::OneTime {
            amount: dec!(20000),
            payment_number: 12,
        },
        PrepaymentEvent::Annual {
            amount: dec!(5000),
            recurrence_month: 6,
            start_payment_number: 1,
        },
        PrepaymentEvent::MonthlyPercent {
            percent: dec!(10),
            start_payment_number: 1,
        },
    ];
    for event in variants {
        let s = with_prepayment(event.clone());
        assert!(
            s.summary.total_payments < baseline.summary.total_payments,
            "{event:?} did not shorten the loan"
        );
        assert!(
            s.summary.total_interest < baseline.summary.total_interest,
            "{event:?} did not reduce interest"
        );
        assert!(s.summary.total_prepayments > Decimal::ZERO);
    }
}

#[test]
fn test_period_principal_never_exceeds_opening_balance() {
    let mut input = base_input();
    input.prepayments = vec![
        PrepaymentEvent::OneTime {
            amount: dec!(1000000),
            payment_number: 24,
        },
        PrepaymentEvent::MonthlyPercent {
            percent: dec!(50),
            start_payment_number: 1,
        },
    ];
    let s = run(&input);
    let mut opening = input.principal;
    for row in &s.payments {
        assert!(
            row.total_principal_payment <= opening,
            "payment {} overpaid",
            row.payment_number
        );
        opening = row.remaining_balance;
    }
    assert_eq!(s.summary.payoff_payment_number, Some(24));
    assert_eq!(s.payments.last().unwrap().remaining_balance, Decimal::ZERO);
}

// ===========================================================================
// Renewals and negative amortization
// ===========================================================================

#[test]
fn test_fixed_payment_rate_shock_marks_trigger_rows() {
    let mut input = base_input();
    input.term_renewals = vec![TermRenewal {
        start_payment_number: 13,
        new_rate: dec!(0.09),
        new_payment_amount: Some(dec!(2439.24)),
        amortization_months: None,
    }];
    input.max_payments = Some(36);
    let s = run(&input);

    let before = &s.payments[11];
    assert!(!before.trigger_rate_hit);
    let after = &s.payments[12];
    assert!(after.trigger_rate_hit);
    assert_eq!(after.principal_payment, Decimal::ZERO);
    assert_eq!(after.remaining_amortization, RemainingAmortization::Undefined);
    assert!(after.remaining_balance > before.remaining_balance);
    assert_eq!(s.summary.trigger_rate_periods, 24);
}

#[test]
fn test_fixed_payment_schedule_matches_derived_payment() {
    let derived = run(&base_input());
    let fixed = generate_schedule_with_payment(&base_input(), dec!(2439.24), &EngineConfig::default())
        .unwrap()
        .result;
    assert_eq!(fixed.summary.total_payments, derived.summary.total_payments);
    assert_eq!(fixed.summary.total_interest, derived.summary.total_interest);
}

#[test]
fn test_accelerated_biweekly_pays_off_sooner() {
    let monthly = run(&base_input());
    let mut input = base_input();
    input.frequency = PaymentFrequency::AcceleratedBiweekly;
    let accelerated = run(&input);

    assert_eq!(accelerated.regular_payment, dec!(1219.62));
    let monthly_payoff = monthly.summary.payoff_date.unwrap();
    let accelerated_payoff = accelerated.summary.payoff_date.unwrap();
    assert!(accelerated_payoff < monthly_payoff);
    assert!(accelerated.summary.total_interest < monthly.summary.total_interest);
}

#[test]
fn test_schedule_serializes_decimals_as_strings() {
    let mut input = base_input();
    input.max_payments = Some(1);
    let out = generate_schedule(&input, &EngineConfig::default()).unwrap();
    let json = serde_json::to_value(&out).unwrap();
    let first = &json["result"]["payments"][0];
    assert_eq!(first["interest_payment"], "1809.41");
    assert_eq!(first["payment_date"], "2025-01-01");
    assert_eq!(first["remaining_amortization"]["status"], "defined");
}

// ===========================================================================
// Skipped payments alongside prepayments
// ===========================================================================

#[test]
fn test_biweekly_lump_sum_on_skipped_payment_is_not_lost() {
    let mut input = base_input();
    input.frequency = PaymentFrequency::Biweekly;
    input.max_payments = Some(40);
    let baseline = run(&input);

    input.skipped_payments = vec![10];
    input.prepayments = vec![PrepaymentEvent::OneTime {
        amount: dec!(8000),
        payment_number: 10,
    }];
    let out = generate_schedule(&input, &EngineConfig::default()).unwrap();
    let s = out.result;

    assert!(s.payments[9].skipped);
    assert_eq!(s.payments[9].extra_prepayment, Decimal::ZERO);
    assert_eq!(s.payments[10].extra_prepayment, dec!(8000));
    assert_eq!(s.summary.total_prepayments, dec!(8000));
    // The capitalized interest is far smaller than the lump sum.
    assert!(s.payments[39].remaining_balance < baseline.payments[39].remaining_balance);
    assert!(out.warnings.iter().any(|w| w.contains("moved to the next payment")));
}
