//! Payment-by-payment amortization schedule.
//!
//! The loop handles, in order for each period: term renewals, interest,
//! the trigger-rate test (negative amortization), prepayments capped at the
//! balance, skipped payments, remaining amortization and the calendar
//! advance. Two entry points share it: one derives the regular payment from
//! principal, rate and amortization, the other uses a payment the borrower
//! already makes.

use chrono::{Datelike, NaiveDate};
use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::time::Instant;
use tracing::{debug, warn};

use crate::amortization::calendar::{adjust_to_business_day, next_payment_date};
use crate::amortization::events::{EventQueue, PrepaymentEvent, PrepaymentPlan, TermRenewal};
use crate::config::EngineConfig;
use crate::error::MortgageEngineError;
use crate::payments::calculator::{
    payment, remaining_amortization, RemainingAmortization, BALANCE_EPSILON,
};
use crate::payments::skip::{can_skip, SkipRecord};
use crate::rates::conversion::effective_periodic_rate;
use crate::rates::frequency::PaymentFrequency;
use crate::types::{round_cents, with_metadata, ComputationOutput, Money, Rate};
use crate::MortgageResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleInput {
    pub principal: Money,
    /// Annual nominal rate (semi-annual compounding), e.g. 0.0549.
    pub annual_rate: Rate,
    pub amortization_months: u32,
    pub frequency: PaymentFrequency,
    /// Due date of the first payment.
    pub start_date: NaiveDate,
    #[serde(default)]
    pub prepayments: Vec<PrepaymentEvent>,
    #[serde(default)]
    pub term_renewals: Vec<TermRenewal>,
    /// Payment numbers the borrower skips (subject to the yearly limit).
    #[serde(default)]
    pub skipped_payments: Vec<u32>,
    /// Defaults to the engine's `max_payments`.
    #[serde(default)]
    pub max_payments: Option<u32>,
    /// Use this payment instead of deriving one from the amortization.
    #[serde(default)]
    pub fixed_payment: Option<Money>,
}

/// One schedule row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmortizationPayment {
    pub payment_number: u32,
    pub payment_date: NaiveDate,
    /// Regular payment in force (zero on a skipped payment).
    pub payment_amount: Money,
    pub interest_payment: Money,
    pub principal_payment: Money,
    pub extra_prepayment: Money,
    pub total_principal_payment: Money,
    pub remaining_balance: Money,
    pub remaining_amortization: RemainingAmortization,
    pub cumulative_principal: Money,
    pub cumulative_interest: Money,
    pub cumulative_prepayments: Money,
    pub trigger_rate_hit: bool,
    pub skipped: bool,
    /// Annual nominal rate charged for this period.
    pub effective_rate: Rate,
}

impl SkipRecord for AmortizationPayment {
    fn payment_date(&self) -> NaiveDate {
        self.payment_date
    }

    fn is_skipped(&self) -> bool {
        self.skipped
    }

    fn skipped_interest(&self) -> Money {
        if self.skipped {
            self.interest_payment
        } else {
            Decimal::ZERO
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleSummary {
    pub total_payments: u32,
    /// Scheduled principal plus prepayments.
    pub total_principal: Money,
    pub total_interest: Money,
    pub total_prepayments: Money,
    pub total_cost: Money,
    pub payoff_date: Option<NaiveDate>,
    pub payoff_payment_number: Option<u32>,
    /// Mean remaining amortization over rows where it is defined.
    pub average_remaining_amortization_months: Option<Decimal>,
    pub trigger_rate_periods: u32,
    pub skipped_payments: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmortizationSchedule {
    /// Regular payment at the start of the schedule.
    pub regular_payment: Money,
    pub payments: Vec<AmortizationPayment>,
    pub summary: ScheduleSummary,
}

/// Whether renewals without an explicit payment recompute it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PaymentMode {
    Recompute,
    Fixed,
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate_input(input: &ScheduleInput, config: &EngineConfig) -> MortgageResult<()> {
    if input.principal < Decimal::ZERO {
        return Err(MortgageEngineError::invalid("principal", "must be >= 0"));
    }
    if input.annual_rate < Decimal::ZERO {
        return Err(MortgageEngineError::invalid("annual_rate", "must be >= 0"));
    }
    if input.amortization_months == 0 || input.amortization_months > config.max_amortization_months
    {
        return Err(MortgageEngineError::invalid(
            "amortization_months",
            format!("must be between 1 and {}", config.max_amortization_months),
        ));
    }
    if input.max_payments == Some(0) {
        return Err(MortgageEngineError::invalid("max_payments", "must be at least 1"));
    }
    if matches!(input.fixed_payment, Some(p) if p <= Decimal::ZERO) {
        return Err(MortgageEngineError::invalid("fixed_payment", "must be positive"));
    }
    for event in &input.prepayments {
        event.validate()?;
    }
    for renewal in &input.term_renewals {
        renewal.validate(config.max_amortization_months)?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Core loop
// ---------------------------------------------------------------------------

fn months_elapsed(periods: u32, frequency: PaymentFrequency) -> u32 {
    (Decimal::from(periods) * frequency.months_per_period())
        .floor()
        .to_u32()
        .unwrap_or(u32::MAX)
}

fn build_schedule(
    input: &ScheduleInput,
    regular_payment: Money,
    mode: PaymentMode,
    config: &EngineConfig,
    warnings: &mut Vec<String>,
) -> MortgageResult<AmortizationSchedule> {
    let frequency = input.frequency;
    let max_payments = input.max_payments.unwrap_or(config.max_payments);
    let anchor_day = input.start_date.day();

    let mut renewals = EventQueue::new(input.term_renewals.clone());
    let mut plan = PrepaymentPlan::new(&input.prepayments);
    let skip_requests: BTreeSet<u32> = input.skipped_payments.iter().copied().collect();
    let mut skips_by_year: BTreeMap<i32, u32> = BTreeMap::new();

    let mut rate = input.annual_rate;
    let mut periodic = effective_periodic_rate(rate, frequency);
    let mut payment_amount = regular_payment;
    let mut amortization_base = input.amortization_months;
    let mut base_payment_number = 1u32;

    let mut balance = input.principal;
    let mut due_date = input.start_date;
    let mut cumulative_principal = Decimal::ZERO;
    let mut cumulative_interest = Decimal::ZERO;
    let mut cumulative_prepayments = Decimal::ZERO;
    let mut trigger_rate_periods = 0u32;
    let mut skipped_count = 0u32;
    let mut amortization_sum = Decimal::ZERO;
    let mut amortization_rows = 0u32;
    // Lump sums due on skipped payments, paid with the next regular payment.
    let mut deferred_extra = Decimal::ZERO;

    let mut rows = Vec::with_capacity(max_payments.min(1_200) as usize);

    for payment_number in 1..=max_payments {
        if balance <= BALANCE_EPSILON {
            break;
        }

        for renewal in renewals.due(payment_number) {
            rate = renewal.new_rate;
            periodic = effective_periodic_rate(rate, frequency);
            if let Some(months) = renewal.amortization_months {
                amortization_base = months;
                base_payment_number = payment_number;
            }
            payment_amount = match (renewal.new_payment_amount, mode) {
                (Some(fixed), _) => fixed,
                (None, PaymentMode::Fixed) => payment_amount,
                (None, PaymentMode::Recompute) => {
                    let elapsed = months_elapsed(payment_number - base_payment_number, frequency);
                    let remaining = amortization_base.saturating_sub(elapsed).max(1);
                    payment(balance, rate, remaining, frequency)
                }
            };
            debug!(
                payment_number,
                rate = %rate,
                payment = %payment_amount,
                "term renewal applied"
            );
        }

        let payment_date = if config.adjust_to_business_day {
            adjust_to_business_day(due_date)
        } else {
            due_date
        };
        let interest = round_cents(balance * periodic);

        if skip_requests.contains(&payment_number) {
            let used = skips_by_year.entry(payment_date.year()).or_insert(0);
            if can_skip(*used, config.max_skips_per_year) {
                *used += 1;
                skipped_count += 1;
                let due_lumps = plan.lump_sums_for(payment_number, payment_date);
                if due_lumps > Decimal::ZERO {
                    let msg = format!(
                        "Prepayment of {due_lumps} due at skipped payment {payment_number} moved to the next payment"
                    );
                    warn!("{msg}");
                    warnings.push(msg);
                    deferred_extra += due_lumps;
                }
                balance = round_cents(balance + interest);
                cumulative_interest += interest;
                let remaining = remaining_amortization(balance, rate, payment_amount, frequency);
                if let Some(months) = remaining.months() {
                    amortization_sum += Decimal::from(months);
                    amortization_rows += 1;
                }
                rows.push(AmortizationPayment {
                    payment_number,
                    payment_date,
                    payment_amount: Decimal::ZERO,
                    interest_payment: interest,
                    principal_payment: Decimal::ZERO,
                    extra_prepayment: Decimal::ZERO,
                    total_principal_payment: Decimal::ZERO,
                    remaining_balance: balance,
                    remaining_amortization: remaining,
                    cumulative_principal,
                    cumulative_interest,
                    cumulative_prepayments,
                    trigger_rate_hit: false,
                    skipped: true,
                    effective_rate: rate,
                });
                due_date = next_payment_date(due_date, frequency, anchor_day)?;
                continue;
            }
            let msg = format!(
                "Skip at payment {payment_number} ignored: limit of {} per year reached in {}",
                config.max_skips_per_year,
                payment_date.year()
            );
            warn!("{msg}");
            warnings.push(msg);
        }

        let opening = balance;
        let trigger_rate_hit = payment_amount <= interest;
        let (principal_payment, capitalized) = if trigger_rate_hit {
            trigger_rate_periods += 1;
            (Decimal::ZERO, interest - payment_amount)
        } else {
            ((payment_amount - interest).min(opening), Decimal::ZERO)
        };

        let after_regular = opening + capitalized - principal_payment;
        let requested = plan.extra_for(payment_number, payment_date, payment_amount) + deferred_extra;
        deferred_extra = Decimal::ZERO;
        let extra_prepayment = requested
            .min(after_regular)
            .min(opening - principal_payment)
            .max(Decimal::ZERO);
        balance = round_cents((after_regular - extra_prepayment).max(Decimal::ZERO));

        let total_principal_payment = principal_payment + extra_prepayment;
        cumulative_principal += total_principal_payment;
        cumulative_interest += interest;
        cumulative_prepayments += extra_prepayment;

        let remaining = if trigger_rate_hit && balance > BALANCE_EPSILON {
            RemainingAmortization::Undefined
        } else {
            let recurring = payment_amount + plan.recurring_extra(payment_number, payment_amount);
            remaining_amortization(balance, rate, recurring, frequency)
        };
        if let Some(months) = remaining.months() {
            amortization_sum += Decimal::from(months);
            amortization_rows += 1;
        }

        rows.push(AmortizationPayment {
            payment_number,
            payment_date,
            payment_amount,
            interest_payment: interest,
            principal_payment,
            extra_prepayment,
            total_principal_payment,
            remaining_balance: balance,
            remaining_amortization: remaining,
            cumulative_principal,
            cumulative_interest,
            cumulative_prepayments,
            trigger_rate_hit,
            skipped: false,
            effective_rate: rate,
        });

        due_date = next_payment_date(due_date, frequency, anchor_day)?;
    }

    let paid_off = balance <= BALANCE_EPSILON;
    let last = rows.last();
    let payoff_date = last.filter(|_| paid_off).map(|r| r.payment_date);
    let payoff_payment_number = last.filter(|_| paid_off).map(|r| r.payment_number);

    if !paid_off && input.principal > BALANCE_EPSILON {
        let msg = format!(
            "Balance of {balance} remains after the {max_payments}-payment limit"
        );
        warn!("{msg}");
        warnings.push(msg);
    }
    if deferred_extra > Decimal::ZERO {
        warnings.push(format!(
            "Prepayment of {deferred_extra} deferred from a skipped payment was never applied"
        ));
    }
    if trigger_rate_periods > 0 {
        warnings.push(format!(
            "Trigger rate hit in {trigger_rate_periods} period(s): payment did not cover interest"
        ));
    }

    let summary = ScheduleSummary {
        total_payments: rows.len() as u32,
        total_principal: cumulative_principal,
        total_interest: cumulative_interest,
        total_prepayments: cumulative_prepayments,
        total_cost: cumulative_principal + cumulative_interest,
        payoff_date,
        payoff_payment_number,
        average_remaining_amortization_months: (amortization_rows > 0)
            .then(|| (amortization_sum / Decimal::from(amortization_rows)).round_dp(2)),
        trigger_rate_periods,
        skipped_payments: skipped_count,
    };

    Ok(AmortizationSchedule {
        regular_payment,
        payments: rows,
        summary,
    })
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Generate a full amortization schedule.
///
/// The regular payment is derived from principal, rate and amortization
/// unless `fixed_payment` is set, in which case this behaves like
/// [`generate_schedule_with_payment`].
pub fn generate_schedule(
    input: &ScheduleInput,
    config: &EngineConfig,
) -> MortgageResult<ComputationOutput<AmortizationSchedule>> {
    if let Some(fixed) = input.fixed_payment {
        return generate_schedule_with_payment(input, fixed, config);
    }
    let start = Instant::now();
    validate_input(input, config)?;

    let regular = payment(
        input.principal,
        input.annual_rate,
        input.amortization_months,
        input.frequency,
    );
    let mut warnings = Vec::new();
    let schedule = build_schedule(input, regular, PaymentMode::Recompute, config, &mut warnings)?;
    debug!(
        payments = schedule.summary.total_payments,
        interest = %schedule.summary.total_interest,
        "amortization schedule generated"
    );

    Ok(with_metadata(
        "Canadian amortization schedule (semi-annual compounding, payment recomputed at renewal)",
        &assumptions(input, config),
        warnings,
        start.elapsed().as_micros() as u64,
        schedule,
    ))
}

/// Generate a schedule against a payment the borrower already makes.
///
/// Renewals only change the payment when they carry `new_payment_amount`.
pub fn generate_schedule_with_payment(
    input: &ScheduleInput,
    fixed_payment: Money,
    config: &EngineConfig,
) -> MortgageResult<ComputationOutput<AmortizationSchedule>> {
    let start = Instant::now();
    validate_input(input, config)?;
    if fixed_payment <= Decimal::ZERO {
        return Err(MortgageEngineError::invalid("fixed_payment", "must be positive"));
    }

    let mut warnings = Vec::new();
    let interest_only = round_cents(
        input.principal * effective_periodic_rate(input.annual_rate, input.frequency),
    );
    if fixed_payment <= interest_only {
        warnings.push(format!(
            "Payment {fixed_payment} does not cover first-period interest {interest_only}"
        ));
    }
    let schedule = build_schedule(input, fixed_payment, PaymentMode::Fixed, config, &mut warnings)?;

    Ok(with_metadata(
        "Canadian amortization schedule (semi-annual compounding, fixed payment)",
        &assumptions(input, config),
        warnings,
        start.elapsed().as_micros() as u64,
        schedule,
    ))
}

fn assumptions(input: &ScheduleInput, config: &EngineConfig) -> serde_json::Value {
    serde_json::json!({
        "frequency": input.frequency,
        "payments_per_year": input.frequency.payments_per_year(),
        "compounding": "semi-annual",
        "max_payments": input.max_payments.unwrap_or(config.max_payments),
        "adjust_to_business_day": config.adjust_to_business_day,
        "max_skips_per_year": config.max_skips_per_year,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn base_input() -> ScheduleInput {
        ScheduleInput {
            principal: dec!(400000),
            annual_rate: dec!(0.0549),
            amortization_months: 300,
            frequency: PaymentFrequency::Monthly,
            start_date: d(2025, 1, 31),
            prepayments: vec![],
            term_renewals: vec![],
            skipped_payments: vec![],
            max_payments: None,
            fixed_payment: None,
        }
    }

    fn run(input: &ScheduleInput) -> AmortizationSchedule {
        generate_schedule(input, &EngineConfig::default()).unwrap().result
    }

    #[test]
    fn test_pays_off_close_to_amortization() {
        let s = run(&base_input());
        // Rounding of the payment up to the cent can save the last period.
        let n = s.summary.payoff_payment_number.unwrap();
        assert!((299..=300).contains(&n), "n={n}");
        assert_eq!(s.payments.last().unwrap().remaining_balance, Decimal::ZERO);
        assert_eq!(s.summary.trigger_rate_periods, 0);
    }

    #[test]
    fn test_rows_are_numbered_and_balances_non_negative() {
        let s = run(&base_input());
        for (i, row) in s.payments.iter().enumerate() {
            assert_eq!(row.payment_number, i as u32 + 1);
            assert!(row.remaining_balance >= Decimal::ZERO);
            assert!(row.principal_payment + row.extra_prepayment <= dec!(400000));
        }
    }

    #[test]
    fn test_monthly_dates_stay_anchored_to_31st() {
        let s = run(&base_input());
        assert_eq!(s.payments[0].payment_date, d(2025, 1, 31));
        assert_eq!(s.payments[1].payment_date, d(2025, 2, 28));
        assert_eq!(s.payments[2].payment_date, d(2025, 3, 31));
    }

    #[test]
    fn test_total_cost_is_principal_plus_interest() {
        let s = run(&base_input());
        assert_eq!(s.summary.total_cost, s.summary.total_principal + s.summary.total_interest);
        assert!((s.summary.total_principal - dec!(400000)).abs() <= dec!(0.01));
    }

    #[test]
    fn test_zero_principal_gives_empty_schedule() {
        let mut input = base_input();
        input.principal = Decimal::ZERO;
        let out = generate_schedule(&input, &EngineConfig::default()).unwrap();
        assert!(out.result.payments.is_empty());
        assert_eq!(out.result.regular_payment, Decimal::ZERO);
    }

    #[test]
    fn test_max_payments_truncates_with_warning() {
        let mut input = base_input();
        input.max_payments = Some(12);
        let out = generate_schedule(&input, &EngineConfig::default()).unwrap();
        assert_eq!(out.result.payments.len(), 12);
        assert!(out.result.summary.payoff_date.is_none());
        assert!(out.warnings.iter().any(|w| w.contains("12-payment limit")));
    }

    #[test]
    fn test_renewal_recomputes_payment_at_higher_rate() {
        let mut input = base_input();
        input.term_renewals = vec![TermRenewal {
            start_payment_number: 61,
            new_rate: dec!(0.0649),
            new_payment_amount: None,
            amortization_months: None,
        }];
        let s = run(&input);
        let before = &s.payments[59];
        let after = &s.payments[60];
        assert!(after.payment_amount > before.payment_amount);
        assert_eq!(after.effective_rate, dec!(0.0649));
        // Recomputed over the 240 months left, so the loan still ends near month 300.
        let n = s.summary.payoff_payment_number.unwrap();
        assert!((299..=301).contains(&n), "n={n}");
    }

    #[test]
    fn test_fixed_payment_renewal_triggers_negative_amortization() {
        let mut input = base_input();
        input.max_payments = Some(36);
        input.term_renewals = vec![TermRenewal {
            start_payment_number: 13,
            new_rate: dec!(0.09),
            new_payment_amount: Some(dec!(2439.24)),
            amortization_months: None,
        }];
        let s = run(&input);
        let hit = &s.payments[12];
        assert!(hit.trigger_rate_hit);
        assert_eq!(hit.principal_payment, Decimal::ZERO);
        assert_eq!(hit.remaining_amortization, RemainingAmortization::Undefined);
        assert!(hit.remaining_balance > s.payments[11].remaining_balance);
        assert_eq!(s.summary.trigger_rate_periods, 24);
        assert!(s.summary.average_remaining_amortization_months.is_some());
    }

    #[test]
    fn test_fixed_payment_variant_keeps_payment_on_renewal() {
        let mut input = base_input();
        input.max_payments = Some(30);
        input.term_renewals = vec![TermRenewal {
            start_payment_number: 13,
            new_rate: dec!(0.045),
            new_payment_amount: None,
            amortization_months: None,
        }];
        let out = generate_schedule_with_payment(&input, dec!(2600), &EngineConfig::default()).unwrap();
        assert!(out.result.payments.iter().all(|r| r.payment_amount == dec!(2600)));
        assert_eq!(out.result.payments[12].effective_rate, dec!(0.045));
    }

    #[test]
    fn test_one_time_prepayment_capped_at_balance() {
        let mut input = base_input();
        input.principal = dec!(10000);
        input.amortization_months = 12;
        input.prepayments = vec![PrepaymentEvent::OneTime {
            amount: dec!(50000),
            payment_number: 2,
        }];
        let s = run(&input);
        assert_eq!(s.payments.len(), 2);
        let second = &s.payments[1];
        assert!(second.principal_payment + second.extra_prepayment <= s.payments[0].remaining_balance);
        assert_eq!(second.remaining_balance, Decimal::ZERO);
    }

    #[test]
    fn test_skipped_payment_capitalizes_interest() {
        let mut input = base_input();
        input.skipped_payments = vec![3];
        let s = run(&input);
        let skipped = &s.payments[2];
        assert!(skipped.skipped);
        assert_eq!(skipped.payment_amount, Decimal::ZERO);
        assert_eq!(
            skipped.remaining_balance,
            s.payments[1].remaining_balance + skipped.interest_payment
        );
        assert_eq!(s.summary.skipped_payments, 1);
    }

    #[test]
    fn test_skips_beyond_yearly_limit_are_ignored() {
        let mut input = base_input();
        input.skipped_payments = vec![2, 4, 6];
        let out = generate_schedule(&input, &EngineConfig::default()).unwrap();
        assert_eq!(out.result.summary.skipped_payments, 2);
        assert!(!out.result.payments[5].skipped);
        assert!(out.warnings.iter().any(|w| w.contains("Skip at payment 6")));
    }

    #[test]
    fn test_lump_sum_on_skipped_payment_moves_to_next_payment() {
        let mut input = base_input();
        input.skipped_payments = vec![3];
        input.prepayments = vec![PrepaymentEvent::OneTime {
            amount: dec!(10000),
            payment_number: 3,
        }];
        let out = generate_schedule(&input, &EngineConfig::default()).unwrap();
        let s = out.result;
        assert_eq!(s.summary.skipped_payments, 1);
        assert_eq!(s.payments[2].extra_prepayment, Decimal::ZERO);
        assert_eq!(s.payments[3].extra_prepayment, dec!(10000));
        assert_eq!(s.summary.total_prepayments, dec!(10000));
        assert!(out.warnings.iter().any(|w| w.contains("skipped payment 3")));
    }

    #[test]
    fn test_annual_prepayment_survives_skipped_month() {
        let mut input = base_input();
        input.start_date = d(2025, 1, 1);
        input.max_payments = Some(24);
        // Payment 6 falls in June 2025.
        input.skipped_payments = vec![6];
        input.prepayments = vec![PrepaymentEvent::Annual {
            amount: dec!(5000),
            recurrence_month: 6,
            start_payment_number: 1,
        }];
        let s = run(&input);
        assert!(s.payments[5].skipped);
        assert_eq!(s.payments[6].extra_prepayment, dec!(5000));
        assert_eq!(s.payments[17].extra_prepayment, dec!(5000));
        assert_eq!(s.summary.total_prepayments, dec!(10000));
    }

    #[test]
    fn test_renewal_on_skipped_payment_takes_effect() {
        let mut input = base_input();
        input.max_payments = Some(24);
        input.skipped_payments = vec![13];
        input.term_renewals = vec![TermRenewal {
            start_payment_number: 13,
            new_rate: dec!(0.0649),
            new_payment_amount: None,
            amortization_months: None,
        }];
        let s = run(&input);
        let skipped = &s.payments[12];
        assert!(skipped.skipped);
        assert_eq!(skipped.effective_rate, dec!(0.0649));
        let expected_interest = round_cents(
            s.payments[11].remaining_balance
                * effective_periodic_rate(dec!(0.0649), PaymentFrequency::Monthly),
        );
        assert_eq!(skipped.interest_payment, expected_interest);
        assert!(s.payments[13].payment_amount > s.payments[11].payment_amount);
    }

    #[test]
    fn test_semi_monthly_aligns_after_first_payment() {
        let mut input = base_input();
        input.frequency = PaymentFrequency::SemiMonthly;
        input.start_date = d(2023, 11, 20);
        input.max_payments = Some(4);
        let s = run(&input);
        assert_eq!(s.payments[0].payment_date, d(2023, 11, 20));
        assert_eq!(s.payments[1].payment_date, d(2023, 12, 1));
        assert_eq!(s.payments[2].payment_date, d(2023, 12, 15));
        assert_eq!(s.payments[3].payment_date, d(2024, 1, 1));
    }

    #[test]
    fn test_business_day_adjustment_moves_reported_date_only() {
        let mut input = base_input();
        input.start_date = d(2025, 6, 1); // Sunday
        input.max_payments = Some(3);
        let config = EngineConfig {
            adjust_to_business_day: true,
            ..EngineConfig::default()
        };
        let s = generate_schedule(&input, &config).unwrap().result;
        assert_eq!(s.payments[0].payment_date, d(2025, 6, 2));
        // July 1 is Canada Day.
        assert_eq!(s.payments[1].payment_date, d(2025, 7, 2));
        assert_eq!(s.payments[2].payment_date, d(2025, 8, 1));
    }

    #[test]
    fn test_invalid_amortization_rejected() {
        let mut input = base_input();
        input.amortization_months = 0;
        assert!(generate_schedule(&input, &EngineConfig::default()).is_err());
        input.amortization_months = 480;
        assert!(generate_schedule(&input, &EngineConfig::default()).is_err());
    }
}
