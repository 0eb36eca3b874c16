//! Prepayment and renewal events consumed by the schedule loop.
//!
//! Events keyed by payment number are sorted once and read through a cursor
//! that only moves forward, so each lookup in the loop is O(1) amortized.

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::MortgageEngineError;
use crate::types::{Money, Rate};
use crate::MortgageResult;

fn first_payment() -> u32 {
    1
}

/// Extra principal paid on top of the regular payment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum PrepaymentEvent {
    /// Lump sum once per calendar year in `recurrence_month` (1-12).
    Annual {
        amount: Money,
        recurrence_month: u32,
        #[serde(default = "first_payment")]
        start_payment_number: u32,
    },
    /// Lump sum at exactly one payment number.
    OneTime { amount: Money, payment_number: u32 },
    /// `percent` of the current payment amount (10 = 10%), every period.
    MonthlyPercent {
        percent: Decimal,
        #[serde(default = "first_payment")]
        start_payment_number: u32,
    },
}

impl PrepaymentEvent {
    pub fn validate(&self) -> MortgageResult<()> {
        match self {
            PrepaymentEvent::Annual {
                amount,
                recurrence_month,
                ..
            } => {
                if *amount < Decimal::ZERO {
                    return Err(MortgageEngineError::invalid("prepayments.amount", "must be >= 0"));
                }
                if !(1..=12).contains(recurrence_month) {
                    return Err(MortgageEngineError::invalid(
                        "prepayments.recurrence_month",
                        format!("{recurrence_month} is not a month (1-12)"),
                    ));
                }
            }
            PrepaymentEvent::OneTime { amount, payment_number } => {
                if *amount < Decimal::ZERO {
                    return Err(MortgageEngineError::invalid("prepayments.amount", "must be >= 0"));
                }
                if *payment_number == 0 {
                    return Err(MortgageEngineError::invalid(
                        "prepayments.payment_number",
                        "payment numbers start at 1",
                    ));
                }
            }
            PrepaymentEvent::MonthlyPercent { percent, .. } => {
                if *percent < Decimal::ZERO || *percent > dec!(100) {
                    return Err(MortgageEngineError::invalid(
                        "prepayments.percent",
                        "must be between 0 and 100",
                    ));
                }
            }
        }
        Ok(())
    }
}

/// Rate (and optionally payment) change taking effect at a payment number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermRenewal {
    pub start_payment_number: u32,
    pub new_rate: Rate,
    /// Keep this payment through the term (variable rate, fixed payment).
    /// When absent the payment is recomputed from the balance.
    #[serde(default)]
    pub new_payment_amount: Option<Money>,
    /// Restart the amortization clock at this length (renewal with extension).
    #[serde(default)]
    pub amortization_months: Option<u32>,
}

impl TermRenewal {
    pub fn validate(&self, max_amortization_months: u32) -> MortgageResult<()> {
        if self.start_payment_number == 0 {
            return Err(MortgageEngineError::invalid(
                "term_renewals.start_payment_number",
                "payment numbers start at 1",
            ));
        }
        if self.new_rate < Decimal::ZERO {
            return Err(MortgageEngineError::invalid("term_renewals.new_rate", "must be >= 0"));
        }
        if matches!(self.new_payment_amount, Some(p) if p <= Decimal::ZERO) {
            return Err(MortgageEngineError::invalid(
                "term_renewals.new_payment_amount",
                "must be positive",
            ));
        }
        if let Some(months) = self.amortization_months {
            if months == 0 || months > max_amortization_months {
                return Err(MortgageEngineError::invalid(
                    "term_renewals.amortization_months",
                    format!("must be between 1 and {max_amortization_months}"),
                ));
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Cursor over events sorted by payment number
// ---------------------------------------------------------------------------

pub trait Scheduled {
    fn payment_number(&self) -> u32;
}

impl Scheduled for TermRenewal {
    fn payment_number(&self) -> u32 {
        self.start_payment_number
    }
}

#[derive(Debug, Clone, Copy)]
struct LumpSum {
    payment_number: u32,
    amount: Money,
}

impl Scheduled for LumpSum {
    fn payment_number(&self) -> u32 {
        self.payment_number
    }
}

/// Forward-only queue of events ordered by payment number.
#[derive(Debug)]
pub struct EventQueue<T> {
    events: Vec<T>,
    next: usize,
}

impl<T: Scheduled> EventQueue<T> {
    pub fn new(mut events: Vec<T>) -> Self {
        // Stable sort keeps caller order among events sharing a payment number.
        events.sort_by_key(|e| e.payment_number());
        Self { events, next: 0 }
    }

    /// Events due at `payment_number`. Events for earlier numbers that were
    /// never asked for are dropped. Calls must use non-decreasing numbers.
    pub fn due(&mut self, payment_number: u32) -> &[T] {
        while self
            .events
            .get(self.next)
            .is_some_and(|e| e.payment_number() < payment_number)
        {
            self.next += 1;
        }
        let start = self.next;
        while self
            .events
            .get(self.next)
            .is_some_and(|e| e.payment_number() == payment_number)
        {
            self.next += 1;
        }
        &self.events[start..self.next]
    }

    #[cfg(test)]
    fn is_exhausted(&self) -> bool {
        self.next >= self.events.len()
    }
}

// ---------------------------------------------------------------------------
// Prepayment plan
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct AnnualRule {
    amount: Money,
    month: u32,
    start: u32,
    last_year: Option<i32>,
}

/// All prepayment events for one schedule, split by how they are looked up.
#[derive(Debug)]
pub struct PrepaymentPlan {
    lump_sums: EventQueue<LumpSum>,
    annual: Vec<AnnualRule>,
    monthly_percent: Vec<(u32, Decimal)>,
}

impl PrepaymentPlan {
    pub fn new(events: &[PrepaymentEvent]) -> Self {
        let mut lump_sums = Vec::new();
        let mut annual = Vec::new();
        let mut monthly_percent = Vec::new();
        for event in events {
            match *event {
                PrepaymentEvent::OneTime { amount, payment_number } => {
                    lump_sums.push(LumpSum { payment_number, amount })
                }
                PrepaymentEvent::Annual {
                    amount,
                    recurrence_month,
                    start_payment_number,
                } => annual.push(AnnualRule {
                    amount,
                    month: recurrence_month,
                    start: start_payment_number,
                    last_year: None,
                }),
                PrepaymentEvent::MonthlyPercent {
                    percent,
                    start_payment_number,
                } => monthly_percent.push((start_payment_number, percent)),
            }
        }
        Self {
            lump_sums: EventQueue::new(lump_sums),
            annual,
            monthly_percent,
        }
    }

    /// Recurring percent-of-payment extra active at `payment_number`.
    pub fn recurring_extra(&self, payment_number: u32, current_payment: Money) -> Money {
        self.monthly_percent
            .iter()
            .filter(|(start, _)| payment_number >= *start)
            .map(|(_, percent)| current_payment * *percent / dec!(100))
            .sum()
    }

    /// One-time and annual lump sums due at this payment. Annual rules are
    /// marked as used for the payment's calendar year.
    pub fn lump_sums_for(&mut self, payment_number: u32, date: NaiveDate) -> Money {
        let mut extra = self
            .lump_sums
            .due(payment_number)
            .iter()
            .map(|l| l.amount)
            .sum::<Money>();

        let year = date.year();
        for rule in &mut self.annual {
            if payment_number >= rule.start
                && date.month() == rule.month
                && rule.last_year != Some(year)
            {
                rule.last_year = Some(year);
                extra += rule.amount;
            }
        }
        extra
    }

    /// Total extra requested for this payment, before any balance cap.
    pub fn extra_for(&mut self, payment_number: u32, date: NaiveDate, current_payment: Money) -> Money {
        self.recurring_extra(payment_number, current_payment) + self.lump_sums_for(payment_number, date)
    }
}
