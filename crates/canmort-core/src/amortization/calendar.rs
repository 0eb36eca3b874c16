//! Payment-date arithmetic on immutable `NaiveDate` values.
//!
//! Monthly schedules are anchored to the day-of-month of the first payment so
//! a loan that starts on the 31st pays on the last day of short months and
//! returns to the 31st afterwards. Semi-monthly schedules follow the lender
//! convention of paying on the 1st and the 15th.

use chrono::{Datelike, Duration, NaiveDate, Weekday};

use crate::error::MortgageEngineError;
use crate::rates::frequency::PaymentFrequency;
use crate::MortgageResult;

/// Last calendar day of `month` in `year`.
pub fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|d| d.pred_opt())
        .map_or(28, |d| d.day())
}

/// Shift `date` by `months` calendar months, clamping to `anchor_day` or the
/// last day of the target month, whichever is smaller.
pub fn add_months_clamped(date: NaiveDate, months: u32, anchor_day: u32) -> MortgageResult<NaiveDate> {
    let total = date.month0() + months;
    let year = date.year() + (total / 12) as i32;
    let month = total % 12 + 1;
    let day = anchor_day.min(days_in_month(year, month));
    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| MortgageEngineError::DateError(format!("cannot build {year}-{month}-{day}")))
}

/// Next 1st-or-15th on or after the day following `date`.
pub fn next_semi_monthly(date: NaiveDate) -> MortgageResult<NaiveDate> {
    if date.day() < 15 {
        return date
            .with_day(15)
            .ok_or_else(|| MortgageEngineError::DateError(format!("no 15th after {date}")));
    }
    add_months_clamped(date, 1, 1)
}

/// Due date of the payment following `current`.
///
/// `anchor_day` is the day-of-month of the first payment; only monthly
/// schedules use it.
pub fn next_payment_date(
    current: NaiveDate,
    frequency: PaymentFrequency,
    anchor_day: u32,
) -> MortgageResult<NaiveDate> {
    let next = match frequency {
        PaymentFrequency::Monthly => return add_months_clamped(current, 1, anchor_day),
        PaymentFrequency::SemiMonthly => return next_semi_monthly(current),
        PaymentFrequency::Biweekly | PaymentFrequency::AcceleratedBiweekly => {
            current.checked_add_signed(Duration::days(14))
        }
        PaymentFrequency::Weekly | PaymentFrequency::AcceleratedWeekly => {
            current.checked_add_signed(Duration::days(7))
        }
    };
    next.ok_or_else(|| MortgageEngineError::DateError(format!("date overflow after {current}")))
}

// ---------------------------------------------------------------------------
// Canadian statutory holidays
// ---------------------------------------------------------------------------

/// Easter Sunday (Anonymous Gregorian algorithm).
#[allow(clippy::many_single_char_names)]
pub fn easter_sunday(year: i32) -> Option<NaiveDate> {
    let a = year % 19;
    let b = year / 100;
    let c = year % 100;
    let d = b / 4;
    let e = b % 4;
    let f = (b + 8) / 25;
    let g = (b - f + 1) / 3;
    let h = (19 * a + b - d - g + 15) % 30;
    let i = c / 4;
    let k = c % 4;
    let l = (32 + 2 * e + 2 * i - h - k) % 7;
    let m = (a + 11 * h + 22 * l) / 451;
    let month = (h + l - 7 * m + 114) / 31;
    let day = ((h + l - 7 * m + 114) % 31) + 1;
    NaiveDate::from_ymd_opt(year, month as u32, day as u32)
}

fn nth_weekday_of_month(year: i32, month: u32, weekday: Weekday, n: u32) -> Option<NaiveDate> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let offset = (weekday.num_days_from_monday() as i32
        - first.weekday().num_days_from_monday() as i32)
        .rem_euclid(7) as u32;
    NaiveDate::from_ymd_opt(year, month, 1 + offset + (n - 1) * 7)
}

/// Monday on or before May 24 (the Monday preceding May 25).
fn victoria_day(year: i32) -> Option<NaiveDate> {
    let may_24 = NaiveDate::from_ymd_opt(year, 5, 24)?;
    let back = may_24.weekday().num_days_from_monday() as i64;
    may_24.checked_sub_signed(Duration::days(back))
}

pub fn is_canadian_holiday(date: NaiveDate) -> bool {
    let year = date.year();
    let fixed = matches!(
        (date.month(), date.day()),
        (1, 1) | (7, 1) | (11, 11) | (12, 25) | (12, 26)
    );
    if fixed {
        return true;
    }

    let easter_relative = easter_sunday(year).is_some_and(|easter| {
        date == easter - Duration::days(2) || date == easter + Duration::days(1)
    });
    easter_relative
        || victoria_day(year) == Some(date)
        || nth_weekday_of_month(year, 9, Weekday::Mon, 1) == Some(date)
        || nth_weekday_of_month(year, 10, Weekday::Mon, 2) == Some(date)
}

pub fn is_business_day(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun) && !is_canadian_holiday(date)
}

/// Roll forward to the next business day (following convention).
pub fn adjust_to_business_day(date: NaiveDate) -> NaiveDate {
    let mut adjusted = date;
    // A run of weekend plus holidays never exceeds a week.
    for _ in 0..10 {
        if is_business_day(adjusted) {
            break;
        }
        match adjusted.succ_opt() {
            Some(next) => adjusted = next,
            None => break,
        }
    }
    adjusted
}
