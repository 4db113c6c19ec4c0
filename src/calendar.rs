use chrono::{Datelike, Days, Months, NaiveDate};

use crate::rule::DayOfMonth;

pub fn add_days(date: NaiveDate, days: i64) -> Option<NaiveDate> {
    if days >= 0 {
        date.checked_add_days(Days::new(days.unsigned_abs()))
    } else {
        date.checked_sub_days(Days::new(days.unsigned_abs()))
    }
}

/// Shifts `date` by `months`, keeping the day of month when the target month
/// has it and falling back to the target month's last day otherwise
/// (Jan 31 + 1 month is Feb 28 or Feb 29, never Mar 2 or 3).
///
/// Clamping is lossy: `add_months(add_months(Jan 31, 1), -1)` lands on Jan 28
/// (or Jan 29 in a leap year), not Jan 31.
pub fn add_months(date: NaiveDate, months: i32) -> Option<NaiveDate> {
    if months >= 0 {
        date.checked_add_months(Months::new(months.unsigned_abs()))
    } else {
        date.checked_sub_months(Months::new(months.unsigned_abs()))
    }
}

/// Feb 29 moved to a non leap year becomes Feb 28.
pub fn add_years(date: NaiveDate, years: i32) -> Option<NaiveDate> {
    add_months(date, years.checked_mul(12)?)
}

/// Number of days of `month` (1 to 12) in `year`.
pub fn last_day_of_month(year: i32, month: u32) -> Option<u32> {
    let first_of_month = NaiveDate::from_ymd_opt(year, month, 1)?;
    let first_of_next_month = first_of_month.checked_add_months(Months::new(1))?;
    first_of_next_month.pred_opt().map(|last| last.day())
}

/// The date `day` designates in the given month. Days the month does not have
/// are clamped to its last day.
pub fn clamped_date(year: i32, month: u32, day: DayOfMonth) -> Option<NaiveDate> {
    let last_day = last_day_of_month(year, month)?;
    let target_day = match day {
        DayOfMonth::Last => last_day,
        DayOfMonth::Day(day) => u32::from(day).min(last_day),
    };
    NaiveDate::from_ymd_opt(year, month, target_day)
}
