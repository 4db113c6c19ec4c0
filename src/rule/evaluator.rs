use chrono::{Datelike, NaiveDate};

use super::{CustomUnit, DayOfMonth, Frequency, RecurrenceRule, RuleError, WeekdayMask};
use crate::calendar::{add_days, add_months, add_years, clamped_date};

const MONTHS_PER_QUARTER: i32 = 3;
const DAYS_PER_WEEK: i64 = 7;

/// First date the rule fires on. Never before the start date.
pub fn first_occurrence(rule: &RecurrenceRule) -> Result<NaiveDate, RuleError> {
    let start = rule.start_date;

    match rule.frequency {
        Frequency::Weekly { weekdays: Some(mask) } => {
            if mask.contains(start.weekday()) {
                Ok(start)
            } else {
                next_weekday_in(mask, start)
            }
        }
        Frequency::Monthly { day: Some(day) } => first_day_of_month_occurrence(start, day, 1),
        Frequency::Quarterly { day: Some(day) } => {
            first_day_of_month_occurrence(start, day, MONTHS_PER_QUARTER)
        }
        Frequency::Yearly { day: Some(day) } => first_day_of_month_occurrence(start, day, 12),
        _ => Ok(start),
    }
}

/// Occurrence following `from`, or `None` once it would fall after the rule's
/// end date.
pub fn next_occurrence(
    rule: &RecurrenceRule,
    from: NaiveDate,
) -> Result<Option<NaiveDate>, RuleError> {
    let out_of_range = || RuleError::DateOutOfRange(from);

    let candidate = match rule.frequency {
        Frequency::Daily => add_days(from, 1).ok_or_else(out_of_range)?,
        Frequency::Weekly { weekdays: Some(mask) } => next_weekday_in(mask, from)?,
        Frequency::Weekly { weekdays: None } => add_days(from, DAYS_PER_WEEK).ok_or_else(out_of_range)?,
        Frequency::Biweekly => add_days(from, 2 * DAYS_PER_WEEK).ok_or_else(out_of_range)?,
        Frequency::Monthly { day } => shift_months(from, 1, day).ok_or_else(out_of_range)?,
        Frequency::Quarterly { day } => {
            shift_months(from, MONTHS_PER_QUARTER, day).ok_or_else(out_of_range)?
        }
        Frequency::Yearly { day } => {
            let next_year = add_years(from, 1).ok_or_else(out_of_range)?;
            let next_year = match day {
                Some(day) => clamped_date(next_year.year(), next_year.month(), day),
                None => Some(next_year),
            };
            next_year.ok_or_else(out_of_range)?
        }
        Frequency::Custom { interval, unit } => {
            custom_step(from, interval.get(), unit).ok_or_else(out_of_range)?
        }
    };

    if rule.allows(&candidate) {
        Ok(Some(candidate))
    } else {
        Ok(None)
    }
}

fn next_weekday_in(mask: WeekdayMask, from: NaiveDate) -> Result<NaiveDate, RuleError> {
    (1..=DAYS_PER_WEEK)
        .map(|offset| add_days(from, offset).ok_or(RuleError::DateOutOfRange(from)))
        .find(|candidate| match candidate {
            Ok(date) => mask.contains(date.weekday()),
            Err(_) => true,
        })
        .unwrap_or(Err(RuleError::EmptyWeekdayMask))
}

fn shift_months(from: NaiveDate, months: i32, day: Option<DayOfMonth>) -> Option<NaiveDate> {
    let shifted = add_months(from, months)?;
    match day {
        Some(day) => clamped_date(shifted.year(), shifted.month(), day),
        None => Some(shifted),
    }
}

fn first_day_of_month_occurrence(
    start: NaiveDate,
    day: DayOfMonth,
    period_in_months: i32,
) -> Result<NaiveDate, RuleError> {
    let out_of_range = || RuleError::DateOutOfRange(start);

    let target = clamped_date(start.year(), start.month(), day).ok_or_else(out_of_range)?;
    if target >= start {
        return Ok(target);
    }

    shift_months(start, period_in_months, Some(day)).ok_or_else(out_of_range)
}

fn custom_step(from: NaiveDate, interval: u32, unit: CustomUnit) -> Option<NaiveDate> {
    match unit {
        CustomUnit::Days => add_days(from, i64::from(interval)),
        CustomUnit::Weeks => add_days(from, i64::from(interval).checked_mul(DAYS_PER_WEEK)?),
        CustomUnit::Months => add_months(from, i32::try_from(interval).ok()?),
        CustomUnit::Years => add_years(from, i32::try_from(interval).ok()?),
    }
}


#[allow(non_snake_case)]
#[cfg(test)]
mod next_occurrence_tests {
    use super::next_occurrence;
    use crate::rule::{CustomUnit, DayOfMonth, Frequency, RecurrenceRule, WeekdayMask};
    use chrono::{Datelike, NaiveDate, Weekday};
    use std::num::NonZeroU32;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn rule(frequency: Frequency) -> RecurrenceRule {
        RecurrenceRule::new(frequency, date(2024, 1, 1))
    }

    fn custom(interval: u32, unit: CustomUnit) -> Frequency {
        Frequency::Custom {
            interval: NonZeroU32::new(interval).unwrap(),
            unit,
        }
    }

    struct Test {
        rule: RecurrenceRule,
        from: NaiveDate,
        expected_output: Option<NaiveDate>,
    }

    impl Test {
        fn execute(&self) {
            assert_eq!(
                next_occurrence(&self.rule, self.from).unwrap(),
                self.expected_output
            )
        }
    }

    #[test]
    fn daily() {
        Test {
            rule: rule(Frequency::Daily),
            from: date(2024, 2, 28),
            expected_output: Some(date(2024, 2, 29)),
        }
        .execute();
    }

    #[test]
    fn weekly__no_mask() {
        Test {
            rule: rule(Frequency::Weekly { weekdays: None }),
            from: date(2024, 1, 29),
            expected_output: Some(date(2024, 2, 5)),
        }
        .execute();
    }

    #[test]
    fn weekly__mask__later_this_week() {
        Test {
            rule: rule(Frequency::Weekly {
                weekdays: Some(WeekdayMask::of(&[Weekday::Mon, Weekday::Wed]).unwrap()),
            }),
            from: date(2024, 1, 1),
            expected_output: Some(date(2024, 1, 3)),
        }
        .execute();
    }

    #[test]
    fn weekly__mask__next_week() {
        Test {
            rule: rule(Frequency::Weekly {
                weekdays: Some(WeekdayMask::of(&[Weekday::Mon, Weekday::Wed]).unwrap()),
            }),
            from: date(2024, 1, 3),
            expected_output: Some(date(2024, 1, 8)),
        }
        .execute();
    }

    #[test]
    fn weekly__mask__single_weekday_is_seven_days_later() {
        Test {
            rule: rule(Frequency::Weekly {
                weekdays: Some(WeekdayMask::of(&[Weekday::Thu]).unwrap()),
            }),
            from: date(2024, 1, 4),
            expected_output: Some(date(2024, 1, 11)),
        }
        .execute();
    }

    #[test]
    fn weekly__every_mask__within_seven_days_and_in_mask() {
        for bits in 1..=0x7Fu8 {
            let mask = WeekdayMask::new(bits).unwrap();
            let weekly = rule(Frequency::Weekly { weekdays: Some(mask) });
            for offset in 0..7 {
                let from = date(2024, 1, 1 + offset);
                let next = next_occurrence(&weekly, from).unwrap().unwrap();
                let distance = (next - from).num_days();
                assert!((1..=7).contains(&distance), "mask {:#04x} from {}", bits, from);
                assert!(mask.contains(next.weekday()), "mask {:#04x} from {}", bits, from);
            }
        }
    }

    #[test]
    fn biweekly() {
        Test {
            rule: rule(Frequency::Biweekly),
            from: date(2024, 12, 25),
            expected_output: Some(date(2025, 1, 8)),
        }
        .execute();
    }

    #[test]
    fn monthly__no_day__clamps() {
        Test {
            rule: rule(Frequency::Monthly { day: None }),
            from: date(2024, 1, 31),
            expected_output: Some(date(2024, 2, 29)),
        }
        .execute();
    }

    #[test]
    fn monthly__day_31__restored_after_short_month() {
        Test {
            rule: rule(Frequency::Monthly { day: Some(DayOfMonth::Day(31)) }),
            from: date(2024, 2, 29),
            expected_output: Some(date(2024, 3, 31)),
        }
        .execute();
    }

    #[test]
    fn monthly__day_31__thirty_day_month() {
        Test {
            rule: rule(Frequency::Monthly { day: Some(DayOfMonth::Day(31)) }),
            from: date(2024, 3, 31),
            expected_output: Some(date(2024, 4, 30)),
        }
        .execute();
    }

    #[test]
    fn monthly__last_day__tracks_month_length() {
        let last_day = rule(Frequency::Monthly { day: Some(DayOfMonth::Last) });
        let expected = [
            (date(2023, 1, 31), date(2023, 2, 28)),
            (date(2024, 1, 31), date(2024, 2, 29)),
            (date(2024, 2, 29), date(2024, 3, 31)),
            (date(2024, 3, 31), date(2024, 4, 30)),
            (date(2024, 4, 30), date(2024, 5, 31)),
        ];
        for (from, expected_output) in expected {
            Test {
                rule: last_day.clone(),
                from,
                expected_output: Some(expected_output),
            }
            .execute();
        }
    }

    #[test]
    fn quarterly__day() {
        Test {
            rule: rule(Frequency::Quarterly { day: Some(DayOfMonth::Day(31)) }),
            from: date(2024, 1, 31),
            expected_output: Some(date(2024, 4, 30)),
        }
        .execute();
    }

    #[test]
    fn quarterly__no_day() {
        Test {
            rule: rule(Frequency::Quarterly { day: None }),
            from: date(2024, 11, 15),
            expected_output: Some(date(2025, 2, 15)),
        }
        .execute();
    }

    #[test]
    fn yearly__no_day__leap_day() {
        Test {
            rule: rule(Frequency::Yearly { day: None }),
            from: date(2024, 2, 29),
            expected_output: Some(date(2025, 2, 28)),
        }
        .execute();
    }

    #[test]
    fn yearly__last_day__back_to_leap_year() {
        Test {
            rule: rule(Frequency::Yearly { day: Some(DayOfMonth::Last) }),
            from: date(2027, 2, 28),
            expected_output: Some(date(2028, 2, 29)),
        }
        .execute();
    }

    #[test]
    fn custom__days() {
        Test {
            rule: rule(custom(10, CustomUnit::Days)),
            from: date(2024, 1, 25),
            expected_output: Some(date(2024, 2, 4)),
        }
        .execute();
    }

    #[test]
    fn custom__weeks() {
        Test {
            rule: rule(custom(3, CustomUnit::Weeks)),
            from: date(2024, 1, 1),
            expected_output: Some(date(2024, 1, 22)),
        }
        .execute();
    }

    #[test]
    fn custom__months() {
        Test {
            rule: rule(custom(2, CustomUnit::Months)),
            from: date(2023, 12, 31),
            expected_output: Some(date(2024, 2, 29)),
        }
        .execute();
    }

    #[test]
    fn custom__years() {
        Test {
            rule: rule(custom(2, CustomUnit::Years)),
            from: date(2024, 2, 29),
            expected_output: Some(date(2026, 2, 28)),
        }
        .execute();
    }

    #[test]
    fn end_date__candidate_on_end_date() {
        Test {
            rule: rule(Frequency::Daily).until(date(2024, 1, 10)),
            from: date(2024, 1, 9),
            expected_output: Some(date(2024, 1, 10)),
        }
        .execute();
    }

    #[test]
    fn end_date__candidate_after_end_date() {
        Test {
            rule: rule(Frequency::Daily).until(date(2024, 1, 10)),
            from: date(2024, 1, 10),
            expected_output: None,
        }
        .execute();
    }

    #[test]
    fn end_date__forward_loop_never_passes_end_date() {
        let monthly = rule(Frequency::Monthly { day: Some(DayOfMonth::Day(31)) })
            .until(date(2024, 6, 15));
        let mut current = date(2024, 1, 31);
        let mut produced = vec![current];
        while let Some(next) = next_occurrence(&monthly, current).unwrap() {
            assert!(next <= date(2024, 6, 15));
            produced.push(next);
            current = next;
        }
        assert_eq!(produced.last(), Some(&date(2024, 5, 31)));
        assert_eq!(produced.len(), 5);
    }
}
