use std::fmt::{Display, Formatter};

use chrono::{Datelike, Month};

use super::{CustomUnit, DayOfMonth, Frequency, RecurrenceRule};

impl Display for RecurrenceRule {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.frequency {
            Frequency::Daily => write!(f, "Daily")?,
            Frequency::Weekly { weekdays: Some(mask) } => {
                let names: Vec<String> = mask.weekdays().map(|weekday| weekday.to_string()).collect();
                write!(f, "Weekly on {}", names.join(", "))?
            }
            Frequency::Weekly { weekdays: None } => write!(f, "Weekly on {}", self.start_weekday())?,
            Frequency::Biweekly => write!(f, "Every 2 weeks")?,
            Frequency::Monthly { day } => write!(f, "Monthly{}", OnDay(day))?,
            Frequency::Quarterly { day } => write!(f, "Quarterly{}", OnDay(day))?,
            Frequency::Yearly { day: None } => write!(f, "Yearly")?,
            Frequency::Yearly { day: Some(day) } => {
                let month = u8::try_from(self.start_date.month())
                    .ok()
                    .and_then(|month| Month::try_from(month).ok())
                    .map_or("", |month| month.name());
                write!(f, "Yearly on {} of {}", Ordinal(day), month)?
            }
            Frequency::Custom { interval, unit } => {
                if interval.get() == 1 {
                    write!(f, "Every {}", unit_name(unit, false))?
                } else {
                    write!(f, "Every {} {}", interval, unit_name(unit, true))?
                }
            }
        }

        if let Some(end_date) = self.end_date {
            write!(f, " until {}", end_date)?
        }
        Ok(())
    }
}

struct OnDay(Option<DayOfMonth>);

impl Display for OnDay {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.0 {
            Some(day) => write!(f, " on {}", Ordinal(day)),
            None => Ok(()),
        }
    }
}

struct Ordinal(DayOfMonth);

impl Display for Ordinal {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let day = match self.0 {
            DayOfMonth::Last => return write!(f, "the last day"),
            DayOfMonth::Day(day) => day,
        };
        let suffix = match (day % 10, day % 100) {
            (_, 11..=13) => "th",
            (1, _) => "st",
            (2, _) => "nd",
            (3, _) => "rd",
            _ => "th",
        };
        write!(f, "the {}{}", day, suffix)
    }
}

fn unit_name(unit: CustomUnit, plural: bool) -> &'static str {
    match (unit, plural) {
        (CustomUnit::Days, false) => "day",
        (CustomUnit::Days, true) => "days",
        (CustomUnit::Weeks, false) => "week",
        (CustomUnit::Weeks, true) => "weeks",
        (CustomUnit::Months, false) => "month",
        (CustomUnit::Months, true) => "months",
        (CustomUnit::Years, false) => "year",
        (CustomUnit::Years, true) => "years",
    }
}

#[allow(non_snake_case)]
#[cfg(test)]
mod tests {
    use crate::rule::{CustomUnit, DayOfMonth, Frequency, RecurrenceRule, WeekdayMask};
    use chrono::{NaiveDate, Weekday};
    use std::num::NonZeroU32;

    fn describe(frequency: Frequency) -> String {
        // 2024-03-06 is a Wednesday
        RecurrenceRule::new(frequency, NaiveDate::from_ymd_opt(2024, 3, 6).unwrap()).to_string()
    }

    fn custom(interval: u32, unit: CustomUnit) -> Frequency {
        Frequency::Custom {
            interval: NonZeroU32::new(interval).unwrap(),
            unit,
        }
    }

    #[test]
    fn daily() {
        assert_eq!(describe(Frequency::Daily), "Daily");
    }

    #[test]
    fn weekly__mask__sunday_first_order() {
        let mask = WeekdayMask::of(&[Weekday::Fri, Weekday::Mon, Weekday::Wed]).unwrap();
        assert_eq!(
            describe(Frequency::Weekly { weekdays: Some(mask) }),
            "Weekly on Mon, Wed, Fri"
        );
        let mask = WeekdayMask::of(&[Weekday::Sat, Weekday::Sun]).unwrap();
        assert_eq!(
            describe(Frequency::Weekly { weekdays: Some(mask) }),
            "Weekly on Sun, Sat"
        );
    }

    #[test]
    fn weekly__no_mask__anchor_weekday() {
        assert_eq!(describe(Frequency::Weekly { weekdays: None }), "Weekly on Wed");
    }

    #[test]
    fn biweekly() {
        assert_eq!(describe(Frequency::Biweekly), "Every 2 weeks");
    }

    #[test]
    fn monthly__ordinals() {
        let monthly = |day| describe(Frequency::Monthly { day: Some(DayOfMonth::Day(day)) });
        assert_eq!(monthly(1), "Monthly on the 1st");
        assert_eq!(monthly(2), "Monthly on the 2nd");
        assert_eq!(monthly(3), "Monthly on the 3rd");
        assert_eq!(monthly(4), "Monthly on the 4th");
        assert_eq!(monthly(11), "Monthly on the 11th");
        assert_eq!(monthly(12), "Monthly on the 12th");
        assert_eq!(monthly(13), "Monthly on the 13th");
        assert_eq!(monthly(15), "Monthly on the 15th");
        assert_eq!(monthly(21), "Monthly on the 21st");
        assert_eq!(monthly(22), "Monthly on the 22nd");
        assert_eq!(monthly(23), "Monthly on the 23rd");
        assert_eq!(monthly(31), "Monthly on the 31st");
    }

    #[test]
    fn monthly__last_day() {
        assert_eq!(
            describe(Frequency::Monthly { day: Some(DayOfMonth::Last) }),
            "Monthly on the last day"
        );
    }

    #[test]
    fn monthly__no_day() {
        assert_eq!(describe(Frequency::Monthly { day: None }), "Monthly");
    }

    #[test]
    fn quarterly() {
        assert_eq!(
            describe(Frequency::Quarterly { day: Some(DayOfMonth::Day(1)) }),
            "Quarterly on the 1st"
        );
    }

    #[test]
    fn yearly__day_uses_start_month() {
        assert_eq!(
            describe(Frequency::Yearly { day: Some(DayOfMonth::Day(15)) }),
            "Yearly on the 15th of March"
        );
        assert_eq!(
            describe(Frequency::Yearly { day: Some(DayOfMonth::Last) }),
            "Yearly on the last day of March"
        );
    }

    #[test]
    fn yearly__no_day() {
        assert_eq!(describe(Frequency::Yearly { day: None }), "Yearly");
    }

    #[test]
    fn custom__plural() {
        assert_eq!(describe(custom(3, CustomUnit::Weeks)), "Every 3 weeks");
        assert_eq!(describe(custom(10, CustomUnit::Days)), "Every 10 days");
    }

    #[test]
    fn custom__singular() {
        assert_eq!(describe(custom(1, CustomUnit::Months)), "Every month");
        assert_eq!(describe(custom(1, CustomUnit::Years)), "Every year");
    }

    #[test]
    fn with_end_date() {
        let rule = RecurrenceRule::new(Frequency::Daily, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap())
            .until(NaiveDate::from_ymd_opt(2024, 6, 30).unwrap());
        assert_eq!(rule.to_string(), "Daily until 2024-06-30");
    }
}
