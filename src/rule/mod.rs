use std::num::NonZeroU32;

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use thiserror::Error;

mod describe;
mod evaluator;
mod preview;

pub use evaluator::{first_occurrence, next_occurrence};
pub use preview::preview_occurrences;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuleError {
    #[error("Custom frequency requires an interval")]
    MissingCustomInterval,

    #[error("Custom frequency requires a unit")]
    MissingCustomUnit,

    #[error("Custom interval must be at least 1")]
    ZeroCustomInterval,

    #[error("Day of week mask {0:#04x} uses more than 7 bits")]
    InvalidWeekdayMask(u8),

    #[error("Day of week mask selects no weekday")]
    EmptyWeekdayMask,

    #[error("Day of month must be between 1 and 31, or -1 for the last day (got {0})")]
    InvalidDayOfMonth(i8),

    #[error("Date computation from {0} is out of the supported calendar range")]
    DateOutOfRange(NaiveDate),
}

/// Set of weekdays a weekly rule fires on. Bit 0 is Sunday, bit 6 Saturday.
/// Never empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WeekdayMask(u8);

impl WeekdayMask {
    pub const SUNDAY_FIRST: [Weekday; 7] = [
        Weekday::Sun,
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
        Weekday::Sat,
    ];

    pub fn new(bits: u8) -> Result<WeekdayMask, RuleError> {
        if bits > 0x7F {
            return Err(RuleError::InvalidWeekdayMask(bits));
        }
        if bits == 0 {
            return Err(RuleError::EmptyWeekdayMask);
        }
        Ok(WeekdayMask(bits))
    }

    pub fn of(weekdays: &[Weekday]) -> Result<WeekdayMask, RuleError> {
        let bits = weekdays
            .iter()
            .fold(0u8, |bits, weekday| bits | (1 << weekday.num_days_from_sunday()));
        WeekdayMask::new(bits)
    }

    pub fn bits(&self) -> u8 {
        self.0
    }

    pub fn contains(&self, weekday: Weekday) -> bool {
        self.0 & (1 << weekday.num_days_from_sunday()) != 0
    }

    pub fn weekdays(&self) -> impl Iterator<Item = Weekday> + '_ {
        Self::SUNDAY_FIRST
            .into_iter()
            .filter(move |weekday| self.contains(*weekday))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DayOfMonth {
    /// 1 to 31. Clamped to the last day in shorter months.
    Day(u8),
    /// Last calendar day of whichever month is being computed.
    Last,
}

impl DayOfMonth {
    pub const LAST_SENTINEL: i8 = -1;

    pub fn from_raw(raw: i8) -> Result<DayOfMonth, RuleError> {
        match raw {
            Self::LAST_SENTINEL => Ok(DayOfMonth::Last),
            1..=31 => Ok(DayOfMonth::Day(raw.unsigned_abs())),
            _ => Err(RuleError::InvalidDayOfMonth(raw)),
        }
    }

    pub fn to_raw(self) -> i8 {
        match self {
            DayOfMonth::Last => Self::LAST_SENTINEL,
            // Day is at most 31 by construction
            DayOfMonth::Day(day) => day as i8,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CustomUnit {
    Days,
    Weeks,
    Months,
    Years,
}

/// How often a rule fires. Each variant only carries the settings that mean
/// something for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Frequency {
    Daily,
    /// Without weekdays, fires every 7 days on the anchor's weekday.
    Weekly { weekdays: Option<WeekdayMask> },
    Biweekly,
    Monthly { day: Option<DayOfMonth> },
    Quarterly { day: Option<DayOfMonth> },
    /// The day applies to the start date's month.
    Yearly { day: Option<DayOfMonth> },
    Custom { interval: NonZeroU32, unit: CustomUnit },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawRecurrenceRule", into = "RawRecurrenceRule")]
pub struct RecurrenceRule {
    pub frequency: Frequency,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
}

impl RecurrenceRule {
    pub fn new(frequency: Frequency, start_date: NaiveDate) -> RecurrenceRule {
        RecurrenceRule {
            frequency,
            start_date,
            end_date: None,
        }
    }

    pub fn until(self, end_date: NaiveDate) -> RecurrenceRule {
        RecurrenceRule {
            end_date: Some(end_date),
            ..self
        }
    }

    /// False when `date` falls strictly after the end date.
    pub fn allows(&self, date: &NaiveDate) -> bool {
        self.end_date.map_or(true, |end_date| *date <= end_date)
    }

    pub fn start_weekday(&self) -> Weekday {
        self.start_date.weekday()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RawFrequency {
    Daily,
    Weekly,
    Biweekly,
    Monthly,
    Quarterly,
    Yearly,
    Custom,
}

/// Flat shape a rule is stored in. Fields that do not apply to the frequency
/// are ignored when reading and left empty when writing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRecurrenceRule {
    pub frequency: RawFrequency,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_interval: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_unit: Option<CustomUnit>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day_of_week_mask: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day_of_month: Option<i8>,
    pub start_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
}

impl TryFrom<RawRecurrenceRule> for RecurrenceRule {
    type Error = RuleError;

    fn try_from(raw: RawRecurrenceRule) -> Result<Self, Self::Error> {
        let day = || raw.day_of_month.map(DayOfMonth::from_raw).transpose();

        let frequency = match raw.frequency {
            RawFrequency::Daily => Frequency::Daily,
            RawFrequency::Weekly => Frequency::Weekly {
                weekdays: match raw.day_of_week_mask {
                    None | Some(0) => None,
                    Some(bits) => Some(WeekdayMask::new(bits)?),
                },
            },
            RawFrequency::Biweekly => Frequency::Biweekly,
            RawFrequency::Monthly => Frequency::Monthly { day: day()? },
            RawFrequency::Quarterly => Frequency::Quarterly { day: day()? },
            RawFrequency::Yearly => Frequency::Yearly { day: day()? },
            RawFrequency::Custom => {
                let interval = raw.custom_interval.ok_or(RuleError::MissingCustomInterval)?;
                Frequency::Custom {
                    interval: NonZeroU32::new(interval).ok_or(RuleError::ZeroCustomInterval)?,
                    unit: raw.custom_unit.ok_or(RuleError::MissingCustomUnit)?,
                }
            }
        };

        Ok(RecurrenceRule {
            frequency,
            start_date: raw.start_date,
            end_date: raw.end_date,
        })
    }
}

impl From<RecurrenceRule> for RawRecurrenceRule {
    fn from(rule: RecurrenceRule) -> Self {
        let mut raw = RawRecurrenceRule {
            frequency: RawFrequency::Daily,
            custom_interval: None,
            custom_unit: None,
            day_of_week_mask: None,
            day_of_month: None,
            start_date: rule.start_date,
            end_date: rule.end_date,
        };

        match rule.frequency {
            Frequency::Daily => {}
            Frequency::Weekly { weekdays } => {
                raw.frequency = RawFrequency::Weekly;
                raw.day_of_week_mask = weekdays.map(|mask| mask.bits());
            }
            Frequency::Biweekly => raw.frequency = RawFrequency::Biweekly,
            Frequency::Monthly { day } => {
                raw.frequency = RawFrequency::Monthly;
                raw.day_of_month = day.map(DayOfMonth::to_raw);
            }
            Frequency::Quarterly { day } => {
                raw.frequency = RawFrequency::Quarterly;
                raw.day_of_month = day.map(DayOfMonth::to_raw);
            }
            Frequency::Yearly { day } => {
                raw.frequency = RawFrequency::Yearly;
                raw.day_of_month = day.map(DayOfMonth::to_raw);
            }
            Frequency::Custom { interval, unit } => {
                raw.frequency = RawFrequency::Custom;
                raw.custom_interval = Some(interval.get());
                raw.custom_unit = Some(unit);
            }
        }

        raw
    }
}
