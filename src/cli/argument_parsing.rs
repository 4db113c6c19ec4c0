use std::num::NonZeroU32;
use std::path::PathBuf;

use chrono::{NaiveDate, Weekday};
use clap::{Args, Parser, Subcommand, ValueEnum};
use rust_decimal::Decimal;

use crate::catch_up::Mode;
use crate::item::ItemKind;
use crate::rule::{CustomUnit, DayOfMonth, Frequency, RecurrenceRule, RuleError, WeekdayMask};

pub type ExchangeRateArgument = (String, Decimal);

fn parse_exchange_rate(s: &str) -> Result<ExchangeRateArgument, String> {
    let rate: Option<ExchangeRateArgument> = (|| {
        let (currency, raw_rate) = s.split_once(':')?;
        if currency.is_empty() || raw_rate.contains(':') {
            return None;
        }

        let rate = Decimal::from_str_exact(raw_rate).ok()?;

        Some((currency.into(), rate))
    })();

    rate.ok_or(format!(
        "Could not decode exchange rate {}: Format is {{CURRENCY_NAME}}:{{RATE}}, eg. EUR:0.24561",
        &s
    ))
}

fn parse_amount(s: &str) -> Result<Decimal, String> {
    Decimal::from_str_exact(s).map_err(|_| format!("Could not decode amount {}", s))
}

fn parse_weekday(s: &str) -> Result<Weekday, String> {
    s.parse::<Weekday>()
        .map_err(|_| format!("Could not decode weekday {}: use mon, tue, ... or sun", s))
}

fn parse_day_of_month(s: &str) -> Result<i8, String> {
    if s == "last" {
        return Ok(DayOfMonth::LAST_SENTINEL);
    }
    s.parse::<i8>()
        .map_err(|_| format!("Could not decode day of month {}: use 1 to 31 or last", s))
}

#[derive(Parser)]
#[command(about = "Generates the transactions of recurring expenses and incomes")]
pub struct RecurringOptions {
    /// Vault directory, defaults to the current directory
    #[arg(short = 'V', long, global = true)]
    pub vault: Option<PathBuf>,

    /// Date to consider as today, defaults to the local date
    #[arg(long, global = true)]
    pub today: Option<NaiveDate>,

    /// Rate of a currency against a common base, eg. EUR:1 JPY:160
    #[arg(short = 'r', long = "exchange-rate", value_parser = parse_exchange_rate, global = true)]
    pub exchange_rates: Vec<ExchangeRateArgument>,

    #[command(subcommand)]
    pub command: RecurringCommand,
}

#[derive(Subcommand)]
pub enum RecurringCommand {
    /// List the recurring items of the vault
    List,
    /// Create a recurring item
    Add {
        id: String,
        #[arg(long)]
        name: String,
        #[arg(long, value_enum, default_value_t = KindArgument::Expense)]
        kind: KindArgument,
        #[arg(long)]
        account: String,
        #[arg(long)]
        user: String,
        #[arg(long, value_parser = parse_amount)]
        amount: Decimal,
        #[arg(long)]
        currency: String,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[command(flatten)]
        rule: RuleArguments,
    },
    /// Show the upcoming occurrences of an item
    Preview {
        id: String,
        #[arg(short = 'n', long, default_value_t = 5)]
        count: usize,
        /// First date of the preview, defaults to the item's next occurrence
        #[arg(long)]
        from: Option<NaiveDate>,
    },
    /// Generate the due transactions of an item
    Run {
        id: String,
        #[arg(short = 'm', long, value_enum, default_value_t = ModeArgument::CatchUp)]
        mode: ModeArgument,
    },
    /// Generate the due transactions of every item
    RunAll {
        #[arg(short = 'm', long, value_enum, default_value_t = ModeArgument::CatchUp)]
        mode: ModeArgument,
    },
    /// Stop generating transactions for an item
    Pause { id: String },
    /// Generate transactions for a paused item again, starting after today
    Resume { id: String },
    /// Replace the rule of an item and restart its schedule
    SetRule {
        id: String,
        #[command(flatten)]
        rule: RuleArguments,
    },
}

/// Options that apply to another frequency are ignored.
#[derive(Args, Debug)]
pub struct RuleArguments {
    #[arg(long, value_enum)]
    pub frequency: FrequencyArgument,
    #[arg(long)]
    pub start: NaiveDate,
    /// Last date an occurrence may fall on
    #[arg(long)]
    pub until: Option<NaiveDate>,
    /// Weekly: weekday to repeat on, defaults to the start date's weekday
    #[arg(long = "weekday", value_parser = parse_weekday)]
    pub weekdays: Vec<Weekday>,
    /// Monthly, quarterly and yearly: 1 to 31, or last
    #[arg(long, value_parser = parse_day_of_month)]
    pub day: Option<i8>,
    /// Custom: number of units between occurrences
    #[arg(long)]
    pub every: Option<u32>,
    /// Custom: unit of --every
    #[arg(long, value_enum)]
    pub unit: Option<UnitArgument>,
}

impl RuleArguments {
    pub fn into_rule(self) -> Result<RecurrenceRule, RuleError> {
        let day = || self.day.map(DayOfMonth::from_raw).transpose();
        let frequency = match self.frequency {
            FrequencyArgument::Daily => Frequency::Daily,
            FrequencyArgument::Weekly => Frequency::Weekly {
                weekdays: if self.weekdays.is_empty() {
                    None
                } else {
                    Some(WeekdayMask::of(&self.weekdays)?)
                },
            },
            FrequencyArgument::Biweekly => Frequency::Biweekly,
            FrequencyArgument::Monthly => Frequency::Monthly { day: day()? },
            FrequencyArgument::Quarterly => Frequency::Quarterly { day: day()? },
            FrequencyArgument::Yearly => Frequency::Yearly { day: day()? },
            FrequencyArgument::Custom => {
                let every = self.every.ok_or(RuleError::MissingCustomInterval)?;
                Frequency::Custom {
                    interval: NonZeroU32::new(every).ok_or(RuleError::ZeroCustomInterval)?,
                    unit: self.unit.ok_or(RuleError::MissingCustomUnit)?.into(),
                }
            }
        };

        let rule = RecurrenceRule::new(frequency, self.start);
        Ok(match self.until {
            Some(until) => rule.until(until),
            None => rule,
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum FrequencyArgument {
    Daily,
    Weekly,
    Biweekly,
    Monthly,
    Quarterly,
    Yearly,
    Custom,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum UnitArgument {
    Days,
    Weeks,
    Months,
    Years,
}

impl From<UnitArgument> for CustomUnit {
    fn from(value: UnitArgument) -> Self {
        match value {
            UnitArgument::Days => CustomUnit::Days,
            UnitArgument::Weeks => CustomUnit::Weeks,
            UnitArgument::Months => CustomUnit::Months,
            UnitArgument::Years => CustomUnit::Years,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum KindArgument {
    Expense,
    Income,
}

impl From<KindArgument> for ItemKind {
    fn from(value: KindArgument) -> Self {
        match value {
            KindArgument::Expense => ItemKind::Expense,
            KindArgument::Income => ItemKind::Income,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ModeArgument {
    Tick,
    CatchUp,
}

impl From<ModeArgument> for Mode {
    fn from(value: ModeArgument) -> Self {
        match value {
            ModeArgument::Tick => Mode::Tick,
            ModeArgument::CatchUp => Mode::CatchUp,
        }
    }
}
