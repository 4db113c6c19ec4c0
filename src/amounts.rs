use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::catch_up::CurrencyRateResolver;

pub type Figure = Decimal;
pub type CurrencyIdent = String;

/// Every figure the engine produces is rounded the same way.
pub fn round_figure(figure: Figure) -> Figure {
    figure.round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeRate {
    pub rate: Figure,
    pub as_of: NaiveDate,
}

impl ExchangeRate {
    pub fn convert(&self, figure: Figure) -> Figure {
        round_figure(figure * self.rate)
    }
}

/// Rates of each currency against a common, implicit base currency.
/// `EUR:1 JPY:160` means 1 EUR is worth 160 JPY.
#[derive(Debug, Clone)]
pub struct ExchangeRates {
    rates: HashMap<CurrencyIdent, Figure>,
    as_of: NaiveDate,
}

impl ExchangeRates {
    pub fn from_ident_and_rates(
        rates: Vec<(CurrencyIdent, Figure)>,
        as_of: NaiveDate,
    ) -> Result<ExchangeRates, String> {
        let rates = rates
            .into_iter()
            .map(|(ident, rate)| {
                if rate <= Decimal::ZERO {
                    return Err(format!("Exchange rate for {} must be positive, got {}", ident, rate));
                }
                Ok((ident, rate))
            })
            .collect::<Result<HashMap<CurrencyIdent, Figure>, String>>()?;

        Ok(ExchangeRates { rates, as_of })
    }
}

impl CurrencyRateResolver for ExchangeRates {
    fn rate(&self, from: &CurrencyIdent, to: &CurrencyIdent) -> Option<ExchangeRate> {
        let from_rate = self.rates.get(from)?;
        let to_rate = self.rates.get(to)?;
        Some(ExchangeRate {
            rate: to_rate.checked_div(*from_rate)?,
            as_of: self.as_of,
        })
    }
}
