use chrono::NaiveDate;
#[cfg(test)]
use mockall::automock;
use serde::{Deserialize, Serialize};

use crate::amounts::{CurrencyIdent, ExchangeRate, Figure};
use crate::item::{ItemId, ItemKind, RecurringItem, Schedule};

/// Amount of a transaction expressed in the account's settlement currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversion {
    pub amount: Figure,
    pub currency: CurrencyIdent,
    pub rate: Figure,
    pub as_of: NaiveDate,
}

/// Concrete transaction generated for one occurrence of a recurring item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionDraft {
    pub recurring_item_id: ItemId,
    pub kind: ItemKind,
    pub account_id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub amount: Figure,
    pub currency: CurrencyIdent,
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversion: Option<Conversion>,
}

impl TransactionDraft {
    pub fn for_occurrence(
        item: &RecurringItem,
        date: NaiveDate,
        conversion: Option<Conversion>,
    ) -> TransactionDraft {
        TransactionDraft {
            recurring_item_id: item.id.clone(),
            kind: item.kind,
            account_id: item.account_id.clone(),
            name: item.name.clone(),
            category: item.category.clone(),
            amount: item.amount,
            currency: item.currency.clone(),
            date,
            conversion,
        }
    }

    /// Both drafts book the same occurrence of the same item. The conversion
    /// is left out: its rate may differ between two passes.
    pub fn same_occurrence(&self, other: &TransactionDraft) -> bool {
        self.recurring_item_id == other.recurring_item_id
            && self.date == other.date
            && self.kind == other.kind
            && self.account_id == other.account_id
            && self.amount == other.amount
            && self.currency == other.currency
    }
}

#[cfg_attr(test, automock)]
pub trait RecurringItemStore {
    fn load(&self, id: &ItemId) -> Result<RecurringItem, String>;
    fn save(&self, id: &ItemId, schedule: &Schedule) -> Result<(), String>;
    /// Currency the item's account settles in.
    fn settlement_currency(&self, item: &RecurringItem) -> Result<CurrencyIdent, String>;
}

#[cfg_attr(test, automock)]
pub trait TransactionMaterializer {
    fn create(&self, transaction: &TransactionDraft) -> Result<(), String>;
}

#[cfg_attr(test, automock)]
pub trait CurrencyRateResolver {
    /// `None` when no rate is known. Not an error: the transaction is then
    /// created without conversion.
    fn rate(&self, from: &CurrencyIdent, to: &CurrencyIdent) -> Option<ExchangeRate>;
}
