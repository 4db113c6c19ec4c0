use chrono::NaiveDate;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::collaborators::{
    Conversion, CurrencyRateResolver, RecurringItemStore, TransactionDraft, TransactionMaterializer,
};
use super::locks::ItemLocks;
use super::settings::CatchUpSettings;
use crate::amounts::CurrencyIdent;
use crate::item::{ItemId, ItemStatus, RecurringItem, Schedule};
use crate::rule::{next_occurrence, RuleError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Generate at most one due occurrence.
    Tick,
    /// Generate every due occurrence, up to the configured per-pass limit.
    CatchUp,
}

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("Recurring item store failed: {0}")]
    Store(String),

    #[error("Could not resolve the settlement currency of {id}: {reason}")]
    SettlementCurrency { id: ItemId, reason: String },

    #[error("Recurring item {id} has an invalid rule: {source}")]
    Rule {
        id: ItemId,
        #[source]
        source: RuleError,
    },

    #[error("Recurring item {0} is already being processed")]
    AlreadyRunning(ItemId),
}

/// Outcome of one pass over a recurring item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassReport {
    pub generated: u32,
    pub errors: u32,
    pub final_next_occurrence: NaiveDate,
    pub is_active: bool,
    pub status: ItemStatus,
    /// Occurrences are still due after this pass.
    pub more_due: bool,
}

pub struct Processor<'a, S, M, R> {
    store: &'a S,
    materializer: &'a M,
    rates: &'a R,
    settings: CatchUpSettings,
    locks: ItemLocks,
}

impl<'a, S, M, R> Processor<'a, S, M, R>
where
    S: RecurringItemStore,
    M: TransactionMaterializer,
    R: CurrencyRateResolver,
{
    pub fn new(store: &'a S, materializer: &'a M, rates: &'a R, settings: CatchUpSettings) -> Self {
        Processor {
            store,
            materializer,
            rates,
            settings,
            locks: ItemLocks::default(),
        }
    }

    /// Brings the item's schedule up to `today`, creating one transaction per
    /// due occurrence. Stops at the first failed creation without retrying;
    /// transactions created before it are kept. The schedule is saved once, at
    /// the end of the pass. Paused and exhausted items are left untouched.
    pub fn run(&self, id: &ItemId, mode: Mode, today: NaiveDate) -> Result<PassReport, ProcessError> {
        let _guard = self
            .locks
            .try_acquire(id)
            .ok_or_else(|| ProcessError::AlreadyRunning(id.clone()))?;

        let item = self.store.load(id).map_err(ProcessError::Store)?;
        if !item.schedule.is_active {
            debug!(item = %id, "Skipping inactive recurring item");
            return Ok(PassReport {
                generated: 0,
                errors: 0,
                final_next_occurrence: item.schedule.next_occurrence,
                is_active: false,
                status: item.status(&today),
                more_due: false,
            });
        }

        let settlement_currency = self
            .store
            .settlement_currency(&item)
            .map_err(|reason| ProcessError::SettlementCurrency {
                id: id.clone(),
                reason,
            })?;

        let limit = match mode {
            Mode::Tick => 1,
            Mode::CatchUp => self.settings.max_occurrences_per_pass,
        };

        let mut schedule = item.schedule.clone();
        let mut generated = 0;
        let mut errors = 0;
        let mut rule_error = None;
        let mut conversion = None;

        while schedule.is_active && schedule.next_occurrence <= today && generated < limit {
            let occurrence = schedule.next_occurrence;
            if !item.rule.allows(&occurrence) {
                schedule.is_active = false;
                break;
            }

            if generated == 0 {
                conversion = self.conversion(&item, &settlement_currency);
            }
            let transaction = TransactionDraft::for_occurrence(&item, occurrence, conversion.clone());
            if let Err(reason) = self.materializer.create(&transaction) {
                warn!(item = %id, %occurrence, %reason, "Could not create transaction, stopping pass");
                errors += 1;
                break;
            }

            debug!(item = %id, %occurrence, "Created transaction");
            schedule.last_generated_date = Some(occurrence);
            generated += 1;

            match next_occurrence(&item.rule, occurrence) {
                Ok(Some(next)) => schedule.next_occurrence = next,
                Ok(None) => {
                    info!(item = %id, last = %occurrence, "Recurring item reached its end date");
                    schedule.is_active = false;
                }
                Err(error) => {
                    errors += 1;
                    rule_error = Some(error);
                    break;
                }
            }
        }

        self.save(id, &schedule)?;

        if let Some(source) = rule_error {
            return Err(ProcessError::Rule {
                id: id.clone(),
                source,
            });
        }

        let more_due = schedule.is_active && schedule.next_occurrence <= today;
        info!(
            item = %id,
            generated,
            errors,
            next_occurrence = %schedule.next_occurrence,
            is_active = schedule.is_active,
            more_due,
            "Processed recurring item"
        );

        Ok(PassReport {
            generated,
            errors,
            final_next_occurrence: schedule.next_occurrence,
            is_active: schedule.is_active,
            status: schedule.status(&item.rule, &today),
            more_due,
        })
    }

    fn conversion(&self, item: &RecurringItem, settlement_currency: &CurrencyIdent) -> Option<Conversion> {
        if item.currency == *settlement_currency {
            return None;
        }

        let Some(rate) = self.rates.rate(&item.currency, settlement_currency) else {
            warn!(
                item = %item.id,
                from = %item.currency,
                to = %settlement_currency,
                "No exchange rate available, transactions are created without conversion"
            );
            return None;
        };

        Some(Conversion {
            amount: rate.convert(item.amount),
            currency: settlement_currency.clone(),
            rate: rate.rate,
            as_of: rate.as_of,
        })
    }

    fn save(&self, id: &ItemId, schedule: &Schedule) -> Result<(), ProcessError> {
        self.store.save(id, schedule).map_err(|reason| {
            warn!(item = %id, %reason, "Could not save schedule after pass");
            ProcessError::Store(reason)
        })
    }
}
