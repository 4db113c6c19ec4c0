use std::env::current_dir;

use chrono::Local;
use clap::Parser;
use tracing::{info, warn};

use crate::amounts::ExchangeRates;
use crate::catch_up::{CatchUpSettings, Mode, Processor, RecurringItemStore};
use crate::item::{ItemId, ItemKind, RecurringItem, ResumeOutcome, Schedule};
use crate::rule::preview_occurrences;
use crate::vault::{VaultImpl, VaultReadable};
use argument_parsing::{RecurringCommand, RecurringOptions};

mod argument_parsing;
mod formatting;

pub fn recurring_operation() {
    let result: Result<String, String> = (|| {
        let arguments = RecurringOptions::parse();
        let vault_path = match &arguments.vault {
            Some(a) => a.clone(),
            None => current_dir().map_err(|e| e.to_string())?,
        };
        let vault = VaultImpl { path: vault_path };
        let today = arguments.today.unwrap_or_else(|| Local::now().date_naive());

        match arguments.command {
            RecurringCommand::List => {
                let items = vault.list_items()?;
                Ok(formatting::format_items(&items, &today))
            }
            RecurringCommand::Add {
                id,
                name,
                kind,
                account,
                user,
                amount,
                currency,
                category,
                description,
                rule,
            } => {
                let rule = rule.into_rule().map_err(|e| e.to_string())?;
                let item = RecurringItem {
                    id: ItemId(id),
                    kind: ItemKind::from(kind),
                    account_id: account,
                    user_id: user,
                    name,
                    description,
                    category,
                    amount,
                    currency,
                    schedule: Schedule::for_new_rule(&rule).map_err(|e| e.to_string())?,
                    rule,
                };
                vault.create_item(&item)?;
                info!(item = %item.id, rule = %item.rule, "Added recurring item");
                Ok(formatting::format_added(&item))
            }
            RecurringCommand::Preview { id, count, from } => {
                let item = vault.load(&ItemId(id))?;
                let from = from.unwrap_or(item.schedule.next_occurrence);
                let dates = preview_occurrences(&item.rule, count, Some(from))
                    .map_err(|e| e.to_string())?;
                Ok(formatting::format_preview(&item, &dates))
            }
            RecurringCommand::Run { id, mode } => {
                let exchange_rates = ExchangeRates::from_ident_and_rates(arguments.exchange_rates, today)?;
                let settings = CatchUpSettings::from_vault_or_default(&vault)?;
                let processor = Processor::new(&vault, &vault, &exchange_rates, settings);

                let id = ItemId(id);
                let report = processor
                    .run(&id, Mode::from(mode), today)
                    .map_err(|e| e.to_string())?;
                Ok(formatting::format_pass_reports(&today, &[(id, Ok(report))]))
            }
            RecurringCommand::RunAll { mode } => {
                let exchange_rates = ExchangeRates::from_ident_and_rates(arguments.exchange_rates, today)?;
                let settings = CatchUpSettings::from_vault_or_default(&vault)?;
                let processor = Processor::new(&vault, &vault, &exchange_rates, settings);

                let mut results = Vec::new();
                for item in vault.list_items()? {
                    let result = processor
                        .run(&item.id, Mode::from(mode), today)
                        .map_err(|e| e.to_string());
                    if let Err(error) = &result {
                        warn!(item = %item.id, %error, "Recurring item pass failed");
                    }
                    results.push((item.id, result));
                }
                Ok(formatting::format_pass_reports(&today, &results))
            }
            RecurringCommand::Pause { id } => {
                let mut item = vault.load(&ItemId(id))?;
                item.pause();
                vault.store_item(&item)?;
                info!(item = %item.id, "Paused recurring item");
                Ok(formatting::format_paused(&item))
            }
            RecurringCommand::Resume { id } => {
                let mut item = vault.load(&ItemId(id))?;
                let outcome = item.resume(today).map_err(|e| e.to_string())?;
                if !matches!(outcome, ResumeOutcome::AlreadyActive { .. }) {
                    vault.store_item(&item)?;
                }
                info!(item = %item.id, ?outcome, "Resumed recurring item");
                Ok(formatting::format_resumed(&item, &outcome))
            }
            RecurringCommand::SetRule { id, rule } => {
                let rule = rule.into_rule().map_err(|e| e.to_string())?;
                let mut item = vault.load(&ItemId(id))?;
                item.change_rule(rule).map_err(|e| e.to_string())?;
                vault.store_item(&item)?;
                info!(item = %item.id, rule = %item.rule, "Changed recurrence rule");
                Ok(formatting::format_rule_changed(&item))
            }
        }
    })();

    if let Ok(screen) = result {
        print!("{}", screen)
    } else if let Err(error) = result {
        println!("Could not process recurring items: {}", error)
    }
}
