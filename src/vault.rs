use std::collections::HashMap;
use std::fs::{create_dir_all, read_dir, rename, File};
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{from_reader, Value};
use tracing::debug;

use crate::amounts::CurrencyIdent;
use crate::catch_up::{RecurringItemStore, TransactionDraft, TransactionMaterializer};
use crate::item::{ItemId, RecurringItem, Schedule};

const CONFIG_FILE: &str = "config.json";
const RECURRING_DIR: &str = "recurring";
const TRANSACTIONS_DIR: &str = "transactions";

/// Directory holding the configuration, the recurring items and the
/// transactions generated from them, as JSON files.
pub trait Vault {
    /// Value stored under `name` in the vault's configuration file, `None` if
    /// the key is absent.
    fn read_vault_values<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>, String>;
}

/// Configuration section stored under `KEY`.
pub trait VaultReadable: DeserializeOwned {
    const KEY: &'static str;

    fn from_vault<V: Vault>(vault: &V) -> Result<Self, String> {
        vault
            .read_vault_values(Self::KEY)?
            .ok_or(format!("Missing '{}' in {}", Self::KEY, CONFIG_FILE))
    }

    fn from_vault_or_default<V: Vault>(vault: &V) -> Result<Self, String>
    where
        Self: Default,
    {
        Ok(vault.read_vault_values(Self::KEY)?.unwrap_or_default())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AccountSettings {
    pub currency: CurrencyIdent,
}

pub type AccountsVaultValue = HashMap<String, AccountSettings>;
impl VaultReadable for AccountsVaultValue {
    const KEY: &'static str = "accounts";
}

pub struct VaultImpl {
    pub path: PathBuf,
}

impl Vault for VaultImpl {
    fn read_vault_values<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>, String> {
        let path = self.path.join(CONFIG_FILE);
        let mut config: Value = match read_json(&path)? {
            Some(config) => config,
            None => return Ok(None),
        };

        match config.get_mut(name).map(Value::take) {
            None => Ok(None),
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|why| format!("Could not parse '{}' in {}: {}", name, path.display(), why)),
        }
    }
}

impl VaultImpl {
    pub fn list_items(&self) -> Result<Vec<RecurringItem>, String> {
        let directory = self.path.join(RECURRING_DIR);
        let dir_reader = match read_dir(&directory) {
            Err(why) if why.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(why) => {
                return Err(format!(
                    "Could not read the recurring items directory: {}",
                    why
                ))
            }
            Ok(reader) => reader,
        };

        let mut items = Vec::new();
        for maybe_dir_entry in dir_reader {
            let dir_entry = maybe_dir_entry.map_err(|why| format!("Could not read file: {}", why))?;
            let path = dir_entry.path();

            let file_type = dir_entry.file_type().map_err(|why| {
                format!("Could not read the file type of {}: {}", path.display(), why)
            })?;
            if !file_type.is_file() || path.extension().map_or(true, |extension| extension != "json") {
                continue;
            }

            let item: RecurringItem = read_json(&path)?
                .ok_or(format!("Recurring item file {} disappeared", path.display()))?;
            items.push(item);
        }

        items.sort_by(|left, right| left.id.cmp(&right.id));
        Ok(items)
    }

    /// Writes a new item; an item with the same id must not exist yet.
    pub fn create_item(&self, item: &RecurringItem) -> Result<(), String> {
        let path = self.item_path(&item.id)?;
        if path.exists() {
            return Err(format!("Recurring item '{}' already exists", item.id));
        }
        write_json(&path, item)
    }

    pub fn store_item(&self, item: &RecurringItem) -> Result<(), String> {
        write_json(&self.item_path(&item.id)?, item)
    }

    pub fn transactions(&self, id: &ItemId) -> Result<Vec<TransactionDraft>, String> {
        Ok(read_json(&self.transactions_path(id)?)?.unwrap_or_default())
    }

    fn item_path(&self, id: &ItemId) -> Result<PathBuf, String> {
        Ok(self.path.join(RECURRING_DIR).join(file_name(id)?))
    }

    fn transactions_path(&self, id: &ItemId) -> Result<PathBuf, String> {
        Ok(self.path.join(TRANSACTIONS_DIR).join(file_name(id)?))
    }
}

impl RecurringItemStore for VaultImpl {
    fn load(&self, id: &ItemId) -> Result<RecurringItem, String> {
        let path = self.item_path(id)?;
        read_json(&path)?.ok_or(format!("No recurring item '{}' in the vault", id))
    }

    fn save(&self, id: &ItemId, schedule: &Schedule) -> Result<(), String> {
        let mut item = self.load(id)?;
        item.schedule = schedule.clone();
        debug!(item = %id, next_occurrence = %schedule.next_occurrence, "Saving schedule");
        self.store_item(&item)
    }

    fn settlement_currency(&self, item: &RecurringItem) -> Result<CurrencyIdent, String> {
        let accounts = AccountsVaultValue::from_vault(self)?;
        accounts
            .get(&item.account_id)
            .map(|account| account.currency.clone())
            .ok_or(format!("Account '{}' is not configured", item.account_id))
    }
}

impl TransactionMaterializer for VaultImpl {
    fn create(&self, transaction: &TransactionDraft) -> Result<(), String> {
        let id = &transaction.recurring_item_id;
        let mut transactions = self.transactions(id)?;
        if let Some(existing) = transactions
            .iter()
            .find(|existing| existing.date == transaction.date)
        {
            if existing.same_occurrence(transaction) {
                debug!(item = %id, date = %transaction.date, "Transaction already written");
                return Ok(());
            }
            return Err(format!(
                "A different transaction for '{}' on {} already exists",
                id, transaction.date
            ));
        }

        transactions.push(transaction.clone());
        debug!(item = %id, date = %transaction.date, "Writing transaction");
        write_json(&self.transactions_path(id)?, &transactions)
    }
}

fn file_name(id: &ItemId) -> Result<String, String> {
    let valid = !id.0.is_empty()
        && id
            .0
            .chars()
            .all(|character| character.is_ascii_alphanumeric() || character == '-' || character == '_');
    if !valid {
        return Err(format!(
            "Invalid recurring item id '{}': use letters, digits, '-' and '_'",
            id
        ));
    }
    Ok(format!("{}.json", id))
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, String> {
    let file = match File::open(path) {
        Err(why) if why.kind() == ErrorKind::NotFound => return Ok(None),
        Err(why) => return Err(format!("Could not read file {}: {}", path.display(), why)),
        Ok(file) => file,
    };

    from_reader(BufReader::new(file))
        .map(Some)
        .map_err(|why| format!("Could not parse file {}: {}", path.display(), why))
}

/// Writes next to the target then renames, so readers never see half a file.
fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), String> {
    let write_error = |why: std::io::Error| format!("Could not write file {}: {}", path.display(), why);

    if let Some(parent) = path.parent() {
        create_dir_all(parent).map_err(write_error)?;
    }

    let temporary = path.with_extension("json.tmp");
    let mut writer = BufWriter::new(File::create(&temporary).map_err(write_error)?);
    serde_json::to_writer_pretty(&mut writer, value)
        .map_err(|why| format!("Could not serialize {}: {}", path.display(), why))?;
    writer.flush().map_err(write_error)?;
    drop(writer);

    rename(&temporary, path).map_err(write_error)
}
