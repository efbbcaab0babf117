//! Durable account store backed by a JSON file
//!
//! The file holds one JSON object mapping usernames to accounts:
//!
//! ```text
//! {
//!   "alice": { "password_hash": "...", "created_at": "...", "balances": { "BTC": "0", ... }, ... }
//! }
//! ```
//!
//! # Consistency
//!
//! Every operation takes the store's mutex, so within one process reads and
//! writes are serialized. Keyed mutations reload the file, change the one
//! account they touch and write the whole map back, which means a concurrent
//! update to another account is never overwritten with stale data.
//!
//! Writes go to a temporary file in the same directory which is then renamed
//! over the target, so a crash mid-write leaves the previous file intact.

use crate::core::traits::CredentialStore;
use crate::types::{Account, AccountMap, LedgerError};
use parking_lot::Mutex;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileStore {
    /// Open an existing store file
    ///
    /// # Errors
    ///
    /// Returns `StorageUnavailable` if the file does not exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, LedgerError> {
        let path = path.as_ref().to_path_buf();
        if !path.is_file() {
            return Err(LedgerError::storage_unavailable(
                path.display().to_string(),
                "store file does not exist",
            ));
        }
        Ok(Self::at(path))
    }

    /// Open a store file, initialising an empty store if it is absent
    ///
    /// Missing parent directories are created.
    pub fn open_or_create(path: impl AsRef<Path>) -> Result<Self, LedgerError> {
        let store = Self::at(path.as_ref().to_path_buf());
        if !store.path.exists() {
            if let Some(parent) = store.path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent).map_err(|e| store.unavailable(e))?;
            }
            store.write_all(&AccountMap::new())?;
            debug!(path = %store.path.display(), "initialised empty store");
        }
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn at(path: PathBuf) -> Self {
        Self {
            path,
            lock: Mutex::new(()),
        }
    }

    fn unavailable(&self, error: impl ToString) -> LedgerError {
        LedgerError::storage_unavailable(self.path.display().to_string(), error.to_string())
    }

    /// Read and parse the file; caller holds the lock
    fn read_all(&self) -> Result<AccountMap, LedgerError> {
        let contents = fs::read_to_string(&self.path).map_err(|e| self.unavailable(e))?;
        let accounts: AccountMap =
            serde_json::from_str(&contents).map_err(|e| self.unavailable(e))?;
        debug!(path = %self.path.display(), accounts = accounts.len(), "store loaded");
        Ok(accounts)
    }

    /// Atomically replace the file; caller holds the lock
    fn write_all(&self, accounts: &AccountMap) -> Result<(), LedgerError> {
        let json = serde_json::to_string_pretty(accounts).map_err(|e| self.unavailable(e))?;

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(dir).map_err(|e| self.unavailable(e))?;
        tmp.write_all(json.as_bytes())
            .and_then(|_| tmp.flush())
            .map_err(|e| self.unavailable(e))?;
        tmp.persist(&self.path).map_err(|e| self.unavailable(e.error))?;

        debug!(path = %self.path.display(), accounts = accounts.len(), "store written");
        Ok(())
    }
}

impl CredentialStore for JsonFileStore {
    fn load(&self) -> Result<AccountMap, LedgerError> {
        let _guard = self.lock.lock();
        self.read_all()
    }

    fn save(&self, accounts: &AccountMap) -> Result<(), LedgerError> {
        let _guard = self.lock.lock();
        self.write_all(accounts)
    }

    fn get(&self, username: &str) -> Result<Option<Account>, LedgerError> {
        let _guard = self.lock.lock();
        Ok(self.read_all()?.remove(username))
    }

    fn put(&self, username: &str, account: Account) -> Result<(), LedgerError> {
        let _guard = self.lock.lock();
        let mut accounts = self.read_all()?;
        accounts.insert(username.to_string(), account);
        self.write_all(&accounts)
    }

    fn insert_new(&self, username: &str, account: Account) -> Result<(), LedgerError> {
        let _guard = self.lock.lock();
        let mut accounts = self.read_all()?;
        if accounts.contains_key(username) {
            return Err(LedgerError::username_taken(username));
        }
        accounts.insert(username.to_string(), account);
        self.write_all(&accounts)
    }

    fn update<F, T>(&self, username: &str, f: F) -> Result<T, LedgerError>
    where
        F: FnOnce(&mut Account) -> Result<T, LedgerError>,
    {
        let _guard = self.lock.lock();
        let mut accounts = self.read_all()?;
        let account = accounts
            .get_mut(username)
            .ok_or_else(|| LedgerError::account_not_found(username))?;

        let result = f(account)?;
        self.write_all(&accounts)?;
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Coin, Currency, TradeRecord};
    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;
    use std::str::FromStr;
    use std::sync::Arc;
    use std::thread;
    use tempfile::TempDir;

    fn account(usd: &str) -> Account {
        let created = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let mut account = Account::new("hmac-sha256$00$00".to_string(), created);
        account
            .balances
            .insert(Currency::Usd, Decimal::from_str(usd).unwrap());
        account
    }

    fn store_in(dir: &TempDir) -> JsonFileStore {
        JsonFileStore::open_or_create(dir.path().join("accounts.json")).unwrap()
    }

    #[test]
    fn test_open_missing_file_fails() {
        let dir = TempDir::new().unwrap();
        let result = JsonFileStore::open(dir.path().join("absent.json"));
        assert!(matches!(result, Err(LedgerError::StorageUnavailable { .. })));
    }

    #[test]
    fn test_open_or_create_initialises_empty_store() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::open_or_create(dir.path().join("nested/accounts.json")).unwrap();

        assert!(store.path().is_file());
        assert!(store.load().unwrap().is_empty());
        assert!(JsonFileStore::open(store.path()).is_ok());
    }

    #[test]
    fn test_corrupt_file_is_unavailable() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("accounts.json");
        fs::write(&path, "{ not json").unwrap();

        let store = JsonFileStore::open(&path).unwrap();

        assert!(matches!(
            store.load(),
            Err(LedgerError::StorageUnavailable { .. })
        ));
        assert!(matches!(
            store.get("alice"),
            Err(LedgerError::StorageUnavailable { .. })
        ));
    }

    #[test]
    fn test_accounts_round_trip_exactly() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let mut alice = account("12345.6789");
        alice.is_new_account = false;
        alice.transactions.push(TradeRecord {
            coin: Coin::Eth,
            usd_amount: Decimal::from_str("250.00").unwrap(),
            coin_amount: Decimal::from_str("0.99876").unwrap(),
            price_usd: Decimal::from_str("250.31").unwrap(),
            executed_at: Utc.with_ymd_and_hms(2024, 3, 2, 8, 30, 15).unwrap(),
        });

        store.put("alice", alice.clone()).unwrap();

        // A fresh handle reads only what is on disk
        let reopened = JsonFileStore::open(store.path()).unwrap();
        assert_eq!(reopened.get("alice").unwrap(), Some(alice));
    }

    #[test]
    fn test_insert_new_refuses_existing_username() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.insert_new("alice", account("10")).unwrap();

        let result = store.insert_new("alice", account("99"));

        assert!(matches!(result, Err(LedgerError::UsernameTaken { .. })));
        assert_eq!(
            store.get("alice").unwrap().unwrap().balance(Currency::Usd),
            Decimal::from(10)
        );
    }

    #[test]
    fn test_update_only_touches_one_account() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.put("alice", account("10")).unwrap();
        store.put("bob", account("20")).unwrap();

        store
            .update("alice", |acc| {
                acc.balances.insert(Currency::Usd, Decimal::from(11));
                Ok(())
            })
            .unwrap();

        let all = store.load().unwrap();
        assert_eq!(all["alice"].balance(Currency::Usd), Decimal::from(11));
        assert_eq!(all["bob"].balance(Currency::Usd), Decimal::from(20));
    }

    #[test]
    fn test_failed_update_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.put("alice", account("10")).unwrap();
        let before = fs::read_to_string(store.path()).unwrap();

        let result: Result<(), _> = store.update("alice", |acc| {
            acc.balances.clear();
            Err(LedgerError::InvalidCredentials)
        });

        assert_eq!(result, Err(LedgerError::InvalidCredentials));
        assert_eq!(fs::read_to_string(store.path()).unwrap(), before);
    }

    #[test]
    fn test_update_unknown_account_fails() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        let result = store.update("ghost", |_| Ok(()));

        assert!(matches!(result, Err(LedgerError::AccountNotFound { .. })));
    }

    #[test]
    fn test_concurrent_updates_are_not_lost() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(store_in(&dir));
        store.put("alice", account("0")).unwrap();
        store.put("bob", account("0")).unwrap();

        let handles: Vec<_> = (0..4)
            .map(|i| {
                let store = Arc::clone(&store);
                let username = if i % 2 == 0 { "alice" } else { "bob" };
                thread::spawn(move || {
                    for _ in 0..10 {
                        store
                            .update(username, |acc| {
                                let usd = acc.balance(Currency::Usd) + Decimal::ONE;
                                acc.balances.insert(Currency::Usd, usd);
                                Ok(())
                            })
                            .unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let all = store.load().unwrap();
        assert_eq!(all["alice"].balance(Currency::Usd), Decimal::from(20));
        assert_eq!(all["bob"].balance(Currency::Usd), Decimal::from(20));
    }
}
