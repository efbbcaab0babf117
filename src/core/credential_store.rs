//! Thread-safe in-memory credential store
//!
//! `InMemoryCredentialStore` keeps accounts in a `DashMap`, so every keyed
//! operation holds a lock on just the one entry it touches. Concurrent updates
//! to different accounts proceed in parallel; updates to the same account are
//! serialized and none are lost.

use crate::core::traits::CredentialStore;
use crate::types::{Account, AccountMap, LedgerError};
use dashmap::DashMap;
use tracing::debug;

#[derive(Debug, Default)]
pub struct InMemoryCredentialStore {
    accounts: DashMap<String, Account>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self {
            accounts: DashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

impl CredentialStore for InMemoryCredentialStore {
    fn load(&self) -> Result<AccountMap, LedgerError> {
        Ok(self
            .accounts
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect())
    }

    fn save(&self, accounts: &AccountMap) -> Result<(), LedgerError> {
        self.accounts.clear();
        for (username, account) in accounts {
            self.accounts.insert(username.clone(), account.clone());
        }
        Ok(())
    }

    fn get(&self, username: &str) -> Result<Option<Account>, LedgerError> {
        Ok(self.accounts.get(username).map(|entry| entry.value().clone()))
    }

    fn put(&self, username: &str, account: Account) -> Result<(), LedgerError> {
        self.accounts.insert(username.to_string(), account);
        Ok(())
    }

    fn insert_new(&self, username: &str, account: Account) -> Result<(), LedgerError> {
        let mut inserted = false;
        self.accounts
            .entry(username.to_string())
            .or_insert_with(|| {
                inserted = true;
                account
            });

        if !inserted {
            return Err(LedgerError::username_taken(username));
        }
        debug!(%username, "account inserted");
        Ok(())
    }

    fn update<F, T>(&self, username: &str, f: F) -> Result<T, LedgerError>
    where
        F: FnOnce(&mut Account) -> Result<T, LedgerError>,
    {
        let mut entry = self
            .accounts
            .get_mut(username)
            .ok_or_else(|| LedgerError::account_not_found(username))?;

        // Work on a copy so a failing closure leaves the entry untouched
        let mut working = entry.value().clone();
        let result = f(&mut working)?;
        *entry.value_mut() = working;
        Ok(result)
    }
}
