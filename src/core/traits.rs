//! Core traits for account storage and market data
//!
//! These are the two seams between the transaction engine and the outside
//! world. Both a durable and an in-memory store implement
//! [`CredentialStore`]; the HTTP feed and test stubs implement [`PriceOracle`].

use crate::types::{Account, AccountMap, Coin, HistoryRange, LedgerError, PricePoint, Prices};
use async_trait::async_trait;

/// Storage of every account, keyed by username
///
/// Whole-store `load`/`save` exist for inspection and bulk import. Request
/// handling goes through the keyed operations, which only touch one account
/// and so cannot lose a concurrent update to another.
pub trait CredentialStore: Send + Sync {
    /// Read every account
    fn load(&self) -> Result<AccountMap, LedgerError>;

    /// Replace every account
    fn save(&self, accounts: &AccountMap) -> Result<(), LedgerError>;

    /// Look up one account; `Ok(None)` if the username is unknown
    fn get(&self, username: &str) -> Result<Option<Account>, LedgerError>;

    /// Insert or overwrite one account
    fn put(&self, username: &str, account: Account) -> Result<(), LedgerError>;

    /// Insert an account only if the username is free
    ///
    /// Fails with `UsernameTaken` otherwise, leaving the existing account alone.
    fn insert_new(&self, username: &str, account: Account) -> Result<(), LedgerError>;

    /// Read-modify-write one account
    ///
    /// The closure sees the latest committed state of the account. If it
    /// returns an error nothing is written and the error is passed through.
    fn update<F, T>(&self, username: &str, f: F) -> Result<T, LedgerError>
    where
        F: FnOnce(&mut Account) -> Result<T, LedgerError>;
}

/// Source of market prices
#[async_trait]
pub trait PriceOracle: Send + Sync {
    /// Current USD price of every tradeable coin
    async fn current_prices(&self) -> Result<Prices, LedgerError>;

    /// Daily closes for one coin, oldest first
    async fn historical_prices(
        &self,
        coin: Coin,
        range: HistoryRange,
    ) -> Result<Vec<PricePoint>, LedgerError>;
}
