//! Account-related types for the trading ledger
//!
//! This module defines the persisted Account record and the map type the
//! credential store reads and writes.

use super::currency::Currency;
use super::trade::TradeRecord;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Account identifier
///
/// Case-sensitive and immutable once the account is created.
pub type Username = String;

/// Every account in the store, keyed by username
///
/// A BTreeMap keeps the persisted file in a stable order.
pub type AccountMap = BTreeMap<Username, Account>;

/// A user's account record
///
/// Holds the credential, the signup bookkeeping and one balance per
/// [`Currency`]. Balances are kept at full decimal precision; rounding to two
/// places is left to the display layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    /// Salted one-way hash of the password (see `core::password`)
    pub password_hash: String,

    /// When the account was created
    pub created_at: DateTime<Utc>,

    /// True until the first dashboard view after signup
    ///
    /// The dashboard consumes this flag to announce the signup bonus once.
    pub is_new_account: bool,

    /// USD credited at signup, announced on the first dashboard view
    #[serde(default)]
    pub signup_bonus: Decimal,

    /// Balance per currency, never negative
    pub balances: BTreeMap<Currency, Decimal>,

    /// Append-only log of executed trades
    #[serde(default)]
    pub transactions: Vec<TradeRecord>,
}

impl Account {
    /// Create an account with zero balances in every currency
    ///
    /// Signup funding is applied by `AccountLedger::create_account`.
    pub fn new(password_hash: String, created_at: DateTime<Utc>) -> Self {
        let balances = Currency::ALL
            .iter()
            .map(|currency| (*currency, Decimal::ZERO))
            .collect();

        Account {
            password_hash,
            created_at,
            is_new_account: true,
            signup_bonus: Decimal::ZERO,
            balances,
            transactions: Vec::new(),
        }
    }

    /// Current balance for a currency (zero if the entry is missing)
    pub fn balance(&self, currency: Currency) -> Decimal {
        self.balances
            .get(&currency)
            .copied()
            .unwrap_or(Decimal::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_account_has_zero_balances() {
        let account = Account::new("hash".to_string(), Utc::now());

        assert!(account.is_new_account);
        assert_eq!(account.balances.len(), 3);
        for currency in Currency::ALL {
            assert_eq!(account.balance(currency), Decimal::ZERO);
        }
        assert!(account.transactions.is_empty());
    }

    #[test]
    fn test_record_without_signup_bonus_still_loads() {
        let json = r#"{
            "password_hash": "hash",
            "created_at": "2024-06-01T12:00:00Z",
            "is_new_account": false,
            "balances": {}
        }"#;

        let account: Account = serde_json::from_str(json).unwrap();

        assert_eq!(account.signup_bonus, Decimal::ZERO);
        assert!(account.transactions.is_empty());
    }

    #[test]
    fn test_balance_defaults_to_zero_when_missing() {
        let mut account = Account::new("hash".to_string(), Utc::now());
        account.balances.remove(&Currency::Eth);

        assert_eq!(account.balance(Currency::Eth), Decimal::ZERO);
    }

    #[test]
    fn test_account_json_round_trip_preserves_precision() {
        let mut account = Account::new("hmac-sha256$00$11".to_string(), Utc::now());
        account
            .balances
            .insert(Currency::Btc, Decimal::new(123456789, 8));

        let json = serde_json::to_string(&account).unwrap();
        let parsed: Account = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed, account);
        assert_eq!(parsed.balance(Currency::Btc), Decimal::new(123456789, 8));
    }
}
