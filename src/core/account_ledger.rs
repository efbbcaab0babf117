//! Account ledger module
//!
//! This module provides the `AccountLedger`, the only code that changes an
//! account's balances or its signup flag. It performs no I/O; callers load the
//! account from a credential store, apply ledger operations and write it back.
//!
//! The AccountLedger is responsible for:
//! - Creating new, signup-funded accounts
//! - Crediting and debiting balances without ever going negative
//! - Executing a buy as a single debit/credit pair
//! - The one-shot consumption of the signup bonus notice

use crate::core::password;
use crate::types::{Account, Coin, Currency, LedgerError, TradeRecord};
use chrono::{DateTime, Utc};
use rand::Rng;
use rust_decimal::Decimal;

/// Lowest USD amount a new account is funded with
pub const SIGNUP_BONUS_MIN: u32 = 8_999;

/// Highest USD amount a new account is funded with
pub const SIGNUP_BONUS_MAX: u32 = 19_999;

/// Balance operations over a single in-memory account
pub struct AccountLedger;

impl AccountLedger {
    /// Create a new account for a signup
    ///
    /// The password is hashed with a fresh salt. The USD balance is a
    /// uniformly random whole amount in
    /// [`SIGNUP_BONUS_MIN`, `SIGNUP_BONUS_MAX`]; BTC and ETH start at zero.
    pub fn create_account<R: Rng>(
        password: &str,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> Account {
        let password_hash = password::hash_password(password, rng);
        let mut account = Account::new(password_hash, now);

        let bonus = Decimal::from(rng.gen_range(SIGNUP_BONUS_MIN..=SIGNUP_BONUS_MAX));
        account.balances.insert(Currency::Usd, bonus);
        account.signup_bonus = bonus;

        account
    }

    /// Credit funds to a balance
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The amount is negative
    /// - Adding the amount would overflow
    pub fn credit(
        account: &mut Account,
        currency: Currency,
        amount: Decimal,
    ) -> Result<(), LedgerError> {
        if amount < Decimal::ZERO {
            return Err(LedgerError::invalid_amount(amount, "credit"));
        }

        let new_balance = account
            .balance(currency)
            .checked_add(amount)
            .ok_or_else(|| LedgerError::arithmetic_overflow("credit", currency))?;

        account.balances.insert(currency, new_balance);
        Ok(())
    }

    /// Debit funds from a balance
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The amount is negative
    /// - The amount exceeds the current balance
    pub fn debit(
        account: &mut Account,
        currency: Currency,
        amount: Decimal,
    ) -> Result<(), LedgerError> {
        if amount < Decimal::ZERO {
            return Err(LedgerError::invalid_amount(amount, "debit"));
        }

        let available = account.balance(currency);
        if available < amount {
            return Err(LedgerError::insufficient_funds(currency, available, amount));
        }

        let new_balance = available
            .checked_sub(amount)
            .ok_or_else(|| LedgerError::arithmetic_overflow("debit", currency))?;

        account.balances.insert(currency, new_balance);
        Ok(())
    }

    /// Execute a validated buy: debit USD, credit the coin, log the trade
    ///
    /// Either both balance changes land or neither does.
    pub fn execute_buy(
        account: &mut Account,
        coin: Coin,
        usd_amount: Decimal,
        coin_amount: Decimal,
        price_usd: Decimal,
        executed_at: DateTime<Utc>,
    ) -> Result<TradeRecord, LedgerError> {
        let snapshot = account.balances.clone();

        let applied = Self::debit(account, Currency::Usd, usd_amount)
            .and_then(|_| Self::credit(account, coin.currency(), coin_amount));
        if let Err(e) = applied {
            account.balances = snapshot;
            return Err(e);
        }

        let record = TradeRecord {
            coin,
            usd_amount,
            coin_amount,
            price_usd,
            executed_at,
        };
        account.transactions.push(record.clone());
        Ok(record)
    }

    /// Consume the new-account flag
    ///
    /// Returns the USD granted at signup the first time it is called on an
    /// account, and `None` on every later call.
    pub fn consume_welcome_bonus(account: &mut Account) -> Option<Decimal> {
        if !account.is_new_account {
            return None;
        }
        account.is_new_account = false;
        Some(account.signup_bonus)
    }
}
