//! Transaction engine
//!
//! This module provides the TransactionEngine that orchestrates signup,
//! sign-in and purchases by coordinating the credential store, the session
//! manager, the account ledger, the trade validator and the price oracle.
//!
//! The engine enforces business rules such as:
//! - Signup input checks, all reported together
//! - Indistinguishable failures for unknown users and wrong passwords
//! - A live, non-expired session for the dashboard and for purchases
//! - Price tolerance, funds and minimum-size checks before any balance moves
//! - Fallback prices when the market-data source fails or times out

use crate::core::account_ledger::AccountLedger;
use crate::core::clock::Clock;
use crate::core::password;
use crate::core::session_manager::SessionManager;
use crate::core::trade_validator::{TradeProposal, TradeValidator};
use crate::core::traits::{CredentialStore, PriceOracle};
use crate::types::{
    Account, AuthFailure, Coin, Currency, HistoryRange, LedgerError, PricePoint, Prices, Session,
    TradeRecord, Username,
};
use rand::Rng;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Longest username accepted at signup, in characters
pub const MAX_USERNAME_LEN: usize = 30;

/// Shortest password accepted at signup, in characters
pub const MIN_PASSWORD_LEN: usize = 4;

/// Timing parameters for the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineSettings {
    /// Idle time after which a session is treated as expired
    pub idle_timeout: Duration,
    /// Longest wait for the market-data source before falling back
    pub price_fetch_timeout: Duration,
}

/// What a signed-in user sees on the dashboard
#[derive(Debug, Clone, PartialEq)]
pub struct Dashboard {
    pub username: Username,
    pub balances: BTreeMap<Currency, Decimal>,
    pub transactions: Vec<TradeRecord>,
    /// Set exactly once per account: the bonus to announce on the first view
    pub signup_bonus: Option<Decimal>,
}

/// Transaction processing engine
///
/// Generic over the account store and the price source so the same engine
/// runs against the JSON file store in production and in-memory stores and
/// stub oracles in tests.
pub struct TransactionEngine<S, P> {
    store: S,
    oracle: P,
    sessions: SessionManager,
    clock: Arc<dyn Clock>,
    price_fetch_timeout: Duration,
}

impl<S, P> TransactionEngine<S, P>
where
    S: CredentialStore,
    P: PriceOracle,
{
    pub fn new(store: S, oracle: P, settings: EngineSettings, clock: Arc<dyn Clock>) -> Self {
        // Durations beyond chrono's range are clamped to "never expires"
        let idle_timeout = chrono::Duration::from_std(settings.idle_timeout)
            .unwrap_or(chrono::Duration::MAX);

        TransactionEngine {
            store,
            oracle,
            sessions: SessionManager::new(idle_timeout, Arc::clone(&clock)),
            clock,
            price_fetch_timeout: settings.price_fetch_timeout,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Create an account
    ///
    /// Every failing check is reported in one `ValidationFailed`. The new
    /// user is not signed in.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Any username, password or agreement check fails
    /// - The store cannot be read or written
    pub fn sign_up(
        &self,
        username: &str,
        password: &str,
        agreement_accepted: bool,
    ) -> Result<(), LedgerError> {
        let taken = self.store.get(username)?.is_some();
        let messages = signup_violations(username, password, agreement_accepted, taken);
        if !messages.is_empty() {
            return Err(LedgerError::validation_failed(messages));
        }

        let account =
            AccountLedger::create_account(password, self.clock.now(), &mut rand::thread_rng());
        let bonus = account.signup_bonus;

        // Another request may have claimed the name since the check above
        self.store
            .insert_new(username, account)
            .map_err(|e| match e {
                LedgerError::UsernameTaken { .. } => {
                    LedgerError::validation_failed(vec![e.to_string()])
                }
                other => other,
            })?;

        info!(%username, %bonus, "account created");
        Ok(())
    }

    /// Verify credentials and start a session
    ///
    /// # Errors
    ///
    /// Returns `InvalidCredentials` for an unknown username and for a wrong
    /// password alike.
    pub fn sign_in(
        &self,
        session: &mut Session,
        username: &str,
        password: &str,
    ) -> Result<(), LedgerError> {
        let account = self.store.get(username)?;
        let stored_hash = account
            .as_ref()
            .map_or(password::UNKNOWN_ACCOUNT_HASH, |a| a.password_hash.as_str());
        let verified = password::verify_password(password, stored_hash) && account.is_some();

        if !verified {
            warn!(%username, "sign-in rejected");
            return Err(LedgerError::InvalidCredentials);
        }

        self.sessions.sign_in(session, username);
        info!(%username, "signed in");
        Ok(())
    }

    /// End the session unconditionally
    pub fn sign_out(&self, session: &mut Session) {
        if let Some(username) = session.username() {
            info!(%username, "signed out");
        }
        self.sessions.sign_out(session);
    }

    /// Show the signed-in user's account
    ///
    /// The first view after signup consumes the new-account flag, persists
    /// the change and carries the signup bonus in the result.
    pub fn view_dashboard(&self, session: &mut Session) -> Result<Dashboard, LedgerError> {
        let username = self.sessions.require_signed_in(session)?;

        let existing = match self.store.get(&username)? {
            Some(account) => account,
            None => return Err(self.drop_unknown_account(session)),
        };

        let (account, signup_bonus) = if existing.is_new_account {
            self.store.update(&username, |account| {
                let bonus = AccountLedger::consume_welcome_bonus(account);
                Ok((account.clone(), bonus))
            })?
        } else {
            (existing, None)
        };

        if let Some(bonus) = signup_bonus {
            info!(%username, %bonus, "signup bonus announced");
        }

        Ok(Dashboard {
            username,
            balances: account.balances,
            transactions: account.transactions,
            signup_bonus,
        })
    }

    /// Buy `coin_amount` of `coin` for `usd_amount` USD
    ///
    /// Validation runs inside the store's per-account update, against the
    /// freshest balance. A rejected order changes nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The session is missing or expired
    /// - Any trade rule fails (all failures are reported together)
    /// - The store cannot be read or written
    pub async fn buy(
        &self,
        session: &mut Session,
        coin: Coin,
        usd_amount: Decimal,
        coin_amount: Decimal,
    ) -> Result<TradeRecord, LedgerError> {
        let username = self.sessions.require_signed_in(session)?;

        let price = self.current_prices().await.for_coin(coin);
        let now = self.clock.now();

        let outcome = self.store.update(&username, |account: &mut Account| {
            let proposal = TradeProposal {
                coin,
                usd_amount,
                coin_amount,
                current_price_usd: price,
                user_usd_balance: account.balance(Currency::Usd),
            };
            let messages = TradeValidator::violation_messages(&proposal);
            if !messages.is_empty() {
                return Err(LedgerError::validation_failed(messages));
            }

            AccountLedger::execute_buy(account, coin, usd_amount, coin_amount, price, now)
        });

        match outcome {
            Ok(record) => {
                info!(
                    %username,
                    %coin,
                    usd_amount = %record.usd_amount,
                    coin_amount = %record.coin_amount,
                    price = %record.price_usd,
                    "purchase executed"
                );
                Ok(record)
            }
            Err(LedgerError::AccountNotFound { .. }) => Err(self.drop_unknown_account(session)),
            Err(e) => {
                info!(%username, %coin, reason = %e, "purchase rejected");
                Err(e)
            }
        }
    }

    /// Current prices, never failing
    ///
    /// A failed or timed-out fetch resolves to synthetic fallback prices.
    pub async fn current_prices(&self) -> Prices {
        let fetched = tokio::time::timeout(self.price_fetch_timeout, self.oracle.current_prices()).await;

        match fetched {
            Ok(Ok(prices)) => prices,
            Ok(Err(e)) => {
                warn!(error = %e, "price fetch failed, using fallback prices");
                fallback_prices(&mut rand::thread_rng())
            }
            Err(_) => {
                warn!(
                    timeout_ms = self.price_fetch_timeout.as_millis() as u64,
                    "price fetch timed out, using fallback prices"
                );
                fallback_prices(&mut rand::thread_rng())
            }
        }
    }

    /// Daily closes for charting
    ///
    /// Unlike purchases, history has no fallback; failures are returned.
    pub async fn price_history(
        &self,
        coin: Coin,
        range: HistoryRange,
    ) -> Result<Vec<PricePoint>, LedgerError> {
        tokio::time::timeout(
            self.price_fetch_timeout,
            self.oracle.historical_prices(coin, range),
        )
        .await
        .map_err(|_| LedgerError::price_fetch("history request timed out"))?
    }

    fn drop_unknown_account(&self, session: &mut Session) -> LedgerError {
        warn!(
            username = session.username().unwrap_or_default(),
            "session refers to a missing account"
        );
        self.sessions.sign_out(session);
        LedgerError::not_authenticated(AuthFailure::UnknownAccount)
    }
}

/// Synthetic prices used when the market-data source is unavailable
///
/// BTC is a whole amount in [5000, 8000], ETH in [200, 300].
pub fn fallback_prices<R: Rng>(rng: &mut R) -> Prices {
    Prices {
        btc: Decimal::from(rng.gen_range(5_000u32..=8_000)),
        eth: Decimal::from(rng.gen_range(200u32..=300)),
    }
}

/// Messages for every signup rule the input breaks
fn signup_violations(
    username: &str,
    password: &str,
    agreement_accepted: bool,
    username_taken: bool,
) -> Vec<String> {
    let mut messages = Vec::new();

    if username.is_empty() {
        messages.push("Username must not be empty.");
    }
    if username.chars().any(char::is_whitespace) {
        messages.push("Username must not contain spaces.");
    }
    if username.chars().count() > MAX_USERNAME_LEN {
        messages.push("Username must be 30 characters or fewer.");
    }
    if username_taken {
        messages.push("Username is already taken.");
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        messages.push("Password must be at least 4 characters.");
    }
    if !password.is_empty() && password.trim().is_empty() {
        messages.push("Password must not be blank.");
    }
    if !agreement_accepted {
        messages.push("You must accept the user agreement.");
    }

    messages.into_iter().map(String::from).collect()
}
