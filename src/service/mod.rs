//! Request-level operations
//!
//! `TradingService` is what a front end calls. It accepts raw user input,
//! parses it at the boundary and turns every recoverable failure into an
//! [`Outcome`] carrying the messages to show. Only fatal errors (the store
//! is unavailable, configuration is broken) come back as `Err`.

pub mod display;

use crate::core::engine::{Dashboard, TransactionEngine};
use crate::core::traits::{CredentialStore, PriceOracle};
use crate::types::{
    Coin, HistoryRange, LedgerError, PricePoint, Prices, Session, TradeRecord, MESSAGE_SEPARATOR,
};
use display::{format_coin, format_usd};
use rust_decimal::Decimal;
use std::str::FromStr;

/// Result of a user-facing operation
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome<T> {
    pub success: bool,
    pub messages: Vec<String>,
    pub value: Option<T>,
}

impl<T> Outcome<T> {
    pub fn succeeded(value: T, messages: Vec<String>) -> Self {
        Outcome {
            success: true,
            messages,
            value: Some(value),
        }
    }

    pub fn failed(messages: Vec<String>) -> Self {
        Outcome {
            success: false,
            messages,
            value: None,
        }
    }

    /// Every message on its own line
    pub fn message(&self) -> String {
        self.messages.join(MESSAGE_SEPARATOR)
    }
}

/// Dashboard contents plus the one-time signup notice
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardView {
    pub dashboard: Dashboard,
    pub notice: Option<String>,
}

/// Turn an engine result into an outcome, passing fatal errors through
fn recover<T>(
    result: Result<T, LedgerError>,
    on_success: impl FnOnce(&T) -> Vec<String>,
) -> Result<Outcome<T>, LedgerError> {
    match result {
        Ok(value) => {
            let messages = on_success(&value);
            Ok(Outcome::succeeded(value, messages))
        }
        Err(e) if e.is_fatal() => Err(e),
        Err(e) => Ok(Outcome::failed(e.messages())),
    }
}

/// Parse a submitted amount
///
/// # Errors
///
/// Returns `InvalidNumericInput` when `raw` is not a plain decimal number.
pub fn parse_amount(field: &str, raw: &str) -> Result<Decimal, LedgerError> {
    Decimal::from_str(raw.trim()).map_err(|_| LedgerError::invalid_numeric_input(field, raw))
}

pub fn signup_bonus_notice(bonus: Decimal) -> String {
    format!("Your signup bonus of {} has been funded!", format_usd(bonus))
}

pub struct TradingService<S, P> {
    engine: TransactionEngine<S, P>,
}

impl<S, P> TradingService<S, P>
where
    S: CredentialStore,
    P: PriceOracle,
{
    pub fn new(engine: TransactionEngine<S, P>) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &TransactionEngine<S, P> {
        &self.engine
    }

    pub fn create_account(
        &self,
        username: &str,
        password: &str,
        agreement_accepted: bool,
    ) -> Result<Outcome<()>, LedgerError> {
        recover(
            self.engine.sign_up(username, password, agreement_accepted),
            |_| vec!["Account created. Please sign in.".to_string()],
        )
    }

    pub fn authenticate(
        &self,
        session: &mut Session,
        username: &str,
        password: &str,
    ) -> Result<Outcome<()>, LedgerError> {
        recover(self.engine.sign_in(session, username, password), |_| {
            vec![format!("Signed in as {}.", username)]
        })
    }

    pub fn end_session(&self, session: &mut Session) -> Outcome<()> {
        self.engine.sign_out(session);
        Outcome::succeeded((), vec!["Signed out.".to_string()])
    }

    pub fn view_dashboard(
        &self,
        session: &mut Session,
    ) -> Result<Outcome<DashboardView>, LedgerError> {
        let view = self.engine.view_dashboard(session).map(|dashboard| {
            let notice = dashboard.signup_bonus.map(signup_bonus_notice);
            DashboardView { dashboard, notice }
        });
        recover(view, |view| view.notice.iter().cloned().collect())
    }

    /// Buy a coin from raw form input
    ///
    /// Every field is parsed before any domain logic runs; all parse failures
    /// are reported together.
    pub async fn purchase(
        &self,
        session: &mut Session,
        coin: &str,
        usd_amount: &str,
        coin_amount: &str,
    ) -> Result<Outcome<TradeRecord>, LedgerError> {
        let coin_parsed = Coin::from_str(coin);
        let usd_parsed = parse_amount("usd_amount", usd_amount);
        let coin_amount_parsed = parse_amount("coin_amount", coin_amount);

        let (coin, usd_amount, coin_amount) = match (coin_parsed, usd_parsed, coin_amount_parsed) {
            (Ok(coin), Ok(usd), Ok(amount)) => (coin, usd, amount),
            (coin, usd, amount) => {
                let messages = [coin.err(), usd.err(), amount.err()]
                    .into_iter()
                    .flatten()
                    .map(|e| e.to_string())
                    .collect();
                return Ok(Outcome::failed(messages));
            }
        };

        let result = self.engine.buy(session, coin, usd_amount, coin_amount).await;
        recover(result, |record| {
            vec![format!(
                "Bought {} {} for {}.",
                format_coin(record.coin_amount),
                record.coin,
                format_usd(record.usd_amount)
            )]
        })
    }

    pub async fn current_prices(&self) -> Prices {
        self.engine.current_prices().await
    }

    pub async fn price_history(
        &self,
        coin: &str,
        range: HistoryRange,
    ) -> Result<Outcome<Vec<PricePoint>>, LedgerError> {
        let coin = match Coin::from_str(coin) {
            Ok(coin) => coin,
            Err(e) => return Ok(Outcome::failed(e.messages())),
        };
        recover(self.engine.price_history(coin, range).await, |_| Vec::new())
    }
}
