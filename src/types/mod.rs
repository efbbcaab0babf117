//! Types module
//!
//! Contains core data structures used throughout the application.
//! This module organizes types into logical submodules:
//! - `account`: Persisted account records
//! - `currency`: Balance denominations and tradeable coins
//! - `session`: The signed-in / signed-out session value
//! - `trade`: Trade log entries and price data
//! - `error`: Error types for the ledger

pub mod account;
pub mod currency;
pub mod error;
pub mod session;
pub mod trade;

pub use account::{Account, AccountMap, Username};
pub use currency::{Coin, Currency};
pub use error::{AuthFailure, LedgerError, MESSAGE_SEPARATOR};
pub use session::Session;
pub use trade::{HistoryRange, PricePoint, Prices, TradeRecord};
