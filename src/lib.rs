//! Rust Trading Ledger Library
//! # Overview
//!
//! This library implements a simulated crypto trading ledger: users sign up,
//! sign in and buy BTC or ETH with a USD balance at the current market price.
//!
//! # Architecture
//!
//! The system is organized into several key components:
//!
//! - [`types`] - Core data types (Account, Session, TradeRecord, etc.)
//! - [`cli`] - CLI arguments parsing
//! - [`config`] - Profiles and TOML configuration
//! - [`core`] - Business logic components:
//!   - [`core::engine`] - Signup, sign-in and purchase orchestration
//!   - [`core::account_ledger`] - Balance operations and account creation
//!   - [`core::trade_validator`] - Price tolerance, funds and minimum checks
//!   - [`core::session_manager`] - Session lifecycle and idle timeout
//! - [`io`] - Durable store, HTTP price feed, session tokens and CSV output
//! - [`service`] - Request-level operations returning user-facing outcomes
//!
//! # Purchases
//!
//! A buy order names the USD to spend and the coin to receive. It executes only
//! if:
//!
//! - **Price**: the live price is within 0.5% of the price the order implies
//! - **Input**: both amounts are non-negative and the coin amount is non-zero
//! - **Funds**: the USD balance covers the order
//! - **Minimum**: at least $1 is spent
//!
//! Every failing rule is reported and a rejected order changes nothing.
//!
//! # Accounts
//!
//! Each account maintains:
//! - `balances`: one per currency (BTC, ETH, USD), never negative
//! - `transactions`: the append-only log of executed buys
//! - `is_new_account`: set until the first dashboard view announces the signup bonus

// Module declarations
pub mod cli;
pub mod config;
pub mod core;
pub mod io;
pub mod service;
pub mod types;

pub use crate::core::{AccountLedger, TradeValidator, TransactionEngine};
pub use io::{HttpPriceOracle, JsonFileStore, SessionCodec};
pub use service::{Outcome, TradingService};
pub use types::{Account, Coin, Currency, LedgerError, Session, TradeRecord};
