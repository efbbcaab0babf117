//! Core business logic module
//!
//! This module contains the ledger's processing components:
//! - `traits` - Seams for account storage and market data
//! - `engine` - Signup, sign-in and purchase orchestration
//! - `account_ledger` - Balance operations and account creation
//! - `trade_validator` - Buy-order admission rules
//! - `session_manager` - Session lifecycle and idle timeout
//! - `credential_store` - In-memory account store
//! - `password` - Salted password hashing
//! - `clock` - Injectable time source

pub mod account_ledger;
pub mod clock;
pub mod credential_store;
pub mod engine;
pub mod password;
pub mod session_manager;
pub mod trade_validator;
pub mod traits;

pub use account_ledger::AccountLedger;
pub use clock::{Clock, ManualClock, SystemClock};
pub use credential_store::InMemoryCredentialStore;
pub use engine::{Dashboard, EngineSettings, TransactionEngine};
pub use session_manager::SessionManager;
pub use trade_validator::{TradeProposal, TradeValidator, TradeViolation};
pub use traits::{CredentialStore, PriceOracle};
