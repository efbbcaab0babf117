//! Error types for the trading ledger
//!
//! This module defines every error that can occur while serving an account,
//! session or trade operation.
//!
//! # Error Categories
//!
//! - **Validation Errors**: Rejected signups and purchases, bad numeric input
//! - **Authentication Errors**: Missing or expired sessions, bad credentials
//! - **Ledger Errors**: Insufficient funds, invalid amounts, overflow
//! - **Infrastructure Errors**: Unavailable storage, price fetch failures, configuration
//!
//! Validation and authentication errors are recovered by the service layer and
//! shown to the user. Storage and configuration errors abort the request.

use super::currency::Currency;
use rust_decimal::Decimal;
use thiserror::Error;

/// Separator used when several messages are reported together
pub const MESSAGE_SEPARATOR: &str = "\n";

/// Why an operation requiring a session was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailure {
    /// No identity in the session
    SignedOut,
    /// The session sat idle past the configured timeout
    Expired,
    /// The session names an account that no longer exists
    UnknownAccount,
}

impl AuthFailure {
    /// Message shown when the user is sent back to sign in
    pub fn message(&self) -> &'static str {
        match self {
            AuthFailure::Expired => "Your session has expired. Please sign in again.",
            AuthFailure::SignedOut | AuthFailure::UnknownAccount => {
                "You must be signed in to do that."
            }
        }
    }
}

/// Main error type for the trading ledger
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LedgerError {
    /// One or more user-input checks failed
    ///
    /// All failing checks are collected; the request made no change.
    #[error("{}", messages.join(MESSAGE_SEPARATOR))]
    ValidationFailed {
        /// Human-readable reasons, in check order
        messages: Vec<String>,
    },

    /// The operation needs a live session
    #[error("{}", reason.message())]
    NotAuthenticated {
        /// What the session manager observed
        reason: AuthFailure,
    },

    /// Unknown username or wrong password
    ///
    /// Unknown users and wrong passwords share this one message.
    #[error("Invalid credentials.")]
    InvalidCredentials,

    /// A debit larger than the current balance
    #[error("Insufficient {currency} balance: available {available}, requested {requested}")]
    InsufficientFunds {
        currency: Currency,
        available: Decimal,
        requested: Decimal,
    },

    /// A negative amount reached the ledger
    #[error("Invalid amount '{amount}' for {operation}")]
    InvalidAmount {
        amount: Decimal,
        operation: String,
    },

    /// A submitted value did not parse as a finite decimal number
    #[error("Invalid number for {field}: '{value}'")]
    InvalidNumericInput {
        field: String,
        value: String,
    },

    /// A coin symbol outside the tradeable set
    #[error("Unknown coin '{coin}'")]
    UnknownCoin { coin: String },

    /// A history range name that is not recognised
    #[error("Unknown history range '{range}'")]
    UnknownHistoryRange { range: String },

    /// Signup for a username that already exists
    #[error("Username is already taken.")]
    UsernameTaken { username: String },

    /// Update of an account that is not in the store
    #[error("Account '{username}' not found")]
    AccountNotFound { username: String },

    /// A balance would overflow the decimal range
    #[error("Arithmetic overflow in {operation} for {currency}")]
    ArithmeticOverflow {
        operation: String,
        currency: Currency,
    },

    /// The market-data source failed or timed out
    ///
    /// During a purchase this is recovered with fallback prices.
    #[error("Price fetch failed: {message}")]
    PriceFetchError { message: String },

    /// The account store is missing, unreadable or corrupt
    ///
    /// Fatal to the request; there is no retry.
    #[error("Account store unavailable at {path}: {message}")]
    StorageUnavailable { path: String, message: String },

    /// A session token could not be written or read
    #[error("Session token error: {message}")]
    SessionToken { message: String },

    /// Invalid or unreadable configuration
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl LedgerError {
    /// Create a ValidationFailed error from collected messages
    pub fn validation_failed(messages: Vec<String>) -> Self {
        LedgerError::ValidationFailed { messages }
    }

    /// Create a NotAuthenticated error
    pub fn not_authenticated(reason: AuthFailure) -> Self {
        LedgerError::NotAuthenticated { reason }
    }

    /// Create an InsufficientFunds error
    pub fn insufficient_funds(currency: Currency, available: Decimal, requested: Decimal) -> Self {
        LedgerError::InsufficientFunds {
            currency,
            available,
            requested,
        }
    }

    /// Create an InvalidAmount error
    pub fn invalid_amount(amount: Decimal, operation: &str) -> Self {
        LedgerError::InvalidAmount {
            amount,
            operation: operation.to_string(),
        }
    }

    /// Create an InvalidNumericInput error
    pub fn invalid_numeric_input(field: &str, value: &str) -> Self {
        LedgerError::InvalidNumericInput {
            field: field.to_string(),
            value: value.to_string(),
        }
    }

    pub fn unknown_coin(coin: &str) -> Self {
        LedgerError::UnknownCoin {
            coin: coin.to_string(),
        }
    }

    pub fn unknown_history_range(range: &str) -> Self {
        LedgerError::UnknownHistoryRange {
            range: range.to_string(),
        }
    }

    pub fn username_taken(username: &str) -> Self {
        LedgerError::UsernameTaken {
            username: username.to_string(),
        }
    }

    pub fn account_not_found(username: &str) -> Self {
        LedgerError::AccountNotFound {
            username: username.to_string(),
        }
    }

    /// Create an ArithmeticOverflow error
    pub fn arithmetic_overflow(operation: &str, currency: Currency) -> Self {
        LedgerError::ArithmeticOverflow {
            operation: operation.to_string(),
            currency,
        }
    }

    pub fn price_fetch(message: impl Into<String>) -> Self {
        LedgerError::PriceFetchError {
            message: message.into(),
        }
    }

    /// Create a StorageUnavailable error
    pub fn storage_unavailable(path: impl Into<String>, message: impl Into<String>) -> Self {
        LedgerError::StorageUnavailable {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn session_token(message: impl Into<String>) -> Self {
        LedgerError::SessionToken {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        LedgerError::Config {
            message: message.into(),
        }
    }

    /// Human-readable messages for this error
    ///
    /// A validation failure yields each collected reason; every other error
    /// yields its display string.
    pub fn messages(&self) -> Vec<String> {
        match self {
            LedgerError::ValidationFailed { messages } => messages.clone(),
            other => vec![other.to_string()],
        }
    }

    /// All messages joined with a line break
    pub fn joined_message(&self) -> String {
        self.messages().join(MESSAGE_SEPARATOR)
    }

    /// Whether the error must abort the request instead of being shown to the user
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            LedgerError::StorageUnavailable { .. }
                | LedgerError::Config { .. }
                | LedgerError::ArithmeticOverflow { .. }
        )
    }
}

// Conversion from reqwest::Error to LedgerError
impl From<reqwest::Error> for LedgerError {
    fn from(error: reqwest::Error) -> Self {
        LedgerError::PriceFetchError {
            message: error.to_string(),
        }
    }
}
