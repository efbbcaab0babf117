//! Session state threaded through every authenticated operation
//!
//! A `Session` is a plain value owned by the caller (the CLI keeps it in a
//! signed token between invocations). `core::session_manager` is the only
//! place that transitions it.

use super::account::Username;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Session {
    /// No identity attached
    #[default]
    SignedOut,

    /// Signed in since the last sign-in, refreshed on every authenticated request
    SignedIn {
        username: Username,
        last_activity_at: DateTime<Utc>,
    },
}

impl Session {
    pub fn is_signed_in(&self) -> bool {
        matches!(self, Session::SignedIn { .. })
    }

    /// The signed-in username, if any
    ///
    /// This says nothing about expiry; use
    /// `SessionManager::require_signed_in` to gate an operation.
    pub fn username(&self) -> Option<&str> {
        match self {
            Session::SignedIn { username, .. } => Some(username),
            Session::SignedOut => None,
        }
    }
}
