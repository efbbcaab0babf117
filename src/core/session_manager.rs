//! Session lifecycle and idle-timeout enforcement
//!
//! `SessionManager` owns no sessions. Every operation takes the caller's
//! [`Session`] by mutable reference and transitions it in place:
//!
//! ```text
//! SignedOut --sign_in--> SignedIn(username, last_activity_at)
//! SignedIn  --sign_out / expiry observed--> SignedOut
//! SignedIn  --touch / require_signed_in--> SignedIn(last_activity_at = now)
//! ```
//!
//! Expiry is lazy: an idle session stays `SignedIn` until the next call to
//! [`SessionManager::require_signed_in`] notices it.

use crate::core::clock::Clock;
use crate::types::{AuthFailure, LedgerError, Session, Username};
use chrono::Duration;
use std::sync::Arc;
use tracing::{debug, warn};

pub struct SessionManager {
    idle_timeout: Duration,
    clock: Arc<dyn Clock>,
}

impl SessionManager {
    pub fn new(idle_timeout: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            idle_timeout,
            clock,
        }
    }

    /// Start a session for `username`, replacing whatever was there
    pub fn sign_in(&self, session: &mut Session, username: &str) {
        *session = Session::SignedIn {
            username: username.to_string(),
            last_activity_at: self.clock.now(),
        };
    }

    /// End the session; signing out twice is fine
    pub fn sign_out(&self, session: &mut Session) {
        *session = Session::SignedOut;
    }

    /// Refresh the activity timestamp of a signed-in session
    pub fn touch(&self, session: &mut Session) -> Result<(), LedgerError> {
        match session {
            Session::SignedIn {
                last_activity_at, ..
            } => {
                *last_activity_at = self.clock.now();
                Ok(())
            }
            Session::SignedOut => Err(LedgerError::not_authenticated(AuthFailure::SignedOut)),
        }
    }

    /// True iff the session is signed in and idle for longer than the timeout
    pub fn is_expired(&self, session: &Session) -> bool {
        match session {
            Session::SignedIn {
                last_activity_at, ..
            } => self.clock.now() - *last_activity_at > self.idle_timeout,
            Session::SignedOut => false,
        }
    }

    /// Gate an authenticated operation
    ///
    /// Signs an expired session out before failing. On success the session is
    /// touched and the signed-in username returned.
    pub fn require_signed_in(&self, session: &mut Session) -> Result<Username, LedgerError> {
        if self.is_expired(session) {
            warn!(
                username = session.username().unwrap_or_default(),
                "session expired after idle timeout"
            );
            self.sign_out(session);
            return Err(LedgerError::not_authenticated(AuthFailure::Expired));
        }

        self.touch(session)?;
        let username = session
            .username()
            .map(str::to_string)
            .ok_or_else(|| LedgerError::not_authenticated(AuthFailure::SignedOut))?;
        debug!(%username, "session refreshed");
        Ok(username)
    }
}
