//! Signed session tokens
//!
//! A [`Session`] crosses process boundaries as
//! `base64url(json(session)).hex(hmac-sha256(secret, encoded payload))`.
//! Anything that does not verify against the secret is treated as signed out.

use crate::types::{LedgerError, Session};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::debug;

type HmacSha256 = Hmac<Sha256>;

pub struct SessionCodec {
    secret: Vec<u8>,
}

impl SessionCodec {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        Self {
            secret: secret.as_ref().to_vec(),
        }
    }

    pub fn encode(&self, session: &Session) -> Result<String, LedgerError> {
        let json = serde_json::to_vec(session)
            .map_err(|e| LedgerError::session_token(e.to_string()))?;
        let payload = URL_SAFE_NO_PAD.encode(json);
        let signature = hex::encode(self.sign(payload.as_bytes()).finalize().into_bytes());
        Ok(format!("{}.{}", payload, signature))
    }

    /// Decode a token, reporting why it was rejected
    pub fn decode_verified(&self, token: &str) -> Result<Session, LedgerError> {
        let (payload, signature_hex) = token
            .trim()
            .split_once('.')
            .ok_or_else(|| LedgerError::session_token("missing signature"))?;

        let signature = hex::decode(signature_hex)
            .map_err(|e| LedgerError::session_token(format!("bad signature encoding: {}", e)))?;
        self.sign(payload.as_bytes())
            .verify_slice(&signature)
            .map_err(|_| LedgerError::session_token("signature mismatch"))?;

        let json = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|e| LedgerError::session_token(format!("bad payload encoding: {}", e)))?;
        serde_json::from_slice(&json).map_err(|e| LedgerError::session_token(e.to_string()))
    }

    /// Decode a token; missing, malformed and tampered tokens are `SignedOut`
    pub fn decode(&self, token: &str) -> Session {
        if token.trim().is_empty() {
            return Session::SignedOut;
        }
        self.decode_verified(token).unwrap_or_else(|e| {
            debug!(error = %e, "discarding session token");
            Session::SignedOut
        })
    }

    fn sign(&self, payload: &[u8]) -> HmacSha256 {
        let mut mac =
            HmacSha256::new_from_slice(&self.secret).expect("HMAC can take key of any size");
        mac.update(payload);
        mac
    }
}
