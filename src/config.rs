//! Runtime configuration
//!
//! Settings come from three layers, later ones winning:
//!
//! 1. Defaults of the selected [`Profile`]
//! 2. An optional TOML file
//! 3. The `LEDGER_SESSION_SECRET` environment variable (secret only)
//!
//! ```toml
//! store_path = "data/accounts.json"
//! idle_timeout_secs = 1800
//! price_fetch_timeout_ms = 10000
//! price_api_base_url = "https://min-api.cryptocompare.com"
//! session_secret = "change-me"
//! ```

use crate::core::EngineSettings;
use crate::types::LedgerError;
use clap::ValueEnum;
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable that overrides `session_secret`
pub const SESSION_SECRET_ENV: &str = "LEDGER_SESSION_SECRET";

pub const DEFAULT_PRICE_API_BASE_URL: &str = "https://min-api.cryptocompare.com";

/// Deployment profile selecting default timeouts and paths
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Profile {
    /// Short timeouts for automated checks
    Test,
    #[default]
    Production,
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Profile::Test => write!(f, "test"),
            Profile::Production => write!(f, "production"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub profile: Profile,
    pub store_path: PathBuf,
    pub idle_timeout_secs: u64,
    pub price_fetch_timeout_ms: u64,
    pub price_api_base_url: String,
    pub session_secret: String,
}

/// The TOML file's shape; every key is optional
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigFile {
    store_path: Option<PathBuf>,
    idle_timeout_secs: Option<u64>,
    price_fetch_timeout_ms: Option<u64>,
    price_api_base_url: Option<String>,
    session_secret: Option<String>,
}

impl AppConfig {
    /// Defaults for a profile
    ///
    /// The production profile has no session secret; one must be supplied by
    /// the config file or the environment.
    pub fn for_profile(profile: Profile) -> Self {
        match profile {
            Profile::Test => AppConfig {
                profile,
                store_path: PathBuf::from("ledger-accounts.test.json"),
                idle_timeout_secs: 2,
                price_fetch_timeout_ms: 500,
                price_api_base_url: DEFAULT_PRICE_API_BASE_URL.to_string(),
                session_secret: "test-session-secret".to_string(),
            },
            Profile::Production => AppConfig {
                profile,
                store_path: PathBuf::from("ledger-accounts.json"),
                idle_timeout_secs: 1800,
                price_fetch_timeout_ms: 10_000,
                price_api_base_url: DEFAULT_PRICE_API_BASE_URL.to_string(),
                session_secret: String::new(),
            },
        }
    }

    /// Resolve the full configuration for a run
    ///
    /// # Arguments
    ///
    /// * `profile` - Profile supplying the defaults
    /// * `path` - Optional TOML file layered over the defaults
    ///
    /// # Errors
    ///
    /// Returns `Config` if the file cannot be read or parsed, or if the
    /// resulting settings are invalid.
    pub fn load(profile: Profile, path: Option<&Path>) -> Result<Self, LedgerError> {
        let mut config = Self::for_profile(profile);

        if let Some(path) = path {
            let content = std::fs::read_to_string(path).map_err(|e| {
                LedgerError::config(format!("cannot read {}: {}", path.display(), e))
            })?;
            config = config.merge_toml(&content)?;
            tracing::debug!(path = %path.display(), "config file loaded");
        }

        config = config.with_secret_override(std::env::var(SESSION_SECRET_ENV).ok());
        config.validate()?;
        Ok(config)
    }

    /// Layer a TOML document over these settings
    pub fn merge_toml(mut self, content: &str) -> Result<Self, LedgerError> {
        let file: ConfigFile =
            toml::from_str(content).map_err(|e| LedgerError::config(e.to_string()))?;

        if let Some(store_path) = file.store_path {
            self.store_path = store_path;
        }
        if let Some(secs) = file.idle_timeout_secs {
            self.idle_timeout_secs = secs;
        }
        if let Some(ms) = file.price_fetch_timeout_ms {
            self.price_fetch_timeout_ms = ms;
        }
        if let Some(url) = file.price_api_base_url {
            self.price_api_base_url = url;
        }
        if let Some(secret) = file.session_secret {
            self.session_secret = secret;
        }
        Ok(self)
    }

    /// Replace the secret when an override is present and non-empty
    pub fn with_secret_override(mut self, secret: Option<String>) -> Self {
        if let Some(secret) = secret.filter(|s| !s.is_empty()) {
            self.session_secret = secret;
        }
        self
    }

    pub fn validate(&self) -> Result<(), LedgerError> {
        if self.idle_timeout_secs == 0 {
            return Err(LedgerError::config("idle_timeout_secs must be greater than zero"));
        }
        if self.price_fetch_timeout_ms == 0 {
            return Err(LedgerError::config(
                "price_fetch_timeout_ms must be greater than zero",
            ));
        }
        if self.session_secret.trim().is_empty() {
            return Err(LedgerError::config(format!(
                "session_secret must be set (config file or {})",
                SESSION_SECRET_ENV
            )));
        }
        if self.price_api_base_url.trim().is_empty() {
            return Err(LedgerError::config("price_api_base_url must not be empty"));
        }
        Ok(())
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    pub fn price_fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.price_fetch_timeout_ms)
    }

    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            idle_timeout: self.idle_timeout(),
            price_fetch_timeout: self.price_fetch_timeout(),
        }
    }
}
