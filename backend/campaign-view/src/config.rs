// backend/campaign-view/src/config.rs
//
// Runtime configuration. Hosts either build a `ViewConfig` directly or load
// it from the environment (a `.env` file is honoured via dotenvy):
//
//   CROWDFUND_FACTORY_ADDRESS           factory contract (required)
//   CROWDFUND_READ_TIMEOUT_MS           per-field read timeout, default 10000
//   CROWDFUND_CONFIRMATION_TIMEOUT_MS   confirmation wait, default 120000

use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::types::Address;

pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_CONFIRMATION_TIMEOUT: Duration = Duration::from_secs(120);

const FACTORY_VAR: &str = "CROWDFUND_FACTORY_ADDRESS";
const READ_TIMEOUT_VAR: &str = "CROWDFUND_READ_TIMEOUT_MS";
const CONFIRMATION_TIMEOUT_VAR: &str = "CROWDFUND_CONFIRMATION_TIMEOUT_MS";

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ViewConfig {
    /// Factory contract indexing every campaign.
    pub factory: Address,
    /// Upper bound on a single field or list read.
    #[serde(with = "millis", default = "default_read_timeout")]
    pub read_timeout: Duration,
    /// Upper bound on waiting for a transaction to confirm.
    #[serde(with = "millis", default = "default_confirmation_timeout")]
    pub confirmation_timeout: Duration,
}

impl ViewConfig {
    pub fn new(factory: impl Into<Address>) -> Self {
        Self {
            factory: factory.into(),
            read_timeout: DEFAULT_READ_TIMEOUT,
            confirmation_timeout: DEFAULT_CONFIRMATION_TIMEOUT,
        }
    }

    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    pub fn with_confirmation_timeout(mut self, timeout: Duration) -> Self {
        self.confirmation_timeout = timeout;
        self
    }

    /// Load from the process environment, after reading `.env` if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let factory = lookup(FACTORY_VAR)
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::Missing(FACTORY_VAR))?;

        let mut config = Self::new(factory.trim());
        if let Some(raw) = lookup(READ_TIMEOUT_VAR) {
            config.read_timeout = parse_millis(READ_TIMEOUT_VAR, &raw)?;
        }
        if let Some(raw) = lookup(CONFIRMATION_TIMEOUT_VAR) {
            config.confirmation_timeout = parse_millis(CONFIRMATION_TIMEOUT_VAR, &raw)?;
        }
        Ok(config)
    }
}

fn parse_millis(name: &'static str, raw: &str) -> Result<Duration, ConfigError> {
    let ms: u64 = raw.trim().parse().map_err(|e| ConfigError::Invalid {
        name,
        reason: format!("{e}"),
    })?;
    if ms == 0 {
        return Err(ConfigError::Invalid {
            name,
            reason: "must be greater than zero".to_string(),
        });
    }
    Ok(Duration::from_millis(ms))
}

fn default_read_timeout() -> Duration {
    DEFAULT_READ_TIMEOUT
}

fn default_confirmation_timeout() -> Duration {
    DEFAULT_CONFIRMATION_TIMEOUT
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}
