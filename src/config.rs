//! Configuration for the gateway and synchronizer
//!
//! Everything the gateway needs is passed in explicitly; nothing is read from
//! process-wide state after construction.

use crate::gateway::PayloadCipher;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required setting {0}")]
    Missing(&'static str),
    #[error("invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Supplies the bearer token for each request
pub trait TokenProvider: Send + Sync {
    fn token(&self) -> Option<String>;
}

/// Fixed token, or none for unauthenticated endpoints
#[derive(Clone, Default)]
pub struct StaticToken(Option<String>);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(Some(token.into()))
    }

    pub fn none() -> Self {
        Self(None)
    }
}

impl TokenProvider for StaticToken {
    fn token(&self) -> Option<String> {
        self.0.clone()
    }
}

/// Remote gateway settings
#[derive(Clone)]
pub struct GatewayConfig {
    /// API root, e.g. `https://api.example.com/v1`
    pub base_url: String,
    pub token_provider: Arc<dyn TokenProvider>,
    /// IANA zone name forwarded in the `timezone` header
    pub timezone: Option<String>,
    pub timeout: Duration,
    pub cipher: Option<Arc<dyn PayloadCipher>>,
}

impl GatewayConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token_provider: Arc::new(StaticToken::none()),
            timezone: None,
            timeout: DEFAULT_TIMEOUT,
            cipher: None,
        }
    }

    #[must_use]
    pub fn with_token_provider(mut self, provider: Arc<dyn TokenProvider>) -> Self {
        self.token_provider = provider;
        self
    }

    #[must_use]
    pub fn with_timezone(mut self, timezone: impl Into<String>) -> Self {
        self.timezone = Some(timezone.into());
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_cipher(mut self, cipher: Arc<dyn PayloadCipher>) -> Self {
        self.cipher = Some(cipher);
        self
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

impl fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("base_url", &self.base_url)
            .field("timezone", &self.timezone)
            .field("timeout", &self.timeout)
            .field("cipher", &self.cipher.is_some())
            .finish_non_exhaustive()
    }
}

/// Settings for the demo shell
#[derive(Debug, Clone)]
pub struct Config {
    pub gateway: GatewayConfig,
    pub page_size: u32,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let base_url = lookup("CONVERSATION_SYNC_BASE_URL")
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::Missing("CONVERSATION_SYNC_BASE_URL"))?;

        let mut gateway = GatewayConfig::new(base_url);

        if let Some(token) = lookup("CONVERSATION_SYNC_TOKEN").filter(|t| !t.is_empty()) {
            gateway = gateway.with_token_provider(Arc::new(StaticToken::new(token)));
        }
        if let Some(tz) = lookup("CONVERSATION_SYNC_TIMEZONE").filter(|t| !t.is_empty()) {
            gateway = gateway.with_timezone(tz);
        }
        if let Some(raw) = lookup("CONVERSATION_SYNC_TIMEOUT_SECS") {
            let secs: u64 = raw.parse().map_err(|_| ConfigError::Invalid {
                name: "CONVERSATION_SYNC_TIMEOUT_SECS",
                value: raw.clone(),
            })?;
            gateway = gateway.with_timeout(Duration::from_secs(secs));
        }

        let page_size = match lookup("CONVERSATION_SYNC_PAGE_SIZE") {
            Some(raw) => match raw.parse::<u32>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(ConfigError::Invalid {
                        name: "CONVERSATION_SYNC_PAGE_SIZE",
                        value: raw,
                    })
                }
            },
            None => DEFAULT_PAGE_SIZE,
        };

        Ok(Self { gateway, page_size })
    }
}
