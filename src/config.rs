//! Client configuration.
//!
//! Configuration is explicit and validated: there is no built-in signing secret,
//! and a missing one is reported when the configuration is built rather than when
//! the first payment is signed.

use crate::errors::{AgentError, Result};
use crate::token::{Credential, DEFAULT_TOKEN_TTL_SECS};
use std::time::Duration;
use tracing::warn;
use url::Url;

/// Environment variable holding the sending agent id.
pub const ENV_AGENT_ID: &str = "AP2_AGENT_ID";

/// Environment variable holding the shared signing secret.
pub const ENV_JWT_SECRET: &str = "AP2_JWT_SECRET";

/// Environment variable holding the service base URL.
pub const ENV_API_URL: &str = "AP2_STELLAR_URL";

/// Environment variable holding the per-request timeout in seconds.
pub const ENV_REQUEST_TIMEOUT: &str = "AP2_REQUEST_TIMEOUT_SECS";

/// Environment variable holding the token validity window in seconds.
pub const ENV_TOKEN_TTL: &str = "AP2_TOKEN_TTL_SECS";

/// Agent id used when none is configured.
pub const DEFAULT_AGENT_ID: &str = "rust-ai-agent-001";

/// Service URL used when none is configured.
pub const DEFAULT_API_URL: &str = "http://localhost:3000";

/// Per-request timeout used when none is configured.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Secrets shorter than this are accepted but logged.
const MIN_RECOMMENDED_SECRET_LEN: usize = 32;

/// Validated configuration for a [`PaymentClient`](crate::client::PaymentClient).
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Identity and signing secret for bearer tokens
    pub credential: Credential,

    /// Base URL of the AP2 service
    pub api_url: Url,

    /// Per-request timeout
    pub request_timeout: Duration,
}

impl AgentConfig {
    /// Creates a configuration with the default timeout and token window.
    ///
    /// # Examples
    ///
    /// ```
    /// use ap2_agent::config::AgentConfig;
    ///
    /// let config = AgentConfig::new("agent-001", "0123456789abcdef0123456789abcdef", "http://localhost:3000")
    ///     .unwrap();
    /// assert_eq!(config.credential.agent_id, "agent-001");
    ///
    /// assert!(AgentConfig::new("agent-001", "", "http://localhost:3000").is_err());
    /// ```
    pub fn new(
        agent_id: impl Into<String>,
        jwt_secret: impl AsRef<str>,
        api_url: impl AsRef<str>,
    ) -> Result<Self> {
        let agent_id = agent_id.into();
        if agent_id.trim().is_empty() {
            return Err(AgentError::Config("agent id must not be empty".to_string()));
        }

        let secret = jwt_secret.as_ref();
        if secret.is_empty() {
            return Err(AgentError::Config(format!(
                "signing secret is required (set {})",
                ENV_JWT_SECRET
            )));
        }
        if secret.len() < MIN_RECOMMENDED_SECRET_LEN {
            warn!(
                length = secret.len(),
                "signing secret is shorter than {} bytes", MIN_RECOMMENDED_SECRET_LEN
            );
        }

        Ok(Self {
            credential: Credential::new(agent_id, secret),
            api_url: parse_api_url(api_url.as_ref())?,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        })
    }

    /// Sets the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Sets the token validity window in seconds, which must be positive.
    pub fn with_token_ttl(mut self, seconds: i64) -> Result<Self> {
        self.credential = self.credential.with_validity_window(seconds)?;
        Ok(self)
    }

    /// Loads configuration from the process environment and any `.env` file.
    ///
    /// `AP2_JWT_SECRET` is required; everything else has a default.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through `lookup`, which maps a variable name to its value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let agent_id = lookup(ENV_AGENT_ID).unwrap_or_else(|| DEFAULT_AGENT_ID.to_string());
        let secret = lookup(ENV_JWT_SECRET).ok_or_else(|| {
            AgentError::Config(format!("signing secret is required (set {})", ENV_JWT_SECRET))
        })?;
        let api_url = lookup(ENV_API_URL).unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let mut config = Self::new(agent_id, secret, api_url)?;

        if let Some(raw) = lookup(ENV_REQUEST_TIMEOUT) {
            config = config.with_timeout(Duration::from_secs(parse_positive(
                ENV_REQUEST_TIMEOUT,
                &raw,
            )?));
        }

        let ttl = match lookup(ENV_TOKEN_TTL) {
            Some(raw) => parse_positive(ENV_TOKEN_TTL, &raw)?,
            None => DEFAULT_TOKEN_TTL_SECS as u64,
        };
        let ttl = i64::try_from(ttl)
            .map_err(|_| AgentError::Config(format!("{} is out of range", ENV_TOKEN_TTL)))?;

        config.with_token_ttl(ttl)
    }
}

fn parse_api_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw)?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(AgentError::Config(format!(
            "API URL must be http or https, got '{}'",
            other
        ))),
    }
}

fn parse_positive(name: &str, raw: &str) -> Result<u64> {
    match raw.trim().parse::<u64>() {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(AgentError::Config(format!(
            "{} must be a positive integer, got '{}'",
            name, raw
        ))),
    }
}
