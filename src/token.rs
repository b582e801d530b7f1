//! Bearer token minting.
//!
//! Each outbound payment carries a short-lived HS256 JWT asserting the sending
//! agent's identity and its fixed permission set. Tokens are minted per call and
//! never cached, since their expiry is tied to the moment of issue.

use crate::errors::{AgentError, Result};
use crate::utils::current_timestamp;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default token validity window in seconds (one hour).
pub const DEFAULT_TOKEN_TTL_SECS: i64 = 3600;

/// Permission to send payments.
pub const PERMISSION_SEND: &str = "payment:send";

/// Permission to receive payments.
pub const PERMISSION_RECEIVE: &str = "payment:receive";

/// Identity and shared secret used to sign bearer tokens.
#[derive(Clone)]
pub struct Credential {
    /// Identifier of the sending agent
    pub agent_id: String,

    /// Shared HMAC secret
    signing_secret: Vec<u8>,

    /// Seconds between `iat` and `exp`, always positive
    validity_window_seconds: i64,
}

impl Credential {
    /// Creates a credential with the default one-hour validity window.
    ///
    /// # Examples
    ///
    /// ```
    /// use ap2_agent::token::Credential;
    ///
    /// let credential = Credential::new("agent-001", "shared-secret");
    /// assert_eq!(credential.validity_window_seconds(), 3600);
    /// ```
    pub fn new(agent_id: impl Into<String>, signing_secret: impl AsRef<[u8]>) -> Self {
        Self {
            agent_id: agent_id.into(),
            signing_secret: signing_secret.as_ref().to_vec(),
            validity_window_seconds: DEFAULT_TOKEN_TTL_SECS,
        }
    }

    /// Sets the validity window, which must be positive.
    pub fn with_validity_window(mut self, seconds: i64) -> Result<Self> {
        if seconds <= 0 {
            return Err(AgentError::Config(format!(
                "token validity window must be positive, got {}",
                seconds
            )));
        }
        self.validity_window_seconds = seconds;
        Ok(self)
    }

    /// Seconds between a token's `iat` and `exp`.
    pub fn validity_window_seconds(&self) -> i64 {
        self.validity_window_seconds
    }

    pub(crate) fn signing_secret(&self) -> &[u8] {
        &self.signing_secret
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("agent_id", &self.agent_id)
            .field("signing_secret", &"<redacted>")
            .field("validity_window_seconds", &self.validity_window_seconds)
            .finish()
    }
}

/// Claim set carried inside the bearer token.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Identifier of the sending agent
    pub agent_id: String,

    /// Always `["payment:send", "payment:receive"]`
    pub permissions: Vec<String>,

    /// Issued-at (Unix seconds)
    pub iat: i64,

    /// Expiry (Unix seconds), `iat + validity window`
    pub exp: i64,
}

impl Claims {
    /// Builds the claim set for `credential` issued at `issued_at`.
    pub fn issue(credential: &Credential, issued_at: i64) -> Self {
        Self {
            agent_id: credential.agent_id.clone(),
            permissions: vec![PERMISSION_SEND.to_string(), PERMISSION_RECEIVE.to_string()],
            iat: issued_at,
            exp: issued_at + credential.validity_window_seconds,
        }
    }
}

/// Mints a bearer token for `credential`, issued now.
pub fn mint_token(credential: &Credential) -> Result<String> {
    mint_token_at(credential, current_timestamp())
}

/// Mints a bearer token for `credential` with an explicit issue time.
///
/// # Examples
///
/// ```
/// use ap2_agent::token::{mint_token_at, Credential};
///
/// let token = mint_token_at(&Credential::new("agent-001", "secret"), 1_700_000_000).unwrap();
/// assert_eq!(token.split('.').count(), 3);
/// ```
pub fn mint_token_at(credential: &Credential, issued_at: i64) -> Result<String> {
    let claims = Claims::issue(credential, issued_at);
    let key = EncodingKey::from_secret(credential.signing_secret());
    Ok(encode(&Header::new(Algorithm::HS256), &claims, &key)?)
}
