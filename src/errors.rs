//! Error types for the ap2-agent-rs library.
//!
//! This module defines the error taxonomy for every facade operation. Service-level
//! payment failures and unknown intents are returned as values (see
//! [`PaymentResult`](crate::types::PaymentResult)); only failures that leave no result
//! to return surface as [`AgentError`].

use thiserror::Error;

/// Main error type for AP2 client operations.
#[derive(Error, Debug)]
pub enum AgentError {
    /// The service could not be reached (connection refused, timeout, TLS, ...)
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The service answered, but not with a body matching the expected schema
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// The service reported that it could not price the requested quote
    #[error("Quote error: {0}")]
    QuoteError(String),

    /// The service reported that a payment was not completed
    #[error("Payment failed: {message}")]
    PaymentFailed {
        /// Service error code, when one was supplied
        code: Option<String>,
        /// Service error message
        message: String,
    },

    /// Error while minting the bearer token
    #[error("Token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    /// Missing or invalid configuration value
    #[error("Configuration error: {0}")]
    Config(String),

    /// Amount that is not a positive decimal
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Error during JSON serialization/deserialization
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Error parsing or extending the API URL
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),
}

impl AgentError {
    /// Returns true for failures of the transport itself rather than of the service.
    ///
    /// A body that cannot be decoded counts as a transport failure: there is no
    /// service answer to act on.
    pub fn is_transport(&self) -> bool {
        matches!(self, AgentError::Transport(_) | AgentError::MalformedResponse(_))
    }
}

/// Result type alias for AP2 client operations.
pub type Result<T> = std::result::Result<T, AgentError>;
