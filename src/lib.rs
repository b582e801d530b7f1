//! # ap2-agent-rs
//!
//! A typed Rust client for agents that pay through the AP2 payment API.
//!
//! The service prices conversions between assets, settles payment intents on the
//! underlying network and reports their status. This crate covers the client side
//! of that exchange: it mints the bearer token the service expects, maps each
//! endpoint onto a typed call and decodes the answers into typed results.
//!
//! ## Features
//!
//! - **Quotes**: `GET /api/v1/quote` decoded into a [`Quote`](types::Quote)
//! - **Payments**: `POST /api/v1/ap2/payment` with a fresh intent id and token per attempt
//! - **Status**: `GET /api/v1/ap2/payment/{intent_id}`, with unknown intents as a value
//! - **Evaluation**: advisory fee and exchange-rate checks before paying
//! - **Progress events**: typed notifications instead of console output
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ap2_agent::client::PaymentClient;
//! use ap2_agent::config::AgentConfig;
//! use ap2_agent::types::PaymentDetails;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = PaymentClient::new(AgentConfig::from_env()?)?;
//!
//! let request = PaymentDetails::new("15.00", "XLM", "merchant-agent", "stellar:GDPSW6...")
//!     .with_destination_currency("USDC")
//!     .with_metadata("purpose", "model training credits");
//!
//! let decision = client.evaluate_payment(&request).await?;
//! if decision.approved {
//!     let outcome = client.send_payment(&request).await?;
//!     if outcome.is_success() {
//!         let status = client.check_status(outcome.intent_id).await?;
//!         println!("status: {}", status.status());
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Flow
//!
//! 1. **Evaluate**: request a quote and check it against an [`EvaluationPolicy`](policy::EvaluationPolicy)
//! 2. **Pay**: submit a [`PaymentIntent`](types::PaymentIntent) signed with a fresh bearer token
//! 3. **Track**: poll the intent's status by its intent id
//!
//! ## Security
//!
//! - **No default secret**: the signing secret must be configured explicitly
//! - **Short-lived tokens**: every payment carries a newly minted HS256 token
//! - **Fresh intents**: intent ids are UUID v4 and never reused

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod client;
pub mod config;
pub mod errors;
pub mod events;
pub mod policy;
pub mod token;
pub mod types;
pub mod utils;

// Re-export commonly used items
pub use client::PaymentClient;
pub use config::AgentConfig;
pub use errors::{AgentError, Result};
pub use events::{EventLog, ProgressEvent, ProgressObserver, TracingObserver};
pub use policy::{Decision, EvaluationPolicy, QuoteProvider, Warning};
pub use token::{mint_token, Credential};
pub use types::{
    PaymentDetails, PaymentFailure, PaymentIntent, PaymentOutcome, PaymentResult, Quote,
    Settlement,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_accessibility() {
        let config = AgentConfig::new(
            "agent",
            "0123456789abcdef0123456789abcdef",
            "http://localhost:3000",
        )
        .unwrap();
        let _ = PaymentClient::new(config).unwrap();
        let _ = EvaluationPolicy::default();
        let _ = PaymentDetails::new("1", "XLM", "merchant", "stellar:GABC");
    }
}
