//! Core type definitions for the AP2 payment API.
//!
//! This module contains the caller-side request types, the wire schemas exchanged
//! with the service, and the typed results the facade hands back. Wire schemas are
//! decoded strictly: a body that does not match its schema is rejected rather than
//! defaulted.

use crate::errors::{AgentError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use uuid::Uuid;

/// Envelope status reported by the quote endpoint on success.
pub const QUOTE_SUCCESS: &str = "success";

/// Payment status reported once an intent has settled.
pub const STATUS_COMPLETED: &str = "completed";

/// Statuses a status lookup may report for an intent that is still in flight.
pub const IN_FLIGHT_STATUSES: [&str; 3] = ["pending", "processing", "submitted"];

/// Price estimate for converting one asset into another.
///
/// Amounts are kept as the decimal strings the service sent.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Quote {
    /// Asset being paid
    pub source_currency: String,

    /// Asset the recipient receives
    pub destination_currency: String,

    /// Echo of the requested amount, when the service includes it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_amount: Option<String>,

    /// Units of destination currency per unit of source currency
    pub exchange_rate: String,

    /// Amount the recipient is expected to receive
    pub estimated_destination_amount: String,

    /// Estimated network fee
    pub estimated_fee: String,
}

/// Error payload attached to a non-success response.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceError {
    /// Machine-readable error code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    /// Human-readable error message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Response body of `GET /api/v1/quote`.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct QuoteEnvelope {
    /// `"success"` or a failure status
    pub status: String,

    /// Quote, present on success
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Quote>,

    /// Error payload, present on failure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ServiceError>,
}

impl QuoteEnvelope {
    /// Converts the envelope into a quote or a [`AgentError::QuoteError`].
    pub fn into_quote(self) -> Result<Quote> {
        if self.status == QUOTE_SUCCESS {
            return self.data.ok_or_else(|| {
                AgentError::MalformedResponse("success envelope without quote data".to_string())
            });
        }

        let message = self
            .error
            .and_then(|e| e.message)
            .unwrap_or_else(|| "Failed to get quote".to_string());
        Err(AgentError::QuoteError(message))
    }
}

/// Caller-side description of a payment to make.
///
/// # Examples
///
/// ```
/// use ap2_agent::types::PaymentDetails;
///
/// let details = PaymentDetails::new("15.00", "XLM", "merchant-agent", "stellar:GABC")
///     .with_destination_currency("USDC")
///     .with_metadata("purpose", "model training credits");
///
/// assert_eq!(details.destination_currency(), "USDC");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentDetails {
    /// Decimal amount in `currency`
    pub amount: String,

    /// Asset being paid
    pub currency: String,

    /// Asset the recipient should receive; defaults to `currency`
    pub destination_currency: Option<String>,

    /// Recipient agent identifier
    pub recipient_agent_id: String,

    /// Recipient payment address (e.g. `stellar:G...`)
    pub recipient_address: String,

    /// Free-form metadata forwarded to the service
    pub metadata: Map<String, Value>,

    /// URL the service calls back once the intent settles
    pub callback_url: Option<String>,
}

impl PaymentDetails {
    /// Creates payment details with no metadata and no callback.
    pub fn new(
        amount: impl Into<String>,
        currency: impl Into<String>,
        recipient_agent_id: impl Into<String>,
        recipient_address: impl Into<String>,
    ) -> Self {
        Self {
            amount: amount.into(),
            currency: currency.into(),
            destination_currency: None,
            recipient_agent_id: recipient_agent_id.into(),
            recipient_address: recipient_address.into(),
            metadata: Map::new(),
            callback_url: None,
        }
    }

    /// Sets the currency the recipient receives.
    pub fn with_destination_currency(mut self, currency: impl Into<String>) -> Self {
        self.destination_currency = Some(currency.into());
        self
    }

    /// Adds a metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Sets the settlement callback URL.
    pub fn with_callback_url(mut self, url: impl Into<String>) -> Self {
        self.callback_url = Some(url.into());
        self
    }

    /// Currency the recipient receives, falling back to the paying currency.
    pub fn destination_currency(&self) -> &str {
        self.destination_currency.as_deref().unwrap_or(&self.currency)
    }
}

/// Recipient block of a payment intent.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Recipient {
    /// Recipient agent identifier
    pub agent_id: String,

    /// Recipient payment address
    pub payment_address: String,

    /// Asset the recipient receives
    pub destination_currency: String,
}

/// Sender block of a payment intent.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Sender {
    /// Sending agent identifier
    pub agent_id: String,

    /// Freshly minted bearer token
    pub authorization_token: String,
}

/// Body of `POST /api/v1/ap2/payment`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PaymentIntent {
    /// Client-generated correlation id, unique per attempt
    pub intent_id: Uuid,

    /// Decimal amount in `currency`
    pub amount: String,

    /// Asset being paid
    pub currency: String,

    /// Who gets paid
    pub recipient: Recipient,

    /// Who pays, with authorization
    pub sender: Sender,

    /// Free-form metadata
    pub metadata: Map<String, Value>,

    /// Optional settlement callback
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callback_url: Option<String>,
}

impl PaymentIntent {
    /// Builds an intent for `details` with a newly generated intent id.
    pub fn new(details: &PaymentDetails, sender: Sender) -> Self {
        Self {
            intent_id: crate::utils::generate_intent_id(),
            amount: details.amount.clone(),
            currency: details.currency.clone(),
            recipient: Recipient {
                agent_id: details.recipient_agent_id.clone(),
                payment_address: details.recipient_address.clone(),
                destination_currency: details.destination_currency().to_string(),
            },
            sender,
            metadata: details.metadata.clone(),
            callback_url: details.callback_url.clone(),
        }
    }
}

/// `transaction_details` block of a payment or status response.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TransactionDetails {
    /// Ledger transaction hash
    pub transaction_hash: String,

    /// Seconds the service took to settle
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settlement_time_seconds: Option<f64>,
}

/// `amount` block of a completed payment response.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct AmountSummary {
    /// Amount debited
    pub sent: String,

    /// Currency debited
    pub currency_sent: String,

    /// Amount credited
    pub received: String,

    /// Currency credited
    pub currency_received: String,
}

/// `fees` block of a completed payment response.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct FeeSummary {
    /// Network fee charged
    pub network_fee: String,
}

/// Response body of the payment submission and status endpoints.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct PaymentResponse {
    /// Intent status (`completed`, `pending`, `rejected`, ...)
    pub status: String,

    /// Settlement details
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_details: Option<TransactionDetails>,

    /// Amounts moved
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<AmountSummary>,

    /// Fees charged
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fees: Option<FeeSummary>,

    /// Error payload for non-completed intents
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ServiceError>,
}

impl PaymentResponse {
    /// Classifies a payment submission response.
    ///
    /// `completed` must carry transaction, amount and fee blocks. Every other status
    /// is a failure.
    pub fn into_submission_result(self) -> Result<PaymentResult> {
        if self.status != STATUS_COMPLETED {
            return Ok(PaymentResult::Failed(self.into_failure()));
        }

        let details = self.transaction_details.ok_or_else(|| missing("transaction_details"))?;
        let amount = self.amount.ok_or_else(|| missing("amount"))?;
        let fees = self.fees.ok_or_else(|| missing("fees"))?;

        Ok(PaymentResult::Completed(Settlement {
            tx_hash: details.transaction_hash,
            sent: Some(Money::new(amount.sent, amount.currency_sent)),
            received: Some(Money::new(amount.received, amount.currency_received)),
            network_fee: Some(fees.network_fee),
            settlement_seconds: details.settlement_time_seconds,
        }))
    }

    /// Classifies a status lookup response.
    ///
    /// `completed` must carry a transaction hash; amount and fee blocks are optional.
    /// In-flight statuses become [`PaymentResult::Pending`].
    pub fn into_status_result(self) -> Result<PaymentResult> {
        if self.status == STATUS_COMPLETED {
            let details = self.transaction_details.ok_or_else(|| missing("transaction_details"))?;
            return Ok(PaymentResult::Completed(Settlement {
                tx_hash: details.transaction_hash,
                sent: self
                    .amount
                    .as_ref()
                    .map(|a| Money::new(a.sent.clone(), a.currency_sent.clone())),
                received: self
                    .amount
                    .map(|a| Money::new(a.received, a.currency_received)),
                network_fee: self.fees.map(|f| f.network_fee),
                settlement_seconds: details.settlement_time_seconds,
            }));
        }

        if IN_FLIGHT_STATUSES.contains(&self.status.as_str()) {
            return Ok(PaymentResult::Pending {
                status: self.status,
                tx_hash: self.transaction_details.map(|d| d.transaction_hash),
            });
        }

        Ok(PaymentResult::Failed(self.into_failure()))
    }

    fn into_failure(self) -> PaymentFailure {
        let error = self.error.unwrap_or_default();
        PaymentFailure {
            status: self.status,
            code: error.code,
            message: error.message,
        }
    }
}

fn missing(block: &str) -> AgentError {
    AgentError::MalformedResponse(format!("completed payment without `{}`", block))
}

/// An amount together with its currency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Money {
    /// Decimal amount as sent by the service
    pub amount: String,

    /// Currency code
    pub currency: String,
}

impl Money {
    /// Creates a new amount/currency pair.
    pub fn new(amount: impl Into<String>, currency: impl Into<String>) -> Self {
        Self {
            amount: amount.into(),
            currency: currency.into(),
        }
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.amount, self.currency)
    }
}

/// Confirmation of a settled payment.
#[derive(Debug, Clone, PartialEq)]
pub struct Settlement {
    /// Ledger transaction hash
    pub tx_hash: String,

    /// Amount debited
    pub sent: Option<Money>,

    /// Amount credited
    pub received: Option<Money>,

    /// Network fee charged
    pub network_fee: Option<String>,

    /// Seconds the service took to settle
    pub settlement_seconds: Option<f64>,
}

/// Service-reported failure of a payment intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentFailure {
    /// Status the service reported
    pub status: String,

    /// Service error code
    pub code: Option<String>,

    /// Service error message
    pub message: Option<String>,
}

impl fmt::Display for PaymentFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(message) => write!(f, "{}", message),
            None => write!(f, "payment {}", self.status),
        }
    }
}

/// Typed result of a payment submission or status lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum PaymentResult {
    /// The intent settled
    Completed(Settlement),

    /// The intent is still in flight (status lookups only)
    Pending {
        /// Status the service reported
        status: String,
        /// Transaction hash, if one was already assigned
        tx_hash: Option<String>,
    },

    /// The service did not complete the intent
    Failed(PaymentFailure),

    /// The service does not know the intent
    NotFound,
}

impl PaymentResult {
    /// Short status label (`completed`, `pending`, `rejected`, `not_found`, ...).
    pub fn status(&self) -> &str {
        match self {
            PaymentResult::Completed(_) => STATUS_COMPLETED,
            PaymentResult::Pending { status, .. } => status.as_str(),
            PaymentResult::Failed(failure) => failure.status.as_str(),
            PaymentResult::NotFound => "not_found",
        }
    }

    /// Transaction hash, when one is known.
    pub fn tx_hash(&self) -> Option<&str> {
        match self {
            PaymentResult::Completed(settlement) => Some(&settlement.tx_hash),
            PaymentResult::Pending { tx_hash, .. } => tx_hash.as_deref(),
            _ => None,
        }
    }
}

/// Result of a payment submission, correlated with the intent that was sent.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentOutcome {
    /// Intent id generated for this attempt
    pub intent_id: Uuid,

    /// What the service reported
    pub result: PaymentResult,
}

impl PaymentOutcome {
    /// Returns true if the payment settled.
    pub fn is_success(&self) -> bool {
        matches!(self.result, PaymentResult::Completed(_))
    }

    /// Returns the settlement, converting anything else into [`AgentError::PaymentFailed`].
    pub fn into_settlement(self) -> Result<Settlement> {
        match self.result {
            PaymentResult::Completed(settlement) => Ok(settlement),
            PaymentResult::Failed(failure) => Err(AgentError::PaymentFailed {
                message: failure.to_string(),
                code: failure.code,
            }),
            PaymentResult::Pending { status, .. } => Err(AgentError::PaymentFailed {
                code: None,
                message: format!("payment {} is still {}", self.intent_id, status),
            }),
            PaymentResult::NotFound => Err(AgentError::PaymentFailed {
                code: None,
                message: format!("payment {} not found", self.intent_id),
            }),
        }
    }
}
