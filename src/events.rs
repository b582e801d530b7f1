//! Progress reporting.
//!
//! The facade never prints. Every stage of a quote, evaluation, payment or status
//! lookup is emitted as a [`ProgressEvent`] to a [`ProgressObserver`]; rendering is
//! left to the caller. [`TracingObserver`] is the default and writes structured
//! `tracing` records.

use crate::policy::Decision;
use crate::types::{PaymentFailure, PaymentResult, Quote, Settlement};
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Facade operation a transport failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// `GET /api/v1/quote`
    Quote,
    /// `POST /api/v1/ap2/payment`
    Payment,
    /// `GET /api/v1/ap2/payment/{intent_id}`
    Status,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Quote => "quote",
            Operation::Payment => "payment",
            Operation::Status => "status",
        };
        f.write_str(name)
    }
}

/// A typed progress notification emitted by the facade.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    /// A quote is about to be requested
    QuoteRequested {
        /// Asset being priced
        source_currency: String,
        /// Asset to convert into
        destination_currency: String,
        /// Requested source amount
        amount: String,
    },

    /// The service priced the quote
    QuoteReceived(Quote),

    /// The service refused to price the quote
    QuoteFailed {
        /// Service error message
        message: String,
    },

    /// A payment request is being evaluated
    EvaluationStarted {
        /// Requested amount
        amount: String,
        /// Asset being paid
        currency: String,
        /// Asset the recipient receives
        destination_currency: String,
    },

    /// Evaluation finished
    EvaluationCompleted(Decision),

    /// A payment intent is about to be submitted
    PaymentSubmitted {
        /// Freshly generated intent id
        intent_id: Uuid,
        /// Amount being paid
        amount: String,
        /// Asset being paid
        currency: String,
    },

    /// The service settled the intent
    PaymentCompleted {
        /// Intent that settled
        intent_id: Uuid,
        /// Settlement confirmation
        settlement: Settlement,
    },

    /// The service did not complete the intent
    PaymentFailed {
        /// Intent that failed
        intent_id: Uuid,
        /// Service-reported failure
        failure: PaymentFailure,
    },

    /// A status lookup is about to be made
    StatusRequested {
        /// Intent being looked up
        intent_id: Uuid,
    },

    /// A status lookup returned
    StatusReceived {
        /// Intent that was looked up
        intent_id: Uuid,
        /// Reported state
        result: PaymentResult,
    },

    /// The service could not be reached or answered with an unreadable body
    RequestFailed {
        /// Operation that failed
        operation: Operation,
        /// Intent involved, when known
        intent_id: Option<Uuid>,
        /// Error description
        message: String,
    },
}

/// Receives progress events from the facade.
pub trait ProgressObserver: Send + Sync {
    /// Called once per event, in emission order.
    fn on_event(&self, event: &ProgressEvent);
}

/// Observer that writes every event as a structured `tracing` record.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl ProgressObserver for TracingObserver {
    fn on_event(&self, event: &ProgressEvent) {
        match event {
            ProgressEvent::QuoteRequested {
                source_currency,
                destination_currency,
                amount,
            } => debug!(%source_currency, %destination_currency, %amount, "requesting quote"),
            ProgressEvent::QuoteReceived(quote) => info!(
                source_currency = %quote.source_currency,
                destination_currency = %quote.destination_currency,
                exchange_rate = %quote.exchange_rate,
                estimated_destination_amount = %quote.estimated_destination_amount,
                estimated_fee = %quote.estimated_fee,
                "quote received"
            ),
            ProgressEvent::QuoteFailed { message } => warn!(%message, "quote refused"),
            ProgressEvent::EvaluationStarted {
                amount,
                currency,
                destination_currency,
            } => debug!(%amount, %currency, %destination_currency, "evaluating payment"),
            ProgressEvent::EvaluationCompleted(decision) => {
                for warning in &decision.warnings {
                    warn!(%warning, "payment evaluation warning");
                }
                info!(
                    approved = decision.approved,
                    reasoning = %decision.reasoning,
                    "payment evaluated"
                );
            }
            ProgressEvent::PaymentSubmitted {
                intent_id,
                amount,
                currency,
            } => debug!(%intent_id, %amount, %currency, "submitting payment"),
            ProgressEvent::PaymentCompleted {
                intent_id,
                settlement,
            } => info!(%intent_id, tx_hash = %settlement.tx_hash, "payment completed"),
            ProgressEvent::PaymentFailed { intent_id, failure } => {
                warn!(%intent_id, status = %failure.status, error = %failure, "payment failed")
            }
            ProgressEvent::StatusRequested { intent_id } => {
                debug!(%intent_id, "checking payment status")
            }
            ProgressEvent::StatusReceived { intent_id, result } => info!(
                %intent_id,
                status = result.status(),
                tx_hash = result.tx_hash().unwrap_or("-"),
                "payment status"
            ),
            ProgressEvent::RequestFailed {
                operation,
                intent_id,
                message,
            } => match intent_id {
                Some(intent_id) => warn!(%operation, %intent_id, %message, "request failed"),
                None => warn!(%operation, %message, "request failed"),
            },
        }
    }
}

/// Observer that keeps every event in memory.
#[derive(Debug, Default)]
pub struct EventLog {
    events: Mutex<Vec<ProgressEvent>>,
}

impl EventLog {
    /// Creates an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the events recorded so far.
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.lock().clone()
    }

    // A panic elsewhere never leaves the vector half-written, so poison is ignored.
    fn lock(&self) -> MutexGuard<'_, Vec<ProgressEvent>> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ProgressObserver for EventLog {
    fn on_event(&self, event: &ProgressEvent) {
        self.lock().push(event.clone());
    }
}
