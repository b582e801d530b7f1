//! Client-side facade for the AP2 payment API.
//!
//! [`PaymentClient`] turns typed calls into the service's HTTP requests and decodes
//! its answers into typed results. Each call is a single round trip with no retry;
//! the caller decides what to do next.

use crate::config::AgentConfig;
use crate::errors::{AgentError, Result};
use crate::events::{Operation, ProgressEvent, ProgressObserver, TracingObserver};
use crate::policy::{self, Decision, EvaluationPolicy, QuoteProvider};
use crate::token::mint_token;
use crate::types::{
    PaymentDetails, PaymentIntent, PaymentOutcome, PaymentResponse, PaymentResult, Quote,
    QuoteEnvelope, Sender,
};
use crate::utils::parse_positive_amount;
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::debug;
use url::Url;
use uuid::Uuid;

/// Path of the quote endpoint.
pub const QUOTE_PATH: [&str; 3] = ["api", "v1", "quote"];

/// Path of the payment submission endpoint; status lookups append the intent id.
pub const PAYMENT_PATH: [&str; 4] = ["api", "v1", "ap2", "payment"];

/// Typed facade over the AP2 quote, payment and status endpoints.
#[derive(Clone)]
pub struct PaymentClient {
    config: AgentConfig,
    http: Client,
    policy: EvaluationPolicy,
    observer: Arc<dyn ProgressObserver>,
}

impl PaymentClient {
    /// Creates a client whose HTTP requests time out after `config.request_timeout`.
    ///
    /// Progress is reported through [`TracingObserver`] and payments are evaluated
    /// with the default [`EvaluationPolicy`].
    ///
    /// # Examples
    ///
    /// ```
    /// use ap2_agent::client::PaymentClient;
    /// use ap2_agent::config::AgentConfig;
    ///
    /// let config = AgentConfig::new(
    ///     "agent-001",
    ///     "0123456789abcdef0123456789abcdef",
    ///     "http://localhost:3000",
    /// )
    /// .unwrap();
    /// let client = PaymentClient::new(config).unwrap();
    /// assert_eq!(client.config().credential.agent_id, "agent-001");
    /// ```
    pub fn new(config: AgentConfig) -> Result<Self> {
        let http = Client::builder().timeout(config.request_timeout).build()?;
        Ok(Self {
            config,
            http,
            policy: EvaluationPolicy::default(),
            observer: Arc::new(TracingObserver),
        })
    }

    /// Sets the observer receiving progress events.
    pub fn with_observer(mut self, observer: Arc<dyn ProgressObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Sets the evaluation thresholds, rejecting a policy out of range.
    pub fn with_policy(mut self, policy: EvaluationPolicy) -> Result<Self> {
        policy.validate()?;
        self.policy = policy;
        Ok(self)
    }

    /// Sets a custom HTTP client.
    pub fn with_client(mut self, client: Client) -> Self {
        self.http = client;
        self
    }

    /// Returns the configuration this client was built with.
    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Requests a quote for converting `amount` of `source_currency`.
    ///
    /// A service-reported failure becomes [`AgentError::QuoteError`].
    pub async fn get_quote(
        &self,
        source_currency: &str,
        destination_currency: &str,
        amount: &str,
    ) -> Result<Quote> {
        self.emit(ProgressEvent::QuoteRequested {
            source_currency: source_currency.to_string(),
            destination_currency: destination_currency.to_string(),
            amount: amount.to_string(),
        });

        let envelope = match self
            .fetch_quote(source_currency, destination_currency, amount)
            .await
        {
            Ok(envelope) => envelope,
            Err(err) => return self.fail(Operation::Quote, None, err),
        };

        match envelope.into_quote() {
            Ok(quote) => {
                self.emit(ProgressEvent::QuoteReceived(quote.clone()));
                Ok(quote)
            }
            Err(AgentError::QuoteError(message)) => {
                self.emit(ProgressEvent::QuoteFailed {
                    message: message.clone(),
                });
                Err(AgentError::QuoteError(message))
            }
            Err(err) => self.fail(Operation::Quote, None, err),
        }
    }

    /// Submits a new payment intent for `details`.
    ///
    /// Every call generates a new intent id and mints a new token, so calls are not
    /// idempotent. A service-reported failure is returned as
    /// [`PaymentResult::Failed`]; only transport failures are errors.
    pub async fn send_payment(&self, details: &PaymentDetails) -> Result<PaymentOutcome> {
        parse_positive_amount(&details.amount)?;

        let sender = Sender {
            agent_id: self.config.credential.agent_id.clone(),
            authorization_token: mint_token(&self.config.credential)?,
        };
        let intent = PaymentIntent::new(details, sender);
        let intent_id = intent.intent_id;

        self.emit(ProgressEvent::PaymentSubmitted {
            intent_id,
            amount: intent.amount.clone(),
            currency: intent.currency.clone(),
        });

        let result = match self.submit(&intent).await {
            Ok(result) => result,
            Err(err) => return self.fail(Operation::Payment, Some(intent_id), err),
        };

        match &result {
            PaymentResult::Completed(settlement) => self.emit(ProgressEvent::PaymentCompleted {
                intent_id,
                settlement: settlement.clone(),
            }),
            PaymentResult::Failed(failure) => self.emit(ProgressEvent::PaymentFailed {
                intent_id,
                failure: failure.clone(),
            }),
            PaymentResult::Pending { .. } | PaymentResult::NotFound => {}
        }

        Ok(PaymentOutcome { intent_id, result })
    }

    /// Looks up the state of a previously submitted intent.
    ///
    /// An intent the service does not know is [`PaymentResult::NotFound`], not an error.
    pub async fn check_status(&self, intent_id: Uuid) -> Result<PaymentResult> {
        self.emit(ProgressEvent::StatusRequested { intent_id });

        let result = match self.lookup(intent_id).await {
            Ok(result) => result,
            Err(err) => return self.fail(Operation::Status, Some(intent_id), err),
        };

        self.emit(ProgressEvent::StatusReceived {
            intent_id,
            result: result.clone(),
        });
        Ok(result)
    }

    /// Quotes `request` and assesses it against this client's [`EvaluationPolicy`].
    pub async fn evaluate_payment(&self, request: &PaymentDetails) -> Result<Decision> {
        policy::evaluate_payment(self, &self.policy, request, self.observer.as_ref()).await
    }

    async fn fetch_quote(
        &self,
        source_currency: &str,
        destination_currency: &str,
        amount: &str,
    ) -> Result<QuoteEnvelope> {
        let url = self.endpoint(&QUOTE_PATH)?;
        debug!(%url, "GET quote");

        let response = self
            .http
            .get(url)
            .query(&[
                ("source_currency", source_currency),
                ("destination_currency", destination_currency),
                ("source_amount", amount),
            ])
            .send()
            .await?;

        read_json(response).await
    }

    async fn submit(&self, intent: &PaymentIntent) -> Result<PaymentResult> {
        let url = self.endpoint(&PAYMENT_PATH)?;
        debug!(%url, intent_id = %intent.intent_id, "POST payment");

        let response = self.http.post(url).json(intent).send().await?;
        read_json::<PaymentResponse>(response)
            .await?
            .into_submission_result()
    }

    async fn lookup(&self, intent_id: Uuid) -> Result<PaymentResult> {
        let id = intent_id.to_string();
        let mut segments = PAYMENT_PATH.to_vec();
        segments.push(id.as_str());
        let url = self.endpoint(&segments)?;
        debug!(%url, "GET payment status");

        let response = self.http.get(url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(PaymentResult::NotFound);
        }

        read_json::<PaymentResponse>(response)
            .await?
            .into_status_result()
    }

    /// Appends `segments` to the configured base URL, keeping any base path.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.config.api_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                AgentError::Config(format!("API URL cannot be a base: {}", self.config.api_url))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn emit(&self, event: ProgressEvent) {
        self.observer.on_event(&event);
    }

    fn fail<T>(&self, operation: Operation, intent_id: Option<Uuid>, err: AgentError) -> Result<T> {
        if err.is_transport() {
            self.emit(ProgressEvent::RequestFailed {
                operation,
                intent_id,
                message: err.to_string(),
            });
        }
        Err(err)
    }
}

#[async_trait]
impl QuoteProvider for PaymentClient {
    async fn get_quote(
        &self,
        source_currency: &str,
        destination_currency: &str,
        amount: &str,
    ) -> Result<Quote> {
        PaymentClient::get_quote(self, source_currency, destination_currency, amount).await
    }
}

/// Decodes a JSON body, reporting the HTTP status when the body does not match `T`.
async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    let body = response.bytes().await?;
    serde_json::from_slice(&body)
        .map_err(|e| AgentError::MalformedResponse(format!("HTTP {}: {}", status, e)))
}
