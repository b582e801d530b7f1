//! Payment evaluation.
//!
//! Before paying, an agent asks for a quote and checks it against two advisory
//! thresholds: the network fee and the share of the requested amount the recipient
//! is expected to receive. Both only annotate the decision. A request that trips
//! them is still approved.

use crate::errors::{AgentError, Result};
use crate::events::{ProgressEvent, ProgressObserver};
use crate::types::{PaymentDetails, Quote};
use crate::utils::{parse_decimal, parse_positive_amount};
use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::fmt;

/// Reasoning attached to every approval.
pub const APPROVAL_REASONING: &str = "Payment within acceptable parameters";

/// Source of exchange-rate quotes.
///
/// Implemented by [`PaymentClient`](crate::client::PaymentClient) over HTTP; tests and
/// alternative backends can supply their own.
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    /// Prices `amount` of `source_currency` in `destination_currency`.
    async fn get_quote(
        &self,
        source_currency: &str,
        destination_currency: &str,
        amount: &str,
    ) -> Result<Quote>;
}

/// Advisory finding raised while evaluating a quote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// The estimated network fee exceeds the policy maximum
    HighNetworkFee {
        /// Estimated fee from the quote
        fee: Decimal,
    },

    /// The recipient would receive less than the policy share of the requested amount
    UnfavorableExchangeRate {
        /// Amount the recipient is expected to receive
        expected_receive: Decimal,
        /// Largest tolerated loss, in percent
        max_loss_percent: Decimal,
    },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::HighNetworkFee { .. } => write!(f, "high network fee"),
            Warning::UnfavorableExchangeRate {
                max_loss_percent, ..
            } => write!(
                f,
                "unfavorable exchange rate (>{}% loss)",
                max_loss_percent.normalize()
            ),
        }
    }
}

/// Outcome of evaluating a payment request.
#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    /// Whether the agent should proceed
    pub approved: bool,

    /// Quote the decision was based on
    pub quote: Quote,

    /// Advisory warnings, fee check first
    pub warnings: Vec<Warning>,

    /// Human-readable explanation
    pub reasoning: String,
}

impl Decision {
    /// Warning texts in order.
    pub fn warning_messages(&self) -> Vec<String> {
        self.warnings.iter().map(ToString::to_string).collect()
    }
}

/// Thresholds applied to a quote.
///
/// # Examples
///
/// ```
/// use ap2_agent::policy::EvaluationPolicy;
/// use rust_decimal_macros::dec;
///
/// let policy = EvaluationPolicy::default();
/// assert_eq!(policy.max_network_fee, dec!(1.0));
/// assert_eq!(policy.min_receive_ratio, dec!(0.95));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvaluationPolicy {
    /// Fees strictly above this raise [`Warning::HighNetworkFee`]
    pub max_network_fee: Decimal,

    /// Receiving strictly less than `amount * ratio` raises
    /// [`Warning::UnfavorableExchangeRate`]
    pub min_receive_ratio: Decimal,
}

impl Default for EvaluationPolicy {
    fn default() -> Self {
        Self {
            max_network_fee: dec!(1.0),
            min_receive_ratio: dec!(0.95),
        }
    }
}

impl EvaluationPolicy {
    /// Creates a policy, rejecting thresholds outside their ranges.
    ///
    /// `max_network_fee` must not be negative and `min_receive_ratio` must lie in
    /// `(0, 1]`.
    ///
    /// # Examples
    ///
    /// ```
    /// use ap2_agent::policy::EvaluationPolicy;
    /// use rust_decimal_macros::dec;
    ///
    /// assert!(EvaluationPolicy::new(dec!(0.5), dec!(0.9)).is_ok());
    /// assert!(EvaluationPolicy::new(dec!(0.5), dec!(1.5)).is_err());
    /// ```
    pub fn new(max_network_fee: Decimal, min_receive_ratio: Decimal) -> Result<Self> {
        let policy = Self {
            max_network_fee,
            min_receive_ratio,
        };
        policy.validate()?;
        Ok(policy)
    }

    /// Checks that both thresholds are within range.
    pub fn validate(&self) -> Result<()> {
        if self.max_network_fee.is_sign_negative() {
            return Err(AgentError::Config(format!(
                "max network fee must not be negative, got {}",
                self.max_network_fee
            )));
        }
        if self.min_receive_ratio <= Decimal::ZERO || self.min_receive_ratio > Decimal::ONE {
            return Err(AgentError::Config(format!(
                "min receive ratio must be in (0, 1], got {}",
                self.min_receive_ratio
            )));
        }
        Ok(())
    }

    /// Checks `quote` for a payment of `requested_amount`.
    ///
    /// Fails if the policy is out of range, the quote's amounts are not decimals, or
    /// the receive threshold overflows.
    pub fn assess(&self, quote: Quote, requested_amount: Decimal) -> Result<Decision> {
        self.validate()?;
        let expected_receive = parse_decimal(&quote.estimated_destination_amount)?;
        let fee = parse_decimal(&quote.estimated_fee)?;
        let min_receive = requested_amount
            .checked_mul(self.min_receive_ratio)
            .ok_or_else(|| {
                AgentError::InvalidAmount(format!(
                    "{} is too large to evaluate",
                    requested_amount
                ))
            })?;

        let mut warnings = Vec::new();
        if fee > self.max_network_fee {
            warnings.push(Warning::HighNetworkFee { fee });
        }
        if expected_receive < min_receive {
            warnings.push(Warning::UnfavorableExchangeRate {
                expected_receive,
                max_loss_percent: (Decimal::ONE - self.min_receive_ratio) * dec!(100),
            });
        }

        Ok(Decision {
            approved: true,
            quote,
            warnings,
            reasoning: APPROVAL_REASONING.to_string(),
        })
    }
}

/// Quotes `request` through `provider` and assesses the quote under `policy`.
///
/// Quote and transport errors are returned unchanged: no decision can be made
/// without a quote.
pub async fn evaluate_payment<P>(
    provider: &P,
    policy: &EvaluationPolicy,
    request: &PaymentDetails,
    observer: &dyn ProgressObserver,
) -> Result<Decision>
where
    P: QuoteProvider + ?Sized,
{
    let requested_amount = parse_positive_amount(&request.amount)?;

    observer.on_event(&ProgressEvent::EvaluationStarted {
        amount: request.amount.clone(),
        currency: request.currency.clone(),
        destination_currency: request.destination_currency().to_string(),
    });

    let quote = provider
        .get_quote(
            &request.currency,
            request.destination_currency(),
            &request.amount,
        )
        .await?;

    let decision = policy.assess(quote, requested_amount)?;
    observer.on_event(&ProgressEvent::EvaluationCompleted(decision.clone()));
    Ok(decision)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AgentError;
    use crate::events::EventLog;

    fn quote(destination_amount: &str, fee: &str) -> Quote {
        Quote {
            source_currency: "XLM".to_string(),
            destination_currency: "USDC".to_string(),
            source_amount: None,
            exchange_rate: "0.9667".to_string(),
            estimated_destination_amount: destination_amount.to_string(),
            estimated_fee: fee.to_string(),
        }
    }

    struct FixedQuote(Quote);

    #[async_trait]
    impl QuoteProvider for FixedQuote {
        async fn get_quote(&self, _: &str, _: &str, _: &str) -> Result<Quote> {
            Ok(self.0.clone())
        }
    }

    struct RefusingQuote;

    #[async_trait]
    impl QuoteProvider for RefusingQuote {
        async fn get_quote(&self, _: &str, _: &str, _: &str) -> Result<Quote> {
            Err(AgentError::QuoteError("no path found".to_string()))
        }
    }

    fn request() -> PaymentDetails {
        PaymentDetails::new("15.00", "XLM", "merchant", "stellar:GABC")
            .with_destination_currency("USDC")
    }

    #[test]
    fn test_within_thresholds() {
        let decision = EvaluationPolicy::default()
            .assess(quote("14.50", "0.30"), dec!(15.00))
            .unwrap();
        assert!(decision.approved);
        assert!(decision.warnings.is_empty());
        assert_eq!(decision.reasoning, APPROVAL_REASONING);
    }

    #[test]
    fn test_unfavorable_rate_still_approved() {
        let decision = EvaluationPolicy::default()
            .assess(quote("13.00", "0.30"), dec!(15.00))
            .unwrap();
        assert!(decision.approved);
        assert_eq!(
            decision.warning_messages(),
            vec!["unfavorable exchange rate (>5% loss)"]
        );
    }

    #[test]
    fn test_high_fee_still_approved() {
        let decision = EvaluationPolicy::default()
            .assess(quote("14.50", "1.01"), dec!(15.00))
            .unwrap();
        assert!(decision.approved);
        assert_eq!(decision.warning_messages(), vec!["high network fee"]);
    }

    #[test]
    fn test_both_warnings_fee_first() {
        let decision = EvaluationPolicy::default()
            .assess(quote("1.00", "2.5"), dec!(15.00))
            .unwrap();
        assert!(decision.approved);
        assert_eq!(
            decision.warning_messages(),
            vec!["high network fee", "unfavorable exchange rate (>5% loss)"]
        );
    }

    #[test]
    fn test_thresholds_are_strict() {
        // 15 * 0.95 = 14.25 and a fee of exactly 1.0 are both acceptable
        let decision = EvaluationPolicy::default()
            .assess(quote("14.25", "1.0"), dec!(15))
            .unwrap();
        assert!(decision.warnings.is_empty());
    }

    #[test]
    fn test_custom_ratio_message() {
        let policy = EvaluationPolicy {
            max_network_fee: dec!(0.5),
            min_receive_ratio: dec!(0.90),
        };
        let decision = policy.assess(quote("10", "0.1"), dec!(15)).unwrap();
        assert_eq!(
            decision.warning_messages(),
            vec!["unfavorable exchange rate (>10% loss)"]
        );
    }

    #[test]
    fn test_non_decimal_quote_rejected() {
        let result = EvaluationPolicy::default().assess(quote("lots", "0.30"), dec!(15));
        assert!(matches!(result, Err(AgentError::InvalidAmount(_))));
    }

    #[test]
    fn test_policy_ranges() {
        assert!(EvaluationPolicy::new(dec!(0), dec!(1)).is_ok());
        assert!(matches!(
            EvaluationPolicy::new(dec!(-0.1), dec!(0.95)),
            Err(AgentError::Config(_))
        ));
        assert!(matches!(
            EvaluationPolicy::new(dec!(1), dec!(0)),
            Err(AgentError::Config(_))
        ));
        assert!(matches!(
            EvaluationPolicy::new(dec!(1), dec!(1.01)),
            Err(AgentError::Config(_))
        ));
    }

    #[test]
    fn test_out_of_range_policy_is_rejected_by_assess() {
        let policy = EvaluationPolicy {
            max_network_fee: dec!(1),
            min_receive_ratio: dec!(2),
        };
        let result = policy.assess(quote("14.50", "0.30"), dec!(15));
        assert!(matches!(result, Err(AgentError::Config(_))));
    }

    #[test]
    fn test_huge_amount_does_not_panic() {
        let inflating = EvaluationPolicy {
            max_network_fee: dec!(1),
            min_receive_ratio: dec!(2),
        };
        let result = std::panic::catch_unwind(|| {
            inflating.assess(quote("14.50", "0.30"), Decimal::MAX)
        });
        assert!(matches!(result, Ok(Err(AgentError::Config(_)))));

        let result = std::panic::catch_unwind(|| {
            EvaluationPolicy::default().assess(quote("14.50", "0.30"), Decimal::MAX)
        });
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_evaluate_payment_rejects_non_positive_amount() {
        let provider = FixedQuote(quote("14.50", "0.30"));
        let log = EventLog::new();

        for amount in ["-5", "0"] {
            let request = PaymentDetails::new(amount, "XLM", "merchant", "stellar:GABC");
            let result =
                evaluate_payment(&provider, &EvaluationPolicy::default(), &request, &log).await;
            assert!(matches!(result, Err(AgentError::InvalidAmount(_))));
        }
        assert!(log.events().is_empty());
    }

    #[tokio::test]
    async fn test_evaluate_payment_emits_events() {
        let provider = FixedQuote(quote("13.00", "0.30"));
        let log = EventLog::new();

        let decision = evaluate_payment(&provider, &EvaluationPolicy::default(), &request(), &log)
            .await
            .unwrap();

        let events = log.events();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], ProgressEvent::EvaluationStarted { .. }));
        assert_eq!(events[1], ProgressEvent::EvaluationCompleted(decision));
    }

    #[tokio::test]
    async fn test_evaluate_payment_propagates_quote_error() {
        let log = EventLog::new();
        let result =
            evaluate_payment(&RefusingQuote, &EvaluationPolicy::default(), &request(), &log).await;

        assert!(matches!(result, Err(AgentError::QuoteError(m)) if m == "no path found"));
        assert!(!log
            .events()
            .iter()
            .any(|e| matches!(e, ProgressEvent::EvaluationCompleted(_))));
    }
}
