//! Example AP2 payment agent.
//!
//! This example shows an agent deciding whether to pay, paying, tracking the
//! payment, and then comparing quotes for several currency pairs.
//!
//! Run with:
//! ```bash
//! cargo run --example mock_service      # in another terminal, or point at a real service
//! AP2_JWT_SECRET=... cargo run --example payment_agent
//! ```
//!
//! Environment variables:
//! - AP2_JWT_SECRET: Shared signing secret (required)
//! - AP2_AGENT_ID: Sending agent id
//! - AP2_STELLAR_URL: Base URL of the AP2 service
//! - AP2_REQUEST_TIMEOUT_SECS: Per-request timeout

use ap2_agent::{
    AgentConfig, PaymentClient, PaymentDetails, PaymentResult, ProgressEvent, ProgressObserver,
};
use std::sync::Arc;
use std::time::Duration;

/// Renders progress events as console lines.
struct ConsoleReporter;

impl ProgressObserver for ConsoleReporter {
    fn on_event(&self, event: &ProgressEvent) {
        match event {
            ProgressEvent::QuoteRequested {
                source_currency,
                destination_currency,
                amount,
            } => println!(
                "\n🔍 Getting quote: {} {} → {}",
                amount, source_currency, destination_currency
            ),
            ProgressEvent::QuoteReceived(quote) => {
                println!("✅ Quote received:");
                println!(
                    "   Rate: 1 {} = {} {}",
                    quote.source_currency, quote.exchange_rate, quote.destination_currency
                );
                println!(
                    "   You'll receive: {} {}",
                    quote.estimated_destination_amount, quote.destination_currency
                );
                println!("   Estimated fee: {} XLM", quote.estimated_fee);
            }
            ProgressEvent::QuoteFailed { message } => println!("❌ Quote error: {}", message),
            ProgressEvent::EvaluationStarted { .. } => {
                println!("\n🤖 AI Agent evaluating payment request...")
            }
            ProgressEvent::EvaluationCompleted(decision) => {
                println!("\n💭 AI Analysis:");
                println!(
                    "   Expected to receive: {} {}",
                    decision.quote.estimated_destination_amount, decision.quote.destination_currency
                );
                println!("   Network fee: {} XLM", decision.quote.estimated_fee);
                for warning in &decision.warnings {
                    println!("   ⚠️  Warning: {}", warning);
                }
                if decision.approved {
                    println!("   ✅ Payment approved by AI agent");
                } else {
                    println!("   ⛔ Payment declined by AI agent");
                }
            }
            ProgressEvent::PaymentSubmitted {
                intent_id,
                amount,
                currency,
            } => println!("\n💸 Sending payment: {} {} (intent {})", amount, currency, intent_id),
            ProgressEvent::PaymentCompleted { settlement, .. } => {
                println!("✅ Payment successful!");
                println!("   TX Hash: {}", settlement.tx_hash);
                if let Some(sent) = &settlement.sent {
                    println!("   Sent: {}", sent);
                }
                if let Some(received) = &settlement.received {
                    println!("   Received: {}", received);
                }
                if let Some(fee) = &settlement.network_fee {
                    println!("   Network Fee: {} XLM", fee);
                }
                if let Some(seconds) = settlement.settlement_seconds {
                    println!("   Settlement Time: {}s", seconds);
                }
            }
            ProgressEvent::PaymentFailed { intent_id, failure } => {
                println!("❌ Payment failed: {} (intent {})", failure, intent_id)
            }
            ProgressEvent::StatusRequested { intent_id } => {
                println!("\n🔍 Checking payment status for intent: {}", intent_id)
            }
            ProgressEvent::StatusReceived { result, .. } => match result {
                PaymentResult::NotFound => println!("   Payment not found"),
                other => {
                    println!("   Status: {}", other.status());
                    if let Some(tx_hash) = other.tx_hash() {
                        println!("   TX Hash: {}", tx_hash);
                    }
                }
            },
            ProgressEvent::RequestFailed {
                operation,
                intent_id,
                message,
            } => match intent_id {
                Some(intent_id) => {
                    println!("❌ {} error: {} (intent {})", operation, message, intent_id)
                }
                None => println!("❌ {} error: {}", operation, message),
            },
        }
    }
}

fn rule(c: char) -> String {
    std::iter::repeat(c).take(60).collect()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    println!("{}", rule('═'));
    println!("🤖 AI Agent Payment Integration Demo (Rust)");
    println!("{}", rule('═'));

    let config = AgentConfig::from_env()?;
    println!("   Agent: {}", config.credential.agent_id);
    println!("   API:   {}", config.api_url);

    let client = PaymentClient::new(config)?.with_observer(Arc::new(ConsoleReporter));

    // Scenario 1: evaluate, pay, track
    println!("\n📋 Scenario 1: AI Agent Making a Payment Decision");
    println!("{}", rule('─'));

    let request = PaymentDetails::new(
        "15.00",
        "XLM",
        "rust-merchant-agent",
        "stellar:GDPSW6ONJR7QJEQXB2V4TBRTSJ4ALSSMCMI6GVAN2XMNVKDGV7HE4K63",
    )
    .with_destination_currency("USDC")
    .with_metadata("purpose", "AI model training credits")
    .with_metadata("service", "Inference API usage");

    let decision = client.evaluate_payment(&request).await?;

    if decision.approved {
        let outcome = client.send_payment(&request).await?;

        if outcome.is_success() {
            println!("\n🎉 AI Agent successfully completed payment!");

            tokio::time::sleep(Duration::from_secs(2)).await;
            client.check_status(outcome.intent_id).await?;
        }
    }

    // Scenario 2: batch quote analysis
    println!("\n\n📋 Scenario 2: AI Agent Analyzing Multiple Currency Pairs");
    println!("{}", rule('─'));

    let pairs = [("XLM", "USDC", "50"), ("USDC", "XLM", "25")];
    for (from, to, amount) in pairs {
        // Failures are already reported by the console observer
        let _ = client.get_quote(from, to, amount).await;
    }

    println!("\n{}", rule('═'));
    println!("✅ AI Agent Integration Demo Complete!");
    println!("{}\n", rule('═'));

    Ok(())
}
