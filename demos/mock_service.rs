//! Stand-in AP2 service using Axum.
//!
//! This example serves the quote, payment and status endpoints from a fixed rate
//! table and an in-memory intent map, so the payment agent example can run without
//! the real service.
//!
//! Run with:
//! ```bash
//! cargo run --example mock_service
//! ```
//!
//! Environment variables:
//! - PORT: Server port (default: 3000)

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use tower_http::trace::TraceLayer;

/// Flat network fee charged on every payment, in XLM.
const NETWORK_FEE: &str = "0.00001";

/// Payments above this are rejected for insufficient funds.
const BALANCE_LIMIT: Decimal = dec!(10000);

#[derive(Clone, Default)]
struct AppState {
    intents: Arc<Mutex<HashMap<String, Value>>>,
}

#[derive(Deserialize)]
struct QuoteParams {
    source_currency: String,
    destination_currency: String,
    source_amount: String,
}

fn rate(source: &str, destination: &str) -> Option<Decimal> {
    match (source, destination) {
        (s, d) if s == d => Some(Decimal::ONE),
        ("XLM", "USDC") => Some(dec!(0.1200)),
        ("USDC", "XLM") => Some(dec!(8.3333)),
        _ => None,
    }
}

fn error_body(code: &str, message: String) -> Value {
    json!({"status": "rejected", "error": {"code": code, "message": message}})
}

async fn quote_handler(Query(params): Query<QuoteParams>) -> impl IntoResponse {
    let amount = match Decimal::from_str(&params.source_amount) {
        Ok(amount) if amount > Decimal::ZERO => amount,
        _ => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "status": "error",
                    "error": {"message": format!("invalid amount '{}'", params.source_amount)}
                })),
            )
        }
    };

    let Some(rate) = rate(&params.source_currency, &params.destination_currency) else {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({
                "status": "error",
                "error": {"message": format!(
                    "no path from {} to {}",
                    params.source_currency, params.destination_currency
                )}
            })),
        );
    };

    (
        StatusCode::OK,
        Json(json!({
            "status": "success",
            "data": {
                "source_currency": params.source_currency,
                "destination_currency": params.destination_currency,
                "source_amount": params.source_amount,
                "exchange_rate": rate.to_string(),
                "estimated_destination_amount": (amount * rate).round_dp(7).to_string(),
                "estimated_fee": NETWORK_FEE,
            }
        })),
    )
}

async fn payment_handler(State(state): State<AppState>, Json(intent): Json<Value>) -> Json<Value> {
    let intent_id = intent["intent_id"].as_str().unwrap_or_default().to_string();
    let currency = intent["currency"].as_str().unwrap_or_default();
    let destination = intent["recipient"]["destination_currency"]
        .as_str()
        .unwrap_or(currency);

    let response = match Decimal::from_str(intent["amount"].as_str().unwrap_or_default()) {
        _ if intent["sender"]["authorization_token"].as_str().is_none() => {
            error_body("UNAUTHORIZED", "missing authorization token".to_string())
        }
        Err(_) => error_body("INVALID_AMOUNT", "amount is not a decimal".to_string()),
        Ok(amount) if amount > BALANCE_LIMIT => {
            error_body("INSUFFICIENT_FUNDS", "insufficient funds".to_string())
        }
        Ok(amount) => match rate(currency, destination) {
            None => error_body(
                "NO_PATH",
                format!("no path from {} to {}", currency, destination),
            ),
            Some(rate) => json!({
                "status": "completed",
                "transaction_details": {
                    "transaction_hash": uuid::Uuid::new_v4().simple().to_string(),
                    "settlement_time_seconds": 5
                },
                "amount": {
                    "sent": amount.to_string(),
                    "currency_sent": currency,
                    "received": (amount * rate).round_dp(7).to_string(),
                    "currency_received": destination
                },
                "fees": {"network_fee": NETWORK_FEE}
            }),
        },
    };

    if let Ok(mut intents) = state.intents.lock() {
        intents.insert(intent_id, response.clone());
    }
    Json(response)
}

async fn status_handler(
    State(state): State<AppState>,
    Path(intent_id): Path<String>,
) -> impl IntoResponse {
    let stored = state
        .intents
        .lock()
        .ok()
        .and_then(|intents| intents.get(&intent_id).cloned());

    match stored {
        Some(body) => (StatusCode::OK, Json(body)),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({"status": "not_found", "error": {"message": "payment not found"}})),
        ),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let port = std::env::var("PORT")
        .unwrap_or_else(|_| "3000".to_string())
        .parse::<u16>()?;

    let app = Router::new()
        .route("/api/v1/quote", get(quote_handler))
        .route("/api/v1/ap2/payment", post(payment_handler))
        .route("/api/v1/ap2/payment/:intent_id", get(status_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(AppState::default());

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    println!("✅ Mock AP2 service listening on http://{}", addr);
    println!("\nTry:");
    println!(
        "  curl 'http://localhost:{}/api/v1/quote?source_currency=XLM&destination_currency=USDC&source_amount=15'",
        port
    );
    println!();

    axum::serve(listener, app).await?;

    Ok(())
}
