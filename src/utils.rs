//! Utility functions for AP2 client operations.
//!
//! This module provides helpers for intent identifiers, decimal amount parsing and
//! timestamps used throughout the library.

use crate::errors::{AgentError, Result};
use rust_decimal::Decimal;
use std::str::FromStr;
use uuid::Uuid;

/// Generates a fresh intent identifier (UUID v4).
///
/// Every payment attempt gets its own identifier; it is the correlation key for
/// later status lookups.
///
/// # Examples
///
/// ```
/// use ap2_agent::utils::generate_intent_id;
///
/// assert_ne!(generate_intent_id(), generate_intent_id());
/// ```
pub fn generate_intent_id() -> Uuid {
    Uuid::new_v4()
}

/// Parses a decimal amount string as sent on the wire (e.g. `"15.00"`).
///
/// # Examples
///
/// ```
/// use ap2_agent::utils::parse_decimal;
/// use rust_decimal_macros::dec;
///
/// assert_eq!(parse_decimal("14.50").unwrap(), dec!(14.50));
/// assert!(parse_decimal("fourteen").is_err());
/// ```
pub fn parse_decimal(s: &str) -> Result<Decimal> {
    Decimal::from_str(s.trim())
        .map_err(|e| AgentError::InvalidAmount(format!("Cannot parse '{}' as decimal: {}", s, e)))
}

/// Parses an amount that must be strictly positive.
///
/// # Examples
///
/// ```
/// use ap2_agent::utils::parse_positive_amount;
///
/// assert!(parse_positive_amount("0.5").is_ok());
/// assert!(parse_positive_amount("0").is_err());
/// assert!(parse_positive_amount("-3").is_err());
/// ```
pub fn parse_positive_amount(s: &str) -> Result<Decimal> {
    let value = parse_decimal(s)?;
    if value <= Decimal::ZERO {
        return Err(AgentError::InvalidAmount(format!(
            "Amount must be positive, got '{}'",
            s
        )));
    }
    Ok(value)
}

/// Gets the current Unix timestamp in seconds.
pub fn current_timestamp() -> i64 {
    chrono::Utc::now().timestamp()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::collections::HashSet;

    #[test]
    fn test_intent_ids_are_unique() {
        let ids: HashSet<Uuid> = (0..10_000).map(|_| generate_intent_id()).collect();
        assert_eq!(ids.len(), 10_000);
    }

    #[test]
    fn test_intent_id_is_v4() {
        assert_eq!(generate_intent_id().get_version_num(), 4);
    }

    #[test]
    fn test_parse_decimal() {
        assert_eq!(parse_decimal("15.00").unwrap(), dec!(15.00));
        assert_eq!(parse_decimal(" 0.30 ").unwrap(), dec!(0.30));
        assert!(matches!(
            parse_decimal("abc"),
            Err(AgentError::InvalidAmount(_))
        ));
        assert!(parse_decimal("").is_err());
    }

    #[test]
    fn test_parse_positive_amount() {
        assert_eq!(parse_positive_amount("25").unwrap(), dec!(25));
        assert!(parse_positive_amount("0.00").is_err());
        assert!(parse_positive_amount("-1").is_err());
    }

    #[test]
    fn test_current_timestamp() {
        let ts = current_timestamp();
        assert!(ts > 1_600_000_000); // After Sept 2020
    }
}
