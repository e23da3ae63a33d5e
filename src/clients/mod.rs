//! HTTP clients for the telecom aggregator and the payment gateway.

pub mod aggregator;
pub mod paystack;

pub use aggregator::AggregatorClient;
pub use paystack::PaystackClient;

use bigdecimal::BigDecimal;
use failsafe::{backoff, failure_policy, Config, StateMachine};
use reqwest::Client;
use serde_json::Value;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_FAILURE_THRESHOLD: u32 = 3;
pub const DEFAULT_RESET_TIMEOUT_SECS: u64 = 60;

pub(crate) type Breaker =
    StateMachine<failure_policy::ConsecutiveFailures<backoff::EqualJittered>, ()>;

pub(crate) fn circuit_breaker(failure_threshold: u32, reset_timeout_secs: u64) -> Breaker {
    let backoff = backoff::equal_jittered(
        Duration::from_secs(reset_timeout_secs),
        Duration::from_secs(reset_timeout_secs * 2),
    );
    let policy = failure_policy::consecutive_failures(failure_threshold, backoff);
    Config::new().failure_policy(policy).build()
}

pub(crate) fn http_client(timeout: Duration) -> Client {
    Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_default()
}

pub(crate) fn breaker_state(breaker: &Breaker) -> String {
    if breaker.is_call_permitted() {
        "closed".to_string()
    } else {
        "open".to_string()
    }
}

/// Reads a decimal that upstream may send as a JSON number or a string.
/// Numbers go through their textual form so `0.1` stays `0.1`.
pub(crate) fn decimal_from_json(value: &Value) -> Option<BigDecimal> {
    match value {
        Value::Number(n) => BigDecimal::from_str(&n.to_string()).ok(),
        Value::String(s) => BigDecimal::from_str(s.trim()).ok(),
        _ => None,
    }
}

/// Reads an identifier that upstream may send as a string or a number.
pub(crate) fn string_from_json(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decimal_from_json_keeps_textual_precision() {
        assert_eq!(
            decimal_from_json(&json!(0.1)),
            Some(BigDecimal::from_str("0.1").unwrap())
        );
        assert_eq!(
            decimal_from_json(&json!("25000.50")),
            Some(BigDecimal::from_str("25000.5").unwrap())
        );
        assert_eq!(decimal_from_json(&json!(5000)), Some(BigDecimal::from(5000)));
        assert_eq!(decimal_from_json(&json!(null)), None);
        assert_eq!(decimal_from_json(&json!("n/a")), None);
    }

    #[test]
    fn test_string_from_json() {
        assert_eq!(string_from_json(&json!("V123")), Some("V123".to_string()));
        assert_eq!(string_from_json(&json!(42)), Some("42".to_string()));
        assert_eq!(string_from_json(&json!("  ")), None);
    }

    #[test]
    fn test_new_breaker_is_closed() {
        let breaker = circuit_breaker(DEFAULT_FAILURE_THRESHOLD, DEFAULT_RESET_TIMEOUT_SECS);
        assert_eq!(breaker_state(&breaker), "closed");
    }
}
