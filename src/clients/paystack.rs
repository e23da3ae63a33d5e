use async_trait::async_trait;
use failsafe::futures::CircuitBreaker as FuturesCircuitBreaker;
use failsafe::Error as FailsafeError;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

use super::{
    breaker_state, circuit_breaker, http_client, Breaker, DEFAULT_FAILURE_THRESHOLD,
    DEFAULT_RESET_TIMEOUT_SECS, DEFAULT_TIMEOUT_SECS,
};
use crate::ports::{GatewayError, PaymentAuthorization, PaymentGateway, PaymentVerification};

pub const DEFAULT_BASE_URL: &str = "https://api.paystack.co";

#[derive(Debug, Deserialize)]
struct PaystackEnvelope<T> {
    status: bool,
    #[serde(default)]
    message: Option<String>,
    data: Option<T>,
}

impl<T> PaystackEnvelope<T> {
    fn into_data(self, action: &str) -> Result<T, GatewayError> {
        if !self.status {
            return Err(GatewayError::Rejected(
                self.message
                    .unwrap_or_else(|| format!("Payment gateway refused to {}", action)),
            ));
        }

        self.data.ok_or_else(|| {
            GatewayError::InvalidResponse(format!("{} response has no data", action))
        })
    }
}

#[derive(Debug, Deserialize)]
struct VerifyData {
    reference: String,
    status: String,
    amount: i64,
    #[serde(default)]
    channel: Option<String>,
}

/// HTTP client for the card payment gateway used to fund the wallet.
#[derive(Clone)]
pub struct PaystackClient {
    client: Client,
    base_url: String,
    secret_key: String,
    circuit_breaker: Breaker,
}

impl PaystackClient {
    pub fn new(base_url: String, secret_key: String) -> Self {
        Self::with_circuit_breaker(
            base_url,
            secret_key,
            Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            DEFAULT_FAILURE_THRESHOLD,
            DEFAULT_RESET_TIMEOUT_SECS,
        )
    }

    pub fn with_circuit_breaker(
        base_url: String,
        secret_key: String,
        timeout: Duration,
        failure_threshold: u32,
        reset_timeout_secs: u64,
    ) -> Self {
        PaystackClient {
            client: http_client(timeout),
            base_url,
            secret_key,
            circuit_breaker: circuit_breaker(failure_threshold, reset_timeout_secs),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn circuit_state(&self) -> String {
        breaker_state(&self.circuit_breaker)
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }

    async fn dispatch<T>(&self, request: RequestBuilder) -> Result<PaystackEnvelope<T>, GatewayError>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let request = request.bearer_auth(&self.secret_key);
        let result = self
            .circuit_breaker
            .call(async move {
                let response = request.send().await?;
                let status = response.status();

                if status.is_server_error() {
                    return Err(GatewayError::Status(status.as_u16()));
                }

                let envelope = response.json::<PaystackEnvelope<T>>().await?;
                Ok(envelope)
            })
            .await;

        match result {
            Ok(envelope) => Ok(envelope),
            Err(FailsafeError::Rejected) => Err(GatewayError::CircuitOpen(
                "Payment gateway circuit breaker is open".to_string(),
            )),
            Err(FailsafeError::Inner(e)) => Err(e),
        }
    }

    pub async fn initialize_transaction(
        &self,
        email: &str,
        amount_minor: i64,
        reference: &str,
    ) -> Result<PaymentAuthorization, GatewayError> {
        let body = json!({
            "email": email,
            "amount": amount_minor,
            "reference": reference,
        });

        let envelope = self
            .dispatch::<PaymentAuthorization>(
                self.client.post(self.url("transaction/initialize")).json(&body),
            )
            .await?;
        envelope.into_data("initialize transaction")
    }

    pub async fn verify_transaction(
        &self,
        reference: &str,
    ) -> Result<PaymentVerification, GatewayError> {
        let path = format!("transaction/verify/{}", reference);
        let data = self
            .dispatch::<VerifyData>(self.client.get(self.url(&path)))
            .await?
            .into_data("verify transaction")?;

        Ok(PaymentVerification {
            reference: data.reference,
            status: data.status,
            amount: data.amount,
            channel: data.channel,
        })
    }
}

#[async_trait]
impl PaymentGateway for PaystackClient {
    async fn initialize(
        &self,
        email: &str,
        amount_minor: i64,
        reference: &str,
    ) -> Result<PaymentAuthorization, GatewayError> {
        self.initialize_transaction(email, amount_minor, reference)
            .await
    }

    async fn verify(&self, reference: &str) -> Result<PaymentVerification, GatewayError> {
        self.verify_transaction(reference).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paystack_client_creation() {
        let client = PaystackClient::new(DEFAULT_BASE_URL.to_string(), "sk_test".to_string());
        assert_eq!(client.base_url(), DEFAULT_BASE_URL);
        assert_eq!(client.circuit_state(), "closed");
    }

    #[test]
    fn test_failed_envelope_uses_gateway_message() {
        let envelope: PaystackEnvelope<VerifyData> = serde_json::from_value(json!({
            "status": false,
            "message": "Transaction reference not found"
        }))
        .unwrap();

        match envelope.into_data("verify transaction") {
            Err(GatewayError::Rejected(msg)) => assert_eq!(msg, "Transaction reference not found"),
            other => panic!("unexpected result: {:?}", other.map(|d| d.reference)),
        }
    }

    #[test]
    fn test_envelope_without_data_is_invalid() {
        let envelope: PaystackEnvelope<PaymentAuthorization> =
            serde_json::from_value(json!({ "status": true, "message": "ok" })).unwrap();
        assert!(matches!(
            envelope.into_data("initialize transaction"),
            Err(GatewayError::InvalidResponse(_))
        ));
    }
}
