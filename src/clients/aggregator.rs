use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::Utc;
use failsafe::futures::CircuitBreaker as FuturesCircuitBreaker;
use failsafe::Error as FailsafeError;
use reqwest::header::ACCEPT;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use serde_json::{json, Value};
use std::str::FromStr;
use std::time::Duration;

use super::{
    breaker_state, circuit_breaker, decimal_from_json, http_client, string_from_json, Breaker,
    DEFAULT_FAILURE_THRESHOLD, DEFAULT_RESET_TIMEOUT_SECS, DEFAULT_TIMEOUT_SECS,
};
use crate::domain::{Network, SubBalance, WalletSnapshot};
use crate::ports::{BalanceService, ChargeError, DataPlan, GatewayError, VendOutcome, VendorGateway};

pub const DEFAULT_BASE_URL: &str = "https://www.airtimenigeria.com/api/v1";

const GENERAL_WALLET: &str = "universal_wallet";
const DATA_MAX_AMOUNT: &str = "5000";

/// Envelope shared by every aggregator endpoint.
#[derive(Debug, Clone, Deserialize)]
struct ApiEnvelope {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    details: Option<Value>,
    #[serde(default)]
    data: Option<Value>,
}

impl ApiEnvelope {
    fn into_vend_outcome(self) -> VendOutcome {
        if self.success {
            let reference = self
                .details
                .as_ref()
                .and_then(|details| details.get("reference"))
                .and_then(string_from_json);
            VendOutcome::Fulfilled {
                reference,
                message: self.message,
            }
        } else {
            VendOutcome::Rejected {
                reason: self.message.filter(|m| !m.trim().is_empty()),
            }
        }
    }

    fn rejection(self, fallback: &str) -> GatewayError {
        GatewayError::Rejected(
            self.message
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| fallback.to_string()),
        )
    }
}

/// HTTP client for the telecom aggregator. Serves both as the balance
/// service and as the vendor gateway.
#[derive(Clone)]
pub struct AggregatorClient {
    client: Client,
    base_url: String,
    token: String,
    circuit_breaker: Breaker,
}

impl AggregatorClient {
    pub fn new(base_url: String, token: String) -> Self {
        Self::with_circuit_breaker(
            base_url,
            token,
            Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            DEFAULT_FAILURE_THRESHOLD,
            DEFAULT_RESET_TIMEOUT_SECS,
        )
    }

    /// Creates a client with custom timeout and circuit breaker configuration
    pub fn with_circuit_breaker(
        base_url: String,
        token: String,
        timeout: Duration,
        failure_threshold: u32,
        reset_timeout_secs: u64,
    ) -> Self {
        AggregatorClient {
            client: http_client(timeout),
            base_url,
            token,
            circuit_breaker: circuit_breaker(failure_threshold, reset_timeout_secs),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the current state of the circuit breaker
    pub fn circuit_state(&self) -> String {
        breaker_state(&self.circuit_breaker)
    }

    fn request(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .bearer_auth(&self.token)
            .header(ACCEPT, "application/json")
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }

    async fn dispatch(&self, request: RequestBuilder) -> Result<ApiEnvelope, GatewayError> {
        let result = self
            .circuit_breaker
            .call(async move {
                let response = request.send().await?;
                let status = response.status();

                if status.is_server_error() {
                    return Err(GatewayError::Status(status.as_u16()));
                }

                let envelope = response.json::<ApiEnvelope>().await?;
                Ok(envelope)
            })
            .await;

        match result {
            Ok(envelope) => Ok(envelope),
            Err(FailsafeError::Rejected) => Err(GatewayError::CircuitOpen(
                "Vendor API circuit breaker is open".to_string(),
            )),
            Err(FailsafeError::Inner(e)) => Err(e),
        }
    }

    /// Fetches the balances of every wallet held with the aggregator.
    pub async fn get_balance(&self) -> Result<WalletSnapshot, GatewayError> {
        let envelope = self
            .dispatch(self.request(self.client.get(self.url("balance"))))
            .await?;

        if !envelope.success {
            return Err(envelope.rejection("Failed to fetch wallet balance"));
        }

        let data = envelope
            .data
            .ok_or_else(|| GatewayError::InvalidResponse("balance response has no data".into()))?;
        parse_wallet_snapshot(&data)
    }

    pub async fn purchase_airtime(
        &self,
        network: Network,
        phone: &str,
        amount: &BigDecimal,
    ) -> Result<VendOutcome, GatewayError> {
        let body = json!({
            "network_operator": network.as_str(),
            "phone": phone,
            "amount": decimal_to_json(amount),
            "max_amount": airtime_max_amount(amount).to_string(),
        });

        let envelope = self
            .dispatch(self.request(self.client.post(self.url("airtime")).json(&body)))
            .await?;
        Ok(envelope.into_vend_outcome())
    }

    pub async fn purchase_data(
        &self,
        phone: &str,
        package_code: &str,
    ) -> Result<VendOutcome, GatewayError> {
        let body = json!({
            "phone": phone,
            "package_code": package_code,
            "max_amount": DATA_MAX_AMOUNT,
        });

        let envelope = self
            .dispatch(self.request(self.client.post(self.url("data")).json(&body)))
            .await?;
        Ok(envelope.into_vend_outcome())
    }

    pub async fn get_data_plans(&self, network: Network) -> Result<Vec<DataPlan>, GatewayError> {
        let request = self
            .client
            .get(self.url("data/plans"))
            .query(&[("network", network.as_str())]);
        let envelope = self.dispatch(self.request(request)).await?;

        if !envelope.success {
            return Err(envelope.rejection("Failed to fetch data plans"));
        }

        let plans = match envelope.data {
            Some(Value::Array(items)) => items,
            Some(_) => {
                return Err(GatewayError::InvalidResponse(
                    "data plans response is not a list".into(),
                ))
            }
            None => Vec::new(),
        };

        Ok(plans
            .iter()
            .filter_map(|item| {
                let plan = parse_plan(item);
                if plan.is_none() {
                    tracing::debug!(network = %network, "Skipping malformed data plan: {}", item);
                }
                plan
            })
            .collect())
    }
}

/// Vendor ceiling for an airtime top-up: `ceil(amount * 0.99)`.
pub fn airtime_max_amount(amount: &BigDecimal) -> BigDecimal {
    let ratio = BigDecimal::new(99.into(), 2);
    let scaled = amount * ratio;
    let floor = scaled.with_scale(0);
    if floor < scaled {
        floor + BigDecimal::from(1)
    } else {
        floor
    }
}

fn decimal_to_json(amount: &BigDecimal) -> Value {
    serde_json::Number::from_str(&amount.to_string())
        .map(Value::Number)
        .unwrap_or_else(|_| Value::String(amount.to_string()))
}

fn parse_wallet_snapshot(data: &Value) -> Result<WalletSnapshot, GatewayError> {
    let wallets = data
        .as_object()
        .ok_or_else(|| GatewayError::InvalidResponse("balance data is not an object".into()))?;

    let general = wallets.get(GENERAL_WALLET).ok_or_else(|| {
        GatewayError::InvalidResponse(format!("balance data has no {}", GENERAL_WALLET))
    })?;

    let general_balance = general
        .get("balance")
        .and_then(decimal_from_json)
        .ok_or_else(|| {
            GatewayError::InvalidResponse(format!("{}.balance is not a number", GENERAL_WALLET))
        })?;

    let sub_balances = wallets
        .iter()
        .filter(|(name, _)| name.as_str() != GENERAL_WALLET)
        .filter_map(|(name, wallet)| {
            let wallet = wallet.as_object()?;
            Some((
                name.clone(),
                SubBalance {
                    balance: wallet.get("balance").and_then(decimal_from_json),
                    currency: wallet
                        .get("currency")
                        .and_then(Value::as_str)
                        .map(str::to_string),
                },
            ))
        })
        .collect();

    Ok(WalletSnapshot {
        general_balance,
        currency: general
            .get("currency")
            .and_then(Value::as_str)
            .map(str::to_string),
        sub_balances,
        fetched_at: Utc::now(),
    })
}

fn parse_plan(item: &Value) -> Option<DataPlan> {
    let code = item
        .get("package_code")
        .or_else(|| item.get("code"))
        .and_then(string_from_json)?;
    let price = item
        .get("price")
        .or_else(|| item.get("amount"))
        .and_then(decimal_from_json)?;
    let name = item
        .get("name")
        .or_else(|| item.get("plan_name"))
        .or_else(|| item.get("plan_summary"))
        .and_then(string_from_json)
        .unwrap_or_else(|| code.clone());

    Some(DataPlan {
        code,
        name,
        price,
        validity: item.get("validity").and_then(string_from_json),
    })
}

#[async_trait]
impl BalanceService for AggregatorClient {
    async fn fetch_snapshot(&self) -> Result<WalletSnapshot, GatewayError> {
        self.get_balance().await
    }

    // The aggregator has no debit endpoint: the charge re-reads the balance,
    // repeats the sufficiency check and reports the post-debit value.
    async fn charge(&self, amount: &BigDecimal) -> Result<BigDecimal, ChargeError> {
        let snapshot = self.get_balance().await?;

        if snapshot.general_balance < *amount {
            return Err(ChargeError::Insufficient {
                required: amount.clone(),
                available: snapshot.general_balance,
            });
        }

        let new_balance = &snapshot.general_balance - amount;
        tracing::info!(amount = %amount, new_balance = %new_balance, "Wallet charged");
        Ok(new_balance)
    }
}

#[async_trait]
impl VendorGateway for AggregatorClient {
    async fn fulfill_airtime(
        &self,
        network: Network,
        phone: &str,
        amount: &BigDecimal,
    ) -> Result<VendOutcome, GatewayError> {
        self.purchase_airtime(network, phone, amount).await
    }

    async fn fulfill_data(&self, phone: &str, plan_code: &str) -> Result<VendOutcome, GatewayError> {
        self.purchase_data(phone, plan_code).await
    }

    async fn list_plans(&self, network: Network) -> Result<Vec<DataPlan>, GatewayError> {
        self.get_data_plans(network).await
    }
}
