//! Boundaries between the purchase core and the outside world. Adapters
//! implement these traits; the orchestrator and the ledger only see them.

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{Network, Transaction, WalletSnapshot};

/// Failure to complete a call to an external HTTP service.
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Upstream returned status {0}")]
    Status(u16),
    #[error("Invalid response from upstream: {0}")]
    InvalidResponse(String),
    #[error("Upstream rejected the request: {0}")]
    Rejected(String),
    #[error("Circuit breaker open: {0}")]
    CircuitOpen(String),
}

#[derive(Error, Debug)]
pub enum ChargeError {
    #[error("Insufficient balance. Needed: {required}, Available: {available}")]
    Insufficient {
        required: BigDecimal,
        available: BigDecimal,
    },
    #[error("Failed to fetch current balance: {0}")]
    Unavailable(#[from] GatewayError),
}

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Ledger storage error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Ledger serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Invalid storage key: {0}")]
    InvalidKey(String),
}

#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Transaction {0} has no owner")]
    MissingOwner(String),
    #[error("Corrupt ledger row: {0}")]
    Corrupt(String),
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Vendor verdict on a fulfillment call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VendOutcome {
    Fulfilled {
        reference: Option<String>,
        message: Option<String>,
    },
    Rejected {
        reason: Option<String>,
    },
}

/// A data bundle product offered by the vendor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataPlan {
    pub code: String,
    pub name: String,
    pub price: BigDecimal,
    pub validity: Option<String>,
}

/// Source of truth for the spendable balance.
#[async_trait]
pub trait BalanceService: Send + Sync {
    async fn fetch_snapshot(&self) -> Result<WalletSnapshot, GatewayError>;

    /// Debits `amount` and returns the post-debit general balance. The
    /// implementation re-checks sufficiency at debit time.
    async fn charge(&self, amount: &BigDecimal) -> Result<BigDecimal, ChargeError>;
}

/// The telecom aggregator.
#[async_trait]
pub trait VendorGateway: Send + Sync {
    async fn fulfill_airtime(
        &self,
        network: Network,
        phone: &str,
        amount: &BigDecimal,
    ) -> Result<VendOutcome, GatewayError>;

    async fn fulfill_data(&self, phone: &str, plan_code: &str) -> Result<VendOutcome, GatewayError>;

    async fn list_plans(&self, network: Network) -> Result<Vec<DataPlan>, GatewayError>;
}

/// Local string storage addressed by fixed keys.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get_item(&self, key: &str) -> Result<Option<String>, LedgerError>;
    async fn set_item(&self, key: &str, value: &str) -> Result<(), LedgerError>;
}

/// Per-owner ledger kept by a remote backend.
#[async_trait]
pub trait RemoteLedger: Send + Sync {
    /// Inserts the entry, replacing any entry of the same owner and reference.
    async fn upsert(&self, tx: &Transaction) -> RepositoryResult<()>;
    async fn list_for_owner(&self, owner_id: &str) -> RepositoryResult<Vec<Transaction>>;
}

/// Resolves the authenticated owner, if any.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    async fn current_owner(&self) -> Option<String>;
}

/// Session fixed at construction time.
#[derive(Debug, Clone, Default)]
pub struct StaticSession {
    owner_id: Option<String>,
}

impl StaticSession {
    pub fn anonymous() -> Self {
        Self { owner_id: None }
    }

    pub fn owned_by(owner_id: impl Into<String>) -> Self {
        Self {
            owner_id: Some(owner_id.into()),
        }
    }
}

#[async_trait]
impl SessionProvider for StaticSession {
    async fn current_owner(&self) -> Option<String> {
        self.owner_id.clone()
    }
}

/// Result of starting a payment with the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentAuthorization {
    pub authorization_url: String,
    pub access_code: Option<String>,
    pub reference: String,
}

/// Gateway's verdict on a payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentVerification {
    pub reference: String,
    pub status: String,
    /// Amount in minor units.
    pub amount: i64,
    pub channel: Option<String>,
}

impl PaymentVerification {
    pub fn is_successful(&self) -> bool {
        self.status.eq_ignore_ascii_case("success")
    }

    /// Whether the gateway has reached a final outcome. `ongoing`, `pending`,
    /// `processing`, `queued` and anything unrecognized may still change.
    pub fn is_settled(&self) -> bool {
        ["success", "failed", "abandoned", "reversed"]
            .iter()
            .any(|status| self.status.eq_ignore_ascii_case(status))
    }
}

/// Card payment gateway used to fund the wallet.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn initialize(
        &self,
        email: &str,
        amount_minor: i64,
        reference: &str,
    ) -> Result<PaymentAuthorization, GatewayError>;

    async fn verify(&self, reference: &str) -> Result<PaymentVerification, GatewayError>;
}
