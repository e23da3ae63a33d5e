//! Ledger entries.

use bigdecimal::BigDecimal;
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Version stamped on every entry written by this crate. Entries persisted
/// without the field decode as version 0.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

pub const REFUND_PREFIX: &str = "refund_";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    AirtimePurchase,
    DataPurchase,
    WalletFunding,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::AirtimePurchase => "airtime_purchase",
            TransactionType::DataPurchase => "data_purchase",
            TransactionType::WalletFunding => "wallet_funding",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    Pending,
    Completed,
    Failed,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "pending",
            TransactionStatus::Completed => "completed",
            TransactionStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, TransactionStatus::Pending)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVariant {
    pub field: &'static str,
    pub value: String,
}

impl fmt::Display for UnknownVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown {} '{}'", self.field, self.value)
    }
}

impl std::error::Error for UnknownVariant {}

impl FromStr for TransactionType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "airtime_purchase" => Ok(TransactionType::AirtimePurchase),
            "data_purchase" => Ok(TransactionType::DataPurchase),
            "wallet_funding" => Ok(TransactionType::WalletFunding),
            other => Err(UnknownVariant {
                field: "transaction type",
                value: other.to_string(),
            }),
        }
    }
}

impl FromStr for TransactionStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TransactionStatus::Pending),
            "completed" => Ok(TransactionStatus::Completed),
            "failed" => Ok(TransactionStatus::Failed),
            other => Err(UnknownVariant {
                field: "transaction status",
                value: other.to_string(),
            }),
        }
    }
}

/// What a writer supplies; the ledger stamps the rest.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionInput {
    pub reference: String,
    pub transaction_type: TransactionType,
    pub amount: BigDecimal,
    pub description: String,
    pub status: TransactionStatus,
}

/// A ledger entry. A later entry with the same `reference` supersedes an
/// earlier one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub reference: String,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    pub amount: BigDecimal,
    pub description: String,
    pub status: TransactionStatus,
    #[serde(default = "legacy_created_at")]
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<String>,
    #[serde(default)]
    pub schema_version: u32,
}

fn legacy_created_at() -> DateTime<Utc> {
    Utc.timestamp_opt(0, 0).single().unwrap_or_default()
}

impl Transaction {
    pub fn from_input(input: TransactionInput, owner_id: Option<String>) -> Self {
        Self {
            reference: input.reference,
            transaction_type: input.transaction_type,
            amount: input.amount,
            description: input.description,
            status: input.status,
            created_at: Utc::now(),
            owner_id,
            schema_version: CURRENT_SCHEMA_VERSION,
        }
    }

    pub fn is_refund(&self) -> bool {
        self.reference.starts_with(REFUND_PREFIX)
    }
}
