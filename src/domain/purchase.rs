//! Purchase requests as submitted by callers, and their validated form.

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

use super::transaction::TransactionType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PurchaseKind {
    Airtime,
    Data,
}

impl PurchaseKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PurchaseKind::Airtime => "airtime",
            PurchaseKind::Data => "data",
        }
    }
}

/// Mobile network operators served by the aggregator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Network {
    Mtn,
    Airtel,
    Glo,
    NineMobile,
}

impl Network {
    pub const ALL: [Network; 4] = [
        Network::Mtn,
        Network::Airtel,
        Network::Glo,
        Network::NineMobile,
    ];

    /// Operator code as the aggregator expects it.
    pub fn as_str(&self) -> &'static str {
        match self {
            Network::Mtn => "MTN",
            Network::Airtel => "AIRTEL",
            Network::Glo => "GLO",
            Network::NineMobile => "9MOBILE",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownNetwork(pub String);

impl fmt::Display for UnknownNetwork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown network '{}'", self.0)
    }
}

impl std::error::Error for UnknownNetwork {}

impl FromStr for Network {
    type Err = UnknownNetwork;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Network::ALL
            .into_iter()
            .find(|network| network.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| UnknownNetwork(trimmed.to_string()))
    }
}

impl TryFrom<String> for Network {
    type Error = UnknownNetwork;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Network> for String {
    fn from(network: Network) -> Self {
        network.as_str().to_string()
    }
}

/// A purchase as submitted by the presentation layer. Fields are kept raw
/// so that every malformed value is reported as a validation failure rather
/// than a decoding error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseRequest {
    pub kind: PurchaseKind,
    pub network: String,
    pub recipient_phone: String,
    pub cost: BigDecimal,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan_code: Option<String>,
}

/// What the vendor is asked to deliver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Product {
    Airtime,
    Data { plan_code: String },
}

/// A request that passed validation. A data purchase cannot be built
/// without its plan code.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedPurchase {
    pub network: Network,
    pub recipient_phone: String,
    pub cost: BigDecimal,
    pub display_name: String,
    pub product: Product,
}

impl ValidatedPurchase {
    pub fn kind(&self) -> PurchaseKind {
        match self.product {
            Product::Airtime => PurchaseKind::Airtime,
            Product::Data { .. } => PurchaseKind::Data,
        }
    }

    pub fn transaction_type(&self) -> TransactionType {
        match self.product {
            Product::Airtime => TransactionType::AirtimePurchase,
            Product::Data { .. } => TransactionType::DataPurchase,
        }
    }

    /// Ledger description, e.g. `MTN Airtime 500 for 08031234567`.
    pub fn description(&self) -> String {
        format!("{} for {}", self.display_name, self.recipient_phone)
    }

    /// Key identifying the semantic intent of the purchase. Two submissions
    /// of the same product to the same number for the same cost share it.
    pub fn idempotency_key(&self) -> String {
        let plan_code = match &self.product {
            Product::Airtime => "",
            Product::Data { plan_code } => plan_code.as_str(),
        };

        let mut hasher = Sha256::new();
        for part in [
            self.kind().as_str(),
            self.network.as_str(),
            self.recipient_phone.as_str(),
            &self.cost.normalized().to_string(),
            plan_code,
        ] {
            hasher.update(part.as_bytes());
            hasher.update([0u8]);
        }
        hex::encode(hasher.finalize())
    }
}
