use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Balance of an ancillary wallet (SMS units, per-network data credit).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubBalance {
    pub balance: Option<BigDecimal>,
    pub currency: Option<String>,
}

/// Point-in-time read of the wallet. Only `general_balance` takes part in
/// purchase authorization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletSnapshot {
    pub general_balance: BigDecimal,
    pub currency: Option<String>,
    #[serde(default)]
    pub sub_balances: BTreeMap<String, SubBalance>,
    pub fetched_at: DateTime<Utc>,
}

impl WalletSnapshot {
    pub fn new(general_balance: BigDecimal) -> Self {
        Self {
            general_balance,
            currency: None,
            sub_balances: BTreeMap::new(),
            fetched_at: Utc::now(),
        }
    }
}
