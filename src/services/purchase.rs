//! Wallet purchase flow: balance check, debit, vend, reconcile, record.

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

use super::balance_sync::BalanceSync;
use super::in_flight::InFlightGuard;
use super::ledger::LedgerStore;
use super::reference::purchase_reference;
use crate::domain::{
    Product, PurchaseRequest, TransactionInput, TransactionStatus, ValidatedPurchase,
    REFUND_PREFIX,
};
use crate::ports::{BalanceService, LedgerError, VendOutcome, VendorGateway};
use crate::validation::{validate_purchase, ValidationError};

const DEFAULT_VEND_FAILURE: &str = "Purchase failed";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    InvalidRequest,
    DuplicateInFlight,
    BalanceUnavailable,
    InsufficientFunds,
    DebitFailed,
    VendorFulfillmentFailed,
    UnknownError,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidRequest => "InvalidRequest",
            ErrorKind::DuplicateInFlight => "DuplicateInFlight",
            ErrorKind::BalanceUnavailable => "BalanceUnavailable",
            ErrorKind::InsufficientFunds => "InsufficientFunds",
            ErrorKind::DebitFailed => "DebitFailed",
            ErrorKind::VendorFulfillmentFailed => "VendorFulfillmentFailed",
            ErrorKind::UnknownError => "UnknownError",
        }
    }
}

#[derive(Error, Debug)]
pub enum PurchaseError {
    #[error("Invalid request: {0}")]
    InvalidRequest(#[from] ValidationError),
    #[error("An identical purchase is already in progress")]
    DuplicateInFlight,
    #[error("Failed to check wallet balance: {0}")]
    BalanceUnavailable(String),
    #[error("Insufficient balance. Needed: {required}, Available: {available}")]
    InsufficientFunds {
        required: BigDecimal,
        available: BigDecimal,
    },
    #[error("Failed to charge wallet: {0}")]
    DebitFailed(String),
    #[error("{0}")]
    VendorFulfillmentFailed(String),
    #[error("Unexpected error: {0}")]
    Unknown(String),
}

impl PurchaseError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PurchaseError::InvalidRequest(_) => ErrorKind::InvalidRequest,
            PurchaseError::DuplicateInFlight => ErrorKind::DuplicateInFlight,
            PurchaseError::BalanceUnavailable(_) => ErrorKind::BalanceUnavailable,
            PurchaseError::InsufficientFunds { .. } => ErrorKind::InsufficientFunds,
            PurchaseError::DebitFailed(_) => ErrorKind::DebitFailed,
            PurchaseError::VendorFulfillmentFailed(_) => ErrorKind::VendorFulfillmentFailed,
            PurchaseError::Unknown(_) => ErrorKind::UnknownError,
        }
    }
}

impl From<LedgerError> for PurchaseError {
    fn from(err: LedgerError) -> Self {
        PurchaseError::Unknown(err.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PurchaseReceipt {
    pub transaction_reference: String,
    pub new_balance: BigDecimal,
    pub request: PurchaseRequest,
}

pub type PurchaseResult = Result<PurchaseReceipt, PurchaseError>;

#[derive(Clone)]
pub struct PurchaseOrchestrator {
    balances: Arc<dyn BalanceService>,
    vendor: Arc<dyn VendorGateway>,
    ledger: LedgerStore,
    balance_sync: BalanceSync,
    in_flight: InFlightGuard,
}

impl PurchaseOrchestrator {
    pub fn new(
        balances: Arc<dyn BalanceService>,
        vendor: Arc<dyn VendorGateway>,
        ledger: LedgerStore,
        balance_sync: BalanceSync,
    ) -> Self {
        Self {
            balances,
            vendor,
            ledger,
            balance_sync,
            in_flight: InFlightGuard::new(),
        }
    }

    pub fn ledger(&self) -> &LedgerStore {
        &self.ledger
    }

    pub fn balance_sync(&self) -> &BalanceSync {
        &self.balance_sync
    }

    /// Runs one purchase to a terminal outcome. Every attempt that gets past
    /// validation and the duplicate check schedules a wallet re-sync.
    pub async fn purchase(&self, request: PurchaseRequest) -> PurchaseResult {
        let validated = validate_purchase(&request)?;

        let key = validated.idempotency_key();
        let Some(_permit) = self.in_flight.try_acquire(&key) else {
            tracing::warn!(phone = %validated.recipient_phone, "Rejected duplicate in-flight purchase");
            return Err(PurchaseError::DuplicateInFlight);
        };

        let result = self.execute(&validated, request).await;
        self.balance_sync.trigger();

        match &result {
            Ok(receipt) => tracing::info!(
                reference = %receipt.transaction_reference,
                new_balance = %receipt.new_balance,
                "Purchase completed"
            ),
            Err(e) => tracing::warn!(kind = e.kind().as_str(), "Purchase failed: {}", e),
        }

        result
    }

    async fn execute(
        &self,
        purchase: &ValidatedPurchase,
        request: PurchaseRequest,
    ) -> PurchaseResult {
        let snapshot = self
            .balances
            .fetch_snapshot()
            .await
            .map_err(|e| PurchaseError::BalanceUnavailable(e.to_string()))?;

        if snapshot.general_balance < purchase.cost {
            return Err(PurchaseError::InsufficientFunds {
                required: purchase.cost.clone(),
                available: snapshot.general_balance,
            });
        }

        let transaction_type = purchase.transaction_type();
        let reference = purchase_reference(transaction_type);
        let description = purchase.description();

        self.record(&reference, purchase, &description, TransactionStatus::Pending)
            .await?;

        let new_balance = match self.balances.charge(&purchase.cost).await {
            Ok(balance) => balance,
            Err(e) => {
                tracing::error!(reference = %reference, "Wallet debit failed: {}", e);
                self.record(&reference, purchase, &description, TransactionStatus::Failed)
                    .await?;
                return Err(PurchaseError::DebitFailed(e.to_string()));
            }
        };

        let outcome = match &purchase.product {
            Product::Airtime => {
                self.vendor
                    .fulfill_airtime(purchase.network, &purchase.recipient_phone, &purchase.cost)
                    .await
            }
            Product::Data { plan_code } => {
                self.vendor
                    .fulfill_data(&purchase.recipient_phone, plan_code)
                    .await
            }
        };

        match outcome {
            Ok(VendOutcome::Fulfilled {
                reference: vendor_reference,
                ..
            }) => {
                self.record(&reference, purchase, &description, TransactionStatus::Completed)
                    .await?;

                Ok(PurchaseReceipt {
                    transaction_reference: vendor_reference.unwrap_or(reference),
                    new_balance,
                    request,
                })
            }
            Ok(VendOutcome::Rejected { reason }) => {
                self.reconcile(&reference, purchase, &description, reason)
                    .await
            }
            Err(e) => {
                tracing::error!(reference = %reference, "Vendor call failed: {}", e);
                self.reconcile(&reference, purchase, &description, Some(e.to_string()))
                    .await
            }
        }
    }

    /// Compensates a debit whose fulfillment failed: refund entry first,
    /// then the failed entry for the purchase reference.
    async fn reconcile(
        &self,
        reference: &str,
        purchase: &ValidatedPurchase,
        description: &str,
        reason: Option<String>,
    ) -> PurchaseResult {
        let reason = reason
            .filter(|r| !r.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_VEND_FAILURE.to_string());

        let refund_reference = format!("{}{}", REFUND_PREFIX, reference);
        let refund_description = format!("Refund: {} - {}", description, reason);
        self.record(
            &refund_reference,
            purchase,
            &refund_description,
            TransactionStatus::Completed,
        )
        .await?;

        self.record(reference, purchase, description, TransactionStatus::Failed)
            .await?;

        Err(PurchaseError::VendorFulfillmentFailed(reason))
    }

    async fn record(
        &self,
        reference: &str,
        purchase: &ValidatedPurchase,
        description: &str,
        status: TransactionStatus,
    ) -> Result<(), PurchaseError> {
        self.ledger
            .append(TransactionInput {
                reference: reference.to_string(),
                transaction_type: purchase.transaction_type(),
                amount: purchase.cost.clone(),
                description: description.to_string(),
                status,
            })
            .await?;
        Ok(())
    }
}
