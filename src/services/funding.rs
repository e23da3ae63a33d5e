//! Wallet funding through the card payment gateway.

use bigdecimal::{BigDecimal, ToPrimitive};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

use super::ledger::LedgerStore;
use super::reference::funding_reference;
use crate::domain::{Transaction, TransactionInput, TransactionStatus, TransactionType};
use crate::ports::{GatewayError, LedgerError, PaymentGateway};
use crate::validation::{
    canonical_amount, validate_email, validate_minor_unit_precision, validate_positive_amount,
    ValidationError, MINOR_UNITS,
};

const FUNDING_DESCRIPTION: &str = "Wallet funding";

#[derive(Error, Debug)]
pub enum FundingError {
    #[error("Invalid funding request: {0}")]
    Validation(#[from] ValidationError),
    #[error("Payment gateway error: {0}")]
    Gateway(#[from] GatewayError),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error("Unknown funding reference: {0}")]
    UnknownReference(String),
}

/// Handed back to the caller so the user can be redirected to pay.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FundingSession {
    pub reference: String,
    pub authorization_url: String,
    pub amount: BigDecimal,
}

#[derive(Clone)]
pub struct FundingService {
    gateway: Arc<dyn PaymentGateway>,
    ledger: LedgerStore,
}

impl FundingService {
    pub fn new(gateway: Arc<dyn PaymentGateway>, ledger: LedgerStore) -> Self {
        Self { gateway, ledger }
    }

    /// Opens a payment with the gateway and records it as pending.
    pub async fn initiate(
        &self,
        email: &str,
        amount: &BigDecimal,
    ) -> Result<FundingSession, FundingError> {
        validate_email(email)?;
        validate_positive_amount("amount", amount)?;
        validate_minor_unit_precision("amount", amount)?;

        let amount = canonical_amount(amount);
        let amount_minor = (&amount * BigDecimal::from(MINOR_UNITS))
            .to_i64()
            .ok_or_else(|| ValidationError::new("amount", "is too large"))?;

        let reference = funding_reference();
        let authorization = self
            .gateway
            .initialize(email.trim(), amount_minor, &reference)
            .await?;

        self.ledger
            .append(TransactionInput {
                reference: reference.clone(),
                transaction_type: TransactionType::WalletFunding,
                amount: amount.clone(),
                description: FUNDING_DESCRIPTION.to_string(),
                status: TransactionStatus::Pending,
            })
            .await?;

        tracing::info!(reference = %reference, amount = %amount, "Wallet funding initiated");

        Ok(FundingSession {
            reference,
            authorization_url: authorization.authorization_url,
            amount,
        })
    }

    /// Asks the gateway for the payment's outcome and records it. An entry
    /// that is already terminal, or whose payment has not settled yet, is
    /// returned unchanged.
    pub async fn verify(&self, reference: &str) -> Result<Transaction, FundingError> {
        let existing = self
            .ledger
            .find(reference)
            .await
            .filter(|tx| tx.transaction_type == TransactionType::WalletFunding)
            .ok_or_else(|| FundingError::UnknownReference(reference.to_string()))?;

        if existing.status.is_terminal() {
            return Ok(existing);
        }

        let verification = self.gateway.verify(reference).await?;
        if !verification.is_settled() {
            tracing::info!(
                reference = %reference,
                gateway_status = %verification.status,
                "Wallet funding not settled yet"
            );
            return Ok(existing);
        }

        let status = if verification.is_successful() {
            TransactionStatus::Completed
        } else {
            TransactionStatus::Failed
        };
        let amount = canonical_amount(
            &(BigDecimal::from(verification.amount) / BigDecimal::from(MINOR_UNITS)),
        );

        let tx = self
            .ledger
            .append(TransactionInput {
                reference: reference.to_string(),
                transaction_type: TransactionType::WalletFunding,
                amount,
                description: existing.description,
                status,
            })
            .await?;

        tracing::info!(
            reference = %reference,
            status = tx.status.as_str(),
            gateway_status = %verification.status,
            "Wallet funding verified"
        );

        Ok(tx)
    }
}
