//! Postgres implementation of RemoteLedger.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::Transaction;
use crate::ports::{RemoteLedger, RepositoryError, RepositoryResult};

/// Postgres-backed ledger mirror, one row per (owner, reference).
#[derive(Clone)]
pub struct PostgresLedgerRepository {
    pool: PgPool,
}

impl PostgresLedgerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RemoteLedger for PostgresLedgerRepository {
    async fn upsert(&self, tx: &Transaction) -> RepositoryResult<()> {
        let owner_id = tx
            .owner_id
            .as_deref()
            .ok_or_else(|| RepositoryError::MissingOwner(tx.reference.clone()))?;

        sqlx::query(
            r#"
            INSERT INTO ledger_transactions (
                reference, owner_id, type, amount, description, status,
                created_at, schema_version
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (owner_id, reference) DO UPDATE SET
                type = EXCLUDED.type,
                amount = EXCLUDED.amount,
                description = EXCLUDED.description,
                status = EXCLUDED.status,
                created_at = EXCLUDED.created_at,
                schema_version = EXCLUDED.schema_version
            "#,
        )
        .bind(&tx.reference)
        .bind(owner_id)
        .bind(tx.transaction_type.as_str())
        .bind(&tx.amount)
        .bind(&tx.description)
        .bind(tx.status.as_str())
        .bind(tx.created_at)
        .bind(tx.schema_version as i32)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list_for_owner(&self, owner_id: &str) -> RepositoryResult<Vec<Transaction>> {
        let rows = sqlx::query_as::<_, LedgerRow>(
            r#"
            SELECT reference, owner_id, type AS transaction_type, amount, description,
                   status, created_at, schema_version
            FROM ledger_transactions
            WHERE owner_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(LedgerRow::into_domain).collect()
    }
}

/// Internal row type for SQLx. Not exposed outside the adapter.
#[derive(Debug, sqlx::FromRow)]
struct LedgerRow {
    reference: String,
    owner_id: String,
    transaction_type: String,
    amount: bigdecimal::BigDecimal,
    description: String,
    status: String,
    created_at: chrono::DateTime<chrono::Utc>,
    schema_version: i32,
}

impl LedgerRow {
    fn into_domain(self) -> RepositoryResult<Transaction> {
        let transaction_type = self
            .transaction_type
            .parse()
            .map_err(|e| RepositoryError::Corrupt(format!("{}: {}", self.reference, e)))?;
        let status = self
            .status
            .parse()
            .map_err(|e| RepositoryError::Corrupt(format!("{}: {}", self.reference, e)))?;

        Ok(Transaction {
            reference: self.reference,
            transaction_type,
            amount: self.amount,
            description: self.description,
            status,
            created_at: self.created_at,
            owner_id: Some(self.owner_id),
            schema_version: u32::try_from(self.schema_version).unwrap_or_default(),
        })
    }
}
