//! The transaction ledger: a local JSON array, optionally mirrored to a
//! per-owner remote store.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::domain::{Transaction, TransactionInput};
use crate::ports::{KeyValueStore, LedgerError, RemoteLedger, SessionProvider};

/// Key under which the local ledger is stored.
pub const LEDGER_KEY: &str = "transactions";

#[derive(Clone)]
pub struct LedgerStore {
    local: Arc<dyn KeyValueStore>,
    remote: Option<Arc<dyn RemoteLedger>>,
    session: Arc<dyn SessionProvider>,
    write_lock: Arc<Mutex<()>>,
}

impl LedgerStore {
    pub fn new(local: Arc<dyn KeyValueStore>, session: Arc<dyn SessionProvider>) -> Self {
        Self {
            local,
            remote: None,
            session,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn with_remote(mut self, remote: Arc<dyn RemoteLedger>) -> Self {
        self.remote = Some(remote);
        self
    }

    /// Stamps and records an entry. An existing entry with the same
    /// reference is replaced and the new one moves to the front.
    pub async fn append(&self, input: TransactionInput) -> Result<Transaction, LedgerError> {
        let owner_id = self.session.current_owner().await;
        let tx = Transaction::from_input(input, owner_id);

        {
            let _guard = self.write_lock.lock().await;
            let mut entries = self.read_local().await?;
            entries.retain(|existing| existing.reference != tx.reference);
            entries.insert(0, tx.clone());

            let raw = serde_json::to_string(&entries)?;
            self.local.set_item(LEDGER_KEY, &raw).await?;
        }

        tracing::debug!(reference = %tx.reference, status = tx.status.as_str(), "Ledger entry written");

        if let (Some(remote), Some(_)) = (&self.remote, &tx.owner_id) {
            if let Err(e) = remote.upsert(&tx).await {
                tracing::warn!(reference = %tx.reference, "Failed to mirror ledger entry: {}", e);
            }
        }

        Ok(tx)
    }

    /// Every entry visible to the current session, newest first. Storage
    /// problems degrade the result instead of failing it.
    pub async fn list(&self) -> Vec<Transaction> {
        let local = match self.read_local().await {
            Ok(entries) => entries,
            Err(e) => {
                tracing::error!("Failed to read local ledger: {}", e);
                Vec::new()
            }
        };

        let remote = match (&self.remote, self.session.current_owner().await) {
            (Some(remote), Some(owner_id)) => match remote.list_for_owner(&owner_id).await {
                Ok(entries) => entries,
                Err(e) => {
                    tracing::warn!(owner_id = %owner_id, "Remote ledger unavailable, using local entries only: {}", e);
                    Vec::new()
                }
            },
            _ => Vec::new(),
        };

        merge_transactions(local, remote)
    }

    pub async fn find(&self, reference: &str) -> Option<Transaction> {
        self.list()
            .await
            .into_iter()
            .find(|tx| tx.reference == reference)
    }

    async fn read_local(&self) -> Result<Vec<Transaction>, LedgerError> {
        let Some(raw) = self.local.get_item(LEDGER_KEY).await? else {
            return Ok(Vec::new());
        };

        match serde_json::from_str::<Vec<Transaction>>(&raw) {
            Ok(entries) => Ok(entries),
            Err(e) => {
                tracing::warn!("Local ledger is unreadable, treating it as empty: {}", e);
                Ok(Vec::new())
            }
        }
    }
}

/// Combines both sources into one entry per reference. Within a source the
/// first occurrence wins; across sources the remote copy wins, except that a
/// remote `pending` never displaces a local terminal entry (the terminal
/// write failed to mirror). The result is ordered by `created_at`
/// descending, then reference ascending.
pub fn merge_transactions(local: Vec<Transaction>, remote: Vec<Transaction>) -> Vec<Transaction> {
    let mut by_reference: HashMap<String, Transaction> = HashMap::new();

    for tx in local {
        by_reference.entry(tx.reference.clone()).or_insert(tx);
    }

    let mut seen_remote = HashSet::new();
    for tx in remote {
        if !seen_remote.insert(tx.reference.clone()) {
            continue;
        }
        let stale = by_reference
            .get(&tx.reference)
            .is_some_and(|local| local.status.is_terminal() && !tx.status.is_terminal());
        if stale {
            tracing::debug!(reference = %tx.reference, "Remote ledger entry is behind local, keeping local copy");
            continue;
        }
        by_reference.insert(tx.reference.clone(), tx);
    }

    let mut merged: Vec<Transaction> = by_reference.into_values().collect();
    merged.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| a.reference.cmp(&b.reference))
    });
    merged
}
