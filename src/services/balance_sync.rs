//! Background wallet re-sync after each purchase attempt.

use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::domain::WalletSnapshot;
use crate::ports::BalanceService;

/// Publishes the most recent wallet snapshot to any number of observers.
#[derive(Clone)]
pub struct BalanceSync {
    balances: Arc<dyn BalanceService>,
    sender: Arc<watch::Sender<Option<WalletSnapshot>>>,
}

impl BalanceSync {
    pub fn new(balances: Arc<dyn BalanceService>) -> Self {
        let (sender, _) = watch::channel(None);
        Self {
            balances,
            sender: Arc::new(sender),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<WalletSnapshot>> {
        self.sender.subscribe()
    }

    pub fn latest(&self) -> Option<WalletSnapshot> {
        self.sender.borrow().clone()
    }

    /// Spawns a detached refresh. Callers are not expected to await the
    /// handle; failures are only logged.
    pub fn trigger(&self) -> JoinHandle<()> {
        let balances = Arc::clone(&self.balances);
        let sender = Arc::clone(&self.sender);

        tokio::spawn(async move {
            match balances.fetch_snapshot().await {
                Ok(snapshot) => {
                    tracing::debug!(general_balance = %snapshot.general_balance, "Wallet balance re-synced");
                    sender.send_replace(Some(snapshot));
                }
                Err(e) => tracing::warn!("Wallet balance re-sync failed: {}", e),
            }
        })
    }
}
