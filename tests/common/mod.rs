#![allow(dead_code)]

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use topup_core::adapters::MemoryKeyValueStore;
use topup_core::domain::{Network, PurchaseKind, PurchaseRequest, Transaction, WalletSnapshot};
use topup_core::ports::{
    BalanceService, ChargeError, DataPlan, GatewayError, KeyValueStore, LedgerError,
    PaymentAuthorization,
    PaymentGateway, PaymentVerification, RemoteLedger, RepositoryError, RepositoryResult,
    StaticSession, VendOutcome, VendorGateway,
};
use topup_core::services::{BalanceSync, LedgerStore, PurchaseOrchestrator};

/// Wallet whose balance actually moves when charged.
pub struct FakeWallet {
    balance: Mutex<BigDecimal>,
    pub fail_fetch: AtomicBool,
    pub fail_charge: AtomicBool,
    pub fetch_calls: AtomicUsize,
    pub charge_calls: AtomicUsize,
}

impl FakeWallet {
    pub fn with_balance(balance: i64) -> Self {
        Self {
            balance: Mutex::new(BigDecimal::from(balance)),
            fail_fetch: AtomicBool::new(false),
            fail_charge: AtomicBool::new(false),
            fetch_calls: AtomicUsize::new(0),
            charge_calls: AtomicUsize::new(0),
        }
    }

    pub fn balance(&self) -> BigDecimal {
        self.balance.lock().unwrap().clone()
    }
}

#[async_trait]
impl BalanceService for FakeWallet {
    async fn fetch_snapshot(&self) -> Result<WalletSnapshot, GatewayError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_fetch.load(Ordering::SeqCst) {
            return Err(GatewayError::Status(503));
        }
        Ok(WalletSnapshot::new(self.balance()))
    }

    async fn charge(&self, amount: &BigDecimal) -> Result<BigDecimal, ChargeError> {
        self.charge_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_charge.load(Ordering::SeqCst) {
            return Err(ChargeError::Unavailable(GatewayError::Status(502)));
        }

        let mut balance = self.balance.lock().unwrap();
        if *balance < *amount {
            return Err(ChargeError::Insufficient {
                required: amount.clone(),
                available: balance.clone(),
            });
        }
        *balance = &*balance - amount;
        Ok(balance.clone())
    }
}

#[derive(Debug, Clone)]
pub enum VendorBehavior {
    Fulfill(Option<String>),
    Reject(Option<String>),
    TransportError,
}

#[derive(Debug, Clone, PartialEq)]
pub enum VendorCall {
    Airtime {
        network: Network,
        phone: String,
        amount: BigDecimal,
    },
    Data {
        phone: String,
        plan_code: String,
    },
}

pub struct FakeVendor {
    behavior: Mutex<VendorBehavior>,
    delay: Option<Duration>,
    pub calls: Mutex<Vec<VendorCall>>,
}

impl FakeVendor {
    pub fn new(behavior: VendorBehavior) -> Self {
        Self {
            behavior: Mutex::new(behavior),
            delay: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn slow(behavior: VendorBehavior, delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::new(behavior)
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    async fn respond(&self, call: VendorCall) -> Result<VendOutcome, GatewayError> {
        self.calls.lock().unwrap().push(call);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let behavior = self.behavior.lock().unwrap().clone();
        match behavior {
            VendorBehavior::Fulfill(reference) => Ok(VendOutcome::Fulfilled {
                reference,
                message: Some("Successful".to_string()),
            }),
            VendorBehavior::Reject(reason) => Ok(VendOutcome::Rejected { reason }),
            VendorBehavior::TransportError => {
                Err(GatewayError::InvalidResponse("connection reset".to_string()))
            }
        }
    }
}

#[async_trait]
impl VendorGateway for FakeVendor {
    async fn fulfill_airtime(
        &self,
        network: Network,
        phone: &str,
        amount: &BigDecimal,
    ) -> Result<VendOutcome, GatewayError> {
        self.respond(VendorCall::Airtime {
            network,
            phone: phone.to_string(),
            amount: amount.clone(),
        })
        .await
    }

    async fn fulfill_data(&self, phone: &str, plan_code: &str) -> Result<VendOutcome, GatewayError> {
        self.respond(VendorCall::Data {
            phone: phone.to_string(),
            plan_code: plan_code.to_string(),
        })
        .await
    }

    async fn list_plans(&self, _network: Network) -> Result<Vec<DataPlan>, GatewayError> {
        Ok(vec![DataPlan {
            code: "MTN-1GB".to_string(),
            name: "1GB Monthly".to_string(),
            price: BigDecimal::from(500),
            validity: Some("30 days".to_string()),
        }])
    }
}

#[derive(Default)]
pub struct FakeRemoteLedger {
    pub entries: Mutex<Vec<Transaction>>,
    pub unavailable: AtomicBool,
    /// Upserts accepted before every further write is refused.
    accepted_writes: Option<usize>,
    pub upsert_calls: AtomicUsize,
}

impl FakeRemoteLedger {
    pub fn seeded(entries: Vec<Transaction>) -> Self {
        Self {
            entries: Mutex::new(entries),
            ..Self::default()
        }
    }

    pub fn failing_after(accepted_writes: usize) -> Self {
        Self {
            accepted_writes: Some(accepted_writes),
            ..Self::default()
        }
    }
}

#[async_trait]
impl RemoteLedger for FakeRemoteLedger {
    async fn upsert(&self, tx: &Transaction) -> RepositoryResult<()> {
        let call = self.upsert_calls.fetch_add(1, Ordering::SeqCst);
        if self.unavailable.load(Ordering::SeqCst)
            || self.accepted_writes.is_some_and(|limit| call >= limit)
        {
            return Err(RepositoryError::Corrupt("remote down".to_string()));
        }
        let mut entries = self.entries.lock().unwrap();
        entries.retain(|e| e.reference != tx.reference);
        entries.push(tx.clone());
        Ok(())
    }

    async fn list_for_owner(&self, owner_id: &str) -> RepositoryResult<Vec<Transaction>> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(RepositoryError::Corrupt("remote down".to_string()));
        }
        Ok(self
            .entries
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.owner_id.as_deref() == Some(owner_id))
            .cloned()
            .collect())
    }
}

pub struct FakePaymentGateway {
    pub verify_status: Mutex<String>,
    pub verify_amount: Mutex<Option<i64>>,
    pub initialized: Mutex<Vec<(String, i64, String)>>,
    pub verify_calls: AtomicUsize,
}

impl FakePaymentGateway {
    pub fn new(verify_status: &str) -> Self {
        Self {
            verify_status: Mutex::new(verify_status.to_string()),
            verify_amount: Mutex::new(None),
            initialized: Mutex::new(Vec::new()),
            verify_calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl PaymentGateway for FakePaymentGateway {
    async fn initialize(
        &self,
        email: &str,
        amount_minor: i64,
        reference: &str,
    ) -> Result<PaymentAuthorization, GatewayError> {
        self.initialized.lock().unwrap().push((
            email.to_string(),
            amount_minor,
            reference.to_string(),
        ));
        *self.verify_amount.lock().unwrap() = Some(amount_minor);
        Ok(PaymentAuthorization {
            authorization_url: format!("https://checkout.example.com/{}", reference),
            access_code: Some("access".to_string()),
            reference: reference.to_string(),
        })
    }

    async fn verify(&self, reference: &str) -> Result<PaymentVerification, GatewayError> {
        self.verify_calls.fetch_add(1, Ordering::SeqCst);
        Ok(PaymentVerification {
            reference: reference.to_string(),
            status: self.verify_status.lock().unwrap().clone(),
            amount: self.verify_amount.lock().unwrap().unwrap_or_default(),
            channel: Some("card".to_string()),
        })
    }
}

/// Local store that can be read but refuses every write.
#[derive(Default)]
pub struct ReadOnlyKeyValueStore;

#[async_trait]
impl KeyValueStore for ReadOnlyKeyValueStore {
    async fn get_item(&self, _key: &str) -> Result<Option<String>, LedgerError> {
        Ok(None)
    }

    async fn set_item(&self, _key: &str, _value: &str) -> Result<(), LedgerError> {
        Err(LedgerError::Io(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "read-only file system",
        )))
    }
}

pub fn memory_ledger() -> LedgerStore {
    LedgerStore::new(
        Arc::new(MemoryKeyValueStore::new()),
        Arc::new(StaticSession::anonymous()),
    )
}

pub fn ledger_over(local: Arc<dyn KeyValueStore>, owner: Option<&str>) -> LedgerStore {
    let session = match owner {
        Some(owner) => StaticSession::owned_by(owner),
        None => StaticSession::anonymous(),
    };
    LedgerStore::new(local, Arc::new(session))
}

pub struct Harness {
    pub orchestrator: PurchaseOrchestrator,
    pub ledger: LedgerStore,
    pub wallet: Arc<FakeWallet>,
    pub vendor: Arc<FakeVendor>,
}

pub fn harness(balance: i64, vendor: FakeVendor) -> Harness {
    harness_with_ledger(balance, vendor, memory_ledger())
}

pub fn harness_with_ledger(balance: i64, vendor: FakeVendor, ledger: LedgerStore) -> Harness {
    let wallet = Arc::new(FakeWallet::with_balance(balance));
    let vendor = Arc::new(vendor);
    let balance_sync = BalanceSync::new(wallet.clone());
    let orchestrator =
        PurchaseOrchestrator::new(wallet.clone(), vendor.clone(), ledger.clone(), balance_sync);

    Harness {
        orchestrator,
        ledger,
        wallet,
        vendor,
    }
}

pub fn airtime(cost: i64) -> PurchaseRequest {
    PurchaseRequest {
        kind: PurchaseKind::Airtime,
        network: "MTN".to_string(),
        recipient_phone: "08031234567".to_string(),
        cost: BigDecimal::from(cost),
        display_name: format!("MTN Airtime {}", cost),
        plan_code: None,
    }
}

pub fn data(cost: i64, plan_code: Option<&str>) -> PurchaseRequest {
    PurchaseRequest {
        kind: PurchaseKind::Data,
        network: "airtel".to_string(),
        recipient_phone: "08021234567".to_string(),
        cost: BigDecimal::from(cost),
        display_name: "Airtel 2GB".to_string(),
        plan_code: plan_code.map(str::to_string),
    }
}
