//! Domain types shared by the purchase orchestrator, the ledger and the
//! HTTP surface. Nothing in here performs I/O.

pub mod purchase;
pub mod transaction;
pub mod wallet;

pub use purchase::{Network, Product, PurchaseKind, PurchaseRequest, ValidatedPurchase};
pub use transaction::{
    Transaction, TransactionInput, TransactionStatus, TransactionType, CURRENT_SCHEMA_VERSION,
    REFUND_PREFIX,
};
pub use wallet::{SubBalance, WalletSnapshot};
