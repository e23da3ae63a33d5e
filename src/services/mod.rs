pub mod balance_sync;
pub mod funding;
pub mod in_flight;
pub mod ledger;
pub mod purchase;
pub mod reference;

pub use balance_sync::BalanceSync;
pub use funding::{FundingError, FundingService, FundingSession};
pub use in_flight::{InFlightGuard, InFlightPermit};
pub use ledger::{merge_transactions, LedgerStore, LEDGER_KEY};
pub use purchase::{ErrorKind, PurchaseError, PurchaseOrchestrator, PurchaseReceipt, PurchaseResult};
