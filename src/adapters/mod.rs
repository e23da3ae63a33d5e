pub mod key_value;
pub mod postgres_ledger_repository;

pub use key_value::{FileKeyValueStore, MemoryKeyValueStore};
pub use postgres_ledger_repository::PostgresLedgerRepository;
