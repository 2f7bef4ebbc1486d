//! Ledger storage contract and backends for the chama runtime.

mod error;
mod memory;
mod record;
mod sqlite;
mod store;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryLedgerStore;
pub use record::{LedgerRecord, RecordKind};
pub use sqlite::SqliteLedgerStore;
pub use store::LedgerStore;
