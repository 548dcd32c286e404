/// Durable per-identity daily counters
///
/// This module provides:
/// - The in-memory ledger and its entries
/// - A file store that loads and atomically replaces full snapshots

pub mod store;
pub mod types;

pub use store::LedgerStore;
pub use types::{Ledger, LedgerEntry, LEDGER_SCHEMA_VERSION};
