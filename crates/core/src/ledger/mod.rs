//! Append-only budget ledger.
//!
//! This module implements the ledger store:
//! - Immutable entries with type-constrained directions
//! - Atomic batch appends
//! - Filtered queries by document, key, scope and type
//! - Reserved, consumed and allocation-adjustment totals
//! - Per-scope locks for check-then-append sequences

pub mod entry;
pub mod error;
pub mod lock;
pub mod memory;
pub mod store;

pub use entry::{Direction, DocumentRef, EntryDraft, EntryType, LedgerEntry};
pub use error::LedgerError;
pub use lock::{LockTable, LockTimeout};
pub use memory::MemoryLedger;
pub use store::{
    ALLOCATION_ENTRY_TYPES, CONSUMED_ENTRY_TYPES, LedgerQuery, LedgerStore, RESERVED_ENTRY_TYPES,
    validate_batch,
};
