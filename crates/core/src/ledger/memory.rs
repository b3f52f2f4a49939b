//! In-memory ledger store.

use std::time::Duration;

use chrono::Utc;
use ledgerlock_shared::BatchId;
use parking_lot::RwLock;
use tracing::debug;

use super::entry::{EntryDraft, LedgerEntry};
use super::error::LedgerError;
use super::lock::LockTable;
use super::store::{LedgerQuery, LedgerStore, validate_batch};
use crate::dimension::BudgetScope;

/// Default time to wait for a scope lock.
const DEFAULT_LOCK_TIMEOUT_MS: u64 = 2000;

/// Append-only ledger held in process memory.
///
/// Readers see a consistent snapshot: a batch is pushed under one write lock.
pub struct MemoryLedger {
    entries: RwLock<Vec<LedgerEntry>>,
    scope_locks: LockTable<BudgetScope>,
}

impl MemoryLedger {
    /// Creates an empty ledger whose scope locks time out after `lock_timeout`.
    #[must_use]
    pub fn new(lock_timeout: Duration) -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
            scope_locks: LockTable::new(lock_timeout),
        }
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns true if nothing was ever appended.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Snapshot of every entry in append order.
    #[must_use]
    pub fn entries(&self) -> Vec<LedgerEntry> {
        self.entries.read().clone()
    }
}

impl Default for MemoryLedger {
    fn default() -> Self {
        Self::new(Duration::from_millis(DEFAULT_LOCK_TIMEOUT_MS))
    }
}

impl LedgerStore for MemoryLedger {
    fn append(&self, drafts: Vec<EntryDraft>) -> Result<Vec<LedgerEntry>, LedgerError> {
        validate_batch(&drafts)?;

        let batch_id = BatchId::new();
        let created_at = Utc::now();
        let minted: Vec<LedgerEntry> = drafts
            .into_iter()
            .map(|draft| LedgerEntry::mint(draft, batch_id, created_at))
            .collect();

        self.entries.write().extend(minted.iter().cloned());
        debug!(%batch_id, count = minted.len(), "Ledger batch appended");
        Ok(minted)
    }

    fn query(&self, query: &LedgerQuery) -> Vec<LedgerEntry> {
        self.entries
            .read()
            .iter()
            .filter(|entry| query.matches(entry))
            .cloned()
            .collect()
    }

    fn scope_locks(&self) -> &LockTable<BudgetScope> {
        &self.scope_locks
    }
}
