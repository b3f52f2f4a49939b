//! Ledger store abstraction and the derived totals every store shares.

use rust_decimal::Decimal;

use super::entry::{Direction, DocumentRef, EntryDraft, EntryType, LedgerEntry};
use super::error::LedgerError;
use super::lock::LockTable;
use crate::dimension::{BudgetScope, DimensionKey};

/// The only entry types that make up the reserved total.
///
/// CONSUMPTION and REVERSAL are excluded: consumed spend is already part of
/// the posted actuals, and counting it here would subtract it twice.
pub const RESERVED_ENTRY_TYPES: [EntryType; 2] = [EntryType::Reservation, EntryType::Release];

/// Entry types that adjust the allocated envelope.
pub const ALLOCATION_ENTRY_TYPES: [EntryType; 2] = [EntryType::Supplement, EntryType::Reclass];

/// Entry types that record spend recognized through the engine.
pub const CONSUMED_ENTRY_TYPES: [EntryType; 2] = [EntryType::Consumption, EntryType::Reversal];

/// Filter over ledger entries. Empty fields match everything.
#[derive(Debug, Clone, Default)]
pub struct LedgerQuery {
    /// Originating source document.
    pub source: Option<DocumentRef>,
    /// Secondary document.
    pub against: Option<DocumentRef>,
    /// Exact dimension key.
    pub dimension_key: Option<DimensionKey>,
    /// Control scope containing the entry's key.
    pub scope: Option<BudgetScope>,
    /// Accepted entry types.
    pub entry_types: Vec<EntryType>,
}

impl LedgerQuery {
    /// Creates a query matching every entry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts to entries of a source document.
    #[must_use]
    pub fn for_source(mut self, document: DocumentRef) -> Self {
        self.source = Some(document);
        self
    }

    /// Restricts to entries caused by a secondary document.
    #[must_use]
    pub fn against(mut self, document: DocumentRef) -> Self {
        self.against = Some(document);
        self
    }

    /// Restricts to one dimension key.
    #[must_use]
    pub fn at_key(mut self, key: DimensionKey) -> Self {
        self.dimension_key = Some(key);
        self
    }

    /// Restricts to keys inside a control scope.
    #[must_use]
    pub fn in_scope(mut self, scope: BudgetScope) -> Self {
        self.scope = Some(scope);
        self
    }

    /// Restricts to the given entry types.
    #[must_use]
    pub fn of_types(mut self, entry_types: &[EntryType]) -> Self {
        self.entry_types = entry_types.to_vec();
        self
    }

    /// Returns true if the entry passes every filter.
    #[must_use]
    pub fn matches(&self, entry: &LedgerEntry) -> bool {
        self.source.as_ref().is_none_or(|s| s == entry.source())
            && self
                .against
                .as_ref()
                .is_none_or(|a| Some(a) == entry.against())
            && self
                .dimension_key
                .as_ref()
                .is_none_or(|k| k == entry.dimension_key())
            && self
                .scope
                .as_ref()
                .is_none_or(|s| s.contains(entry.dimension_key()))
            && (self.entry_types.is_empty() || self.entry_types.contains(&entry.entry_type()))
    }
}

/// Append-only storage of budget ledger entries.
///
/// `append` is the only mutation. Implementations must make a batch visible
/// to readers all at once or not at all.
pub trait LedgerStore: Send + Sync {
    /// Appends a batch atomically and returns the minted entries.
    fn append(&self, drafts: Vec<EntryDraft>) -> Result<Vec<LedgerEntry>, LedgerError>;

    /// Returns the entries matching `query`, in append order.
    fn query(&self, query: &LedgerQuery) -> Vec<LedgerEntry>;

    /// Per-scope locks guarding check-then-append sequences.
    fn scope_locks(&self) -> &LockTable<BudgetScope>;

    /// Net amount held in a scope: RESERVATION OUT minus RELEASE IN.
    ///
    /// Reads RESERVATION and RELEASE rows only.
    fn reserved_total(&self, scope: &BudgetScope) -> Decimal {
        let rows = self.query(
            &LedgerQuery::new()
                .in_scope(scope.clone())
                .of_types(&RESERVED_ENTRY_TYPES),
        );
        rows.iter().map(LedgerEntry::outflow).sum()
    }

    /// Net budget added to a scope by SUPPLEMENT and RECLASS rows.
    fn allocation_adjustment(&self, scope: &BudgetScope) -> Decimal {
        let rows = self.query(
            &LedgerQuery::new()
                .in_scope(scope.clone())
                .of_types(&ALLOCATION_ENTRY_TYPES),
        );
        rows.iter().map(|e| -e.outflow()).sum()
    }

    /// Net spend recognized in a scope: CONSUMPTION minus REVERSAL.
    fn consumed_total(&self, scope: &BudgetScope) -> Decimal {
        let rows = self.query(
            &LedgerQuery::new()
                .in_scope(scope.clone())
                .of_types(&CONSUMED_ENTRY_TYPES),
        );
        rows.iter().map(|e| -e.outflow()).sum()
    }
}

/// Validates a batch before any of it is written.
///
/// # Errors
///
/// Fails on an empty batch, on any invalid draft, or when RECLASS
/// OUT and IN amounts in the batch differ.
pub fn validate_batch(drafts: &[EntryDraft]) -> Result<(), LedgerError> {
    if drafts.is_empty() {
        return Err(LedgerError::EmptyBatch);
    }
    for draft in drafts {
        draft.validate()?;
    }

    let (out, inbound) = drafts
        .iter()
        .filter(|d| d.entry_type == EntryType::Reclass)
        .fold((Decimal::ZERO, Decimal::ZERO), |(out, inbound), d| match d.direction {
            Direction::Out => (out + d.amount, inbound),
            Direction::In => (out, inbound + d.amount),
        });
    if out != inbound {
        return Err(LedgerError::UnmatchedReclass { out, inbound });
    }
    Ok(())
}
