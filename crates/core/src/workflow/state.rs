//! Per-document state derived from ledger history.
//!
//! No lifecycle field is stored anywhere: the state of a source document is
//! whatever its RESERVATION, RELEASE, CONSUMPTION and REVERSAL rows add up to.

use std::collections::BTreeMap;

use rust_decimal::Decimal;

use super::types::{DocumentState, KeyPosition};
use crate::dimension::DimensionKey;
use crate::ledger::{DocumentRef, EntryType, LedgerEntry};

/// Net positions per key, ordered by key.
pub(crate) fn positions(entries: &[LedgerEntry]) -> BTreeMap<DimensionKey, KeyPosition> {
    let mut positions: BTreeMap<DimensionKey, KeyPosition> = BTreeMap::new();
    for entry in entries {
        let position = positions
            .entry(entry.dimension_key().clone())
            .or_insert_with(|| KeyPosition {
                dimension_key: entry.dimension_key().clone(),
                reserved: Decimal::ZERO,
                consumed: Decimal::ZERO,
            });
        match entry.entry_type() {
            EntryType::Reservation | EntryType::Release => position.reserved += entry.outflow(),
            EntryType::Consumption | EntryType::Reversal => position.consumed -= entry.outflow(),
            EntryType::Reclass | EntryType::Supplement => {}
        }
    }
    positions
}

/// Lifecycle state implied by a document's positions.
pub(crate) fn derive_state<'a>(positions: impl IntoIterator<Item = &'a KeyPosition>) -> DocumentState {
    let mut consumed = false;
    for position in positions {
        if position.reserved > Decimal::ZERO {
            return DocumentState::Reserved;
        }
        consumed |= position.consumed > Decimal::ZERO;
    }
    if consumed {
        DocumentState::Consumed
    } else {
        DocumentState::Unlocked
    }
}

/// Keys with an un-released reservation and the amount still held.
pub(crate) fn outstanding_reserved(entries: &[LedgerEntry]) -> Vec<(DimensionKey, Decimal)> {
    positions(entries)
        .into_values()
        .filter(|p| p.reserved > Decimal::ZERO)
        .map(|p| (p.dimension_key, p.reserved))
        .collect()
}

/// Un-reversed consumption caused by one secondary document, per key.
pub(crate) fn outstanding_consumed_against(
    entries: &[LedgerEntry],
    secondary: &DocumentRef,
) -> Vec<(DimensionKey, Decimal)> {
    let against: Vec<LedgerEntry> = entries
        .iter()
        .filter(|e| e.against() == Some(secondary))
        .cloned()
        .collect();
    positions(&against)
        .into_values()
        .filter(|p| p.consumed > Decimal::ZERO)
        .map(|p| (p.dimension_key, p.consumed))
        .collect()
}

/// RESERVATION rows of the most recent batch that reserved anything.
///
/// These are the slices a restored hold re-posts.
pub(crate) fn last_reservation(entries: &[LedgerEntry]) -> Vec<(DimensionKey, Decimal)> {
    let Some(batch_id) = entries
        .iter()
        .rev()
        .find(|e| e.entry_type() == EntryType::Reservation)
        .map(LedgerEntry::batch_id)
    else {
        return Vec::new();
    };
    entries
        .iter()
        .filter(|e| e.batch_id() == batch_id && e.entry_type() == EntryType::Reservation)
        .map(|e| (e.dimension_key().clone(), e.amount()))
        .collect()
}
