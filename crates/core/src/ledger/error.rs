//! Ledger error types for batch validation.
//!
//! A batch that fails any of these checks is rejected as a whole; the
//! ledger never holds part of a batch.

use rust_decimal::Decimal;
use thiserror::Error;

use super::entry::{Direction, EntryType};

/// Errors that can occur while appending to the ledger.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// A batch must contain at least one entry.
    #[error("Ledger batch must contain at least one entry")]
    EmptyBatch,

    /// Entry amount cannot be negative.
    #[error("Entry amount cannot be negative: {0}")]
    NegativeAmount(Decimal),

    /// The direction does not match the entry type.
    #[error("{entry_type} entries cannot be posted with direction {direction:?}")]
    InvalidDirection {
        /// The entry type.
        entry_type: EntryType,
        /// The rejected direction.
        direction: Direction,
    },

    /// RECLASS entries in a batch do not net to zero.
    #[error("Reclass entries are unmatched. Out: {out}, In: {inbound}")]
    UnmatchedReclass {
        /// Total RECLASS OUT amount.
        out: Decimal,
        /// Total RECLASS IN amount.
        inbound: Decimal,
    },
}

impl LedgerError {
    /// Returns the error code for collaborator responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::EmptyBatch => "EMPTY_BATCH",
            Self::NegativeAmount(_) => "NEGATIVE_AMOUNT",
            Self::InvalidDirection { .. } => "INVALID_DIRECTION",
            Self::UnmatchedReclass { .. } => "UNMATCHED_RECLASS",
        }
    }
}
