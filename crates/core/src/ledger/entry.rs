//! Budget ledger entry domain types.

use chrono::{DateTime, NaiveDate, Utc};
use ledgerlock_shared::{BatchId, LedgerEntryId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::LedgerError;
use crate::dimension::DimensionKey;

/// Reference to an external business document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DocumentRef {
    /// Document type (e.g., "Expense Claim", "Purchase Invoice").
    pub doctype: String,
    /// Document name or number.
    pub name: String,
}

impl DocumentRef {
    /// Creates a document reference.
    #[must_use]
    pub fn new(doctype: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            doctype: doctype.into(),
            name: name.into(),
        }
    }
}

impl std::fmt::Display for DocumentRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.doctype, self.name)
    }
}

/// Kind of budget movement an entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntryType {
    /// Hold placed before spend occurs.
    Reservation,
    /// Recognition of actual spend.
    Consumption,
    /// Removal of a hold without spend.
    Release,
    /// Undo of a consumption.
    Reversal,
    /// Budget moved between buckets, always posted in matched pairs.
    Reclass,
    /// Budget added to a bucket.
    Supplement,
}

impl EntryType {
    /// The direction this type must be posted with, or `None` if either is allowed.
    #[must_use]
    pub const fn fixed_direction(self) -> Option<Direction> {
        match self {
            Self::Reservation | Self::Reversal => Some(Direction::Out),
            Self::Release | Self::Consumption | Self::Supplement => Some(Direction::In),
            Self::Reclass => None,
        }
    }

    /// Returns the uppercase label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Reservation => "RESERVATION",
            Self::Consumption => "CONSUMPTION",
            Self::Release => "RELEASE",
            Self::Reversal => "REVERSAL",
            Self::Reclass => "RECLASS",
            Self::Supplement => "SUPPLEMENT",
        }
    }
}

impl std::fmt::Display for EntryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Direction of a budget movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    /// Budget leaves the bucket's free balance.
    Out,
    /// Budget returns to (or is added to) the bucket's free balance.
    In,
}

/// An entry that has not been appended yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryDraft {
    /// Bucket the entry is posted to.
    pub dimension_key: DimensionKey,
    /// Kind of movement.
    pub entry_type: EntryType,
    /// Direction of the movement.
    pub direction: Direction,
    /// Non-negative amount.
    pub amount: Decimal,
    /// Originating source document.
    pub source: DocumentRef,
    /// Secondary document (invoice) the movement was caused by, if any.
    pub against: Option<DocumentRef>,
    /// Posting date of the movement.
    pub posting_date: NaiveDate,
}

impl EntryDraft {
    /// Creates a draft with the direction implied by `entry_type`.
    ///
    /// RECLASS drafts must be built with [`EntryDraft::reclass`].
    #[must_use]
    pub fn new(
        dimension_key: DimensionKey,
        entry_type: EntryType,
        amount: Decimal,
        source: DocumentRef,
        posting_date: NaiveDate,
    ) -> Self {
        Self {
            dimension_key,
            entry_type,
            direction: entry_type.fixed_direction().unwrap_or(Direction::Out),
            amount,
            source,
            against: None,
            posting_date,
        }
    }

    /// Creates one half of a RECLASS pair.
    #[must_use]
    pub fn reclass(
        dimension_key: DimensionKey,
        direction: Direction,
        amount: Decimal,
        source: DocumentRef,
        posting_date: NaiveDate,
    ) -> Self {
        Self {
            dimension_key,
            entry_type: EntryType::Reclass,
            direction,
            amount,
            source,
            against: None,
            posting_date,
        }
    }

    /// Tags the draft with the secondary document that caused it.
    #[must_use]
    pub fn against(mut self, document: DocumentRef) -> Self {
        self.against = Some(document);
        self
    }

    /// Checks the amount and the direction constraint of the entry type.
    pub fn validate(&self) -> Result<(), LedgerError> {
        if self.amount.is_sign_negative() && !self.amount.is_zero() {
            return Err(LedgerError::NegativeAmount(self.amount));
        }
        if let Some(expected) = self.entry_type.fixed_direction()
            && expected != self.direction
        {
            return Err(LedgerError::InvalidDirection {
                entry_type: self.entry_type,
                direction: self.direction,
            });
        }
        Ok(())
    }
}

/// An immutable ledger entry.
///
/// Only a ledger store mints entries; fields are read through accessors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    id: LedgerEntryId,
    batch_id: BatchId,
    dimension_key: DimensionKey,
    entry_type: EntryType,
    direction: Direction,
    amount: Decimal,
    source: DocumentRef,
    against: Option<DocumentRef>,
    posting_date: NaiveDate,
    created_at: DateTime<Utc>,
}

impl LedgerEntry {
    /// Mints an entry from a validated draft.
    pub(crate) fn mint(draft: EntryDraft, batch_id: BatchId, created_at: DateTime<Utc>) -> Self {
        Self {
            id: LedgerEntryId::new(),
            batch_id,
            dimension_key: draft.dimension_key,
            entry_type: draft.entry_type,
            direction: draft.direction,
            amount: draft.amount,
            source: draft.source,
            against: draft.against,
            posting_date: draft.posting_date,
            created_at,
        }
    }

    /// Entry ID.
    #[must_use]
    pub fn id(&self) -> LedgerEntryId {
        self.id
    }

    /// Batch the entry was appended in.
    #[must_use]
    pub fn batch_id(&self) -> BatchId {
        self.batch_id
    }

    /// Bucket the entry is posted to.
    #[must_use]
    pub fn dimension_key(&self) -> &DimensionKey {
        &self.dimension_key
    }

    /// Kind of movement.
    #[must_use]
    pub fn entry_type(&self) -> EntryType {
        self.entry_type
    }

    /// Direction of the movement.
    #[must_use]
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Non-negative amount.
    #[must_use]
    pub fn amount(&self) -> Decimal {
        self.amount
    }

    /// Originating source document.
    #[must_use]
    pub fn source(&self) -> &DocumentRef {
        &self.source
    }

    /// Secondary document, if any.
    #[must_use]
    pub fn against(&self) -> Option<&DocumentRef> {
        self.against.as_ref()
    }

    /// Posting date.
    #[must_use]
    pub fn posting_date(&self) -> NaiveDate {
        self.posting_date
    }

    /// When the entry was appended.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Amount signed so that OUT is positive and IN is negative.
    #[must_use]
    pub fn outflow(&self) -> Decimal {
        match self.direction {
            Direction::Out => self.amount,
            Direction::In => -self.amount,
        }
    }
}
