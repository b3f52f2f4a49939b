//! Workflow input and output types.
//!
//! Documents arrive as plain values. The controller never mutates them;
//! it returns a [`StatusUpdate`] for the caller to write back.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::allocation::{AllocationDocument, AmountLine};
use crate::dimension::{DimensionKey, DimensionSource};
use crate::error::Shortfall;
use crate::ledger::{DocumentRef, LedgerEntry};

/// A source document that holds budget (e.g. an expense claim).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDocument {
    /// Document reference.
    pub doc_ref: DocumentRef,
    /// Company, when stored on the document.
    #[serde(default)]
    pub company: Option<String>,
    /// Fiscal period, when stored on the document.
    #[serde(default)]
    pub fiscal_period: Option<String>,
    /// Cost center charged in direct mode.
    pub cost_center: String,
    /// Project.
    #[serde(default)]
    pub project: Option<String>,
    /// Branch.
    #[serde(default)]
    pub branch: Option<String>,
    /// Posting date.
    pub posting_date: NaiveDate,
    /// Current external workflow state name.
    pub workflow_state: String,
    /// Amount breakdown by account.
    pub lines: Vec<AmountLine>,
    /// Allocation document for ratio mode.
    #[serde(default)]
    pub allocation: Option<AllocationDocument>,
}

impl SourceDocument {
    /// Document-level dimension fields. The account is filled per line.
    #[must_use]
    pub fn dimension_source(&self) -> DimensionSource<'_> {
        self.dimension_source_at(self.posting_date)
    }

    /// Document-level dimension fields dated `posting_date`.
    #[must_use]
    pub fn dimension_source_at(&self, posting_date: NaiveDate) -> DimensionSource<'_> {
        DimensionSource {
            company: self.company.as_deref(),
            fiscal_period: self.fiscal_period.as_deref(),
            cost_center: &self.cost_center,
            account: "",
            project: self.project.as_deref(),
            branch: self.branch.as_deref(),
            posting_date,
        }
    }

    /// Sum of line amounts.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.lines.iter().map(|l| l.amount).sum()
    }
}

/// A document that recognizes spend against a source (e.g. an invoice).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecondaryDocument {
    /// Document reference.
    pub doc_ref: DocumentRef,
    /// Posting date.
    pub posting_date: NaiveDate,
    /// Amount breakdown by account.
    pub lines: Vec<AmountLine>,
}

/// The user acting on a document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// User name.
    pub user: String,
    /// Roles held.
    #[serde(default)]
    pub roles: Vec<String>,
}

impl Principal {
    /// Creates a principal.
    #[must_use]
    pub fn new(user: impl Into<String>, roles: &[&str]) -> Self {
        Self {
            user: user.into(),
            roles: roles.iter().map(|r| (*r).to_string()).collect(),
        }
    }

    /// Returns true if the principal holds `role`.
    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}

/// Per-call context supplied by the lifecycle collaborator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventContext {
    /// Acting principal.
    pub principal: Principal,
    /// Fiscal period to use when the document carries none.
    #[serde(default)]
    pub default_fiscal_period: Option<String>,
}

impl EventContext {
    /// Context for `principal` with no period default.
    #[must_use]
    pub fn acting_as(principal: Principal) -> Self {
        Self {
            principal,
            default_fiscal_period: None,
        }
    }
}

/// Budget status written back onto the source document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LockStatus {
    /// Budget is held.
    Locked,
    /// Budget is held beyond availability under the overrun policy.
    #[serde(rename = "Overrun Allowed")]
    OverrunAllowed,
    /// Spend has been recognized.
    Consumed,
    /// The hold was removed.
    Released,
}

impl LockStatus {
    /// Returns the label shown on the document.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Locked => "Locked",
            Self::OverrunAllowed => "Overrun Allowed",
            Self::Consumed => "Consumed",
            Self::Released => "Released",
        }
    }
}

impl std::fmt::Display for LockStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of an applied operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusUpdate {
    /// The source document.
    pub document: DocumentRef,
    /// New status for the document.
    pub status: LockStatus,
    /// Entries appended by the operation.
    pub entries: Vec<LedgerEntry>,
    /// Scopes that went over budget under the overrun policy.
    pub overruns: Vec<Shortfall>,
}

/// Why an event was ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Budget locking is switched off.
    Disabled,
    /// The document is not in the state that triggers reservation.
    NotTargetState,
    /// There is no outstanding reservation to release.
    NothingReserved,
    /// The document amount is zero.
    ZeroAmount,
}

/// What a lifecycle call did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    /// Entries were appended.
    Applied(StatusUpdate),
    /// The operation already happened; nothing was appended.
    Duplicate,
    /// The event does not apply; nothing was appended.
    Skipped {
        /// Why the event was ignored.
        reason: SkipReason,
    },
}

impl Outcome {
    /// New document status, if entries were appended.
    #[must_use]
    pub fn status(&self) -> Option<LockStatus> {
        match self {
            Self::Applied(update) => Some(update.status),
            _ => None,
        }
    }

    /// Entries appended, empty unless applied.
    #[must_use]
    pub fn entries(&self) -> &[LedgerEntry] {
        match self {
            Self::Applied(update) => &update.entries,
            _ => &[],
        }
    }

    pub(crate) fn skipped(reason: SkipReason) -> Self {
        Self::Skipped { reason }
    }
}

/// Lifecycle state of a source document, derived from its ledger rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DocumentState {
    /// No outstanding reservation or consumption.
    Unlocked,
    /// Holds an un-released reservation.
    Reserved,
    /// Spend recognized, nothing reserved.
    Consumed,
}

/// Net position of one source document at one key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyPosition {
    /// The bucket.
    pub dimension_key: DimensionKey,
    /// RESERVATION minus RELEASE.
    pub reserved: Decimal,
    /// CONSUMPTION minus REVERSAL.
    pub consumed: Decimal,
}

/// Budget footprint of one source document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentSummary {
    /// The source document.
    pub document: DocumentRef,
    /// Derived lifecycle state.
    pub state: DocumentState,
    /// Per-key positions, ordered by key.
    pub positions: Vec<KeyPosition>,
    /// Number of ledger rows for the document.
    pub entry_count: usize,
}

/// An inbound lifecycle event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LifecycleEvent {
    /// The source document reached an approval state.
    ReachedTargetState {
        /// The source document.
        document: SourceDocument,
        /// Call context.
        #[serde(default)]
        context: EventContext,
    },
    /// A secondary document was submitted against the source.
    SecondarySubmitted {
        /// The source document.
        document: SourceDocument,
        /// The secondary document.
        secondary: SecondaryDocument,
        /// Call context.
        #[serde(default)]
        context: EventContext,
    },
    /// The source document was rejected or reopened.
    RejectedOrReopened {
        /// The source document.
        document: SourceDocument,
        /// Call context.
        #[serde(default)]
        context: EventContext,
    },
    /// A secondary document was cancelled.
    SecondaryCancelled {
        /// The source document.
        document: SourceDocument,
        /// The secondary document.
        secondary: SecondaryDocument,
        /// Call context.
        #[serde(default)]
        context: EventContext,
    },
}

impl LifecycleEvent {
    /// The source document the event belongs to.
    #[must_use]
    pub fn document(&self) -> &DocumentRef {
        match self {
            Self::ReachedTargetState { document, .. }
            | Self::SecondarySubmitted { document, .. }
            | Self::RejectedOrReopened { document, .. }
            | Self::SecondaryCancelled { document, .. } => &document.doc_ref,
        }
    }

    /// Short event name for logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::ReachedTargetState { .. } => "reached_target_state",
            Self::SecondarySubmitted { .. } => "secondary_submitted",
            Self::RejectedOrReopened { .. } => "rejected_or_reopened",
            Self::SecondaryCancelled { .. } => "secondary_cancelled",
        }
    }
}
