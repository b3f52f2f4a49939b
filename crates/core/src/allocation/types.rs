//! Allocation input and output types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::dimension::DimensionKey;

/// One (account, amount) pair of a document's amount breakdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmountLine {
    /// Expense account charged.
    pub account: String,
    /// Line amount. Must not be negative.
    pub amount: Decimal,
}

impl AmountLine {
    /// Creates an amount line.
    #[must_use]
    pub fn new(account: impl Into<String>, amount: Decimal) -> Self {
        Self {
            account: account.into(),
            amount,
        }
    }
}

/// Approval status of an external allocation document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllocationStatus {
    /// Still being edited.
    #[default]
    Draft,
    /// Approved and usable for ratio slicing.
    Approved,
    /// Withdrawn.
    Cancelled,
}

/// One target cost center of an allocation document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationLine {
    /// Target cost center.
    pub cost_center: String,
    /// Share of the allocation total carried by this line.
    pub amount: Decimal,
    /// Project override for this target.
    #[serde(default)]
    pub project: Option<String>,
    /// Branch override for this target.
    #[serde(default)]
    pub branch: Option<String>,
}

/// External document spreading a total across several cost centers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationDocument {
    /// Document name.
    pub name: String,
    /// Approval status.
    #[serde(default)]
    pub status: AllocationStatus,
    /// Declared total; the denominator of every line weight.
    pub total: Decimal,
    /// Target lines.
    pub lines: Vec<AllocationLine>,
}

impl AllocationDocument {
    /// Sum of line amounts.
    #[must_use]
    pub fn lines_total(&self) -> Decimal {
        self.lines.iter().map(|l| l.amount).sum()
    }
}

/// One (key, amount) fragment of a document total. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AllocationSlice {
    /// Bucket the fragment is charged to.
    pub dimension_key: DimensionKey,
    /// Fragment amount, rounded to currency precision.
    pub amount: Decimal,
}
