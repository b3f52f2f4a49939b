//! Availability inputs and results.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::dimension::{BudgetScope, DimensionKey};

/// Allocated ceiling for one dimension key. External reference data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetEnvelope {
    /// Bucket the ceiling applies to.
    pub dimension_key: DimensionKey,
    /// Allocated amount for the fiscal period.
    pub allocated: Decimal,
}

/// Computed availability for one control scope. Never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AvailabilityResult {
    /// Control scope the figures are computed over.
    pub scope: BudgetScope,
    /// Amount the caller asked about.
    pub requested: Decimal,
    /// Envelope plus supplements and net reclasses.
    pub allocated: Decimal,
    /// Posted real spend.
    pub actual: Decimal,
    /// RESERVATION minus RELEASE.
    pub reserved: Decimal,
    /// `allocated - actual - reserved`.
    pub available: Decimal,
    /// True if `requested <= available`.
    pub ok: bool,
    /// `max(requested - available, 0)`.
    pub shortfall: Decimal,
}
