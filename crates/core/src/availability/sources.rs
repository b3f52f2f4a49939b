//! Read-only collaborators the calculator draws on.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use rust_decimal::Decimal;
use serde::Deserialize;

use super::types::BudgetEnvelope;
use crate::dimension::{BudgetScope, DimensionKey};
use crate::ledger::LedgerStore;

/// Source of allocated budget ceilings.
pub trait EnvelopeSource: Send + Sync {
    /// Sum of envelope amounts for keys inside `scope`.
    fn allocated(&self, scope: &BudgetScope) -> Decimal;
}

/// Source of posted real spend.
pub trait ActualSpendSource: Send + Sync {
    /// Posted spend for keys inside `scope`.
    fn actual(&self, scope: &BudgetScope) -> Decimal;

    /// Drops any cached figure for `scope`.
    fn invalidate(&self, _scope: &BudgetScope) {}

    /// Drops every cached figure.
    fn invalidate_all(&self) {}
}

/// Envelope amounts keyed by dimension key.
#[derive(Debug, Default, Deserialize)]
#[serde(from = "Vec<BudgetEnvelope>")]
pub struct EnvelopeBook {
    envelopes: RwLock<HashMap<DimensionKey, Decimal>>,
}

impl EnvelopeBook {
    /// Creates an empty book.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the envelope of a key, replacing any previous amount.
    pub fn set(&self, dimension_key: DimensionKey, allocated: Decimal) {
        self.envelopes.write().insert(dimension_key, allocated);
    }

    /// Number of keys with an envelope.
    #[must_use]
    pub fn len(&self) -> usize {
        self.envelopes.read().len()
    }

    /// Returns true if no envelope is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.envelopes.read().is_empty()
    }
}

impl From<Vec<BudgetEnvelope>> for EnvelopeBook {
    fn from(envelopes: Vec<BudgetEnvelope>) -> Self {
        let book = Self::new();
        for envelope in envelopes {
            book.set(envelope.dimension_key, envelope.allocated);
        }
        book
    }
}

impl EnvelopeSource for EnvelopeBook {
    fn allocated(&self, scope: &BudgetScope) -> Decimal {
        self.envelopes
            .read()
            .iter()
            .filter(|(key, _)| scope.contains(key))
            .map(|(_, amount)| *amount)
            .sum()
    }
}

/// Externally posted spend keyed by dimension key.
#[derive(Debug, Default)]
pub struct PostedActuals {
    posted: RwLock<HashMap<DimensionKey, Decimal>>,
}

impl PostedActuals {
    /// Creates an empty set of postings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a posting to a key.
    pub fn post(&self, dimension_key: DimensionKey, amount: Decimal) {
        *self.posted.write().entry(dimension_key).or_default() += amount;
    }
}

impl ActualSpendSource for PostedActuals {
    fn actual(&self, scope: &BudgetScope) -> Decimal {
        self.posted
            .read()
            .iter()
            .filter(|(key, _)| scope.contains(key))
            .map(|(_, amount)| *amount)
            .sum()
    }
}

/// Actual spend derived from the engine's own CONSUMPTION and REVERSAL rows.
///
/// For deployments without an external general ledger.
#[derive(Clone)]
pub struct ConsumedActuals {
    ledger: Arc<dyn LedgerStore>,
}

impl ConsumedActuals {
    /// Reads actuals from `ledger`.
    #[must_use]
    pub fn new(ledger: Arc<dyn LedgerStore>) -> Self {
        Self { ledger }
    }
}

impl ActualSpendSource for ConsumedActuals {
    fn actual(&self, scope: &BudgetScope) -> Decimal {
        self.ledger.consumed_total(scope)
    }
}
