//! Availability arithmetic.
//!
//! `available = allocated - actual - reserved`, where `reserved` reads
//! RESERVATION and RELEASE rows only.

use rust_decimal::Decimal;

use super::sources::{ActualSpendSource, EnvelopeSource};
use super::types::AvailabilityResult;
use crate::dimension::BudgetScope;
use crate::ledger::LedgerStore;

/// Computes availability for control scopes.
///
/// Borrowed per call; holds no state of its own.
pub struct AvailabilityCalculator<'a> {
    ledger: &'a dyn LedgerStore,
    envelopes: &'a dyn EnvelopeSource,
    actuals: &'a dyn ActualSpendSource,
}

impl<'a> AvailabilityCalculator<'a> {
    /// Creates a calculator over the given sources.
    #[must_use]
    pub fn new(
        ledger: &'a dyn LedgerStore,
        envelopes: &'a dyn EnvelopeSource,
        actuals: &'a dyn ActualSpendSource,
    ) -> Self {
        Self {
            ledger,
            envelopes,
            actuals,
        }
    }

    /// Envelope plus SUPPLEMENT and net RECLASS adjustments.
    #[must_use]
    pub fn allocated(&self, scope: &BudgetScope) -> Decimal {
        self.envelopes.allocated(scope) + self.ledger.allocation_adjustment(scope)
    }

    /// Posted real spend.
    #[must_use]
    pub fn actual(&self, scope: &BudgetScope) -> Decimal {
        self.actuals.actual(scope)
    }

    /// Net reserved amount.
    #[must_use]
    pub fn reserved(&self, scope: &BudgetScope) -> Decimal {
        self.ledger.reserved_total(scope)
    }

    /// `allocated - actual - reserved`.
    #[must_use]
    pub fn available(&self, scope: &BudgetScope) -> Decimal {
        self.allocated(scope) - self.actual(scope) - self.reserved(scope)
    }

    /// Decides whether `requested` fits in the scope.
    #[must_use]
    pub fn check(&self, scope: &BudgetScope, requested: Decimal) -> AvailabilityResult {
        let allocated = self.allocated(scope);
        let actual = self.actual(scope);
        let reserved = self.reserved(scope);
        let available = allocated - actual - reserved;
        let ok = requested <= available;

        AvailabilityResult {
            scope: scope.clone(),
            requested,
            allocated,
            actual,
            reserved,
            available,
            ok,
            shortfall: if ok { Decimal::ZERO } else { requested - available },
        }
    }
}
