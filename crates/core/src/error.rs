//! Budget control error types.
//!
//! Every fatal error aborts the whole multi-slice operation. Nothing is
//! written to the ledger when one of these is returned.

use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

use crate::dimension::BudgetScope;
use crate::ledger::LedgerError;

/// Result type alias using `BudgetControlError`.
pub type BudgetResult<T> = Result<T, BudgetControlError>;

/// One control scope that cannot absorb the requested amount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Shortfall {
    /// The control scope that is short.
    pub scope: BudgetScope,
    /// Amount the operation wanted to reserve in this scope.
    pub requested: Decimal,
    /// Amount available before the operation.
    pub available: Decimal,
    /// `requested - available`.
    pub shortfall: Decimal,
}

impl std::fmt::Display for Shortfall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} requires {}, available {} (short by {})",
            self.scope, self.requested, self.available, self.shortfall
        )
    }
}

fn describe_shortfalls(shortfalls: &[Shortfall]) -> String {
    shortfalls
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Errors surfaced to lifecycle collaborators.
#[derive(Debug, Error)]
pub enum BudgetControlError {
    /// A budget key could not be fully resolved.
    #[error("Cannot resolve {missing} for cost center {cost_center}, account {account}")]
    DimensionUnresolved {
        /// The dimension that could not be derived.
        missing: &'static str,
        /// Cost center of the line being resolved.
        cost_center: String,
        /// Account of the line being resolved.
        account: String,
    },

    /// The allocation document cannot be used for ratio slicing yet.
    #[error("Allocation {allocation} is not ready: {reason}")]
    AllocationNotReady {
        /// Allocation document name.
        allocation: String,
        /// Why it was rejected.
        reason: String,
    },

    /// At least one control scope lacks budget and overrun is not permitted.
    #[error("Insufficient budget for {document}: {}", describe_shortfalls(.shortfalls))]
    InsufficientBudget {
        /// The source document that asked for budget.
        document: String,
        /// Every scope that is short.
        shortfalls: Vec<Shortfall>,
    },

    /// A control scope lock could not be acquired in time.
    #[error("Budget scope {scope} is locked by another operation, please retry")]
    LedgerWriteConflict {
        /// The contended scope.
        scope: String,
    },

    /// Another event for the same source document is still being processed.
    #[error("Document {document} is busy, please retry")]
    DocumentBusy {
        /// The contended document.
        document: String,
    },

    /// A document amount is missing or negative.
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// The ledger rejected a batch.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// The event dispatcher could not deliver an event or its reply.
    #[error("Dispatcher error: {0}")]
    Dispatch(String),
}

impl BudgetControlError {
    /// Returns the error code for collaborator responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::DimensionUnresolved { .. } => "DIMENSION_UNRESOLVED",
            Self::AllocationNotReady { .. } => "ALLOCATION_NOT_READY",
            Self::InsufficientBudget { .. } => "INSUFFICIENT_BUDGET",
            Self::LedgerWriteConflict { .. } => "LEDGER_WRITE_CONFLICT",
            Self::DocumentBusy { .. } => "DOCUMENT_BUSY",
            Self::InvalidAmount(_) => "INVALID_AMOUNT",
            Self::Ledger(err) => err.error_code(),
            Self::Dispatch(_) => "DISPATCH_ERROR",
        }
    }

    /// Returns true if the whole operation may be retried as-is.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::LedgerWriteConflict { .. } | Self::DocumentBusy { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dimension::DimensionKey;
    use rust_decimal_macros::dec;

    fn scope() -> BudgetScope {
        BudgetScope::of(
            &DimensionKey::new("ACME", "FY2026", "CC-OPS", "6100-Travel"),
            true,
        )
    }

    #[test]
    fn test_error_codes() {
        let err = BudgetControlError::DimensionUnresolved {
            missing: "company",
            cost_center: "CC-OPS".to_string(),
            account: "6100".to_string(),
        };
        assert_eq!(err.error_code(), "DIMENSION_UNRESOLVED");
        assert_eq!(
            BudgetControlError::InvalidAmount("x".into()).error_code(),
            "INVALID_AMOUNT"
        );
        assert_eq!(
            BudgetControlError::Ledger(LedgerError::EmptyBatch).error_code(),
            "EMPTY_BATCH"
        );
    }

    #[test]
    fn test_retryable_errors() {
        assert!(
            BudgetControlError::LedgerWriteConflict {
                scope: "x".to_string()
            }
            .is_retryable()
        );
        assert!(
            BudgetControlError::DocumentBusy {
                document: "EXP-1".to_string()
            }
            .is_retryable()
        );
        assert!(
            !BudgetControlError::InsufficientBudget {
                document: "EXP-1".to_string(),
                shortfalls: vec![],
            }
            .is_retryable()
        );
    }

    #[test]
    fn test_insufficient_budget_display() {
        let err = BudgetControlError::InsufficientBudget {
            document: "Expense Claim EXP-0001".to_string(),
            shortfalls: vec![Shortfall {
                scope: scope(),
                requested: dec!(500.00),
                available: dec!(200.00),
                shortfall: dec!(300.00),
            }],
        };
        let message = err.to_string();
        assert!(message.starts_with("Insufficient budget for Expense Claim EXP-0001"));
        assert!(message.contains("requires 500.00, available 200.00"));
        assert!(message.contains("short by 300.00"));
    }
}
