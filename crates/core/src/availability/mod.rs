//! Budget availability for control scopes.
//!
//! Combines the external envelope, posted actuals and the ledger's reserved
//! total into an availability figure, and decides whether a request fits.

pub mod cache;
pub mod calculator;
pub mod sources;
pub mod types;

#[cfg(test)]
mod calculator_props;

pub use cache::CachedActuals;
pub use calculator::AvailabilityCalculator;
pub use sources::{ActualSpendSource, ConsumedActuals, EnvelopeBook, EnvelopeSource, PostedActuals};
pub use types::{AvailabilityResult, BudgetEnvelope};
