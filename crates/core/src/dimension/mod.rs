//! Budget dimension keys and their resolution from source documents.

pub mod key;
pub mod resolver;

#[cfg(test)]
mod resolver_tests;

pub use key::{BudgetScope, DimensionKey};
pub use resolver::{CostCenterDirectory, DimensionResolver, DimensionSource};
