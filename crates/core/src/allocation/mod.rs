//! Allocation slicing of document totals across dimension keys.
//!
//! Two modes:
//! - Direct: one slice per account line at the document's own cost center
//! - Ratio: each account line spread across an approved allocation document's
//!   target cost centers by line weight

pub mod slicer;
pub mod types;

#[cfg(test)]
mod slicer_props;

pub use slicer::AllocationSlicer;
pub use types::{AllocationDocument, AllocationLine, AllocationSlice, AllocationStatus, AmountLine};
