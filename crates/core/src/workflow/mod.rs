//! Lifecycle orchestration of budget reservations.
//!
//! # Modules
//!
//! - `types` - Documents, events, outcomes and derived states
//! - `state` - Document state derived from ledger history
//! - `controller` - Reservation, consumption, release and reversal
//! - `dispatch` - Per-document ordered event queue

pub mod controller;
pub mod dispatch;
pub mod types;

mod state;

#[cfg(test)]
mod controller_props;
#[cfg(test)]
mod fixtures;

pub use controller::{BudgetController, EngineSources};
pub use dispatch::{EventDispatcher, PendingOutcome};
pub use types::{
    DocumentState, DocumentSummary, EventContext, KeyPosition, LifecycleEvent, LockStatus,
    Outcome, Principal, SecondaryDocument, SkipReason, SourceDocument, StatusUpdate,
};
