//! Core business logic for Ledgerlock.
//!
//! This crate contains the budget control engine with ZERO web or database
//! dependencies. Source documents reserve, consume, release and reverse budget
//! against dimension keys through an append-only ledger.
//!
//! # Modules
//!
//! - `dimension` - Budget keys and their resolution from documents
//! - `fiscal` - Fiscal period calendar
//! - `allocation` - Slicing document totals across keys
//! - `ledger` - Append-only budget ledger and per-scope locks
//! - `availability` - Allocated, actual and reserved totals
//! - `workflow` - Lifecycle event handling and ordered dispatch

pub mod allocation;
pub mod availability;
pub mod dimension;
pub mod error;
pub mod fiscal;
pub mod ledger;
pub mod workflow;

pub use error::{BudgetControlError, BudgetResult, Shortfall};
