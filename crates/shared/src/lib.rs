//! Shared types and configuration for Ledgerlock.
//!
//! This crate provides common types used across all other crates:
//! - Typed IDs for ledger entries and append batches
//! - Currency codes with minor-unit precision
//! - Budget control configuration management

pub mod config;
pub mod types;

pub use config::{BudgetControlConfig, ConfigError, EnforceScope};
pub use types::{BatchId, Currency, LedgerEntryId};
