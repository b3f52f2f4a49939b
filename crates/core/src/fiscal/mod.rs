//! Fiscal period calendar used to date-resolve budget keys.

pub mod period;

pub use period::{FiscalCalendar, FiscalPeriod};
