//! Common types used across the engine.

pub mod currency;
pub mod id;


pub use currency::Currency;
pub use id::*;
