//! Configuration types
//!
//! Board-agnostic clock configuration.

pub mod types;

pub use types::*;
