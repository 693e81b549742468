//! Timekeeping
//!
//! Drift-tolerant software clock driven by a millisecond counter.

pub mod clock;

pub use clock::{ClockModel, TimeError};
