//! Board-agnostic core logic for the split-flap clock firmware
//!
//! This crate contains all application logic that does not depend on
//! specific hardware implementations:
//!
//! - Hardware abstraction traits (stepper channel, coil driver, clock)
//! - Step lookup table and split-flap unit bookkeeping
//! - Multi-motor stepping engine
//! - Drift-tolerant software clock
//! - Control loop and serial command handling
//! - Configuration type definitions

#![no_std]
#![deny(unsafe_code)]

pub mod config;
pub mod control;
pub mod motion;
pub mod time;
pub mod traits;

pub use control::{CommandError, DisplayMoves, FlapClock, Outcome};
