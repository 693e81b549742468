//! Hardware driver implementations
//!
//! This crate provides concrete implementations of the traits defined
//! in flapclock-core:
//!
//! - Stepper coil drivers (ULN2003 half-stepping)

#![no_std]
#![deny(unsafe_code)]

pub mod stepper;
