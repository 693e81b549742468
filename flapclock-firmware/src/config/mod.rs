//! Configuration loading and parsing
//!
//! Loads the clock configuration from the embedded `clock.toml`.
//! Uses a custom no_std parser for the TOML subset it needs.

pub mod loader;
pub mod toml;

pub use loader::load_config;
