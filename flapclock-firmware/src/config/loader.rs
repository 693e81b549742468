//! Configuration loading
//!
//! The clock has no writable storage for settings, so configuration comes
//! from `clock.toml` compiled into the image. A file that fails to parse
//! or validate falls back to the built-in defaults rather than leaving the
//! clock dead.

use defmt::*;

use flapclock_core::config::ClockConfig;

use super::toml::parse_config;

/// Embedded configuration (compiled into firmware)
/// Edit clock.toml and rebuild to customize
const EMBEDDED_CONFIG: &str = include_str!("../../clock.toml");

/// Load the embedded configuration, or defaults if it is unusable
pub fn load_config() -> ClockConfig {
    load_from_str(EMBEDDED_CONFIG)
}

fn load_from_str(input: &str) -> ClockConfig {
    let config = match parse_config(input) {
        Ok(config) => config,
        Err(e) => {
            // build.rs checks clock.toml, so this means the parsers disagree
            error!("Failed to parse embedded config: {:?}", e);
            warn!("Using default configuration");
            return ClockConfig::default();
        }
    };

    match config.validate() {
        Ok(()) => {
            info!(
                "Config: move_speed={} steps/s, {} baud, blank_leading_zero={}",
                config.move_speed, config.serial.baud_rate, config.blank_leading_zero
            );
            config
        }
        Err(e) => {
            error!("Invalid embedded config: {:?}", e);
            warn!("Using default configuration");
            ClockConfig::default()
        }
    }
}
