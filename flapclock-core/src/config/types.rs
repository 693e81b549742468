//! Configuration type definitions
//!
//! These types describe one assembled clock: how fast the wheels turn,
//! where each flap sits on a wheel, how each motor is mounted and how the
//! serial console behaves. Anything read from outside the firmware image
//! must go through [`ClockConfig::validate`] before use.

use crate::motion::{
    LookupError, StepLookupTable, UnitConfig, UnitId, DEFAULT_MOVE_SPEED, NUM_CHANNELS,
};

/// Fastest move speed the 28BYJ-48 follows reliably, in steps/s
pub const MAX_MOVE_SPEED: u32 = 1000;

/// Default console baud rate
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// Default inter-byte timeout for a partial console line
pub const DEFAULT_LINE_TIMEOUT_MS: u32 = 1000;

/// Configuration errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Move speed is zero or above [`MAX_MOVE_SPEED`]
    MoveSpeed(u32),
    /// Step lookup table is not usable
    Lookup(LookupError),
    /// Baud rate is zero
    BaudRate(u32),
    /// Line timeout is zero
    LineTimeout,
}

impl From<LookupError> for ConfigError {
    fn from(err: LookupError) -> Self {
        ConfigError::Lookup(err)
    }
}

/// Serial console settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SerialConfig {
    /// UART baud rate
    pub baud_rate: u32,
    /// Drop a partial line after this long without a byte (ms)
    pub line_timeout_ms: u32,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            baud_rate: DEFAULT_BAUD_RATE,
            line_timeout_ms: DEFAULT_LINE_TIMEOUT_MS,
        }
    }
}

/// Complete clock configuration
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ClockConfig {
    /// Speed of every move, in steps/s
    pub move_speed: u32,
    /// Flap offsets shared by all wheels
    pub lookup: StepLookupTable,
    /// Mounting of each unit, hour tens first
    pub units: [UnitConfig; NUM_CHANNELS],
    /// Show a blank instead of a leading zero for hours below 10
    pub blank_leading_zero: bool,
    /// Console settings
    pub serial: SerialConfig,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            move_speed: DEFAULT_MOVE_SPEED,
            lookup: StepLookupTable::DEFAULT,
            units: UnitId::ALL.map(UnitConfig::for_unit),
            blank_leading_zero: false,
            serial: SerialConfig::default(),
        }
    }
}

impl ClockConfig {
    /// Check every field for values the firmware cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.move_speed == 0 || self.move_speed > MAX_MOVE_SPEED {
            return Err(ConfigError::MoveSpeed(self.move_speed));
        }

        // Deserialized tables bypass the constructor, so rebuild to check
        StepLookupTable::new(*self.lookup.offsets(), self.lookup.steps_per_revolution())?;

        if self.serial.baud_rate == 0 {
            return Err(ConfigError::BaudRate(self.serial.baud_rate));
        }
        if self.serial.line_timeout_ms == 0 {
            return Err(ConfigError::LineTimeout);
        }

        Ok(())
    }

    /// Configuration of one unit
    pub fn unit(&self, id: UnitId) -> UnitConfig {
        self.units[id.index()]
    }
}
