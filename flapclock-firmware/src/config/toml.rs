//! Simple TOML parser for the clock configuration
//!
//! This is a minimal TOML parser that handles only the subset used by
//! `clock.toml`. It does NOT support the full TOML spec.
//!
//! Supported features:
//! - Key = value pairs (string, integer, boolean)
//! - Single-line integer arrays: offsets = [0, 372, ...]
//! - [section] and [section.name] headers
//! - Comments (# ...)
//!
//! Keys that are not recognised are rejected so typos do not go unnoticed.

use flapclock_core::config::ClockConfig;
use flapclock_core::motion::{FlapOrdering, StepLookupTable, UnitId, FLAP_COUNT};

/// Parse error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseError {
    /// Invalid section header
    InvalidSection,
    /// Key not valid in its section
    UnknownKey,
    /// Invalid value type
    InvalidValue,
    /// Array has the wrong number of items
    WrongItemCount,
}

/// Current parsing context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Root,
    Motion,
    Lookup,
    Display,
    Serial,
    Unit(UnitId),
}

/// Parse TOML configuration into a ClockConfig
///
/// Missing keys keep their defaults. Only the lookup table is checked
/// here; call [`ClockConfig::validate`] before using the result.
pub fn parse_config(input: &str) -> Result<ClockConfig, ParseError> {
    let mut config = ClockConfig::default();
    let mut section = Section::Root;

    // Offsets and revolution may come in either order
    let mut offsets = *config.lookup.offsets();
    let mut steps_per_revolution = config.lookup.steps_per_revolution();

    for line in input.lines() {
        let line = strip_comment(line).trim();

        // Skip empty lines and comments
        if line.is_empty() {
            continue;
        }

        if line.starts_with('[') && line.ends_with(']') {
            section = parse_section_header(&line[1..line.len() - 1])?;
            continue;
        }

        let (key, value) = parse_key_value(line).ok_or(ParseError::InvalidValue)?;
        match (section, key) {
            (Section::Motion, "move_speed") => config.move_speed = parse_int(value)?,
            (Section::Lookup, "offsets") => offsets = parse_offsets(value)?,
            (Section::Lookup, "steps_per_revolution") => steps_per_revolution = parse_int(value)?,
            (Section::Display, "blank_leading_zero") => {
                config.blank_leading_zero = parse_bool(value)?
            }
            (Section::Serial, "baud_rate") => config.serial.baud_rate = parse_int(value)?,
            (Section::Serial, "line_timeout_ms") => {
                config.serial.line_timeout_ms = parse_int(value)?
            }
            (Section::Unit(id), "ordering") => {
                config.units[id.index()].ordering = parse_ordering(value)?
            }
            (Section::Unit(id), "reversed") => config.units[id.index()].reversed = parse_bool(value)?,
            _ => return Err(ParseError::UnknownKey),
        }
    }

    config.lookup = StepLookupTable::new(offsets, steps_per_revolution)
        .map_err(|_| ParseError::InvalidValue)?;

    Ok(config)
}

/// Parse section header like "motion" or "unit.hour_tens"
fn parse_section_header(header: &str) -> Result<Section, ParseError> {
    match header.trim() {
        "motion" => Ok(Section::Motion),
        "lookup" => Ok(Section::Lookup),
        "display" => Ok(Section::Display),
        "serial" => Ok(Section::Serial),
        other => {
            let name = other.strip_prefix("unit.").ok_or(ParseError::InvalidSection)?;
            parse_unit_name(name).map(Section::Unit)
        }
    }
}

fn parse_unit_name(name: &str) -> Result<UnitId, ParseError> {
    match name {
        "hour_tens" => Ok(UnitId::HourTens),
        "hour_ones" => Ok(UnitId::HourOnes),
        "min_tens" => Ok(UnitId::MinTens),
        "min_ones" => Ok(UnitId::MinOnes),
        _ => Err(ParseError::InvalidSection),
    }
}

/// Cut a trailing comment, unless the # is inside a string
fn strip_comment(line: &str) -> &str {
    match line.find('#') {
        Some(pos) if line[..pos].matches('"').count() % 2 == 0 => &line[..pos],
        _ => line,
    }
}

/// Parse "key = value" line
fn parse_key_value(line: &str) -> Option<(&str, &str)> {
    let (key, value) = line.split_once('=')?;
    let key = key.trim();
    let value = value.trim();

    if key.is_empty() || value.is_empty() {
        return None;
    }

    Some((key, value))
}

/// Parse a string value (removes quotes)
fn parse_string(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}

/// Parse an integer value, allowing `_` separators
fn parse_int<T: core::str::FromStr>(value: &str) -> Result<T, ParseError> {
    let mut digits: heapless::String<24> = heapless::String::new();
    for c in value.chars().filter(|&c| c != '_') {
        digits.push(c).map_err(|_| ParseError::InvalidValue)?;
    }
    digits.parse().map_err(|_| ParseError::InvalidValue)
}

/// Parse a boolean value
fn parse_bool(value: &str) -> Result<bool, ParseError> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(ParseError::InvalidValue),
    }
}

/// Parse a flap ordering: "direct" or "mirrored"
fn parse_ordering(value: &str) -> Result<FlapOrdering, ParseError> {
    match parse_string(value) {
        "direct" => Ok(FlapOrdering::Direct),
        "mirrored" => Ok(FlapOrdering::Mirrored),
        _ => Err(ParseError::InvalidValue),
    }
}

/// Parse the offset array: exactly one value per flap
fn parse_offsets(value: &str) -> Result<[u16; FLAP_COUNT], ParseError> {
    let inner = value
        .strip_prefix('[')
        .and_then(|v| v.strip_suffix(']'))
        .ok_or(ParseError::InvalidValue)?;

    let mut offsets = [0u16; FLAP_COUNT];
    let mut count = 0;
    for item in inner.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let slot = offsets.get_mut(count).ok_or(ParseError::WrongItemCount)?;
        *slot = parse_int(item)?;
        count += 1;
    }

    if count != FLAP_COUNT {
        return Err(ParseError::WrongItemCount);
    }
    Ok(offsets)
}
