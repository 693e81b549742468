//! Build script for flapclock-firmware
//!
//! - Sets up linker search paths for memory.x
//! - Validates clock.toml at compile time

use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Flap positions per wheel (digits 0-9 plus blank)
const FLAP_COUNT: usize = 11;

/// Unit section names, left to right
const UNITS: [&str; 4] = ["hour_tens", "hour_ones", "min_tens", "min_ones"];

fn main() {
    setup_linker();
    validate_config();
}

/// Set up linker search paths for memory.x
fn setup_linker() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());

    // Copy memory.x to the output directory
    let memory_x = include_bytes!("memory.x");
    let mut f = File::create(out_dir.join("memory.x")).unwrap();
    f.write_all(memory_x).unwrap();

    // Tell rustc where to find memory.x
    println!("cargo:rustc-link-search={}", out_dir.display());

    // Re-run if memory.x changes
    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");
}

/// Validate clock.toml configuration at compile time
fn validate_config() {
    // Re-run if clock.toml changes
    println!("cargo:rerun-if-changed=clock.toml");

    let config_path = Path::new("clock.toml");

    if !config_path.exists() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: clock.toml not found!                                    ║\n\
            ║                                                                  ║\n\
            ║  The firmware embeds a clock.toml configuration file.            ║\n\
            ║  Please create one in the flapclock-firmware directory.          ║\n\
            ╚══════════════════════════════════════════════════════════════════╝\n"
        );
    }

    let config_content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => {
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Failed to read clock.toml                                ║\n\
                ║                                                                  ║\n\
                ║  Error: {:<56} ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                e
            );
        }
    };

    // Parse and validate TOML syntax
    let config: toml::Value = match toml::from_str(&config_content) {
        Ok(value) => value,
        Err(e) => {
            let error_msg = e.to_string();
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Invalid TOML syntax in clock.toml                        ║\n\
                ╠══════════════════════════════════════════════════════════════════╣\n\
                ║                                                                  ║\n\
                {}\n\
                ║                                                                  ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                format_error_lines(&error_msg)
            );
        }
    };

    let mut errors = Vec::new();
    validate_sections(&config, &mut errors);
    validate_motion(&config, &mut errors);
    validate_lookup(&config, &mut errors);
    validate_display(&config, &mut errors);
    validate_serial(&config, &mut errors);
    validate_units(&config, &mut errors);

    if !errors.is_empty() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: Invalid configuration in clock.toml                      ║\n\
            ╠══════════════════════════════════════════════════════════════════╣\n\
            {}\n\
            ╚══════════════════════════════════════════════════════════════════╝\n",
            errors
                .iter()
                .map(|e| format!("║  • {:<62} ║", e))
                .collect::<Vec<_>>()
                .join("\n")
        );
    }

    println!("cargo:warning=clock.toml validated successfully");
}

/// Format error message lines with box drawing
fn format_error_lines(msg: &str) -> String {
    msg.lines()
        .map(|line| {
            let truncated = if line.len() > 64 {
                format!("{}...", &line[..61])
            } else {
                line.to_string()
            };
            format!("║  {:<64} ║", truncated)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Only known sections, and only tables at the top level
fn validate_sections(config: &toml::Value, errors: &mut Vec<String>) {
    let Some(root) = config.as_table() else {
        return;
    };

    for (name, value) in root {
        if !["motion", "lookup", "display", "serial", "unit"].contains(&name.as_str()) {
            errors.push(format!("Unknown section [{}]", name));
        } else if !value.is_table() {
            errors.push(format!("[{}] must be a table", name));
        }
    }
}

/// Check that a section only holds the expected keys
fn check_keys(section: &str, table: &toml::Table, allowed: &[&str], errors: &mut Vec<String>) {
    for key in table.keys() {
        if !allowed.contains(&key.as_str()) {
            errors.push(format!("[{}] unknown key '{}'", section, key));
        }
    }
}

/// Integer field in range, if present
fn check_int(
    section: &str,
    table: &toml::Table,
    key: &str,
    range: std::ops::RangeInclusive<i64>,
    errors: &mut Vec<String>,
) {
    match table.get(key) {
        None => {}
        Some(toml::Value::Integer(v)) if range.contains(v) => {}
        Some(toml::Value::Integer(_)) => errors.push(format!(
            "[{}] {} must be {}-{}",
            section,
            key,
            range.start(),
            range.end()
        )),
        Some(_) => errors.push(format!("[{}] {} must be an integer", section, key)),
    }
}

/// Boolean field, if present
fn check_bool(section: &str, table: &toml::Table, key: &str, errors: &mut Vec<String>) {
    if let Some(value) = table.get(key) {
        if !value.is_bool() {
            errors.push(format!("[{}] {} must be true or false", section, key));
        }
    }
}

fn validate_motion(config: &toml::Value, errors: &mut Vec<String>) {
    let Some(motion) = config.get("motion").and_then(|m| m.as_table()) else {
        return;
    };
    check_keys("motion", motion, &["move_speed"], errors);
    check_int("motion", motion, "move_speed", 1..=1000, errors);
}

fn validate_lookup(config: &toml::Value, errors: &mut Vec<String>) {
    let Some(lookup) = config.get("lookup").and_then(|l| l.as_table()) else {
        return;
    };
    check_keys("lookup", lookup, &["offsets", "steps_per_revolution"], errors);
    check_int("lookup", lookup, "steps_per_revolution", 1..=65535, errors);

    let revolution = lookup
        .get("steps_per_revolution")
        .and_then(|v| v.as_integer())
        .unwrap_or(4096);

    let offsets = match lookup.get("offsets") {
        None => return,
        Some(toml::Value::Array(items)) => items,
        Some(_) => {
            errors.push("[lookup] offsets must be an array".to_string());
            return;
        }
    };

    if offsets.len() != FLAP_COUNT {
        errors.push(format!(
            "[lookup] offsets needs {} values (digits 0-9, blank)",
            FLAP_COUNT
        ));
        return;
    }

    let values: Vec<i64> = offsets.iter().filter_map(|v| v.as_integer()).collect();
    if values.len() != FLAP_COUNT {
        errors.push("[lookup] offsets must all be integers".to_string());
        return;
    }

    if values[0] != 0 {
        errors.push("[lookup] first offset must be 0".to_string());
    }
    if let Some(i) = values.windows(2).position(|pair| pair[1] < pair[0]) {
        errors.push(format!("[lookup] offset {} is smaller than the one before", i + 1));
    }
    if values[FLAP_COUNT - 1] >= revolution {
        errors.push("[lookup] last offset must be below steps_per_revolution".to_string());
    }
}

fn validate_display(config: &toml::Value, errors: &mut Vec<String>) {
    let Some(display) = config.get("display").and_then(|d| d.as_table()) else {
        return;
    };
    check_keys("display", display, &["blank_leading_zero"], errors);
    check_bool("display", display, "blank_leading_zero", errors);
}

fn validate_serial(config: &toml::Value, errors: &mut Vec<String>) {
    let Some(serial) = config.get("serial").and_then(|s| s.as_table()) else {
        return;
    };
    check_keys("serial", serial, &["baud_rate", "line_timeout_ms"], errors);
    check_int("serial", serial, "baud_rate", 1..=4_000_000, errors);
    check_int("serial", serial, "line_timeout_ms", 1..=60_000, errors);
}

fn validate_units(config: &toml::Value, errors: &mut Vec<String>) {
    let Some(units) = config.get("unit").and_then(|u| u.as_table()) else {
        return;
    };

    for (name, unit) in units {
        if !UNITS.contains(&name.as_str()) {
            errors.push(format!(
                "[unit.{}] unknown unit, expected one of {}",
                name,
                UNITS.join(", ")
            ));
            continue;
        }

        let section = format!("unit.{}", name);
        let Some(unit) = unit.as_table() else {
            errors.push(format!("[{}] must be a table", section));
            continue;
        };

        check_keys(&section, unit, &["ordering", "reversed"], errors);
        check_bool(&section, unit, "reversed", errors);

        if let Some(ordering) = unit.get("ordering") {
            if !matches!(ordering.as_str(), Some("direct" | "mirrored")) {
                errors.push(format!(
                    "[{}] ordering must be 'direct' or 'mirrored'",
                    section
                ));
            }
        }
    }
}
