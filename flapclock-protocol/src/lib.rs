//! Flapclock serial protocol
//!
//! Text commands arrive over a UART as short lines. This crate turns raw
//! bytes into lines ([`LineReader`]) and lines into [`Command`]s.
//!
//! # Protocol Overview
//!
//! ```text
//! <keyword> [param] [param] [param] <\n or \r>
//! ```
//!
//! Keywords are `move`, `stop`, `time` and `setf`. Parameters are decimal
//! integers separated by spaces or commas. Lines longer than
//! [`MAX_LINE_LEN`] characters are cut, and a partially typed line is
//! dropped if the sender goes quiet for [`DEFAULT_TIMEOUT_MS`].

#![no_std]
#![deny(unsafe_code)]

pub mod command;
pub mod line;

pub use command::{atoi, Command, CommandKind, ParseError, MAX_PARAMS};
pub use line::{Line, LineError, LineReader, DEFAULT_TIMEOUT_MS, MAX_LINE_LEN};

/// Reply sent for a line that does not decode to a command
pub const INVALID_COMMAND_REPLY: &str = "Invalid command.";
