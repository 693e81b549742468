//! Serial commands
//!
//! A command line is a keyword followed by up to three integer
//! parameters, separated by spaces and/or commas:
//!
//! ```text
//! move 3 7        move unit 3 to digit 7
//! time 13 45 0    set the clock to 13:45:00
//! setf 0 -20      trim unit 0 back by 20 steps
//! stop            abandon all pending moves
//! ```
//!
//! Keywords are matched case-insensitively. Missing parameters read as 0,
//! extra ones are ignored, and parameters that are not numbers parse the
//! way C's `atoi` would (leading digits only, otherwise 0).

/// Maximum number of parameters after the keyword
pub const MAX_PARAMS: usize = 3;

/// Command keywords
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CommandKind {
    /// Move a unit to a position
    Move,
    /// Abandon pending moves
    Stop,
    /// Set the time of day
    Time,
    /// Trim a unit by a raw step count
    Setf,
}

impl CommandKind {
    /// Every keyword, in wire order
    pub const ALL: [CommandKind; 4] = [
        CommandKind::Move,
        CommandKind::Stop,
        CommandKind::Time,
        CommandKind::Setf,
    ];

    /// Keyword as typed on the serial line
    pub fn name(self) -> &'static str {
        match self {
            CommandKind::Move => "move",
            CommandKind::Stop => "stop",
            CommandKind::Time => "time",
            CommandKind::Setf => "setf",
        }
    }

    /// Match a keyword, ignoring ASCII case
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(name))
    }
}

/// Errors from decoding a command line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseError {
    /// Line held nothing but separators
    Empty,
    /// First token is not a known keyword
    UnknownCommand,
}

/// A decoded command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Command {
    /// Keyword
    pub kind: CommandKind,
    /// Parameters, zero where not given
    pub params: [i32; MAX_PARAMS],
}

impl Command {
    /// Command with no parameters
    pub const fn new(kind: CommandKind) -> Self {
        Self {
            kind,
            params: [0; MAX_PARAMS],
        }
    }

    /// Command with parameters
    pub const fn with_params(kind: CommandKind, params: [i32; MAX_PARAMS]) -> Self {
        Self { kind, params }
    }

    /// Parameter `index`, 0 when out of range
    pub fn param(&self, index: usize) -> i32 {
        self.params.get(index).copied().unwrap_or(0)
    }

    /// Decode a command line
    pub fn parse(line: &str) -> Result<Self, ParseError> {
        let mut tokens = line.split([' ', ',']).filter(|t| !t.is_empty());

        let keyword = tokens.next().ok_or(ParseError::Empty)?;
        let kind = CommandKind::from_name(keyword).ok_or(ParseError::UnknownCommand)?;

        let mut params = [0; MAX_PARAMS];
        for (slot, token) in params.iter_mut().zip(tokens) {
            *slot = atoi(token);
        }

        Ok(Self { kind, params })
    }
}

/// Parse an integer the way C's `atoi` does
///
/// Leading whitespace and one sign are accepted, then digits up to the
/// first non-digit. No digits gives 0. Out-of-range values saturate.
pub fn atoi(token: &str) -> i32 {
    let bytes = token.trim_start().as_bytes();
    let (negative, digits) = match bytes.split_first() {
        Some((b'-', rest)) => (true, rest),
        Some((b'+', rest)) => (false, rest),
        _ => (false, bytes),
    };

    let mut value: i64 = 0;
    for &b in digits.iter().take_while(|b| b.is_ascii_digit()) {
        value = (value * 10 + i64::from(b - b'0')).min(i64::from(i32::MAX) + 1);
    }
    if negative {
        value = -value;
    }

    value.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}
