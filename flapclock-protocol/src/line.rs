//! Line assembly for the serial console.
//!
//! Bytes are collected until a terminator:
//! - `\n` or `\r` ends a line (so `\r\n` works, the empty second line is skipped)
//! - a line is cut at [`MAX_LINE_LEN`] characters; the rest starts a new line
//! - a partial line older than the inter-byte timeout is dropped
//! - input is lowercased, non-ASCII bytes are discarded

use heapless::String;

/// Maximum characters kept per line
pub const MAX_LINE_LEN: usize = 32;

/// Default gap after which a partial line is dropped, in milliseconds
pub const DEFAULT_TIMEOUT_MS: u32 = 1000;

/// A received line, lowercased
pub type Line = String<MAX_LINE_LEN>;

/// Errors from line assembly
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LineError {
    /// A partial line went stale and was dropped
    Timeout,
}

/// Byte-at-a-time line assembler
#[derive(Debug, Clone)]
pub struct LineReader {
    buffer: Line,
    timeout_ms: u32,
    last_byte_ms: u32,
}

impl Default for LineReader {
    fn default() -> Self {
        Self::new()
    }
}

impl LineReader {
    /// Create a reader with the default timeout
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_TIMEOUT_MS)
    }

    /// Create a reader with a custom inter-byte timeout
    pub fn with_timeout(timeout_ms: u32) -> Self {
        Self {
            buffer: String::new(),
            timeout_ms,
            last_byte_ms: 0,
        }
    }

    /// Drop any partial line
    pub fn reset(&mut self) {
        self.buffer.clear();
    }

    /// Characters collected so far
    pub fn pending(&self) -> &str {
        &self.buffer
    }

    /// Feed one byte received at `now_ms`
    ///
    /// Returns `Ok(Some(line))` when a line is complete and `Ok(None)` when
    /// more bytes are needed. If the partial line had gone stale the
    /// partial is dropped, the byte starts a fresh line and
    /// `Err(LineError::Timeout)` is returned.
    pub fn feed(&mut self, byte: u8, now_ms: u32) -> Result<Option<Line>, LineError> {
        let stale = self.is_stale(now_ms);
        if stale {
            self.reset();
        }
        self.last_byte_ms = now_ms;

        let line = self.push(byte);
        if stale {
            // A single byte cannot complete a non-empty line
            return Err(LineError::Timeout);
        }
        Ok(line)
    }

    /// Drop the partial line if no byte arrived within the timeout
    ///
    /// Call when a read times out so a half-typed command does not linger.
    pub fn expire(&mut self, now_ms: u32) -> Result<(), LineError> {
        if self.is_stale(now_ms) {
            self.reset();
            return Err(LineError::Timeout);
        }
        Ok(())
    }

    fn is_stale(&self, now_ms: u32) -> bool {
        !self.buffer.is_empty() && now_ms.wrapping_sub(self.last_byte_ms) >= self.timeout_ms
    }

    fn push(&mut self, byte: u8) -> Option<Line> {
        match byte {
            b'\n' | b'\r' => self.take(),
            b if b.is_ascii() => match self.buffer.push(char::from(b.to_ascii_lowercase())) {
                Ok(()) if self.buffer.len() < MAX_LINE_LEN => None,
                // Full, hand the line over
                _ => self.take(),
            },
            _ => None,
        }
    }

    fn take(&mut self) -> Option<Line> {
        if self.buffer.is_empty() {
            return None;
        }
        let line = self.buffer.clone();
        self.buffer.clear();
        Some(line)
    }

    /// Feed several bytes received at `now_ms`
    ///
    /// Returns the first complete line; bytes after it are not consumed.
    pub fn feed_bytes(&mut self, bytes: &[u8], now_ms: u32) -> Result<Option<Line>, LineError> {
        for &byte in bytes {
            if let Some(line) = self.feed(byte, now_ms)? {
                return Ok(Some(line));
            }
        }
        Ok(None)
    }
}
