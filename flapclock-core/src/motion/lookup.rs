//! Step lookup table
//!
//! Maps the 11 flap positions of a wheel (digits 0-9 plus blank) to step
//! offsets within one motor revolution. The spacing is not uniform: the
//! offsets come from measuring the printed flaps, not from dividing the
//! revolution evenly.

/// Number of flap positions on a wheel (digits 0-9 plus blank)
pub const FLAP_COUNT: usize = 11;

/// Lookup index of the blank flap
pub const BLANK_INDEX: u8 = 10;

/// Half-steps per output shaft revolution of a 28BYJ-48
pub const STEPS_PER_REVOLUTION: u16 = 4096;

/// Measured offsets for the stock wheel, in half-steps
pub const DEFAULT_OFFSETS: [u16; FLAP_COUNT] = [
    0, // 0
    372, 745, 1117, 1489, 1862, 2234, 2607, 2979,
    3351, // 9
    3724, // blank
];

/// Errors from building a lookup table out of configured values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LookupError {
    /// The first offset is not zero
    NonZeroOrigin,
    /// An offset is smaller than the one before it
    NotMonotonic { index: u8 },
    /// The last offset does not fit in one revolution
    ExceedsRevolution,
}

/// Immutable table of step offsets for one revolution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StepLookupTable {
    offsets: [u16; FLAP_COUNT],
    steps_per_revolution: u16,
}

impl Default for StepLookupTable {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl StepLookupTable {
    /// The stock wheel at 4096 half-steps per revolution
    pub const DEFAULT: Self = Self {
        offsets: DEFAULT_OFFSETS,
        steps_per_revolution: STEPS_PER_REVOLUTION,
    };

    /// Build a table, checking that it describes one revolution
    pub fn new(
        offsets: [u16; FLAP_COUNT],
        steps_per_revolution: u16,
    ) -> Result<Self, LookupError> {
        if offsets[0] != 0 {
            return Err(LookupError::NonZeroOrigin);
        }
        for (i, pair) in offsets.windows(2).enumerate() {
            if pair[1] < pair[0] {
                return Err(LookupError::NotMonotonic { index: i as u8 + 1 });
            }
        }
        if offsets[FLAP_COUNT - 1] >= steps_per_revolution {
            return Err(LookupError::ExceedsRevolution);
        }

        Ok(Self {
            offsets,
            steps_per_revolution,
        })
    }

    /// Step offset of a lookup index
    ///
    /// Indices past the blank flap are clamped to it.
    pub fn offset(&self, index: u8) -> u16 {
        self.offsets[usize::from(index.min(BLANK_INDEX))]
    }

    /// Steps in one full revolution
    pub fn steps_per_revolution(&self) -> u16 {
        self.steps_per_revolution
    }

    /// All offsets, blank last
    pub fn offsets(&self) -> &[u16; FLAP_COUNT] {
        &self.offsets
    }

    /// Forward distance from one lookup index to another
    ///
    /// The wheel only turns one way, so going "back" wraps through a full
    /// revolution. The result is always in `0..steps_per_revolution`.
    pub fn forward_steps(&self, from: u8, to: u8) -> i32 {
        let delta = i32::from(self.offset(to)) - i32::from(self.offset(from));
        if delta < 0 {
            delta + i32::from(self.steps_per_revolution)
        } else {
            delta
        }
    }
}
