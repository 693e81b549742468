//! Software clock
//!
//! 24-hour time with second granularity, advanced from a free-running
//! millisecond counter. The clock does not need to be ticked on a fixed
//! schedule: it accumulates whatever time has passed since the last call,
//! so it stays correct across long gaps such as a blocking motor run.
//!
//! A minute-changed flag tells the display loop that the digits need
//! updating. The clock only ever sets it; the consumer clears it with
//! [`ClockModel::acknowledge_minute_change`] once the new time is shown.

use crate::motion::FlapPosition;

/// Milliseconds per second
const MS_PER_SECOND: u32 = 1000;

/// Errors from setting the time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimeError {
    /// Hours ≥ 24, minutes ≥ 60 or seconds ≥ 60
    OutOfRange { hours: u8, minutes: u8, seconds: u8 },
}

/// Wall-clock time kept from elapsed milliseconds
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ClockModel {
    hours: u8,
    minutes: u8,
    seconds: u8,
    /// Sub-second accumulator, may briefly exceed 1000 between ticks
    millis: u32,
    /// Counter value at the previous tick or time set
    last_tick_ms: u32,
    minute_changed: bool,
}

impl Default for ClockModel {
    fn default() -> Self {
        Self::new()
    }
}

impl ClockModel {
    /// Midnight, with the millisecond reference at counter value 0
    pub const fn new() -> Self {
        Self {
            hours: 0,
            minutes: 0,
            seconds: 0,
            millis: 0,
            last_tick_ms: 0,
            minute_changed: false,
        }
    }

    /// Hours (0-23)
    pub fn hours(&self) -> u8 {
        self.hours
    }

    /// Minutes (0-59)
    pub fn minutes(&self) -> u8 {
        self.minutes
    }

    /// Seconds (0-59)
    pub fn seconds(&self) -> u8 {
        self.seconds
    }

    /// Time as `(hours, minutes, seconds)`
    pub fn hms(&self) -> (u8, u8, u8) {
        (self.hours, self.minutes, self.seconds)
    }

    /// Milliseconds accumulated towards the next second
    pub fn subsecond_ms(&self) -> u32 {
        self.millis
    }

    /// Check if a minute boundary passed (or the time was set) since the
    /// last acknowledgement
    pub fn minute_changed(&self) -> bool {
        self.minute_changed
    }

    /// Clear the minute-changed flag once the new time has been shown
    pub fn acknowledge_minute_change(&mut self) {
        self.minute_changed = false;
    }

    /// Set the time of day
    ///
    /// Out-of-range values are rejected without touching the clock. On
    /// success the sub-second count restarts from `now_ms` and the
    /// minute-changed flag is raised so the display follows.
    pub fn set_time(
        &mut self,
        hours: u8,
        minutes: u8,
        seconds: u8,
        now_ms: u32,
    ) -> Result<(), TimeError> {
        if hours >= 24 || minutes >= 60 || seconds >= 60 {
            return Err(TimeError::OutOfRange {
                hours,
                minutes,
                seconds,
            });
        }

        self.hours = hours;
        self.minutes = minutes;
        self.seconds = seconds;
        self.millis = 0;
        self.last_tick_ms = now_ms;
        self.minute_changed = true;

        Ok(())
    }

    /// Advance the clock to the millisecond counter value `now_ms`
    ///
    /// Call as often as convenient. Frequent calls only accumulate; a call
    /// that finds one second due advances by exactly one; a call after a
    /// long gap advances by every whole second missed and always raises
    /// the minute-changed flag.
    pub fn tick(&mut self, now_ms: u32) {
        let elapsed = now_ms.wrapping_sub(self.last_tick_ms);
        self.last_tick_ms = now_ms;
        self.millis = self.millis.saturating_add(elapsed);

        if self.millis < MS_PER_SECOND {
            return;
        }

        if self.millis < 2 * MS_PER_SECOND {
            self.millis -= MS_PER_SECOND;
            self.advance_one_second();
        } else {
            self.minute_changed = true;
            let whole_seconds = self.millis / MS_PER_SECOND;
            self.millis %= MS_PER_SECOND;
            self.advance_seconds(whole_seconds);
        }
    }

    fn advance_one_second(&mut self) {
        self.seconds += 1;
        if self.seconds == 60 {
            self.seconds = 0;
            self.minutes += 1;
            self.minute_changed = true;
        }
        if self.minutes == 60 {
            self.minutes = 0;
            self.hours += 1;
        }
        if self.hours == 24 {
            self.hours = 0;
        }
    }

    fn advance_seconds(&mut self, seconds: u32) {
        let total_seconds = u32::from(self.seconds) + seconds;
        self.seconds = (total_seconds % 60) as u8;

        let total_minutes = u32::from(self.minutes) + total_seconds / 60;
        if total_minutes != u32::from(self.minutes) {
            self.minute_changed = true;
        }
        self.minutes = (total_minutes % 60) as u8;

        let carry_hours = (total_minutes / 60) % 24;
        self.hours = ((u32::from(self.hours) + carry_hours) % 24) as u8;
    }

    /// Flap positions showing the current time, hour tens first
    ///
    /// With `blank_leading_zero`, hours below 10 show a blank instead of
    /// a leading zero.
    pub fn display_digits(&self, blank_leading_zero: bool) -> [FlapPosition; 4] {
        let hour_tens = if blank_leading_zero && self.hours < 10 {
            FlapPosition::BLANK
        } else {
            digit(self.hours / 10)
        };

        [
            hour_tens,
            digit(self.hours % 10),
            digit(self.minutes / 10),
            digit(self.minutes % 10),
        ]
    }
}

fn digit(value: u8) -> FlapPosition {
    FlapPosition::digit_of(value).unwrap_or(FlapPosition::BLANK)
}
