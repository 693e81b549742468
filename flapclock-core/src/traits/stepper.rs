//! Stepper motor driver traits
//!
//! Two layers sit under the stepping engine:
//!
//! - [`StepperDriver`] is the per-channel motion contract the engine drives
//!   (speed, target, distance-to-go, one-step polling).
//! - [`CoilDriver`] is the bare coil interface of a unipolar driver board
//!   (ULN2003 and similar) that a [`MotorChannel`](crate::motion::MotorChannel)
//!   energises for each step.

/// Motor rotation direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    /// Positive step count
    Forward,
    /// Negative step count
    Backward,
}

impl Direction {
    /// Get the opposite direction
    pub fn opposite(self) -> Self {
        match self {
            Direction::Forward => Direction::Backward,
            Direction::Backward => Direction::Forward,
        }
    }

    /// Direction of travel for a signed step delta, `None` for zero
    pub fn of(delta: i32) -> Option<Self> {
        match delta {
            0 => None,
            d if d > 0 => Some(Direction::Forward),
            _ => Some(Direction::Backward),
        }
    }
}

/// Per-channel motion contract used by the stepping engine
///
/// Positions are in steps relative to an arbitrary zero that the caller
/// resets at the start of each move. Speeds are signed steps per second.
pub trait StepperDriver {
    /// Energise the coils so the motor holds and can step
    fn enable_outputs(&mut self);

    /// De-energise the coils (the motor turns freely and draws no current)
    fn disable_outputs(&mut self);

    /// Check if the outputs are energised
    fn outputs_enabled(&self) -> bool;

    /// Set the speed limit in steps per second
    ///
    /// Later calls to [`set_speed`](Self::set_speed) are clamped to it.
    fn set_max_speed(&mut self, steps_per_s: u32);

    /// Set the constant speed in steps per second, sign gives direction
    fn set_speed(&mut self, steps_per_s: i32);

    /// Get the most recently set speed
    fn speed(&self) -> i32;

    /// Redefine the current position, also clearing target and speed
    fn set_current_position(&mut self, position: i32);

    /// Get the current position in steps
    fn current_position(&self) -> i32;

    /// Set the absolute target position
    fn move_to(&mut self, target: i32);

    /// Get the target position
    fn target_position(&self) -> i32;

    /// Steps remaining until the target is reached
    fn distance_to_go(&self) -> i32 {
        self.target_position() - self.current_position()
    }

    /// Take one step at the commanded speed if one is due
    ///
    /// Returns `true` if a step was taken. Does not look at the target;
    /// the caller decides whether the channel still needs to move.
    fn run_speed(&mut self) -> bool;

    /// Check if the channel has no move in progress
    fn is_stopped(&self) -> bool {
        self.distance_to_go() == 0 && self.speed() == 0
    }
}

/// Coil interface of a unipolar stepper driver board
pub trait CoilDriver {
    /// Drive the coil pattern for the given electrical step count
    ///
    /// Implementations pick the phase from `step` (e.g. `step mod 8` for
    /// half-stepping), so stepping forward and backward is just a matter
    /// of the count moving up or down. The count must follow the rotor,
    /// so callers never reset it when they re-zero a position.
    fn energize(&mut self, step: i32);

    /// Switch every coil off
    fn release(&mut self);
}

/// Free-running microsecond time source
///
/// The counter is allowed to wrap; users compare timestamps with
/// wrapping arithmetic.
pub trait MicrosClock {
    /// Microseconds since an arbitrary epoch
    fn now_us(&self) -> u32;
}

impl<F> MicrosClock for F
where
    F: Fn() -> u32,
{
    fn now_us(&self) -> u32 {
        self()
    }
}
