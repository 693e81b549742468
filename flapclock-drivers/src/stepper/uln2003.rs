//! ULN2003 unipolar stepper driver
//!
//! The ULN2003 board is four Darlington sinks, one per coil of a 28BYJ-48.
//! There is no step/dir logic on the board, so the coil pattern for every
//! step comes from here. Half-stepping alternates one and two energised
//! coils, giving 8 phases per electrical cycle and 4096 steps per output
//! shaft revolution.

use core::convert::Infallible;

use embedded_hal::digital::{OutputPin, PinState};
use flapclock_core::traits::CoilDriver;

/// Coil pattern per half-step phase, bit `n` driving input `IN(n+1)`
pub const HALF_STEP_SEQUENCE: [u8; 8] = [
    0b0001, // IN1
    0b0011, // IN1 + IN2
    0b0010, // IN2
    0b0110, // IN2 + IN3
    0b0100, // IN3
    0b1100, // IN3 + IN4
    0b1000, // IN4
    0b1001, // IN4 + IN1
];

/// ULN2003 driver over four GPIO outputs
///
/// Pins are given in board order `IN1..IN4`. GPIO writes on the supported
/// targets cannot fail, which the `Infallible` bound makes explicit.
pub struct Uln2003<P> {
    pins: [P; 4],
    /// Last pattern written, 0 when released
    pattern: u8,
}

impl<P> Uln2003<P>
where
    P: OutputPin<Error = Infallible>,
{
    /// Create a driver with every coil off
    pub fn new(pins: [P; 4]) -> Self {
        let mut driver = Self { pins, pattern: 0xff };
        driver.release();
        driver
    }

    /// Phase (0-7) for an electrical step count
    pub fn phase(step: i32) -> usize {
        step.rem_euclid(HALF_STEP_SEQUENCE.len() as i32) as usize
    }

    /// Pattern currently on the pins
    pub fn pattern(&self) -> u8 {
        self.pattern
    }

    /// Give the pins back
    pub fn release_pins(self) -> [P; 4] {
        self.pins
    }

    fn write(&mut self, pattern: u8) {
        if pattern == self.pattern {
            return;
        }
        for (bit, pin) in self.pins.iter_mut().enumerate() {
            let state = PinState::from(pattern & (1 << bit) != 0);
            match pin.set_state(state) {
                Ok(()) => {}
                Err(never) => match never {},
            }
        }
        self.pattern = pattern;
    }
}

impl<P> CoilDriver for Uln2003<P>
where
    P: OutputPin<Error = Infallible>,
{
    fn energize(&mut self, step: i32) {
        self.write(HALF_STEP_SEQUENCE[Self::phase(step)]);
    }

    fn release(&mut self) {
        self.write(0);
    }
}
