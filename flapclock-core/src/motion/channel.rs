//! Constant-speed stepper channel
//!
//! Step bookkeeping for one motor: position, target, speed and step
//! timing. Steps are emitted by polling [`StepperDriver::run_speed`], which
//! takes at most one step per call and only once the step interval for the
//! commanded speed has elapsed. There is no acceleration ramp; the motor
//! jumps straight to its speed, which the 28BYJ-48 handles fine at the
//! speeds used here.

use crate::traits::{CoilDriver, Direction, MicrosClock, StepperDriver};

/// Microseconds in one second, for step interval calculation
const MICROS_PER_SECOND: u32 = 1_000_000;

/// One motor channel: a coil driver plus its motion state
#[derive(Debug)]
pub struct MotorChannel<C, K> {
    coils: C,
    clock: K,
    /// Current position in steps
    position: i32,
    /// Target position in steps
    target: i32,
    /// Electrical step count, never re-zeroed so the coils stay in phase
    /// with the rotor across moves
    phase: i32,
    /// Commanded speed in steps/s (sign is direction)
    speed: i32,
    /// Speed limit in steps/s
    max_speed: u32,
    /// Time between steps in µs, 0 when stopped
    step_interval_us: u32,
    /// Timestamp of the previous step
    last_step_us: u32,
    /// Coils energised
    enabled: bool,
}

impl<C: CoilDriver, K: MicrosClock> MotorChannel<C, K> {
    /// Create a stopped, disabled channel at position 0
    pub fn new(coils: C, clock: K) -> Self {
        Self {
            coils,
            clock,
            position: 0,
            target: 0,
            phase: 0,
            speed: 0,
            max_speed: 1,
            step_interval_us: 0,
            last_step_us: 0,
            enabled: false,
        }
    }

    /// Direction of the commanded speed, `None` when stopped
    pub fn direction(&self) -> Option<Direction> {
        Direction::of(self.speed)
    }

    /// Current step interval in microseconds (0 when stopped)
    pub fn step_interval_us(&self) -> u32 {
        self.step_interval_us
    }

    /// Electrical step count handed to the coil driver
    pub fn phase(&self) -> i32 {
        self.phase
    }

    /// Borrow the coil driver
    pub fn coils(&self) -> &C {
        &self.coils
    }

    /// Give back the coil driver and clock
    pub fn release(self) -> (C, K) {
        (self.coils, self.clock)
    }
}

impl<C: CoilDriver, K: MicrosClock> StepperDriver for MotorChannel<C, K> {
    fn enable_outputs(&mut self) {
        self.enabled = true;
        // Re-assert the current phase so the rotor holds where it stopped
        self.coils.energize(self.phase);
    }

    fn disable_outputs(&mut self) {
        self.enabled = false;
        self.coils.release();
    }

    fn outputs_enabled(&self) -> bool {
        self.enabled
    }

    fn set_max_speed(&mut self, steps_per_s: u32) {
        self.max_speed = steps_per_s.max(1);
        // Re-clamp the current speed against the new limit
        self.set_speed(self.speed);
    }

    fn set_speed(&mut self, steps_per_s: i32) {
        let limit = i32::try_from(self.max_speed).unwrap_or(i32::MAX);
        let speed = steps_per_s.clamp(-limit, limit);
        self.speed = speed;
        self.step_interval_us = if speed == 0 {
            0
        } else {
            MICROS_PER_SECOND / speed.unsigned_abs()
        };
    }

    fn speed(&self) -> i32 {
        self.speed
    }

    fn set_current_position(&mut self, position: i32) {
        self.position = position;
        self.target = position;
        self.speed = 0;
        self.step_interval_us = 0;
    }

    fn current_position(&self) -> i32 {
        self.position
    }

    fn move_to(&mut self, target: i32) {
        self.target = target;
    }

    fn target_position(&self) -> i32 {
        self.target
    }

    fn run_speed(&mut self) -> bool {
        if self.step_interval_us == 0 {
            return false;
        }

        let now = self.clock.now_us();
        if now.wrapping_sub(self.last_step_us) < self.step_interval_us {
            return false;
        }

        let delta = match self.direction() {
            Some(Direction::Forward) => 1,
            Some(Direction::Backward) => -1,
            None => return false,
        };
        self.position += delta;
        self.phase = self.phase.wrapping_add(delta);
        if self.enabled {
            self.coils.energize(self.phase);
        }
        self.last_step_us = now;
        true
    }
}
