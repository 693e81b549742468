//! Cooperative multi-motor stepping engine
//!
//! Owns every motor channel and advances them in lockstep: each call to
//! [`StepperEngine::tick_all`] polls each moving channel once, so all
//! wheels turn together with bounded skew and no locking. Everything runs
//! on the caller's thread; the engine never waits on its own except in
//! [`StepperEngine::run_to_completion_blocking`].

use crate::traits::StepperDriver;

/// Number of flap units on the clock
pub const NUM_CHANNELS: usize = 4;

/// Default move speed in steps/s (the 28BYJ-48 tops out around 1000)
pub const DEFAULT_MOVE_SPEED: u32 = 1000;

/// Stepping engine over `N` motor channels
#[derive(Debug)]
pub struct StepperEngine<D, const N: usize = NUM_CHANNELS> {
    channels: [D; N],
    move_speed: u32,
}

impl<D: StepperDriver, const N: usize> StepperEngine<D, N> {
    /// Take ownership of the channels and put them in the idle state
    pub fn new(channels: [D; N], move_speed: u32) -> Self {
        let mut engine = Self {
            channels,
            move_speed: move_speed.max(1),
        };
        engine.initialize();
        engine
    }

    /// Stop every channel, zero its position and switch the coils off
    ///
    /// Safe to call at any time; calling it twice changes nothing.
    pub fn initialize(&mut self) {
        let move_speed = self.move_speed;
        for channel in &mut self.channels {
            channel.set_max_speed(move_speed);
            channel.set_current_position(0);
            channel.set_speed(0);
            channel.disable_outputs();
        }
    }

    /// Poll every channel once
    ///
    /// Channels with distance left are given the chance to step; channels
    /// that have arrived get their speed forced to zero so a new move can
    /// be committed. Returns `true` while any channel still has distance
    /// to go.
    pub fn tick_all(&mut self) -> bool {
        let mut running = false;
        for channel in &mut self.channels {
            if channel.distance_to_go() != 0 {
                channel.run_speed();
                running = true;
            } else {
                channel.set_speed(0);
            }
        }
        running
    }

    /// Run every channel to its target before returning
    ///
    /// Coils are energised for the run and released afterwards to keep
    /// the motors cool while idle. This blocks for as long as the longest
    /// move takes (up to ~4 s for a full revolution at 1000 steps/s).
    pub fn run_to_completion_blocking(&mut self) {
        for channel in &mut self.channels {
            channel.enable_outputs();
        }

        while self.tick_all() {}

        for channel in &mut self.channels {
            channel.disable_outputs();
        }
    }

    /// Queue a move of `delta` steps relative to where the channel is now
    ///
    /// The position reference is reset to zero, so the target is simply
    /// `delta`. Does not check whether the channel is idle; callers that
    /// care must check [`is_idle`](Self::is_idle) first.
    pub fn set_relative_move(&mut self, channel: usize, delta: i32) {
        let Some(ch) = self.channels.get_mut(channel) else {
            return;
        };

        let speed = i32::try_from(self.move_speed).unwrap_or(i32::MAX);
        ch.set_current_position(0);
        ch.move_to(delta);
        ch.set_speed(match delta {
            0 => 0,
            d if d < 0 => -speed,
            _ => speed,
        });
    }

    /// Abandon every queued move, leaving the motors where they are
    pub fn stop_all(&mut self) {
        for channel in &mut self.channels {
            let here = channel.current_position();
            channel.set_current_position(here);
        }
    }

    /// Check if any channel still has distance to go
    ///
    /// Use before [`run_to_completion_blocking`](Self::run_to_completion_blocking)
    /// to avoid powering the coils for nothing.
    pub fn has_pending_move(&self) -> bool {
        self.channels.iter().any(|ch| ch.distance_to_go() != 0)
    }

    /// Check if a channel has neither distance left nor a commanded speed
    ///
    /// Unknown channels are reported idle.
    pub fn is_idle(&self, channel: usize) -> bool {
        self.channels.get(channel).map_or(true, |ch| ch.is_stopped())
    }

    /// Remaining steps on a channel (0 for unknown channels)
    pub fn distance_to_go(&self, channel: usize) -> i32 {
        self.channels.get(channel).map_or(0, |ch| ch.distance_to_go())
    }

    /// Commanded speed of a channel (0 for unknown channels)
    pub fn speed(&self, channel: usize) -> i32 {
        self.channels.get(channel).map_or(0, |ch| ch.speed())
    }

    /// Move speed used for new moves, in steps/s
    pub fn move_speed(&self) -> u32 {
        self.move_speed
    }

    /// Borrow a channel
    pub fn channel(&self, channel: usize) -> Option<&D> {
        self.channels.get(channel)
    }

    /// Number of channels
    pub fn len(&self) -> usize {
        N
    }

    /// Check if the engine has no channels
    pub fn is_empty(&self) -> bool {
        N == 0
    }
}
