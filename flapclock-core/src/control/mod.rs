//! Clock control loop
//!
//! [`FlapClock`] ties the pieces together: the clock model says what time
//! it is, the units turn that into step deltas, and the engine moves the
//! motors. Serial commands are applied here too.
//!
//! The loop is polled, not scheduled. Call [`FlapClock::service`] often,
//! then [`FlapClock::run_pending_blocking`] to carry out whatever moves it
//! queued. A unit that is still moving refuses a new move; the
//! minute-changed flag then stays raised and the next service retries.

use flapclock_protocol::{Command, CommandKind};

use crate::config::ClockConfig;
use crate::motion::{
    FlapPosition, SplitFlapUnit, StepLookupTable, StepperEngine, UnitError, UnitId, NUM_CHANNELS,
};
use crate::time::{ClockModel, TimeError};
use crate::traits::StepperDriver;

/// Errors from applying a serial command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CommandError {
    /// Unit index is not 0-3
    UnknownUnit(i32),
    /// Flap position is not 0-10
    InvalidPosition(i32),
    /// Unit refused the move
    Unit(UnitError),
    /// Clock refused the time
    Time(TimeError),
}

impl From<UnitError> for CommandError {
    fn from(err: UnitError) -> Self {
        CommandError::Unit(err)
    }
}

impl From<TimeError> for CommandError {
    fn from(err: TimeError) -> Self {
        CommandError::Time(err)
    }
}

/// What a successfully applied command did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Outcome {
    /// Unit committed a move of `steps`
    Moved { unit: UnitId, steps: i32 },
    /// All queued moves dropped
    Stopped,
    /// Clock set; the display follows on the next service
    TimeSet,
    /// Unit motor nudged by `steps`, position unchanged
    Trimmed { unit: UnitId, steps: i32 },
}

/// Moves queued by one display update
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DisplayMoves {
    /// Step delta committed per unit, `None` where the unit did not move
    pub steps: [Option<i32>; NUM_CHANNELS],
    /// First unit that refused its move
    pub refused: Option<UnitError>,
}

impl DisplayMoves {
    /// Units that committed a move, with their step delta
    pub fn moved(&self) -> impl Iterator<Item = (UnitId, i32)> + '_ {
        UnitId::ALL
            .into_iter()
            .zip(self.steps)
            .filter_map(|(id, steps)| steps.map(|steps| (id, steps)))
    }
}

/// The whole clock: four units on one engine, driven by the clock model
pub struct FlapClock<D> {
    engine: StepperEngine<D, NUM_CHANNELS>,
    units: [SplitFlapUnit; NUM_CHANNELS],
    lookup: StepLookupTable,
    clock: ClockModel,
    blank_leading_zero: bool,
}

impl<D: StepperDriver> FlapClock<D> {
    /// Build the clock from its motor channels
    ///
    /// `config` is expected to have passed [`ClockConfig::validate`].
    pub fn new(channels: [D; NUM_CHANNELS], config: &ClockConfig) -> Self {
        Self {
            engine: StepperEngine::new(channels, config.move_speed),
            units: UnitId::ALL.map(|id| SplitFlapUnit::with_config(id, config.unit(id))),
            lookup: config.lookup,
            clock: ClockModel::new(),
            blank_leading_zero: config.blank_leading_zero,
        }
    }

    /// Advance the clock and queue display moves if the minute changed
    ///
    /// Returns `None` when the minute has not changed. Otherwise returns
    /// the moves queued; if a unit refused, the flag is left raised so the
    /// next service retries, and units that did accept keep their new
    /// position.
    pub fn service(&mut self, now_ms: u32) -> Option<DisplayMoves> {
        self.clock.tick(now_ms);
        if !self.clock.minute_changed() {
            return None;
        }

        let digits = self.clock.display_digits(self.blank_leading_zero);
        let moves = self.show_digits(digits);
        if moves.refused.is_none() {
            self.clock.acknowledge_minute_change();
        }
        Some(moves)
    }

    /// Queue a move on every unit not already showing its digit
    ///
    /// Every unit is attempted; the first refusal is kept in
    /// [`DisplayMoves::refused`].
    pub fn show_digits(&mut self, digits: [FlapPosition; NUM_CHANNELS]) -> DisplayMoves {
        let mut moves = DisplayMoves::default();
        for ((unit, digit), steps) in self.units.iter_mut().zip(digits).zip(&mut moves.steps) {
            unit.set_next_position(digit);
            if unit.position() == digit {
                continue;
            }
            match unit.commit_steps(&mut self.engine, &self.lookup) {
                Ok(delta) => *steps = Some(delta),
                Err(err) => {
                    moves.refused.get_or_insert(err);
                }
            }
        }
        moves
    }

    /// Apply a serial command
    pub fn handle_command(&mut self, command: Command, now_ms: u32) -> Result<Outcome, CommandError> {
        match command.kind {
            CommandKind::Move => {
                let id = unit_id(command.param(0))?;
                let raw = command.param(1);
                let position = u8::try_from(raw)
                    .ok()
                    .and_then(FlapPosition::new)
                    .ok_or(CommandError::InvalidPosition(raw))?;

                let unit = &mut self.units[id.index()];
                unit.set_next_position(position);
                let steps = unit.commit_steps(&mut self.engine, &self.lookup)?;
                Ok(Outcome::Moved { unit: id, steps })
            }
            CommandKind::Stop => {
                self.engine.stop_all();
                Ok(Outcome::Stopped)
            }
            CommandKind::Time => {
                let [hours, minutes, seconds] = command.params.map(time_field);
                self.clock.set_time(hours, minutes, seconds, now_ms)?;
                Ok(Outcome::TimeSet)
            }
            CommandKind::Setf => {
                let id = unit_id(command.param(0))?;
                let steps = command.param(1);
                self.units[id.index()].trim(&mut self.engine, steps);
                Ok(Outcome::Trimmed { unit: id, steps })
            }
        }
    }

    /// Run queued moves to completion, if there are any
    ///
    /// Returns `true` if the motors were run.
    pub fn run_pending_blocking(&mut self) -> bool {
        if !self.engine.has_pending_move() {
            return false;
        }
        self.engine.run_to_completion_blocking();
        true
    }

    /// The clock model
    pub fn clock(&self) -> &ClockModel {
        &self.clock
    }

    /// The stepping engine
    pub fn engine(&self) -> &StepperEngine<D, NUM_CHANNELS> {
        &self.engine
    }

    /// One unit
    pub fn unit(&self, id: UnitId) -> &SplitFlapUnit {
        &self.units[id.index()]
    }

    /// Positions currently committed on each unit, hour tens first
    pub fn positions(&self) -> [FlapPosition; NUM_CHANNELS] {
        self.units.each_ref().map(SplitFlapUnit::position)
    }
}

fn unit_id(raw: i32) -> Result<UnitId, CommandError> {
    usize::try_from(raw)
        .ok()
        .and_then(UnitId::from_index)
        .ok_or(CommandError::UnknownUnit(raw))
}

// Values that do not fit a u8 saturate, so the clock reports them out of range
fn time_field(raw: i32) -> u8 {
    u8::try_from(raw).unwrap_or(u8::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::motion::engine::tests::InstantStepper;

    fn flap_clock(config: &ClockConfig) -> FlapClock<InstantStepper> {
        FlapClock::new(core::array::from_fn(|_| InstantStepper::default()), config)
    }

    fn pos(value: u8) -> FlapPosition {
        FlapPosition::new(value).unwrap()
    }

    fn cmd(kind: CommandKind, params: [i32; 3]) -> Command {
        Command::with_params(kind, params)
    }

    #[test]
    fn test_time_command_updates_display_on_service() {
        let mut clock = flap_clock(&ClockConfig::default());
        let outcome = clock.handle_command(cmd(CommandKind::Time, [12, 34, 0]), 0);
        assert_eq!(outcome, Ok(Outcome::TimeSet));

        let moves = clock.service(0).unwrap();
        assert_eq!(moves.refused, None);
        assert!(!clock.clock().minute_changed());

        // Hour tens: digit 1 on a mirrored wheel is index 8, reached from
        // blank by wrapping, and the motor is reversed
        assert_eq!(moves.steps[0], Some(-(2979 + 4096 - 3724)));
        assert_eq!(clock.engine().distance_to_go(0), -(2979 + 4096 - 3724));
        // Minute ones: blank to 4 on a direct, forward wheel
        assert_eq!(moves.steps[3], Some(1489 + 4096 - 3724));
        assert_eq!(clock.engine().distance_to_go(3), 1489 + 4096 - 3724);
        assert_eq!(moves.moved().count(), NUM_CHANNELS);

        assert!(clock.run_pending_blocking());
        assert!(!clock.engine().has_pending_move());
        assert_eq!(clock.positions(), [pos(1), pos(2), pos(3), pos(4)]);
        assert!(!clock.run_pending_blocking());
    }

    #[test]
    fn test_service_without_minute_change_does_nothing() {
        let mut clock = flap_clock(&ClockConfig::default());
        assert_eq!(clock.service(500), None);
        assert!(!clock.engine().has_pending_move());
    }

    #[test]
    fn test_busy_unit_keeps_flag_until_idle() {
        let mut clock = flap_clock(&ClockConfig::default());
        clock.handle_command(cmd(CommandKind::Move, [3, 5, 0]), 0).unwrap();
        clock.handle_command(cmd(CommandKind::Time, [12, 34, 0]), 0).unwrap();

        let moves = clock.service(0).unwrap();
        assert_eq!(moves.refused, Some(UnitError::MotorBusy(UnitId::MinOnes)));
        assert_eq!(moves.steps[3], None);
        assert!(moves.steps[0].is_some());
        assert!(clock.clock().minute_changed());
        assert_eq!(clock.unit(UnitId::HourTens).position(), pos(1));
        assert_eq!(clock.unit(UnitId::MinOnes).position(), pos(5));

        clock.run_pending_blocking();
        let moves = clock.service(10).unwrap();
        assert_eq!(moves.refused, None);
        assert!(!clock.clock().minute_changed());

        // Only the unit that was refused moves on the retry
        assert_eq!(clock.engine().distance_to_go(0), 0);
        assert_ne!(clock.engine().distance_to_go(3), 0);
        clock.run_pending_blocking();
        assert_eq!(clock.positions(), [pos(1), pos(2), pos(3), pos(4)]);
    }

    #[test]
    fn test_minute_rollover_moves_only_changed_units() {
        let mut clock = flap_clock(&ClockConfig::default());
        clock.handle_command(cmd(CommandKind::Time, [10, 0, 59]), 0).unwrap();
        clock.service(0).unwrap();
        clock.run_pending_blocking();

        let moves = clock.service(1000).unwrap();
        assert_eq!(moves.steps, [None, None, None, Some(372)]);
        let mut moved = moves.moved();
        assert_eq!(moved.next(), Some((UnitId::MinOnes, 372)));
        assert_eq!(moved.next(), None);
        assert_eq!(clock.engine().distance_to_go(0), 0);
        assert_eq!(clock.engine().distance_to_go(1), 0);
        assert_eq!(clock.engine().distance_to_go(2), 0);
        assert_eq!(clock.engine().distance_to_go(3), 372);
    }

    #[test]
    fn test_blank_leading_zero() {
        let config = ClockConfig {
            blank_leading_zero: true,
            ..ClockConfig::default()
        };
        let mut clock = flap_clock(&config);
        clock.handle_command(cmd(CommandKind::Time, [7, 5, 0]), 0).unwrap();
        clock.service(0).unwrap();
        clock.run_pending_blocking();

        assert_eq!(
            clock.positions(),
            [FlapPosition::BLANK, pos(7), pos(0), pos(5)]
        );
        // Already blank, so the hour tens motor never moved
        assert_eq!(clock.engine().channel(0).unwrap().steps_taken, 0);
    }

    #[test]
    fn test_move_command() {
        let mut clock = flap_clock(&ClockConfig::default());
        let outcome = clock.handle_command(cmd(CommandKind::Move, [1, 3, 0]), 0);

        // Hour ones: mirrored so digit 3 is index 6, motor not reversed
        assert_eq!(
            outcome,
            Ok(Outcome::Moved {
                unit: UnitId::HourOnes,
                steps: 2234 + 4096 - 3724,
            })
        );
        assert_eq!(clock.unit(UnitId::HourOnes).position(), pos(3));
    }

    #[test]
    fn test_move_command_rejects_bad_arguments() {
        let mut clock = flap_clock(&ClockConfig::default());
        assert_eq!(
            clock.handle_command(cmd(CommandKind::Move, [4, 1, 0]), 0),
            Err(CommandError::UnknownUnit(4))
        );
        assert_eq!(
            clock.handle_command(cmd(CommandKind::Move, [-1, 1, 0]), 0),
            Err(CommandError::UnknownUnit(-1))
        );
        assert_eq!(
            clock.handle_command(cmd(CommandKind::Move, [0, 11, 0]), 0),
            Err(CommandError::InvalidPosition(11))
        );
        assert!(!clock.engine().has_pending_move());
    }

    #[test]
    fn test_move_command_on_busy_unit() {
        let mut clock = flap_clock(&ClockConfig::default());
        clock.handle_command(cmd(CommandKind::Move, [2, 1, 0]), 0).unwrap();
        assert_eq!(
            clock.handle_command(cmd(CommandKind::Move, [2, 2, 0]), 0),
            Err(CommandError::Unit(UnitError::MotorBusy(UnitId::MinTens)))
        );
        assert_eq!(clock.unit(UnitId::MinTens).position(), pos(1));
    }

    #[test]
    fn test_stop_drops_pending_moves() {
        let mut clock = flap_clock(&ClockConfig::default());
        clock.handle_command(cmd(CommandKind::Move, [0, 4, 0]), 0).unwrap();
        clock.handle_command(cmd(CommandKind::Setf, [3, 50, 0]), 0).unwrap();
        assert!(clock.engine().has_pending_move());

        assert_eq!(
            clock.handle_command(Command::new(CommandKind::Stop), 0),
            Ok(Outcome::Stopped)
        );
        assert!(!clock.engine().has_pending_move());
        assert!(!clock.run_pending_blocking());
    }

    #[test]
    fn test_setf_trims_without_moving_position() {
        let mut clock = flap_clock(&ClockConfig::default());
        assert_eq!(
            clock.handle_command(cmd(CommandKind::Setf, [2, -20, 0]), 0),
            Ok(Outcome::Trimmed {
                unit: UnitId::MinTens,
                steps: -20,
            })
        );
        assert_eq!(clock.engine().distance_to_go(2), -20);
        assert!(clock.unit(UnitId::MinTens).position().is_blank());

        clock.run_pending_blocking();
        assert_eq!(clock.engine().channel(2).unwrap().steps_taken, 20);
    }

    #[test]
    fn test_invalid_time_rejected() {
        let mut clock = flap_clock(&ClockConfig::default());
        assert_eq!(
            clock.handle_command(cmd(CommandKind::Time, [24, 0, 0]), 0),
            Err(CommandError::Time(TimeError::OutOfRange {
                hours: 24,
                minutes: 0,
                seconds: 0,
            }))
        );
        assert!(matches!(
            clock.handle_command(cmd(CommandKind::Time, [-1, 0, 0]), 0),
            Err(CommandError::Time(_))
        ));
        assert!(!clock.clock().minute_changed());
        assert_eq!(clock.clock().hms(), (0, 0, 0));
    }

    #[test]
    fn test_custom_move_speed_reaches_engine() {
        let config = ClockConfig {
            move_speed: 400,
            ..ClockConfig::default()
        };
        let clock = flap_clock(&config);
        assert_eq!(clock.engine().move_speed(), 400);
        assert_eq!(clock.engine().channel(1).unwrap().max_speed, 400);
    }
}
