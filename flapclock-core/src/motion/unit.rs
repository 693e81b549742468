//! Split-flap units
//!
//! A unit is one flap wheel. It keeps the logical position (digit or
//! blank), turns a requested position into a step delta through the
//! lookup table, and hands the delta to its channel on the engine. Units
//! never own their motor; they only know which engine channel is theirs.
//!
//! Two mechanical facts differ between units and live in [`UnitConfig`]:
//!
//! - the hour wheels carry their flaps in reverse order, so digit `d`
//!   sits at lookup index `9 - d` ([`FlapOrdering::Mirrored`]);
//! - neighbouring motors are mounted facing each other, so every other
//!   one has to turn the opposite way to move the flaps forward
//!   ([`UnitConfig::reversed`]).

use super::engine::StepperEngine;
use super::lookup::{StepLookupTable, BLANK_INDEX};
use crate::traits::StepperDriver;

/// Which wheel a unit drives, in mounting order left to right
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UnitId {
    HourTens = 0,
    HourOnes = 1,
    MinTens = 2,
    MinOnes = 3,
}

impl UnitId {
    /// Every unit in mounting order
    pub const ALL: [UnitId; 4] = [
        UnitId::HourTens,
        UnitId::HourOnes,
        UnitId::MinTens,
        UnitId::MinOnes,
    ];

    /// Slot index, which is also the engine channel
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Look up a unit by slot index
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Check if this is one of the hour wheels
    pub const fn is_hour(self) -> bool {
        matches!(self, UnitId::HourTens | UnitId::HourOnes)
    }
}

/// Order of the digit flaps around a wheel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FlapOrdering {
    /// Digit `d` at lookup index `d`
    Direct,
    /// Digit `d` at lookup index `9 - d`
    Mirrored,
}

/// Mechanical configuration of one unit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UnitConfig {
    /// Flap order on the wheel
    pub ordering: FlapOrdering,
    /// Motor turns backward to advance the flaps
    pub reversed: bool,
}

impl UnitConfig {
    /// Stock assembly: hour wheels mirrored, even slots reversed
    pub const fn for_unit(id: UnitId) -> Self {
        Self {
            ordering: if id.is_hour() {
                FlapOrdering::Mirrored
            } else {
                FlapOrdering::Direct
            },
            reversed: id.index() % 2 == 0,
        }
    }

    /// Lookup index of a position on a wheel with this configuration
    pub fn lookup_index(&self, position: FlapPosition) -> u8 {
        match (position.digit(), self.ordering) {
            (None, _) => BLANK_INDEX,
            (Some(d), FlapOrdering::Direct) => d,
            (Some(d), FlapOrdering::Mirrored) => 9 - d,
        }
    }

    /// Apply the mounting direction to a forward step count
    pub fn orient(&self, steps: i32) -> i32 {
        if self.reversed {
            -steps
        } else {
            steps
        }
    }
}

/// A flap position: digits 0-9, or 10 for blank
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FlapPosition(u8);

impl FlapPosition {
    /// The blank flap
    pub const BLANK: Self = Self(BLANK_INDEX);

    /// Position from a raw value, `None` if above 10
    pub const fn new(value: u8) -> Option<Self> {
        if value <= BLANK_INDEX {
            Some(Self(value))
        } else {
            None
        }
    }

    /// Position showing a digit, `None` if above 9
    pub const fn digit_of(digit: u8) -> Option<Self> {
        if digit < BLANK_INDEX {
            Some(Self(digit))
        } else {
            None
        }
    }

    /// Raw value (0-10)
    pub const fn value(self) -> u8 {
        self.0
    }

    /// The digit shown, `None` for blank
    pub const fn digit(self) -> Option<u8> {
        if self.0 < BLANK_INDEX {
            Some(self.0)
        } else {
            None
        }
    }

    /// Check if this is the blank flap
    pub const fn is_blank(self) -> bool {
        self.0 == BLANK_INDEX
    }
}

/// Errors from committing a unit move
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UnitError {
    /// The unit's motor is still moving; poll until idle and retry
    MotorBusy(UnitId),
}

/// One flap wheel and its logical position bookkeeping
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitFlapUnit {
    id: UnitId,
    config: UnitConfig,
    current_pos: FlapPosition,
    next_pos: FlapPosition,
    current_lookup_idx: u8,
    next_lookup_idx: u8,
}

impl SplitFlapUnit {
    /// Unit with the stock configuration for its slot
    pub fn new(id: UnitId) -> Self {
        Self::with_config(id, UnitConfig::for_unit(id))
    }

    /// Unit with an explicit mechanical configuration
    ///
    /// Starts out assumed to be on the blank flap; run a calibration
    /// (trim) to make the wheel match.
    pub fn with_config(id: UnitId, config: UnitConfig) -> Self {
        Self {
            id,
            config,
            current_pos: FlapPosition::BLANK,
            next_pos: FlapPosition::BLANK,
            current_lookup_idx: BLANK_INDEX,
            next_lookup_idx: BLANK_INDEX,
        }
    }

    /// Which wheel this is
    pub fn id(&self) -> UnitId {
        self.id
    }

    /// Mechanical configuration
    pub fn config(&self) -> &UnitConfig {
        &self.config
    }

    /// Committed position
    pub fn position(&self) -> FlapPosition {
        self.current_pos
    }

    /// Position recorded by the last [`set_next_position`](Self::set_next_position)
    pub fn next_position(&self) -> FlapPosition {
        self.next_pos
    }

    /// Lookup index of the committed position
    pub fn lookup_index(&self) -> u8 {
        self.current_lookup_idx
    }

    /// Lookup index of the pending position
    pub fn next_lookup_index(&self) -> u8 {
        self.next_lookup_idx
    }

    /// Record the position to move to on the next commit
    ///
    /// Does not queue anything on the motor.
    pub fn set_next_position(&mut self, position: FlapPosition) {
        self.next_pos = position;
        self.next_lookup_idx = self.config.lookup_index(position);
    }

    /// Step delta from the committed to the pending position
    ///
    /// Always moves the flaps forward, wrapping through a full revolution
    /// when needed; the sign is the motor direction after applying the
    /// mounting orientation.
    pub fn pending_steps(&self, table: &StepLookupTable) -> i32 {
        let forward = table.forward_steps(self.current_lookup_idx, self.next_lookup_idx);
        self.config.orient(forward)
    }

    /// Queue the move to the pending position and commit it
    ///
    /// Refuses while the motor is still moving (distance left or a
    /// non-zero speed), leaving the unit untouched. On success the pending
    /// position becomes the committed one and the commanded delta is
    /// returned.
    pub fn commit_steps<D: StepperDriver, const N: usize>(
        &mut self,
        engine: &mut StepperEngine<D, N>,
        table: &StepLookupTable,
    ) -> Result<i32, UnitError> {
        let channel = self.id.index();
        if engine.distance_to_go(channel) != 0 || engine.speed(channel) != 0 {
            return Err(UnitError::MotorBusy(self.id));
        }

        let steps = self.pending_steps(table);
        self.trim(engine, steps);

        self.current_pos = self.next_pos;
        self.current_lookup_idx = self.next_lookup_idx;

        Ok(steps)
    }

    /// Move the motor by `steps` without touching position bookkeeping
    ///
    /// For calibration: nudges the wheel into alignment while the logical
    /// position stays what it was.
    pub fn trim<D: StepperDriver, const N: usize>(
        &self,
        engine: &mut StepperEngine<D, N>,
        steps: i32,
    ) {
        engine.set_relative_move(self.id.index(), steps);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::motion::engine::tests::engine;
    use proptest::prelude::*;

    fn pos(value: u8) -> FlapPosition {
        FlapPosition::new(value).unwrap()
    }

    #[test]
    fn test_units_start_blank() {
        for id in UnitId::ALL {
            let unit = SplitFlapUnit::new(id);
            assert_eq!(unit.position(), FlapPosition::BLANK);
            assert_eq!(unit.lookup_index(), BLANK_INDEX);
        }
    }

    #[test]
    fn test_stock_config_per_slot() {
        assert_eq!(
            UnitConfig::for_unit(UnitId::HourTens),
            UnitConfig { ordering: FlapOrdering::Mirrored, reversed: true }
        );
        assert_eq!(
            UnitConfig::for_unit(UnitId::HourOnes),
            UnitConfig { ordering: FlapOrdering::Mirrored, reversed: false }
        );
        assert_eq!(
            UnitConfig::for_unit(UnitId::MinTens),
            UnitConfig { ordering: FlapOrdering::Direct, reversed: true }
        );
        assert_eq!(
            UnitConfig::for_unit(UnitId::MinOnes),
            UnitConfig { ordering: FlapOrdering::Direct, reversed: false }
        );
    }

    #[test]
    fn test_flap_position_bounds() {
        assert_eq!(FlapPosition::new(10), Some(FlapPosition::BLANK));
        assert_eq!(FlapPosition::new(11), None);
        assert_eq!(FlapPosition::digit_of(10), None);
        assert_eq!(pos(7).digit(), Some(7));
        assert!(FlapPosition::BLANK.is_blank());
    }

    #[test]
    fn test_unit_id_index_roundtrip() {
        for (i, id) in UnitId::ALL.iter().enumerate() {
            assert_eq!(id.index(), i);
            assert_eq!(UnitId::from_index(i), Some(*id));
        }
        assert_eq!(UnitId::from_index(4), None);
    }

    #[test]
    fn test_blank_maps_to_blank_index_for_every_unit() {
        for id in UnitId::ALL {
            let mut unit = SplitFlapUnit::new(id);
            unit.set_next_position(FlapPosition::BLANK);
            assert_eq!(unit.next_lookup_index(), BLANK_INDEX);
        }
    }

    #[test]
    fn test_set_next_position_leaves_committed_state() {
        let mut unit = SplitFlapUnit::new(UnitId::MinOnes);
        unit.set_next_position(pos(4));

        assert_eq!(unit.position(), FlapPosition::BLANK);
        assert_eq!(unit.next_position(), pos(4));
        assert_eq!(unit.next_lookup_index(), 4);
    }

    #[test]
    fn test_commit_from_blank_to_zero() {
        let table = StepLookupTable::DEFAULT;
        let mut engine = engine();
        let mut unit = SplitFlapUnit::new(UnitId::MinOnes);

        unit.set_next_position(pos(0));
        let steps = unit.commit_steps(&mut engine, &table).unwrap();

        // blank (3724) -> 0 wraps forward through 4096
        assert_eq!(steps, 372);
        assert_eq!(engine.distance_to_go(UnitId::MinOnes.index()), 372);
        assert_eq!(unit.position(), pos(0));
    }

    #[test]
    fn test_reversed_unit_moves_negative() {
        let table = StepLookupTable::DEFAULT;
        let mut engine = engine();
        let mut unit = SplitFlapUnit::new(UnitId::MinTens);

        unit.set_next_position(pos(0));
        let steps = unit.commit_steps(&mut engine, &table).unwrap();

        assert_eq!(steps, -372);
        assert_eq!(engine.speed(UnitId::MinTens.index()), -1000);
    }

    #[test]
    fn test_hour_unit_uses_mirrored_offsets() {
        let table = StepLookupTable::DEFAULT;
        let mut engine = engine();
        let mut unit = SplitFlapUnit::new(UnitId::HourOnes);

        unit.set_next_position(pos(0));
        unit.commit_steps(&mut engine, &table).unwrap();
        engine.run_to_completion_blocking();
        assert_eq!(unit.lookup_index(), 9);

        // digit 0 (index 9, 3351) -> digit 9 (index 0, 0): wraps
        unit.set_next_position(pos(9));
        let steps = unit.commit_steps(&mut engine, &table).unwrap();
        assert_eq!(steps, 745);
        assert_eq!(unit.lookup_index(), 0);
    }

    #[test]
    fn test_commit_rejected_while_moving() {
        let table = StepLookupTable::DEFAULT;
        let mut engine = engine();
        let mut unit = SplitFlapUnit::new(UnitId::MinOnes);

        unit.set_next_position(pos(3));
        unit.commit_steps(&mut engine, &table).unwrap();
        let before = unit.clone();

        unit.set_next_position(pos(5));
        let pending = unit.clone();
        assert_eq!(
            unit.commit_steps(&mut engine, &table),
            Err(UnitError::MotorBusy(UnitId::MinOnes))
        );
        assert_eq!(unit, pending);
        assert_eq!(unit.position(), before.position());
    }

    #[test]
    fn test_commit_rejected_while_speed_not_yet_cleared() {
        let table = StepLookupTable::DEFAULT;
        let mut engine = engine();
        let mut unit = SplitFlapUnit::new(UnitId::MinOnes);

        unit.set_next_position(pos(1));
        unit.commit_steps(&mut engine, &table).unwrap();
        // Step until arrival without the final speed-clearing poll
        while engine.distance_to_go(UnitId::MinOnes.index()) != 0 {
            engine.tick_all();
        }
        assert_ne!(engine.speed(UnitId::MinOnes.index()), 0);

        unit.set_next_position(pos(2));
        assert!(unit.commit_steps(&mut engine, &table).is_err());

        engine.tick_all();
        assert_eq!(unit.commit_steps(&mut engine, &table), Ok(373));
    }

    #[test]
    fn test_retry_after_idle_is_deterministic() {
        let table = StepLookupTable::DEFAULT;
        let mut engine = engine();
        let mut unit = SplitFlapUnit::new(UnitId::HourTens);

        unit.set_next_position(pos(1));
        unit.commit_steps(&mut engine, &table).unwrap();
        unit.set_next_position(pos(2));
        assert!(unit.commit_steps(&mut engine, &table).is_err());

        engine.run_to_completion_blocking();
        let mut twin = unit.clone();
        let mut twin_engine = crate::motion::engine::tests::engine();

        let a = unit.commit_steps(&mut engine, &table).unwrap();
        let b = twin.commit_steps(&mut twin_engine, &table).unwrap();
        assert_eq!(a, b);
        assert_eq!(unit, twin);
    }

    #[test]
    fn test_same_position_commits_zero_steps() {
        let table = StepLookupTable::DEFAULT;
        let mut engine = engine();
        let mut unit = SplitFlapUnit::new(UnitId::MinTens);

        unit.set_next_position(FlapPosition::BLANK);
        assert_eq!(unit.commit_steps(&mut engine, &table), Ok(0));
        assert_eq!(engine.speed(UnitId::MinTens.index()), 0);
        assert!(!engine.has_pending_move());
    }

    #[test]
    fn test_trim_skips_bookkeeping() {
        let mut engine = engine();
        let mut unit = SplitFlapUnit::new(UnitId::HourOnes);
        unit.set_next_position(pos(6));

        unit.trim(&mut engine, -40);

        assert_eq!(engine.distance_to_go(UnitId::HourOnes.index()), -40);
        assert_eq!(engine.speed(UnitId::HourOnes.index()), -1000);
        assert_eq!(unit.position(), FlapPosition::BLANK);
        assert_eq!(unit.next_position(), pos(6));
    }

    #[test]
    fn test_full_cycle_of_digits_sums_to_revolution() {
        let table = StepLookupTable::DEFAULT;
        let mut engine = engine();
        let mut unit = SplitFlapUnit::new(UnitId::MinOnes);

        let mut total = 0;
        for value in (0..=10).chain(core::iter::once(10)) {
            unit.set_next_position(pos(value));
            total += unit.commit_steps(&mut engine, &table).unwrap();
            engine.run_to_completion_blocking();
        }
        // blank -> 0 -> 1 ... -> 9 -> blank -> blank
        assert_eq!(total, 4096);
    }

    proptest! {
        #[test]
        fn prop_minute_units_use_direct_index(p in 0u8..10) {
            for id in [UnitId::MinTens, UnitId::MinOnes] {
                let mut unit = SplitFlapUnit::new(id);
                unit.set_next_position(pos(p));
                prop_assert_eq!(unit.next_lookup_index(), p);
            }
        }

        #[test]
        fn prop_hour_units_use_mirrored_index(p in 0u8..10) {
            for id in [UnitId::HourTens, UnitId::HourOnes] {
                let mut unit = SplitFlapUnit::new(id);
                unit.set_next_position(pos(p));
                prop_assert_eq!(unit.next_lookup_index(), 9 - p);
            }
        }

        #[test]
        fn prop_inversion_only_on_even_slots(p in 0u8..=10, slot in 0usize..4) {
            let id = UnitId::from_index(slot).unwrap();
            let table = StepLookupTable::DEFAULT;
            let mut unit = SplitFlapUnit::new(id);
            unit.set_next_position(pos(p));

            let forward = table.forward_steps(unit.lookup_index(), unit.next_lookup_index());
            let steps = unit.pending_steps(&table);
            if slot % 2 == 0 {
                prop_assert_eq!(steps, -forward);
            } else {
                prop_assert_eq!(steps, forward);
            }
            // Flipping twice restores the forward count
            prop_assert_eq!(unit.config().orient(unit.config().orient(forward)), forward);
        }

        #[test]
        fn prop_commit_on_idle_unit_lands_on_position(
            start in 0u8..=10,
            target in 0u8..=10,
            slot in 0usize..4,
        ) {
            let id = UnitId::from_index(slot).unwrap();
            let table = StepLookupTable::DEFAULT;
            let mut engine = engine();
            let mut unit = SplitFlapUnit::new(id);

            unit.set_next_position(pos(start));
            unit.commit_steps(&mut engine, &table).unwrap();
            engine.run_to_completion_blocking();

            unit.set_next_position(pos(target));
            prop_assert!(unit.commit_steps(&mut engine, &table).is_ok());
            prop_assert_eq!(unit.position(), pos(target));
        }
    }
}
