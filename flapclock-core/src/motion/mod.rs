//! Motion
//!
//! Step lookup, motor channels, the multi-motor stepping engine and the
//! split-flap units built on top of it.

pub mod channel;
pub mod engine;
pub mod lookup;
pub mod unit;

pub use channel::MotorChannel;
pub use engine::{StepperEngine, DEFAULT_MOVE_SPEED, NUM_CHANNELS};
pub use lookup::{LookupError, StepLookupTable, BLANK_INDEX, FLAP_COUNT, STEPS_PER_REVOLUTION};
pub use unit::{FlapOrdering, FlapPosition, SplitFlapUnit, UnitConfig, UnitError, UnitId};
