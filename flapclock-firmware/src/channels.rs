//! Inter-task communication channels
//!
//! Defines the static channels used for communication between Embassy tasks.
//! Uses embassy-sync primitives for safe async communication.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;

use flapclock_protocol::Command;

/// Channel capacity for decoded serial commands
const COMMAND_CHANNEL_SIZE: usize = 4;

/// Commands decoded by the serial task, consumed by the clock task
pub static COMMAND_CHANNEL: Channel<CriticalSectionRawMutex, Command, COMMAND_CHANNEL_SIZE> =
    Channel::new();
