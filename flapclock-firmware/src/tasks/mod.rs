//! Embassy async tasks
//!
//! Each task runs independently and communicates via channels.

pub mod clock;
pub mod serial_rx;

pub use clock::clock_task;
pub use serial_rx::serial_rx_task;
