//! Clock task
//!
//! Owns the flap clock. Services the clock model, applies serial commands
//! and runs queued moves. Moves run blocking, so while the wheels turn
//! nothing else on the executor is polled; UART bytes wait in the buffered
//! UART's ring buffer meanwhile.

use defmt::*;
use embassy_futures::select::{select, Either};
use embassy_time::{Instant, Timer};

use flapclock_core::{FlapClock, Outcome};
use flapclock_protocol::Command;

use crate::channels::COMMAND_CHANNEL;
use crate::Motor;

/// How often the clock model is serviced when no command arrives
const SERVICE_INTERVAL_MS: u64 = 50;

/// Clock task - keeps the display on the current time
#[embassy_executor::task]
pub async fn clock_task(mut clock: FlapClock<Motor>) {
    info!("Clock task started");

    loop {
        if let Some(moves) = clock.service(now_ms()) {
            for (unit, steps) in moves.moved() {
                debug!("Unit {:?}: {} steps", unit, steps);
            }
            match moves.refused {
                None => {
                    let (hours, minutes, _) = clock.clock().hms();
                    info!("Showing {}:{}", hours, minutes);
                }
                // Flag stays raised, retried on the next pass
                Some(e) => debug!("Display update deferred: {:?}", e),
            }
        }

        if clock.run_pending_blocking() {
            trace!("Motion complete");
        }

        match select(COMMAND_CHANNEL.receive(), Timer::after_millis(SERVICE_INTERVAL_MS)).await {
            Either::First(command) => apply_command(&mut clock, command),
            Either::Second(()) => {}
        }
    }
}

fn apply_command(clock: &mut FlapClock<Motor>, command: Command) {
    match clock.handle_command(command, now_ms()) {
        Ok(Outcome::Moved { unit, steps }) => info!("Move {:?}: {} steps", unit, steps),
        Ok(Outcome::Stopped) => info!("All moves stopped"),
        Ok(Outcome::TimeSet) => {
            let (hours, minutes, seconds) = clock.clock().hms();
            info!("Time set to {}:{}:{}", hours, minutes, seconds);
        }
        Ok(Outcome::Trimmed { unit, steps }) => info!("Trim {:?}: {} steps", unit, steps),
        Err(e) => warn!("Command {:?} rejected: {:?}", command.kind, e),
    }
}

fn now_ms() -> u32 {
    Instant::now().as_millis() as u32
}
