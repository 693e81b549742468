//! Serial console task
//!
//! Assembles lines from the UART, echoes them and forwards decoded commands
//! to the clock task. Never touches motors or the clock itself.

use defmt::*;
use embassy_rp::uart::{BufferedUartRx, BufferedUartTx};
use embassy_time::{with_timeout, Duration, Instant};
use embedded_io_async::{Read, Write};

use flapclock_protocol::{Command, LineError, LineReader, ParseError, INVALID_COMMAND_REPLY};

use crate::channels::COMMAND_CHANNEL;

/// Buffer size for UART receive
const RX_BUF_SIZE: usize = 32;

/// Serial RX task - decodes command lines from the console
#[embassy_executor::task]
pub async fn serial_rx_task(mut rx: BufferedUartRx, mut tx: BufferedUartTx, line_timeout_ms: u32) {
    info!("Serial RX task started");

    let mut reader = LineReader::with_timeout(line_timeout_ms);
    let mut buf = [0u8; RX_BUF_SIZE];
    let timeout = Duration::from_millis(u64::from(line_timeout_ms));

    loop {
        match with_timeout(timeout, rx.read(&mut buf)).await {
            Ok(Ok(n)) => {
                trace!("RX: {} bytes", n);
                for &byte in &buf[..n] {
                    match reader.feed(byte, now_ms()) {
                        Ok(Some(line)) => handle_line(&mut tx, &line).await,
                        Ok(None) => {
                            // Need more bytes
                        }
                        Err(LineError::Timeout) => {
                            debug!("Dropped stale partial line");
                        }
                    }
                }
            }
            Ok(Err(e)) => {
                warn!("UART read error: {:?}", e);
            }
            Err(_) => {
                // Quiet line; drop whatever was half typed
                if reader.expire(now_ms()).is_err() {
                    debug!("Dropped stale partial line");
                }
            }
        }
    }
}

/// Echo a line and forward the command it holds
async fn handle_line(tx: &mut BufferedUartTx, line: &str) {
    reply(tx, line).await;

    match Command::parse(line) {
        Ok(command) => {
            debug!("Command: {:?}", command);
            if COMMAND_CHANNEL.try_send(command).is_err() {
                warn!("Command channel full, dropping command");
            }
        }
        Err(ParseError::UnknownCommand) => {
            reply(tx, INVALID_COMMAND_REPLY).await;
        }
        Err(ParseError::Empty) => {
            trace!("Line held no command");
        }
    }
}

async fn reply(tx: &mut BufferedUartTx, text: &str) {
    let result = match tx.write_all(text.as_bytes()).await {
        Ok(()) => tx.write_all(b"\r\n").await,
        Err(e) => Err(e),
    };
    if let Err(e) = result {
        warn!("UART write error: {:?}", e);
    }
}

fn now_ms() -> u32 {
    Instant::now().as_millis() as u32
}
