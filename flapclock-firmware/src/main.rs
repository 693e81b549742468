//! Flapclock - Split-Flap Clock Firmware
//!
//! Main firmware binary for an RP2040 driving four 28BYJ-48 steppers
//! through ULN2003 boards, one flap wheel per digit. The time is kept in
//! software and set over the serial console.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::{Level, Output};
use embassy_rp::peripherals::UART0;
use embassy_rp::uart::{BufferedInterruptHandler, Config as UartConfig, Uart};
use embassy_time::Instant;
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use flapclock_core::motion::MotorChannel;
use flapclock_core::FlapClock;
use flapclock_drivers::stepper::Uln2003;

mod channels;
mod config;
mod tasks;

bind_interrupts!(struct Irqs {
    UART0_IRQ => BufferedInterruptHandler<UART0>;
});

/// One motor: ULN2003 coils stepped on the embassy microsecond clock
pub type Motor = MotorChannel<Uln2003<Output<'static>>, fn() -> u32>;

// Static cells for UART buffers (must live forever)
static TX_BUF: StaticCell<[u8; 128]> = StaticCell::new();
static RX_BUF: StaticCell<[u8; 256]> = StaticCell::new();

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Flapclock firmware starting...");

    // Initialize RP2040 peripherals
    let p = embassy_rp::init(Default::default());
    info!("Peripherals initialized");

    let config = config::load_config();

    // Setup UART for the serial console
    let mut uart_config = UartConfig::default();
    uart_config.baudrate = config.serial.baud_rate;

    let tx_buf = TX_BUF.init([0u8; 128]);
    let rx_buf = RX_BUF.init([0u8; 256]);

    let uart = Uart::new_blocking(p.UART0, p.PIN_0, p.PIN_1, uart_config);
    let uart = uart.into_buffered(Irqs, tx_buf, rx_buf);
    let (tx, rx) = uart.split();

    info!("UART initialized at {} baud", config.serial.baud_rate);

    // Coil pins in board order IN1..IN4, one ULN2003 per wheel,
    // hour tens on the left
    let motors: [Motor; 4] = [
        motor([
            Output::new(p.PIN_2, Level::Low),
            Output::new(p.PIN_3, Level::Low),
            Output::new(p.PIN_4, Level::Low),
            Output::new(p.PIN_5, Level::Low),
        ]),
        motor([
            Output::new(p.PIN_6, Level::Low),
            Output::new(p.PIN_7, Level::Low),
            Output::new(p.PIN_8, Level::Low),
            Output::new(p.PIN_9, Level::Low),
        ]),
        motor([
            Output::new(p.PIN_10, Level::Low),
            Output::new(p.PIN_11, Level::Low),
            Output::new(p.PIN_12, Level::Low),
            Output::new(p.PIN_13, Level::Low),
        ]),
        motor([
            Output::new(p.PIN_14, Level::Low),
            Output::new(p.PIN_15, Level::Low),
            Output::new(p.PIN_16, Level::Low),
            Output::new(p.PIN_17, Level::Low),
        ]),
    ];

    let clock = FlapClock::new(motors, &config);
    info!("Stepper engine initialized");

    // Spawn tasks
    spawner
        .spawn(tasks::serial_rx_task(rx, tx, config.serial.line_timeout_ms))
        .unwrap();
    spawner.spawn(tasks::clock_task(clock)).unwrap();

    info!("All tasks spawned, firmware running");

    loop {
        embassy_time::Timer::after_secs(60).await;
        trace!("Main loop heartbeat");
    }
}

fn motor(pins: [Output<'static>; 4]) -> Motor {
    MotorChannel::new(Uln2003::new(pins), micros as fn() -> u32)
}

/// Free-running microsecond counter for step timing (wraps every ~71 min)
fn micros() -> u32 {
    Instant::now().as_micros() as u32
}
