// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Debug USART and the `log` backend that writes to it.
//!
//! Every `log` record is written as `LEVEL target: message\r\n` on USART1, so the link engine's
//! `info!` / `warn!` output shows up on the attached debug terminal.
//!
//! To access the terminal on the host machine, connect to the debug USB port and use
//! ```text
//! $ screen /dev/tty.usbmodem* 115200
//! ```
//!
//! To close the debug terminal, press `Ctrl+A` then `Ctrl+\` then `y`.

use core::cell::RefCell;
use core::fmt::{self, Write};

use critical_section::Mutex;
use log::{LevelFilter, Metadata, Record};
use nb::block;

use stm32f7xx_hal::{
    pac::USART1,
    prelude::*,
    serial::{Instance, Pins, Serial, Tx},
};

pub struct Usart<U: Instance> {
    tx: Tx<U>,
}

impl<U: Instance> Usart<U> {
    pub fn new<PINS: Pins<U>>(serial: Serial<U, PINS>) -> Self {
        let (tx, _rx) = serial.split();
        Self { tx }
    }

    /// Block until the hardware TX FIFO/drain is flushed.
    #[inline]
    pub fn flush(&mut self) {
        let _ = block!(self.tx.flush());
    }
}

impl<U: Instance> fmt::Write for Usart<U> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for &b in s.as_bytes() {
            let _ = block!(self.tx.write(b));
        }
        Ok(())
    }
}

static LOG_PORT: Mutex<RefCell<Option<Usart<USART1>>>> = Mutex::new(RefCell::new(None));
static LOGGER: SerialLogger = SerialLogger;

/// `log` backend writing to the debug USART.
pub struct SerialLogger;

impl SerialLogger {
    /// Hand the debug port to the logger and install it. Only the first call has any effect.
    pub fn install(port: Usart<USART1>, level: LevelFilter) {
        critical_section::with(|cs| {
            LOG_PORT.borrow_ref_mut(cs).get_or_insert(port);
        });
        if log::set_logger(&LOGGER).is_ok() {
            log::set_max_level(level);
        }
    }
}

impl log::Log for SerialLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        critical_section::with(|cs| {
            if let Some(port) = LOG_PORT.borrow_ref_mut(cs).as_mut() {
                let _ = write!(port, "{:<5} {}: {}\r\n", record.level(), record.target(), record.args());
            }
        });
    }

    fn flush(&self) {
        critical_section::with(|cs| {
            if let Some(port) = LOG_PORT.borrow_ref_mut(cs).as_mut() {
                port.flush();
            }
        });
    }
}
