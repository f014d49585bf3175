// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Microchip MCP8024 3-phase gate driver, DE2 serial link.
//!
//! The MCP8024 is configured and monitored over a half-duplex 9600 bps line. Its internal RC
//! oscillator drifts, so the host re-measures the device's bit rate with a break/sync auto-baud
//! sequence before every status poll.
//!
//! Everything here is a tick-driven state machine. The owner calls [`Mcp8024::configure`] once per
//! tick until it returns [`ConfigState::Installed`], then [`Mcp8024::service`] once per tick for the
//! lifetime of the system. No call ever waits: each step either finishes immediately or arms the
//! countdown that gates the next step.
//!
//! | Sub-protocol | Module | Drives |
//! | ------------ | ------ | ------ |
//! | Bring-up     | [`bringup`]  | [`ConfigState`] |
//! | Auto-baud    | [`autobaud`] | [`AutoBaudStep`] |
//! | Install      | [`install`]  | [`InstallStep`] |
//! | Status poll  | [`status`]   | [`OperationState`], [`StatusStep`] |

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use log::{error, trace, warn};

use crate::config::{GateDriverConfig, Timeouts};
use crate::error::Error;
use crate::hw::{Channel, ChipEnable, Countdown, SpeedMode};

pub mod autobaud;
pub mod bringup;
pub mod frame;
pub mod install;
pub mod registers;
pub mod status;


pub use autobaud::AutoBaudStep;
pub use install::InstallStep;
pub use registers::{Cfg0, Cfg2, ConfigRegister, Status0, Status1, StatusRegister};
pub use status::StatusStep;

/// Consecutive failed exchanges tolerated before the link is declared dead.
pub const RETRY_LIMIT: u8 = 5;

/// Bring-up state.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
#[repr(u8)]
pub enum ConfigState {
    #[default]
    Uninitialized = 0,
    /// Terminal. Only [`Mcp8024::reset`] leaves it.
    Error = 1,
    TryAgain = 3,
    /// Terminal for bring-up; the link is handed to the status poll.
    Installed = 4,
    Connected = 5,
    Disconnected = 6,
    Disabled = 7,
    AutoBaud = 8,
}

/// Runtime state.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
#[repr(u8)]
pub enum OperationState {
    #[default]
    NotReady = 0,
    Error = 1,
    Warning = 2,
    TryAgain = 3,
    Done = 4,
    Busy = 5,
    Ready = 6,
    AutoBaud = 7,
}

/// Per-link state. Zeroed on every (re-)initialization.
#[derive(Clone, Debug, Default)]
struct Link {
    config_state: ConfigState,
    operation_state: OperationState,
    install_step: InstallStep,
    status_step: StatusStep,
    auto_baud_step: AutoBaudStep,
    timeout: Countdown,
    /// Pending countdown parked while an auto-baud request pre-empts the poll interval.
    timeout_residue: u16,
    retry_count: u8,
    cfg0: Cfg0,
    cfg2: Cfg2,
    status0: Status0,
    status1: Status1,
    /// Last divisor known to work. Survives failed measurements.
    baud_divisor: u16,
    auto_baud_requested: bool,
    last_error: Option<Error>,
}

pub struct Mcp8024<'a, C, P> {
    channel: C,
    chip_enable: &'a ChipEnable<P>,
    config: GateDriverConfig,
    timeouts: Timeouts,
    link: Link,
}

impl<'a, C: Channel, P: OutputPin> Mcp8024<'a, C, P> {
    /// Nothing touches the hardware until the first [`Mcp8024::configure`].
    pub fn new(channel: C, chip_enable: &'a ChipEnable<P>, config: GateDriverConfig) -> Self {
        Self {
            channel,
            chip_enable,
            timeouts: Timeouts::from_timing(&config.timing),
            config,
            link: Link::default(),
        }
    }

    #[inline]
    pub fn config_state(&self) -> ConfigState {
        self.link.config_state
    }

    #[inline]
    pub fn operation_state(&self) -> OperationState {
        self.link.operation_state
    }

    #[inline]
    pub fn retry_count(&self) -> u8 {
        self.link.retry_count
    }

    #[inline]
    pub fn install_step(&self) -> InstallStep {
        self.link.install_step
    }

    #[inline]
    pub fn status_step(&self) -> StatusStep {
        self.link.status_step
    }

    #[inline]
    pub fn auto_baud_step(&self) -> AutoBaudStep {
        self.link.auto_baud_step
    }

    /// STATUS0 as of the last successful read.
    #[inline]
    pub fn status0(&self) -> Status0 {
        self.link.status0
    }

    /// STATUS1 as of the last successful read.
    #[inline]
    pub fn status1(&self) -> Status1 {
        self.link.status1
    }

    #[inline]
    pub fn baud_divisor(&self) -> u16 {
        self.link.baud_divisor
    }

    #[inline]
    pub fn is_auto_baud_requested(&self) -> bool {
        self.link.auto_baud_requested
    }

    /// Ticks left before the next step runs.
    #[inline]
    pub fn pending_ticks(&self) -> u16 {
        self.link.timeout.remaining()
    }

    /// Most recent failure, transient or not. Diagnostics only.
    #[inline]
    pub fn last_error(&self) -> Option<Error> {
        self.link.last_error
    }

    #[inline]
    pub fn config(&self) -> &GateDriverConfig {
        &self.config
    }

    #[inline]
    pub fn chip_enable(&self) -> &'a ChipEnable<P> {
        self.chip_enable
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }

    pub fn channel_mut(&mut self) -> &mut C {
        &mut self.channel
    }

    /// External reset. The next [`Mcp8024::configure`] re-initializes from scratch.
    pub fn reset(&mut self) {
        self.link = Link::default();
    }

    /// Re-synchronize the bit rate before the next status poll. Idempotent.
    pub fn auto_baud_request(&mut self) {
        if !self.link.auto_baud_requested {
            trace!("mcp8024: auto-baud requested");
            self.link.auto_baud_requested = true;
        }
    }

    /// Pulse chip-enable low to clear latched faults.
    pub fn fault_clear<D: DelayNs>(&self, delay: &mut D) -> Result<(), Error> {
        self.chip_enable.pulse(delay, self.config.fault_clear_pulse.ticks())
    }

    /// Zero the link, check the bindings, and make sure the chip starts disabled.
    fn initialize(&mut self) -> Result<(), Error> {
        self.link = Link {
            cfg0: self.config.cfg0,
            cfg2: self.config.cfg2,
            baud_divisor: self.config.baud.nominal,
            ..Link::default()
        };

        let found = self.channel.id();
        if found != self.config.channel {
            return Err(Error::UnboundChannel {
                expected: self.config.channel,
                found,
            });
        }
        self.disable()
    }

    #[inline]
    fn enable(&mut self) -> Result<(), Error> {
        self.chip_enable.assert()
    }

    #[inline]
    fn disable(&mut self) -> Result<(), Error> {
        self.chip_enable.deassert()
    }

    /// Bring the channel up at the last known divisor with the line in receive.
    fn connect(&mut self) {
        let ch = &mut self.channel;
        ch.rx_interrupt_disable();
        ch.rx_interrupt_clear();
        ch.tx_interrupt_disable();
        ch.tx_interrupt_clear();
        ch.initialize();
        ch.set_speed_mode(SpeedMode::Standard);
        ch.set_baud_divisor(self.link.baud_divisor);
        ch.module_enable();
        ch.transmit_disable();
    }

    /// Queue one byte. Returns `false` if the transmitter is still holding the previous one.
    fn write(&mut self, byte: u8) -> bool {
        if self.channel.write(byte).is_err() {
            trace!("mcp8024: tx full, 0x{:02X} held back", byte);
            return false;
        }
        true
    }

    /// Hold the line in transmit until the last byte has left the shift register. Returns `false`
    /// (and retries next tick) while it is still going out.
    fn transmit_drained(&mut self) -> bool {
        if self.channel.is_transmit_complete() {
            return true;
        }
        self.link.timeout.clear();
        false
    }

    /// Read up to `N` bytes; `None` where the receive buffer ran dry.
    fn read_reply<const N: usize>(&mut self) -> [Option<u8>; N] {
        let mut reply = [None; N];
        for slot in reply.iter_mut() {
            *slot = self.channel.read().ok();
        }
        reply
    }

    fn note(&mut self, err: Error) {
        if err.is_transient() {
            warn!("mcp8024: {}", err);
        } else {
            error!("mcp8024: {}", err);
        }
        self.link.last_error = Some(err);
    }
}
