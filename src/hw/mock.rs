// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Simulated peripherals for host-side tests.
//!
//! [`SimChannel`] is a half-duplex UART with an MCP8024 on the far end of the line. The device
//! answers the four link commands with correctly echoed frames, produces a sync character after a
//! break, and feeds a configurable divisor into the auto-baud measurement. Replies are held back
//! until the host hands the line to the receiver (`transmit_disable`), the way the real line
//! behaves.
//!
//! Fault injection:
//! - [`SimChannel::queue_reply`] replaces the next reply frame with arbitrary bytes
//! - [`SimChannel::set_silent`] drops every reply
//! - [`SimChannel::set_measured_divisor`] with `None` makes auto-baud never complete
//! - [`SimChannel::set_transmit_complete`] / [`SimChannel::set_transmit_full`] stall the transmitter
//! - [`SimChannel::set_transmit_depth`] bounds the transmitter to `n` bytes in flight. Each
//!   transmitter status query shifts one byte out, and turning the line around with bytes still
//!   in flight corrupts the frame so the device never answers it.
//!
//! [`MockPin`] records every level written to it.

use core::cell::Cell;
use core::convert::Infallible;
use std::collections::VecDeque;
use std::vec::Vec;

use embedded_hal::digital::{ErrorType, OutputPin};

use crate::drivers::mcp8024::registers::{ack, cmd};
use crate::hw::{Channel, ChannelId, SpeedMode};

/// Bytes the line carries after a break: the break itself, then the device's sync character.
pub const SYNC_BYTES: [u8; 2] = [0x00, 0x55];

pub struct SimChannel {
    id: ChannelId,
    ops: Cell<usize>,

    module_enabled: bool,
    tx_enabled: bool,
    speed: SpeedMode,
    divisor: u16,
    divisor_history: Vec<u16>,
    rx_irq: bool,
    tx_irq: bool,

    rx: VecDeque<u8>,
    tx_log: Vec<u8>,
    pending_reply: Vec<u8>,

    break_requested: bool,
    sync_pending: bool,
    auto_baud_armed: bool,
    auto_baud_done: bool,
    measured: Option<u16>,

    transmit_complete: bool,
    transmit_full: bool,
    tx_depth: Option<usize>,
    tx_in_flight: Cell<usize>,
    truncated: usize,

    // device side
    awaiting_value: Option<u8>,
    silent: bool,
    overrides: VecDeque<Vec<u8>>,
    cfg0: u8,
    cfg2: u8,
    status0: u8,
    status1: u8,
}

impl SimChannel {
    /// A healthy link: the device measures at 650 and reports clean status.
    pub fn new(id: ChannelId) -> Self {
        Self {
            id,
            ops: Cell::new(0),
            module_enabled: false,
            tx_enabled: false,
            speed: SpeedMode::Standard,
            divisor: 0,
            divisor_history: Vec::new(),
            rx_irq: false,
            tx_irq: false,
            rx: VecDeque::new(),
            tx_log: Vec::new(),
            pending_reply: Vec::new(),
            break_requested: false,
            sync_pending: false,
            auto_baud_armed: false,
            auto_baud_done: false,
            measured: Some(650),
            transmit_complete: true,
            transmit_full: false,
            tx_depth: None,
            tx_in_flight: Cell::new(0),
            truncated: 0,
            awaiting_value: None,
            silent: false,
            overrides: VecDeque::new(),
            cfg0: 0,
            cfg2: 0,
            status0: 0,
            status1: 0,
        }
    }

    pub fn set_measured_divisor(&mut self, divisor: Option<u16>) {
        self.measured = divisor;
    }

    pub fn set_status(&mut self, status0: u8, status1: u8) {
        self.status0 = status0;
        self.status1 = status1;
    }

    /// Replace the next command reply with `frame`.
    pub fn queue_reply(&mut self, frame: &[u8]) {
        self.overrides.push_back(frame.to_vec());
    }

    pub fn set_silent(&mut self, silent: bool) {
        self.silent = silent;
    }

    pub fn set_transmit_complete(&mut self, complete: bool) {
        self.transmit_complete = complete;
    }

    pub fn set_transmit_full(&mut self, full: bool) {
        self.transmit_full = full;
    }

    /// `Some(1)` models a single transmit data register. `None` (the default) sends instantly.
    pub fn set_transmit_depth(&mut self, depth: Option<usize>) {
        self.tx_depth = depth;
        self.tx_in_flight.set(0);
    }

    /// Frames cut off by a receive switch while bytes were still going out.
    pub fn truncated_frames(&self) -> usize {
        self.truncated
    }

    /// Number of capability calls made so far.
    pub fn ops(&self) -> usize {
        self.ops.get()
    }

    pub fn tx_log(&self) -> &[u8] {
        &self.tx_log
    }

    pub fn clear_tx_log(&mut self) {
        self.tx_log.clear();
    }

    /// Every divisor programmed through `set_baud_divisor`, oldest first.
    pub fn divisor_history(&self) -> &[u16] {
        &self.divisor_history
    }

    /// CFG0 as last written on the device.
    pub fn device_cfg0(&self) -> u8 {
        self.cfg0
    }

    /// CFG2 as last written on the device.
    pub fn device_cfg2(&self) -> u8 {
        self.cfg2
    }

    pub fn is_module_enabled(&self) -> bool {
        self.module_enabled
    }

    pub fn is_transmit_enabled(&self) -> bool {
        self.tx_enabled
    }

    pub fn is_auto_baud_armed(&self) -> bool {
        self.auto_baud_armed
    }

    pub fn speed_mode(&self) -> SpeedMode {
        self.speed
    }

    pub fn rx_pending(&self) -> usize {
        self.rx.len()
    }

    fn op(&self) {
        self.ops.set(self.ops.get() + 1);
    }

    /// One byte time passes on the wire.
    fn shift_out(&self) {
        let n = self.tx_in_flight.get();
        if n > 0 {
            self.tx_in_flight.set(n - 1);
        }
    }

    fn device_receive(&mut self, byte: u8) {
        if self.break_requested {
            self.break_requested = false;
            self.sync_pending = true;
            return;
        }

        if let Some(command) = self.awaiting_value.take() {
            let ack = if command == cmd::SET_CFG0 {
                self.cfg0 = byte;
                ack::SET_CFG0
            } else {
                self.cfg2 = byte;
                ack::SET_CFG2
            };
            self.respond(&[command, byte, ack, byte]);
            return;
        }

        match byte {
            cmd::SET_CFG0 | cmd::SET_CFG2 => self.awaiting_value = Some(byte),
            cmd::GET_STATUS0 => self.respond(&[cmd::GET_STATUS0, ack::GET_STATUS0, self.status0]),
            cmd::GET_STATUS1 => self.respond(&[cmd::GET_STATUS1, ack::GET_STATUS1, self.status1]),
            _ => {}
        }
    }

    fn respond(&mut self, frame: &[u8]) {
        if self.silent {
            return;
        }
        match self.overrides.pop_front() {
            Some(reply) => self.pending_reply.extend_from_slice(&reply),
            None => self.pending_reply.extend_from_slice(frame),
        }
    }
}

impl Channel for SimChannel {
    fn id(&self) -> ChannelId {
        self.id
    }

    fn initialize(&mut self) {
        self.op();
        self.module_enabled = false;
        self.tx_enabled = false;
        self.speed = SpeedMode::Standard;
        self.rx_irq = false;
        self.tx_irq = false;
        self.break_requested = false;
        self.auto_baud_armed = false;
        self.auto_baud_done = false;
        self.tx_in_flight.set(0);
        self.rx.clear();
    }

    fn module_enable(&mut self) {
        self.op();
        self.module_enabled = true;
    }

    fn module_disable(&mut self) {
        self.op();
        self.module_enabled = false;
    }

    fn set_speed_mode(&mut self, mode: SpeedMode) {
        self.op();
        self.speed = mode;
    }

    fn set_baud_divisor(&mut self, divisor: u16) {
        self.op();
        self.divisor = divisor;
        self.divisor_history.push(divisor);
    }

    fn baud_divisor(&self) -> u16 {
        self.op();
        self.divisor
    }

    fn transmit_enable(&mut self) {
        self.op();
        self.tx_enabled = true;
    }

    fn transmit_disable(&mut self) {
        self.op();
        self.tx_enabled = false;
        let reply = core::mem::take(&mut self.pending_reply);
        if self.tx_in_flight.replace(0) > 0 {
            self.truncated += 1;
            self.awaiting_value = None;
            return;
        }
        self.rx.extend(reply);
    }

    fn rx_interrupt_enable(&mut self) {
        self.op();
        self.rx_irq = true;
    }

    fn rx_interrupt_disable(&mut self) {
        self.op();
        self.rx_irq = false;
    }

    fn rx_interrupt_clear(&mut self) {
        self.op();
    }

    fn tx_interrupt_enable(&mut self) {
        self.op();
        self.tx_irq = true;
    }

    fn tx_interrupt_disable(&mut self) {
        self.op();
        self.tx_irq = false;
    }

    fn tx_interrupt_clear(&mut self) {
        self.op();
    }

    fn is_transmit_complete(&self) -> bool {
        self.op();
        let complete = self.transmit_complete && self.tx_in_flight.get() == 0;
        self.shift_out();
        complete
    }

    fn is_transmit_full(&self) -> bool {
        self.op();
        let full = self.transmit_full
            || self.tx_depth.is_some_and(|depth| self.tx_in_flight.get() >= depth);
        self.shift_out();
        full
    }

    fn is_receive_ready(&self) -> bool {
        self.op();
        !self.rx.is_empty()
    }

    fn write_data(&mut self, byte: u8) {
        self.op();
        // the break frame goes out under SBKRQ, not through the data register
        if self.tx_depth.is_some() && !self.break_requested {
            self.tx_in_flight.set(self.tx_in_flight.get() + 1);
        }
        self.tx_log.push(byte);
        if self.tx_enabled {
            self.device_receive(byte);
        }
    }

    fn read_data(&mut self) -> u8 {
        self.op();
        self.rx.pop_front().unwrap_or(0)
    }

    fn flush_receive(&mut self) {
        self.op();
        self.rx.clear();
    }

    fn break_request(&mut self) {
        self.op();
        self.break_requested = true;
    }

    fn break_clear(&mut self) {
        self.op();
        self.break_requested = false;
    }

    fn transmit_empty_clear(&mut self) {
        self.op();
    }

    fn auto_baud_enable(&mut self) {
        self.op();
        self.auto_baud_armed = true;
        self.auto_baud_done = false;
        if self.sync_pending {
            self.sync_pending = false;
            if let Some(divisor) = self.measured {
                self.divisor = divisor;
                self.auto_baud_done = true;
            }
            self.rx.extend(SYNC_BYTES);
        }
    }

    fn auto_baud_disable(&mut self) {
        self.op();
        self.auto_baud_armed = false;
        self.auto_baud_done = false;
    }

    fn is_auto_baud_complete(&self) -> bool {
        self.op();
        self.auto_baud_done
    }
}

/// Output pin that remembers every level written.
#[derive(Debug, Default)]
pub struct MockPin {
    levels: Vec<bool>,
}

impl MockPin {
    pub fn new() -> Self {
        Self::default()
    }

    /// Levels written so far, `true` = high.
    pub fn levels(&self) -> &[bool] {
        &self.levels
    }

    pub fn is_high(&self) -> bool {
        self.levels.last().copied().unwrap_or(false)
    }
}

impl ErrorType for MockPin {
    type Error = Infallible;
}

impl OutputPin for MockPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.levels.push(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.levels.push(true);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exchange(ch: &mut SimChannel, bytes: &[u8]) -> Vec<u8> {
        ch.transmit_enable();
        ch.flush_receive();
        for &b in bytes {
            ch.write_data(b);
        }
        ch.transmit_disable();
        let mut out = Vec::new();
        while ch.is_receive_ready() {
            out.push(ch.read_data());
        }
        out
    }

    #[test]
    fn device_echoes_config_writes() {
        let mut ch = SimChannel::new(ChannelId(2));
        assert_eq!(exchange(&mut ch, &[0x81, 0x03]), [0x81, 0x03, 0x41, 0x03]);
        assert_eq!(exchange(&mut ch, &[0x87, 0x1C]), [0x87, 0x1C, 0x47, 0x1C]);
        assert_eq!(ch.device_cfg0(), 0x03);
        assert_eq!(ch.device_cfg2(), 0x1C);
    }

    #[test]
    fn device_reports_status_registers() {
        let mut ch = SimChannel::new(ChannelId(2));
        ch.set_status(0x01, 0x04);
        assert_eq!(exchange(&mut ch, &[0x85]), [0x85, 0x45, 0x01]);
        assert_eq!(exchange(&mut ch, &[0x86]), [0x86, 0x46, 0x04]);
    }

    #[test]
    fn queued_reply_replaces_one_frame() {
        let mut ch = SimChannel::new(ChannelId(2));
        ch.queue_reply(&[0x99, 0x46, 0x00]);
        assert_eq!(exchange(&mut ch, &[0x86]), [0x99, 0x46, 0x00]);
        assert_eq!(exchange(&mut ch, &[0x86]), [0x86, 0x46, 0x00]);
    }

    #[test]
    fn break_then_auto_baud_measures_divisor() {
        let mut ch = SimChannel::new(ChannelId(2));
        ch.set_measured_divisor(Some(640));
        ch.transmit_enable();
        ch.break_request();
        ch.write_data(0x00);
        ch.transmit_disable();
        assert!(!ch.is_auto_baud_complete());

        ch.auto_baud_enable();
        assert!(ch.is_auto_baud_complete());
        assert_eq!(ch.baud_divisor(), 640);
        assert_eq!(ch.rx_pending(), SYNC_BYTES.len());
    }

    #[test]
    fn single_buffered_transmitter_holds_one_byte() {
        let mut ch = SimChannel::new(ChannelId(2));
        ch.set_transmit_depth(Some(1));
        ch.transmit_enable();

        assert_eq!(ch.write(0x81), Ok(()));
        assert_eq!(ch.write(0x03), Err(nb::Error::WouldBlock));
        assert_eq!(ch.write(0x03), Ok(()));
        assert!(!ch.is_transmit_complete());
        assert!(ch.is_transmit_complete());

        ch.transmit_disable();
        assert_eq!(ch.truncated_frames(), 0);
        assert_eq!(ch.rx_pending(), 4);
    }

    #[test]
    fn early_turnaround_truncates_the_frame() {
        let mut ch = SimChannel::new(ChannelId(2));
        ch.set_transmit_depth(Some(1));
        ch.transmit_enable();
        ch.write_data(0x85);
        ch.transmit_disable();

        assert_eq!(ch.truncated_frames(), 1);
        assert_eq!(ch.rx_pending(), 0);
    }

    #[test]
    fn mock_pin_records_levels() {
        let mut pin = MockPin::new();
        pin.set_high().unwrap();
        pin.set_low().unwrap();
        assert_eq!(pin.levels(), [true, false]);
        assert!(!pin.is_high());
    }
}
