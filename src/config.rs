// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Gate-driver link configuration.
//!
//! All waits are stated as durations in [`Timing`] and converted to tick counts once, in
//! [`Timeouts::from_timing`], so the tick period of the board service is the only knob that has to
//! change when the scheduler runs faster or slower.

use fugit::MicrosDurationU32;

use crate::drivers::mcp8024::registers::{Cfg0, Cfg2};
use crate::hw::ChannelId;

/// Baud-rate divisor constants for the auto-baud window.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct BaudWindow {
    /// 9600 bps. Programmed at connect and whenever a measurement fails.
    pub nominal: u16,
    /// Exclusive lower bound (10170 bps).
    pub min: u16,
    /// Exclusive upper bound (9030 bps).
    pub max: u16,
    /// 7880 bps. Used for the break so it spans a full sync window.
    pub break_window: u16,
}

impl BaudWindow {
    pub const NOMINAL_BPS: u32 = 9_600;
    pub const FAST_BPS: u32 = 10_170;
    pub const SLOW_BPS: u32 = 9_030;
    pub const BREAK_BPS: u32 = 7_880;

    /// Build the window for a peripheral whose divisor for a given bit rate is `divisor(bps)`.
    pub fn from_divisor_fn(divisor: impl Fn(u32) -> u16) -> Self {
        Self {
            nominal: divisor(Self::NOMINAL_BPS),
            min: divisor(Self::FAST_BPS),
            max: divisor(Self::SLOW_BPS),
            break_window: divisor(Self::BREAK_BPS),
        }
    }

    /// A measured divisor is accepted only strictly inside the window.
    #[inline]
    pub fn accepts(&self, divisor: u16) -> bool {
        self.min < divisor && divisor < self.max
    }
}

impl Default for BaudWindow {
    fn default() -> Self {
        Self {
            nominal: 650,
            min: 613,
            max: 691,
            break_window: 792,
        }
    }
}

/// Link waits, as durations.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Timing {
    /// Period between two calls into the link engine.
    pub tick: MicrosDurationU32,
    /// CFG write sent → line switched to receive.
    pub set_config_rx_switch: MicrosDurationU32,
    /// Line switched → CFG acknowledge checked. Also the install retry back-off.
    pub set_config_ack: MicrosDurationU32,
    /// STATUS request sent → line switched to receive.
    pub read_status_rx_switch: MicrosDurationU32,
    /// Line switched → STATUS reply checked. Also the poll retry back-off.
    pub read_status_ack: MicrosDurationU32,
    /// Break queued → auto-baud armed.
    pub break_sequence: MicrosDurationU32,
    /// Auto-baud armed → measurement checked.
    pub character_receive: MicrosDurationU32,
    /// Clean poll → next poll.
    pub status_read_interval: MicrosDurationU32,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            tick: MicrosDurationU32::millis(1),
            set_config_rx_switch: MicrosDurationU32::millis(1),
            set_config_ack: MicrosDurationU32::millis(5),
            read_status_rx_switch: MicrosDurationU32::micros(0),
            read_status_ack: MicrosDurationU32::millis(4),
            break_sequence: MicrosDurationU32::millis(1),
            character_receive: MicrosDurationU32::millis(4),
            status_read_interval: MicrosDurationU32::millis(1000),
        }
    }
}

/// Link waits, in ticks.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct Timeouts {
    pub set_config_rx_switch: u16,
    pub set_config_ack: u16,
    pub read_status_rx_switch: u16,
    pub read_status_ack: u16,
    pub break_sequence: u16,
    pub character_receive: u16,
    pub status_read_interval: u16,
}

impl Timeouts {
    /// Round every duration down to whole ticks, saturating at `u16::MAX`.
    pub fn from_timing(timing: &Timing) -> Self {
        let tick = timing.tick.ticks().max(1);
        let ticks = |d: MicrosDurationU32| (d.ticks() / tick).min(u16::MAX as u32) as u16;
        Self {
            set_config_rx_switch: ticks(timing.set_config_rx_switch),
            set_config_ack: ticks(timing.set_config_ack),
            read_status_rx_switch: ticks(timing.read_status_rx_switch),
            read_status_ack: ticks(timing.read_status_ack),
            break_sequence: ticks(timing.break_sequence),
            character_receive: ticks(timing.character_receive),
            status_read_interval: ticks(timing.status_read_interval),
        }
    }
}

/// Everything one MCP8024 link needs.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct GateDriverConfig {
    /// Channel the driver must be bound to.
    pub channel: ChannelId,
    pub cfg0: Cfg0,
    pub cfg2: Cfg2,
    pub baud: BaudWindow,
    pub timing: Timing,
    /// Low time of the chip-enable fault-clear pulse.
    pub fault_clear_pulse: MicrosDurationU32,
}

impl Default for GateDriverConfig {
    fn default() -> Self {
        Self {
            channel: ChannelId(2),
            cfg0: Cfg0::default(),
            cfg2: Cfg2::default(),
            baud: BaudWindow::default(),
            timing: Timing::default(),
            fault_clear_pulse: MicrosDurationU32::micros(5),
        }
    }
}
