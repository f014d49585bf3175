// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! MCP8024 register layouts and wire constants.
//!
//! Every register is one byte on the wire. The bitfield wrappers exist for building and inspecting
//! values; the link engine itself only ever moves the raw byte.

use bitfield::bitfield;

/// Host → device command codes.
pub mod cmd {
    pub const SET_CFG0: u8 = 0x81;
    pub const GET_CFG0: u8 = 0x82;
    pub const SET_CFG1: u8 = 0x83;
    pub const GET_CFG1: u8 = 0x84;
    pub const GET_STATUS0: u8 = 0x85;
    pub const GET_STATUS1: u8 = 0x86;
    pub const SET_CFG2: u8 = 0x87;
    pub const GET_CFG2: u8 = 0x88;
}

/// Device → host acknowledge codes.
pub mod ack {
    pub const SET_CFG0: u8 = 0x41;
    pub const GET_CFG0: u8 = 0x42;
    pub const SET_CFG1: u8 = 0x43;
    pub const GET_CFG1: u8 = 0x44;
    pub const GET_STATUS0: u8 = 0x45;
    pub const GET_STATUS1: u8 = 0x46;
    pub const SET_CFG2: u8 = 0x47;
    pub const GET_CFG2: u8 = 0x48;
}

/// Device → host not-acknowledge codes. Never matched explicitly; anything other than the expected
/// ack is a failed exchange.
pub mod nack {
    pub const SET_CFG0: u8 = 0x01;
    pub const GET_CFG0: u8 = 0x02;
    pub const SET_CFG1: u8 = 0x03;
    pub const GET_CFG1: u8 = 0x04;
    pub const GET_STATUS0: u8 = 0x05;
    pub const GET_STATUS1: u8 = 0x06;
    pub const SET_CFG2: u8 = 0x07;
    pub const GET_CFG2: u8 = 0x08;
}

/// STATUS1 values up to this are benign transients during high-current switching.
pub const STATUS1_ERRATA_MASK: u8 = 0x03;

/// Configuration registers written during install, in install order.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ConfigRegister {
    Cfg0,
    Cfg2,
}

impl ConfigRegister {
    #[inline]
    pub fn command(self) -> u8 {
        match self {
            ConfigRegister::Cfg0 => cmd::SET_CFG0,
            ConfigRegister::Cfg2 => cmd::SET_CFG2,
        }
    }

    #[inline]
    pub fn ack(self) -> u8 {
        match self {
            ConfigRegister::Cfg0 => ack::SET_CFG0,
            ConfigRegister::Cfg2 => ack::SET_CFG2,
        }
    }
}

/// Status registers read on every poll, in poll order.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum StatusRegister {
    Status0,
    Status1,
}

impl StatusRegister {
    #[inline]
    pub fn command(self) -> u8 {
        match self {
            StatusRegister::Status0 => cmd::GET_STATUS0,
            StatusRegister::Status1 => cmd::GET_STATUS1,
        }
    }

    #[inline]
    pub fn ack(self) -> u8 {
        match self {
            StatusRegister::Status0 => ack::GET_STATUS0,
            StatusRegister::Status1 => ack::GET_STATUS1,
        }
    }
}

/// External MOSFET over-current limit (CFG0 bits 1:0).
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[repr(u8)]
pub enum OcLimit {
    Mv250 = 0,
    Mv500 = 1,
    Mv750 = 2,
    V1 = 3,
}

impl From<u8> for OcLimit {
    fn from(bits: u8) -> Self {
        match bits & 0x03 {
            0 => OcLimit::Mv250,
            1 => OcLimit::Mv500,
            2 => OcLimit::Mv750,
            _ => OcLimit::V1,
        }
    }
}

/// Driver blanking time (CFG2 bits 1:0).
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[repr(u8)]
pub enum BlankingTime {
    Ns4000 = 0,
    Ns2000 = 1,
    Ns1000 = 2,
    Ns500 = 3,
}

impl From<u8> for BlankingTime {
    fn from(bits: u8) -> Self {
        match bits & 0x03 {
            0 => BlankingTime::Ns4000,
            1 => BlankingTime::Ns2000,
            2 => BlankingTime::Ns1000,
            _ => BlankingTime::Ns500,
        }
    }
}

/// PWMxH/PWMxL dead time (CFG2 bits 4:2).
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[repr(u8)]
pub enum DeadTime {
    Ns2000 = 0,
    Ns1750 = 1,
    Ns1500 = 2,
    Ns1250 = 3,
    Ns1000 = 4,
    Ns750 = 5,
    Ns500 = 6,
    Ns250 = 7,
}

impl From<u8> for DeadTime {
    fn from(bits: u8) -> Self {
        match bits & 0x07 {
            0 => DeadTime::Ns2000,
            1 => DeadTime::Ns1750,
            2 => DeadTime::Ns1500,
            3 => DeadTime::Ns1250,
            4 => DeadTime::Ns1000,
            5 => DeadTime::Ns750,
            6 => DeadTime::Ns500,
            _ => DeadTime::Ns250,
        }
    }
}

bitfield! {
    /// Configuration register 0.
    #[derive(Copy, Clone, PartialEq, Eq)]
    pub struct Cfg0(u8);
    impl Debug;

    pub u8, oc_limit_bits, set_oc_limit_bits: 1, 0;
    /// External MOSFET short-circuit detection off.
    pub sc_detect_disabled, set_sc_detect_disabled: 2;
    /// External MOSFET under-voltage lockout off.
    pub uvlo_disabled, set_uvlo_disabled: 3;
    /// Enter sleep rather than standby when OE drops.
    pub sleep_mode, set_sleep_mode: 5;
}

impl Cfg0 {
    #[inline]
    pub const fn from_raw(raw: u8) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn raw(&self) -> u8 {
        self.0
    }

    #[inline]
    pub fn oc_limit(&self) -> OcLimit {
        OcLimit::from(self.oc_limit_bits())
    }

    #[inline]
    pub fn set_oc_limit(&mut self, limit: OcLimit) {
        self.set_oc_limit_bits(limit as u8);
    }
}

/// Standby on OE low, UVLO and short-circuit detection on, 1 V over-current limit.
impl Default for Cfg0 {
    fn default() -> Self {
        let mut cfg = Cfg0(0);
        cfg.set_oc_limit(OcLimit::V1);
        cfg
    }
}

bitfield! {
    /// Configuration register 2.
    #[derive(Copy, Clone, PartialEq, Eq)]
    pub struct Cfg2(u8);
    impl Debug;

    pub u8, blanking_bits, set_blanking_bits: 1, 0;
    pub u8, dead_time_bits, set_dead_time_bits: 4, 2;
}

impl Cfg2 {
    #[inline]
    pub const fn from_raw(raw: u8) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn raw(&self) -> u8 {
        self.0
    }

    #[inline]
    pub fn blanking(&self) -> BlankingTime {
        BlankingTime::from(self.blanking_bits())
    }

    #[inline]
    pub fn set_blanking(&mut self, time: BlankingTime) {
        self.set_blanking_bits(time as u8);
    }

    #[inline]
    pub fn dead_time(&self) -> DeadTime {
        DeadTime::from(self.dead_time_bits())
    }

    #[inline]
    pub fn set_dead_time(&mut self, time: DeadTime) {
        self.set_dead_time_bits(time as u8);
    }
}

/// 4000 ns blanking, 250 ns dead time.
impl Default for Cfg2 {
    fn default() -> Self {
        let mut cfg = Cfg2(0);
        cfg.set_blanking(BlankingTime::Ns4000);
        cfg.set_dead_time(DeadTime::Ns250);
        cfg
    }
}

bitfield! {
    /// Status register 0. Any set bit is a fault.
    #[derive(Copy, Clone, Default, PartialEq, Eq)]
    pub struct Status0(u8);
    impl Debug;

    /// At least one fault is active.
    pub fault, _: 0;
    /// Junction above +115 °C.
    pub over_temp_warning, _: 1;
    /// Junction above +160 °C.
    pub over_temp_fault, _: 2;
    /// VDD below 5.5 V.
    pub input_undervoltage, _: 3;
    /// VDD above 32 V.
    pub input_overvoltage, _: 4;
    /// Non-zero means the configuration was lost.
    pub u8, power_control, _: 7, 5;
}

impl Status0 {
    #[inline]
    pub const fn from_raw(raw: u8) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn raw(&self) -> u8 {
        self.0
    }

    #[inline]
    pub fn is_clear(&self) -> bool {
        self.0 == 0
    }
}

bitfield! {
    /// Status register 1.
    #[derive(Copy, Clone, Default, PartialEq, Eq)]
    pub struct Status1(u8);
    impl Debug;

    /// VREG LDO output below 2.9 V.
    pub vreg_undervoltage, _: 0;
    pub ext_fet_uvlo, _: 2;
    pub ext_fet_overcurrent, _: 3;
}

impl Status1 {
    #[inline]
    pub const fn from_raw(raw: u8) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn raw(&self) -> u8 {
        self.0
    }

    /// Outside the benign range covered by [`STATUS1_ERRATA_MASK`].
    #[inline]
    pub fn exceeds_errata(&self) -> bool {
        self.0 > STATUS1_ERRATA_MASK
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_bytes_match_board_setup() {
        assert_eq!(Cfg0::default().raw(), 0x03);
        assert_eq!(Cfg2::default().raw(), 0x1C);
    }

    #[test]
    fn cfg0_fields_land_on_their_bits() {
        let mut cfg = Cfg0::from_raw(0);
        cfg.set_sleep_mode(true);
        cfg.set_uvlo_disabled(true);
        cfg.set_sc_detect_disabled(true);
        cfg.set_oc_limit(OcLimit::Mv500);
        assert_eq!(cfg.raw(), 0b0010_1101);
        assert_eq!(cfg.oc_limit(), OcLimit::Mv500);
    }

    #[test]
    fn cfg2_fields_round_trip() {
        let cfg = Cfg2::from_raw(0x1C);
        assert_eq!(cfg.blanking(), BlankingTime::Ns4000);
        assert_eq!(cfg.dead_time(), DeadTime::Ns250);
    }

    #[test]
    fn status_decoding() {
        let s0 = Status0::from_raw(0b1010_0001);
        assert!(s0.fault());
        assert!(!s0.over_temp_fault());
        assert_eq!(s0.power_control(), 0b101);
        assert!(!s0.is_clear());

        assert!(!Status1::from_raw(0x03).exceeds_errata());
        assert!(Status1::from_raw(0x04).exceeds_errata());
        assert!(Status1::from_raw(0x08).ext_fet_overcurrent());
    }

    #[test]
    fn register_codes_pair_up() {
        assert_eq!(ConfigRegister::Cfg0.command(), 0x81);
        assert_eq!(ConfigRegister::Cfg2.ack(), 0x47);
        assert_eq!(StatusRegister::Status1.command(), 0x86);
        assert_eq!(StatusRegister::Status0.ack(), 0x45);
        assert_eq!(nack::SET_CFG2, cmd::SET_CFG2 & 0x0F);
    }
}
