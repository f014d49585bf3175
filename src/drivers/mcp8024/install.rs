// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! CFG0 / CFG2 install.
//!
//! Each register is written with a send / switch-to-receive / verify sequence. A single bad byte in
//! either acknowledge restarts the whole install at CFG0.
//!
//! The command and value bytes go out back to back when the transmitter has room for both. A
//! single-buffered transmitter takes the value byte on a later tick (`SendValue`), and the line is
//! only turned around once the value byte has left the shift register.

use embedded_hal::digital::OutputPin;
use log::debug;

use super::frame;
use super::registers::ConfigRegister;
use super::{ConfigState, Mcp8024};
use crate::hw::Channel;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum InstallStep {
    Send(ConfigRegister),
    SendValue(ConfigRegister),
    ArmReceive(ConfigRegister),
    VerifyAck(ConfigRegister),
}

impl Default for InstallStep {
    fn default() -> Self {
        InstallStep::Send(ConfigRegister::Cfg0)
    }
}

impl<'a, C: Channel, P: OutputPin> Mcp8024<'a, C, P> {
    fn config_value(&self, reg: ConfigRegister) -> u8 {
        match reg {
            ConfigRegister::Cfg0 => self.link.cfg0.raw(),
            ConfigRegister::Cfg2 => self.link.cfg2.raw(),
        }
    }

    fn send_value(&mut self, reg: ConfigRegister) {
        let value = self.config_value(reg);
        if self.write(value) {
            self.link.timeout.arm(self.timeouts.set_config_rx_switch);
            self.link.install_step = InstallStep::ArmReceive(reg);
        }
    }

    /// One install step. Returns `Connected` while in progress.
    pub(super) fn install(&mut self) -> ConfigState {
        match self.link.install_step {
            InstallStep::Send(reg) => {
                self.channel.transmit_enable();
                self.channel.flush_receive();
                if self.write(reg.command()) {
                    self.link.install_step = InstallStep::SendValue(reg);
                    self.send_value(reg);
                }
                ConfigState::Connected
            }

            InstallStep::SendValue(reg) => {
                self.send_value(reg);
                ConfigState::Connected
            }

            InstallStep::ArmReceive(reg) => {
                if !self.transmit_drained() {
                    return ConfigState::Connected;
                }
                self.channel.transmit_disable();
                self.link.timeout.arm(self.timeouts.set_config_ack);
                self.link.install_step = InstallStep::VerifyAck(reg);
                ConfigState::Connected
            }

            InstallStep::VerifyAck(reg) => {
                let value = self.config_value(reg);
                let reply = self.read_reply::<4>();
                if let Err(err) = frame::check_set_ack(reg, value, &reply) {
                    self.note(err);
                    self.link.timeout.arm(self.timeouts.set_config_ack);
                    self.link.install_step = InstallStep::default();
                    return ConfigState::TryAgain;
                }

                debug!("mcp8024: {:?} = 0x{:02X}", reg, value);
                match reg {
                    ConfigRegister::Cfg0 => {
                        self.link.install_step = InstallStep::Send(ConfigRegister::Cfg2);
                        ConfigState::Connected
                    }
                    ConfigRegister::Cfg2 => {
                        self.link.install_step = InstallStep::default();
                        ConfigState::Installed
                    }
                }
            }
        }
    }
}
