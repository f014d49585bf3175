// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Link bring-up.
//!
//! `Uninitialized → Disabled → Disconnected → AutoBaud → Connected → Installed`, with any failed
//! install falling back through `TryAgain` to a full power cycle of the chip. The fifth consecutive
//! failure ends in `Error`.

use embedded_hal::digital::OutputPin;
use log::{error, info};

use super::{ConfigState, Mcp8024, OperationState, RETRY_LIMIT};
use crate::error::Error;
use crate::hw::Channel;

impl<'a, C: Channel, P: OutputPin> Mcp8024<'a, C, P> {
    /// Run one bring-up step if the countdown has expired. Returns the bring-up state.
    pub fn configure(&mut self) -> ConfigState {
        if !self.link.timeout.tick() {
            return self.link.config_state;
        }

        self.link.config_state = match self.link.config_state {
            ConfigState::Uninitialized => match self.initialize() {
                Ok(()) => ConfigState::Disabled,
                Err(err) => {
                    error!("mcp8024: initialize failed: {}", err);
                    self.link.last_error = Some(err);
                    ConfigState::Error
                }
            },

            ConfigState::Disabled => match self.enable() {
                Ok(()) => ConfigState::Disconnected,
                Err(err) => {
                    self.note(err);
                    ConfigState::TryAgain
                }
            },

            ConfigState::Disconnected => {
                self.connect();
                ConfigState::AutoBaud
            }

            ConfigState::AutoBaud => match self.auto_baud() {
                OperationState::Done => ConfigState::Connected,
                _ => ConfigState::AutoBaud,
            },

            ConfigState::Connected => {
                let state = self.install();
                if state == ConfigState::Installed {
                    info!("mcp8024: installed");
                    self.link.operation_state = OperationState::Busy;
                    self.link.retry_count = 0;
                }
                state
            }

            ConfigState::TryAgain => {
                self.link.retry_count += 1;
                if self.link.retry_count >= RETRY_LIMIT {
                    self.link.retry_count = RETRY_LIMIT;
                    error!("mcp8024: bring-up gave up after {} attempts", RETRY_LIMIT);
                    self.link.last_error = Some(Error::RetryLimitExceeded);
                    ConfigState::Error
                } else {
                    if let Err(err) = self.disable() {
                        self.note(err);
                    }
                    ConfigState::Disabled
                }
            }

            state @ (ConfigState::Installed | ConfigState::Error) => state,
        };

        self.link.config_state
    }
}
