// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Break/sync auto-baud negotiation.
//!
//! The host stretches a dummy byte into a break by sending it at the slower break-window divisor,
//! then arms the peripheral's hardware baud measurement for the device's sync character. A
//! measurement is only taken over when it falls strictly inside the configured window.

use embedded_hal::digital::OutputPin;
use log::{debug, trace};

use super::{Mcp8024, OperationState};
use crate::error::Error;
use crate::hw::Channel;

/// Byte sent under the break request.
pub const BREAK_DUMMY_BYTE: u8 = 0x00;

/// Bytes the break/sync exchange leaves in the receive buffer.
const SYNC_DRAIN: usize = 2;

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum AutoBaudStep {
    #[default]
    Request,
    Receive,
    Verify,
}

impl<'a, C: Channel, P: OutputPin> Mcp8024<'a, C, P> {
    /// One auto-baud step. Returns `Busy` while in progress, `Done` once a measurement has been
    /// taken (accepted or not), `TryAgain` when the cycle has to start over.
    pub(super) fn auto_baud(&mut self) -> OperationState {
        match self.link.auto_baud_step {
            AutoBaudStep::Request => {
                self.channel.transmit_enable();
                self.channel.flush_receive();
                self.link.baud_divisor = self.channel.baud_divisor();

                if !self.channel.is_transmit_complete() {
                    trace!("mcp8024: auto-baud deferred, tx busy");
                    self.link.timeout.arm(self.timeouts.read_status_ack);
                    return OperationState::TryAgain;
                }

                self.channel.set_baud_divisor(self.config.baud.break_window);
                self.channel.break_request();
                let _ = self.write(BREAK_DUMMY_BYTE);
                self.link.timeout.arm(self.timeouts.break_sequence);
                self.channel.transmit_disable();
                self.channel.transmit_empty_clear();
                self.link.auto_baud_step = AutoBaudStep::Receive;
                OperationState::Busy
            }

            AutoBaudStep::Receive => {
                self.channel.break_clear();
                self.channel.auto_baud_enable();
                self.link.timeout.arm(self.timeouts.character_receive);
                self.link.auto_baud_step = AutoBaudStep::Verify;
                OperationState::Busy
            }

            AutoBaudStep::Verify => {
                let state = if self.channel.is_auto_baud_complete() {
                    let measured = self.channel.baud_divisor();
                    if self.config.baud.accepts(measured) {
                        debug!("mcp8024: auto-baud divisor {}", measured);
                        self.link.baud_divisor = measured;
                    } else {
                        self.note(Error::AutoBaudOutOfRange(measured));
                        self.channel.set_baud_divisor(self.link.baud_divisor);
                    }
                    OperationState::Done
                } else {
                    debug!("mcp8024: no sync character");
                    self.channel.set_baud_divisor(self.config.baud.nominal);
                    self.channel.auto_baud_disable();
                    OperationState::TryAgain
                };

                let _ = self.read_reply::<SYNC_DRAIN>();
                self.channel.flush_receive();
                self.link.auto_baud_step = AutoBaudStep::Request;
                let residue = core::mem::take(&mut self.link.timeout_residue);
                self.link.timeout.arm(residue);
                state
            }
        }
    }
}
