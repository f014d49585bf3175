// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Runtime status poll.
//!
//! Every poll cycle re-runs auto-baud, then reads STATUS0 and STATUS1. A clean cycle arms the poll
//! interval; a failed exchange backs off through `TryAgain`, and the fifth failure in a row leaves
//! the machine in `Error` for good. A fault reported by the device is an `Error` too, but polling
//! carries on so the state recovers once the fault is cleared.

use embedded_hal::digital::OutputPin;
use log::{error, info, warn};

use super::frame;
use super::registers::{Status0, Status1, StatusRegister};
use super::{Mcp8024, OperationState, RETRY_LIMIT};
use crate::error::Error;
use crate::hw::Channel;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum StatusStep {
    Send(StatusRegister),
    ArmReceive(StatusRegister),
    Verify(StatusRegister),
}

impl Default for StatusStep {
    fn default() -> Self {
        StatusStep::Send(StatusRegister::Status0)
    }
}

impl<'a, C: Channel, P: OutputPin> Mcp8024<'a, C, P> {
    /// `Error` reached through the retry limit. Nothing but a reset leaves it.
    pub fn is_dead(&self) -> bool {
        self.link.operation_state == OperationState::Error && self.link.retry_count >= RETRY_LIMIT
    }

    /// Run one status-machine step. Returns the runtime state.
    pub fn service(&mut self) -> OperationState {
        if self.is_dead() {
            return OperationState::Error;
        }

        match self.link.operation_state {
            OperationState::TryAgain => {
                if self.link.timeout.tick() {
                    self.link.retry_count += 1;
                    self.link.status_step = StatusStep::default();
                    if self.link.retry_count >= RETRY_LIMIT {
                        self.link.retry_count = RETRY_LIMIT;
                        error!("mcp8024: status poll gave up after {} attempts", RETRY_LIMIT);
                        self.link.last_error = Some(Error::RetryLimitExceeded);
                        self.link.operation_state = OperationState::Error;
                    } else {
                        self.channel.flush_receive();
                        self.link.operation_state = OperationState::Done;
                    }
                }
            }

            OperationState::Warning
            | OperationState::Error
            | OperationState::Ready
            | OperationState::Done => {
                if self.link.auto_baud_requested {
                    self.link.timeout_residue = self.link.timeout.take();
                    self.link.operation_state = OperationState::AutoBaud;
                } else if self.link.timeout.tick() {
                    self.link.operation_state = OperationState::AutoBaud;
                }
            }

            OperationState::AutoBaud => {
                if self.link.timeout.tick() && self.auto_baud() == OperationState::Done {
                    if self.link.auto_baud_requested {
                        self.link.auto_baud_requested = false;
                        self.link.operation_state = OperationState::Done;
                    } else {
                        self.link.operation_state = OperationState::Busy;
                        self.link.timeout_residue = 0;
                        self.link.timeout.clear();
                    }
                }
            }

            OperationState::Busy => {
                if self.link.timeout.tick() {
                    let state = self.read_status();
                    if state == OperationState::Done {
                        self.link.auto_baud_requested = false;
                    }
                    self.link.operation_state = state;
                }
            }

            OperationState::NotReady => {
                self.link.operation_state = OperationState::Done;
            }
        }

        self.link.operation_state
    }

    /// One step of the STATUS0 / STATUS1 read. Returns `Busy` while in progress.
    pub(super) fn read_status(&mut self) -> OperationState {
        match self.link.status_step {
            StatusStep::Send(reg) => {
                self.channel.transmit_enable();
                self.channel.flush_receive();
                if self.write(reg.command()) {
                    self.link.timeout.arm(self.timeouts.read_status_rx_switch);
                    self.link.status_step = StatusStep::ArmReceive(reg);
                }
                OperationState::Busy
            }

            StatusStep::ArmReceive(reg) => {
                if !self.transmit_drained() {
                    return OperationState::Busy;
                }
                self.channel.transmit_disable();
                self.link.timeout.arm(self.timeouts.read_status_ack);
                self.link.status_step = StatusStep::Verify(reg);
                OperationState::Busy
            }

            StatusStep::Verify(reg) => {
                let reply = self.read_reply::<3>();
                let value = match frame::check_status_ack(reg, &reply) {
                    Ok(value) => value,
                    Err(err) => {
                        self.note(err);
                        self.link.timeout.arm(self.timeouts.read_status_ack);
                        self.link.status_step = StatusStep::default();
                        return OperationState::TryAgain;
                    }
                };

                match reg {
                    StatusRegister::Status0 => {
                        self.link.status0 = Status0::from_raw(value);
                        self.link.status_step = StatusStep::Send(StatusRegister::Status1);
                        OperationState::Busy
                    }
                    StatusRegister::Status1 => {
                        self.link.status1 = Status1::from_raw(value);
                        self.link.status_step = StatusStep::default();
                        self.link.timeout.arm(self.timeouts.status_read_interval);
                        self.poll_result()
                    }
                }
            }
        }
    }

    fn poll_result(&mut self) -> OperationState {
        let (s0, s1) = (self.link.status0, self.link.status1);
        if !s0.is_clear() || s1.exceeds_errata() {
            warn!(
                "mcp8024: device fault, STATUS0=0x{:02X} STATUS1=0x{:02X}",
                s0.raw(),
                s1.raw()
            );
            return OperationState::Error;
        }

        self.link.retry_count = 0;
        if self.chip_enable.is_fault_active() {
            info!("mcp8024: fault cleared");
            self.chip_enable.clear_fault();
        }
        OperationState::Done
    }
}
