// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Board façade and board-service sequencer.
//!
//! [`Board`] is what the rest of the firmware sees of the gate driver: `configure` during bring-up,
//! `service` afterwards, `fault_clear` from the fault interrupt, and `auto_baud_request` from
//! anyone who suspects the bit rate has drifted.
//!
//! [`BoardService`] runs the board through initialization into steady state, one step per
//! [`ServiceTick`] period.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use log::{error, info};

use crate::config::GateDriverConfig;
use crate::drivers::mcp8024::{ConfigState, Mcp8024, OperationState};
use crate::error::Error;
use crate::hw::{Channel, ChipEnable, ServiceTick};

/// Board readiness as seen by the motor-control layer.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
#[repr(u8)]
pub enum BoardStatus {
    #[default]
    NotReady = 0,
    Error = 1,
    Busy = 3,
    Ready = 4,
}

impl From<ConfigState> for BoardStatus {
    fn from(state: ConfigState) -> Self {
        match state {
            ConfigState::Uninitialized => BoardStatus::NotReady,
            ConfigState::Error => BoardStatus::Error,
            ConfigState::Installed => BoardStatus::Ready,
            _ => BoardStatus::Busy,
        }
    }
}

impl From<OperationState> for BoardStatus {
    fn from(state: OperationState) -> Self {
        match state {
            OperationState::NotReady => BoardStatus::NotReady,
            OperationState::Error => BoardStatus::Error,
            OperationState::Done | OperationState::Ready => BoardStatus::Ready,
            _ => BoardStatus::Busy,
        }
    }
}

/// Copyable handle for clearing gate-driver faults from interrupt context.
pub struct FaultLine<'a, P> {
    chip_enable: &'a ChipEnable<P>,
    pulse_us: u32,
}

impl<P> Clone for FaultLine<'_, P> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<P> Copy for FaultLine<'_, P> {}

impl<P: OutputPin> FaultLine<'_, P> {
    pub fn clear<D: DelayNs>(&self, delay: &mut D) -> Result<(), Error> {
        self.chip_enable.pulse(delay, self.pulse_us)
    }
}

pub struct Board<'a, C, P> {
    gate_driver: Mcp8024<'a, C, P>,
}

impl<'a, C: Channel, P: OutputPin> Board<'a, C, P> {
    pub fn new(channel: C, chip_enable: &'a ChipEnable<P>, config: GateDriverConfig) -> Self {
        Self {
            gate_driver: Mcp8024::new(channel, chip_enable, config),
        }
    }

    /// One bring-up step.
    #[inline]
    pub fn configure(&mut self) -> ConfigState {
        self.gate_driver.configure()
    }

    /// One status-poll step.
    #[inline]
    pub fn service(&mut self) -> OperationState {
        self.gate_driver.service()
    }

    /// Pulse the chip-enable line to clear latched gate-driver faults.
    pub fn fault_clear<D: DelayNs>(&self, delay: &mut D) -> Result<(), Error> {
        self.fault_line().clear(delay)
    }

    #[inline]
    pub fn auto_baud_request(&mut self) {
        self.gate_driver.auto_baud_request();
    }

    /// Handle for the fault interrupt.
    pub fn fault_line(&self) -> FaultLine<'a, P> {
        FaultLine {
            chip_enable: self.gate_driver.chip_enable(),
            pulse_us: self.gate_driver.config().fault_clear_pulse.ticks(),
        }
    }

    pub fn gate_driver(&self) -> &Mcp8024<'a, C, P> {
        &self.gate_driver
    }

    pub fn gate_driver_mut(&mut self) -> &mut Mcp8024<'a, C, P> {
        &mut self.gate_driver
    }
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum SystemState {
    #[default]
    Initialization,
    Ready,
    Error,
}

/// Board-service sequencer: configure until ready, then service forever.
pub struct BoardService<'a, C, P> {
    board: Board<'a, C, P>,
    system_state: SystemState,
    status: BoardStatus,
}

impl<'a, C: Channel, P: OutputPin> BoardService<'a, C, P> {
    pub fn new(board: Board<'a, C, P>) -> Self {
        Self {
            board,
            system_state: SystemState::Initialization,
            status: BoardStatus::NotReady,
        }
    }

    /// Run one step if `tick` says a period has elapsed.
    pub fn poll(&mut self, tick: &ServiceTick) -> Option<BoardStatus> {
        if tick.take_due() {
            Some(self.step())
        } else {
            None
        }
    }

    /// Run one step unconditionally.
    pub fn step(&mut self) -> BoardStatus {
        match self.system_state {
            SystemState::Initialization => {
                self.status = self.board.configure().into();
                match self.status {
                    BoardStatus::Ready => {
                        info!("board: gate driver ready");
                        self.system_state = SystemState::Ready;
                    }
                    BoardStatus::Error => {
                        error!("board: gate driver bring-up failed");
                        self.system_state = SystemState::Error;
                    }
                    _ => {}
                }
            }
            SystemState::Ready => {
                self.status = self.board.service().into();
            }
            SystemState::Error => {}
        }
        self.status
    }

    #[inline]
    pub fn system_state(&self) -> SystemState {
        self.system_state
    }

    /// Status reported by the last step.
    #[inline]
    pub fn status(&self) -> BoardStatus {
        self.status
    }

    pub fn board(&self) -> &Board<'a, C, P> {
        &self.board
    }

    pub fn board_mut(&mut self) -> &mut Board<'a, C, P> {
        &mut self.board
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hw::mock::{MockPin, SimChannel};
    use crate::hw::ChannelId;
    use embedded_hal_mock::eh1::delay::NoopDelay;

    fn bound_line() -> ChipEnable<MockPin> {
        let ce = ChipEnable::new();
        assert!(ce.bind(MockPin::new()).is_ok());
        ce
    }

    fn board(ce: &ChipEnable<MockPin>) -> Board<'_, SimChannel, MockPin> {
        Board::new(SimChannel::new(ChannelId(2)), ce, GateDriverConfig::default())
    }

    #[test]
    fn status_codes_line_up() {
        assert_eq!(BoardStatus::from(ConfigState::Installed), BoardStatus::Ready);
        assert_eq!(BoardStatus::from(ConfigState::TryAgain), BoardStatus::Busy);
        assert_eq!(BoardStatus::from(ConfigState::Error), BoardStatus::Error);
        assert_eq!(BoardStatus::from(OperationState::Done), BoardStatus::Ready);
        assert_eq!(BoardStatus::from(OperationState::TryAgain), BoardStatus::Busy);
        assert_eq!(BoardStatus::from(OperationState::AutoBaud), BoardStatus::Busy);
        assert_eq!(BoardStatus::Ready as u8, ConfigState::Installed as u8);
    }

    #[test]
    fn service_reaches_ready_then_polls() {
        let ce = bound_line();
        let mut service = BoardService::new(board(&ce));

        for _ in 0..100 {
            if service.step() == BoardStatus::Ready {
                break;
            }
        }
        assert_eq!(service.system_state(), SystemState::Ready);

        for _ in 0..100 {
            service.step();
        }
        assert_eq!(service.status(), BoardStatus::Ready);
        assert_eq!(service.board().gate_driver().channel().tx_log()[5..], [0x85, 0x86]);
    }

    #[test]
    fn bring_up_failure_parks_the_service() {
        let ce = bound_line();
        let mut service = BoardService::new(Board::new(
            SimChannel::new(ChannelId(1)),
            &ce,
            GateDriverConfig::default(),
        ));

        assert_eq!(service.step(), BoardStatus::Error);
        assert_eq!(service.system_state(), SystemState::Error);
        assert_eq!(service.step(), BoardStatus::Error);
    }

    #[test]
    fn retry_churn_is_reported_as_busy() {
        let ce = bound_line();
        let mut b = board(&ce);
        b.gate_driver_mut().channel_mut().queue_reply(&[0x81, 0x03, 0x01, 0x03]);
        let mut service = BoardService::new(b);

        let mut seen = Vec::new();
        for _ in 0..200 {
            seen.push(service.step());
            if service.system_state() == SystemState::Ready {
                break;
            }
        }
        assert_eq!(seen.last(), Some(&BoardStatus::Ready));
        assert!(!seen.contains(&BoardStatus::Error));
    }

    #[test]
    fn poll_runs_once_per_tick_period() {
        let ce = bound_line();
        let mut service = BoardService::new(board(&ce));
        let tick = ServiceTick::new(2);

        assert!(service.poll(&tick).is_some());
        assert!(service.poll(&tick).is_none());
        tick.step();
        assert!(service.poll(&tick).is_none());
        tick.step();
        assert!(service.poll(&tick).is_some());
    }

    #[test]
    fn fault_line_pulses_chip_enable() {
        let ce = bound_line();
        let b = board(&ce);
        let line = b.fault_line();
        line.clear(&mut NoopDelay::new()).unwrap();
        b.fault_clear(&mut NoopDelay::new()).unwrap();
        assert!(ce.is_fault_active());

        drop(b);
        assert_eq!(ce.free().unwrap().levels(), [false, true, false, true]);
    }

    #[test]
    fn auto_baud_request_is_forwarded() {
        let ce = bound_line();
        let mut b = board(&ce);
        b.auto_baud_request();
        b.auto_baud_request();
        assert!(b.gate_driver().is_auto_baud_requested());
    }
}
