// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! # Hardware Layer
//!
//! Peripheral-facing pieces the link engine is built on: the serial [`Channel`] capability, the
//! chip-enable line, and tick counters. The STM32 implementations only exist with the `board`
//! feature; [`mock`] provides a simulated device for host builds.

pub mod channel;
pub mod chip_enable;
pub mod tick;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

#[cfg(feature = "board")]
pub mod uart_channel;
#[cfg(feature = "board")]
pub mod usart;

pub use channel::{Channel, ChannelId, SpeedMode};
pub use chip_enable::ChipEnable;
pub use tick::{Countdown, ServiceTick};

#[cfg(feature = "board")]
pub use uart_channel::Usart2Channel;
#[cfg(feature = "board")]
pub use usart::{SerialLogger, Usart};
