// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! # mcboard Firmware
//!
//! Serial-link engine for the MCP8024 three-phase gate driver on an STM32F777 motor-control
//! board. It brings the link up, negotiates the bit rate, installs the CFG0 / CFG2 configuration,
//! and keeps polling STATUS0 / STATUS1 for faults.
//!
//! ## Crate Structure
//!
//! | Module | Purpose |
//! | ------ | -------- |
//! | [`hw`] | Serial channel capability, chip-enable line, ticks, STM32 USART bindings |
//! | [`drivers`] | The MCP8024 link engine (bring-up, auto-baud, install, status poll) |
//! | [`board`] | Board façade and board-service sequencer |
//! | [`config`] | Bit-rate window, timing and register defaults |
//! | [`error`] | Link error type |
//!
//! ## Getting Started
//!
//! Run the host tests:
//!
//! ```bash
//! cargo test
//! ```
//!
//! Flash the board:
//!
//! ```bash
//! cargo run --release --features board --target thumbv7em-none-eabihf
//! ```
//!
//! ## License
//!
//! Licensed under the **MIT License**.
//! See the `LICENSE` file in the repository root for full terms.
//!
//! © 2025–2026 Christopher Liu

#![cfg_attr(not(test), no_std)]

#[cfg(all(feature = "mock", not(test)))]
extern crate std;

pub mod board;
pub mod config;
pub mod drivers;
pub mod error;
pub mod hw;

pub use board::{Board, BoardService, BoardStatus, FaultLine, SystemState};
pub use config::GateDriverConfig;
pub use drivers::mcp8024::{ConfigState, Mcp8024, OperationState};
pub use error::Error;
