// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! # Device-Specific Drivers
//!
//! This module contains device-specific drivers that sit above the raw `hw/` layer and below the
//! board façade.
//!
//! ## Existing drivers
//!
//! - [`mcp8024`] – Microchip MCP8024 BLDC gate driver, configured and polled over its
//!   half-duplex serial link

pub mod mcp8024;

pub use mcp8024::Mcp8024;
