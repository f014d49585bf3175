// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Serial channel capability.
//!
//! `Channel` is the set of primitive operations a UART-like peripheral must expose so that a device
//! driver can run a half-duplex, byte-oriented protocol over it without knowing which peripheral it
//! is talking to. Every method acts on the bound peripheral's registers only and returns
//! immediately.

use core::convert::Infallible;

/// Opaque identifier of a channel binding (e.g. the USART instance number).
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct ChannelId(pub u8);

/// Baud clock oversampling.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum SpeedMode {
    /// 16x baud clock.
    #[default]
    Standard,
    /// 4x baud clock.
    HighSpeed,
}

/// Capability set of a serial peripheral.
pub trait Channel {
    /// Identifier of the peripheral behind this binding.
    fn id(&self) -> ChannelId;

    /// Put the peripheral in its reset configuration (8N1, receiver on, everything else off).
    fn initialize(&mut self);

    fn module_enable(&mut self);
    fn module_disable(&mut self);

    fn set_speed_mode(&mut self, mode: SpeedMode);

    fn set_baud_divisor(&mut self, divisor: u16);
    fn baud_divisor(&self) -> u16;

    /// Drive the line. Disabling transmit hands the half-duplex line to the receiver.
    fn transmit_enable(&mut self);
    fn transmit_disable(&mut self);

    fn rx_interrupt_enable(&mut self);
    fn rx_interrupt_disable(&mut self);
    fn rx_interrupt_clear(&mut self);

    fn tx_interrupt_enable(&mut self);
    fn tx_interrupt_disable(&mut self);
    fn tx_interrupt_clear(&mut self);

    /// Last byte, including its stop bit, has left the shift register.
    fn is_transmit_complete(&self) -> bool;
    fn is_transmit_full(&self) -> bool;
    fn is_receive_ready(&self) -> bool;

    /// Raw data register write. Callers go through [`Channel::write`].
    fn write_data(&mut self, byte: u8);
    /// Raw data register read. Callers go through [`Channel::read`].
    fn read_data(&mut self) -> u8;

    /// Discard everything in the receive buffer.
    fn flush_receive(&mut self);

    /// Request a break condition on the next transmitted character.
    fn break_request(&mut self);
    fn break_clear(&mut self);

    fn transmit_empty_clear(&mut self);

    /// Arm hardware baud-rate measurement on the next received sync character.
    fn auto_baud_enable(&mut self);
    fn auto_baud_disable(&mut self);
    fn is_auto_baud_complete(&self) -> bool;

    /// Queue one byte, or `WouldBlock` if the transmit buffer is full.
    fn write(&mut self, byte: u8) -> nb::Result<(), Infallible> {
        if self.is_transmit_full() {
            return Err(nb::Error::WouldBlock);
        }
        self.write_data(byte);
        Ok(())
    }

    /// Take one byte, or `WouldBlock` if nothing has been received.
    fn read(&mut self) -> nb::Result<u8, Infallible> {
        if !self.is_receive_ready() {
            return Err(nb::Error::WouldBlock);
        }
        Ok(self.read_data())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hw::mock::SimChannel;

    #[test]
    fn read_on_empty_buffer_would_block() {
        let mut ch = SimChannel::new(ChannelId(2));
        assert_eq!(ch.read(), Err(nb::Error::WouldBlock));
    }

    #[test]
    fn write_is_refused_while_transmit_buffer_full() {
        let mut ch = SimChannel::new(ChannelId(2));
        ch.set_transmit_full(true);
        assert_eq!(ch.write(0x85), Err(nb::Error::WouldBlock));
        assert!(ch.tx_log().is_empty());

        ch.set_transmit_full(false);
        ch.transmit_enable();
        assert_eq!(ch.write(0x85), Ok(()));
        assert_eq!(ch.tx_log(), [0x85]);
    }
}
