// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! USART2 as a gate-driver [`Channel`], using direct PAC register access.
//!
//! The HAL `Serial` type owns its configuration for life, but the link engine has to reprogram
//! the divisor, send breaks and run hardware auto-baud on the fly, so this goes straight to the
//! registers the way the ADC wrapper does.
//!
//! The MCP8024 shares one wire for both directions: enabling the transmitter turns the receiver
//! off and vice versa.

use stm32f7xx_hal::pac;

use super::channel::{Channel, ChannelId, SpeedMode};

// CR1
const UE: u32 = 1 << 0;
const RE: u32 = 1 << 2;
const TE: u32 = 1 << 3;
const RXNEIE: u32 = 1 << 5;
const TXEIE: u32 = 1 << 7;
const OVER8: u32 = 1 << 15;

// CR2
const ABREN: u32 = 1 << 20;
const ABRMOD_MASK: u32 = 0b11 << 21;
const ABRMOD_FALLING_EDGE: u32 = 0b01 << 21;

// RQR
const ABRRQ: u32 = 1 << 0;
const SBKRQ: u32 = 1 << 1;
const RXFRQ: u32 = 1 << 3;

// ISR
const ORE: u32 = 1 << 3;
const RXNE: u32 = 1 << 5;
const TC: u32 = 1 << 6;
const TXE: u32 = 1 << 7;
const ABRF: u32 = 1 << 15;

// ICR
const FECF: u32 = 1 << 1;
const ORECF: u32 = 1 << 3;
const TCCF: u32 = 1 << 6;

/// Gate-driver serial line on USART2.
pub struct Usart2Channel {
    usart: pac::USART2,
}

impl Usart2Channel {
    /// Enable the USART2 clock and take the peripheral. Pins must already be in AF7.
    pub fn new(usart: pac::USART2) -> Self {
        let rcc = unsafe { &*pac::RCC::ptr() };
        rcc.apb1enr.modify(|_, w| w.usart2en().set_bit());
        Self { usart }
    }

    #[inline]
    pub fn free(self) -> pac::USART2 {
        self.usart
    }

    #[inline]
    fn cr1_set(&mut self, mask: u32) {
        self.usart.cr1.modify(|r, w| unsafe { w.bits(r.bits() | mask) });
    }

    #[inline]
    fn cr1_clear(&mut self, mask: u32) {
        self.usart.cr1.modify(|r, w| unsafe { w.bits(r.bits() & !mask) });
    }

    #[inline]
    fn isr(&self) -> u32 {
        self.usart.isr.read().bits()
    }

    #[inline]
    fn request(&mut self, mask: u32) {
        self.usart.rqr.write(|w| unsafe { w.bits(mask) });
    }

    /// Run `f` with UE cleared, restoring UE afterwards if it was set.
    fn with_module_disabled(&mut self, f: impl FnOnce(&pac::usart1::RegisterBlock)) {
        let enabled = self.usart.cr1.read().bits() & UE != 0;
        self.cr1_clear(UE);
        f(&self.usart);
        if enabled {
            self.cr1_set(UE);
        }
    }
}

impl Channel for Usart2Channel {
    fn id(&self) -> ChannelId {
        ChannelId(2)
    }

    fn initialize(&mut self) {
        self.usart.cr1.write(|w| unsafe { w.bits(0) });
        self.usart.cr2.write(|w| unsafe { w.bits(0) });
        self.usart.cr3.write(|w| unsafe { w.bits(0) });
        self.usart.icr.write(|w| unsafe { w.bits(ORECF | TCCF) });
    }

    fn module_enable(&mut self) {
        self.cr1_set(UE);
    }

    fn module_disable(&mut self) {
        self.cr1_clear(UE);
    }

    fn set_speed_mode(&mut self, mode: SpeedMode) {
        self.with_module_disabled(|usart| {
            usart.cr1.modify(|r, w| unsafe {
                w.bits(match mode {
                    SpeedMode::Standard => r.bits() & !OVER8,
                    SpeedMode::HighSpeed => r.bits() | OVER8,
                })
            });
        });
    }

    fn set_baud_divisor(&mut self, divisor: u16) {
        self.with_module_disabled(|usart| {
            usart.brr.write(|w| unsafe { w.bits(divisor as u32) });
        });
    }

    fn baud_divisor(&self) -> u16 {
        self.usart.brr.read().bits() as u16
    }

    fn transmit_enable(&mut self) {
        self.cr1_clear(RE);
        self.cr1_set(TE);
    }

    fn transmit_disable(&mut self) {
        self.cr1_clear(TE);
        self.cr1_set(RE);
    }

    fn rx_interrupt_enable(&mut self) {
        self.cr1_set(RXNEIE);
    }

    fn rx_interrupt_disable(&mut self) {
        self.cr1_clear(RXNEIE);
    }

    fn rx_interrupt_clear(&mut self) {
        self.usart.icr.write(|w| unsafe { w.bits(ORECF) });
        self.request(RXFRQ);
    }

    fn tx_interrupt_enable(&mut self) {
        self.cr1_set(TXEIE);
    }

    fn tx_interrupt_disable(&mut self) {
        self.cr1_clear(TXEIE);
    }

    fn tx_interrupt_clear(&mut self) {
        self.usart.icr.write(|w| unsafe { w.bits(TCCF) });
    }

    fn is_transmit_complete(&self) -> bool {
        self.isr() & TC != 0
    }

    fn is_transmit_full(&self) -> bool {
        self.isr() & TXE == 0
    }

    fn is_receive_ready(&self) -> bool {
        self.isr() & RXNE != 0
    }

    fn write_data(&mut self, byte: u8) {
        self.usart.tdr.write(|w| unsafe { w.bits(byte as u32) });
    }

    fn read_data(&mut self) -> u8 {
        self.usart.rdr.read().bits() as u8
    }

    fn flush_receive(&mut self) {
        while self.isr() & (RXNE | ORE) != 0 {
            self.usart.icr.write(|w| unsafe { w.bits(ORECF) });
            self.request(RXFRQ);
        }
    }

    fn break_request(&mut self) {
        self.request(SBKRQ);
    }

    fn break_clear(&mut self) {
        // SBKF drops by itself; only the framing error the break leaves on RX needs clearing
        self.usart.icr.write(|w| unsafe { w.bits(FECF) });
    }

    fn transmit_empty_clear(&mut self) {
        self.usart.icr.write(|w| unsafe { w.bits(TCCF) });
    }

    fn auto_baud_enable(&mut self) {
        self.with_module_disabled(|usart| {
            usart.cr2.modify(|r, w| unsafe {
                w.bits((r.bits() & !ABRMOD_MASK) | ABREN | ABRMOD_FALLING_EDGE)
            });
        });
        self.request(ABRRQ);
    }

    fn auto_baud_disable(&mut self) {
        self.with_module_disabled(|usart| {
            usart.cr2.modify(|r, w| unsafe { w.bits(r.bits() & !(ABREN | ABRMOD_MASK)) });
        });
    }

    fn is_auto_baud_complete(&self) -> bool {
        self.isr() & ABRF != 0
    }
}
