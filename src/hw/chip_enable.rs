// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Gate-driver chip-enable line.
//!
//! The enable line has two writers: the tick-driven link engine (assert / de-assert during
//! bring-up) and the fault handler (a short low pulse that clears latched faults). `ChipEnable` is
//! the single owner of the pin and runs every pin write inside a critical section, so a pulse can
//! never interleave with a tick-path write. All methods take `&self`, which lets the line live in a
//! `static` shared with interrupt handlers.

use core::cell::RefCell;
use core::sync::atomic::{AtomicBool, Ordering};

use critical_section::Mutex;
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;

use crate::error::Error;

pub struct ChipEnable<P> {
    pin: Mutex<RefCell<Option<P>>>,
    asserted: AtomicBool,
    fault_active: AtomicBool,
}

impl<P: OutputPin> ChipEnable<P> {
    /// An unbound line. Every write fails with [`Error::ChipEnable`] until [`ChipEnable::bind`].
    pub const fn new() -> Self {
        Self {
            pin: Mutex::new(RefCell::new(None)),
            asserted: AtomicBool::new(false),
            fault_active: AtomicBool::new(false),
        }
    }

    /// Take ownership of the pin. The line is never rebound; a second pin is handed back.
    pub fn bind(&self, pin: P) -> Result<(), P> {
        critical_section::with(|cs| {
            let mut slot = self.pin.borrow_ref_mut(cs);
            if slot.is_some() {
                return Err(pin);
            }
            *slot = Some(pin);
            Ok(())
        })
    }

    pub fn is_bound(&self) -> bool {
        critical_section::with(|cs| self.pin.borrow_ref(cs).is_some())
    }

    /// Drive the line high (chip enabled).
    pub fn assert(&self) -> Result<(), Error> {
        self.drive(true)
    }

    /// Drive the line low (chip disabled).
    pub fn deassert(&self) -> Result<(), Error> {
        self.drive(false)
    }

    /// Low, `width_us` microseconds, high. Safe to call from interrupt context; the whole pulse is
    /// one critical section. Latches the fault flag until [`ChipEnable::clear_fault`].
    pub fn pulse<D: DelayNs>(&self, delay: &mut D, width_us: u32) -> Result<(), Error> {
        critical_section::with(|cs| {
            let mut slot = self.pin.borrow_ref_mut(cs);
            let pin = slot.as_mut().ok_or(Error::ChipEnable)?;
            pin.set_low().map_err(|_| Error::ChipEnable)?;
            delay.delay_us(width_us);
            pin.set_high().map_err(|_| Error::ChipEnable)?;
            self.asserted.store(true, Ordering::Relaxed);
            self.fault_active.store(true, Ordering::Relaxed);
            Ok(())
        })
    }

    #[inline]
    pub fn is_asserted(&self) -> bool {
        self.asserted.load(Ordering::Relaxed)
    }

    /// A fault-clear pulse has been issued and no clean status poll has happened since.
    #[inline]
    pub fn is_fault_active(&self) -> bool {
        self.fault_active.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn clear_fault(&self) {
        self.fault_active.store(false, Ordering::Relaxed);
    }

    /// Release the pin.
    pub fn free(self) -> Option<P> {
        self.pin.into_inner().into_inner()
    }

    fn drive(&self, high: bool) -> Result<(), Error> {
        critical_section::with(|cs| {
            let mut slot = self.pin.borrow_ref_mut(cs);
            let pin = slot.as_mut().ok_or(Error::ChipEnable)?;
            let res = if high { pin.set_high() } else { pin.set_low() };
            res.map_err(|_| Error::ChipEnable)?;
            self.asserted.store(high, Ordering::Relaxed);
            Ok(())
        })
    }
}

impl<P: OutputPin> Default for ChipEnable<P> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal_mock::eh1::delay::NoopDelay;
    use embedded_hal_mock::eh1::digital::{Mock as PinMock, State, Transaction};

    #[test]
    fn unbound_line_refuses_writes() {
        let ce: ChipEnable<PinMock> = ChipEnable::new();
        assert!(!ce.is_bound());
        assert_eq!(ce.assert(), Err(Error::ChipEnable));
        assert_eq!(ce.pulse(&mut NoopDelay::new(), 5), Err(Error::ChipEnable));
        assert!(!ce.is_fault_active());
    }

    #[test]
    fn assert_and_deassert_drive_the_pin() {
        let pin = PinMock::new(&[
            Transaction::set(State::High),
            Transaction::set(State::Low),
        ]);
        let ce = ChipEnable::new();
        assert!(ce.bind(pin).is_ok());

        ce.assert().unwrap();
        assert!(ce.is_asserted());
        ce.deassert().unwrap();
        assert!(!ce.is_asserted());

        ce.free().unwrap().done();
    }

    #[test]
    fn pulse_goes_low_then_high_and_latches_fault() {
        let pin = PinMock::new(&[
            Transaction::set(State::High),
            Transaction::set(State::Low),
            Transaction::set(State::High),
        ]);
        let ce = ChipEnable::new();
        assert!(ce.bind(pin).is_ok());
        ce.assert().unwrap();

        ce.pulse(&mut NoopDelay::new(), 5).unwrap();
        assert!(ce.is_asserted());
        assert!(ce.is_fault_active());

        ce.clear_fault();
        assert!(!ce.is_fault_active());

        ce.free().unwrap().done();
    }

    #[test]
    fn second_bind_keeps_first_pin() {
        let first = PinMock::new(&[Transaction::set(State::High)]);
        let second = PinMock::new(&[]);
        let ce = ChipEnable::new();
        assert!(ce.bind(first).is_ok());
        ce.bind(second).unwrap_err().done();

        ce.assert().unwrap();
        ce.free().unwrap().done();
    }
}
