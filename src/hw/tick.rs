// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Cooperative scheduling primitives.
//!
//! - `Countdown` gates every state transition of the gate-driver machines: one call per tick, and a
//!   transition only runs once the countdown has expired.
//! - `ServiceTick` is the interrupt-side tick source that paces how often the board service runs.

use core::cell::Cell;

use critical_section::Mutex;

/// Tick countdown. Nothing in the link engine ever waits; it re-arms one of these instead.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct Countdown {
    remaining: u16,
}

impl Countdown {
    pub const fn new() -> Self {
        Self { remaining: 0 }
    }

    /// Advance by one tick. Returns `true` (without mutation) once the countdown is at zero.
    #[inline]
    pub fn tick(&mut self) -> bool {
        if self.remaining == 0 {
            true
        } else {
            self.remaining -= 1;
            false
        }
    }

    #[inline]
    pub fn arm(&mut self, ticks: u16) {
        self.remaining = ticks;
    }

    #[inline]
    pub fn clear(&mut self) {
        self.remaining = 0;
    }

    /// Return the pending ticks and leave the countdown expired.
    #[inline]
    pub fn take(&mut self) -> u16 {
        core::mem::take(&mut self.remaining)
    }

    #[inline]
    pub fn remaining(&self) -> u16 {
        self.remaining
    }
}

/// Tick source shared between the periodic timer interrupt and the main loop.
///
/// The interrupt calls [`ServiceTick::step`]; the main loop calls [`ServiceTick::take_due`] and runs
/// one board-service step whenever it returns `true`.
pub struct ServiceTick {
    count: Mutex<Cell<u16>>,
    period: u16,
}

impl ServiceTick {
    /// `period` timer interrupts make up one service tick. The first call to `take_due` is due
    /// immediately.
    pub const fn new(period: u16) -> Self {
        Self {
            count: Mutex::new(Cell::new(period)),
            period,
        }
    }

    /// Called from the timer interrupt. Saturates at the period.
    pub fn step(&self) {
        critical_section::with(|cs| {
            let count = self.count.borrow(cs);
            if count.get() < self.period {
                count.set(count.get() + 1);
            }
        });
    }

    /// Returns `true` once per elapsed period and restarts the count.
    pub fn take_due(&self) -> bool {
        critical_section::with(|cs| {
            let count = self.count.borrow(cs);
            if count.get() >= self.period {
                count.set(0);
                true
            } else {
                false
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expired_countdown_is_not_mutated() {
        let mut t = Countdown::new();
        assert!(t.tick());
        assert!(t.tick());
        assert_eq!(t.remaining(), 0);
    }

    #[test]
    fn armed_countdown_expires_after_n_ticks() {
        let mut t = Countdown::new();
        t.arm(3);
        assert!(!t.tick());
        assert!(!t.tick());
        assert!(!t.tick());
        assert!(t.tick());
    }

    #[test]
    fn take_leaves_countdown_expired() {
        let mut t = Countdown::new();
        t.arm(40);
        t.tick();
        assert_eq!(t.take(), 39);
        assert!(t.tick());
    }

    #[test]
    fn service_tick_fires_once_per_period() {
        let tick = ServiceTick::new(4);
        assert!(tick.take_due());
        assert!(!tick.take_due());

        for _ in 0..3 {
            tick.step();
            assert!(!tick.take_due());
        }
        tick.step();
        assert!(tick.take_due());
        assert!(!tick.take_due());
    }

    #[test]
    fn service_tick_saturates_when_main_loop_lags() {
        let tick = ServiceTick::new(2);
        assert!(tick.take_due());
        for _ in 0..10 {
            tick.step();
        }
        assert!(tick.take_due());
        assert!(!tick.take_due());
    }
}
