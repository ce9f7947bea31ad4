//! The 11-bit period divider shared by every channel except the DMC
//! (which keeps its own rate-table-driven divider, see [`crate::dmc`]).

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// An 11-bit down-counter reloaded from `period` each time it reaches
/// zero. Channels clock their sequencer on each reload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Timer {
    period: u16,
    counter: u16,
}

impl Timer {
    /// Timer with the given reload period, already loaded.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current reload value.
    #[must_use]
    pub fn period(&self) -> u16 {
        self.period
    }

    /// Sets the low 8 bits of the period, leaving the high 3 untouched.
    pub fn write_lo(&mut self, value: u8) {
        self.period = (self.period & 0x0700) | u16::from(value);
    }

    /// Sets the high 3 bits of the period (the low 5 bits of `value`).
    pub fn write_hi(&mut self, value: u8) {
        self.period = (self.period & 0x00FF) | (u16::from(value & 0x07) << 8);
    }

    /// Replaces the whole 11-bit period directly.
    pub fn set_period(&mut self, period: u16) {
        self.period = period & 0x07FF;
    }

    /// Reloads the down-counter from `period` without touching it.
    pub fn reload(&mut self) {
        self.counter = self.period;
    }

    /// Clocks the divider once. Returns `true` on the cycle the counter
    /// underflows and reloads, the moment a channel's sequencer should
    /// advance by one step.
    #[must_use]
    pub fn clock(&mut self) -> bool {
        if self.counter == 0 {
            self.counter = self.period;
            true
        } else {
            self.counter -= 1;
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_lo_and_hi_compose_an_eleven_bit_period() {
        let mut timer = Timer::new();
        timer.write_lo(0xAB);
        timer.write_hi(0x07);
        assert_eq!(timer.period(), 0x07AB);
    }

    #[test]
    fn write_hi_masks_to_three_bits() {
        let mut timer = Timer::new();
        timer.write_hi(0xFF);
        assert_eq!(timer.period(), 0x0700);
    }

    #[test]
    fn clock_fires_on_underflow_and_reloads() {
        let mut timer = Timer::new();
        timer.set_period(2);
        timer.reload();
        assert!(!timer.clock());
        assert!(!timer.clock());
        assert!(timer.clock());
        assert!(!timer.clock());
    }

    #[test]
    fn zero_period_fires_every_clock() {
        let mut timer = Timer::new();
        timer.set_period(0);
        timer.reload();
        assert!(timer.clock());
        assert!(timer.clock());
    }
}
