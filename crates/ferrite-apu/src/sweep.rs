//! The pulse channels' sweep unit: a pitch bend driven by the target
//! period formula, with one's- or two's-complement negation depending
//! on which of the two pulse channels it belongs to.

use crate::timer::Timer;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Which pulse channel a sweep unit belongs to. Pulse 1 negates with
/// one's complement (`-c - 1`); pulse 2 with two's complement (`-c`),
/// a quirk of the original hardware's shared subtractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SweepChannel {
    /// Pulse 1: one's-complement negate.
    One,
    /// Pulse 2: two's-complement negate.
    Two,
}

/// Register layout (`$4001`/`$4005`, bits `EPPP NSSS`):
/// - `E`: enabled
/// - `P`: divider period
/// - `N`: negate
/// - `S`: shift count
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Sweep {
    channel: SweepChannel,
    enabled: bool,
    period: u8,
    negate: bool,
    shift: u8,
    divider: u8,
    reload: bool,
}

impl Sweep {
    /// A disabled sweep unit for the given pulse channel.
    #[must_use]
    pub fn new(channel: SweepChannel) -> Self {
        Self {
            channel,
            enabled: false,
            period: 0,
            negate: false,
            shift: 0,
            divider: 0,
            reload: false,
        }
    }

    /// Decodes `EPPP NSSS` and arms the divider reload.
    pub fn write(&mut self, value: u8) {
        self.enabled = value & 0x80 != 0;
        self.period = (value >> 4) & 0x07;
        self.negate = value & 0x08 != 0;
        self.shift = value & 0x07;
        self.reload = true;
    }

    fn target_period(&self, current_period: u16) -> u16 {
        let change = current_period >> self.shift;
        if self.negate {
            match self.channel {
                SweepChannel::One => current_period.wrapping_sub(change).wrapping_sub(1),
                SweepChannel::Two => current_period.wrapping_sub(change),
            }
        } else {
            current_period.wrapping_add(change)
        }
    }

    /// Whether the target period would silence the channel: either it
    /// overflows `$7FF`, or the period is too small to sweep at all.
    #[must_use]
    pub fn mutes(&self, current_period: u16) -> bool {
        current_period < 8 || self.target_period(current_period) > 0x07FF
    }

    /// Clocks the sweep unit once per half frame, writing a new period
    /// into `timer` when the divider fires, sweeping is enabled, the
    /// shift count is nonzero, and the result would not mute.
    pub fn clock(&mut self, timer: &mut Timer) {
        let current_period = timer.period();

        if self.divider == 0 && self.enabled && self.shift > 0 && !self.mutes(current_period) {
            timer.set_period(self.target_period(current_period));
        }

        if self.divider == 0 || self.reload {
            self.divider = self.period;
            self.reload = false;
        } else {
            self.divider -= 1;
        }
    }
}
