//! A single NES controller port: an 8-bit button latch shifted out one
//! bit per `$4016`/`$4017` read, following the real hardware's 4021
//! parallel-in/serial-out shift register.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Standard NES controller buttons, in shift-register read order.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    /// A button, read first.
    A = 0x01,
    /// B button.
    B = 0x02,
    /// Select button.
    Select = 0x04,
    /// Start button.
    Start = 0x08,
    /// D-pad up.
    Up = 0x10,
    /// D-pad down.
    Down = 0x20,
    /// D-pad left.
    Left = 0x40,
    /// D-pad right, read last.
    Right = 0x80,
}

/// One controller port's strobe latch and shift register.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ControllerPort {
    buttons: u8,
    shift: u8,
    strobe: bool,
}

impl ControllerPort {
    /// Sets every button's held/released state at once.
    pub fn set_buttons(&mut self, buttons: u8) {
        self.buttons = buttons;
    }

    /// Sets or clears a single button.
    pub fn set_button(&mut self, button: Button, pressed: bool) {
        if pressed {
            self.buttons |= button as u8;
        } else {
            self.buttons &= !(button as u8);
        }
    }

    /// The currently held/released button bitmask.
    #[must_use]
    pub fn buttons(&self) -> u8 {
        self.buttons
    }

    /// `$4016` write (mirrored to both ports): on the falling edge
    /// (strobe 1 -> 0) the current button state latches into the shift
    /// register; while strobe stays high the register continuously
    /// reloads, so reads during that window always return button A.
    pub fn write_strobe(&mut self, value: u8) {
        let new_strobe = value & 0x01 != 0;
        if self.strobe && !new_strobe {
            self.shift = self.buttons;
        }
        self.strobe = new_strobe;
        if self.strobe {
            self.shift = self.buttons;
        }
    }

    /// `$4016`/`$4017` read: the next button bit in A, B, Select,
    /// Start, Up, Down, Left, Right order, then all 1s. Bits 1-4 of the
    /// expansion port are left at 0; the bus layers its own open-bus
    /// value over bits 5-7.
    pub fn read(&mut self) -> u8 {
        if self.strobe {
            return self.buttons & 0x01;
        }
        let bit = self.shift & 0x01;
        self.shift = (self.shift >> 1) | 0x80;
        bit
    }

    /// Clears button state, strobe, and the shift register.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
