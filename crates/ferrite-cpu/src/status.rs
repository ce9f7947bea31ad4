//! Processor status flags (the `P` register).

use bitflags::bitflags;

bitflags! {
    /// The 6502 status register: N V - B D I Z C.
    ///
    /// Bit 5 (`U`, unused) always reads back as 1; bit 4 (`B`, break) only
    /// exists on the value pushed to the stack, never inside the live
    /// register — see [`Status::to_stack_byte`] and [`Status::from_stack_byte`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct Status: u8 {
        /// Carry.
        const C = 1 << 0;
        /// Zero.
        const Z = 1 << 1;
        /// Interrupt disable.
        const I = 1 << 2;
        /// Decimal mode (present in the flag byte but never alters ALU
        /// behavior on the NES's 6502 variant).
        const D = 1 << 3;
        /// Break (stack image only).
        const B = 1 << 4;
        /// Unused, always 1 when observed.
        const U = 1 << 5;
        /// Overflow.
        const V = 1 << 6;
        /// Negative.
        const N = 1 << 7;
    }
}

impl Status {
    /// Flags present immediately after RESET.
    pub const POWER_ON: Self = Self::I.union(Self::U);

    /// Flags PLP/RTI actually restore; `B` and `U` are never taken from
    /// the stack byte.
    pub const PLP_MASK: Self = Self::C
        .union(Self::Z)
        .union(Self::I)
        .union(Self::D)
        .union(Self::V)
        .union(Self::N);

    /// Power-on status value.
    #[must_use]
    pub fn new() -> Self {
        Self::POWER_ON
    }

    /// Sets `Z` and `N` from a freshly computed result byte.
    pub fn set_zn(&mut self, value: u8) {
        self.set(Self::Z, value == 0);
        self.set(Self::N, value & 0x80 != 0);
    }

    /// Sets or clears a single flag.
    pub fn set_flag(&mut self, flag: Self, value: bool) {
        self.set(flag, value);
    }

    /// Builds the byte pushed to the stack by `PHP`/`BRK`/a hardware
    /// interrupt. `U` is always set; `B` is set only for `PHP`/`BRK`
    /// (software-initiated pushes), never for NMI/IRQ.
    #[must_use]
    pub fn to_stack_byte(self, brk: bool) -> u8 {
        let mut bits = self.bits() | Self::U.bits();
        if brk {
            bits |= Self::B.bits();
        } else {
            bits &= !Self::B.bits();
        }
        bits
    }

    /// Reconstructs a register value from a byte popped by `PLP`/`RTI`.
    /// `B` is discarded and `U` is forced set, matching real hardware.
    #[must_use]
    pub fn from_stack_byte(value: u8) -> Self {
        Self::from_bits_truncate((value & !Self::B.bits()) | Self::U.bits())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn power_on_flags() {
        let s = Status::new();
        assert!(s.contains(Status::I));
        assert!(s.contains(Status::U));
        assert!(!s.contains(Status::C));
    }

    #[test]
    fn set_zn_zero() {
        let mut s = Status::empty();
        s.set_zn(0);
        assert!(s.contains(Status::Z));
        assert!(!s.contains(Status::N));
    }

    #[test]
    fn set_zn_negative() {
        let mut s = Status::empty();
        s.set_zn(0x80);
        assert!(!s.contains(Status::Z));
        assert!(s.contains(Status::N));
    }

    #[test]
    fn set_zn_positive() {
        let mut s = Status::empty();
        s.set_zn(0x10);
        assert!(!s.contains(Status::Z));
        assert!(!s.contains(Status::N));
    }

    #[test]
    fn stack_byte_with_brk() {
        let s = Status::from_bits_truncate(0x00);
        let byte = s.to_stack_byte(true);
        assert_eq!(byte & Status::B.bits(), Status::B.bits());
        assert_eq!(byte & Status::U.bits(), Status::U.bits());
    }

    #[test]
    fn stack_byte_without_brk() {
        let s = Status::from_bits_truncate(0x00);
        let byte = s.to_stack_byte(false);
        assert_eq!(byte & Status::B.bits(), 0);
        assert_eq!(byte & Status::U.bits(), Status::U.bits());
    }

    #[test]
    fn from_stack_byte_strips_b_forces_u() {
        let s = Status::from_stack_byte(0xFF);
        assert!(!s.contains(Status::B));
        assert!(s.contains(Status::U));
    }

    #[test]
    fn plp_mask_excludes_b_and_u() {
        assert!(!Status::PLP_MASK.contains(Status::B));
        assert!(!Status::PLP_MASK.contains(Status::U));
    }
}
