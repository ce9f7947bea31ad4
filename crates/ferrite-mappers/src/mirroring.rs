//! Shared nametable-address math for mappers that use one of the four
//! "standard" mirroring layouts over a 2 KiB onboard VRAM array. MMC5
//! does not use this: its nametables are mode-selected per quadrant
//! and may resolve to ExRAM or fill-mode instead of VRAM.

use crate::rom::Mirroring;

/// Maps a PPU nametable address (`$2000-$2FFF`, already masked to
/// `$2000-$2FFF`) onto an offset within a 2 KiB onboard VRAM array.
#[must_use]
pub fn ciram_offset(addr: u16, mirroring: Mirroring) -> usize {
    let addr = addr & 0x0FFF;
    let table = addr / 0x0400;
    let offset_in_table = usize::from(addr % 0x0400);

    let physical_table = match mirroring {
        Mirroring::Horizontal => table / 2,
        Mirroring::Vertical => table % 2,
        Mirroring::SingleScreenLower => 0,
        Mirroring::SingleScreenUpper => 1,
        // Four-screen needs four independent pages; callers that
        // declare it must provide their own storage rather than using
        // this 2-page helper.
        Mirroring::FourScreen => table,
    };

    usize::from(physical_table) * 0x0400 + offset_in_table
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn horizontal_mirrors_top_and_bottom_pairs() {
        assert_eq!(ciram_offset(0x2000, Mirroring::Horizontal), ciram_offset(0x2400, Mirroring::Horizontal));
        assert_ne!(ciram_offset(0x2000, Mirroring::Horizontal), ciram_offset(0x2800, Mirroring::Horizontal));
    }

    #[test]
    fn vertical_mirrors_left_and_right_pairs() {
        assert_eq!(ciram_offset(0x2000, Mirroring::Vertical), ciram_offset(0x2800, Mirroring::Vertical));
        assert_ne!(ciram_offset(0x2000, Mirroring::Vertical), ciram_offset(0x2400, Mirroring::Vertical));
    }

    #[test]
    fn single_screen_collapses_to_one_page() {
        assert_eq!(ciram_offset(0x2000, Mirroring::SingleScreenLower), ciram_offset(0x2C00, Mirroring::SingleScreenLower));
    }
}
