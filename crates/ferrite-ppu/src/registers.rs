//! PPUCTRL ($2000), PPUMASK ($2001), and PPUSTATUS ($2002).

use bitflags::bitflags;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

bitflags! {
    /// PPUCTRL, write-only.
    ///
    /// ```text
    /// 7  bit  0
    /// VPHB SINN
    /// |||| ||++- base nametable select (2000/2400/2800/2C00)
    /// |||| |+--- VRAM address increment (0: +1, 1: +32)
    /// |||| +---- 8x8 sprite pattern table select
    /// |||+------ background pattern table select
    /// ||+------- sprite size (0: 8x8, 1: 8x16)
    /// |+-------- PPU master/slave select (unused on NES)
    /// +--------- NMI enable at vblank
    /// ```
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
    pub struct PpuCtrl: u8 {
        /// Base nametable select, low bit.
        const NAMETABLE_LO = 1 << 0;
        /// Base nametable select, high bit.
        const NAMETABLE_HI = 1 << 1;
        /// VRAM address increment mode.
        const VRAM_INCREMENT = 1 << 2;
        /// 8x8 sprite pattern table.
        const SPRITE_TABLE = 1 << 3;
        /// Background pattern table.
        const BG_TABLE = 1 << 4;
        /// Sprite size.
        const SPRITE_SIZE = 1 << 5;
        /// Master/slave select, unused on the NES.
        const MASTER_SLAVE = 1 << 6;
        /// NMI at vblank.
        const NMI_ENABLE = 1 << 7;
    }
}

impl PpuCtrl {
    /// Base nametable address selected by bits 0-1.
    #[must_use]
    pub const fn base_nametable_addr(self) -> u16 {
        0x2000 + (self.bits() as u16 & 0x03) * 0x0400
    }

    /// VRAM address step applied on every PPUDATA access.
    #[must_use]
    pub const fn vram_increment(self) -> u16 {
        if self.contains(Self::VRAM_INCREMENT) { 32 } else { 1 }
    }

    /// Pattern table base used for 8x8 sprites (ignored in 8x16 mode).
    #[must_use]
    pub const fn sprite_pattern_addr(self) -> u16 {
        if self.contains(Self::SPRITE_TABLE) { 0x1000 } else { 0x0000 }
    }

    /// Pattern table base used for background tiles.
    #[must_use]
    pub const fn bg_pattern_addr(self) -> u16 {
        if self.contains(Self::BG_TABLE) { 0x1000 } else { 0x0000 }
    }

    /// Whether sprites are 8x16 pixels tall.
    #[must_use]
    pub const fn tall_sprites(self) -> bool {
        self.contains(Self::SPRITE_SIZE)
    }

    /// Sprite height in pixels: 8 or 16.
    #[must_use]
    pub const fn sprite_height(self) -> u8 {
        if self.tall_sprites() { 16 } else { 8 }
    }

    /// Whether an NMI should fire at the start of vblank.
    #[must_use]
    pub const fn nmi_enabled(self) -> bool {
        self.contains(Self::NMI_ENABLE)
    }
}

bitflags! {
    /// PPUMASK, write-only.
    ///
    /// ```text
    /// 7  bit  0
    /// BGRs bMmG
    /// |||| ||||
    /// |||| |||+- greyscale
    /// |||| ||+-- show background in leftmost 8 pixels
    /// |||| |+--- show sprites in leftmost 8 pixels
    /// |||| +---- show background
    /// |||+------ show sprites
    /// ||+------- emphasize red
    /// |+-------- emphasize green
    /// +--------- emphasize blue
    /// ```
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
    pub struct PpuMask: u8 {
        /// Greyscale display mode.
        const GREYSCALE = 1 << 0;
        /// Show background in the leftmost 8 pixel column.
        const BG_LEFT = 1 << 1;
        /// Show sprites in the leftmost 8 pixel column.
        const SPRITES_LEFT = 1 << 2;
        /// Background rendering enable.
        const BG_ENABLE = 1 << 3;
        /// Sprite rendering enable.
        const SPRITES_ENABLE = 1 << 4;
        /// Emphasize red (green on PAL, unused here).
        const EMPHASIZE_RED = 1 << 5;
        /// Emphasize green (red on PAL, unused here).
        const EMPHASIZE_GREEN = 1 << 6;
        /// Emphasize blue.
        const EMPHASIZE_BLUE = 1 << 7;
    }
}

impl PpuMask {
    /// Whether background or sprite rendering is active at all.
    #[must_use]
    pub const fn rendering_enabled(self) -> bool {
        self.intersects(Self::BG_ENABLE.union(Self::SPRITES_ENABLE))
    }

    /// Whether background rendering is active.
    #[must_use]
    pub const fn bg_enabled(self) -> bool {
        self.contains(Self::BG_ENABLE)
    }

    /// Whether sprite rendering is active.
    #[must_use]
    pub const fn sprites_enabled(self) -> bool {
        self.contains(Self::SPRITES_ENABLE)
    }
}

bitflags! {
    /// PPUSTATUS, read-only. Bits 0-4 are open bus.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
    pub struct PpuStatus: u8 {
        /// Sprite overflow (more than 8 sprites on a scanline; hardware-buggy).
        const SPRITE_OVERFLOW = 1 << 5;
        /// Sprite 0 hit.
        const SPRITE_ZERO_HIT = 1 << 6;
        /// Vblank flag.
        const VBLANK = 1 << 7;
    }
}

impl PpuStatus {
    /// Reads the register, filling the undriven low bits from open bus.
    #[must_use]
    pub const fn with_open_bus(self, open_bus: u8) -> u8 {
        (self.bits() & 0xE0) | (open_bus & 0x1F)
    }
}
