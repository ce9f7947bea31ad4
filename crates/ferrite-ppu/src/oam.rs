//! Primary and secondary object attribute memory.

use bitflags::bitflags;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

bitflags! {
    /// Sprite attribute byte, the fourth byte of each 4-byte OAM entry.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
    pub struct SpriteAttributes: u8 {
        /// Palette select, low bit.
        const PALETTE_LO = 1 << 0;
        /// Palette select, high bit.
        const PALETTE_HI = 1 << 1;
        /// Drawn behind the background when set.
        const BEHIND_BACKGROUND = 1 << 5;
        /// Flip horizontally.
        const FLIP_X = 1 << 6;
        /// Flip vertically.
        const FLIP_Y = 1 << 7;
    }
}

impl SpriteAttributes {
    /// Palette index, 4-7 (sprite palettes follow the four background ones).
    #[must_use]
    pub const fn palette(self) -> u8 {
        4 + (self.bits() & 0x03)
    }
}

/// One decoded OAM entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Sprite {
    /// Y coordinate of the sprite's top edge, minus one (hardware quirk).
    pub y: u8,
    /// Tile index; for 8x16 sprites bit 0 selects the pattern table.
    pub tile: u8,
    /// Attribute byte.
    pub attributes: SpriteAttributes,
    /// X coordinate of the sprite's left edge.
    pub x: u8,
}

impl Sprite {
    fn from_bytes(bytes: [u8; 4]) -> Self {
        Self {
            y: bytes[0],
            tile: bytes[1],
            attributes: SpriteAttributes::from_bits_truncate(bytes[2]),
            x: bytes[3],
        }
    }
}

/// The 256-byte primary OAM table (64 sprites x 4 bytes).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Oam {
    bytes: [u8; 256],
    /// OAMADDR, auto-incremented by OAMDATA writes.
    pub address: u8,
}

impl Default for Oam {
    fn default() -> Self {
        Self { bytes: [0u8; 256], address: 0 }
    }
}

impl Oam {
    /// Reads a byte at the given index, wrapping at 256.
    #[must_use]
    pub fn read(&self, index: u8) -> u8 {
        self.bytes[usize::from(index)]
    }

    /// Writes a byte at the given index.
    pub fn write(&mut self, index: u8, value: u8) {
        self.bytes[usize::from(index)] = value;
    }

    /// Reads the byte at `address` without touching it.
    #[must_use]
    pub fn read_at_address(&self) -> u8 {
        self.read(self.address)
    }

    /// Writes through OAMDATA and advances `address`.
    pub fn write_through_oamdata(&mut self, value: u8) {
        self.write(self.address, value);
        self.address = self.address.wrapping_add(1);
    }

    /// Decodes sprite `n` (0-63) from the backing bytes.
    #[must_use]
    pub fn sprite(&self, n: u8) -> Sprite {
        let base = usize::from(n) * 4;
        Sprite::from_bytes([self.bytes[base], self.bytes[base + 1], self.bytes[base + 2], self.bytes[base + 3]])
    }

    /// Raw backing bytes, used by OAM DMA transfers.
    #[must_use]
    pub fn bytes(&self) -> &[u8; 256] {
        &self.bytes
    }

    /// Overwrites the raw backing bytes, used by OAM DMA transfers.
    pub fn set_bytes(&mut self, bytes: [u8; 256]) {
        self.bytes = bytes;
    }
}

/// The 32-byte secondary OAM, holding up to 8 sprites selected for the
/// next scanline, plus the indices they were evaluated from (needed to
/// tell whether slot 0 is sprite zero).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SecondaryOam {
    /// Up to 8 sprites in scanline order.
    pub sprites: alloc::vec::Vec<Sprite>,
    /// Original OAM index of each selected sprite.
    pub source_indices: alloc::vec::Vec<u8>,
    /// Set when evaluation found more than 8 sprites on the scanline.
    pub overflow: bool,
    /// Set when sprite 0 was among the sprites selected for this scanline.
    pub sprite_zero_present: bool,
}

impl SecondaryOam {
    /// Clears all sprites, ready for the next scanline's evaluation.
    pub fn clear(&mut self) {
        self.sprites.clear();
        self.source_indices.clear();
        self.overflow = false;
        self.sprite_zero_present = false;
    }
}
