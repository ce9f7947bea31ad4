//! Scanline/dot position tracking for one NTSC frame.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Pre-render scanline, represented in the same unsigned space as every
/// other scanline; converted to the conventional `-1` only where a
/// mapper's `step` hook is called.
pub const PRERENDER_SCANLINE: u16 = 261;
/// Last visible scanline.
pub const LAST_VISIBLE_SCANLINE: u16 = 239;
/// Scanline on which vblank begins.
pub const VBLANK_START_SCANLINE: u16 = 241;
/// Last dot of a scanline.
pub const LAST_DOT: u16 = 340;

/// Scanline/dot counters plus the odd-frame dot-skip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Timing {
    /// Current scanline, 0-261 (0-239 visible, 240 post-render, 241
    /// vblank start, 261 pre-render).
    pub scanline: u16,
    /// Current dot within the scanline, 0-340.
    pub dot: u16,
    /// Frame counter, incremented every time scanline wraps to 0.
    pub frame: u64,
    /// Parity of the current frame; odd frames skip dot 339 of the
    /// pre-render line when rendering is enabled.
    pub odd_frame: bool,
}

impl Timing {
    /// Advances by one PPU dot. `rendering_enabled` controls the
    /// odd-frame skipped dot on the pre-render scanline.
    pub fn tick(&mut self, rendering_enabled: bool) {
        self.dot += 1;
        if self.scanline == PRERENDER_SCANLINE
            && self.dot == LAST_DOT
            && self.odd_frame
            && rendering_enabled
        {
            self.dot += 1;
        }
        if self.dot > LAST_DOT {
            self.dot = 0;
            self.scanline += 1;
            if self.scanline > PRERENDER_SCANLINE {
                self.scanline = 0;
                self.frame += 1;
                self.odd_frame = !self.odd_frame;
            }
        }
    }

    /// Whether the current scanline renders visible pixels.
    #[must_use]
    pub const fn is_visible_scanline(self) -> bool {
        self.scanline <= LAST_VISIBLE_SCANLINE
    }

    /// Whether the current scanline is the pre-render line.
    #[must_use]
    pub const fn is_prerender_scanline(self) -> bool {
        self.scanline == PRERENDER_SCANLINE
    }

    /// Whether the current dot is one that fetches/shifts background or
    /// sprite data (dots 1-256 and 321-336 of a rendering scanline).
    #[must_use]
    pub const fn is_fetch_dot(self) -> bool {
        (self.is_visible_scanline() || self.is_prerender_scanline())
            && ((self.dot >= 1 && self.dot <= 256) || (self.dot >= 321 && self.dot <= 336))
    }

    /// Whether the current dot is within the visible 0-255 pixel column
    /// of a visible scanline.
    #[must_use]
    pub const fn is_visible_dot(self) -> bool {
        self.is_visible_scanline() && self.dot >= 1 && self.dot <= 256
    }

    /// The exact dot (1, vblank begins) that sets PPUSTATUS's vblank flag.
    #[must_use]
    pub const fn is_vblank_start(self) -> bool {
        self.scanline == VBLANK_START_SCANLINE && self.dot == 1
    }

    /// Whether vblank is currently active (scanlines 241-260 inclusive).
    #[must_use]
    pub const fn in_vblank(self) -> bool {
        self.scanline >= VBLANK_START_SCANLINE && self.scanline < PRERENDER_SCANLINE
    }

    /// The signed scanline convention used at the `Mapper::step` boundary,
    /// where the pre-render line is `-1` rather than `261`.
    #[must_use]
    pub fn mapper_scanline(self) -> i16 {
        if self.scanline == PRERENDER_SCANLINE { -1 } else { self.scanline as i16 }
    }
}
