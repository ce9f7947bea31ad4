//! Sprite evaluation and per-pixel sprite rendering.

use crate::oam::{Oam, SecondaryOam, Sprite};
use crate::registers::PpuCtrl;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Selects up to 8 sprites visible on `scanline` into `secondary`,
/// setting overflow and sprite-zero flags the way the real hardware's
/// two-phase evaluation does.
///
/// Real hardware walks OAM incrementally across dots 65-256, including
/// a well-known bug where overflow detection continues scanning with a
/// misaligned byte offset after 8 sprites are already found. Game
/// logic observes only the end result of a scanline's evaluation —
/// which 8 sprites (if any) ended up in secondary OAM, whether
/// overflow was flagged, and whether sprite 0 was among them — so this
/// performs the full scan as one bulk pass rather than modeling the
/// incremental state machine dot by dot.
pub fn evaluate_sprites(oam: &Oam, scanline: u16, sprite_height: u8, secondary: &mut SecondaryOam) {
    secondary.clear();

    for index in 0..64u8 {
        let sprite = oam.sprite(index);
        let top = u16::from(sprite.y);
        let in_range = scanline >= top && scanline < top + u16::from(sprite_height);
        if !in_range {
            continue;
        }

        if secondary.sprites.len() < 8 {
            if index == 0 {
                secondary.sprite_zero_present = true;
            }
            secondary.sprites.push(sprite);
            secondary.source_indices.push(index);
        } else {
            secondary.overflow = true;
            break;
        }
    }
}

/// A fully-decoded sprite ready for per-dot rendering on the next
/// scanline: pattern bits already fetched and flipped, x-position
/// counted down dot by dot like the hardware's sprite output units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ActiveSprite {
    /// Low pattern byte, already flipped and shifted to the current x.
    pub pattern_low: u8,
    /// High pattern byte, already flipped and shifted to the current x.
    pub pattern_high: u8,
    /// Attribute byte (palette, priority).
    pub attributes: u8,
    /// Dots remaining before this sprite's leftmost pixel is reached.
    pub x_counter: u8,
    /// Whether this is OAM sprite 0 (for sprite-zero-hit detection).
    pub is_sprite_zero: bool,
}

/// Output of the per-dot sprite renderer for a single pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SpritePixel {
    /// 2-bit pattern index (0 is transparent).
    pub pattern_index: u8,
    /// Palette select, 4-7.
    pub palette: u8,
    /// Whether this sprite is drawn behind the background.
    pub behind_background: bool,
    /// Whether this pixel came from OAM sprite 0.
    pub is_sprite_zero: bool,
}

/// Holds the 8 sprites selected for the current scanline and produces
/// one composited pixel per dot.
#[derive(Debug, Clone, Default)]
pub struct SpriteRenderer {
    active: alloc::vec::Vec<ActiveSprite>,
}

impl SpriteRenderer {
    /// Loads pattern data for every sprite secondary OAM selected for
    /// this scanline, fetching bytes via `pattern_fetch`.
    pub fn load_scanline(
        &mut self,
        secondary: &SecondaryOam,
        scanline: u16,
        ctrl: PpuCtrl,
        mut pattern_fetch: impl FnMut(u16) -> u8,
    ) {
        self.active.clear();
        for (sprite, &source_index) in secondary.sprites.iter().zip(secondary.source_indices.iter()) {
            let height = ctrl.sprite_height();
            let mut row = (scanline - u16::from(sprite.y)) as u8;
            if sprite.attributes.contains(crate::oam::SpriteAttributes::FLIP_Y) {
                row = height - 1 - row;
            }

            let pattern_addr = if ctrl.tall_sprites() {
                let table = u16::from(sprite.tile & 0x01) * 0x1000;
                let tile = u16::from(sprite.tile & 0xFE);
                let (tile, row) = if row >= 8 { (tile + 1, row - 8) } else { (tile, row) };
                table + tile * 16 + u16::from(row)
            } else {
                ctrl.sprite_pattern_addr() + u16::from(sprite.tile) * 16 + u16::from(row)
            };

            let mut low = pattern_fetch(pattern_addr);
            let mut high = pattern_fetch(pattern_addr + 8);
            if sprite.attributes.contains(crate::oam::SpriteAttributes::FLIP_X) {
                low = low.reverse_bits();
                high = high.reverse_bits();
            }

            self.active.push(ActiveSprite {
                pattern_low: low,
                pattern_high: high,
                attributes: sprite.attributes.bits(),
                x_counter: sprite.x,
                is_sprite_zero: source_index == 0,
            });
        }
    }

    /// Produces the highest-priority opaque sprite pixel at `dot`
    /// (0-255), or `None` if no active sprite covers this dot.
    #[must_use]
    pub fn pixel_at(&self, dot: u8) -> Option<SpritePixel> {
        self.active.iter().find_map(|sprite| {
            let offset = dot.wrapping_sub(sprite.x_counter);
            if offset >= 8 {
                return None;
            }
            let bit = 7 - offset;
            let lo = (sprite.pattern_low >> bit) & 0x01;
            let hi = (sprite.pattern_high >> bit) & 0x01;
            let pattern_index = lo | (hi << 1);
            if pattern_index == 0 {
                return None;
            }
            let attrs = crate::oam::SpriteAttributes::from_bits_truncate(sprite.attributes);
            Some(SpritePixel {
                pattern_index,
                palette: attrs.palette(),
                behind_background: attrs.contains(crate::oam::SpriteAttributes::BEHIND_BACKGROUND),
                is_sprite_zero: sprite.is_sprite_zero,
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oam::SpriteAttributes;

    fn sprite_at(oam: &mut Oam, index: u8, y: u8, tile: u8, attrs: SpriteAttributes, x: u8) {
        let base = u8::from(index) * 4;
        oam.write(base, y);
        oam.write(base + 1, tile);
        oam.write(base + 2, attrs.bits());
        oam.write(base + 3, x);
    }

    #[test]
    fn evaluation_selects_sprites_in_range_for_scanline() {
        let mut oam = Oam::default();
        sprite_at(&mut oam, 0, 10, 0x01, SpriteAttributes::empty(), 20);
        sprite_at(&mut oam, 1, 100, 0x02, SpriteAttributes::empty(), 50);
        let mut secondary = SecondaryOam::default();
        evaluate_sprites(&oam, 12, 8, &mut secondary);
        assert_eq!(secondary.sprites.len(), 1);
        assert_eq!(secondary.sprites[0].tile, 0x01);
        assert!(secondary.sprite_zero_present);
    }

    #[test]
    fn evaluation_flags_overflow_past_eight_sprites() {
        let mut oam = Oam::default();
        for i in 0..9u8 {
            sprite_at(&mut oam, i, 5, i, SpriteAttributes::empty(), i * 8);
        }
        let mut secondary = SecondaryOam::default();
        evaluate_sprites(&oam, 5, 8, &mut secondary);
        assert_eq!(secondary.sprites.len(), 8);
        assert!(secondary.overflow);
    }

    #[test]
    fn pixel_at_is_none_outside_sprite_width() {
        let renderer = SpriteRenderer {
            active: alloc::vec![ActiveSprite { pattern_low: 0xFF, pattern_high: 0, x_counter: 10, ..Default::default() }],
        };
        assert!(renderer.pixel_at(5).is_none());
        assert!(renderer.pixel_at(10).is_some());
        assert!(renderer.pixel_at(17).is_some());
        assert!(renderer.pixel_at(18).is_none());
    }

    #[test]
    fn earlier_active_sprite_wins_priority() {
        let renderer = SpriteRenderer {
            active: alloc::vec![
                ActiveSprite { pattern_low: 0xFF, pattern_high: 0, x_counter: 0, attributes: 0, ..Default::default() },
                ActiveSprite { pattern_low: 0xFF, pattern_high: 0xFF, x_counter: 0, attributes: 0, ..Default::default() },
            ],
        };
        let pixel = renderer.pixel_at(0).unwrap();
        assert_eq!(pixel.pattern_index, 0b01);
    }
}
