//! Dot-accurate Ricoh 2C02 PPU emulation.
//!
//! The PPU keeps no nametable storage of its own: every `$0000-$2FFF`
//! access is forwarded through [`PpuBus`] to whatever owns CHR and
//! nametable memory (ordinarily the cartridge mapper). Only the
//! 32-byte palette RAM, which has no bank-switching surface on any
//! known board, stays PPU-local.
#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]

extern crate alloc;

mod background;
mod oam;
mod palette;
mod registers;
mod scroll;
mod sprites;
mod timing;

mod ppu;

pub use background::{Background, BackgroundPixel};
pub use oam::{Oam, SecondaryOam, Sprite, SpriteAttributes};
pub use palette::{PaletteRam, Rgb, NES_PALETTE};
pub use ppu::{Ppu, PpuBus, PpuStepResult, HEIGHT, WIDTH};
pub use registers::{PpuCtrl, PpuMask, PpuStatus};
pub use scroll::ScrollState;
pub use sprites::{evaluate_sprites, ActiveSprite, SpritePixel, SpriteRenderer};
pub use timing::Timing;
