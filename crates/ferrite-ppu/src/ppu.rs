//! The Ricoh 2C02 itself: register file, rendering pipeline, and the
//! per-dot state machine that ties them together.

use alloc::vec;
use alloc::vec::Vec;

use crate::background::Background;
use crate::oam::{Oam, SecondaryOam};
use crate::palette::PaletteRam;
use crate::registers::{PpuCtrl, PpuMask, PpuStatus};
use crate::scroll::ScrollState;
use crate::sprites::{self, SpriteRenderer};
use crate::timing::Timing;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Visible framebuffer width in pixels.
pub const WIDTH: usize = 256;
/// Visible framebuffer height in pixels.
pub const HEIGHT: usize = 240;

/// Everything PPU-side rendering needs from the cartridge: pattern
/// table and nametable bytes, and the per-dot hook mappers with a
/// scanline IRQ (MMC5) depend on. The PPU keeps no nametable storage
/// of its own; every `$0000-$2FFF` access is forwarded here.
pub trait PpuBus {
    /// Reads a byte in `$0000-$2FFF`.
    fn ppu_read(&mut self, addr: u16) -> u8;
    /// Writes a byte in `$0000-$2FFF`.
    fn ppu_write(&mut self, addr: u16, value: u8);
    /// Invoked once per dot so mappers with a scanline IRQ can track
    /// frame phase; returns whether the mapper's IRQ line is asserted.
    fn step(&mut self, scanline: i16, dot: u16, rendering_enabled: bool) -> bool;
    /// Mirrors a CPU write to PPUCTRL, for mappers that key banking off it.
    fn notify_ppuctrl(&mut self, value: u8);
    /// Mirrors a CPU write to PPUMASK, for mappers that key banking off it.
    fn notify_ppumask(&mut self, value: u8);
}

/// Result of advancing the PPU by one dot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PpuStepResult {
    /// Whether an NMI should be raised to the CPU this dot.
    pub nmi: bool,
    /// Whether the mapper's IRQ line is asserted this dot.
    pub mapper_irq: bool,
    /// Set on the dot that completes the visible framebuffer.
    pub frame_complete: bool,
}

/// The full PPU state: registers, rendering pipeline, and framebuffer.
#[derive(Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Ppu {
    ctrl: PpuCtrl,
    mask: PpuMask,
    status: PpuStatus,
    open_bus: u8,

    oam: Oam,
    secondary_oam: SecondaryOam,
    sprite_renderer: SpriteRenderer,
    sprite_zero_hit_this_scanline: bool,

    scroll: ScrollState,
    timing: Timing,
    background: Background,
    palette: PaletteRam,

    ppudata_read_buffer: u8,
    suppress_nmi_this_frame: bool,
    nmi_line: bool,

    #[cfg_attr(feature = "serde", serde(skip, default = "default_framebuffer"))]
    framebuffer: Vec<(u8, u8, u8)>,
}

fn default_framebuffer() -> Vec<(u8, u8, u8)> {
    vec![(0, 0, 0); WIDTH * HEIGHT]
}

impl Default for Ppu {
    fn default() -> Self {
        Self {
            ctrl: PpuCtrl::empty(),
            mask: PpuMask::empty(),
            status: PpuStatus::empty(),
            open_bus: 0,
            oam: Oam::default(),
            secondary_oam: SecondaryOam::default(),
            sprite_renderer: SpriteRenderer::default(),
            sprite_zero_hit_this_scanline: false,
            scroll: ScrollState::default(),
            timing: Timing::default(),
            background: Background::default(),
            palette: PaletteRam::default(),
            ppudata_read_buffer: 0,
            suppress_nmi_this_frame: false,
            nmi_line: false,
            framebuffer: default_framebuffer(),
        }
    }
}

impl Ppu {
    /// Builds a freshly power-on PPU.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resets registers to their power-on values without touching
    /// palette RAM or OAM, matching real NES reset behavior.
    pub fn reset(&mut self) {
        self.ctrl = PpuCtrl::empty();
        self.mask = PpuMask::empty();
        self.scroll = ScrollState::default();
        self.timing = Timing::default();
        self.ppudata_read_buffer = 0;
        self.nmi_line = false;
    }

    /// The current RGBA framebuffer, row-major, top-left origin.
    #[must_use]
    pub fn framebuffer_rgba(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(WIDTH * HEIGHT * 4);
        for &(r, g, b) in &self.framebuffer {
            out.extend_from_slice(&[r, g, b, 0xFF]);
        }
        out
    }

    /// Current scanline, 0-261 (261 is pre-render).
    #[must_use]
    pub const fn scanline(&self) -> u16 {
        self.timing.scanline
    }

    /// Current dot within the scanline, 0-340.
    #[must_use]
    pub const fn dot(&self) -> u16 {
        self.timing.dot
    }

    /// Completed-frame counter.
    #[must_use]
    pub const fn frame(&self) -> u64 {
        self.timing.frame
    }

    /// CPU-side register read at `$2000-$2007` (mirrored through `$3FFF`).
    pub fn read_register(&mut self, addr: u16, bus: &mut dyn PpuBus) -> u8 {
        match addr & 0x0007 {
            2 => {
                let value = self.status.with_open_bus(self.open_bus);
                self.status.remove(PpuStatus::VBLANK);
                self.scroll.reset_latch();
                self.open_bus = value;
                value
            }
            4 => {
                let value = self.oam.read_at_address();
                self.open_bus = value;
                value
            }
            7 => {
                let addr = self.scroll.v & 0x3FFF;
                let value = if addr >= 0x3F00 {
                    let palette_byte = self.palette.read(addr);
                    self.ppudata_read_buffer = bus.ppu_read(addr & 0x2FFF);
                    palette_byte
                } else {
                    let buffered = self.ppudata_read_buffer;
                    self.ppudata_read_buffer = bus.ppu_read(addr);
                    buffered
                };
                self.scroll.increment_vram(self.ctrl.vram_increment());
                self.open_bus = value;
                value
            }
            _ => self.open_bus,
        }
    }

    /// CPU-side register write at `$2000-$2007` (mirrored through `$3FFF`).
    pub fn write_register(&mut self, addr: u16, value: u8, bus: &mut dyn PpuBus) {
        self.open_bus = value;
        match addr & 0x0007 {
            0 => {
                let nmi_was_disabled = !self.ctrl.nmi_enabled();
                self.ctrl = PpuCtrl::from_bits_truncate(value);
                self.scroll.write_ctrl(value);
                bus.notify_ppuctrl(value);
                if nmi_was_disabled && self.ctrl.nmi_enabled() && self.status.contains(PpuStatus::VBLANK) {
                    self.nmi_line = true;
                }
            }
            1 => {
                self.mask = PpuMask::from_bits_truncate(value);
                bus.notify_ppumask(value);
            }
            3 => self.oam.address = value,
            4 => self.oam.write_through_oamdata(value),
            5 => self.scroll.write_scroll(value),
            6 => self.scroll.write_addr(value),
            7 => {
                let addr = self.scroll.v & 0x3FFF;
                if addr >= 0x3F00 {
                    self.palette.write(addr, value);
                } else {
                    bus.ppu_write(addr, value);
                }
                self.scroll.increment_vram(self.ctrl.vram_increment());
            }
            _ => {}
        }
    }

    /// Direct OAM access for `$4014` OAM DMA; the 513/514-cycle CPU
    /// stall this implies is the bus's responsibility, not the PPU's.
    pub fn write_oam_dma_byte(&mut self, value: u8) {
        self.oam.write_through_oamdata(value);
    }

    /// Raw OAM bytes, for save states and debugging.
    #[must_use]
    pub fn oam_bytes(&self) -> &[u8; 256] {
        self.oam.bytes()
    }

    fn rendering_enabled(&self) -> bool {
        self.mask.rendering_enabled()
    }

    /// Advances the PPU by one dot, delegating pattern/nametable
    /// accesses and the mapper's scanline-IRQ hook to `bus`.
    pub fn step(&mut self, bus: &mut dyn PpuBus) -> PpuStepResult {
        let rendering = self.rendering_enabled();
        let mut result = PpuStepResult::default();

        let mapper_irq = bus.step(self.timing.mapper_scanline(), self.timing.dot, rendering);
        result.mapper_irq = mapper_irq;

        if self.timing.is_visible_scanline() || self.timing.is_prerender_scanline() {
            self.run_rendering_dot(bus, rendering);
        }

        if self.timing.is_vblank_start() {
            self.status.insert(PpuStatus::VBLANK);
            if self.ctrl.nmi_enabled() && !self.suppress_nmi_this_frame {
                self.nmi_line = true;
            }
            result.frame_complete = true;
        }

        if self.timing.scanline == crate::timing::PRERENDER_SCANLINE && self.timing.dot == 1 {
            self.status.remove(PpuStatus::VBLANK | PpuStatus::SPRITE_ZERO_HIT | PpuStatus::SPRITE_OVERFLOW);
            self.suppress_nmi_this_frame = false;
            self.sprite_zero_hit_this_scanline = false;
        }

        if self.nmi_line {
            result.nmi = true;
            self.nmi_line = false;
        }

        self.timing.tick(rendering);
        result
    }

    fn run_rendering_dot(&mut self, bus: &mut dyn PpuBus, rendering: bool) {
        let dot = self.timing.dot;

        if self.timing.is_fetch_dot() {
            self.fetch_cycle(bus, dot);
        }

        if rendering {
            if dot == 256 {
                self.scroll.increment_y();
            }
            if dot == 257 {
                self.scroll.copy_horizontal();
                if self.timing.is_prerender_scanline() {
                    self.secondary_oam.clear();
                } else {
                    let height = self.ctrl.sprite_height();
                    sprites::evaluate_sprites(&self.oam, self.timing.scanline, height, &mut self.secondary_oam);
                }
            }
            if self.timing.is_prerender_scanline() && (280..=304).contains(&dot) {
                self.scroll.copy_vertical();
            }
            if dot == 320 {
                let ctrl = self.ctrl;
                let next_scanline = self.timing.scanline.wrapping_add(1);
                let secondary = self.secondary_oam.clone();
                self.sprite_renderer.load_scanline(&secondary, next_scanline, ctrl, |addr| bus.ppu_read(addr));
            }
        }

        if self.timing.is_visible_dot() {
            self.render_pixel(bus);
        }
    }

    fn fetch_cycle(&mut self, bus: &mut dyn PpuBus, dot: u16) {
        if !self.rendering_enabled() {
            return;
        }
        let phase = (dot - 1) % 8;
        match phase {
            1 => {
                let addr = self.scroll.nametable_addr();
                let value = bus.ppu_read(addr);
                self.background.set_nametable_byte(value);
            }
            3 => {
                let addr = self.scroll.attribute_addr();
                let raw = bus.ppu_read(addr);
                let shift = ((self.scroll.v >> 4) & 0x04) | (self.scroll.v & 0x02);
                self.background.set_attribute_byte((raw >> shift) & 0x03);
            }
            5 => {
                let table = self.ctrl.bg_pattern_addr();
                let tile = u16::from(self.background.nametable_byte());
                let addr = table + tile * 16 + self.scroll.fine_y();
                let value = bus.ppu_read(addr);
                self.background.set_pattern_low_byte(value);
            }
            7 => {
                let table = self.ctrl.bg_pattern_addr();
                let tile = u16::from(self.background.nametable_byte());
                let addr = table + tile * 16 + self.scroll.fine_y() + 8;
                let value = bus.ppu_read(addr);
                self.background.set_pattern_high_byte(value);
                self.background.reload_shift_registers();
                self.scroll.increment_coarse_x();
            }
            _ => {}
        }
        self.background.shift();
    }

    fn render_pixel(&mut self, _bus: &mut dyn PpuBus) {
        let x = usize::from(self.timing.dot - 1);
        let y = usize::from(self.timing.scanline);
        if x >= WIDTH || y >= HEIGHT {
            return;
        }

        let show_bg = self.mask.bg_enabled() && (x >= 8 || self.mask.contains(PpuMask::BG_LEFT));
        let show_sprites = self.mask.sprites_enabled() && (x >= 8 || self.mask.contains(PpuMask::SPRITES_LEFT));

        let bg_pixel = if show_bg { self.background.pixel(self.scroll.fine_x) } else { crate::background::BackgroundPixel::default() };
        let sprite_pixel = if show_sprites { self.sprite_renderer.pixel_at(x as u8) } else { None };

        if let Some(sprite) = sprite_pixel {
            if sprite.is_sprite_zero && !bg_pixel.is_transparent() && !self.sprite_zero_hit_this_scanline && x != 255 {
                self.status.insert(PpuStatus::SPRITE_ZERO_HIT);
                self.sprite_zero_hit_this_scanline = true;
            }
        }

        let color = match (bg_pixel.is_transparent(), sprite_pixel) {
            (true, None) => self.palette.backdrop(),
            (true, Some(sprite)) => self.palette.color(sprite.palette, sprite.pattern_index),
            (false, None) => self.palette.color(bg_pixel.palette, bg_pixel.pattern_index),
            (false, Some(sprite)) if sprite.behind_background => self.palette.color(bg_pixel.palette, bg_pixel.pattern_index),
            (false, Some(sprite)) => self.palette.color(sprite.palette, sprite.pattern_index),
        };

        self.framebuffer[y * WIDTH + x] = color;
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    struct NullBus;
    impl PpuBus for NullBus {
        fn ppu_read(&mut self, _addr: u16) -> u8 {
            0
        }
        fn ppu_write(&mut self, _addr: u16, _value: u8) {}
        fn step(&mut self, _scanline: i16, _dot: u16, _rendering_enabled: bool) -> bool {
            false
        }
        fn notify_ppuctrl(&mut self, _value: u8) {}
        fn notify_ppumask(&mut self, _value: u8) {}
    }

    #[test]
    fn status_read_clears_vblank_and_write_latch() {
        let mut ppu = Ppu::new();
        let mut bus = NullBus;
        ppu.status.insert(PpuStatus::VBLANK);
        ppu.scroll.write_latch = true;
        let value = ppu.read_register(2, &mut bus);
        assert_eq!(value & 0x80, 0x80);
        assert!(!ppu.status.contains(PpuStatus::VBLANK));
        assert!(!ppu.scroll.write_latch);
    }

    #[test]
    fn vblank_flag_sets_at_scanline_241_dot_1_and_fires_nmi_when_enabled() {
        let mut ppu = Ppu::new();
        let mut bus = NullBus;
        ppu.ctrl.insert(PpuCtrl::NMI_ENABLE);
        ppu.timing.scanline = 241;
        ppu.timing.dot = 0;
        let result = ppu.step(&mut bus);
        assert!(ppu.status.contains(PpuStatus::VBLANK));
        assert!(result.nmi);
    }

    #[test]
    fn prerender_dot_1_clears_status_flags() {
        let mut ppu = Ppu::new();
        let mut bus = NullBus;
        ppu.status.insert(PpuStatus::VBLANK | PpuStatus::SPRITE_ZERO_HIT | PpuStatus::SPRITE_OVERFLOW);
        ppu.timing.scanline = 261;
        ppu.timing.dot = 0;
        ppu.step(&mut bus);
        assert!(ppu.status.is_empty());
    }

    #[test]
    fn ppudata_read_from_palette_is_unbuffered() {
        let mut ppu = Ppu::new();
        let mut bus = NullBus;
        ppu.palette.write(0x00, 0x16);
        ppu.scroll.v = 0x3F00;
        let value = ppu.read_register(7, &mut bus);
        assert_eq!(value, 0x16);
    }

    #[test]
    fn ppudata_read_from_vram_is_buffered_by_one_access() {
        struct FixedBus;
        impl PpuBus for FixedBus {
            fn ppu_read(&mut self, _addr: u16) -> u8 {
                0x42
            }
            fn ppu_write(&mut self, _addr: u16, _value: u8) {}
            fn step(&mut self, _scanline: i16, _dot: u16, _rendering_enabled: bool) -> bool {
                false
            }
            fn notify_ppuctrl(&mut self, _value: u8) {}
            fn notify_ppumask(&mut self, _value: u8) {}
        }
        let mut ppu = Ppu::new();
        let mut bus = FixedBus;
        ppu.scroll.v = 0x2000;
        let first = ppu.read_register(7, &mut bus);
        assert_eq!(first, 0);
        let second = ppu.read_register(7, &mut bus);
        assert_eq!(second, 0x42);
    }
}
