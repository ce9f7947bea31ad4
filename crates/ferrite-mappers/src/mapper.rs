//! The cartridge-side contract every mapper implements.

use crate::rom::Mirroring;
use alloc::boxed::Box;

/// What a mapper's per-dot `step` hook reports back to the console.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepResult {
    /// Whether the mapper wants its IRQ line asserted.
    pub irq: bool,
}

/// Address-space translation and bank-switching logic for one
/// cartridge. A mapper owns CPU-side PRG/SRAM decoding (`$4020` and
/// up), PPU-side CHR decoding, and PPU-side nametable storage — the
/// PPU itself keeps no local VRAM array and forwards every
/// `$0000-$2FFF` access here.
pub trait Mapper: Send + Sync {
    /// Reads a CPU-visible byte, `addr >= $4020` (commonly
    /// `$6000-$FFFF`, though MMC5 also answers `$5000-$5FFF`).
    fn cpu_read(&mut self, addr: u16) -> u8;
    /// Writes a CPU-visible byte in the same range. Writes in
    /// `$8000-$FFFF` typically reconfigure banking rather than
    /// mutating ROM.
    fn cpu_write(&mut self, addr: u16, value: u8);

    /// Reads a PPU-visible byte, `$0000-$2FFF` (pattern tables plus
    /// nametables).
    fn ppu_read(&mut self, addr: u16) -> u8;
    /// Writes a PPU-visible byte in the same range.
    fn ppu_write(&mut self, addr: u16, value: u8);

    /// Invoked once per PPU dot with the PPU's current position, so
    /// mappers that drive a scanline IRQ (MMC5) can track frame phase.
    /// Mappers with no such hardware leave this at its default no-op.
    fn step(&mut self, _scanline: i16, _dot: u16, _rendering_enabled: bool) -> StepResult {
        StepResult::default()
    }

    /// Whether this mapper maps nametables beyond the four standard
    /// mirroring layouts (MMC5's per-quadrant ExRAM/fill modes).
    fn has_extended_nametable_mapping(&self) -> bool {
        false
    }

    /// The mirroring layout for mappers that use one of the four
    /// standard layouts. Meaningless (and unused) once
    /// `has_extended_nametable_mapping` is true.
    fn mirroring(&self) -> Mirroring {
        Mirroring::Horizontal
    }

    /// Notified on every CPU write to `$2000` (PPUCTRL); MMC5 uses bit
    /// 5 (8x16 sprites) to pick its CHR bank set.
    fn notify_ppuctrl(&mut self, _value: u8) {}
    /// Notified on every CPU write to `$2001` (PPUMASK); MMC5 uses
    /// bits 3/4 (background/sprite rendering enable).
    fn notify_ppumask(&mut self, _value: u8) {}

    /// iNES/NES 2.0 mapper number.
    fn mapper_number(&self) -> u16;
    /// Human-readable mapper name for diagnostics.
    fn mapper_name(&self) -> &'static str;

    /// Whether this cartridge has battery-backed PRG-RAM.
    fn has_battery(&self) -> bool {
        false
    }
    /// Current contents of battery-backed RAM, if any.
    fn battery_ram(&self) -> Option<&[u8]> {
        None
    }
    /// Loads previously saved battery RAM contents.
    fn set_battery_ram(&mut self, _data: &[u8]) {}

    /// Captures a complete, mapper-specific snapshot for save states.
    fn snapshot(&self) -> MapperSnapshot;
    /// Restores a previously captured snapshot. Callers must ensure
    /// the snapshot variant matches this mapper's concrete type.
    fn restore(&mut self, snapshot: &MapperSnapshot);

    /// Resets banking registers and latches to their power-on values
    /// without reloading ROM data.
    fn reset(&mut self) {}
}

/// A mapper-specific save-state payload. One variant per implemented
/// mapper; `Console::restore` matches the variant against the loaded
/// cartridge's mapper number before calling [`Mapper::restore`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MapperSnapshot {
    /// NROM (mapper 0) snapshot.
    Nrom(crate::nrom::NromState),
    /// MMC2/PxROM (mapper 9) snapshot.
    Mmc2(crate::mmc2::Mmc2State),
    /// MMC5/ExROM (mapper 5) snapshot, boxed since it carries the
    /// 128 KiB SRAM array.
    Mmc5(Box<crate::mmc5::Mmc5State>),
}
