//! NROM (mapper 0): no banking at all. Serves as the simplest possible
//! mapper and the baseline for CPU/PPU integration tests that don't
//! need bank-switching to get in the way.

use crate::mapper::{Mapper, MapperSnapshot, StepResult};
use crate::mirroring;
use crate::rom::{Mirroring, Rom};
use alloc::vec::Vec;

/// Save-state payload for [`Nrom`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NromState {
    prg_ram: Vec<u8>,
    chr_ram: Vec<u8>,
    ciram: Vec<u8>,
}

/// NROM mapper instance.
pub struct Nrom {
    prg_rom: Vec<u8>,
    prg_ram: Vec<u8>,
    chr_rom: Vec<u8>,
    chr_ram: Vec<u8>,
    chr_is_ram: bool,
    ciram: Vec<u8>,
    mirroring: Mirroring,
    prg_16k: bool,
    warned_unmapped: bool,
}

impl Nrom {
    /// Builds an NROM instance from a loaded cartridge image.
    #[must_use]
    pub fn new(rom: &Rom) -> Self {
        let chr_is_ram = rom.chr_rom.is_empty();
        Self {
            prg_16k: rom.prg_rom.len() <= 16_384,
            prg_rom: rom.prg_rom.clone(),
            prg_ram: vec![0u8; rom.header.prg_ram_size.max(8192)],
            chr_rom: rom.chr_rom.clone(),
            chr_ram: if chr_is_ram { vec![0u8; 8192] } else { Vec::new() },
            chr_is_ram,
            ciram: vec![0u8; 2048],
            mirroring: rom.header.mirroring,
            warned_unmapped: false,
        }
    }
}

impl Mapper for Nrom {
    fn cpu_read(&mut self, addr: u16) -> u8 {
        match addr {
            0x6000..=0x7FFF => {
                let idx = usize::from(addr - 0x6000) % self.prg_ram.len().max(1);
                self.prg_ram.get(idx).copied().unwrap_or(0)
            }
            0x8000..=0xFFFF => {
                let idx = if self.prg_16k {
                    usize::from(addr - 0x8000) % self.prg_rom.len()
                } else {
                    usize::from(addr - 0x8000)
                };
                self.prg_rom.get(idx).copied().unwrap_or(0)
            }
            _ => {
                if !self.warned_unmapped {
                    log::warn!("nrom: unmapped cpu read at {addr:#06X}");
                    self.warned_unmapped = true;
                }
                0
            }
        }
    }

    fn cpu_write(&mut self, addr: u16, value: u8) {
        if let 0x6000..=0x7FFF = addr {
            let len = self.prg_ram.len().max(1);
            let idx = usize::from(addr - 0x6000) % len;
            if let Some(slot) = self.prg_ram.get_mut(idx) {
                *slot = value;
            }
        }
        // Writes to $8000-$FFFF are no-ops: NROM has no registers.
    }

    fn ppu_read(&mut self, addr: u16) -> u8 {
        match addr {
            0x0000..=0x1FFF => {
                if self.chr_is_ram {
                    self.chr_ram[usize::from(addr)]
                } else {
                    self.chr_rom.get(usize::from(addr)).copied().unwrap_or(0)
                }
            }
            0x2000..=0x2FFF => self.ciram[mirroring::ciram_offset(addr, self.mirroring)],
            _ => 0,
        }
    }

    fn ppu_write(&mut self, addr: u16, value: u8) {
        match addr {
            0x0000..=0x1FFF if self.chr_is_ram => self.chr_ram[usize::from(addr)] = value,
            0x2000..=0x2FFF => {
                let offset = mirroring::ciram_offset(addr, self.mirroring);
                self.ciram[offset] = value;
            }
            _ => {}
        }
    }

    fn step(&mut self, _scanline: i16, _dot: u16, _rendering_enabled: bool) -> StepResult {
        StepResult::default()
    }

    fn mirroring(&self) -> Mirroring {
        self.mirroring
    }

    fn mapper_number(&self) -> u16 {
        0
    }

    fn mapper_name(&self) -> &'static str {
        "NROM"
    }

    fn snapshot(&self) -> MapperSnapshot {
        MapperSnapshot::Nrom(NromState {
            prg_ram: self.prg_ram.clone(),
            chr_ram: self.chr_ram.clone(),
            ciram: self.ciram.clone(),
        })
    }

    fn restore(&mut self, snapshot: &MapperSnapshot) {
        if let MapperSnapshot::Nrom(state) = snapshot {
            self.prg_ram = state.prg_ram.clone();
            self.chr_ram = state.chr_ram.clone();
            self.ciram = state.ciram.clone();
        }
    }
}
