//! MMC2 / PxROM (mapper 9): latch-driven CHR selection used by
//! *Punch-Out!!*. Two independent CHR windows each choose between two
//! candidate banks based on a one-bit latch that flips as a side
//! effect of the PPU fetching specific tile addresses — the defining
//! behavior this mapper exists to exercise.

use crate::mapper::{Mapper, MapperSnapshot, StepResult};
use crate::mirroring;
use crate::rom::{Mirroring, Rom};
use alloc::vec::Vec;

/// Save-state payload for [`Mmc2`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Mmc2State {
    prg_bank: u8,
    chr_bank1_0: u8,
    chr_bank1_1: u8,
    chr_bank2_0: u8,
    chr_bank2_1: u8,
    latch1: u8,
    latch2: u8,
    mirroring: Mirroring,
    prg_ram: Vec<u8>,
    chr_ram: Vec<u8>,
    ciram: Vec<u8>,
}

/// MMC2 mapper instance.
pub struct Mmc2 {
    prg_rom: Vec<u8>,
    prg_ram: Vec<u8>,
    chr_rom: Vec<u8>,
    chr_ram: Vec<u8>,
    chr_is_ram: bool,
    ciram: Vec<u8>,

    prg_bank: u8,
    chr_bank1_0: u8,
    chr_bank1_1: u8,
    chr_bank2_0: u8,
    chr_bank2_1: u8,
    /// Selects between `chr_bank1_0`/`chr_bank1_1` for the
    /// `$0000-$0FFF` window.
    latch1: u8,
    /// Selects between `chr_bank2_0`/`chr_bank2_1` for the
    /// `$1000-$1FFF` window.
    latch2: u8,
    mirroring: Mirroring,
}

impl Mmc2 {
    /// Builds an MMC2 instance from a loaded cartridge image.
    #[must_use]
    pub fn new(rom: &Rom) -> Self {
        let chr_is_ram = rom.chr_rom.is_empty();
        Self {
            prg_rom: rom.prg_rom.clone(),
            prg_ram: vec![0u8; rom.header.prg_ram_size.max(8192)],
            chr_rom: rom.chr_rom.clone(),
            chr_ram: if chr_is_ram { vec![0u8; 0x2000 * 32] } else { Vec::new() },
            chr_is_ram,
            ciram: vec![0u8; 2048],
            prg_bank: 0,
            chr_bank1_0: 0,
            chr_bank1_1: 0,
            chr_bank2_0: 0,
            chr_bank2_1: 0,
            latch1: 1,
            latch2: 1,
            mirroring: rom.header.mirroring,
        }
    }

    fn prg_bank_count(&self) -> usize {
        (self.prg_rom.len() / 0x2000).max(1)
    }

    fn chr_byte(&self, bank: u8, addr_in_window: u16) -> u8 {
        let bank_count = (self.chr_rom.len().max(self.chr_ram.len()) / 0x1000).max(1);
        let bank = usize::from(bank) % bank_count;
        let offset = bank * 0x1000 + usize::from(addr_in_window);
        if self.chr_is_ram {
            self.chr_ram.get(offset).copied().unwrap_or(0)
        } else {
            self.chr_rom.get(offset).copied().unwrap_or(0)
        }
    }
}

impl Mapper for Mmc2 {
    fn cpu_read(&mut self, addr: u16) -> u8 {
        match addr {
            0x6000..=0x7FFF => {
                let len = self.prg_ram.len().max(1);
                self.prg_ram[usize::from(addr - 0x6000) % len]
            }
            0x8000..=0x9FFF => {
                let bank = usize::from(self.prg_bank) % self.prg_bank_count();
                let offset = bank * 0x2000 + usize::from(addr - 0x8000);
                self.prg_rom.get(offset).copied().unwrap_or(0)
            }
            0xA000..=0xFFFF => {
                // Fixed to the last three 8 KiB banks regardless of
                // `prg_bank`.
                let total_banks = self.prg_bank_count();
                let fixed_start_bank = total_banks.saturating_sub(3);
                let bank_within_fixed = usize::from(addr - 0xA000) / 0x2000;
                let bank = fixed_start_bank + bank_within_fixed;
                let offset = bank * 0x2000 + usize::from((addr - 0xA000) % 0x2000);
                self.prg_rom.get(offset).copied().unwrap_or(0)
            }
            _ => {
                log::warn!("mmc2: unmapped cpu read at {addr:#06X}");
                0
            }
        }
    }

    fn cpu_write(&mut self, addr: u16, value: u8) {
        match addr {
            0x6000..=0x7FFF => {
                let len = self.prg_ram.len().max(1);
                let idx = usize::from(addr - 0x6000) % len;
                self.prg_ram[idx] = value;
            }
            0xA000..=0xAFFF => self.prg_bank = value & 0x0F,
            0xB000..=0xBFFF => self.chr_bank1_0 = value & 0x1F,
            0xC000..=0xCFFF => self.chr_bank1_1 = value & 0x1F,
            0xD000..=0xDFFF => self.chr_bank2_0 = value & 0x1F,
            0xE000..=0xEFFF => self.chr_bank2_1 = value & 0x1F,
            0xF000..=0xFFFF => {
                self.mirroring =
                    if value & 0x01 != 0 { Mirroring::Horizontal } else { Mirroring::Vertical };
            }
            _ => {}
        }
    }

    fn ppu_read(&mut self, addr: u16) -> u8 {
        match addr {
            0x0000..=0x0FFF => {
                let bank = if self.latch1 == 0 { self.chr_bank1_0 } else { self.chr_bank1_1 };
                let value = self.chr_byte(bank, addr & 0x0FFF);
                if addr == 0x0FD8 {
                    self.latch1 = 0;
                } else if addr == 0x0FE8 {
                    self.latch1 = 1;
                }
                value
            }
            0x1000..=0x1FFF => {
                let bank = if self.latch2 == 0 { self.chr_bank2_0 } else { self.chr_bank2_1 };
                let value = self.chr_byte(bank, addr & 0x0FFF);
                if (0x1FD8..=0x1FDF).contains(&addr) {
                    self.latch2 = 0;
                } else if (0x1FE8..=0x1FEF).contains(&addr) {
                    self.latch2 = 1;
                }
                value
            }
            0x2000..=0x2FFF => self.ciram[mirroring::ciram_offset(addr, self.mirroring)],
            _ => 0,
        }
    }

    fn ppu_write(&mut self, addr: u16, value: u8) {
        match addr {
            0x0000..=0x1FFF if self.chr_is_ram => {
                let bank_count = (self.chr_ram.len() / 0x1000).max(1);
                let bank = if addr < 0x1000 {
                    if self.latch1 == 0 { self.chr_bank1_0 } else { self.chr_bank1_1 }
                } else if self.latch2 == 0 {
                    self.chr_bank2_0
                } else {
                    self.chr_bank2_1
                };
                let bank = usize::from(bank) % bank_count;
                let offset = bank * 0x1000 + usize::from(addr & 0x0FFF);
                if let Some(slot) = self.chr_ram.get_mut(offset) {
                    *slot = value;
                }
            }
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
        9
    }

    fn mapper_name(&self) -> &'static str {
        "MMC2"
    }

    fn snapshot(&self) -> MapperSnapshot {
        MapperSnapshot::Mmc2(Mmc2State {
            prg_bank: self.prg_bank,
            chr_bank1_0: self.chr_bank1_0,
            chr_bank1_1: self.chr_bank1_1,
            chr_bank2_0: self.chr_bank2_0,
            chr_bank2_1: self.chr_bank2_1,
            latch1: self.latch1,
            latch2: self.latch2,
            mirroring: self.mirroring,
            prg_ram: self.prg_ram.clone(),
            chr_ram: self.chr_ram.clone(),
            ciram: self.ciram.clone(),
        })
    }

    fn restore(&mut self, snapshot: &MapperSnapshot) {
        if let MapperSnapshot::Mmc2(state) = snapshot {
            self.prg_bank = state.prg_bank;
            self.chr_bank1_0 = state.chr_bank1_0;
            self.chr_bank1_1 = state.chr_bank1_1;
            self.chr_bank2_0 = state.chr_bank2_0;
            self.chr_bank2_1 = state.chr_bank2_1;
            self.latch1 = state.latch1;
            self.latch2 = state.latch2;
            self.mirroring = state.mirroring;
            self.prg_ram = state.prg_ram.clone();
            self.chr_ram = state.chr_ram.clone();
            self.ciram = state.ciram.clone();
        }
    }

    fn reset(&mut self) {
        self.latch1 = 1;
        self.latch2 = 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rom::RomHeader;

    fn test_rom(prg_8k_banks: usize, chr_4k_banks: usize) -> Rom {
        let mut chr_rom = vec![0u8; chr_4k_banks * 0x1000];
        for (bank, chunk) in chr_rom.chunks_mut(0x1000).enumerate() {
            chunk.fill(bank as u8);
        }
        Rom {
            header: RomHeader {
                prg_rom_size: prg_8k_banks * 0x2000,
                chr_rom_size: chr_rom.len(),
                mapper_number: 9,
                submapper: 0,
                mirroring: Mirroring::Vertical,
                has_battery: false,
                has_trainer: false,
                nes2_format: false,
                prg_ram_size: 8192,
                prg_nvram_size: 0,
                chr_ram_size: 0,
                chr_nvram_size: 0,
            },
            trainer: None,
            prg_rom: vec![0u8; prg_8k_banks * 0x2000],
            chr_rom,
            md5: [0u8; 16],
        }
    }

    #[test]
    fn fd8_selects_latch1_candidate_zero() {
        let rom = test_rom(8, 4);
        let mut mapper = Mmc2::new(&rom);
        mapper.cpu_write(0xB000, 0x00); // candidate 0 -> bank 0
        mapper.cpu_write(0xC000, 0x01); // candidate 1 -> bank 1
        mapper.latch1 = 1;

        let _ = mapper.ppu_read(0x0FD8); // triggers latch1 <- 0 after this read
        assert_eq!(mapper.latch1, 0);
        assert_eq!(mapper.ppu_read(0x0800), 0); // bank 0 filled with 0x00
    }

    #[test]
    fn fe8_selects_latch1_candidate_one() {
        let rom = test_rom(8, 4);
        let mut mapper = Mmc2::new(&rom);
        mapper.cpu_write(0xB000, 0x00);
        mapper.cpu_write(0xC000, 0x01);
        mapper.latch1 = 0;

        let _ = mapper.ppu_read(0x0FE8);
        assert_eq!(mapper.latch1, 1);
        assert_eq!(mapper.ppu_read(0x0800), 1);
    }

    #[test]
    fn latch_updates_after_the_triggering_read_returns() {
        let rom = test_rom(8, 4);
        let mut mapper = Mmc2::new(&rom);
        mapper.cpu_write(0xB000, 0x02);
        mapper.latch1 = 1; // candidate1 (unset, bank 0) currently selected
        let value = mapper.ppu_read(0x0FD8);
        // The byte returned for the $0FD8 fetch itself uses the
        // *pre*-update latch (candidate1, bank 0), not the new one.
        assert_eq!(value, 0);
        assert_eq!(mapper.latch1, 0);
    }

    #[test]
    fn f000_write_sets_mirroring() {
        let rom = test_rom(8, 4);
        let mut mapper = Mmc2::new(&rom);
        mapper.cpu_write(0xF000, 0x01);
        assert_eq!(mapper.mirroring(), Mirroring::Horizontal);
        mapper.cpu_write(0xF000, 0x00);
        assert_eq!(mapper.mirroring(), Mirroring::Vertical);
    }

    #[test]
    fn prg_a000_is_fixed_to_last_three_banks() {
        let rom = test_rom(8, 4);
        let mut mapper = Mmc2::new(&rom);
        // Changing prg_bank must not affect $A000-$FFFF.
        let before = mapper.cpu_read(0xA000);
        mapper.cpu_write(0xA000, 0x05);
        let after = mapper.cpu_read(0xA000);
        assert_eq!(before, after);
    }
}
