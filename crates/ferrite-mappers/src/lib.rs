//! Cartridge loading and mapper implementations.
//!
//! A [`Rom`] is a parsed iNES/NES 2.0 image; [`create_mapper`] turns
//! one into the `Box<dyn Mapper>` the rest of the console drives.
//! Mappers own all cartridge-side address decoding: CPU-visible
//! PRG/SRAM, PPU-visible CHR, and (per [`Mapper::has_extended_nametable_mapping`])
//! PPU-visible nametables too.

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]

extern crate alloc;

mod mapper;
mod mirroring;
mod mmc2;
mod mmc5;
mod nrom;
mod rom;

pub use mapper::{Mapper, MapperSnapshot, StepResult};
pub use mmc2::{Mmc2, Mmc2State};
pub use mmc5::{Mmc5, Mmc5State};
pub use nrom::{Nrom, NromState};
pub use rom::{Mirroring, Rom, RomError, RomHeader};

use alloc::boxed::Box;

/// Builds the correct [`Mapper`] implementation for a loaded cartridge.
///
/// # Errors
///
/// Returns [`RomError::UnsupportedMapper`] when the cartridge's mapper
/// number has no implementation in this crate.
pub fn create_mapper(rom: &Rom) -> Result<Box<dyn Mapper>, RomError> {
    match rom.header.mapper_number {
        0 => Ok(Box::new(Nrom::new(rom))),
        9 => Ok(Box::new(Mmc2::new(rom))),
        5 => Ok(Box::new(Mmc5::new(rom))),
        other => Err(RomError::UnsupportedMapper(other)),
    }
}

/// The mapper numbers this crate can load, in ascending order.
#[must_use]
pub fn supported_mappers() -> &'static [u16] {
    &[0, 5, 9]
}

/// Whether `mapper_number` has an implementation in this crate.
#[must_use]
pub fn is_mapper_supported(mapper_number: u16) -> bool {
    supported_mappers().contains(&mapper_number)
}

/// Human-readable name for a supported mapper number, if known.
#[must_use]
pub fn mapper_name(mapper_number: u16) -> Option<&'static str> {
    match mapper_number {
        0 => Some("NROM"),
        5 => Some("MMC5"),
        9 => Some("MMC2"),
        _ => None,
    }
}
