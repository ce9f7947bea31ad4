//! iNES / NES 2.0 header parsing and cartridge loading.

use md5::{Digest, Md5};

/// Errors that can occur while parsing or loading a ROM image.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum RomError {
    /// The file is shorter than the 16-byte header.
    #[error("file too small to contain an iNES header: {0} bytes")]
    FileTooSmall(usize),
    /// The first four bytes are not `"NES\x1A"`.
    #[error("invalid magic bytes: {0:02X?}")]
    InvalidMagic([u8; 4]),
    /// PRG data is shorter than the header declares.
    #[error("invalid PRG size: {0}")]
    InvalidPrgSize(String),
    /// CHR data is shorter than the header declares.
    #[error("invalid CHR size: {0}")]
    InvalidChrSize(String),
    /// Declared and actual data lengths disagree.
    #[error("size mismatch: expected {expected} bytes, found {actual}")]
    SizeMismatch {
        /// Bytes the header promised.
        expected: usize,
        /// Bytes actually present.
        actual: usize,
    },
    /// A header field encodes a format this parser does not recognize.
    #[error("unsupported ROM format: {0}")]
    UnsupportedFormat(String),
    /// The header names a mapper this build has no implementation for.
    #[error("unsupported mapper: {0}")]
    UnsupportedMapper(u16),
}

/// Parsed iNES/NES 2.0 header fields.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RomHeader {
    /// PRG ROM size in bytes.
    pub prg_rom_size: usize,
    /// CHR ROM size in bytes (0 means CHR-RAM).
    pub chr_rom_size: usize,
    /// Mapper number, 0-4095 under NES 2.0, 0-255 under iNES 1.0.
    pub mapper_number: u16,
    /// NES 2.0 submapper, 0 if not applicable.
    pub submapper: u8,
    /// Nametable mirroring declared by the header (mappers with
    /// `has_extended_nametable_mapping() == true` may override this).
    pub mirroring: Mirroring,
    /// Whether the cartridge has battery-backed PRG-RAM.
    pub has_battery: bool,
    /// Whether a 512-byte trainer precedes the PRG data.
    pub has_trainer: bool,
    /// Whether this header uses the NES 2.0 extensions.
    pub nes2_format: bool,
    /// PRG-RAM (volatile) size in bytes.
    pub prg_ram_size: usize,
    /// PRG-NVRAM (battery-backed) size in bytes.
    pub prg_nvram_size: usize,
    /// CHR-RAM (volatile) size in bytes.
    pub chr_ram_size: usize,
    /// CHR-NVRAM (battery-backed) size in bytes.
    pub chr_nvram_size: usize,
}

impl RomHeader {
    /// The four magic bytes every valid iNES file begins with.
    pub const MAGIC: [u8; 4] = [0x4E, 0x45, 0x53, 0x1A];
    const HEADER_LEN: usize = 16;

    /// Parses a 16-byte iNES/NES 2.0 header from the start of `data`.
    pub fn parse(data: &[u8]) -> Result<Self, RomError> {
        if data.len() < Self::HEADER_LEN {
            return Err(RomError::FileTooSmall(data.len()));
        }
        let magic = [data[0], data[1], data[2], data[3]];
        if magic != Self::MAGIC {
            return Err(RomError::InvalidMagic(magic));
        }

        let nes2_format = (data[7] & 0x0C) == 0x08;
        let mirroring = parse_mirroring(data[6]);
        let has_battery = data[6] & 0x02 != 0;
        let has_trainer = data[6] & 0x04 != 0;

        let (mapper_number, submapper) = if nes2_format {
            parse_nes2_mapper(data)
        } else {
            (parse_ines_mapper(data), 0)
        };

        let (prg_rom_size, chr_rom_size) = if nes2_format {
            parse_nes2_sizes(data)
        } else {
            parse_ines_sizes(data)
        };

        let (prg_ram_size, prg_nvram_size, chr_ram_size, chr_nvram_size) = if nes2_format {
            parse_nes2_ram_sizes(data)
        } else {
            let default_prg_ram = if has_battery { 8192 } else { 0 };
            (default_prg_ram, 0, 0, 0)
        };

        Ok(Self {
            prg_rom_size,
            chr_rom_size,
            mapper_number,
            submapper,
            mirroring,
            has_battery,
            has_trainer,
            nes2_format,
            prg_ram_size,
            prg_nvram_size,
            chr_ram_size,
            chr_nvram_size,
        })
    }
}

fn parse_mirroring(flags6: u8) -> Mirroring {
    if flags6 & 0x08 != 0 {
        Mirroring::FourScreen
    } else if flags6 & 0x01 != 0 {
        Mirroring::Vertical
    } else {
        Mirroring::Horizontal
    }
}

fn parse_ines_mapper(data: &[u8]) -> u16 {
    u16::from((data[6] & 0xF0) >> 4 | (data[7] & 0xF0))
}

fn parse_nes2_mapper(data: &[u8]) -> (u16, u8) {
    let low = (data[6] & 0xF0) >> 4 | (data[7] & 0xF0);
    let hi_nibble = data[8] & 0x0F;
    let mapper = u16::from(low) | (u16::from(hi_nibble) << 8);
    let submapper = (data[8] & 0xF0) >> 4;
    (mapper, submapper)
}

fn parse_ines_sizes(data: &[u8]) -> (usize, usize) {
    (usize::from(data[4]) * 16_384, usize::from(data[5]) * 8_192)
}

fn parse_nes2_sizes(data: &[u8]) -> (usize, usize) {
    let prg_lsb = data[4];
    let chr_lsb = data[5];
    let msb = data[9];
    let prg_msb = msb & 0x0F;
    let chr_msb = (msb & 0xF0) >> 4;

    let prg_size = if prg_msb == 0x0F {
        exponent_multiplier_size(prg_lsb)
    } else {
        (usize::from(prg_msb) << 8 | usize::from(prg_lsb)) * 16_384
    };
    let chr_size = if chr_msb == 0x0F {
        exponent_multiplier_size(chr_lsb)
    } else {
        (usize::from(chr_msb) << 8 | usize::from(chr_lsb)) * 8_192
    };
    (prg_size, chr_size)
}

fn exponent_multiplier_size(byte: u8) -> usize {
    let multiplier = usize::from(byte & 0x03) * 2 + 1;
    let exponent = (byte & 0xFC) >> 2;
    multiplier * (1usize << exponent)
}

fn parse_nes2_ram_sizes(data: &[u8]) -> (usize, usize, usize, usize) {
    let prg_ram = parse_ram_size(data[10] & 0x0F);
    let prg_nvram = parse_ram_size((data[10] & 0xF0) >> 4);
    let chr_ram = parse_ram_size(data[11] & 0x0F);
    let chr_nvram = parse_ram_size((data[11] & 0xF0) >> 4);
    (prg_ram, prg_nvram, chr_ram, chr_nvram)
}

fn parse_ram_size(field: u8) -> usize {
    if field == 0 {
        0
    } else {
        64usize << field
    }
}

/// How the four logical nametables map onto physical storage. Mappers
/// that declare `has_extended_nametable_mapping()` own this decision
/// themselves and may ignore the cartridge header's declared value
/// (MMC5 in particular maps each nametable independently).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Mirroring {
    /// Top-bottom mirroring (vertical scrolling games).
    #[default]
    Horizontal,
    /// Left-right mirroring (horizontal scrolling games).
    Vertical,
    /// Both logical nametables map to physical page 0.
    SingleScreenLower,
    /// Both logical nametables map to physical page 1.
    SingleScreenUpper,
    /// Four independent physical pages (requires extra cartridge RAM).
    FourScreen,
}

/// A loaded, immutable cartridge image: header plus PRG/CHR bytes and
/// the identity digest used to key save states.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rom {
    /// Parsed header fields.
    pub header: RomHeader,
    /// The 512-byte trainer, if the header declared one.
    pub trainer: Option<Vec<u8>>,
    /// Raw PRG ROM bytes, `header.prg_rom_size` long.
    pub prg_rom: Vec<u8>,
    /// Raw CHR ROM bytes, `header.chr_rom_size` long (empty when the
    /// cartridge uses CHR-RAM instead).
    pub chr_rom: Vec<u8>,
    /// MD5 digest of the entire raw ROM image (including header),
    /// used as the save-state identity key.
    pub md5: [u8; 16],
}

impl Rom {
    /// Parses a header and slices out trainer/PRG/CHR data from a raw
    /// ROM image.
    pub fn load(data: &[u8]) -> Result<Self, RomError> {
        let header = RomHeader::parse(data)?;

        let mut offset = RomHeader::HEADER_LEN;
        let trainer = if header.has_trainer {
            if data.len() < offset + 512 {
                return Err(RomError::InvalidPrgSize(
                    "truncated trainer".to_string(),
                ));
            }
            let t = data[offset..offset + 512].to_vec();
            offset += 512;
            Some(t)
        } else {
            None
        };

        let prg_end = offset + header.prg_rom_size;
        if data.len() < prg_end {
            return Err(RomError::SizeMismatch {
                expected: header.prg_rom_size,
                actual: data.len().saturating_sub(offset),
            });
        }
        let prg_rom = data[offset..prg_end].to_vec();
        offset = prg_end;

        let chr_end = offset + header.chr_rom_size;
        if data.len() < chr_end {
            return Err(RomError::SizeMismatch {
                expected: header.chr_rom_size,
                actual: data.len().saturating_sub(offset),
            });
        }
        let chr_rom = data[offset..chr_end].to_vec();

        let mut hasher = Md5::new();
        hasher.update(data);
        let digest = hasher.finalize();
        let mut md5 = [0u8; 16];
        md5.copy_from_slice(&digest);

        Ok(Self { header, trainer, prg_rom, chr_rom, md5 })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_ines(prg_banks: u8, chr_banks: u8, flags6: u8, flags7: u8) -> Vec<u8> {
        let mut data = vec![0u8; 16];
        data[0..4].copy_from_slice(&RomHeader::MAGIC);
        data[4] = prg_banks;
        data[5] = chr_banks;
        data[6] = flags6;
        data[7] = flags7;
        data.extend(vec![0xAAu8; usize::from(prg_banks) * 16_384]);
        data.extend(vec![0xBBu8; usize::from(chr_banks) * 8_192]);
        data
    }

    #[test]
    fn rejects_short_files() {
        assert_eq!(RomHeader::parse(&[0u8; 10]), Err(RomError::FileTooSmall(10)));
    }

    #[test]
    fn rejects_bad_magic() {
        let data = vec![0u8; 16];
        assert!(matches!(RomHeader::parse(&data), Err(RomError::InvalidMagic(_))));
    }

    #[test]
    fn parses_basic_ines_header() {
        let data = build_ines(2, 1, 0x01, 0x00);
        let header = RomHeader::parse(&data).unwrap();
        assert_eq!(header.prg_rom_size, 32_768);
        assert_eq!(header.chr_rom_size, 8_192);
        assert_eq!(header.mirroring, Mirroring::Vertical);
        assert!(!header.nes2_format);
    }

    #[test]
    fn four_screen_overrides_mirroring_bit() {
        let data = build_ines(1, 1, 0x09, 0x00);
        let header = RomHeader::parse(&data).unwrap();
        assert_eq!(header.mirroring, Mirroring::FourScreen);
    }

    #[test]
    fn mapper_number_spans_both_flag_bytes() {
        // Mapper 4 (MMC3): low nibble of flags6 = 0x40, flags7 low nibble bits = 0x00
        let data = build_ines(1, 1, 0x40, 0x00);
        let header = RomHeader::parse(&data).unwrap();
        assert_eq!(header.mapper_number, 4);
    }

    #[test]
    fn load_slices_prg_and_chr_and_computes_md5() {
        let data = build_ines(1, 1, 0x00, 0x00);
        let rom = Rom::load(&data).unwrap();
        assert_eq!(rom.prg_rom.len(), 16_384);
        assert_eq!(rom.chr_rom.len(), 8_192);
        assert_eq!(rom.prg_rom[0], 0xAA);
        assert_eq!(rom.chr_rom[0], 0xBB);
        assert_ne!(rom.md5, [0u8; 16]);
    }

    #[test]
    fn load_rejects_truncated_prg() {
        let mut data = build_ines(2, 0, 0x00, 0x00);
        data.truncate(16 + 100);
        assert!(matches!(Rom::load(&data), Err(RomError::SizeMismatch { .. })));
    }

    #[test]
    fn nes2_exponent_multiplier_size() {
        // byte 0xFC: msb nibble 0xF marks exponent form; lsb bits 00 -> multiplier 1, exponent (0xFC&0xFC)>>2 = 0x3F -> huge;
        // use a small, well-defined case instead: multiplier=3 (bits=01), exponent=0 -> size=3.
        assert_eq!(exponent_multiplier_size(0b0000_0101), 3);
    }

    #[test]
    fn battery_without_nes2_defaults_to_8k_prg_ram() {
        let data = build_ines(1, 1, 0x02, 0x00);
        let header = RomHeader::parse(&data).unwrap();
        assert!(header.has_battery);
        assert_eq!(header.prg_ram_size, 8192);
    }
}
