//! Save states: a point-in-time snapshot of every emulated component,
//! keyed to the ROM it was taken against so a state can never be
//! restored onto the wrong cartridge.

mod error;

pub use error::{SaveStateError, SAVE_STATE_VERSION};

#[cfg(not(feature = "std"))]
use alloc::{string::ToString, vec::Vec};

use ferrite_apu::Apu;
use ferrite_cpu::CpuState;
use ferrite_mappers::MapperSnapshot;
use ferrite_ppu::Ppu;

/// A complete, versioned snapshot of a [`crate::Console`].
///
/// Restoring a state checks both [`SAVE_STATE_VERSION`] and the
/// recorded ROM identity hash before touching any component, so a
/// failed restore never leaves the console partially overwritten.
#[derive(Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SaveState {
    version: u32,
    rom_md5: [u8; 16],
    cpu: CpuState,
    ppu: Ppu,
    apu: Apu,
    mapper: MapperSnapshot,
    total_cycles: u64,
    frame_count: u64,
}

impl SaveState {
    /// Bundles component snapshots into a save state tagged with the
    /// current layout version and the owning ROM's identity hash.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn capture(
        rom_md5: [u8; 16],
        cpu: CpuState,
        ppu: Ppu,
        apu: Apu,
        mapper: MapperSnapshot,
        total_cycles: u64,
        frame_count: u64,
    ) -> Self {
        Self {
            version: SAVE_STATE_VERSION,
            rom_md5,
            cpu,
            ppu,
            apu,
            mapper,
            total_cycles,
            frame_count,
        }
    }

    /// The ROM identity hash this state was captured against.
    #[must_use]
    pub fn rom_md5(&self) -> [u8; 16] {
        self.rom_md5
    }

    /// Checks this state's version and ROM identity against the
    /// currently loaded cartridge before handing back its component
    /// snapshots.
    ///
    /// # Errors
    ///
    /// Returns [`SaveStateError::UnsupportedVersion`] or
    /// [`SaveStateError::MismatchedRom`] without consuming `self`.
    pub fn into_components(
        self,
        expected_rom_md5: [u8; 16],
    ) -> Result<(CpuState, Ppu, Apu, MapperSnapshot, u64, u64), SaveStateError> {
        if self.version != SAVE_STATE_VERSION {
            return Err(SaveStateError::UnsupportedVersion(self.version));
        }
        if self.rom_md5 != expected_rom_md5 {
            return Err(SaveStateError::MismatchedRom {
                expected: self.rom_md5,
                actual: expected_rom_md5,
            });
        }
        Ok((self.cpu, self.ppu, self.apu, self.mapper, self.total_cycles, self.frame_count))
    }

    /// Serializes this state to its on-disk byte representation.
    ///
    /// # Errors
    ///
    /// Returns [`SaveStateError::Corrupt`] if encoding fails, which on
    /// the `bincode` backend only happens for types that do not exist
    /// in this crate (unbounded collections, non-finite floats).
    #[cfg(feature = "serde")]
    pub fn encode(&self) -> Result<Vec<u8>, SaveStateError> {
        bincode::serialize(self).map_err(|e| SaveStateError::Corrupt(e.to_string()))
    }

    /// Deserializes a state previously produced by [`SaveState::encode`].
    ///
    /// # Errors
    ///
    /// Returns [`SaveStateError::Corrupt`] if `bytes` is truncated or
    /// does not decode to a well-formed state at all; version and ROM
    /// identity are checked separately in [`SaveState::into_components`].
    #[cfg(feature = "serde")]
    pub fn decode(bytes: &[u8]) -> Result<Self, SaveStateError> {
        bincode::deserialize(bytes).map_err(|e| SaveStateError::Corrupt(e.to_string()))
    }
}

#[cfg(all(test, feature = "serde"))]
mod tests {
    use super::*;

    #[test]
    fn round_trip_preserves_fields() {
        let state = SaveState::capture(
            [7u8; 16],
            CpuState::default(),
            Ppu::new(),
            Apu::new(ferrite_apu::CPU_CLOCK_NTSC, 44_100),
            MapperSnapshot::Nrom(ferrite_mappers::NromState::default()),
            12_345,
            7,
        );
        let bytes = state.encode().unwrap();
        let decoded = SaveState::decode(&bytes).unwrap();
        assert_eq!(decoded.rom_md5(), [7u8; 16]);
    }

    #[test]
    fn mismatched_rom_is_rejected() {
        let state = SaveState::capture(
            [1u8; 16],
            CpuState::default(),
            Ppu::new(),
            Apu::new(ferrite_apu::CPU_CLOCK_NTSC, 44_100),
            MapperSnapshot::Nrom(ferrite_mappers::NromState::default()),
            0,
            0,
        );
        let err = state.into_components([2u8; 16]).unwrap_err();
        assert!(matches!(err, SaveStateError::MismatchedRom { .. }));
    }

    #[test]
    fn future_version_is_rejected() {
        let mut state = SaveState::capture(
            [1u8; 16],
            CpuState::default(),
            Ppu::new(),
            Apu::new(ferrite_apu::CPU_CLOCK_NTSC, 44_100),
            MapperSnapshot::Nrom(ferrite_mappers::NromState::default()),
            0,
            0,
        );
        state.version = SAVE_STATE_VERSION + 1;
        let err = state.into_components([1u8; 16]).unwrap_err();
        assert!(matches!(err, SaveStateError::UnsupportedVersion(_)));
    }
}
