//! Save-state validation errors.

#[cfg(not(feature = "std"))]
use alloc::string::String;

/// The version of the save-state layout this build writes and expects.
pub const SAVE_STATE_VERSION: u32 = 1;

/// Errors returned when a save state cannot be restored.
#[derive(Debug, thiserror::Error)]
pub enum SaveStateError {
    /// The save state's ROM identity hash does not match the currently
    /// loaded cartridge.
    #[error("save state was made with a different ROM (expected md5 {expected:02x?}, loaded rom is {actual:02x?})")]
    MismatchedRom {
        /// The MD5 recorded in the save state.
        expected: [u8; 16],
        /// The MD5 of the ROM currently loaded in the console.
        actual: [u8; 16],
    },
    /// The save state was written by a newer, incompatible layout version.
    #[error("save state version {0} is not supported by this build (expected {SAVE_STATE_VERSION})")]
    UnsupportedVersion(u32),
    /// The save state's bytes could not be decoded.
    #[error("save state data is corrupt: {0}")]
    Corrupt(String),
}
