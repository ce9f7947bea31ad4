//! NES console emulation: the CPU, PPU, APU, and cartridge mapper
//! crates wired together through one system bus.
//!
//! # Architecture
//!
//! ```text
//! Console
//!   +-- Cpu (ferrite-cpu)
//!   +-- NesBus
//!         +-- 2 KiB internal RAM
//!         +-- Ppu (ferrite-ppu)
//!         +-- Apu (ferrite-apu)
//!         +-- Box<dyn Mapper> (ferrite-mappers)
//!         +-- ControllerPort x2
//! ```
//!
//! # Usage
//!
//! ```no_run
//! use ferrite_core::Console;
//!
//! let rom_data = std::fs::read("game.nes").expect("failed to read rom");
//! let mut console = Console::new(&rom_data).expect("failed to build console");
//! console.power_on();
//!
//! loop {
//!     console.set_controller1(0x01); // A held
//!     console.step_frame();
//!     let _framebuffer = console.framebuffer_rgba();
//!     let _audio = console.take_audio();
//!     # break;
//! }
//! ```
//!
//! # Features
//!
//! - `std` (default): standard library support.
//! - `serde`: enables save-state serialization through `bincode`.

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]

extern crate alloc;

mod bus;
mod console;
mod input;
mod save_state;

pub use bus::NesBus;
pub use console::{timing, Console, ConsoleError};
pub use input::{Button, ControllerPort};
pub use save_state::{SaveState, SaveStateError, SAVE_STATE_VERSION};

pub use ferrite_apu::Apu;
pub use ferrite_cpu::Cpu;
pub use ferrite_mappers::{create_mapper, Mapper, Mirroring, Rom, RomError, RomHeader};
pub use ferrite_ppu::Ppu;

/// This crate's version, as declared in `Cargo.toml`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// NES screen geometry.
pub mod screen {
    /// Screen width in pixels.
    pub const WIDTH: u32 = 256;
    /// Screen height in pixels.
    pub const HEIGHT: u32 = 240;
    /// Total pixels per frame.
    pub const PIXELS: u32 = WIDTH * HEIGHT;
    /// Bytes per frame, RGBA.
    pub const FRAMEBUFFER_SIZE: usize = (PIXELS * 4) as usize;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn screen_constants_match_ppu_output() {
        assert_eq!(screen::WIDTH, 256);
        assert_eq!(screen::HEIGHT, 240);
        assert_eq!(screen::PIXELS, 61_440);
        assert_eq!(screen::FRAMEBUFFER_SIZE, 245_760);
    }

    #[test]
    fn timing_constants_match_ntsc_hardware() {
        assert_eq!(timing::MASTER_CLOCK_NTSC, 21_477_272);
        assert_eq!(timing::CPU_CLOCK_NTSC, 1_789_772);
        assert_eq!(timing::CPU_CYCLES_PER_FRAME, 29_780);
    }
}
