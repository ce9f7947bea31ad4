//! The NES 2A03 APU: two pulse channels, a triangle channel, a noise
//! channel, a delta-modulation sample channel, the frame sequencer
//! that clocks them, and the mixer/resampler pair that turns the
//! result into a host-rate sample stream.
//!
//! [`Apu::clock`] is driven once per CPU cycle; the DMC's DMA fetches
//! are threaded through a caller-supplied `FnMut(u16) -> u8` closure
//! rather than an internal bus reference, so this crate never needs
//! to know about the rest of the machine's memory map.
#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]

extern crate alloc;

mod apu;
mod dmc;
mod envelope;
mod frame_counter;
mod length_counter;
mod mixer;
mod noise;
mod pulse;
mod resampler;
mod sweep;
mod timer;
mod triangle;

pub use apu::{Apu, CPU_CLOCK_NTSC, CPU_CLOCK_PAL};
pub use dmc::{Dmc, TimingStandard, DMC_RATE_NTSC, DMC_RATE_PAL};
pub use envelope::Envelope;
pub use frame_counter::{FrameCounter, FrameCounterMode, FrameEvent, FrameEvents};
pub use length_counter::{LengthCounter, LENGTH_TABLE};
pub use mixer::{mix, PULSE_TABLE, TND_TABLE};
pub use noise::{Noise, NOISE_PERIOD_TABLE};
pub use pulse::{Pulse, DUTY_TABLE};
pub use resampler::Resampler;
pub use sweep::{Sweep, SweepChannel};
pub use timer::Timer;
pub use triangle::{Triangle, TRIANGLE_SEQUENCE};

/// NTSC CPU cycles in one PPU-synchronized video frame (≈60.0988 Hz).
pub const CYCLES_PER_FRAME_NTSC: u32 = 29_780;
/// PAL CPU cycles in one PPU-synchronized video frame (≈50.007 Hz).
pub const CYCLES_PER_FRAME_PAL: u32 = 33_247;
