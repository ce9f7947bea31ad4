//! The 2A03 APU: five synthesis channels, a frame sequencer, a mixer,
//! and the resampler that turns per-cycle mixer output into a host-
//! rate sample stream.

use alloc::vec::Vec;

use crate::dmc::{Dmc, TimingStandard};
use crate::frame_counter::{FrameCounter, FrameEvent};
use crate::mixer;
use crate::noise::Noise;
use crate::pulse::Pulse;
use crate::resampler::Resampler;
use crate::sweep::SweepChannel;
use crate::triangle::Triangle;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// CPU clock, NTSC, in Hz. The APU's own channel timers run at half
/// this rate; the triangle and frame counter run at the full rate.
pub const CPU_CLOCK_NTSC: u32 = 1_789_773;
/// CPU clock, PAL, in Hz.
pub const CPU_CLOCK_PAL: u32 = 1_662_607;

/// The APU, owning every channel and the machinery that mixes and
/// resamples their combined output.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Apu {
    pulse1: Pulse,
    pulse2: Pulse,
    triangle: Triangle,
    noise: Noise,
    dmc: Dmc,
    frame_counter: FrameCounter,
    resampler: Resampler,
    cycle: u64,
    cpu_clock: u32,
}

impl Apu {
    /// A fresh APU clocked at `cpu_clock` Hz, resampling down to
    /// `sample_rate` Hz (per spec, 22 050 or 44 100).
    #[must_use]
    pub fn new(cpu_clock: u32, sample_rate: u32) -> Self {
        let standard = if cpu_clock == CPU_CLOCK_PAL {
            TimingStandard::Pal
        } else {
            TimingStandard::Ntsc
        };

        Self {
            pulse1: Pulse::new(SweepChannel::One),
            pulse2: Pulse::new(SweepChannel::Two),
            triangle: Triangle::new(),
            noise: Noise::new(),
            dmc: Dmc::new(standard),
            frame_counter: FrameCounter::new(),
            resampler: Resampler::new(cpu_clock, sample_rate),
            cycle: 0,
            cpu_clock,
        }
    }

    /// Resets every channel and the frame sequencer, preserving the
    /// configured clock and sample rates.
    pub fn reset(&mut self) {
        *self = Self::new(self.cpu_clock, self.resampler.output_rate());
    }

    /// Dispatches a CPU-side register write to the right channel.
    pub fn write(&mut self, addr: u16, value: u8) {
        match addr {
            0x4000 => self.pulse1.write_ctrl(value),
            0x4001 => self.pulse1.write_sweep(value),
            0x4002 => self.pulse1.write_timer_lo(value),
            0x4003 => self.pulse1.write_timer_hi(value),

            0x4004 => self.pulse2.write_ctrl(value),
            0x4005 => self.pulse2.write_sweep(value),
            0x4006 => self.pulse2.write_timer_lo(value),
            0x4007 => self.pulse2.write_timer_hi(value),

            0x4008 => self.triangle.write_linear_counter(value),
            0x400A => self.triangle.write_timer_lo(value),
            0x400B => self.triangle.write_timer_hi(value),

            0x400C => self.noise.write_ctrl(value),
            0x400E => self.noise.write_period(value),
            0x400F => self.noise.write_length(value),

            0x4010 => self.dmc.write_ctrl(value),
            0x4011 => self.dmc.write_direct_load(value),
            0x4012 => self.dmc.write_sample_address(value),
            0x4013 => self.dmc.write_sample_length(value),

            0x4015 => {
                self.pulse1.set_enabled(value & 0x01 != 0);
                self.pulse2.set_enabled(value & 0x02 != 0);
                self.triangle.set_enabled(value & 0x04 != 0);
                self.noise.set_enabled(value & 0x08 != 0);
                self.dmc.set_enabled(value & 0x10 != 0);
            }

            0x4017 => self.frame_counter.write(value),

            _ => {}
        }
    }

    /// `$4015` read: channel active flags plus both IRQ flags. Clears
    /// the frame counter's IRQ flag as a read side effect (the DMC's
    /// is cleared separately via [`Apu::clear_dmc_irq`]).
    pub fn read_status(&mut self) -> u8 {
        let status = self.peek_status();
        self.frame_counter.clear_irq();
        status
    }

    /// `$4015` read without the IRQ-clearing side effect.
    #[must_use]
    pub fn peek_status(&self) -> u8 {
        let mut status = 0u8;
        status |= u8::from(self.pulse1.active());
        status |= u8::from(self.pulse2.active()) << 1;
        status |= u8::from(self.triangle.active()) << 2;
        status |= u8::from(self.noise.active()) << 3;
        status |= u8::from(self.dmc.active()) << 4;
        status |= u8::from(self.frame_counter.irq_pending()) << 6;
        status |= u8::from(self.dmc.irq_pending()) << 7;
        status
    }

    /// Clears the DMC's end-of-sample IRQ flag.
    pub fn clear_dmc_irq(&mut self) {
        self.dmc.clear_irq();
    }

    /// Whether either IRQ source is currently asserted.
    #[must_use]
    pub fn irq_pending(&self) -> bool {
        self.frame_counter.irq_pending() || self.dmc.irq_pending()
    }

    /// Advances the APU by one CPU cycle, fetching DMC sample bytes
    /// through `read_memory` as needed. Returns the number of CPU
    /// cycles the DMC's DMA stole this cycle (0 or 3).
    pub fn clock<F>(&mut self, mut read_memory: F) -> u8
    where
        F: FnMut(u16) -> u8,
    {
        self.triangle.clock_timer();

        let mut dma_stall = 0;
        if self.cycle % 2 == 1 {
            self.pulse1.clock_timer();
            self.pulse2.clock_timer();
            self.noise.clock_timer();
            dma_stall = self.dmc.clock_timer(&mut read_memory);
        }

        for event in self.frame_counter.clock().into_iter().flatten() {
            match event {
                FrameEvent::QuarterFrame => {
                    self.pulse1.clock_envelope();
                    self.pulse2.clock_envelope();
                    self.triangle.clock_linear_counter();
                    self.noise.clock_envelope();
                }
                FrameEvent::HalfFrame => {
                    self.pulse1.clock_length();
                    self.pulse1.clock_sweep();
                    self.pulse2.clock_length();
                    self.pulse2.clock_sweep();
                    self.triangle.clock_length();
                    self.noise.clock_length();
                }
                FrameEvent::Irq => {}
            }
        }

        self.resampler.push(self.mix());
        self.cycle = self.cycle.wrapping_add(1);

        dma_stall
    }

    fn mix(&self) -> f32 {
        mixer::mix(
            self.pulse1.output(),
            self.pulse2.output(),
            self.triangle.output(),
            self.noise.output(),
            self.dmc.output(),
        )
    }

    /// Samples resampled to the host rate so far, not yet drained.
    #[must_use]
    pub fn samples(&self) -> &[f32] {
        self.resampler.samples()
    }

    /// Drains and returns the resampled host-rate sample buffer.
    pub fn take_samples(&mut self) -> Vec<f32> {
        self.resampler.take_samples()
    }

    /// The APU's internal cycle counter, for diagnostics and tests.
    #[must_use]
    pub fn cycle(&self) -> u64 {
        self.cycle
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_apu() -> Apu {
        Apu::new(CPU_CLOCK_NTSC, 44_100)
    }

    #[test]
    fn fresh_apu_reports_no_active_channels() {
        let mut apu = test_apu();
        assert_eq!(apu.read_status(), 0);
    }

    #[test]
    fn enabling_and_loading_a_channel_sets_its_status_bit() {
        let mut apu = test_apu();
        apu.write(0x4015, 0x01);
        apu.write(0x4003, 0xF8);
        assert_eq!(apu.read_status() & 0x01, 0x01);
    }

    #[test]
    fn status_read_clears_frame_counter_irq() {
        let mut apu = test_apu();
        apu.write(0x4017, 0x00); // 4-step mode, IRQ enabled
        for _ in 0..30000 {
            apu.clock(|_| 0);
        }
        assert!(apu.irq_pending());
        apu.read_status();
        assert!(!apu.frame_counter.irq_pending());
    }

    #[test]
    fn dmc_dma_steals_cycles_only_on_fetch() {
        let mut apu = test_apu();
        apu.write(0x4010, 0x0F); // fastest rate
        apu.write(0x4012, 0x00);
        apu.write(0x4013, 0x00);
        apu.write(0x4015, 0x10);

        let memory = [0u8; 0x10000];
        let mut total_stall = 0;
        for _ in 0..200 {
            total_stall += apu.clock(|addr| memory[usize::from(addr)]);
        }
        assert!(total_stall > 0);
    }

    #[test]
    fn mixer_output_stays_in_range() {
        let mut apu = test_apu();
        apu.write(0x4015, 0x1F);
        apu.write(0x4000, 0x3F);
        apu.write(0x4003, 0xF8);
        for _ in 0..1000 {
            apu.clock(|_| 0);
        }
        for &sample in apu.samples() {
            assert!((0.0..2.0).contains(&sample));
        }
    }

    #[test]
    fn reset_clears_cycle_count_and_channel_state() {
        let mut apu = test_apu();
        apu.write(0x4015, 0x1F);
        apu.clock(|_| 0);
        apu.clock(|_| 0);
        apu.reset();
        assert_eq!(apu.cycle(), 0);
        assert_eq!(apu.read_status(), 0);
    }
}
