//! Downsamples the APU's per-cycle mixer output to a host-configured
//! sample rate via a running fractional accumulator, so the long-run
//! average error stays under one sample regardless of how the two
//! clocks' ratio rounds.

use alloc::vec::Vec;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Emits one sample every time its accumulator crosses a whole CPU
/// cycle boundary at the configured `cycles_per_sample` rate.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Resampler {
    cpu_clock: u32,
    output_rate: u32,
    /// Accumulator, scaled by `output_rate` so it stays integral.
    accumulator: u64,
    #[cfg_attr(feature = "serde", serde(skip))]
    buffer: Vec<f32>,
}

impl Resampler {
    /// A resampler converting from `cpu_clock` Hz to `output_rate` Hz.
    #[must_use]
    pub fn new(cpu_clock: u32, output_rate: u32) -> Self {
        Self {
            cpu_clock,
            output_rate,
            accumulator: 0,
            buffer: Vec::new(),
        }
    }

    /// Feeds one mixer sample produced on this CPU cycle. Pushes a
    /// resampled output sample whenever the accumulator crosses
    /// `cpu_clock` host-rate units.
    pub fn push(&mut self, sample: f32) {
        self.accumulator += u64::from(self.output_rate);
        if self.accumulator >= u64::from(self.cpu_clock) {
            self.accumulator -= u64::from(self.cpu_clock);
            self.buffer.push(sample);
        }
    }

    /// Samples produced so far and not yet drained.
    #[must_use]
    pub fn samples(&self) -> &[f32] {
        &self.buffer
    }

    /// Drains and returns all buffered samples.
    pub fn take_samples(&mut self) -> Vec<f32> {
        core::mem::take(&mut self.buffer)
    }

    /// Clears the buffer without affecting the running accumulator.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    /// Resets both the buffer and the fractional accumulator.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.accumulator = 0;
    }

    /// The configured host output rate.
    #[must_use]
    pub fn output_rate(&self) -> u32 {
        self.output_rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn produces_one_sample_per_cycles_per_sample() {
        let cpu_clock = 1_789_773;
        let output_rate = 44_100;
        let mut resampler = Resampler::new(cpu_clock, output_rate);

        for _ in 0..cpu_clock {
            resampler.push(1.0);
        }

        let produced = resampler.samples().len();
        let expected = output_rate as usize;
        assert!(
            produced.abs_diff(expected) <= 1,
            "expected ~{expected} samples, got {produced}"
        );
    }

    #[test]
    fn take_samples_drains_without_resetting_accumulator() {
        let mut resampler = Resampler::new(100, 50);
        for _ in 0..100 {
            resampler.push(0.5);
        }
        let drained = resampler.take_samples();
        assert!(!drained.is_empty());
        assert!(resampler.samples().is_empty());
    }

    #[test]
    fn reset_clears_accumulator_so_timing_restarts() {
        let mut resampler = Resampler::new(4, 3);
        resampler.push(1.0); // accumulator 3 < 4, no sample
        resampler.reset();
        assert_eq!(resampler.accumulator, 0);
        assert!(resampler.samples().is_empty());
    }
}
