//! The frame counter: a CPU-cycle-driven sequencer that clocks every
//! channel's envelope, linear counter, length counter and sweep unit,
//! and optionally raises an IRQ.
//!
//! - 4-step mode: quarter frames at cycles 7457, 14913, 22371, 29829,
//!   the last of which is also a half frame and (unless inhibited)
//!   raises an IRQ.
//! - 5-step mode: quarter frames at 7457, 14913, 22371, 29829, 37281,
//!   the last two of which are half frames; never raises an IRQ.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Frame counter sequencing mode, set by `$4017` bit 7.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum FrameCounterMode {
    /// 4-step sequence (the default on reset).
    #[default]
    FourStep,
    /// 5-step sequence.
    FiveStep,
}

/// One event produced by a frame counter clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameEvent {
    /// Clock envelopes and the triangle's linear counter.
    QuarterFrame,
    /// Clock length counters and sweep units.
    HalfFrame,
    /// Raise the frame counter's IRQ (4-step mode only).
    Irq,
}

const FOUR_STEP_CYCLES: [u16; 4] = [7457, 14913, 22371, 29829];
const FIVE_STEP_CYCLES: [u16; 5] = [7457, 14913, 22371, 29829, 37281];

/// Up to three events can occur on the same cycle (the last step of
/// each mode fires a quarter frame, a half frame, and possibly IRQ).
pub type FrameEvents = [Option<FrameEvent>; 3];

/// The frame counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FrameCounter {
    cycle: u16,
    mode: FrameCounterMode,
    irq_inhibit: bool,
    irq_pending: bool,
    reset_delay: u8,
    pending_mode: Option<FrameCounterMode>,
}

impl FrameCounter {
    /// A frame counter in 4-step mode, freshly reset.
    #[must_use]
    pub fn new() -> Self {
        Self {
            cycle: 0,
            mode: FrameCounterMode::FourStep,
            irq_inhibit: false,
            irq_pending: false,
            reset_delay: 0,
            pending_mode: None,
        }
    }

    /// `$4017`: `MI-- ----` — mode and IRQ inhibit. The mode change
    /// (and, in 5-step mode, an immediate half-frame clock) is
    /// deferred by 3 or 4 CPU cycles depending on write alignment,
    /// matching the documented hardware delay.
    pub fn write(&mut self, value: u8) {
        self.irq_inhibit = value & 0x40 != 0;
        if self.irq_inhibit {
            self.irq_pending = false;
        }

        self.pending_mode = Some(if value & 0x80 != 0 {
            FrameCounterMode::FiveStep
        } else {
            FrameCounterMode::FourStep
        });
        self.reset_delay = if self.cycle % 2 == 0 { 4 } else { 3 };
    }

    /// Clocks the frame counter by one CPU cycle, returning any events
    /// that fired on this exact cycle.
    pub fn clock(&mut self) -> FrameEvents {
        let mut events: FrameEvents = [None; 3];

        if self.reset_delay > 0 {
            self.reset_delay -= 1;
            if self.reset_delay == 0 {
                if let Some(mode) = self.pending_mode.take() {
                    self.mode = mode;
                    self.cycle = 0;
                    if self.mode == FrameCounterMode::FiveStep {
                        events[0] = Some(FrameEvent::QuarterFrame);
                        events[1] = Some(FrameEvent::HalfFrame);
                        return events;
                    }
                }
            }
        }

        self.cycle += 1;

        match self.mode {
            FrameCounterMode::FourStep => self.clock_four_step(&mut events),
            FrameCounterMode::FiveStep => self.clock_five_step(&mut events),
        }

        events
    }

    fn clock_four_step(&mut self, events: &mut FrameEvents) {
        match self.cycle {
            c if c == FOUR_STEP_CYCLES[0] => {
                events[0] = Some(FrameEvent::QuarterFrame);
            }
            c if c == FOUR_STEP_CYCLES[1] => {
                events[0] = Some(FrameEvent::QuarterFrame);
                events[1] = Some(FrameEvent::HalfFrame);
            }
            c if c == FOUR_STEP_CYCLES[2] => {
                events[0] = Some(FrameEvent::QuarterFrame);
            }
            c if c == FOUR_STEP_CYCLES[3] => {
                events[0] = Some(FrameEvent::QuarterFrame);
                events[1] = Some(FrameEvent::HalfFrame);
                if !self.irq_inhibit {
                    self.irq_pending = true;
                    events[2] = Some(FrameEvent::Irq);
                }
                self.cycle = 0;
            }
            _ => {}
        }
    }

    fn clock_five_step(&mut self, events: &mut FrameEvents) {
        match self.cycle {
            c if c == FIVE_STEP_CYCLES[0] => {
                events[0] = Some(FrameEvent::QuarterFrame);
            }
            c if c == FIVE_STEP_CYCLES[1] => {
                events[0] = Some(FrameEvent::QuarterFrame);
                events[1] = Some(FrameEvent::HalfFrame);
            }
            c if c == FIVE_STEP_CYCLES[2] => {
                events[0] = Some(FrameEvent::QuarterFrame);
            }
            c if c == FIVE_STEP_CYCLES[3] => {}
            c if c == FIVE_STEP_CYCLES[4] => {
                events[0] = Some(FrameEvent::QuarterFrame);
                events[1] = Some(FrameEvent::HalfFrame);
                self.cycle = 0;
            }
            _ => {}
        }
    }

    /// Whether the frame-counter IRQ line is currently asserted.
    #[must_use]
    pub fn irq_pending(&self) -> bool {
        self.irq_pending
    }

    /// Clears the IRQ flag; called when `$4015` is read.
    pub fn clear_irq(&mut self) {
        self.irq_pending = false;
    }

    /// The current sequencing mode.
    #[must_use]
    pub fn mode(&self) -> FrameCounterMode {
        self.mode
    }
}

impl Default for FrameCounter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_in_four_step_mode_with_no_irq() {
        let fc = FrameCounter::new();
        assert_eq!(fc.mode(), FrameCounterMode::FourStep);
        assert!(!fc.irq_pending());
    }

    #[test]
    fn four_step_mode_raises_irq_unless_inhibited() {
        let mut fc = FrameCounter::new();
        fc.write(0x00);
        for _ in 0..FOUR_STEP_CYCLES[3] + 10 {
            fc.clock();
        }
        assert!(fc.irq_pending());
    }

    #[test]
    fn irq_inhibit_suppresses_and_clears_pending_irq() {
        let mut fc = FrameCounter::new();
        fc.write(0x40);
        for _ in 0..FOUR_STEP_CYCLES[3] + 10 {
            fc.clock();
        }
        assert!(!fc.irq_pending());
    }

    #[test]
    fn five_step_mode_clocks_an_immediate_half_frame_on_switch() {
        let mut fc = FrameCounter::new();
        fc.write(0x80);
        let mut saw_half_frame = false;
        for _ in 0..10 {
            let events = fc.clock();
            if events.contains(&Some(FrameEvent::HalfFrame)) {
                saw_half_frame = true;
            }
        }
        assert!(saw_half_frame);
        assert_eq!(fc.mode(), FrameCounterMode::FiveStep);
    }

    #[test]
    fn five_step_mode_never_raises_irq() {
        let mut fc = FrameCounter::new();
        fc.write(0x80);
        for _ in 0..FIVE_STEP_CYCLES[4] + 10 {
            fc.clock();
        }
        assert!(!fc.irq_pending());
    }
}
