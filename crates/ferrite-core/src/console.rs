//! The console: the CPU driven against [`crate::bus::NesBus`] with the
//! timing, interrupt dispatch, and save-state orchestration that turns
//! the individual component crates into a working emulator.

use ferrite_cpu::Cpu;
use ferrite_mappers::{create_mapper, Mapper, Rom, RomError};

use crate::bus::NesBus;
use crate::save_state::{SaveState, SaveStateError};

use alloc::{boxed::Box, vec::Vec};

/// NES timing constants.
pub mod timing {
    /// Master clock frequency, NTSC.
    pub const MASTER_CLOCK_NTSC: u32 = 21_477_272;
    /// CPU clock frequency, NTSC (master clock / 12).
    pub const CPU_CLOCK_NTSC: u32 = MASTER_CLOCK_NTSC / 12;
    /// CPU clock frequency, PAL.
    pub const CPU_CLOCK_PAL: u32 = 26_601_712 / 16;
    /// Approximate CPU cycles in one NTSC frame (341 dots * 262
    /// scanlines / 3 dots per CPU cycle, less the odd-frame skip).
    pub const CPU_CYCLES_PER_FRAME: u32 = 29_780;
    /// PPU dots per scanline.
    pub const PPU_DOTS_PER_SCANLINE: u16 = 341;
    /// Total scanlines per frame, including vblank.
    pub const PPU_SCANLINES: u16 = 262;
    /// Target frame rate, NTSC.
    pub const FRAME_RATE_NTSC: f64 = 60.0988;
}

/// Errors raised while loading a ROM or restoring a save state.
#[derive(Debug, thiserror::Error)]
pub enum ConsoleError {
    /// The ROM image could not be parsed or uses an unsupported mapper.
    #[error("rom error: {0}")]
    Rom(#[from] RomError),
    /// A save state failed validation against the currently loaded ROM.
    #[error("save state error: {0}")]
    SaveState(#[from] SaveStateError),
}

/// A complete NES console: CPU, bus (PPU/APU/mapper/controllers), and
/// the frame/cycle bookkeeping needed to drive them.
pub struct Console {
    cpu: Cpu,
    bus: NesBus,
    rom_md5: [u8; 16],
    total_cycles: u64,
    frame_count: u64,
    running: bool,
}

impl Console {
    /// Parses `rom_data` as an iNES/NES 2.0 image and builds a console
    /// around it.
    ///
    /// # Errors
    ///
    /// Returns [`ConsoleError::Rom`] if the image is malformed or names
    /// an unsupported mapper.
    pub fn new(rom_data: &[u8]) -> Result<Self, ConsoleError> {
        let rom = Rom::load(rom_data)?;
        let mapper = create_mapper(&rom)?;
        Ok(Self::with_mapper(mapper, rom.md5))
    }

    /// Builds a console around an already-constructed mapper, tagging
    /// its save states with `rom_md5`.
    #[must_use]
    pub fn with_mapper(mapper: Box<dyn Mapper>, rom_md5: [u8; 16]) -> Self {
        let mut bus = NesBus::new(mapper, timing::CPU_CLOCK_NTSC, 44_100);
        let mut cpu = Cpu::new();
        cpu.reset(&mut bus);
        Self {
            cpu,
            bus,
            rom_md5,
            total_cycles: 0,
            frame_count: 0,
            running: true,
        }
    }

    /// Resets the CPU, every component, and cycle/frame counters.
    pub fn reset(&mut self) {
        self.bus.reset();
        self.cpu.reset(&mut self.bus);
        self.total_cycles = 0;
        self.running = true;
    }

    /// Cold-boots the console. Identical to [`Console::reset`]; kept
    /// as a separate name for callers that distinguish power-on from a
    /// player-triggered reset button.
    pub fn power_on(&mut self) {
        self.reset();
    }

    /// Executes one CPU instruction (or one cycle of a pending OAM/DMC
    /// DMA stall), advancing the PPU and APU in lockstep, and returns
    /// the number of CPU cycles consumed.
    pub fn step(&mut self) -> u32 {
        if !self.running {
            return 0;
        }

        if self.bus.dmc_stall_pending() {
            self.bus.consume_dmc_stall_cycle();
            self.advance_components(1);
            self.total_cycles += 1;
            return 1;
        }

        if self.bus.oam_dma_pending() {
            let cpu_cycle_is_odd = self.total_cycles % 2 != 0;
            let dma_cycles = self.bus.execute_oam_dma(cpu_cycle_is_odd);
            self.advance_components(dma_cycles);
            self.total_cycles += u64::from(dma_cycles);
            return u32::from(dma_cycles);
        }

        self.cpu.set_irq_line(self.bus.irq_pending());
        let cycles = self.cpu.step(&mut self.bus);
        self.advance_components(u16::from(cycles));
        self.total_cycles += u64::from(cycles);
        u32::from(cycles)
    }

    /// Advances the PPU (3 dots) and APU (1 cycle) for each of
    /// `cpu_cycles` CPU cycles, latching NMI requests the PPU raises
    /// along the way.
    fn advance_components(&mut self, cpu_cycles: u16) {
        for _ in 0..cpu_cycles {
            if self.bus.step_components() {
                self.cpu.trigger_nmi();
            }
        }
    }

    /// Runs approximately one frame's worth of CPU cycles
    /// ([`timing::CPU_CYCLES_PER_FRAME`]) and returns how many cycles
    /// actually executed.
    pub fn step_frame(&mut self) -> u64 {
        let start = self.total_cycles;
        let target = start + u64::from(timing::CPU_CYCLES_PER_FRAME);
        while self.total_cycles < target && self.running {
            self.step();
        }
        self.frame_count += 1;
        self.total_cycles - start
    }

    /// The current frame as 256x240 RGBA bytes.
    #[must_use]
    pub fn framebuffer_rgba(&self) -> Vec<u8> {
        self.bus.ppu.framebuffer_rgba()
    }

    /// Drains and returns every audio sample produced since the last
    /// call.
    pub fn take_audio(&mut self) -> Vec<f32> {
        self.bus.apu.take_samples()
    }

    /// The audio samples produced since the last [`Console::take_audio`]
    /// call, without draining them.
    #[must_use]
    pub fn audio_buffer(&self) -> &[f32] {
        self.bus.apu.samples()
    }

    /// Sets controller 1's held buttons.
    pub fn set_controller1(&mut self, buttons: u8) {
        self.bus.set_controller1(buttons);
    }

    /// Sets controller 2's held buttons.
    pub fn set_controller2(&mut self, buttons: u8) {
        self.bus.set_controller2(buttons);
    }

    /// Total CPU cycles executed since construction or the last reset.
    #[must_use]
    pub fn total_cycles(&self) -> u64 {
        self.total_cycles
    }

    /// Completed frames since construction or the last reset.
    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Whether emulation is currently advancing on [`Console::step`].
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Stops [`Console::step`]/[`Console::step_frame`] from advancing.
    pub fn pause(&mut self) {
        self.running = false;
    }

    /// Resumes advancing after [`Console::pause`].
    pub fn resume(&mut self) {
        self.running = true;
    }

    /// A reference to the CPU, for debugging and tests.
    #[must_use]
    pub fn cpu(&self) -> &Cpu {
        &self.cpu
    }

    /// A reference to the bus, for debugging and tests.
    #[must_use]
    pub fn bus(&self) -> &NesBus {
        &self.bus
    }

    /// A mutable reference to the bus, for test setup that pokes
    /// registers directly (e.g. mapper IRQ configuration) without
    /// routing through CPU execution.
    pub fn bus_mut(&mut self) -> &mut NesBus {
        &mut self.bus
    }

    /// Reads `addr` without CPU-fetch side effects. See
    /// [`NesBus::peek`].
    #[must_use]
    pub fn peek(&self, addr: u16) -> u8 {
        self.bus.peek(addr)
    }

    /// The loaded cartridge's iNES mapper number.
    #[must_use]
    pub fn mapper_number(&self) -> u16 {
        self.bus.mapper.mapper_number()
    }

    /// The loaded cartridge's mapper name (e.g. `"NROM"`, `"MMC5"`).
    #[must_use]
    pub fn mapper_name(&self) -> &'static str {
        self.bus.mapper.mapper_name()
    }

    /// Whether the loaded cartridge has battery-backed save RAM.
    #[must_use]
    pub fn has_battery(&self) -> bool {
        self.bus.mapper.has_battery()
    }

    /// The cartridge's battery-backed RAM contents, for persisting
    /// between sessions.
    #[must_use]
    pub fn battery_ram(&self) -> Option<&[u8]> {
        self.bus.mapper.battery_ram()
    }

    /// Restores previously saved battery-backed RAM contents.
    pub fn load_battery_ram(&mut self, data: &[u8]) {
        self.bus.mapper.set_battery_ram(data);
    }

    /// Captures a save state of the CPU, PPU, APU, and mapper, tagged
    /// against the currently loaded ROM.
    #[must_use]
    pub fn save_state(&self) -> SaveState {
        SaveState::capture(
            self.rom_md5,
            self.cpu.snapshot(),
            self.bus.ppu.clone(),
            self.bus.apu.clone(),
            self.bus.mapper.snapshot(),
            self.total_cycles,
            self.frame_count,
        )
    }

    /// Restores a save state previously produced by
    /// [`Console::save_state`].
    ///
    /// # Errors
    ///
    /// Returns [`ConsoleError::SaveState`] if the state's version or
    /// ROM identity does not match; on error the console is left
    /// untouched.
    pub fn restore_state(&mut self, state: SaveState) -> Result<(), ConsoleError> {
        let (cpu_state, ppu, apu, mapper_snapshot, total_cycles, frame_count) =
            state.into_components(self.rom_md5)?;
        self.cpu.restore(&cpu_state);
        self.bus.ppu = ppu;
        self.bus.apu = apu;
        self.bus.mapper.restore(&mapper_snapshot);
        self.total_cycles = total_cycles;
        self.frame_count = frame_count;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ferrite_mappers::{Mirroring, Nrom, RomHeader};

    #[cfg(not(feature = "std"))]
    use alloc::{boxed::Box, vec};

    fn test_rom() -> Rom {
        let mut prg = vec![0xEAu8; 0x8000];
        prg[0x7FFC] = 0x00;
        prg[0x7FFD] = 0x80;
        Rom {
            header: RomHeader {
                prg_rom_size: 0x8000,
                chr_rom_size: 0x2000,
                mapper_number: 0,
                submapper: 0,
                mirroring: Mirroring::Vertical,
                has_battery: false,
                has_trainer: false,
                nes2_format: false,
                prg_ram_size: 0,
                prg_nvram_size: 0,
                chr_ram_size: 0,
                chr_nvram_size: 0,
            },
            trainer: None,
            prg_rom: prg,
            chr_rom: vec![0u8; 0x2000],
            md5: [9u8; 16],
        }
    }

    fn test_console() -> Console {
        let rom = test_rom();
        let mapper = Box::new(Nrom::new(&rom));
        Console::with_mapper(mapper, rom.md5)
    }

    #[test]
    fn creation_reports_nrom() {
        let console = test_console();
        assert_eq!(console.mapper_number(), 0);
        assert_eq!(console.mapper_name(), "NROM");
    }

    #[test]
    fn step_advances_cycles() {
        let mut console = test_console();
        let cycles = console.step();
        assert!(cycles > 0);
        assert_eq!(u64::from(cycles), console.total_cycles());
    }

    #[test]
    fn framebuffer_is_correctly_sized() {
        let console = test_console();
        assert_eq!(console.framebuffer_rgba().len(), 256 * 240 * 4);
    }

    #[test]
    fn pause_stops_stepping() {
        let mut console = test_console();
        console.pause();
        assert_eq!(console.step(), 0);
        console.resume();
        assert!(console.step() > 0);
    }

    #[test]
    fn reset_clears_cycle_count() {
        let mut console = test_console();
        for _ in 0..50 {
            console.step();
        }
        assert!(console.total_cycles() > 0);
        console.reset();
        assert_eq!(console.total_cycles(), 0);
    }

    #[test]
    fn save_state_round_trips_cpu_registers() {
        let mut console = test_console();
        for _ in 0..20 {
            console.step();
        }
        let state = console.save_state();
        let pc_before = console.cpu().pc();
        console.reset();
        assert_ne!(console.cpu().pc(), pc_before);
        console.restore_state(state).unwrap();
        assert_eq!(console.cpu().pc(), pc_before);
    }

    #[test]
    fn restoring_a_state_from_a_different_rom_is_rejected() {
        let mut console = test_console();
        let mut state = console.save_state();
        state = {
            let (cpu, ppu, apu, mapper, total_cycles, frame_count) =
                state.into_components(console.rom_md5).unwrap();
            SaveState::capture([0xFFu8; 16], cpu, ppu, apu, mapper, total_cycles, frame_count)
        };
        let err = console.restore_state(state).unwrap_err();
        assert!(matches!(err, ConsoleError::SaveState(SaveStateError::MismatchedRom { .. })));
    }
}
