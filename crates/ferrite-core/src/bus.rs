//! The NES system bus: wires CPU address space onto RAM, PPU/APU
//! registers, and cartridge space, and adapts the cartridge mapper to
//! the PPU's [`ferrite_ppu::PpuBus`] trait.

use ferrite_apu::Apu;
use ferrite_cpu::Bus;
use ferrite_mappers::Mapper;
use ferrite_ppu::{Ppu, PpuBus};

use crate::input::ControllerPort;

use alloc::boxed::Box;

/// Bridges a `&mut dyn Mapper` into the shape [`ferrite_ppu::Ppu`]
/// expects. The mapper already owns nametable storage (see
/// [`ferrite_mappers::Mapper`]'s documentation), so this is a thin
/// forwarding shim rather than a second memory owner.
struct MapperPpuBus<'a> {
    mapper: &'a mut dyn Mapper,
}

impl PpuBus for MapperPpuBus<'_> {
    fn ppu_read(&mut self, addr: u16) -> u8 {
        self.mapper.ppu_read(addr)
    }

    fn ppu_write(&mut self, addr: u16, value: u8) {
        self.mapper.ppu_write(addr, value);
    }

    fn step(&mut self, scanline: i16, dot: u16, rendering_enabled: bool) -> bool {
        self.mapper.step(scanline, dot, rendering_enabled).irq
    }

    fn notify_ppuctrl(&mut self, value: u8) {
        self.mapper.notify_ppuctrl(value);
    }

    fn notify_ppumask(&mut self, value: u8) {
        self.mapper.notify_ppumask(value);
    }
}

/// The NES system bus: 2 KiB internal RAM, the PPU and APU register
/// windows, controller ports, and the cartridge mapper.
pub struct NesBus {
    ram: [u8; 2048],
    /// The console's PPU.
    pub ppu: Ppu,
    /// The console's APU.
    pub apu: Apu,
    /// The loaded cartridge's mapper.
    pub mapper: Box<dyn Mapper>,
    controller1: ControllerPort,
    controller2: ControllerPort,
    oam_dma_page: Option<u8>,
    dmc_dma_stall: u8,
    open_bus: u8,
    mapper_irq: bool,
}

impl NesBus {
    /// Builds a bus around a freshly created mapper, an APU clocked at
    /// `cpu_clock` Hz and resampling to `sample_rate` Hz.
    #[must_use]
    pub fn new(mapper: Box<dyn Mapper>, cpu_clock: u32, sample_rate: u32) -> Self {
        Self {
            ram: [0; 2048],
            ppu: Ppu::new(),
            apu: Apu::new(cpu_clock, sample_rate),
            mapper,
            controller1: ControllerPort::default(),
            controller2: ControllerPort::default(),
            oam_dma_page: None,
            dmc_dma_stall: 0,
            open_bus: 0,
            mapper_irq: false,
        }
    }

    /// Resets RAM, every component, and both controller shift registers.
    pub fn reset(&mut self) {
        self.ram.fill(0);
        self.ppu.reset();
        self.apu.reset();
        self.mapper.reset();
        self.controller1.reset();
        self.controller2.reset();
        self.oam_dma_page = None;
        self.dmc_dma_stall = 0;
        self.open_bus = 0;
        self.mapper_irq = false;
    }

    /// Sets controller 1's button state for the next strobe/read cycle.
    pub fn set_controller1(&mut self, buttons: u8) {
        self.controller1.set_buttons(buttons);
    }

    /// Sets controller 2's button state for the next strobe/read cycle.
    pub fn set_controller2(&mut self, buttons: u8) {
        self.controller2.set_buttons(buttons);
    }

    /// Whether an OAM DMA transfer is waiting to execute.
    #[must_use]
    pub fn oam_dma_pending(&self) -> bool {
        self.oam_dma_page.is_some()
    }

    /// Executes a pending OAM DMA transfer (256 bytes, one CPU-cycle
    /// read each), returning the 513/514-cycle CPU stall it imposes.
    pub fn execute_oam_dma(&mut self, cpu_cycle_is_odd: bool) -> u16 {
        let Some(page) = self.oam_dma_page.take() else {
            return 0;
        };
        let base = u16::from(page) << 8;
        for offset in 0..256u16 {
            let addr = base.wrapping_add(offset);
            let value = self.cpu_read_for_dma(addr);
            self.ppu.write_oam_dma_byte(value);
        }
        if cpu_cycle_is_odd {
            514
        } else {
            513
        }
    }

    fn cpu_read_for_dma(&mut self, addr: u16) -> u8 {
        match addr {
            0x0000..=0x1FFF => self.ram[usize::from(addr & 0x07FF)],
            _ => self.mapper.cpu_read(addr),
        }
    }

    /// Advances the PPU by 3 dots (one CPU cycle's worth) and the APU
    /// by 1 cycle, fetching DMC sample bytes through cartridge space as
    /// needed. Returns whether the PPU requested NMI this CPU cycle.
    pub fn step_components(&mut self) -> bool {
        let mut nmi = false;
        for _ in 0..3 {
            let mut bus = MapperPpuBus { mapper: &mut *self.mapper };
            let result = self.ppu.step(&mut bus);
            nmi |= result.nmi;
            self.mapper_irq = result.mapper_irq;
        }

        let mapper = &mut self.mapper;
        let ram = &self.ram;
        let stolen = self.apu.clock(|addr| match addr {
            0x0000..=0x1FFF => ram[usize::from(addr & 0x07FF)],
            _ => mapper.cpu_read(addr),
        });
        self.dmc_dma_stall = self.dmc_dma_stall.saturating_add(stolen);

        nmi
    }

    /// Whether a DMC DMA stall is currently owed to the CPU.
    #[must_use]
    pub fn dmc_stall_pending(&self) -> bool {
        self.dmc_dma_stall > 0
    }

    /// Consumes one cycle of a pending DMC DMA stall.
    pub fn consume_dmc_stall_cycle(&mut self) {
        self.dmc_dma_stall = self.dmc_dma_stall.saturating_sub(1);
    }

    /// Whether the mapper or APU currently assert the maskable IRQ line.
    #[must_use]
    pub fn irq_pending(&self) -> bool {
        self.apu.irq_pending() || self.mapper_irq
    }

    /// Reads `addr` without the read side effects a live CPU fetch
    /// would have (PPU/APU register reads, mapper latch updates):
    /// useful for debuggers and tests. Everything outside internal RAM
    /// returns the last value seen on the bus instead of touching
    /// component state, since the mapper trait has no side-effect-free
    /// read of its own.
    #[must_use]
    pub fn peek(&self, addr: u16) -> u8 {
        match addr {
            0x0000..=0x1FFF => self.ram[usize::from(addr & 0x07FF)],
            _ => self.open_bus,
        }
    }
}

impl Bus for NesBus {
    fn read(&mut self, addr: u16) -> u8 {
        let value = match addr {
            0x0000..=0x1FFF => self.ram[usize::from(addr & 0x07FF)],
            0x2000..=0x3FFF => {
                let mut bus = MapperPpuBus { mapper: &mut *self.mapper };
                self.ppu.read_register(addr, &mut bus)
            }
            0x4015 => self.apu.read_status(),
            0x4016 => self.controller1.read(),
            0x4017 => self.controller2.read(),
            0x4000..=0x4014 | 0x4018..=0x401F => self.open_bus,
            0x4020..=0xFFFF => self.mapper.cpu_read(addr),
        };
        self.open_bus = value;
        value
    }

    fn write(&mut self, addr: u16, value: u8) {
        self.open_bus = value;
        match addr {
            0x0000..=0x1FFF => self.ram[usize::from(addr & 0x07FF)] = value,
            0x2000..=0x3FFF => {
                let mut bus = MapperPpuBus { mapper: &mut *self.mapper };
                self.ppu.write_register(addr, value, &mut bus);
            }
            0x4000..=0x4013 | 0x4015 | 0x4017 => self.apu.write(addr, value),
            0x4014 => self.oam_dma_page = Some(value),
            0x4016 => {
                self.controller1.write_strobe(value);
                self.controller2.write_strobe(value);
            }
            0x4018..=0x401F => {}
            0x4020..=0xFFFF => self.mapper.cpu_write(addr, value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ferrite_mappers::{Mirroring, Nrom, Rom, RomHeader};

    fn test_bus() -> NesBus {
        let rom = Rom {
            header: RomHeader {
                prg_rom_size: 0x8000,
                chr_rom_size: 0x2000,
                mapper_number: 0,
                submapper: 0,
                mirroring: Mirroring::Horizontal,
                has_battery: false,
                has_trainer: false,
                nes2_format: false,
                prg_ram_size: 0,
                prg_nvram_size: 0,
                chr_ram_size: 0,
                chr_nvram_size: 0,
            },
            trainer: None,
            prg_rom: vec![0u8; 0x8000],
            chr_rom: vec![0u8; 0x2000],
            md5: [0u8; 16],
        };
        NesBus::new(Box::new(Nrom::new(&rom)), ferrite_apu::CPU_CLOCK_NTSC, 44_100)
    }

    #[test]
    fn ram_mirrors_four_times() {
        let mut bus = test_bus();
        Bus::write(&mut bus, 0x0000, 0x42);
        assert_eq!(Bus::read(&mut bus, 0x0800), 0x42);
        assert_eq!(Bus::read(&mut bus, 0x1000), 0x42);
        assert_eq!(Bus::read(&mut bus, 0x1800), 0x42);
    }

    #[test]
    fn controller_strobe_and_serial_read() {
        let mut bus = test_bus();
        bus.set_controller1(0b1010_0101);
        Bus::write(&mut bus, 0x4016, 1);
        Bus::write(&mut bus, 0x4016, 0);
        let bits: Vec<u8> = (0..8).map(|_| Bus::read(&mut bus, 0x4016) & 1).collect();
        assert_eq!(bits, [1, 0, 1, 0, 0, 1, 0, 1]);
    }

    #[test]
    fn oam_dma_queues_and_executes() {
        let mut bus = test_bus();
        for i in 0..256u16 {
            Bus::write(&mut bus, 0x0200 + i, i as u8);
        }
        Bus::write(&mut bus, 0x4014, 0x02);
        assert!(bus.oam_dma_pending());
        let cycles = bus.execute_oam_dma(false);
        assert_eq!(cycles, 513);
        assert!(!bus.oam_dma_pending());
        assert_eq!(bus.ppu.oam_bytes()[0], 0);
        assert_eq!(bus.ppu.oam_bytes()[255], 255);
    }
}
