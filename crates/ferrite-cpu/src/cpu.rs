//! The CPU itself: registers, the fetch/decode/execute loop, and
//! interrupt sequencing.

use crate::addressing::AddrMode;
use crate::opcodes;
use crate::status::Status;
use crate::{instructions, vectors};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The memory interface the CPU executes against. Implementors decide
/// how `$0000-$FFFF` maps onto RAM, PPU registers, APU registers, and
/// cartridge space; the CPU itself knows nothing about that map.
pub trait Bus {
    /// Reads one byte. Implementations may have side effects (PPU/APU
    /// register reads, mapper latch updates) exactly as real hardware
    /// does.
    fn read(&mut self, addr: u16) -> u8;

    /// Writes one byte.
    fn write(&mut self, addr: u16, value: u8);

    /// Reads a little-endian 16-bit value. Provided for vector and
    /// absolute-address fetches; does not emulate the 6502's
    /// indirect-JMP page-wrap bug (see [`Cpu`]'s own indirect-mode
    /// handling for that).
    fn read_u16(&mut self, addr: u16) -> u16 {
        let lo = u16::from(self.read(addr));
        let hi = u16::from(self.read(addr.wrapping_add(1)));
        (hi << 8) | lo
    }
}

/// Which interrupt class is currently latched and waiting to be taken
/// at the next instruction boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Interrupt {
    /// Nothing pending.
    #[default]
    None,
    /// Non-maskable interrupt (edge-triggered, always serviced).
    Nmi,
    /// Maskable interrupt (level-triggered, gated by the `I` flag).
    Irq,
}

/// The 6502-derived CPU core.
#[derive(Debug, Clone)]
pub struct Cpu {
    a: u8,
    x: u8,
    y: u8,
    pc: u16,
    sp: u8,
    status: Status,
    cycles: u64,
    stall: u16,
    nmi_pending: bool,
    irq_line: bool,
    /// The `I` flag's value as of the *previous* instruction boundary,
    /// sampled before the most recently executed instruction could
    /// change it. Gating IRQ admission on this rather than the live
    /// flag reproduces the one-instruction delay real hardware shows
    /// after `CLI`/`SEI`/`PLP`/`RTI`.
    prev_irq_inhibit: bool,
    jammed: bool,
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}

impl Cpu {
    /// Power-on register state. Matches real hardware: `I` and the
    /// unused flag set, stack pointer at `$FD`, `PC` undefined until
    /// [`Cpu::reset`] reads the reset vector.
    #[must_use]
    pub fn new() -> Self {
        Self {
            a: 0,
            x: 0,
            y: 0,
            pc: 0,
            sp: 0xFD,
            status: Status::POWER_ON,
            cycles: 0,
            stall: 0,
            nmi_pending: false,
            irq_line: false,
            prev_irq_inhibit: true,
            jammed: false,
        }
    }

    /// Performs a RESET sequence: the stack pointer is decremented by
    /// three (no bytes are actually written, matching hardware), `I`
    /// is set, and `PC` is loaded from the reset vector.
    pub fn reset(&mut self, bus: &mut dyn Bus) {
        self.sp = self.sp.wrapping_sub(3);
        self.status.insert(Status::I);
        self.pc = bus.read_u16(vectors::RESET);
        self.cycles += 7;
        self.nmi_pending = false;
        self.irq_line = false;
        self.jammed = false;
        self.stall = 0;
        self.prev_irq_inhibit = true;
    }

    /// Executes exactly one instruction (or services one pending
    /// interrupt, or burns one cycle of an externally imposed stall)
    /// and returns the number of CPU cycles consumed.
    pub fn step(&mut self, bus: &mut dyn Bus) -> u8 {
        if self.stall > 0 {
            self.stall -= 1;
            self.cycles += 1;
            return 1;
        }
        if self.jammed {
            self.cycles += 1;
            return 1;
        }
        if self.nmi_pending {
            self.nmi_pending = false;
            self.service_interrupt(bus, vectors::NMI, false);
            self.prev_irq_inhibit = true;
            self.cycles += 7;
            return 7;
        }
        if self.irq_line && !self.prev_irq_inhibit {
            self.service_interrupt(bus, vectors::IRQ, false);
            self.prev_irq_inhibit = true;
            self.cycles += 7;
            return 7;
        }
        self.prev_irq_inhibit = self.status.contains(Status::I);

        let opcode_byte = self.fetch_u8(bus);
        let info = opcodes::decode(opcode_byte);
        let cycles = instructions::execute(self, bus, info);
        self.cycles += u64::from(cycles);
        cycles
    }

    /// Latches an edge-triggered NMI request. Raised by the PPU at the
    /// start of vblank.
    pub fn trigger_nmi(&mut self) {
        self.nmi_pending = true;
    }

    /// Sets the level of the maskable IRQ line. The caller (the
    /// console/bus) is responsible for OR-ing together every IRQ
    /// source (APU frame counter, DMC, mapper) before calling this.
    pub fn set_irq_line(&mut self, asserted: bool) {
        self.irq_line = asserted;
    }

    /// Imposes an external stall (OAM DMA, DMC sample fetch) of the
    /// given number of cycles; each [`Cpu::step`] call during a stall
    /// consumes exactly one cycle and executes nothing.
    pub fn stall(&mut self, cycles: u16) {
        self.stall = self.stall.saturating_add(cycles);
    }

    /// Program counter.
    #[must_use]
    pub fn pc(&self) -> u16 {
        self.pc
    }

    /// Stack pointer (low byte; the stack always lives in page 1).
    #[must_use]
    pub fn sp(&self) -> u8 {
        self.sp
    }

    /// Accumulator.
    #[must_use]
    pub fn a(&self) -> u8 {
        self.a
    }

    /// X index register.
    #[must_use]
    pub fn x(&self) -> u8 {
        self.x
    }

    /// Y index register.
    #[must_use]
    pub fn y(&self) -> u8 {
        self.y
    }

    /// Processor status flags.
    #[must_use]
    pub fn status(&self) -> Status {
        self.status
    }

    /// Total cycles executed since construction or the last reset.
    #[must_use]
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Whether the CPU has executed a `JAM`/`KIL` opcode and will
    /// never fetch another instruction until reset.
    #[must_use]
    pub fn is_jammed(&self) -> bool {
        self.jammed
    }

    pub(crate) fn set_a(&mut self, value: u8) {
        self.a = value;
    }

    pub(crate) fn set_x(&mut self, value: u8) {
        self.x = value;
    }

    pub(crate) fn set_y(&mut self, value: u8) {
        self.y = value;
    }

    pub(crate) fn set_sp(&mut self, value: u8) {
        self.sp = value;
    }

    pub(crate) fn set_pc(&mut self, value: u16) {
        self.pc = value;
    }

    pub(crate) fn status_mut(&mut self) -> &mut Status {
        &mut self.status
    }

    pub(crate) fn set_jammed(&mut self) {
        self.jammed = true;
    }

    pub(crate) fn fetch_u8(&mut self, bus: &mut dyn Bus) -> u8 {
        let value = bus.read(self.pc);
        self.pc = self.pc.wrapping_add(1);
        value
    }

    pub(crate) fn fetch_u16(&mut self, bus: &mut dyn Bus) -> u16 {
        let lo = self.fetch_u8(bus);
        let hi = self.fetch_u8(bus);
        u16::from(lo) | (u16::from(hi) << 8)
    }

    pub(crate) fn push_u8(&mut self, bus: &mut dyn Bus, value: u8) {
        bus.write(0x0100 | u16::from(self.sp), value);
        self.sp = self.sp.wrapping_sub(1);
    }

    pub(crate) fn pop_u8(&mut self, bus: &mut dyn Bus) -> u8 {
        self.sp = self.sp.wrapping_add(1);
        bus.read(0x0100 | u16::from(self.sp))
    }

    pub(crate) fn push_u16(&mut self, bus: &mut dyn Bus, value: u16) {
        self.push_u8(bus, (value >> 8) as u8);
        self.push_u8(bus, value as u8);
    }

    pub(crate) fn pop_u16(&mut self, bus: &mut dyn Bus) -> u16 {
        let lo = self.pop_u8(bus);
        let hi = self.pop_u8(bus);
        u16::from(lo) | (u16::from(hi) << 8)
    }

    /// Resolves an addressing mode to an effective address, along with
    /// whether computing it crossed a page boundary. Not meaningful
    /// for `Implied`, `Accumulator`, or `Immediate`, which callers
    /// handle separately.
    pub(crate) fn operand_address(&mut self, bus: &mut dyn Bus, mode: AddrMode) -> (u16, bool) {
        match mode {
            AddrMode::ZeroPage => (u16::from(self.fetch_u8(bus)), false),
            AddrMode::ZeroPageX => {
                (u16::from(self.fetch_u8(bus).wrapping_add(self.x)), false)
            }
            AddrMode::ZeroPageY => {
                (u16::from(self.fetch_u8(bus).wrapping_add(self.y)), false)
            }
            AddrMode::Absolute => (self.fetch_u16(bus), false),
            AddrMode::AbsoluteX => {
                let base = self.fetch_u16(bus);
                let addr = base.wrapping_add(u16::from(self.x));
                (addr, (base & 0xFF00) != (addr & 0xFF00))
            }
            AddrMode::AbsoluteY => {
                let base = self.fetch_u16(bus);
                let addr = base.wrapping_add(u16::from(self.y));
                (addr, (base & 0xFF00) != (addr & 0xFF00))
            }
            AddrMode::Indirect => {
                let ptr = self.fetch_u16(bus);
                let lo = bus.read(ptr);
                // Hardware bug: the high byte is fetched from the same
                // page as the low byte, wrapping instead of carrying.
                let hi_addr = (ptr & 0xFF00) | (ptr.wrapping_add(1) & 0x00FF);
                let hi = bus.read(hi_addr);
                (u16::from(lo) | (u16::from(hi) << 8), false)
            }
            AddrMode::IndexedIndirect => {
                let zp = self.fetch_u8(bus).wrapping_add(self.x);
                let lo = bus.read(u16::from(zp));
                let hi = bus.read(u16::from(zp.wrapping_add(1)));
                (u16::from(lo) | (u16::from(hi) << 8), false)
            }
            AddrMode::IndirectIndexed => {
                let zp = self.fetch_u8(bus);
                let lo = bus.read(u16::from(zp));
                let hi = bus.read(u16::from(zp.wrapping_add(1)));
                let base = u16::from(lo) | (u16::from(hi) << 8);
                let addr = base.wrapping_add(u16::from(self.y));
                (addr, (base & 0xFF00) != (addr & 0xFF00))
            }
            AddrMode::Relative => {
                let offset = self.fetch_u8(bus) as i8;
                (self.pc.wrapping_add(offset as u16), false)
            }
            AddrMode::Implied | AddrMode::Accumulator | AddrMode::Immediate => (0, false),
        }
    }

    fn service_interrupt(&mut self, bus: &mut dyn Bus, vector: u16, brk: bool) {
        self.push_u16(bus, self.pc);
        let byte = self.status.to_stack_byte(brk);
        self.push_u8(bus, byte);
        self.status.insert(Status::I);
        self.pc = bus.read_u16(vector);
    }

    /// Entered by the `BRK` instruction handler in [`crate::instructions`],
    /// which needs the `brk = true` stack image that an externally
    /// raised interrupt never uses.
    pub(crate) fn enter_brk(&mut self, bus: &mut dyn Bus) {
        self.service_interrupt(bus, vectors::IRQ, true);
    }

    /// Captures every register and internal latch needed to resume
    /// execution exactly where it left off.
    #[must_use]
    pub fn snapshot(&self) -> CpuState {
        CpuState {
            a: self.a,
            x: self.x,
            y: self.y,
            pc: self.pc,
            sp: self.sp,
            status: self.status,
            cycles: self.cycles,
            stall: self.stall,
            nmi_pending: self.nmi_pending,
            irq_line: self.irq_line,
            prev_irq_inhibit: self.prev_irq_inhibit,
            jammed: self.jammed,
        }
    }

    /// Restores a previously captured snapshot in full.
    pub fn restore(&mut self, state: &CpuState) {
        self.a = state.a;
        self.x = state.x;
        self.y = state.y;
        self.pc = state.pc;
        self.sp = state.sp;
        self.status = state.status;
        self.cycles = state.cycles;
        self.stall = state.stall;
        self.nmi_pending = state.nmi_pending;
        self.irq_line = state.irq_line;
        self.prev_irq_inhibit = state.prev_irq_inhibit;
        self.jammed = state.jammed;
    }
}

/// A complete, serializable copy of [`Cpu`]'s internal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CpuState {
    a: u8,
    x: u8,
    y: u8,
    pc: u16,
    sp: u8,
    status: Status,
    cycles: u64,
    stall: u16,
    nmi_pending: bool,
    irq_line: bool,
    prev_irq_inhibit: bool,
    jammed: bool,
}
