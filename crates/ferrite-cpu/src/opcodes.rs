//! The 256-entry opcode table, official and unofficial instructions
//! alike. The NES relies on several "illegal" opcodes (`LAX`, `SAX`,
//! `DCP`, `ISC`, `SLO`, `RLA`, `SRE`, `RRA`, and various `NOP`/`SBC`
//! duplicates) being stable enough to be used by real software and by
//! CPU test ROMs, so they are decoded and executed rather than
//! treated as invalid.

use crate::addressing::AddrMode;

/// Instruction mnemonic, official or unofficial.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs, non_camel_case_types)]
pub enum Mnemonic {
    ADC, AND, ASL, BCC, BCS, BEQ, BIT, BMI, BNE, BPL, BRK, BVC, BVS, CLC,
    CLD, CLI, CLV, CMP, CPX, CPY, DEC, DEX, DEY, EOR, INC, INX, INY, JMP,
    JSR, LDA, LDX, LDY, LSR, NOP, ORA, PHA, PHP, PLA, PLP, ROL, ROR, RTI,
    RTS, SBC, SEC, SED, SEI, STA, STX, STY, TAX, TAY, TSX, TXA, TXS, TYA,
    // Unofficial opcodes.
    ALR, ANC, ANE, ARR, DCP, ISC, JAM, LAS, LAX, LXA, RLA, RRA, SAX, SBX,
    SHA, SHX, SHY, SLO, SRE, TAS,
}

/// A fully decoded opcode: mnemonic, addressing mode, base cycle cost,
/// and whether crossing a page boundary while computing the effective
/// address adds one extra cycle.
#[derive(Debug, Clone, Copy)]
pub struct OpcodeInfo {
    /// What the instruction does.
    pub mnemonic: Mnemonic,
    /// How its operand is addressed.
    pub mode: AddrMode,
    /// Cycles consumed when no page boundary is crossed (already the
    /// worst case for read-modify-write and store instructions).
    pub cycles: u8,
    /// Whether a page-boundary crossing during effective-address
    /// computation adds one extra cycle. Never set for stores or
    /// read-modify-write instructions, which already charge the
    /// worst-case cycle count unconditionally.
    pub page_cross_extra: bool,
}

const fn op(mnemonic: Mnemonic, mode: AddrMode, cycles: u8, page_cross_extra: bool) -> OpcodeInfo {
    OpcodeInfo { mnemonic, mode, cycles, page_cross_extra }
}

/// Decodes a single opcode byte.
#[must_use]
#[allow(clippy::too_many_lines)]
pub fn decode(opcode: u8) -> OpcodeInfo {
    use AddrMode::{
        Absolute as ABS, AbsoluteX as ABX, AbsoluteY as ABY, Accumulator as ACC,
        Immediate as IMM, Implied as IMP, IndexedIndirect as IZX, Indirect as IND,
        IndirectIndexed as IZY, Relative as REL, ZeroPage as ZP, ZeroPageX as ZPX,
        ZeroPageY as ZPY,
    };
    use Mnemonic::*;

    match opcode {
        0x00 => op(BRK, IMP, 7, false),
        0x01 => op(ORA, IZX, 6, false),
        0x02 => op(JAM, IMP, 1, false),
        0x03 => op(SLO, IZX, 8, false),
        0x04 => op(NOP, ZP, 3, false),
        0x05 => op(ORA, ZP, 3, false),
        0x06 => op(ASL, ZP, 5, false),
        0x07 => op(SLO, ZP, 5, false),
        0x08 => op(PHP, IMP, 3, false),
        0x09 => op(ORA, IMM, 2, false),
        0x0A => op(ASL, ACC, 2, false),
        0x0B => op(ANC, IMM, 2, false),
        0x0C => op(NOP, ABS, 4, false),
        0x0D => op(ORA, ABS, 4, false),
        0x0E => op(ASL, ABS, 6, false),
        0x0F => op(SLO, ABS, 6, false),

        0x10 => op(BPL, REL, 2, false),
        0x11 => op(ORA, IZY, 5, true),
        0x12 => op(JAM, IMP, 1, false),
        0x13 => op(SLO, IZY, 8, false),
        0x14 => op(NOP, ZPX, 4, false),
        0x15 => op(ORA, ZPX, 4, false),
        0x16 => op(ASL, ZPX, 6, false),
        0x17 => op(SLO, ZPX, 6, false),
        0x18 => op(CLC, IMP, 2, false),
        0x19 => op(ORA, ABY, 4, true),
        0x1A => op(NOP, IMP, 2, false),
        0x1B => op(SLO, ABY, 7, false),
        0x1C => op(NOP, ABX, 4, true),
        0x1D => op(ORA, ABX, 4, true),
        0x1E => op(ASL, ABX, 7, false),
        0x1F => op(SLO, ABX, 7, false),

        0x20 => op(JSR, ABS, 6, false),
        0x21 => op(AND, IZX, 6, false),
        0x22 => op(JAM, IMP, 1, false),
        0x23 => op(RLA, IZX, 8, false),
        0x24 => op(BIT, ZP, 3, false),
        0x25 => op(AND, ZP, 3, false),
        0x26 => op(ROL, ZP, 5, false),
        0x27 => op(RLA, ZP, 5, false),
        0x28 => op(PLP, IMP, 4, false),
        0x29 => op(AND, IMM, 2, false),
        0x2A => op(ROL, ACC, 2, false),
        0x2B => op(ANC, IMM, 2, false),
        0x2C => op(BIT, ABS, 4, false),
        0x2D => op(AND, ABS, 4, false),
        0x2E => op(ROL, ABS, 6, false),
        0x2F => op(RLA, ABS, 6, false),

        0x30 => op(BMI, REL, 2, false),
        0x31 => op(AND, IZY, 5, true),
        0x32 => op(JAM, IMP, 1, false),
        0x33 => op(RLA, IZY, 8, false),
        0x34 => op(NOP, ZPX, 4, false),
        0x35 => op(AND, ZPX, 4, false),
        0x36 => op(ROL, ZPX, 6, false),
        0x37 => op(RLA, ZPX, 6, false),
        0x38 => op(SEC, IMP, 2, false),
        0x39 => op(AND, ABY, 4, true),
        0x3A => op(NOP, IMP, 2, false),
        0x3B => op(RLA, ABY, 7, false),
        0x3C => op(NOP, ABX, 4, true),
        0x3D => op(AND, ABX, 4, true),
        0x3E => op(ROL, ABX, 7, false),
        0x3F => op(RLA, ABX, 7, false),

        0x40 => op(RTI, IMP, 6, false),
        0x41 => op(EOR, IZX, 6, false),
        0x42 => op(JAM, IMP, 1, false),
        0x43 => op(SRE, IZX, 8, false),
        0x44 => op(NOP, ZP, 3, false),
        0x45 => op(EOR, ZP, 3, false),
        0x46 => op(LSR, ZP, 5, false),
        0x47 => op(SRE, ZP, 5, false),
        0x48 => op(PHA, IMP, 3, false),
        0x49 => op(EOR, IMM, 2, false),
        0x4A => op(LSR, ACC, 2, false),
        0x4B => op(ALR, IMM, 2, false),
        0x4C => op(JMP, ABS, 3, false),
        0x4D => op(EOR, ABS, 4, false),
        0x4E => op(LSR, ABS, 6, false),
        0x4F => op(SRE, ABS, 6, false),

        0x50 => op(BVC, REL, 2, false),
        0x51 => op(EOR, IZY, 5, true),
        0x52 => op(JAM, IMP, 1, false),
        0x53 => op(SRE, IZY, 8, false),
        0x54 => op(NOP, ZPX, 4, false),
        0x55 => op(EOR, ZPX, 4, false),
        0x56 => op(LSR, ZPX, 6, false),
        0x57 => op(SRE, ZPX, 6, false),
        0x58 => op(CLI, IMP, 2, false),
        0x59 => op(EOR, ABY, 4, true),
        0x5A => op(NOP, IMP, 2, false),
        0x5B => op(SRE, ABY, 7, false),
        0x5C => op(NOP, ABX, 4, true),
        0x5D => op(EOR, ABX, 4, true),
        0x5E => op(LSR, ABX, 7, false),
        0x5F => op(SRE, ABX, 7, false),

        0x60 => op(RTS, IMP, 6, false),
        0x61 => op(ADC, IZX, 6, false),
        0x62 => op(JAM, IMP, 1, false),
        0x63 => op(RRA, IZX, 8, false),
        0x64 => op(NOP, ZP, 3, false),
        0x65 => op(ADC, ZP, 3, false),
        0x66 => op(ROR, ZP, 5, false),
        0x67 => op(RRA, ZP, 5, false),
        0x68 => op(PLA, IMP, 4, false),
        0x69 => op(ADC, IMM, 2, false),
        0x6A => op(ROR, ACC, 2, false),
        0x6B => op(ARR, IMM, 2, false),
        0x6C => op(JMP, IND, 5, false),
        0x6D => op(ADC, ABS, 4, false),
        0x6E => op(ROR, ABS, 6, false),
        0x6F => op(RRA, ABS, 6, false),

        0x70 => op(BVS, REL, 2, false),
        0x71 => op(ADC, IZY, 5, true),
        0x72 => op(JAM, IMP, 1, false),
        0x73 => op(RRA, IZY, 8, false),
        0x74 => op(NOP, ZPX, 4, false),
        0x75 => op(ADC, ZPX, 4, false),
        0x76 => op(ROR, ZPX, 6, false),
        0x77 => op(RRA, ZPX, 6, false),
        0x78 => op(SEI, IMP, 2, false),
        0x79 => op(ADC, ABY, 4, true),
        0x7A => op(NOP, IMP, 2, false),
        0x7B => op(RRA, ABY, 7, false),
        0x7C => op(NOP, ABX, 4, true),
        0x7D => op(ADC, ABX, 4, true),
        0x7E => op(ROR, ABX, 7, false),
        0x7F => op(RRA, ABX, 7, false),

        0x80 => op(NOP, IMM, 2, false),
        0x81 => op(STA, IZX, 6, false),
        0x82 => op(NOP, IMM, 2, false),
        0x83 => op(SAX, IZX, 6, false),
        0x84 => op(STY, ZP, 3, false),
        0x85 => op(STA, ZP, 3, false),
        0x86 => op(STX, ZP, 3, false),
        0x87 => op(SAX, ZP, 3, false),
        0x88 => op(DEY, IMP, 2, false),
        0x89 => op(NOP, IMM, 2, false),
        0x8A => op(TXA, IMP, 2, false),
        0x8B => op(ANE, IMM, 2, false),
        0x8C => op(STY, ABS, 4, false),
        0x8D => op(STA, ABS, 4, false),
        0x8E => op(STX, ABS, 4, false),
        0x8F => op(SAX, ABS, 4, false),

        0x90 => op(BCC, REL, 2, false),
        0x91 => op(STA, IZY, 6, false),
        0x92 => op(JAM, IMP, 1, false),
        0x93 => op(SHA, IZY, 6, false),
        0x94 => op(STY, ZPX, 4, false),
        0x95 => op(STA, ZPX, 4, false),
        0x96 => op(STX, ZPY, 4, false),
        0x97 => op(SAX, ZPY, 4, false),
        0x98 => op(TYA, IMP, 2, false),
        0x99 => op(STA, ABY, 5, false),
        0x9A => op(TXS, IMP, 2, false),
        0x9B => op(TAS, ABY, 5, false),
        0x9C => op(SHY, ABX, 5, false),
        0x9D => op(STA, ABX, 5, false),
        0x9E => op(SHX, ABY, 5, false),
        0x9F => op(SHA, ABY, 5, false),

        0xA0 => op(LDY, IMM, 2, false),
        0xA1 => op(LDA, IZX, 6, false),
        0xA2 => op(LDX, IMM, 2, false),
        0xA3 => op(LAX, IZX, 6, false),
        0xA4 => op(LDY, ZP, 3, false),
        0xA5 => op(LDA, ZP, 3, false),
        0xA6 => op(LDX, ZP, 3, false),
        0xA7 => op(LAX, ZP, 3, false),
        0xA8 => op(TAY, IMP, 2, false),
        0xA9 => op(LDA, IMM, 2, false),
        0xAA => op(TAX, IMP, 2, false),
        0xAB => op(LXA, IMM, 2, false),
        0xAC => op(LDY, ABS, 4, false),
        0xAD => op(LDA, ABS, 4, false),
        0xAE => op(LDX, ABS, 4, false),
        0xAF => op(LAX, ABS, 4, false),

        0xB0 => op(BCS, REL, 2, false),
        0xB1 => op(LDA, IZY, 5, true),
        0xB2 => op(JAM, IMP, 1, false),
        0xB3 => op(LAX, IZY, 5, true),
        0xB4 => op(LDY, ZPX, 4, false),
        0xB5 => op(LDA, ZPX, 4, false),
        0xB6 => op(LDX, ZPY, 4, false),
        0xB7 => op(LAX, ZPY, 4, false),
        0xB8 => op(CLV, IMP, 2, false),
        0xB9 => op(LDA, ABY, 4, true),
        0xBA => op(TSX, IMP, 2, false),
        0xBB => op(LAS, ABY, 4, true),
        0xBC => op(LDY, ABX, 4, true),
        0xBD => op(LDA, ABX, 4, true),
        0xBE => op(LDX, ABY, 4, true),
        0xBF => op(LAX, ABY, 4, true),

        0xC0 => op(CPY, IMM, 2, false),
        0xC1 => op(CMP, IZX, 6, false),
        0xC2 => op(NOP, IMM, 2, false),
        0xC3 => op(DCP, IZX, 8, false),
        0xC4 => op(CPY, ZP, 3, false),
        0xC5 => op(CMP, ZP, 3, false),
        0xC6 => op(DEC, ZP, 5, false),
        0xC7 => op(DCP, ZP, 5, false),
        0xC8 => op(INY, IMP, 2, false),
        0xC9 => op(CMP, IMM, 2, false),
        0xCA => op(DEX, IMP, 2, false),
        0xCB => op(SBX, IMM, 2, false),
        0xCC => op(CPY, ABS, 4, false),
        0xCD => op(CMP, ABS, 4, false),
        0xCE => op(DEC, ABS, 6, false),
        0xCF => op(DCP, ABS, 6, false),

        0xD0 => op(BNE, REL, 2, false),
        0xD1 => op(CMP, IZY, 5, true),
        0xD2 => op(JAM, IMP, 1, false),
        0xD3 => op(DCP, IZY, 8, false),
        0xD4 => op(NOP, ZPX, 4, false),
        0xD5 => op(CMP, ZPX, 4, false),
        0xD6 => op(DEC, ZPX, 6, false),
        0xD7 => op(DCP, ZPX, 6, false),
        0xD8 => op(CLD, IMP, 2, false),
        0xD9 => op(CMP, ABY, 4, true),
        0xDA => op(NOP, IMP, 2, false),
        0xDB => op(DCP, ABY, 7, false),
        0xDC => op(NOP, ABX, 4, true),
        0xDD => op(CMP, ABX, 4, true),
        0xDE => op(DEC, ABX, 7, false),
        0xDF => op(DCP, ABX, 7, false),

        0xE0 => op(CPX, IMM, 2, false),
        0xE1 => op(SBC, IZX, 6, false),
        0xE2 => op(NOP, IMM, 2, false),
        0xE3 => op(ISC, IZX, 8, false),
        0xE4 => op(CPX, ZP, 3, false),
        0xE5 => op(SBC, ZP, 3, false),
        0xE6 => op(INC, ZP, 5, false),
        0xE7 => op(ISC, ZP, 5, false),
        0xE8 => op(INX, IMP, 2, false),
        0xE9 => op(SBC, IMM, 2, false),
        0xEA => op(NOP, IMP, 2, false),
        0xEB => op(SBC, IMM, 2, false),
        0xEC => op(CPX, ABS, 4, false),
        0xED => op(SBC, ABS, 4, false),
        0xEE => op(INC, ABS, 6, false),
        0xEF => op(ISC, ABS, 6, false),

        0xF0 => op(BEQ, REL, 2, false),
        0xF1 => op(SBC, IZY, 5, true),
        0xF2 => op(JAM, IMP, 1, false),
        0xF3 => op(ISC, IZY, 8, false),
        0xF4 => op(NOP, ZPX, 4, false),
        0xF5 => op(SBC, ZPX, 4, false),
        0xF6 => op(INC, ZPX, 6, false),
        0xF7 => op(ISC, ZPX, 6, false),
        0xF8 => op(SED, IMP, 2, false),
        0xF9 => op(SBC, ABY, 4, true),
        0xFA => op(NOP, IMP, 2, false),
        0xFB => op(ISC, ABY, 7, false),
        0xFC => op(NOP, ABX, 4, true),
        0xFD => op(SBC, ABX, 4, true),
        0xFE => op(INC, ABX, 7, false),
        0xFF => op(ISC, ABX, 7, false),
    }
}
