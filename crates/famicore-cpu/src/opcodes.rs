//! Opcode decode table.
//!
//! A fixed 256-entry table maps every opcode byte (official and unofficial)
//! to its mnemonic, addressing mode, base cycle count and page-cross penalty
//! eligibility. The table is built at compile time; execution dispatches with
//! a `match` over [`Mnemonic`], so there are no indirect calls.

use crate::addressing::AddrMode;
use crate::addressing::AddrMode::{Abs, Abx, Aby, Acc, Idx, Idy, Imm, Imp, Ind, Rel, Zp0, Zpx, Zpy};

/// Instruction mnemonics, official and unofficial.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)] // The 6502 reference names these; per-variant docs add nothing.
pub enum Mnemonic {
    // Official
    Adc, And, Asl, Bcc, Bcs, Beq, Bit, Bmi, Bne, Bpl, Brk, Bvc, Bvs, Clc,
    Cld, Cli, Clv, Cmp, Cpx, Cpy, Dec, Dex, Dey, Eor, Inc, Inx, Iny, Jmp,
    Jsr, Lda, Ldx, Ldy, Lsr, Nop, Ora, Pha, Php, Pla, Plp, Rol, Ror, Rti,
    Rts, Sbc, Sec, Sed, Sei, Sta, Stx, Sty, Tax, Tay, Tsx, Txa, Txs, Tya,
    // Unofficial
    Ahx, Alr, Anc, Arr, Axs, Dcp, Isc, Kil, Las, Lax, Rla, Rra, Sax, Shx,
    Shy, Slo, Sre, Tas, Xaa,
}

use Mnemonic::*;

/// Decoded opcode entry.
#[derive(Debug, Clone, Copy)]
pub struct OpcodeInfo {
    /// Instruction mnemonic.
    pub mnemonic: Mnemonic,
    /// Addressing mode.
    pub mode: AddrMode,
    /// Base cycle count.
    pub cycles: u8,
    /// Whether an extra cycle is charged when the effective address crosses
    /// a page (read-class indexed instructions only).
    pub page_cross: bool,
}

const fn op(mnemonic: Mnemonic, mode: AddrMode, cycles: u8, page_cross: bool) -> OpcodeInfo {
    OpcodeInfo {
        mnemonic,
        mode,
        cycles,
        page_cross,
    }
}

/// Complete 256-entry opcode table, indexed by opcode byte.
#[rustfmt::skip]
pub const OPCODE_TABLE: [OpcodeInfo; 256] = [
    // 0x00-0x0F
    op(Brk, Imp, 7, false), op(Ora, Idx, 6, false), op(Kil, Imp, 2, false), op(Slo, Idx, 8, false),
    op(Nop, Zp0, 3, false), op(Ora, Zp0, 3, false), op(Asl, Zp0, 5, false), op(Slo, Zp0, 5, false),
    op(Php, Imp, 3, false), op(Ora, Imm, 2, false), op(Asl, Acc, 2, false), op(Anc, Imm, 2, false),
    op(Nop, Abs, 4, false), op(Ora, Abs, 4, false), op(Asl, Abs, 6, false), op(Slo, Abs, 6, false),
    // 0x10-0x1F
    op(Bpl, Rel, 2, false), op(Ora, Idy, 5, true),  op(Kil, Imp, 2, false), op(Slo, Idy, 8, false),
    op(Nop, Zpx, 4, false), op(Ora, Zpx, 4, false), op(Asl, Zpx, 6, false), op(Slo, Zpx, 6, false),
    op(Clc, Imp, 2, false), op(Ora, Aby, 4, true),  op(Nop, Imp, 2, false), op(Slo, Aby, 7, false),
    op(Nop, Abx, 4, true),  op(Ora, Abx, 4, true),  op(Asl, Abx, 7, false), op(Slo, Abx, 7, false),
    // 0x20-0x2F
    op(Jsr, Abs, 6, false), op(And, Idx, 6, false), op(Kil, Imp, 2, false), op(Rla, Idx, 8, false),
    op(Bit, Zp0, 3, false), op(And, Zp0, 3, false), op(Rol, Zp0, 5, false), op(Rla, Zp0, 5, false),
    op(Plp, Imp, 4, false), op(And, Imm, 2, false), op(Rol, Acc, 2, false), op(Anc, Imm, 2, false),
    op(Bit, Abs, 4, false), op(And, Abs, 4, false), op(Rol, Abs, 6, false), op(Rla, Abs, 6, false),
    // 0x30-0x3F
    op(Bmi, Rel, 2, false), op(And, Idy, 5, true),  op(Kil, Imp, 2, false), op(Rla, Idy, 8, false),
    op(Nop, Zpx, 4, false), op(And, Zpx, 4, false), op(Rol, Zpx, 6, false), op(Rla, Zpx, 6, false),
    op(Sec, Imp, 2, false), op(And, Aby, 4, true),  op(Nop, Imp, 2, false), op(Rla, Aby, 7, false),
    op(Nop, Abx, 4, true),  op(And, Abx, 4, true),  op(Rol, Abx, 7, false), op(Rla, Abx, 7, false),
    // 0x40-0x4F
    op(Rti, Imp, 6, false), op(Eor, Idx, 6, false), op(Kil, Imp, 2, false), op(Sre, Idx, 8, false),
    op(Nop, Zp0, 3, false), op(Eor, Zp0, 3, false), op(Lsr, Zp0, 5, false), op(Sre, Zp0, 5, false),
    op(Pha, Imp, 3, false), op(Eor, Imm, 2, false), op(Lsr, Acc, 2, false), op(Alr, Imm, 2, false),
    op(Jmp, Abs, 3, false), op(Eor, Abs, 4, false), op(Lsr, Abs, 6, false), op(Sre, Abs, 6, false),
    // 0x50-0x5F
    op(Bvc, Rel, 2, false), op(Eor, Idy, 5, true),  op(Kil, Imp, 2, false), op(Sre, Idy, 8, false),
    op(Nop, Zpx, 4, false), op(Eor, Zpx, 4, false), op(Lsr, Zpx, 6, false), op(Sre, Zpx, 6, false),
    op(Cli, Imp, 2, false), op(Eor, Aby, 4, true),  op(Nop, Imp, 2, false), op(Sre, Aby, 7, false),
    op(Nop, Abx, 4, true),  op(Eor, Abx, 4, true),  op(Lsr, Abx, 7, false), op(Sre, Abx, 7, false),
    // 0x60-0x6F
    op(Rts, Imp, 6, false), op(Adc, Idx, 6, false), op(Kil, Imp, 2, false), op(Rra, Idx, 8, false),
    op(Nop, Zp0, 3, false), op(Adc, Zp0, 3, false), op(Ror, Zp0, 5, false), op(Rra, Zp0, 5, false),
    op(Pla, Imp, 4, false), op(Adc, Imm, 2, false), op(Ror, Acc, 2, false), op(Arr, Imm, 2, false),
    op(Jmp, Ind, 5, false), op(Adc, Abs, 4, false), op(Ror, Abs, 6, false), op(Rra, Abs, 6, false),
    // 0x70-0x7F
    op(Bvs, Rel, 2, false), op(Adc, Idy, 5, true),  op(Kil, Imp, 2, false), op(Rra, Idy, 8, false),
    op(Nop, Zpx, 4, false), op(Adc, Zpx, 4, false), op(Ror, Zpx, 6, false), op(Rra, Zpx, 6, false),
    op(Sei, Imp, 2, false), op(Adc, Aby, 4, true),  op(Nop, Imp, 2, false), op(Rra, Aby, 7, false),
    op(Nop, Abx, 4, true),  op(Adc, Abx, 4, true),  op(Ror, Abx, 7, false), op(Rra, Abx, 7, false),
    // 0x80-0x8F
    op(Nop, Imm, 2, false), op(Sta, Idx, 6, false), op(Nop, Imm, 2, false), op(Sax, Idx, 6, false),
    op(Sty, Zp0, 3, false), op(Sta, Zp0, 3, false), op(Stx, Zp0, 3, false), op(Sax, Zp0, 3, false),
    op(Dey, Imp, 2, false), op(Nop, Imm, 2, false), op(Txa, Imp, 2, false), op(Xaa, Imm, 2, false),
    op(Sty, Abs, 4, false), op(Sta, Abs, 4, false), op(Stx, Abs, 4, false), op(Sax, Abs, 4, false),
    // 0x90-0x9F
    op(Bcc, Rel, 2, false), op(Sta, Idy, 6, false), op(Kil, Imp, 2, false), op(Ahx, Idy, 6, false),
    op(Sty, Zpx, 4, false), op(Sta, Zpx, 4, false), op(Stx, Zpy, 4, false), op(Sax, Zpy, 4, false),
    op(Tya, Imp, 2, false), op(Sta, Aby, 5, false), op(Txs, Imp, 2, false), op(Tas, Aby, 5, false),
    op(Shy, Abx, 5, false), op(Sta, Abx, 5, false), op(Shx, Aby, 5, false), op(Ahx, Aby, 5, false),
    // 0xA0-0xAF
    op(Ldy, Imm, 2, false), op(Lda, Idx, 6, false), op(Ldx, Imm, 2, false), op(Lax, Idx, 6, false),
    op(Ldy, Zp0, 3, false), op(Lda, Zp0, 3, false), op(Ldx, Zp0, 3, false), op(Lax, Zp0, 3, false),
    op(Tay, Imp, 2, false), op(Lda, Imm, 2, false), op(Tax, Imp, 2, false), op(Lax, Imm, 2, false),
    op(Ldy, Abs, 4, false), op(Lda, Abs, 4, false), op(Ldx, Abs, 4, false), op(Lax, Abs, 4, false),
    // 0xB0-0xBF
    op(Bcs, Rel, 2, false), op(Lda, Idy, 5, true),  op(Kil, Imp, 2, false), op(Lax, Idy, 5, true),
    op(Ldy, Zpx, 4, false), op(Lda, Zpx, 4, false), op(Ldx, Zpy, 4, false), op(Lax, Zpy, 4, false),
    op(Clv, Imp, 2, false), op(Lda, Aby, 4, true),  op(Tsx, Imp, 2, false), op(Las, Aby, 4, true),
    op(Ldy, Abx, 4, true),  op(Lda, Abx, 4, true),  op(Ldx, Aby, 4, true),  op(Lax, Aby, 4, true),
    // 0xC0-0xCF
    op(Cpy, Imm, 2, false), op(Cmp, Idx, 6, false), op(Nop, Imm, 2, false), op(Dcp, Idx, 8, false),
    op(Cpy, Zp0, 3, false), op(Cmp, Zp0, 3, false), op(Dec, Zp0, 5, false), op(Dcp, Zp0, 5, false),
    op(Iny, Imp, 2, false), op(Cmp, Imm, 2, false), op(Dex, Imp, 2, false), op(Axs, Imm, 2, false),
    op(Cpy, Abs, 4, false), op(Cmp, Abs, 4, false), op(Dec, Abs, 6, false), op(Dcp, Abs, 6, false),
    // 0xD0-0xDF
    op(Bne, Rel, 2, false), op(Cmp, Idy, 5, true),  op(Kil, Imp, 2, false), op(Dcp, Idy, 8, false),
    op(Nop, Zpx, 4, false), op(Cmp, Zpx, 4, false), op(Dec, Zpx, 6, false), op(Dcp, Zpx, 6, false),
    op(Cld, Imp, 2, false), op(Cmp, Aby, 4, true),  op(Nop, Imp, 2, false), op(Dcp, Aby, 7, false),
    op(Nop, Abx, 4, true),  op(Cmp, Abx, 4, true),  op(Dec, Abx, 7, false), op(Dcp, Abx, 7, false),
    // 0xE0-0xEF
    op(Cpx, Imm, 2, false), op(Sbc, Idx, 6, false), op(Nop, Imm, 2, false), op(Isc, Idx, 8, false),
    op(Cpx, Zp0, 3, false), op(Sbc, Zp0, 3, false), op(Inc, Zp0, 5, false), op(Isc, Zp0, 5, false),
    op(Inx, Imp, 2, false), op(Sbc, Imm, 2, false), op(Nop, Imp, 2, false), op(Sbc, Imm, 2, false),
    op(Cpx, Abs, 4, false), op(Sbc, Abs, 4, false), op(Inc, Abs, 6, false), op(Isc, Abs, 6, false),
    // 0xF0-0xFF
    op(Beq, Rel, 2, false), op(Sbc, Idy, 5, true),  op(Kil, Imp, 2, false), op(Isc, Idy, 8, false),
    op(Nop, Zpx, 4, false), op(Sbc, Zpx, 4, false), op(Inc, Zpx, 6, false), op(Isc, Zpx, 6, false),
    op(Sed, Imp, 2, false), op(Sbc, Aby, 4, true),  op(Nop, Imp, 2, false), op(Isc, Aby, 7, false),
    op(Nop, Abx, 4, true),  op(Sbc, Abx, 4, true),  op(Inc, Abx, 7, false), op(Isc, Abx, 7, false),
];
