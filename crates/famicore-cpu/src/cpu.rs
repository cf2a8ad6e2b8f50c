//! 6502 CPU core.
//!
//! Instructions execute atomically: [`Cpu::step`] fetches, decodes and runs
//! one instruction and returns the cycles it consumed (base cycles, plus the
//! page-cross penalty for eligible read instructions, plus branch penalties).
//! Interrupts are polled before the opcode fetch; NMI outranks IRQ, and IRQ
//! is masked by the I flag. DMA stalls and the KIL-halted state each consume
//! one idle cycle per step.

use crate::addressing::AddrMode;
use crate::bus::Bus;
use crate::opcodes::{Mnemonic, OPCODE_TABLE};
use crate::status::Status;
use crate::vectors;

/// MOS 6502 CPU (NES variant, decimal mode absent).
#[derive(Debug)]
#[allow(clippy::struct_excessive_bools)] // Interrupt latches are just bits.
pub struct Cpu {
    /// Accumulator.
    pub a: u8,
    /// X index register.
    pub x: u8,
    /// Y index register.
    pub y: u8,
    /// Stack pointer (stack lives in page $0100).
    pub sp: u8,
    /// Program counter.
    pub pc: u16,
    /// Status register.
    pub status: Status,
    /// Cumulative cycle counter.
    pub cycles: u64,

    /// Remaining DMA stall cycles.
    stall: u32,
    /// Halted by a KIL opcode.
    halted: bool,
    /// Pending NMI latch.
    nmi_pending: bool,
    /// Pending IRQ latch, re-armed by the bus while the line is held.
    irq_pending: bool,

    // Per-instruction addressing scratch.
    mode: AddrMode,
    addr_abs: u16,
    addr_base: u16,
    addr_rel: i8,
    page_crossed: bool,
}

impl Cpu {
    /// Create a CPU in its power-on state. The program counter is loaded by
    /// [`Cpu::reset`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            a: 0,
            x: 0,
            y: 0,
            sp: 0xFD,
            pc: 0,
            status: Status::POWER_ON,
            cycles: 0,
            stall: 0,
            halted: false,
            nmi_pending: false,
            irq_pending: false,
            mode: AddrMode::Imp,
            addr_abs: 0,
            addr_base: 0,
            addr_rel: 0,
            page_crossed: false,
        }
    }

    /// Reset: registers cleared, I set, PC loaded from the reset vector.
    /// The reset sequence charges 7 cycles.
    pub fn reset(&mut self, bus: &mut impl Bus) {
        self.a = 0;
        self.x = 0;
        self.y = 0;
        self.sp = 0xFD;
        self.status = Status::POWER_ON;
        self.stall = 0;
        self.halted = false;
        self.nmi_pending = false;
        self.irq_pending = false;
        self.addr_abs = 0;
        self.addr_base = 0;
        self.addr_rel = 0;
        self.page_crossed = false;
        self.pc = bus.read_u16(vectors::RESET);
        self.cycles = 7;
    }

    /// Latch a pending NMI, serviced at the next instruction boundary.
    pub fn request_nmi(&mut self) {
        self.nmi_pending = true;
    }

    /// Latch a pending IRQ. The latch is cleared every step, so a held line
    /// must be re-asserted by the bus after each instruction.
    pub fn request_irq(&mut self) {
        self.irq_pending = true;
    }

    /// Add DMA stall cycles; the CPU idles one cycle per step until drained.
    pub fn add_stall(&mut self, cycles: u32) {
        self.stall += cycles;
    }

    /// Whether a KIL opcode has halted the CPU.
    #[must_use]
    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// Execute one instruction (or one stall/halt idle cycle) and return the
    /// cycles consumed.
    pub fn step(&mut self, bus: &mut impl Bus) -> u8 {
        if self.halted {
            self.cycles += 1;
            return 1;
        }

        if self.stall > 0 {
            self.stall -= 1;
            self.cycles += 1;
            return 1;
        }

        if self.nmi_pending {
            self.nmi_pending = false;
            let cycles = self.interrupt(bus, vectors::NMI, false);
            self.cycles += u64::from(cycles);
            return cycles;
        }

        if self.irq_pending {
            self.irq_pending = false;
            if !self.status.contains(Status::I) {
                let cycles = self.interrupt(bus, vectors::IRQ, false);
                self.cycles += u64::from(cycles);
                return cycles;
            }
        }

        let opcode = bus.read(self.pc);
        self.pc = self.pc.wrapping_add(1);

        let info = OPCODE_TABLE[opcode as usize];
        self.mode = info.mode;
        self.page_crossed = false;
        self.resolve_operand(bus);

        let extra = self.execute(info.mnemonic, bus);
        let penalty = u8::from(info.page_cross && self.page_crossed);
        let cycles = info.cycles + extra + penalty;
        self.cycles += u64::from(cycles);
        cycles
    }

    /// Service an interrupt: push PC and status, set I, load the vector.
    fn interrupt(&mut self, bus: &mut impl Bus, vector: u16, brk: bool) -> u8 {
        self.push(bus, (self.pc >> 8) as u8);
        self.push(bus, self.pc as u8);
        self.push(bus, self.status.to_stack_byte(brk));
        self.status.insert(Status::I);
        self.pc = bus.read_u16(vector);
        7
    }

    // ---------------------------------------------------------------------
    // Stack and operand helpers
    // ---------------------------------------------------------------------

    fn push(&mut self, bus: &mut impl Bus, value: u8) {
        bus.write(0x0100 + u16::from(self.sp), value);
        self.sp = self.sp.wrapping_sub(1);
    }

    fn pull(&mut self, bus: &mut impl Bus) -> u8 {
        self.sp = self.sp.wrapping_add(1);
        bus.read(0x0100 + u16::from(self.sp))
    }

    /// Resolve the effective address for the current addressing mode,
    /// consuming operand bytes and recording page crossings.
    fn resolve_operand(&mut self, bus: &mut impl Bus) {
        match self.mode {
            AddrMode::Imp | AddrMode::Acc => {}
            AddrMode::Imm => {
                self.addr_abs = self.pc;
                self.pc = self.pc.wrapping_add(1);
            }
            AddrMode::Zp0 => {
                self.addr_abs = u16::from(bus.read(self.pc));
                self.pc = self.pc.wrapping_add(1);
            }
            AddrMode::Zpx => {
                self.addr_abs = u16::from(bus.read(self.pc).wrapping_add(self.x));
                self.pc = self.pc.wrapping_add(1);
            }
            AddrMode::Zpy => {
                self.addr_abs = u16::from(bus.read(self.pc).wrapping_add(self.y));
                self.pc = self.pc.wrapping_add(1);
            }
            AddrMode::Rel => {
                self.addr_rel = bus.read(self.pc) as i8;
                self.pc = self.pc.wrapping_add(1);
            }
            AddrMode::Abs => {
                self.addr_base = bus.read_u16(self.pc);
                self.addr_abs = self.addr_base;
                self.pc = self.pc.wrapping_add(2);
            }
            AddrMode::Abx => {
                self.addr_base = bus.read_u16(self.pc);
                self.addr_abs = self.addr_base.wrapping_add(u16::from(self.x));
                self.page_crossed = (self.addr_abs & 0xFF00) != (self.addr_base & 0xFF00);
                self.pc = self.pc.wrapping_add(2);
            }
            AddrMode::Aby => {
                self.addr_base = bus.read_u16(self.pc);
                self.addr_abs = self.addr_base.wrapping_add(u16::from(self.y));
                self.page_crossed = (self.addr_abs & 0xFF00) != (self.addr_base & 0xFF00);
                self.pc = self.pc.wrapping_add(2);
            }
            AddrMode::Ind => {
                let ptr = bus.read_u16(self.pc);
                self.pc = self.pc.wrapping_add(2);
                let lo = bus.read(ptr);
                // The 6502 fetches the high byte from $xx00 when the pointer
                // sits at the end of a page.
                let hi = if ptr & 0x00FF == 0x00FF {
                    bus.read(ptr & 0xFF00)
                } else {
                    bus.read(ptr.wrapping_add(1))
                };
                self.addr_abs = u16::from_le_bytes([lo, hi]);
            }
            AddrMode::Idx => {
                let zp = bus.read(self.pc).wrapping_add(self.x);
                self.pc = self.pc.wrapping_add(1);
                let lo = bus.read(u16::from(zp));
                let hi = bus.read(u16::from(zp.wrapping_add(1)));
                self.addr_abs = u16::from_le_bytes([lo, hi]);
            }
            AddrMode::Idy => {
                let zp = bus.read(self.pc);
                self.pc = self.pc.wrapping_add(1);
                let lo = bus.read(u16::from(zp));
                let hi = bus.read(u16::from(zp.wrapping_add(1)));
                self.addr_base = u16::from_le_bytes([lo, hi]);
                self.addr_abs = self.addr_base.wrapping_add(u16::from(self.y));
                self.page_crossed = (self.addr_abs & 0xFF00) != (self.addr_base & 0xFF00);
            }
        }
    }

    /// Fetch the operand byte for the current addressing mode.
    fn fetch(&mut self, bus: &mut impl Bus) -> u8 {
        match self.mode {
            AddrMode::Imp | AddrMode::Acc => self.a,
            _ => bus.read(self.addr_abs),
        }
    }

    // ---------------------------------------------------------------------
    // Shared operation bodies
    // ---------------------------------------------------------------------

    fn adc_value(&mut self, value: u8) {
        let sum = u16::from(self.a) + u16::from(value) + u16::from(self.status.contains(Status::C));
        self.status.set_flag(Status::C, sum > 0xFF);
        let result = sum as u8;
        let overflow = (!(self.a ^ value) & (self.a ^ result)) & 0x80 != 0;
        self.status.set_flag(Status::V, overflow);
        self.a = result;
        self.status.set_zn(self.a);
    }

    fn sbc_value(&mut self, value: u8) {
        // SBC is ADC of the operand's one's complement.
        self.adc_value(!value);
    }

    fn compare(&mut self, register: u8, value: u8) {
        self.status.set_flag(Status::C, register >= value);
        self.status.set_zn(register.wrapping_sub(value));
    }

    fn branch(&mut self, condition: bool) -> u8 {
        if !condition {
            return 0;
        }
        let old_pc = self.pc;
        self.pc = old_pc.wrapping_add(self.addr_rel as u16);
        if (old_pc & 0xFF00) == (self.pc & 0xFF00) {
            1
        } else {
            2
        }
    }

    fn asl_value(&mut self, value: u8) -> u8 {
        self.status.set_flag(Status::C, value & 0x80 != 0);
        let result = value << 1;
        self.status.set_zn(result);
        result
    }

    fn lsr_value(&mut self, value: u8) -> u8 {
        self.status.set_flag(Status::C, value & 0x01 != 0);
        let result = value >> 1;
        self.status.set_zn(result);
        result
    }

    fn rol_value(&mut self, value: u8) -> u8 {
        let carry_in = u8::from(self.status.contains(Status::C));
        self.status.set_flag(Status::C, value & 0x80 != 0);
        let result = (value << 1) | carry_in;
        self.status.set_zn(result);
        result
    }

    fn ror_value(&mut self, value: u8) -> u8 {
        let carry_in = u8::from(self.status.contains(Status::C));
        self.status.set_flag(Status::C, value & 0x01 != 0);
        let result = (carry_in << 7) | (value >> 1);
        self.status.set_zn(result);
        result
    }

    /// Apply a shift/rotate either to A or to memory, per the current mode.
    fn read_modify_write(&mut self, bus: &mut impl Bus, f: fn(&mut Self, u8) -> u8) {
        if self.mode == AddrMode::Acc {
            self.a = f(self, self.a);
        } else {
            let value = bus.read(self.addr_abs);
            let result = f(self, value);
            bus.write(self.addr_abs, result);
        }
    }

    /// Un-carried address used by the unstable high-byte stores: on an index
    /// carry the write lands in the base page instead.
    fn unstable_addr(&self, collapse: bool) -> u16 {
        if collapse {
            (self.addr_base & 0xFF00) | (self.addr_abs & 0x00FF)
        } else {
            self.addr_abs
        }
    }

    fn high_byte_plus_one(&self) -> u8 {
        ((self.addr_base >> 8) as u8).wrapping_add(1)
    }

    // ---------------------------------------------------------------------
    // Dispatch
    // ---------------------------------------------------------------------

    /// Execute the decoded operation; returns extra cycles (branches only).
    #[allow(clippy::too_many_lines)] // One arm per mnemonic; splitting obscures the map.
    fn execute(&mut self, mnemonic: Mnemonic, bus: &mut impl Bus) -> u8 {
        match mnemonic {
            // Loads and stores
            Mnemonic::Lda => {
                self.a = self.fetch(bus);
                self.status.set_zn(self.a);
            }
            Mnemonic::Ldx => {
                self.x = self.fetch(bus);
                self.status.set_zn(self.x);
            }
            Mnemonic::Ldy => {
                self.y = self.fetch(bus);
                self.status.set_zn(self.y);
            }
            Mnemonic::Sta => bus.write(self.addr_abs, self.a),
            Mnemonic::Stx => bus.write(self.addr_abs, self.x),
            Mnemonic::Sty => bus.write(self.addr_abs, self.y),

            // Arithmetic and logic
            Mnemonic::Adc => {
                let value = self.fetch(bus);
                self.adc_value(value);
            }
            Mnemonic::Sbc => {
                let value = self.fetch(bus);
                self.sbc_value(value);
            }
            Mnemonic::And => {
                self.a &= self.fetch(bus);
                self.status.set_zn(self.a);
            }
            Mnemonic::Ora => {
                self.a |= self.fetch(bus);
                self.status.set_zn(self.a);
            }
            Mnemonic::Eor => {
                self.a ^= self.fetch(bus);
                self.status.set_zn(self.a);
            }
            Mnemonic::Cmp => {
                let value = self.fetch(bus);
                self.compare(self.a, value);
            }
            Mnemonic::Cpx => {
                let value = self.fetch(bus);
                self.compare(self.x, value);
            }
            Mnemonic::Cpy => {
                let value = self.fetch(bus);
                self.compare(self.y, value);
            }
            Mnemonic::Bit => {
                let value = self.fetch(bus);
                self.status.set_flag(Status::Z, self.a & value == 0);
                self.status.set_flag(Status::N, value & 0x80 != 0);
                self.status.set_flag(Status::V, value & 0x40 != 0);
            }

            // Shifts and rotates
            Mnemonic::Asl => self.read_modify_write(bus, Self::asl_value),
            Mnemonic::Lsr => self.read_modify_write(bus, Self::lsr_value),
            Mnemonic::Rol => self.read_modify_write(bus, Self::rol_value),
            Mnemonic::Ror => self.read_modify_write(bus, Self::ror_value),

            // Increments and decrements
            Mnemonic::Inc => {
                let value = bus.read(self.addr_abs).wrapping_add(1);
                bus.write(self.addr_abs, value);
                self.status.set_zn(value);
            }
            Mnemonic::Dec => {
                let value = bus.read(self.addr_abs).wrapping_sub(1);
                bus.write(self.addr_abs, value);
                self.status.set_zn(value);
            }
            Mnemonic::Inx => {
                self.x = self.x.wrapping_add(1);
                self.status.set_zn(self.x);
            }
            Mnemonic::Iny => {
                self.y = self.y.wrapping_add(1);
                self.status.set_zn(self.y);
            }
            Mnemonic::Dex => {
                self.x = self.x.wrapping_sub(1);
                self.status.set_zn(self.x);
            }
            Mnemonic::Dey => {
                self.y = self.y.wrapping_sub(1);
                self.status.set_zn(self.y);
            }

            // Register transfers
            Mnemonic::Tax => {
                self.x = self.a;
                self.status.set_zn(self.x);
            }
            Mnemonic::Tay => {
                self.y = self.a;
                self.status.set_zn(self.y);
            }
            Mnemonic::Txa => {
                self.a = self.x;
                self.status.set_zn(self.a);
            }
            Mnemonic::Tya => {
                self.a = self.y;
                self.status.set_zn(self.a);
            }
            Mnemonic::Tsx => {
                self.x = self.sp;
                self.status.set_zn(self.x);
            }
            Mnemonic::Txs => self.sp = self.x,

            // Stack
            Mnemonic::Pha => self.push(bus, self.a),
            Mnemonic::Php => self.push(bus, self.status.to_stack_byte(true)),
            Mnemonic::Pla => {
                self.a = self.pull(bus);
                self.status.set_zn(self.a);
            }
            Mnemonic::Plp => {
                let value = self.pull(bus);
                self.status = Status::from_stack_byte(value);
            }

            // Flow control
            Mnemonic::Jmp => self.pc = self.addr_abs,
            Mnemonic::Jsr => {
                let return_addr = self.pc.wrapping_sub(1);
                self.push(bus, (return_addr >> 8) as u8);
                self.push(bus, return_addr as u8);
                self.pc = self.addr_abs;
            }
            Mnemonic::Rts => {
                let lo = self.pull(bus);
                let hi = self.pull(bus);
                self.pc = u16::from_le_bytes([lo, hi]).wrapping_add(1);
            }
            Mnemonic::Rti => {
                let value = self.pull(bus);
                self.status = Status::from_stack_byte(value);
                let lo = self.pull(bus);
                let hi = self.pull(bus);
                self.pc = u16::from_le_bytes([lo, hi]);
            }
            Mnemonic::Brk => {
                self.pc = self.pc.wrapping_add(1);
                self.interrupt(bus, vectors::IRQ, true);
            }

            // Branches
            Mnemonic::Bcc => return self.branch(!self.status.contains(Status::C)),
            Mnemonic::Bcs => return self.branch(self.status.contains(Status::C)),
            Mnemonic::Beq => return self.branch(self.status.contains(Status::Z)),
            Mnemonic::Bne => return self.branch(!self.status.contains(Status::Z)),
            Mnemonic::Bmi => return self.branch(self.status.contains(Status::N)),
            Mnemonic::Bpl => return self.branch(!self.status.contains(Status::N)),
            Mnemonic::Bvs => return self.branch(self.status.contains(Status::V)),
            Mnemonic::Bvc => return self.branch(!self.status.contains(Status::V)),

            // Flag operations
            Mnemonic::Clc => self.status.remove(Status::C),
            Mnemonic::Cld => self.status.remove(Status::D),
            Mnemonic::Cli => self.status.remove(Status::I),
            Mnemonic::Clv => self.status.remove(Status::V),
            Mnemonic::Sec => self.status.insert(Status::C),
            Mnemonic::Sed => self.status.insert(Status::D),
            Mnemonic::Sei => self.status.insert(Status::I),

            Mnemonic::Nop => {}
            Mnemonic::Kil => self.halted = true,

            // Unofficial combined operations
            Mnemonic::Lax => {
                let value = self.fetch(bus);
                self.a = value;
                self.x = value;
                self.status.set_zn(value);
            }
            Mnemonic::Sax => bus.write(self.addr_abs, self.a & self.x),
            Mnemonic::Dcp => {
                let value = bus.read(self.addr_abs).wrapping_sub(1);
                bus.write(self.addr_abs, value);
                self.compare(self.a, value);
            }
            Mnemonic::Isc => {
                let value = bus.read(self.addr_abs).wrapping_add(1);
                bus.write(self.addr_abs, value);
                self.sbc_value(value);
            }
            Mnemonic::Slo => {
                let value = bus.read(self.addr_abs);
                self.status.set_flag(Status::C, value & 0x80 != 0);
                let value = value << 1;
                bus.write(self.addr_abs, value);
                self.a |= value;
                self.status.set_zn(self.a);
            }
            Mnemonic::Sre => {
                let value = bus.read(self.addr_abs);
                self.status.set_flag(Status::C, value & 0x01 != 0);
                let value = value >> 1;
                bus.write(self.addr_abs, value);
                self.a ^= value;
                self.status.set_zn(self.a);
            }
            Mnemonic::Rla => {
                let carry_in = u8::from(self.status.contains(Status::C));
                let value = bus.read(self.addr_abs);
                self.status.set_flag(Status::C, value & 0x80 != 0);
                let value = (value << 1) | carry_in;
                bus.write(self.addr_abs, value);
                self.a &= value;
                self.status.set_zn(self.a);
            }
            Mnemonic::Rra => {
                let carry_in = u8::from(self.status.contains(Status::C));
                let value = bus.read(self.addr_abs);
                self.status.set_flag(Status::C, value & 0x01 != 0);
                let value = (carry_in << 7) | (value >> 1);
                bus.write(self.addr_abs, value);
                self.adc_value(value);
            }

            // Unofficial immediate operations
            Mnemonic::Anc => {
                self.a &= self.fetch(bus);
                self.status.set_zn(self.a);
                self.status.set_flag(Status::C, self.a & 0x80 != 0);
            }
            Mnemonic::Alr => {
                self.a &= self.fetch(bus);
                self.status.set_flag(Status::C, self.a & 0x01 != 0);
                self.a >>= 1;
                self.status.set_zn(self.a);
            }
            Mnemonic::Arr => {
                self.a &= self.fetch(bus);
                let carry_in = u8::from(self.status.contains(Status::C));
                self.a = (carry_in << 7) | (self.a >> 1);
                self.status.set_zn(self.a);
                let bit5 = (self.a >> 5) & 1;
                let bit6 = (self.a >> 6) & 1;
                self.status.set_flag(Status::C, bit6 != 0);
                self.status.set_flag(Status::V, bit5 ^ bit6 != 0);
            }
            Mnemonic::Xaa => {
                self.a = self.x & self.fetch(bus);
                self.status.set_zn(self.a);
            }
            Mnemonic::Axs => {
                let value = self.fetch(bus);
                let (result, borrow) = (self.a & self.x).overflowing_sub(value);
                self.status.set_flag(Status::C, !borrow);
                self.x = result;
                self.status.set_zn(self.x);
            }
            Mnemonic::Las => {
                let value = self.fetch(bus) & self.sp;
                self.a = value;
                self.x = value;
                self.sp = value;
                self.status.set_zn(value);
            }

            // Unstable high-byte stores: the written value is ANDed with the
            // base high byte + 1, and an index carry collapses the target
            // back into the base page.
            Mnemonic::Ahx => {
                let value = self.a & self.x & self.high_byte_plus_one();
                let addr =
                    self.unstable_addr(matches!(self.mode, AddrMode::Aby | AddrMode::Idy));
                bus.write(addr, value);
            }
            Mnemonic::Tas => {
                self.sp = self.a & self.x;
                let value = self.sp & self.high_byte_plus_one();
                let addr = self.unstable_addr(self.mode == AddrMode::Aby);
                bus.write(addr, value);
            }
            Mnemonic::Shx => {
                let value = self.x & self.high_byte_plus_one();
                let addr = self.unstable_addr(self.mode == AddrMode::Aby);
                bus.write(addr, value);
            }
            Mnemonic::Shy => {
                let value = self.y & self.high_byte_plus_one();
                let addr = self.unstable_addr(self.mode == AddrMode::Abx);
                bus.write(addr, value);
            }
        }
        0
    }
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}
