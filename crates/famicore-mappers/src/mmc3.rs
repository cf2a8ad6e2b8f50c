//! Mapper 4: MMC3.
//!
//! Eight bank registers reached through a bank-select latch, fine-grained
//! 8 KiB PRG and 1/2 KiB CHR banking, a mirroring latch, and a scanline IRQ
//! unit. The IRQ counter is clocked once per visible scanline by the PPU:
//! a zero counter (or a pending reload request) reloads from the latch,
//! otherwise the counter decrements; reaching zero with IRQ enabled asserts
//! the pending flag. $E000 disables the IRQ and clears the flag, $E001
//! enables it.

use crate::mapper::Mirroring;
use crate::rom::Rom;

/// MMC3 board state.
#[derive(Debug, Clone)]
#[allow(clippy::struct_excessive_bools)] // IRQ unit state is a set of latches.
pub struct Mmc3 {
    /// PRG-ROM (8 KiB banks).
    prg_rom: Vec<u8>,
    /// CHR-ROM or CHR-RAM (1 KiB banks).
    chr: Vec<u8>,
    /// PRG-RAM window at $6000-$7FFF.
    prg_ram: Vec<u8>,
    /// CHR is writable RAM.
    chr_is_ram: bool,

    /// Bank register index selected by $8000.
    bank_select: u8,
    /// R0-R7 bank registers.
    bank_registers: [u8; 8],
    /// PRG mode: swaps the $8000 and $C000 windows.
    prg_mode: bool,
    /// CHR mode: swaps the 2 KiB and 1 KiB pattern-table halves.
    chr_mode: bool,
    /// Mirroring latch ($A000).
    mirroring: Mirroring,

    /// IRQ reload latch ($C000).
    irq_latch: u8,
    /// IRQ down-counter.
    irq_counter: u8,
    /// Reload requested ($C001).
    irq_reload: bool,
    /// IRQ enabled ($E001).
    irq_enabled: bool,
    /// IRQ line asserted.
    irq_pending: bool,
}

impl Mmc3 {
    /// Build the board from a parsed ROM.
    #[must_use]
    pub fn new(rom: &Rom) -> Self {
        let chr_is_ram = rom.has_chr_ram();
        let chr = if chr_is_ram {
            vec![0; 0x2000]
        } else {
            rom.chr_rom.clone()
        };
        Self {
            prg_rom: rom.prg_rom.clone(),
            chr,
            prg_ram: vec![0; rom.header.prg_ram_size],
            chr_is_ram,
            bank_select: 0,
            bank_registers: [0; 8],
            prg_mode: false,
            chr_mode: false,
            mirroring: rom.header.mirroring,
            irq_latch: 0,
            irq_counter: 0,
            irq_reload: false,
            irq_enabled: false,
            irq_pending: false,
        }
    }

    fn prg_bank_count(&self) -> usize {
        (self.prg_rom.len() / 0x2000).max(1)
    }

    fn chr_bank_count(&self) -> usize {
        (self.chr.len() / 0x0400).max(1)
    }

    /// 8 KiB PRG bank mapped into a slot ($8000, $A000, $C000, $E000).
    fn prg_bank_for_slot(&self, slot: usize) -> usize {
        let count = self.prg_bank_count();
        let last = count - 1;
        let second_last = count.saturating_sub(2);
        let r6 = usize::from(self.bank_registers[6]) % count;
        let r7 = usize::from(self.bank_registers[7]) % count;
        let table = if self.prg_mode {
            [second_last, r7, r6, last]
        } else {
            [r6, r7, second_last, last]
        };
        table[slot]
    }

    fn map_chr(&self, addr: u16) -> usize {
        let r = &self.bank_registers;
        let table: [usize; 8] = if self.chr_mode {
            [
                usize::from(r[2]),
                usize::from(r[3]),
                usize::from(r[4]),
                usize::from(r[5]),
                usize::from(r[0] & 0xFE),
                usize::from(r[0] | 0x01),
                usize::from(r[1] & 0xFE),
                usize::from(r[1] | 0x01),
            ]
        } else {
            [
                usize::from(r[0] & 0xFE),
                usize::from(r[0] | 0x01),
                usize::from(r[1] & 0xFE),
                usize::from(r[1] | 0x01),
                usize::from(r[2]),
                usize::from(r[3]),
                usize::from(r[4]),
                usize::from(r[5]),
            ]
        };
        let bank = table[usize::from(addr & 0x1FFF) / 0x0400] % self.chr_bank_count();
        bank * 0x0400 + usize::from(addr & 0x03FF)
    }

    /// CPU-side read; `None` outside cartridge space.
    #[must_use]
    pub fn cpu_read(&self, addr: u16) -> Option<u8> {
        match addr {
            0x6000..=0x7FFF => Some(self.prg_ram[usize::from(addr - 0x6000)]),
            0x8000..=0xFFFF => {
                let slot = usize::from(addr - 0x8000) / 0x2000;
                let bank = self.prg_bank_for_slot(slot);
                let offset = bank * 0x2000 + usize::from(addr & 0x1FFF);
                Some(self.prg_rom[offset % self.prg_rom.len()])
            }
            _ => None,
        }
    }

    /// CPU-side write: PRG-RAM, or the register pairs at even/odd addresses.
    pub fn cpu_write(&mut self, addr: u16, value: u8) -> bool {
        match addr {
            0x6000..=0x7FFF => {
                self.prg_ram[usize::from(addr - 0x6000)] = value;
                true
            }
            0x8000..=0xFFFF => {
                match addr & 0xE001 {
                    0x8000 => {
                        self.bank_select = value & 0x07;
                        self.prg_mode = value & 0x40 != 0;
                        self.chr_mode = value & 0x80 != 0;
                    }
                    0x8001 => {
                        self.bank_registers[usize::from(self.bank_select)] = value;
                    }
                    0xA000 => {
                        self.mirroring = if value & 1 != 0 {
                            Mirroring::Horizontal
                        } else {
                            Mirroring::Vertical
                        };
                    }
                    0xC000 => self.irq_latch = value,
                    0xC001 => self.irq_reload = true,
                    0xE000 => {
                        self.irq_enabled = false;
                        self.irq_pending = false;
                    }
                    0xE001 => self.irq_enabled = true,
                    _ => {}
                }
                true
            }
            _ => false,
        }
    }

    /// Pattern-table read.
    #[must_use]
    pub fn ppu_read(&self, addr: u16) -> u8 {
        self.chr[self.map_chr(addr)]
    }

    /// Pattern-table write, effective only with CHR-RAM.
    pub fn ppu_write(&mut self, addr: u16, value: u8) {
        if self.chr_is_ram {
            let offset = self.map_chr(addr);
            self.chr[offset] = value;
        }
    }

    /// Clock the IRQ counter; the PPU calls this once per visible scanline.
    pub fn clock_scanline(&mut self) {
        if self.irq_counter == 0 || self.irq_reload {
            self.irq_counter = self.irq_latch;
            self.irq_reload = false;
        } else {
            self.irq_counter = self.irq_counter.wrapping_sub(1);
        }
        if self.irq_counter == 0 && self.irq_enabled {
            log::trace!("MMC3 scanline IRQ asserted");
            self.irq_pending = true;
        }
    }

    /// Whether the IRQ line is asserted.
    #[must_use]
    pub fn irq_pending(&self) -> bool {
        self.irq_pending
    }

    /// Current mirroring latch.
    #[must_use]
    pub fn mirroring(&self) -> Mirroring {
        self.mirroring
    }

    /// PRG-RAM contents.
    #[must_use]
    pub fn prg_ram(&self) -> &[u8] {
        &self.prg_ram
    }

    /// Mutable PRG-RAM contents.
    pub fn prg_ram_mut(&mut self) -> &mut [u8] {
        &mut self.prg_ram
    }
}
