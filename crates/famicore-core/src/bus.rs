//! System bus: the central address decoder and component clock.
//!
//! CPU memory map:
//!
//! ```text
//! $0000-$1FFF  2 KiB internal RAM, mirrored every $0800
//! $2000-$3FFF  PPU registers, mirrored every 8 bytes
//! $4000-$4013  APU channel registers
//! $4014        OAMDMA trigger
//! $4015        APU status
//! $4016        Controller 1 data / strobe for both ports
//! $4017        Controller 2 data (writes reach the APU frame counter)
//! $4020-$FFFF  Cartridge space, delegated to the mapper
//! ```
//!
//! The mapper is offered every address first and the internal regions decode
//! only what it leaves unmapped; since the supported boards claim only
//! $6000-$FFFF the table above is what software observes.

use famicore_apu::Apu;
use famicore_cpu::{Bus, Cpu};
use famicore_mappers::{Cartridge, Mirroring};
use famicore_ppu::{Ppu, PpuBus};

use crate::input::Controller;

/// Short-lived PPU-side view of the cartridge, built around each PPU access.
struct CartridgeBus<'a> {
    cartridge: &'a mut Cartridge,
}

impl PpuBus for CartridgeBus<'_> {
    fn chr_read(&mut self, addr: u16) -> u8 {
        self.cartridge.mapper.ppu_read(addr)
    }

    fn chr_write(&mut self, addr: u16, value: u8) {
        self.cartridge.mapper.ppu_write(addr, value);
    }

    fn mirroring(&self) -> Mirroring {
        self.cartridge.mirroring()
    }

    fn clock_scanline(&mut self) {
        self.cartridge.mapper.clock_scanline();
    }
}

/// The NES system bus.
pub struct NesBus {
    /// 2 KiB internal RAM.
    pub ram: [u8; 2048],
    /// Picture processing unit.
    pub ppu: Ppu,
    /// Audio processing unit (frame IRQ only).
    pub apu: Apu,
    /// Cartridge and mapper.
    pub cartridge: Cartridge,
    /// Controller port 1.
    pub controller1: Controller,
    /// Controller port 2.
    pub controller2: Controller,
    /// OAMDMA stall cycles latched by a $4014 write, collected by the
    /// console after the instruction completes.
    pending_stall: u32,
    /// CPU cycle count at the last instruction boundary, for DMA parity.
    cpu_cycles: u64,
}

impl NesBus {
    /// Build a bus around a cartridge.
    #[must_use]
    pub fn new(cartridge: Cartridge) -> Self {
        Self {
            ram: [0; 2048],
            ppu: Ppu::new(),
            apu: Apu::new(),
            cartridge,
            controller1: Controller::new(),
            controller2: Controller::new(),
            pending_stall: 0,
            cpu_cycles: 0,
        }
    }

    /// Reset: RAM cleared, PPU reset. Cartridge, APU and controller state
    /// survive, as they do on the console.
    pub fn reset(&mut self) {
        self.ram.fill(0);
        self.ppu.reset();
        self.pending_stall = 0;
        self.cpu_cycles = 0;
    }

    /// OAMDMA: copy a 256-byte page into OAM and charge the CPU stall.
    /// 513 cycles, plus one when the CPU cycle count is odd.
    fn dma_transfer(&mut self, page: u8) {
        let base = u16::from(page) << 8;
        let mut block = [0u8; 256];
        for (i, byte) in block.iter_mut().enumerate() {
            *byte = Bus::read(self, base + i as u16);
        }
        self.ppu.oam_dma(&block);
        self.pending_stall += 513 + u32::from(self.cpu_cycles & 1 != 0);
    }

    /// Collect stall cycles latched since the last call.
    pub fn take_pending_stall(&mut self) -> u32 {
        std::mem::take(&mut self.pending_stall)
    }

    /// Record the CPU's cumulative cycle count at an instruction boundary.
    pub fn sync_cpu_cycles(&mut self, cycles: u64) {
        self.cpu_cycles = cycles;
    }

    /// Clock the PPU (3 dots per CPU cycle) and APU (1:1) for a completed
    /// instruction, routing the PPU NMI line and the APU/mapper IRQ lines
    /// into the CPU's latches.
    pub fn clock(&mut self, cpu_cycles: u32, cpu: &mut Cpu) {
        for _ in 0..cpu_cycles {
            self.apu.clock();

            for _ in 0..3 {
                let mut port = CartridgeBus {
                    cartridge: &mut self.cartridge,
                };
                self.ppu.clock(&mut port);
                if self.ppu.take_nmi() {
                    cpu.request_nmi();
                }
            }

            if self.apu.irq_pending() || self.cartridge.mapper.irq_pending() {
                cpu.request_irq();
            }
        }
    }

    /// Side-effect-free read for debuggers and test harnesses. PPU registers
    /// and controller ports read as 0 rather than disturbing their state.
    #[must_use]
    pub fn peek(&self, addr: u16) -> u8 {
        if let Some(value) = self.cartridge.mapper.cpu_read(addr) {
            return value;
        }
        match addr {
            0x0000..=0x1FFF => self.ram[usize::from(addr & 0x07FF)],
            0x4015 => self.apu.peek_status(),
            _ => 0,
        }
    }
}

impl Bus for NesBus {
    fn read(&mut self, addr: u16) -> u8 {
        if let Some(value) = self.cartridge.mapper.cpu_read(addr) {
            return value;
        }
        match addr {
            0x0000..=0x1FFF => self.ram[usize::from(addr & 0x07FF)],
            0x2000..=0x3FFF => {
                let mut port = CartridgeBus {
                    cartridge: &mut self.cartridge,
                };
                self.ppu.read_register(addr, &mut port)
            }
            0x4015 => self.apu.read_status(),
            0x4016 => self.controller1.read(),
            0x4017 => self.controller2.read(),
            _ => 0,
        }
    }

    fn write(&mut self, addr: u16, value: u8) {
        if self.cartridge.mapper.cpu_write(addr, value) {
            return;
        }
        match addr {
            0x0000..=0x1FFF => self.ram[usize::from(addr & 0x07FF)] = value,
            0x2000..=0x3FFF => {
                let mut port = CartridgeBus {
                    cartridge: &mut self.cartridge,
                };
                self.ppu.write_register(addr, value, &mut port);
            }
            0x4000..=0x4013 | 0x4015 => self.apu.write(addr, value),
            0x4014 => self.dma_transfer(value),
            0x4016 => {
                self.controller1.write(value);
                self.controller2.write(value);
            }
            0x4017 => self.apu.write(addr, value),
            _ => {}
        }
    }
}
