//! Console: the top-level stepping API.

use famicore_cpu::Cpu;
use famicore_mappers::Cartridge;

use crate::bus::NesBus;
use crate::input::Button;

/// Errors surfaced while driving the console.
#[derive(Debug, Clone, thiserror::Error)]
pub enum EmulatorError {
    /// `step_frame` ran out of its instruction budget before the PPU
    /// signalled frame completion. Console state is preserved.
    #[error("frame did not complete within {instructions} instructions")]
    FrameRunaway {
        /// Instructions executed before giving up.
        instructions: u32,
    },
}

/// Which controller port an input applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerPort {
    /// Controller 1 ($4016 reads).
    One,
    /// Controller 2 ($4017 reads).
    Two,
}

/// The emulated console: CPU plus system bus.
///
/// Callers drive it one instruction or one frame at a time; both are fully
/// synchronous. Within a step the CPU's memory effects happen first and the
/// PPU then advances three dots per CPU cycle, latching NMI/IRQ for the next
/// instruction boundary.
pub struct Console {
    cpu: Cpu,
    bus: NesBus,
    frame_count: u64,
}

impl Console {
    /// Build a console around a cartridge and run the reset sequence.
    #[must_use]
    pub fn new(cartridge: Cartridge) -> Self {
        let mut console = Self {
            cpu: Cpu::new(),
            bus: NesBus::new(cartridge),
            frame_count: 0,
        };
        console.reset();
        console
    }

    /// Reset: RAM cleared, PPU reset, CPU re-reads the reset vector.
    /// Cartridge state survives.
    pub fn reset(&mut self) {
        self.bus.reset();
        self.cpu.reset(&mut self.bus);
        self.bus.sync_cpu_cycles(self.cpu.cycles);
    }

    /// Execute one CPU instruction (or one stall/halt idle cycle) and clock
    /// the rest of the system for it. Returns the CPU cycles consumed.
    pub fn step_instruction(&mut self) -> u32 {
        let cycles = u32::from(self.cpu.step(&mut self.bus));

        // An OAMDMA triggered inside the instruction stalls the CPU from the
        // next step on; the PPU keeps running through the stall.
        let stall = self.bus.take_pending_stall();
        if stall > 0 {
            self.cpu.add_stall(stall);
        }

        self.bus.clock(cycles, &mut self.cpu);
        self.bus.sync_cpu_cycles(self.cpu.cycles);
        cycles
    }

    /// Run until the PPU completes a frame, then return the RGB8 buffer.
    ///
    /// # Errors
    ///
    /// [`EmulatorError::FrameRunaway`] when `max_instructions` instructions
    /// execute without a completed frame; partial state is preserved.
    pub fn step_frame(&mut self, max_instructions: u32) -> Result<&[u8], EmulatorError> {
        self.bus.ppu.acknowledge_frame();
        let mut executed = 0u32;
        while !self.bus.ppu.frame_complete() {
            self.step_instruction();
            executed += 1;
            if executed >= max_instructions {
                log::warn!("frame runaway after {executed} instructions");
                return Err(EmulatorError::FrameRunaway {
                    instructions: executed,
                });
            }
        }
        self.bus.ppu.acknowledge_frame();
        self.frame_count += 1;
        Ok(self.bus.ppu.frame())
    }

    /// Press or release a button on a controller port.
    pub fn set_button(&mut self, port: ControllerPort, button: Button, pressed: bool) {
        let controller = match port {
            ControllerPort::One => &mut self.bus.controller1,
            ControllerPort::Two => &mut self.bus.controller2,
        };
        controller.set_button(button, pressed);
    }

    /// The most recently rendered frame (RGB8, 256x240x3, row-major).
    #[must_use]
    pub fn frame(&self) -> &[u8] {
        self.bus.ppu.frame()
    }

    /// Side-effect-free bus read, for debuggers and test protocols.
    #[must_use]
    pub fn peek(&self, addr: u16) -> u8 {
        self.bus.peek(addr)
    }

    /// Completed frame count.
    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// CPU, for inspection.
    #[must_use]
    pub fn cpu(&self) -> &Cpu {
        &self.cpu
    }

    /// Mutable CPU, for harnesses that force the program counter.
    pub fn cpu_mut(&mut self) -> &mut Cpu {
        &mut self.cpu
    }

    /// System bus, for inspection.
    #[must_use]
    pub fn bus(&self) -> &NesBus {
        &self.bus
    }

    /// Mutable system bus.
    pub fn bus_mut(&mut self) -> &mut NesBus {
        &mut self.bus
    }

    /// Whether the cartridge has battery-backed PRG-RAM.
    #[must_use]
    pub fn has_battery(&self) -> bool {
        self.bus.cartridge.has_battery()
    }

    /// Battery-backed PRG-RAM snapshot, when present.
    #[must_use]
    pub fn battery_ram(&self) -> Option<&[u8]> {
        self.bus.cartridge.battery_ram()
    }

    /// Restore a battery save.
    pub fn load_battery_ram(&mut self, data: &[u8]) {
        self.bus.cartridge.load_battery_ram(data);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use famicore_mappers::{Mirroring, Rom, RomHeader};

    /// A NROM cartridge whose PRG is a NOP slide with the reset vector at
    /// $8000.
    fn nop_cartridge() -> Cartridge {
        let mut prg_rom = vec![0xEA; 0x8000];
        prg_rom[0x7FFC] = 0x00;
        prg_rom[0x7FFD] = 0x80;
        let rom = Rom {
            header: RomHeader {
                prg_rom_size: prg_rom.len(),
                chr_rom_size: 0x2000,
                prg_ram_size: 0x2000,
                mapper: 0,
                mirroring: Mirroring::Vertical,
                has_battery: false,
                has_trainer: false,
            },
            trainer: None,
            prg_rom,
            chr_rom: vec![0; 0x2000],
        };
        Cartridge::from_rom(&rom).unwrap()
    }

    #[test]
    fn test_reset_loads_vector() {
        let console = Console::new(nop_cartridge());
        assert_eq!(console.cpu().pc, 0x8000);
        assert_eq!(console.cpu().cycles, 7);
    }

    #[test]
    fn test_step_advances_ppu_three_dots_per_cycle() {
        let mut console = Console::new(nop_cartridge());
        let cycles = console.step_instruction();
        assert_eq!(cycles, 2); // NOP
        assert_eq!(console.bus().ppu.dot(), 6);
    }

    #[test]
    fn test_step_frame_completes() {
        let mut console = Console::new(nop_cartridge());
        let frame = console.step_frame(100_000).unwrap();
        assert_eq!(frame.len(), 256 * 240 * 3);
        assert_eq!(console.frame_count(), 1);
    }

    #[test]
    fn test_step_frame_runaway() {
        let mut console = Console::new(nop_cartridge());
        let result = console.step_frame(10);
        assert!(matches!(
            result,
            Err(EmulatorError::FrameRunaway { instructions: 10 })
        ));
        // State survives; the next call finishes the frame.
        assert!(console.step_frame(100_000).is_ok());
    }

    #[test]
    fn test_set_button_routes_to_port() {
        let mut console = Console::new(nop_cartridge());
        console.set_button(ControllerPort::One, Button::A, true);
        console.set_button(ControllerPort::Two, Button::Start, true);
        assert_eq!(console.bus().controller1.buttons(), 0x01);
        assert_eq!(console.bus().controller2.buttons(), 0x08);
    }
}
