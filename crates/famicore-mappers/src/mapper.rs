//! Mapper dispatch.
//!
//! The four supported boards are modelled as a tagged enum with a common
//! operation set, dispatched per call. New mappers are new variants, not new
//! trait impls; the compiler keeps the dispatch closed and inlinable.

use crate::mmc1::Mmc1;
use crate::mmc3::Mmc3;
use crate::nrom::Nrom;
use crate::rom::{Rom, RomError};
use crate::uxrom::Uxrom;

/// Nametable mirroring mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mirroring {
    /// Horizontal mirroring (vertical arrangement).
    #[default]
    Horizontal,
    /// Vertical mirroring (horizontal arrangement).
    Vertical,
    /// Single-screen, lower nametable.
    SingleScreenLower,
    /// Single-screen, upper nametable.
    SingleScreenUpper,
    /// Four-screen (cartridge VRAM, no aliasing).
    FourScreen,
}

/// Cartridge mapper, a tagged variant over the supported boards.
#[derive(Debug, Clone)]
pub enum Mapper {
    /// Mapper 0.
    Nrom(Nrom),
    /// Mapper 1.
    Mmc1(Mmc1),
    /// Mapper 2.
    Uxrom(Uxrom),
    /// Mapper 4.
    Mmc3(Mmc3),
}

impl Mapper {
    /// Build the mapper variant the ROM header selects.
    ///
    /// # Errors
    ///
    /// Returns [`RomError::UnsupportedMapper`] for mapper ids outside
    /// {0, 1, 2, 4}.
    pub fn new(rom: &Rom) -> Result<Self, RomError> {
        match rom.header.mapper {
            0 => Ok(Self::Nrom(Nrom::new(rom))),
            1 => Ok(Self::Mmc1(Mmc1::new(rom))),
            2 => Ok(Self::Uxrom(Uxrom::new(rom))),
            4 => Ok(Self::Mmc3(Mmc3::new(rom))),
            n => Err(RomError::UnsupportedMapper(n)),
        }
    }

    /// Read a byte on the CPU side. `None` means the address is outside
    /// cartridge space and the system bus decodes it instead.
    #[must_use]
    pub fn cpu_read(&self, addr: u16) -> Option<u8> {
        match self {
            Self::Nrom(m) => m.cpu_read(addr),
            Self::Mmc1(m) => m.cpu_read(addr),
            Self::Uxrom(m) => m.cpu_read(addr),
            Self::Mmc3(m) => m.cpu_read(addr),
        }
    }

    /// Write a byte on the CPU side. Returns false when the address is
    /// outside cartridge space.
    pub fn cpu_write(&mut self, addr: u16, value: u8) -> bool {
        match self {
            Self::Nrom(m) => m.cpu_write(addr, value),
            Self::Mmc1(m) => m.cpu_write(addr, value),
            Self::Uxrom(m) => m.cpu_write(addr, value),
            Self::Mmc3(m) => m.cpu_write(addr, value),
        }
    }

    /// Read pattern-table memory ($0000-$1FFF on the PPU bus).
    #[must_use]
    pub fn ppu_read(&self, addr: u16) -> u8 {
        match self {
            Self::Nrom(m) => m.ppu_read(addr),
            Self::Mmc1(m) => m.ppu_read(addr),
            Self::Uxrom(m) => m.ppu_read(addr),
            Self::Mmc3(m) => m.ppu_read(addr),
        }
    }

    /// Write pattern-table memory. Silently dropped without CHR-RAM.
    pub fn ppu_write(&mut self, addr: u16, value: u8) {
        match self {
            Self::Nrom(m) => m.ppu_write(addr, value),
            Self::Mmc1(m) => m.ppu_write(addr, value),
            Self::Uxrom(m) => m.ppu_write(addr, value),
            Self::Mmc3(m) => m.ppu_write(addr, value),
        }
    }

    /// Dynamic mirroring override; `None` defers to the header value.
    #[must_use]
    pub fn mirroring(&self) -> Option<Mirroring> {
        match self {
            Self::Nrom(_) | Self::Uxrom(_) => None,
            Self::Mmc1(m) => Some(m.mirroring()),
            Self::Mmc3(m) => Some(m.mirroring()),
        }
    }

    /// Clock the scanline counter. The PPU calls this once per visible
    /// scanline while rendering is enabled.
    pub fn clock_scanline(&mut self) {
        if let Self::Mmc3(m) = self {
            m.clock_scanline();
        }
    }

    /// Whether the mapper is holding its IRQ line asserted.
    #[must_use]
    pub fn irq_pending(&self) -> bool {
        match self {
            Self::Mmc3(m) => m.irq_pending(),
            _ => false,
        }
    }

    /// iNES mapper number.
    #[must_use]
    pub fn number(&self) -> u8 {
        match self {
            Self::Nrom(_) => 0,
            Self::Mmc1(_) => 1,
            Self::Uxrom(_) => 2,
            Self::Mmc3(_) => 4,
        }
    }

    /// Board name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Nrom(_) => "NROM",
            Self::Mmc1(_) => "MMC1",
            Self::Uxrom(_) => "UxROM",
            Self::Mmc3(_) => "MMC3",
        }
    }

    /// PRG-RAM contents, for battery-backed saves.
    #[must_use]
    pub fn prg_ram(&self) -> &[u8] {
        match self {
            Self::Nrom(m) => m.prg_ram(),
            Self::Mmc1(m) => m.prg_ram(),
            Self::Uxrom(m) => m.prg_ram(),
            Self::Mmc3(m) => m.prg_ram(),
        }
    }

    /// Restore PRG-RAM contents (truncates to the RAM size).
    pub fn set_prg_ram(&mut self, data: &[u8]) {
        let ram = match self {
            Self::Nrom(m) => m.prg_ram_mut(),
            Self::Mmc1(m) => m.prg_ram_mut(),
            Self::Uxrom(m) => m.prg_ram_mut(),
            Self::Mmc3(m) => m.prg_ram_mut(),
        };
        let len = data.len().min(ram.len());
        ram[..len].copy_from_slice(&data[..len]);
    }
}
