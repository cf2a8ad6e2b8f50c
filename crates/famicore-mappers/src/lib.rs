//! NES cartridge model and mapper implementations.
//!
//! A [`Cartridge`] owns the mapper hardware plus the static metadata the rest
//! of the console needs (header mirroring, battery flag). The mapper itself
//! is a tagged [`Mapper`] enum over the supported boards:
//!
//! | Mapper | Board | Notes |
//! |--------|-------|-------|
//! | 0 | NROM  | no banking |
//! | 1 | MMC1  | serial shift register, PRG/CHR modes, dynamic mirroring |
//! | 2 | UxROM | 16 KiB PRG banking |
//! | 4 | MMC3  | 8 KiB PRG / 1-2 KiB CHR banking, scanline IRQ |
//!
//! # Example
//!
//! ```no_run
//! use famicore_mappers::Cartridge;
//!
//! let image = std::fs::read("game.nes").expect("read ROM");
//! let cartridge = Cartridge::from_ines(&image).expect("parse ROM");
//! let reset_lo = cartridge.mapper.cpu_read(0xFFFC);
//! # let _ = reset_lo;
//! ```

mod mapper;
mod mmc1;
mod mmc3;
mod nrom;
mod rom;
mod uxrom;

pub use mapper::{Mapper, Mirroring};
pub use mmc1::Mmc1;
pub use mmc3::Mmc3;
pub use nrom::Nrom;
pub use rom::{Rom, RomError, RomHeader};
pub use uxrom::Uxrom;

/// A loaded cartridge: mapper hardware plus header metadata.
///
/// Constructed once from a ROM image; survives console reset.
#[derive(Debug, Clone)]
pub struct Cartridge {
    /// Mapper hardware.
    pub mapper: Mapper,
    /// Static mirroring from the header; a mapper may override it.
    mirroring: Mirroring,
    /// Battery-backed PRG-RAM present.
    has_battery: bool,
}

impl Cartridge {
    /// Parse an iNES 1.0 image and build the board it describes.
    ///
    /// # Errors
    ///
    /// Returns a [`RomError`] for a malformed image or an unsupported mapper.
    pub fn from_ines(data: &[u8]) -> Result<Self, RomError> {
        let rom = Rom::load(data)?;
        Self::from_rom(&rom)
    }

    /// Build a cartridge from an already-parsed [`Rom`].
    ///
    /// # Errors
    ///
    /// Returns [`RomError::UnsupportedMapper`] for mapper ids outside
    /// {0, 1, 2, 4}.
    pub fn from_rom(rom: &Rom) -> Result<Self, RomError> {
        let mapper = Mapper::new(rom)?;
        log::info!(
            "cartridge: mapper {} ({}), {} KiB PRG-ROM, {} KiB {}, mirroring {:?}",
            mapper.number(),
            mapper.name(),
            rom.prg_rom.len() / 1024,
            if rom.has_chr_ram() { 8 } else { rom.chr_rom.len() / 1024 },
            if rom.has_chr_ram() { "CHR-RAM" } else { "CHR-ROM" },
            rom.header.mirroring,
        );
        Ok(Self {
            mapper,
            mirroring: rom.header.mirroring,
            has_battery: rom.header.has_battery,
        })
    }

    /// Mirroring currently in effect: the mapper's dynamic value when it
    /// provides one, otherwise the header hint.
    #[must_use]
    pub fn mirroring(&self) -> Mirroring {
        self.mapper.mirroring().unwrap_or(self.mirroring)
    }

    /// Whether PRG-RAM is battery backed.
    #[must_use]
    pub fn has_battery(&self) -> bool {
        self.has_battery
    }

    /// PRG-RAM snapshot for battery saves, when battery backed.
    #[must_use]
    pub fn battery_ram(&self) -> Option<&[u8]> {
        if self.has_battery {
            Some(self.mapper.prg_ram())
        } else {
            None
        }
    }

    /// Restore a battery save into PRG-RAM.
    pub fn load_battery_ram(&mut self, data: &[u8]) {
        self.mapper.set_prg_ram(data);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_image(mapper: u8, flags6_low: u8) -> Vec<u8> {
        let mut data = vec![0x4E, 0x45, 0x53, 0x1A, 2, 1];
        data.push(((mapper & 0x0F) << 4) | flags6_low);
        data.push(mapper & 0xF0);
        data.extend_from_slice(&[0; 8]);
        data.extend(std::iter::repeat(0u8).take(2 * 0x4000 + 0x2000));
        data
    }

    #[test]
    fn test_from_ines() {
        let cartridge = Cartridge::from_ines(&build_image(0, 0x01)).unwrap();
        assert_eq!(cartridge.mapper.number(), 0);
        assert_eq!(cartridge.mirroring(), Mirroring::Vertical);
        assert!(!cartridge.has_battery());
    }

    #[test]
    fn test_unsupported_mapper_rejected() {
        let result = Cartridge::from_ines(&build_image(7, 0));
        assert!(matches!(result, Err(RomError::UnsupportedMapper(7))));
    }

    #[test]
    fn test_dynamic_mirroring_overrides_header() {
        // MMC1 powers up in single-screen mode regardless of the header bit.
        let cartridge = Cartridge::from_ines(&build_image(1, 0x01)).unwrap();
        assert_eq!(cartridge.mirroring(), Mirroring::SingleScreenLower);
    }

    #[test]
    fn test_battery_ram_accessors() {
        let mut cartridge = Cartridge::from_ines(&build_image(0, 0x02)).unwrap();
        assert!(cartridge.has_battery());
        cartridge.load_battery_ram(&[1, 2, 3]);
        assert_eq!(&cartridge.battery_ram().unwrap()[..3], &[1, 2, 3]);
    }
}
