//! iNES 1.0 ROM image parsing.
//!
//! ```text
//! Byte 0-3:  Magic "NES" + MS-DOS EOF (0x4E 0x45 0x53 0x1A)
//! Byte 4:    PRG-ROM size in 16KB units
//! Byte 5:    CHR-ROM size in 8KB units (0 means the board carries CHR-RAM)
//! Byte 6:    Flags: mirroring, battery, trainer, four-screen, mapper low nibble
//! Byte 7:    Flags: mapper high nibble
//! Byte 8:    PRG-RAM size in 8KB units (0 treated as 1)
//! ```

use crate::mapper::Mirroring;

/// Errors produced while parsing a ROM image.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RomError {
    /// Image is smaller than the 16-byte header.
    #[error("ROM image too small: expected at least 16 bytes, got {0}")]
    TooSmall(usize),

    /// Header does not begin with the iNES magic.
    #[error("invalid iNES magic: expected [4E 45 53 1A], got {0:02X?}")]
    BadMagic([u8; 4]),

    /// Payload shorter than the sizes the header declares.
    #[error("ROM image truncated: expected {expected} bytes, got {actual}")]
    Truncated {
        /// Bytes required by the header.
        expected: usize,
        /// Bytes actually present.
        actual: usize,
    },

    /// Mapper id outside the supported set {0, 1, 2, 4}.
    #[error("unsupported mapper {0}")]
    UnsupportedMapper(u8),
}

/// Parsed iNES 1.0 header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RomHeader {
    /// PRG-ROM size in bytes (multiple of 16 KiB).
    pub prg_rom_size: usize,
    /// CHR-ROM size in bytes (multiple of 8 KiB; 0 means CHR-RAM).
    pub chr_rom_size: usize,
    /// PRG-RAM size in bytes (header byte 8, zero treated as one bank).
    pub prg_ram_size: usize,
    /// Mapper number.
    pub mapper: u8,
    /// Nametable mirroring from the header flags.
    pub mirroring: Mirroring,
    /// Battery-backed PRG-RAM present.
    pub has_battery: bool,
    /// 512-byte trainer present before PRG-ROM.
    pub has_trainer: bool,
}

impl RomHeader {
    /// iNES magic: "NES" followed by MS-DOS EOF.
    const MAGIC: [u8; 4] = [0x4E, 0x45, 0x53, 0x1A];

    /// Parse the 16-byte header.
    ///
    /// # Errors
    ///
    /// Returns [`RomError::TooSmall`] or [`RomError::BadMagic`].
    pub fn parse(data: &[u8]) -> Result<Self, RomError> {
        if data.len() < 16 {
            return Err(RomError::TooSmall(data.len()));
        }

        let magic = [data[0], data[1], data[2], data[3]];
        if magic != Self::MAGIC {
            return Err(RomError::BadMagic(magic));
        }

        let flags6 = data[6];
        let flags7 = data[7];
        let mapper = (flags7 & 0xF0) | (flags6 >> 4);

        let mirroring = if flags6 & 0x08 != 0 {
            Mirroring::FourScreen
        } else if flags6 & 0x01 != 0 {
            Mirroring::Vertical
        } else {
            Mirroring::Horizontal
        };

        let prg_ram_banks = usize::from(data[8]).max(1);

        Ok(Self {
            prg_rom_size: usize::from(data[4]) * 0x4000,
            chr_rom_size: usize::from(data[5]) * 0x2000,
            prg_ram_size: prg_ram_banks * 0x2000,
            mapper,
            mirroring,
            has_battery: flags6 & 0x02 != 0,
            has_trainer: flags6 & 0x04 != 0,
        })
    }
}

/// Parsed ROM image.
#[derive(Debug, Clone)]
pub struct Rom {
    /// Header fields.
    pub header: RomHeader,
    /// 512-byte trainer blob, when present.
    pub trainer: Option<Vec<u8>>,
    /// PRG-ROM payload.
    pub prg_rom: Vec<u8>,
    /// CHR-ROM payload; empty when the board uses CHR-RAM.
    pub chr_rom: Vec<u8>,
}

impl Rom {
    /// Parse a complete iNES 1.0 image.
    ///
    /// # Errors
    ///
    /// Returns a [`RomError`] for a bad header or a payload shorter than the
    /// header declares.
    pub fn load(data: &[u8]) -> Result<Self, RomError> {
        let header = RomHeader::parse(data)?;

        let mut offset = 16;

        let trainer = if header.has_trainer {
            if data.len() < offset + 512 {
                return Err(RomError::Truncated {
                    expected: offset + 512,
                    actual: data.len(),
                });
            }
            let trainer = data[offset..offset + 512].to_vec();
            offset += 512;
            Some(trainer)
        } else {
            None
        };

        let expected = offset + header.prg_rom_size + header.chr_rom_size;
        if data.len() < expected {
            return Err(RomError::Truncated {
                expected,
                actual: data.len(),
            });
        }

        let prg_rom = data[offset..offset + header.prg_rom_size].to_vec();
        offset += header.prg_rom_size;
        let chr_rom = data[offset..offset + header.chr_rom_size].to_vec();

        Ok(Self {
            header,
            trainer,
            prg_rom,
            chr_rom,
        })
    }

    /// Whether the board carries CHR-RAM instead of CHR-ROM.
    #[must_use]
    pub fn has_chr_ram(&self) -> bool {
        self.chr_rom.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_image(prg_banks: u8, chr_banks: u8, mapper: u8, flags6_low: u8) -> Vec<u8> {
        let mut data = vec![0x4E, 0x45, 0x53, 0x1A];
        data.push(prg_banks);
        data.push(chr_banks);
        data.push(((mapper & 0x0F) << 4) | flags6_low);
        data.push(mapper & 0xF0);
        data.extend_from_slice(&[0; 8]);
        data.extend(std::iter::repeat(0u8).take(usize::from(prg_banks) * 0x4000));
        data.extend(std::iter::repeat(0u8).take(usize::from(chr_banks) * 0x2000));
        data
    }

    #[test]
    fn test_parse_header() {
        let data = build_image(2, 1, 0, 0x01);
        let rom = Rom::load(&data).unwrap();
        assert_eq!(rom.header.prg_rom_size, 0x8000);
        assert_eq!(rom.header.chr_rom_size, 0x2000);
        assert_eq!(rom.header.mapper, 0);
        assert_eq!(rom.header.mirroring, Mirroring::Vertical);
        assert_eq!(rom.header.prg_ram_size, 0x2000);
        assert!(!rom.has_chr_ram());
    }

    #[test]
    fn test_mapper_nibbles() {
        let data = build_image(1, 1, 0x42, 0);
        let header = RomHeader::parse(&data).unwrap();
        assert_eq!(header.mapper, 0x42);
    }

    #[test]
    fn test_four_screen_wins_over_vertical() {
        let data = build_image(1, 1, 0, 0x09);
        let header = RomHeader::parse(&data).unwrap();
        assert_eq!(header.mirroring, Mirroring::FourScreen);
    }

    #[test]
    fn test_battery_flag() {
        let data = build_image(1, 1, 0, 0x02);
        let header = RomHeader::parse(&data).unwrap();
        assert!(header.has_battery);
    }

    #[test]
    fn test_bad_magic() {
        let mut data = build_image(1, 1, 0, 0);
        data[0] = 0x00;
        assert!(matches!(Rom::load(&data), Err(RomError::BadMagic(_))));
    }

    #[test]
    fn test_too_small() {
        assert!(matches!(
            RomHeader::parse(&[0x4E, 0x45]),
            Err(RomError::TooSmall(2))
        ));
    }

    #[test]
    fn test_truncated_payload() {
        let mut data = build_image(2, 1, 0, 0);
        data.truncate(16 + 0x4000);
        assert!(matches!(Rom::load(&data), Err(RomError::Truncated { .. })));
    }

    #[test]
    fn test_trainer_skipped() {
        let mut data = vec![0x4E, 0x45, 0x53, 0x1A, 1, 0, 0x04, 0];
        data.extend_from_slice(&[0; 8]);
        data.extend(std::iter::repeat(0xAAu8).take(512));
        data.extend(std::iter::repeat(0x55u8).take(0x4000));
        let rom = Rom::load(&data).unwrap();
        assert!(rom.header.has_trainer);
        assert_eq!(rom.trainer.as_deref().map(<[u8]>::len), Some(512));
        assert_eq!(rom.prg_rom[0], 0x55);
    }

    #[test]
    fn test_chr_ram_board() {
        let data = build_image(1, 0, 0, 0);
        let rom = Rom::load(&data).unwrap();
        assert!(rom.has_chr_ram());
        assert!(rom.chr_rom.is_empty());
    }
}
