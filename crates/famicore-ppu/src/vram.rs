//! PPU-internal video memory: nametables and palette RAM.
//!
//! Four physical 1 KiB nametable pages back the 4 KiB logical nametable
//! space; the active mirroring mode selects which physical page a logical
//! address lands in. Boards with four-screen VRAM use all four pages, the
//! others alias two (or one) of them.

use famicore_mappers::Mirroring;

/// Palette contents after power-on, before software writes anything.
const POWER_UP_PALETTE: [u8; 32] = [
    0x09, 0x01, 0x00, 0x01, 0x00, 0x02, 0x02, 0x0D, 0x08, 0x10, 0x08, 0x24, 0x00, 0x00, 0x04,
    0x2C, 0x09, 0x01, 0x34, 0x03, 0x00, 0x04, 0x00, 0x14, 0x08, 0x3A, 0x00, 0x02, 0x00, 0x20,
    0x2C, 0x08,
];

/// Nametable pages plus palette RAM.
#[derive(Debug, Clone)]
pub struct Vram {
    /// Four physical 1 KiB nametable pages.
    nametables: [[u8; 0x400]; 4],
    /// 32-byte palette RAM.
    palette: [u8; 32],
}

impl Vram {
    /// Create zeroed VRAM with the power-up palette loaded.
    #[must_use]
    pub fn new() -> Self {
        Self {
            nametables: [[0; 0x400]; 4],
            palette: POWER_UP_PALETTE,
        }
    }

    /// Reload the power-up palette. Nametable contents are left alone, as
    /// they are on a console reset.
    pub fn load_power_up_palette(&mut self) {
        self.palette = POWER_UP_PALETTE;
    }

    /// Map a logical nametable address ($2000-$3EFF, pre-masked or not) to a
    /// physical (page, offset) pair under the given mirroring.
    fn nametable_slot(mirroring: Mirroring, addr: u16) -> (usize, usize) {
        let addr = usize::from(addr) & 0x0FFF;
        let table = (addr / 0x400) & 0x03;
        let index = addr & 0x03FF;
        let page = match mirroring {
            Mirroring::FourScreen => table,
            Mirroring::Vertical => table & 0x01,
            Mirroring::Horizontal => usize::from(table >= 2),
            Mirroring::SingleScreenLower => 0,
            Mirroring::SingleScreenUpper => 1,
        };
        (page, index)
    }

    /// Read a nametable byte.
    #[must_use]
    pub fn read_nametable(&self, mirroring: Mirroring, addr: u16) -> u8 {
        let (page, index) = Self::nametable_slot(mirroring, addr);
        self.nametables[page][index]
    }

    /// Write a nametable byte.
    pub fn write_nametable(&mut self, mirroring: Mirroring, addr: u16, value: u8) {
        let (page, index) = Self::nametable_slot(mirroring, addr);
        self.nametables[page][index] = value;
    }

    /// Fold a palette address: $10/$14/$18/$1C alias $00/$04/$08/$0C.
    fn palette_index(addr: u16) -> usize {
        let mut index = usize::from(addr) & 0x1F;
        if index >= 0x10 && index % 4 == 0 {
            index -= 0x10;
        }
        index
    }

    /// Read palette RAM (6-bit entries).
    #[must_use]
    pub fn read_palette(&self, addr: u16) -> u8 {
        self.palette[Self::palette_index(addr)] & 0x3F
    }

    /// Write palette RAM.
    pub fn write_palette(&mut self, addr: u16, value: u8) {
        self.palette[Self::palette_index(addr)] = value & 0x3F;
    }
}

impl Default for Vram {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_horizontal_mirroring_pairs() {
        let mut vram = Vram::new();
        vram.write_nametable(Mirroring::Horizontal, 0x2000, 0x11);
        assert_eq!(vram.read_nametable(Mirroring::Horizontal, 0x2400), 0x11);
        vram.write_nametable(Mirroring::Horizontal, 0x2800, 0x22);
        assert_eq!(vram.read_nametable(Mirroring::Horizontal, 0x2C00), 0x22);
        assert_ne!(vram.read_nametable(Mirroring::Horizontal, 0x2000), 0x22);
    }

    #[test]
    fn test_vertical_mirroring_pairs() {
        let mut vram = Vram::new();
        vram.write_nametable(Mirroring::Vertical, 0x2000, 0x11);
        assert_eq!(vram.read_nametable(Mirroring::Vertical, 0x2800), 0x11);
        vram.write_nametable(Mirroring::Vertical, 0x2400, 0x22);
        assert_eq!(vram.read_nametable(Mirroring::Vertical, 0x2C00), 0x22);
    }

    #[test]
    fn test_single_screen_aliases_everything() {
        let mut vram = Vram::new();
        vram.write_nametable(Mirroring::SingleScreenLower, 0x2000, 0x33);
        for base in [0x2000u16, 0x2400, 0x2800, 0x2C00] {
            assert_eq!(vram.read_nametable(Mirroring::SingleScreenLower, base), 0x33);
        }
        // The upper page is distinct.
        vram.write_nametable(Mirroring::SingleScreenUpper, 0x2000, 0x44);
        assert_eq!(vram.read_nametable(Mirroring::SingleScreenLower, 0x2000), 0x33);
        assert_eq!(vram.read_nametable(Mirroring::SingleScreenUpper, 0x2C00), 0x44);
    }

    #[test]
    fn test_four_screen_is_identity() {
        let mut vram = Vram::new();
        for (i, base) in [0x2000u16, 0x2400, 0x2800, 0x2C00].into_iter().enumerate() {
            vram.write_nametable(Mirroring::FourScreen, base, i as u8 + 1);
        }
        for (i, base) in [0x2000u16, 0x2400, 0x2800, 0x2C00].into_iter().enumerate() {
            assert_eq!(vram.read_nametable(Mirroring::FourScreen, base), i as u8 + 1);
        }
    }

    #[test]
    fn test_palette_mirror_folds() {
        let mut vram = Vram::new();
        for (alias, target) in [(0x10u16, 0x00u16), (0x14, 0x04), (0x18, 0x08), (0x1C, 0x0C)] {
            vram.write_palette(alias, 0x2A);
            assert_eq!(vram.read_palette(target), 0x2A);
            vram.write_palette(target, 0x15);
            assert_eq!(vram.read_palette(alias), 0x15);
        }
    }

    #[test]
    fn test_palette_entries_are_six_bit() {
        let mut vram = Vram::new();
        vram.write_palette(0x01, 0xFF);
        assert_eq!(vram.read_palette(0x01), 0x3F);
    }

    #[test]
    fn test_power_up_palette_survives_in_reset() {
        let mut vram = Vram::new();
        assert_eq!(vram.read_palette(0x00), 0x09);
        vram.write_palette(0x00, 0x20);
        vram.load_power_up_palette();
        assert_eq!(vram.read_palette(0x00), 0x09);
    }
}
