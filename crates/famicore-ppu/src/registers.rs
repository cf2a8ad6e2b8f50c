//! CPU-visible PPU register bitfields.

use bitflags::bitflags;

bitflags! {
    /// $2000 PPUCTRL.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Ctrl: u8 {
        /// Base nametable address, bit 0.
        const NAMETABLE_X = 1 << 0;
        /// Base nametable address, bit 1.
        const NAMETABLE_Y = 1 << 1;
        /// VRAM address increment: 0 adds 1, 1 adds 32.
        const INCREMENT_32 = 1 << 2;
        /// Sprite pattern table for 8x8 sprites.
        const SPRITE_TABLE = 1 << 3;
        /// Background pattern table.
        const BACKGROUND_TABLE = 1 << 4;
        /// Sprite size: 0 is 8x8, 1 is 8x16.
        const SPRITE_SIZE_16 = 1 << 5;
        /// Master/slave select (unused by the core).
        const MASTER_SLAVE = 1 << 6;
        /// Generate an NMI at the start of vertical blank.
        const NMI_ENABLE = 1 << 7;
    }
}

impl Ctrl {
    /// $2007 address increment.
    #[must_use]
    pub fn vram_increment(self) -> u16 {
        if self.contains(Self::INCREMENT_32) {
            32
        } else {
            1
        }
    }

    /// Background pattern table base address.
    #[must_use]
    pub fn background_table(self) -> u16 {
        if self.contains(Self::BACKGROUND_TABLE) {
            0x1000
        } else {
            0x0000
        }
    }

    /// Sprite pattern table base address (8x8 sprites only).
    #[must_use]
    pub fn sprite_table(self) -> u16 {
        if self.contains(Self::SPRITE_TABLE) {
            0x1000
        } else {
            0x0000
        }
    }

    /// Sprite height in scanlines.
    #[must_use]
    pub fn sprite_height(self) -> i16 {
        if self.contains(Self::SPRITE_SIZE_16) {
            16
        } else {
            8
        }
    }
}

bitflags! {
    /// $2001 PPUMASK.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Mask: u8 {
        /// Grayscale output.
        const GRAYSCALE = 1 << 0;
        /// Show the background in the leftmost 8 pixels.
        const SHOW_BACKGROUND_LEFT = 1 << 1;
        /// Show sprites in the leftmost 8 pixels.
        const SHOW_SPRITES_LEFT = 1 << 2;
        /// Enable background rendering.
        const SHOW_BACKGROUND = 1 << 3;
        /// Enable sprite rendering.
        const SHOW_SPRITES = 1 << 4;
        /// Emphasize red.
        const EMPHASIZE_RED = 1 << 5;
        /// Emphasize green.
        const EMPHASIZE_GREEN = 1 << 6;
        /// Emphasize blue.
        const EMPHASIZE_BLUE = 1 << 7;
    }
}

impl Mask {
    /// Rendering is enabled when either layer is on.
    #[must_use]
    pub fn rendering_enabled(self) -> bool {
        self.intersects(Self::SHOW_BACKGROUND | Self::SHOW_SPRITES)
    }
}

bitflags! {
    /// $2002 PPUSTATUS. Only the top three bits are driven.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct PpuStatus: u8 {
        /// Sprite overflow (more than 8 sprites on a scanline).
        const SPRITE_OVERFLOW = 1 << 5;
        /// Sprite 0 hit.
        const SPRITE_ZERO_HIT = 1 << 6;
        /// Vertical blank has started.
        const VBLANK = 1 << 7;
    }
}
