//! Per-dot PPU state machine.
//!
//! The PPU walks a (scanline, dot) grid with scanline in [-1, 260] and dot in
//! [0, 340]. Scanline -1 is the pre-render line, 0-239 are visible, 240 is
//! idle, and 241-260 are vertical blank. Each [`Ppu::clock`] call processes
//! one dot: background fetches, sprite evaluation, pixel output, flag and NMI
//! bookkeeping.

use crate::palette::NES_PALETTE;
use crate::registers::{Ctrl, Mask, PpuStatus};
use crate::scroll::Scroll;
use crate::sprites::{SpriteEvaluator, SpriteLine};
use crate::vram::Vram;
use crate::{PpuBus, FRAME_BYTES, FRAME_WIDTH};

/// Dots the NMI line change takes to reach the CPU.
const NMI_DELAY_DOTS: u8 = 14;
/// Dots the line must stay high for the delayed assertion to survive.
const NMI_HOLD_DOTS: u8 = 2;

/// Ricoh 2C02 PPU.
#[allow(clippy::struct_excessive_bools)] // Hardware latches are just bits.
pub struct Ppu {
    // Registers
    ctrl: Ctrl,
    mask: Mask,
    status: PpuStatus,
    oam_addr: u8,
    /// Cached MASK bits 3|4, sampled on writes.
    rendering_enabled: bool,

    // Memory
    vram: Vram,
    oam: [u8; 256],

    // Scroll unit and $2007 plumbing
    scroll: Scroll,
    data_buffer: u8,

    // Timing
    scanline: i16,
    dot: u16,
    odd_frame: bool,
    frame_complete: bool,

    // NMI edge machine
    /// Asserted NMI, consumed by the bus.
    nmi: bool,
    nmi_occurred: bool,
    nmi_output: bool,
    nmi_previous: bool,
    nmi_delay: u8,
    nmi_hold: u8,
    suppress_vblank: bool,
    suppress_nmi: bool,
    /// Rendering state sampled at pre-render dot 338 for the odd-frame skip.
    odd_skip_latch: bool,

    // Background pipeline
    bg_next_tile_id: u8,
    bg_next_tile_attr: u8,
    bg_next_tile_lsb: u8,
    bg_next_tile_msb: u8,
    bg_shifter_pattern_lo: u16,
    bg_shifter_pattern_hi: u16,
    bg_shifter_attr_lo: u16,
    bg_shifter_attr_hi: u16,

    // Sprites
    evaluator: SpriteEvaluator,
    line: SpriteLine,

    // Output
    frame: Vec<u8>,
}

impl Ppu {
    /// Create a PPU in its power-on state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            ctrl: Ctrl::empty(),
            mask: Mask::empty(),
            status: PpuStatus::empty(),
            oam_addr: 0,
            rendering_enabled: false,
            vram: Vram::new(),
            oam: [0; 256],
            scroll: Scroll::default(),
            data_buffer: 0,
            scanline: -1,
            dot: 0,
            odd_frame: false,
            frame_complete: false,
            nmi: false,
            nmi_occurred: false,
            nmi_output: false,
            nmi_previous: false,
            nmi_delay: 0,
            nmi_hold: 0,
            suppress_vblank: false,
            suppress_nmi: false,
            odd_skip_latch: false,
            bg_next_tile_id: 0,
            bg_next_tile_attr: 0,
            bg_next_tile_lsb: 0,
            bg_next_tile_msb: 0,
            bg_shifter_pattern_lo: 0,
            bg_shifter_pattern_hi: 0,
            bg_shifter_attr_lo: 0,
            bg_shifter_attr_hi: 0,
            evaluator: SpriteEvaluator::default(),
            line: SpriteLine::default(),
            frame: vec![0; FRAME_BYTES],
        }
    }

    /// Reset: registers and timing cleared, power-up palette reloaded.
    /// Nametable and OAM contents survive, as on the console.
    pub fn reset(&mut self) {
        self.ctrl = Ctrl::empty();
        self.mask = Mask::empty();
        self.status = PpuStatus::empty();
        self.oam_addr = 0;
        self.rendering_enabled = false;
        self.scroll = Scroll::default();
        self.data_buffer = 0;
        self.scanline = -1;
        self.dot = 0;
        self.odd_frame = false;
        self.frame_complete = false;
        self.nmi = false;
        self.nmi_occurred = false;
        self.nmi_output = false;
        self.nmi_previous = false;
        self.nmi_delay = 0;
        self.nmi_hold = 0;
        self.suppress_vblank = false;
        self.suppress_nmi = false;
        self.odd_skip_latch = false;
        self.bg_next_tile_id = 0;
        self.bg_next_tile_attr = 0;
        self.bg_next_tile_lsb = 0;
        self.bg_next_tile_msb = 0;
        self.bg_shifter_pattern_lo = 0;
        self.bg_shifter_pattern_hi = 0;
        self.bg_shifter_attr_lo = 0;
        self.bg_shifter_attr_hi = 0;
        self.evaluator = SpriteEvaluator::default();
        self.line = SpriteLine::default();
        self.vram.load_power_up_palette();
    }

    // ---------------------------------------------------------------------
    // NMI edge machine
    // ---------------------------------------------------------------------

    fn nmi_change(&mut self) {
        let nmi_line = self.nmi_output && self.nmi_occurred;
        if nmi_line && !self.nmi_previous {
            // The assertion is not instantaneous on hardware; a short window
            // remains in which a VBlank clear or a $2002 read cancels it.
            self.nmi_delay = NMI_DELAY_DOTS;
            self.nmi_hold = NMI_HOLD_DOTS;
        }
        self.nmi_previous = nmi_line;
    }

    fn set_vblank(&mut self, active: bool) {
        self.status.set(PpuStatus::VBLANK, active);
        self.nmi_occurred = active;
        self.nmi_change();
    }

    /// Consume the asserted NMI line, if any.
    pub fn take_nmi(&mut self) -> bool {
        if self.nmi {
            self.nmi = false;
            true
        } else {
            false
        }
    }

    // ---------------------------------------------------------------------
    // PPU address space
    // ---------------------------------------------------------------------

    /// Read the PPU address space: pattern tables through the cartridge,
    /// nametables with the active mirroring, palette RAM with its folds.
    pub fn ppu_read(&self, addr: u16, bus: &mut impl PpuBus) -> u8 {
        let addr = addr & 0x3FFF;
        if addr <= 0x1FFF {
            bus.chr_read(addr)
        } else if addr <= 0x3EFF {
            self.vram.read_nametable(bus.mirroring(), addr)
        } else {
            self.vram.read_palette(addr)
        }
    }

    /// Write the PPU address space.
    pub fn ppu_write(&mut self, addr: u16, value: u8, bus: &mut impl PpuBus) {
        let addr = addr & 0x3FFF;
        if addr <= 0x1FFF {
            bus.chr_write(addr, value);
        } else if addr <= 0x3EFF {
            self.vram.write_nametable(bus.mirroring(), addr, value);
        } else {
            self.vram.write_palette(addr, value);
        }
    }

    // ---------------------------------------------------------------------
    // CPU register interface ($2000-$2007)
    // ---------------------------------------------------------------------

    /// CPU read of a PPU register.
    pub fn read_register(&mut self, addr: u16, bus: &mut impl PpuBus) -> u8 {
        match addr & 0x0007 {
            0x0002 => {
                let data = (self.status.bits() & 0xE0) | (self.data_buffer & 0x1F);
                if self.scanline == 241 && self.dot == 1 {
                    // Reading on the exact VBlank-set dot hides the flag and
                    // the NMI for this frame.
                    self.suppress_vblank = true;
                    self.suppress_nmi = true;
                } else if self.scanline == 241 && (self.dot == 2 || self.dot == 3) {
                    self.suppress_nmi = true;
                    self.nmi_delay = 0;
                    self.nmi_hold = 0;
                    self.nmi = false;
                }
                self.set_vblank(false);
                self.scroll.reset_latch();
                data
            }
            0x0004 => self.oam[usize::from(self.oam_addr)],
            0x0007 => {
                let addr = self.scroll.v & 0x3FFF;
                let data = if addr >= 0x3F00 {
                    // Palette reads bypass the buffer, but the hidden read
                    // still refreshes it from the mirrored nametable space.
                    let value = self.ppu_read(addr, bus);
                    self.data_buffer = self.ppu_read((addr - 0x1000) & 0x3FFF, bus);
                    value
                } else {
                    let buffered = self.data_buffer;
                    self.data_buffer = self.ppu_read(addr, bus);
                    buffered
                };
                self.scroll.increment_vram(self.ctrl.vram_increment());
                data
            }
            _ => 0x00,
        }
    }

    /// CPU write to a PPU register.
    pub fn write_register(&mut self, addr: u16, value: u8, bus: &mut impl PpuBus) {
        match addr & 0x0007 {
            0x0000 => {
                self.ctrl = Ctrl::from_bits_truncate(value);
                self.nmi_output = self.ctrl.contains(Ctrl::NMI_ENABLE);
                self.nmi_change();
                self.scroll.write_ctrl(value);
            }
            0x0001 => {
                self.mask = Mask::from_bits_truncate(value);
                self.rendering_enabled = self.mask.rendering_enabled();
            }
            0x0003 => self.oam_addr = value,
            0x0004 => {
                self.oam[usize::from(self.oam_addr)] = value;
                self.oam_addr = self.oam_addr.wrapping_add(1);
            }
            0x0005 => self.scroll.write_scroll(value),
            0x0006 => self.scroll.write_addr(value),
            0x0007 => {
                self.ppu_write(self.scroll.v, value, bus);
                self.scroll.increment_vram(self.ctrl.vram_increment());
            }
            _ => {}
        }
    }

    /// OAMDMA payload: 256 bytes written through OAMADDR.
    pub fn oam_dma(&mut self, data: &[u8]) {
        for (index, &value) in data.iter().enumerate() {
            let addr = usize::from(self.oam_addr.wrapping_add(index as u8));
            self.oam[addr] = value;
        }
    }

    // ---------------------------------------------------------------------
    // Background pipeline
    // ---------------------------------------------------------------------

    fn load_background_shifters(&mut self) {
        self.bg_shifter_pattern_lo =
            (self.bg_shifter_pattern_lo & 0xFF00) | u16::from(self.bg_next_tile_lsb);
        self.bg_shifter_pattern_hi =
            (self.bg_shifter_pattern_hi & 0xFF00) | u16::from(self.bg_next_tile_msb);
        let attr_lo = if self.bg_next_tile_attr & 0x01 != 0 { 0xFF } else { 0x00 };
        let attr_hi = if self.bg_next_tile_attr & 0x02 != 0 { 0xFF } else { 0x00 };
        self.bg_shifter_attr_lo = (self.bg_shifter_attr_lo & 0xFF00) | attr_lo;
        self.bg_shifter_attr_hi = (self.bg_shifter_attr_hi & 0xFF00) | attr_hi;
    }

    fn update_shifters(&mut self) {
        if self.mask.contains(Mask::SHOW_BACKGROUND) {
            self.bg_shifter_pattern_lo <<= 1;
            self.bg_shifter_pattern_hi <<= 1;
            self.bg_shifter_attr_lo <<= 1;
            self.bg_shifter_attr_hi <<= 1;
        }
        // Sprite countdowns and shifters advance only across visible dots.
        if self.mask.contains(Mask::SHOW_SPRITES)
            && (0..240).contains(&self.scanline)
            && (2..=256).contains(&self.dot)
        {
            self.line.advance();
        }
    }

    fn fetch_background(&mut self, bus: &mut impl PpuBus) {
        match (self.dot - 1) % 8 {
            0 => {
                self.load_background_shifters();
                self.bg_next_tile_id = self.ppu_read(0x2000 | (self.scroll.v & 0x0FFF), bus);
            }
            2 => {
                let v = self.scroll.v;
                let addr = 0x23C0 | (v & 0x0C00) | ((v >> 4) & 0x38) | ((v >> 2) & 0x07);
                let mut attr = self.ppu_read(addr, bus);
                if v & 0x0040 != 0 {
                    attr >>= 4;
                }
                if v & 0x0002 != 0 {
                    attr >>= 2;
                }
                self.bg_next_tile_attr = attr & 0x03;
            }
            4 => {
                let addr = self.ctrl.background_table()
                    + u16::from(self.bg_next_tile_id) * 16
                    + self.scroll.fine_y();
                self.bg_next_tile_lsb = self.ppu_read(addr, bus);
            }
            6 => {
                let addr = self.ctrl.background_table()
                    + u16::from(self.bg_next_tile_id) * 16
                    + self.scroll.fine_y()
                    + 8;
                self.bg_next_tile_msb = self.ppu_read(addr, bus);
            }
            7 => {
                if self.rendering_enabled {
                    self.scroll.increment_x();
                }
            }
            _ => {}
        }
    }

    // ---------------------------------------------------------------------
    // Sprite pipeline
    // ---------------------------------------------------------------------

    fn fetch_sprite_patterns(&mut self, bus: &mut impl PpuBus) {
        let sprite_height = self.ctrl.sprite_height();
        for i in 0..usize::from(self.line.count) {
            let [y, tile, attr, _] = self.line.sprites[i];
            let mut row = self.scanline - i16::from(y);
            if attr & 0x80 != 0 {
                row = sprite_height - 1 - row;
            }
            let addr = if sprite_height == 8 {
                i32::from(self.ctrl.sprite_table()) + i32::from(tile) * 16 + i32::from(row)
            } else {
                let table = i32::from(tile & 0x01) * 0x1000;
                let mut tile = tile & 0xFE;
                if row > 7 {
                    tile += 1;
                    row -= 8;
                }
                table + i32::from(tile) * 16 + i32::from(row)
            };
            let mut lo = self.ppu_read((addr & 0x3FFF) as u16, bus);
            let mut hi = self.ppu_read(((addr + 8) & 0x3FFF) as u16, bus);
            if attr & 0x40 != 0 {
                lo = lo.reverse_bits();
                hi = hi.reverse_bits();
            }
            self.line.shifter_lo[i] = lo;
            self.line.shifter_hi[i] = hi;
        }
    }

    // ---------------------------------------------------------------------
    // Pixel output
    // ---------------------------------------------------------------------

    fn render_pixel(&mut self) {
        let mut bg_pixel = 0u8;
        let mut bg_palette = 0u8;
        if self.mask.contains(Mask::SHOW_BACKGROUND)
            && (self.mask.contains(Mask::SHOW_BACKGROUND_LEFT) || self.dot > 8)
        {
            let bit = 0x8000u16 >> self.scroll.fine_x;
            let p0 = u8::from(self.bg_shifter_pattern_lo & bit != 0);
            let p1 = u8::from(self.bg_shifter_pattern_hi & bit != 0);
            bg_pixel = (p1 << 1) | p0;
            let a0 = u8::from(self.bg_shifter_attr_lo & bit != 0);
            let a1 = u8::from(self.bg_shifter_attr_hi & bit != 0);
            bg_palette = (a1 << 1) | a0;
        }

        let mut fg_pixel = 0u8;
        let mut fg_palette = 0u8;
        let mut fg_in_front = false;
        let mut sprite_zero_rendered = false;
        if self.mask.contains(Mask::SHOW_SPRITES)
            && (self.mask.contains(Mask::SHOW_SPRITES_LEFT) || self.dot > 8)
        {
            if let Some((pixel, palette, in_front, is_zero)) = self.line.pixel() {
                fg_pixel = pixel;
                fg_palette = palette;
                fg_in_front = in_front;
                sprite_zero_rendered = is_zero;
            }
        }

        let (pixel, palette) = if bg_pixel == 0 && fg_pixel == 0 {
            (0, 0)
        } else if bg_pixel == 0 {
            (fg_pixel, fg_palette)
        } else if fg_pixel == 0 {
            (bg_pixel, bg_palette)
        } else {
            if self.line.sprite_zero_possible
                && sprite_zero_rendered
                && self.mask.rendering_enabled()
                && self.dot != 256
            {
                let clipped_left = self.dot <= 8
                    && (!self.mask.contains(Mask::SHOW_BACKGROUND_LEFT)
                        || !self.mask.contains(Mask::SHOW_SPRITES_LEFT));
                if !clipped_left {
                    self.status.insert(PpuStatus::SPRITE_ZERO_HIT);
                }
            }
            if fg_in_front {
                (fg_pixel, fg_palette)
            } else {
                (bg_pixel, bg_palette)
            }
        };

        let palette_addr = u16::from(((palette & 0x07) << 2) | (pixel & 0x03));
        let color = self.vram.read_palette(palette_addr);
        let (red, green, blue) = NES_PALETTE[usize::from(color)];

        let x = usize::from(self.dot - 1);
        let y = self.scanline as usize;
        let index = (y * FRAME_WIDTH + x) * 3;
        self.frame[index] = red;
        self.frame[index + 1] = green;
        self.frame[index + 2] = blue;
    }

    // ---------------------------------------------------------------------
    // Dot clock
    // ---------------------------------------------------------------------

    /// Advance one dot.
    #[allow(clippy::too_many_lines)] // One pass over the (scanline, dot) grid.
    pub fn clock(&mut self, bus: &mut impl PpuBus) {
        // Delayed NMI assertion, cancellable while the line droops.
        if self.nmi_delay > 0 {
            let nmi_line = self.nmi_output && self.nmi_occurred;
            if self.nmi_hold > 0 {
                if nmi_line {
                    self.nmi_hold -= 1;
                } else {
                    self.nmi_delay = 0;
                    self.nmi_hold = 0;
                }
            }
            if self.nmi_delay > 0 {
                self.nmi_delay -= 1;
                if self.nmi_delay == 0 {
                    self.nmi = true;
                }
            } else {
                self.nmi = false;
            }
        }

        if self.scanline == -1 && self.dot == 1 {
            self.set_vblank(false);
            self.status
                .remove(PpuStatus::SPRITE_ZERO_HIT | PpuStatus::SPRITE_OVERFLOW);
            self.suppress_nmi = false;
            self.odd_skip_latch = false;
        }

        if self.scanline < 240 {
            if self.scanline >= 0 && self.dot == 65 {
                self.evaluator.begin();
            }
            if self.scanline >= 0
                && (65..=256).contains(&self.dot)
                && self.rendering_enabled
                && self.evaluator.clock(
                    self.dot,
                    self.scanline,
                    self.ctrl.sprite_height(),
                    &self.oam,
                )
            {
                self.status.insert(PpuStatus::SPRITE_OVERFLOW);
            }

            if (2..258).contains(&self.dot) || (321..338).contains(&self.dot) {
                self.update_shifters();
                self.fetch_background(bus);
            }

            if self.dot == 256 && self.rendering_enabled {
                self.scroll.increment_y();
            }
            if self.dot == 257 {
                self.load_background_shifters();
                if self.rendering_enabled {
                    self.scroll.copy_x();
                }
            }

            // Garbage nametable fetches at the end of the line.
            if self.dot == 338 || self.dot == 340 {
                self.bg_next_tile_id = self.ppu_read(0x2000 | (self.scroll.v & 0x0FFF), bus);
            }

            if self.scanline == -1 && (280..305).contains(&self.dot) && self.rendering_enabled {
                self.scroll.copy_y();
            }

            if self.dot == 257 && self.scanline >= 0 {
                self.line.clear();
                if self.rendering_enabled {
                    self.line.latch(&self.evaluator);
                }
            }

            if self.dot == 340 {
                self.fetch_sprite_patterns(bus);
            }
        }

        if self.scanline == 241 && self.dot == 1 {
            if self.suppress_vblank {
                self.set_vblank(false);
            } else {
                self.set_vblank(true);
            }
            if self.suppress_nmi {
                self.nmi_delay = 0;
                self.nmi_hold = 0;
                self.nmi = false;
            }
            self.suppress_vblank = false;
        }

        if (0..240).contains(&self.scanline) && (1..=256).contains(&self.dot) {
            self.render_pixel();
        }

        // Mapper scanline counter, clocked late in each visible line.
        if self.rendering_enabled && self.dot == 260 && (0..240).contains(&self.scanline) {
            bus.clock_scanline();
        }

        if self.scanline == -1 && self.dot == 338 {
            self.odd_skip_latch = self.rendering_enabled;
        }

        // Odd frames with rendering enabled skip the last pre-render dot.
        if self.scanline == -1 && self.dot == 339 && self.odd_frame && self.odd_skip_latch {
            self.dot = 0;
            self.scanline = 0;
            return;
        }

        self.dot += 1;
        if self.dot >= 341 {
            self.dot = 0;
            self.scanline += 1;
            if self.scanline >= 261 {
                self.scanline = -1;
                self.frame_complete = true;
                self.odd_frame = !self.odd_frame;
            }
        }
    }

    // ---------------------------------------------------------------------
    // Accessors
    // ---------------------------------------------------------------------

    /// Completed frame as packed RGB8, 256x240x3 bytes, row-major.
    #[must_use]
    pub fn frame(&self) -> &[u8] {
        &self.frame
    }

    /// Whether a frame finished since the last acknowledgement.
    #[must_use]
    pub fn frame_complete(&self) -> bool {
        self.frame_complete
    }

    /// Acknowledge the completed frame.
    pub fn acknowledge_frame(&mut self) {
        self.frame_complete = false;
    }

    /// Current scanline, -1 through 260.
    #[must_use]
    pub fn scanline(&self) -> i16 {
        self.scanline
    }

    /// Current dot, 0 through 340.
    #[must_use]
    pub fn dot(&self) -> u16 {
        self.dot
    }
}

impl Default for Ppu {
    fn default() -> Self {
        Self::new()
    }
}
