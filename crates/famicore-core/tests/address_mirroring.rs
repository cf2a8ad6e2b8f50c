//! Address-space equivalence classes: RAM mirrors, nametable mirroring and
//! palette folds, exercised through the CPU-visible register interface.

mod common;

use common::{build_ines, console_from_image, nop_console};
use famicore_core::{Bus, Console};
use proptest::prelude::*;

fn vram_write(console: &mut Console, addr: u16, value: u8) {
    let bus = console.bus_mut();
    Bus::write(bus, 0x2006, (addr >> 8) as u8);
    Bus::write(bus, 0x2006, (addr & 0xFF) as u8);
    Bus::write(bus, 0x2007, value);
}

fn vram_read(console: &mut Console, addr: u16) -> u8 {
    let bus = console.bus_mut();
    Bus::write(bus, 0x2006, (addr >> 8) as u8);
    Bus::write(bus, 0x2006, (addr & 0xFF) as u8);
    let _ = Bus::read(bus, 0x2007); // prime the read buffer
    Bus::read(bus, 0x2007)
}

fn palette_read(console: &mut Console, addr: u16) -> u8 {
    // Palette reads are unbuffered.
    let bus = console.bus_mut();
    Bus::write(bus, 0x2006, (addr >> 8) as u8);
    Bus::write(bus, 0x2006, (addr & 0xFF) as u8);
    Bus::read(bus, 0x2007)
}

#[test]
fn test_vertical_mirroring_classes() {
    // Header bit 0 set: vertical mirroring.
    let mut image = build_ines(0, 2, 0, &[], 0x8000);
    image[6] |= 0x01;
    let mut console = console_from_image(&image);

    vram_write(&mut console, 0x2005, 0x11);
    assert_eq!(vram_read(&mut console, 0x2805), 0x11, "$2000 pairs with $2800");
    vram_write(&mut console, 0x2403, 0x22);
    assert_eq!(vram_read(&mut console, 0x2C03), 0x22, "$2400 pairs with $2C00");
    assert_ne!(vram_read(&mut console, 0x2005), 0x22);
}

#[test]
fn test_horizontal_mirroring_classes() {
    let mut console = console_from_image(&build_ines(0, 2, 0, &[], 0x8000));

    vram_write(&mut console, 0x2005, 0x33);
    assert_eq!(vram_read(&mut console, 0x2405), 0x33, "$2000 pairs with $2400");
    vram_write(&mut console, 0x2807, 0x44);
    assert_eq!(vram_read(&mut console, 0x2C07), 0x44, "$2800 pairs with $2C00");
    assert_ne!(vram_read(&mut console, 0x2005), 0x44);
}

#[test]
fn test_nametable_space_mirrors_at_3000() {
    let mut console = nop_console();
    vram_write(&mut console, 0x2123, 0x55);
    assert_eq!(vram_read(&mut console, 0x3123), 0x55);
}

#[test]
fn test_palette_folds_both_directions() {
    let mut console = nop_console();
    for (alias, target) in [
        (0x3F10u16, 0x3F00u16),
        (0x3F14, 0x3F04),
        (0x3F18, 0x3F08),
        (0x3F1C, 0x3F0C),
    ] {
        vram_write(&mut console, alias, 0x21);
        assert_eq!(palette_read(&mut console, target), 0x21);
        vram_write(&mut console, target, 0x12);
        assert_eq!(palette_read(&mut console, alias), 0x12);
    }
}

proptest! {
    #[test]
    fn ram_mirrors_every_0800(addr in 0u16..0x0800, offset in 0u16..4, value: u8) {
        let mut console = nop_console();
        let bus = console.bus_mut();
        Bus::write(bus, addr, value);
        prop_assert_eq!(Bus::read(bus, addr + offset * 0x0800), value);
    }

    #[test]
    fn ppu_registers_mirror_every_8(mirror in 0u16..0x0400, value: u8) {
        // OAMADDR+OAMDATA observed through an arbitrary mirror of the
        // register window.
        let mut console = nop_console();
        let bus = console.bus_mut();
        let base = 0x2000 + mirror * 8;
        Bus::write(bus, 0x2003, 0x40);
        Bus::write(bus, base + 4, value);
        Bus::write(bus, base + 3, 0x40);
        prop_assert_eq!(Bus::read(bus, 0x2004), value);
    }
}
