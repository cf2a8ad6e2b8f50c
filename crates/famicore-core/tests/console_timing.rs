//! Console-level timing invariants: the 3:1 dot ratio and OAMDMA stalls.

mod common;

use common::{build_ines, console_from_image, nop_console};
use famicore_core::Bus;

/// PPU dots processed since power-on, recovered from the frame position.
fn dots_into_frame(scanline: i16, dot: u16) -> u64 {
    (scanline + 1) as u64 * 341 + u64::from(dot)
}

#[test]
fn test_ppu_advances_three_dots_per_cpu_cycle() {
    let mut console = nop_console();

    for _ in 0..5_000 {
        console.step_instruction();
    }

    // The reset sequence charges 7 cycles without clocking the PPU.
    let cpu_cycles = console.cpu().cycles - 7;
    let ppu = &console.bus().ppu;
    let dots = dots_into_frame(ppu.scanline(), ppu.dot());
    assert_eq!(dots, cpu_cycles * 3, "rendering disabled, single frame");
    assert!(!ppu.frame_complete());
}

#[test]
fn test_cycle_accounting_matches_documented_counts() {
    let program = [
        0xA9, 0x01, // LDA #$01        2 cycles
        0x8D, 0x00, 0x02, // STA $0200 4
        0xAD, 0x00, 0x02, // LDA $0200 4
        0xE8, // INX                   2
        0x4C, 0x09, 0x80, // JMP self  3
    ];
    let mut console = console_from_image(&build_ines(0, 2, 0, &program, 0x8000));

    let expected = [2u32, 4, 4, 2, 3];
    for want in expected {
        let got = console.step_instruction();
        assert_eq!(got, want);
    }
}

#[test]
fn test_oam_dma_copies_and_stalls() {
    // LDX #$00; loop: TXA; STA $0200,X; INX; BNE loop; LDA #$02; STA $4014.
    let program = [
        0xA2, 0x00, // LDX #$00
        0x8A, // TXA
        0x9D, 0x00, 0x02, // STA $0200,X
        0xE8, // INX
        0xD0, 0xF9, // BNE back to TXA
        0xA9, 0x02, // LDA #$02
        0x8D, 0x14, 0x40, // STA $4014
    ];
    let mut console = console_from_image(&build_ines(0, 2, 0, &program, 0x8000));

    // Run the fill loop up to the DMA trigger.
    while console.cpu().pc != 0x800B {
        console.step_instruction();
    }
    let cycles_before_sta = console.cpu().cycles;
    let sta_cycles = console.step_instruction();
    assert_eq!(sta_cycles, 4);

    // The stall drains one idle cycle per step.
    let expected_stall = 513 + (cycles_before_sta & 1) as u32;
    let mut stall = 0u32;
    while console.step_instruction() == 1 {
        stall += 1;
    }
    assert_eq!(stall, expected_stall);

    // OAM now holds the page, readable back through OAMDATA.
    let bus = console.bus_mut();
    Bus::write(bus, 0x2003, 0x00);
    for i in 0..=255u8 {
        Bus::write(bus, 0x2003, i);
        assert_eq!(Bus::read(bus, 0x2004), i, "OAM[{i}]");
    }
}

#[test]
fn test_stalled_cpu_still_clocks_ppu() {
    let mut console = nop_console();
    let bus = console.bus_mut();
    Bus::write(bus, 0x4014, 0x00);

    let ppu_before = {
        let ppu = &console.bus().ppu;
        dots_into_frame(ppu.scanline(), ppu.dot())
    };
    let cycles_before = console.cpu().cycles;

    // The first step collects the externally latched stall, then the CPU
    // idles one cycle per step until it drains.
    console.step_instruction();
    while console.step_instruction() == 1 {}

    let ppu_after = {
        let ppu = &console.bus().ppu;
        dots_into_frame(ppu.scanline(), ppu.dot())
    };
    let cycles = console.cpu().cycles - cycles_before;
    assert!(cycles > 513, "stall plus the surrounding instructions");
    assert_eq!(ppu_after - ppu_before, cycles * 3);
}
