//! Shared helpers for the integration tests: synthetic iNES images and the
//! blargg `$6000` status protocol.

// Each test binary pulls in the subset it needs.
#![allow(dead_code)]

use famicore_core::{Cartridge, Console};

/// Assemble a minimal iNES 1.0 image.
///
/// `prg` is copied to the start of PRG-ROM; the rest is NOP ($EA) filled.
/// The reset vector points at $8000 and the IRQ/BRK vector at `irq_vector`.
#[must_use]
pub fn build_ines(
    mapper: u8,
    prg_banks: u8,
    chr_banks: u8,
    prg: &[u8],
    irq_vector: u16,
) -> Vec<u8> {
    let prg_size = usize::from(prg_banks) * 0x4000;
    assert!(prg.len() <= prg_size);

    let mut image = vec![0x4E, 0x45, 0x53, 0x1A];
    image.push(prg_banks);
    image.push(chr_banks);
    image.push((mapper & 0x0F) << 4);
    image.push(mapper & 0xF0);
    image.extend_from_slice(&[0; 8]);

    let mut prg_rom = vec![0xEAu8; prg_size];
    prg_rom[..prg.len()].copy_from_slice(prg);
    // Vectors live in the fixed bank at the top of the address space.
    prg_rom[prg_size - 6] = 0x00; // NMI -> $8000
    prg_rom[prg_size - 5] = 0x80;
    prg_rom[prg_size - 4] = 0x00; // reset -> $8000
    prg_rom[prg_size - 3] = 0x80;
    prg_rom[prg_size - 2] = (irq_vector & 0xFF) as u8;
    prg_rom[prg_size - 1] = (irq_vector >> 8) as u8;

    image.extend_from_slice(&prg_rom);
    image.extend(std::iter::repeat(0u8).take(usize::from(chr_banks) * 0x2000));
    image
}

/// Build a console from an assembled image.
#[must_use]
pub fn console_from_image(image: &[u8]) -> Console {
    let cartridge = Cartridge::from_ines(image).expect("valid test image");
    Console::new(cartridge)
}

/// Build a console from a ROM file on disk.
#[must_use]
pub fn console_from_image_path(path: &std::path::Path) -> Console {
    let image = std::fs::read(path).expect("readable ROM");
    console_from_image(&image)
}

/// A console wired to a NROM cartridge whose PRG is a NOP slide and whose
/// CHR is 8 KiB of RAM. The CPU spins harmlessly while tests drive the bus.
#[must_use]
pub fn nop_console() -> Console {
    console_from_image(&build_ines(0, 2, 0, &[], 0x8000))
}

/// Outcome of a blargg-protocol run.
#[derive(Debug)]
pub struct BlarggOutcome {
    /// Final status byte at $6000.
    pub status: u8,
    /// ASCII message from $6004.
    pub message: String,
    /// Instructions executed.
    pub instructions: u32,
}

/// Drive a console under the blargg `$6000` protocol: the test ROM stores
/// the magic DE B0 61 at $6001-$6003, runs with $6000 = $80/$81, and leaves
/// its final status at $6000 with an ASCII message at $6004.
#[must_use]
pub fn run_blargg(console: &mut Console, max_instructions: u32) -> BlarggOutcome {
    for instruction in 1..=max_instructions {
        console.step_instruction();

        let signature_ok = console.peek(0x6001) == 0xDE
            && console.peek(0x6002) == 0xB0
            && console.peek(0x6003) == 0x61;
        if signature_ok {
            let status = console.peek(0x6000);
            if status != 0x80 && status != 0x81 {
                return BlarggOutcome {
                    status,
                    message: read_ascii(console, 0x6004),
                    instructions: instruction,
                };
            }
        }
    }
    BlarggOutcome {
        status: 0xFF,
        message: String::from("timed out waiting for final status"),
        instructions: max_instructions,
    }
}

/// Read a NUL-terminated printable string through `peek`.
#[must_use]
pub fn read_ascii(console: &Console, start: u16) -> String {
    let mut text = String::new();
    for offset in 0..512 {
        let value = console.peek(start + offset);
        if value == 0 {
            break;
        }
        if (0x20..0x7F).contains(&value) || value == b'\n' || value == b'\r' || value == b'\t' {
            text.push(char::from(value));
        }
    }
    text.trim().to_string()
}

/// Workspace root, for locating optional test ROMs.
#[must_use]
pub fn workspace_root() -> std::path::PathBuf {
    std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .parent()
        .unwrap()
        .to_path_buf()
}
