//! famicore - NES emulation core.
//!
//! This crate ties the CPU, PPU, APU, mappers and controllers together into
//! a steppable console:
//!
//! ```text
//! ┌───────────────────────────────────────────────────┐
//! │                     Console                       │
//! │  ┌─────────────────────────────────────────────┐  │
//! │  │                   NesBus                    │  │
//! │  │  ┌─────┐ ┌─────┐ ┌─────┐ ┌─────────┐ ┌────┐ │  │
//! │  │  │ RAM │ │ PPU │ │ APU │ │Cartridge│ │Pads│ │  │
//! │  │  └─────┘ └─────┘ └─────┘ └─────────┘ └────┘ │  │
//! │  └─────────────────────────────────────────────┘  │
//! │                        ▲                          │
//! │                   ┌────┴────┐                     │
//! │                   │  6502   │                     │
//! │                   └─────────┘                     │
//! └───────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```no_run
//! use famicore_core::{Button, Cartridge, Console, ControllerPort};
//!
//! let image = std::fs::read("game.nes").expect("read ROM");
//! let cartridge = Cartridge::from_ines(&image).expect("parse ROM");
//! let mut console = Console::new(cartridge);
//!
//! loop {
//!     console.set_button(ControllerPort::One, Button::Start, true);
//!     let frame = console.step_frame(1_000_000).expect("frame");
//!     // frame is 256x240 packed RGB8, ready to blit.
//!     # let _ = frame; break;
//! }
//! ```

mod bus;
mod console;
pub mod input;

pub use bus::NesBus;
pub use console::{Console, ControllerPort, EmulatorError};
pub use input::{Button, Controller};

// Re-export the component crates' front types.
pub use famicore_apu::Apu;
pub use famicore_cpu::{Bus, Cpu};
pub use famicore_mappers::{Cartridge, Mapper, Mirroring, Rom, RomError, RomHeader};
pub use famicore_ppu::{Ppu, FRAME_BYTES, FRAME_HEIGHT, FRAME_WIDTH};

/// Screen geometry.
pub mod screen {
    /// Screen width in pixels.
    pub const WIDTH: usize = famicore_ppu::FRAME_WIDTH;
    /// Screen height in pixels.
    pub const HEIGHT: usize = famicore_ppu::FRAME_HEIGHT;
    /// Bytes per RGB8 frame.
    pub const FRAME_BYTES: usize = famicore_ppu::FRAME_BYTES;
}
