//! APU emulation reduced to the frame-counter IRQ.
//!
//! The core models the APU's CPU-visible surface: the 24-byte register file,
//! the $4015 status read with its clear-on-read frame IRQ flag, and the
//! $4017 frame counter with its IRQ-inhibit bit. Square/triangle/noise/DMC
//! synthesis is out of scope; games that only need the frame IRQ for timing
//! run correctly without it.

mod apu;
mod frame_counter;

pub use apu::Apu;
pub use frame_counter::{FrameCounter, FrameCounterMode, FRAME_PERIOD};
