//! APU frame counter.
//!
//! Only the IRQ-generating behavior is modelled: a tick counter clocked once
//! per CPU cycle raises the frame IRQ flag at the end of each frame-counter
//! period unless the inhibit bit is set. Envelope/length/sweep clocking
//! belongs to the audio synthesis layer, which this core does not carry.

/// Frame counter sequencer mode, from $4017 bit 7.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FrameCounterMode {
    /// 4-step sequence; generates the frame IRQ.
    #[default]
    FourStep,
    /// 5-step sequence.
    FiveStep,
}

/// CPU cycles per frame-counter period.
///
/// A single period is used for both modes; splitting 4-step and 5-step
/// timing matters only for audio synthesis.
pub const FRAME_PERIOD: u32 = 29_830;

/// Frame counter state.
#[derive(Debug, Clone, Default)]
pub struct FrameCounter {
    /// CPU cycles into the current period.
    ticks: u32,
    /// Sequencer mode from the last $4017 write.
    mode: FrameCounterMode,
    /// IRQ inhibit flag ($4017 bit 6).
    irq_inhibit: bool,
    /// Frame IRQ flag.
    irq_flag: bool,
}

impl FrameCounter {
    /// Create a frame counter in its power-on state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle a $4017 write: bit 7 selects the mode, bit 6 inhibits the IRQ
    /// (and clears a pending flag).
    pub fn write(&mut self, value: u8) {
        self.mode = if value & 0x80 != 0 {
            FrameCounterMode::FiveStep
        } else {
            FrameCounterMode::FourStep
        };
        self.irq_inhibit = value & 0x40 != 0;
        if self.irq_inhibit {
            self.irq_flag = false;
        }
    }

    /// Advance one CPU cycle.
    pub fn clock(&mut self) {
        self.ticks += 1;
        if self.irq_inhibit {
            return;
        }
        if self.ticks >= FRAME_PERIOD {
            self.ticks = 0;
            self.irq_flag = true;
            log::trace!("frame counter IRQ raised");
        }
    }

    /// Whether the frame IRQ line is asserted.
    #[must_use]
    pub fn irq_pending(&self) -> bool {
        self.irq_flag && !self.irq_inhibit
    }

    /// Current IRQ flag, without the inhibit gate (as read back in $4015).
    #[must_use]
    pub fn irq_flag(&self) -> bool {
        self.irq_flag
    }

    /// Clear the IRQ flag ($4015 read side effect).
    pub fn clear_irq(&mut self) {
        self.irq_flag = false;
    }

    /// Sequencer mode from the last $4017 write.
    #[must_use]
    pub fn mode(&self) -> FrameCounterMode {
        self.mode
    }
}
