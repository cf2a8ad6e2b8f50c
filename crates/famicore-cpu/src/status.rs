//! CPU status register (P) flags.
//!
//! ```text
//! 7  6  5  4  3  2  1  0
//! N  V  U  B  D  I  Z  C
//! │  │  │  │  │  │  │  └─ Carry
//! │  │  │  │  │  │  └──── Zero
//! │  │  │  │  │  └─────── Interrupt Disable
//! │  │  │  │  └────────── Decimal Mode (flag exists, BCD arithmetic does not)
//! │  │  │  └───────────── Break (stack-push artifact only)
//! │  │  └──────────────── Unused (reads as 1)
//! │  └─────────────────── Overflow
//! └────────────────────── Negative
//! ```

use bitflags::bitflags;

bitflags! {
    /// CPU status register flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Status: u8 {
        /// Carry.
        const C = 1 << 0;
        /// Zero.
        const Z = 1 << 1;
        /// Interrupt disable (masks IRQ, never NMI).
        const I = 1 << 2;
        /// Decimal mode. Present but inert on the NES CPU.
        const D = 1 << 3;
        /// Break. Only meaningful in the byte pushed to the stack:
        /// 1 for PHP/BRK, 0 for IRQ/NMI.
        const B = 1 << 4;
        /// Unused; always observed as 1.
        const U = 1 << 5;
        /// Signed overflow.
        const V = 1 << 6;
        /// Negative (bit 7 of the last result).
        const N = 1 << 7;
    }
}

impl Status {
    /// Power-on value: I and U set.
    pub const POWER_ON: Self = Self::I.union(Self::U);

    /// Set or clear the Zero and Negative flags from a result byte.
    #[inline]
    pub fn set_zn(&mut self, value: u8) {
        self.set_flag(Self::Z, value == 0);
        self.set_flag(Self::N, value & 0x80 != 0);
    }

    /// Set or clear a single flag.
    #[inline]
    pub fn set_flag(&mut self, flag: Self, value: bool) {
        if value {
            *self |= flag;
        } else {
            *self &= !flag;
        }
    }

    /// Byte pushed to the stack. U is always set; B reflects the push
    /// source: set for PHP/BRK, clear for IRQ/NMI.
    #[inline]
    #[must_use]
    pub const fn to_stack_byte(self, brk: bool) -> u8 {
        let mut value = self.bits() | Self::U.bits();
        if brk {
            value |= Self::B.bits();
        } else {
            value &= !Self::B.bits();
        }
        value
    }

    /// Rebuild the register from a byte pulled off the stack.
    /// B is discarded and U forced on, as PLP and RTI do.
    #[inline]
    #[must_use]
    pub fn from_stack_byte(value: u8) -> Self {
        Self::from_bits_truncate((value & !Self::B.bits()) | Self::U.bits())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_power_on_flags() {
        let status = Status::POWER_ON;
        assert!(status.contains(Status::I));
        assert!(status.contains(Status::U));
        assert!(!status.contains(Status::C));
        assert!(!status.contains(Status::Z));
    }

    #[test]
    fn test_set_zn() {
        let mut status = Status::empty();
        status.set_zn(0);
        assert!(status.contains(Status::Z));
        assert!(!status.contains(Status::N));

        status.set_zn(0x80);
        assert!(!status.contains(Status::Z));
        assert!(status.contains(Status::N));

        status.set_zn(0x42);
        assert!(!status.contains(Status::Z));
        assert!(!status.contains(Status::N));
    }

    #[test]
    fn test_stack_byte_round_trip() {
        let status = Status::C | Status::N;
        let pushed = status.to_stack_byte(true);
        assert_ne!(pushed & Status::B.bits(), 0);
        assert_ne!(pushed & Status::U.bits(), 0);

        let pulled = Status::from_stack_byte(pushed);
        assert!(!pulled.contains(Status::B));
        assert!(pulled.contains(Status::U));
        assert!(pulled.contains(Status::C));
        assert!(pulled.contains(Status::N));
    }

    #[test]
    fn test_hardware_interrupt_clears_b() {
        let pushed = Status::all().to_stack_byte(false);
        assert_eq!(pushed & Status::B.bits(), 0);

        let pushed = (Status::C | Status::U).to_stack_byte(false);
        assert_eq!(pushed & Status::B.bits(), 0);
    }
}
