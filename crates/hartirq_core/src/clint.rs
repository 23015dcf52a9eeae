use crate::IrqError;

/// How the hart interprets the trap vector base.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrapMode {
    /// Every trap enters at the base address.
    Direct = 0,
    /// Exceptions enter at the base, interrupts at `base + 4 * cause`.
    Vectored = 1,
}

/// Encodes `mtvec` for a trap entry at `base`.
pub const fn mtvec_bits(base: usize, mode: TrapMode) -> usize {
    (base & !0b11) | mode as usize
}

/// Address the hart jumps to for local interrupt `cause` under `mode`.
pub const fn entry_address(base: usize, mode: TrapMode, cause: usize) -> usize {
    match mode {
        TrapMode::Direct => base & !0b11,
        TrapMode::Vectored => (base & !0b11) + 4 * cause,
    }
}

/// Core-local interrupt enable and pending control.
///
/// Indices are `mcause` interrupt codes. Implementations on real hardware
/// touch `mie`, `mip`, `mtvec` and the CLINT's MSIP register; all calls
/// except `is_pending` and `clear_pending` belong to initialization.
pub trait LocalController {
    /// Sets the `mie` bit of `cause`.
    fn enable(&self, cause: usize);

    fn disable(&self, cause: usize);

    /// Masks every local cause in `mie`.
    fn disable_all(&self);

    /// Reads the `mip` bit of `cause`.
    fn is_pending(&self, cause: usize) -> bool;

    /// Clears a pending bit that is not cleared by the source itself
    /// (the machine software interrupt).
    fn clear_pending(&self, cause: usize);

    /// Points the trap vector at `base` with the given mode.
    fn set_trap_vector(&self, base: usize, mode: TrapMode);
}

/// Enables `cause` after checking it is covered by a local vector of
/// `capacity` slots.
pub fn enable_checked<C: LocalController + ?Sized>(
    clint: &C,
    cause: usize,
    capacity: usize,
) -> Result<(), IrqError> {
    if cause >= capacity || cause >= usize::BITS as usize {
        return Err(IrqError::IndexOutOfRange {
            index: cause,
            capacity,
        });
    }
    clint.enable(cause);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn mtvec_encoding_masks_low_bits() {
        assert_eq!(mtvec_bits(0x8000_0100, TrapMode::Direct), 0x8000_0100);
        assert_eq!(mtvec_bits(0x8000_0100, TrapMode::Vectored), 0x8000_0101);
        assert_eq!(mtvec_bits(0x8000_0103, TrapMode::Direct), 0x8000_0100);
    }

    #[test]
    fn vectored_entries_are_word_spaced() {
        assert_eq!(entry_address(0x8000_0100, TrapMode::Direct, 7), 0x8000_0100);
        assert_eq!(entry_address(0x8000_0100, TrapMode::Vectored, 7), 0x8000_011C);
        assert_eq!(entry_address(0x8000_0100, TrapMode::Vectored, 0), 0x8000_0100);
    }

    #[derive(Default)]
    struct MaskOnly {
        mie: Cell<usize>,
    }

    impl LocalController for MaskOnly {
        fn enable(&self, cause: usize) {
            self.mie.set(self.mie.get() | 1 << cause);
        }
        fn disable(&self, cause: usize) {
            self.mie.set(self.mie.get() & !(1 << cause));
        }
        fn disable_all(&self) {
            self.mie.set(0);
        }
        fn is_pending(&self, _cause: usize) -> bool {
            false
        }
        fn clear_pending(&self, _cause: usize) {}
        fn set_trap_vector(&self, _base: usize, _mode: TrapMode) {}
    }

    #[test]
    fn enable_checked_rejects_causes_outside_vector() {
        let clint = MaskOnly::default();
        enable_checked(&clint, 7, 16).unwrap();
        enable_checked(&clint, 11, 16).unwrap();
        assert_eq!(clint.mie.get(), (1 << 7) | (1 << 11));

        assert_eq!(
            enable_checked(&clint, 16, 16),
            Err(IrqError::IndexOutOfRange {
                index: 16,
                capacity: 16
            })
        );
        clint.disable(7);
        assert_eq!(clint.mie.get(), 1 << 11);
    }
}
