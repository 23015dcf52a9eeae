//! Machine-mode trap entry.
//!
//! The assembly trampoline in `trap.S` saves the caller-saved registers,
//! passes `mcause` and `mepc` to `rust_trap_handler`, writes the returned
//! resume address back to `mepc` and returns with `mret`. With the
//! `vectored` feature a 64-entry jump table in front of the trampoline is
//! installed instead, every entry branching to the same trampoline.

use core::arch::global_asm;

use hartirq_core::clint::TrapMode;
use hartirq_core::fault::{FaultSink, Halt, Source};
use hartirq_core::trap::{TrapCause, handle_trap};

use crate::isr;

global_asm!(include_str!("trap.S"));

unsafe extern "C" {
    fn trap_entry();
    #[cfg(feature = "vectored")]
    fn trap_vector_table();
}

#[cfg(not(feature = "vectored"))]
pub const MODE: TrapMode = TrapMode::Direct;
#[cfg(feature = "vectored")]
pub const MODE: TrapMode = TrapMode::Vectored;

/// Address to program into `mtvec` for `MODE`.
pub fn vector_base() -> usize {
    #[cfg(feature = "vectored")]
    {
        trap_vector_table as usize
    }
    #[cfg(not(feature = "vectored"))]
    {
        trap_entry as usize
    }
}

/// Trap handler called from the assembly trampoline.
///
/// Returns the address to resume at. Traps taken before the local vector
/// is published are treated like traps into an empty vector.
#[unsafe(no_mangle)]
pub extern "C" fn rust_trap_handler(mcause: usize, mepc: usize) -> usize {
    match isr::local_vector() {
        Some(local) => handle_trap(local, &Halt, mcause, mepc),
        None => {
            let cause = TrapCause::from_bits(mcause);
            if cause.is_interrupt() {
                Halt.unregistered(Source::Local(cause.code()))
            } else {
                Halt.exception(mcause, mepc)
            }
        }
    }
}
