//! Interrupt dispatch and periodic tick generation for RISC-V machine mode.
//!
//! This crate provides the table-driven trap dispatcher, the core-local and
//! platform-level interrupt vectors, the catch-up tick generator, and the
//! fault sink. Hardware access goes through small controller traits so the
//! same code runs in firmware (MMIO) and in host-side simulation.

#![cfg_attr(not(test), no_std)]

/// Interrupt controller abstraction for the core-local interruptor.
///
/// Enabling and disabling local causes, reading and clearing their pending
/// bits, and selecting how the trap vector base is interpreted.
pub mod clint;

/// Debug channel used to emit single characters to host tooling.
pub mod com;

/// Terminal handlers for synchronous exceptions and unregistered sources.
///
/// Exceptions halt; interrupts that reach a slot nobody installed park in
/// a separate spin loop so the two conditions can be told apart under a
/// debugger.
pub mod fault;

/// Interrupt nesting bookkeeping shared with the scheduler.
pub mod nesting;

/// Platform-level interrupt controller abstraction and claim/complete dispatch.
pub mod plic;

/// Periodic tick generation on top of `mtime`/`mtimecmp`.
///
/// Exposes the elapsed-cycle and pending queries used by the scheduler's
/// time base and the catch-up handler that delivers one tick per elapsed
/// reload period.
pub mod tick;

/// Trap cause classification and the top-level trap entry.
pub mod trap;

/// Fixed-capacity interrupt vectors with tagged handler slots.
///
/// Vectors are populated through a builder during initialization and sealed
/// into a read-only table in which every slot holds either a handler or the
/// not-installed sentinel.
pub mod vector;

#[cfg(test)]
mod testing;

use core::fmt;

/// Error types returned while configuring interrupt handling.
///
/// None of these can occur on the dispatch path itself; they are reported
/// by installation and configuration calls made during initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IrqError {
    /// An interrupt index does not fit the vector it was used with.
    IndexOutOfRange { index: usize, capacity: usize },

    /// The index is reserved by the controller and cannot carry a handler.
    ///
    /// PLIC source 0 means "no interrupt pending" and is never claimed.
    ReservedSource(usize),

    /// The tick frequency is zero or higher than the timer frequency.
    InvalidTickConfig { timer_freq: u32, tick_freq: u32 },
}

impl fmt::Display for IrqError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            IrqError::IndexOutOfRange { index, capacity } => {
                write!(f, "interrupt index {} out of range (capacity {})", index, capacity)
            }
            IrqError::ReservedSource(index) => {
                write!(f, "interrupt source {} is reserved", index)
            }
            IrqError::InvalidTickConfig {
                timer_freq,
                tick_freq,
            } => write!(
                f,
                "tick frequency {} Hz unusable with timer frequency {} Hz",
                tick_freq, timer_freq
            ),
        }
    }
}

impl core::error::Error for IrqError {}
