//! Peripheral drivers for the board.
//!
//! Each driver talks to its device through memory-mapped registers and
//! takes the device base address as an argument so the same code serves
//! every instance.

pub mod gpio;
pub mod uart;
