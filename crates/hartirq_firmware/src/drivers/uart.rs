//! 16550 UART receive path.
//!
//! Transmission is polled (see `console`); reception is interrupt driven
//! through PLIC source `UART0_IRQ`.

use core::ptr::{read_volatile, write_volatile};
use core::sync::atomic::{AtomicU64, Ordering};

const RBR: usize = 0;
const THR: usize = 0;
const IER: usize = 1;
const FCR: usize = 2;
const LCR: usize = 3;
const LSR: usize = 5;

const IER_RX_AVAILABLE: u8 = 1 << 0;
const FCR_ENABLE_FIFO: u8 = 1 << 0;
const FCR_CLEAR_FIFOS: u8 = 0b11 << 1;
const LCR_8N1: u8 = 0b11;
const LSR_DATA_READY: u8 = 1 << 0;
const LSR_THR_EMPTY: u8 = 1 << 5;

static RX_BYTES: AtomicU64 = AtomicU64::new(0);

#[inline(always)]
fn reg(base: usize, offset: usize) -> *mut u8 {
    (base + offset) as *mut u8
}

/// Programs 8N1 framing, enables the FIFOs and the receive interrupt.
pub fn init(base: usize) {
    unsafe {
        write_volatile(reg(base, IER), 0);
        write_volatile(reg(base, LCR), LCR_8N1);
        write_volatile(reg(base, FCR), FCR_ENABLE_FIFO | FCR_CLEAR_FIFOS);
        write_volatile(reg(base, IER), IER_RX_AVAILABLE);
    }
}

/// Receive handler, installed with the UART base as its context.
///
/// Drains the receive FIFO and echoes every byte. Reading RBR until the
/// data-ready bit clears deasserts the interrupt line before the PLIC
/// completion is written.
pub fn isr_rx(base: usize) {
    unsafe {
        while read_volatile(reg(base, LSR)) & LSR_DATA_READY != 0 {
            let byte = read_volatile(reg(base, RBR));
            RX_BYTES.fetch_add(1, Ordering::Relaxed);
            while read_volatile(reg(base, LSR)) & LSR_THR_EMPTY == 0 {
                core::hint::spin_loop();
            }
            write_volatile(reg(base, THR), byte);
        }
    }
}

/// Bytes received since boot.
pub fn rx_count() -> u64 {
    RX_BYTES.load(Ordering::Relaxed)
}
