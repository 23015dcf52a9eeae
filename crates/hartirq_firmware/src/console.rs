//! UART console for firmware diagnostics and log output.
//!
//! Writes to the 16550 UART of the QEMU 'virt' board. Output from the
//! background context is serialized by a spinlock; the logger backs off
//! instead of spinning when the lock is already held, so a handler that
//! interrupts a writer cannot deadlock on it.

use core::fmt;

use hartirq_common::mmio::UART0_BASE;
use hartirq_core::com::ComSink;
use spin::Mutex;

/// Transmit holding register.
const UART_THR: *mut u8 = UART0_BASE as *mut u8;

/// Line status register.
const UART_LSR: *const u8 = (UART0_BASE + 5) as *const u8;

/// LSR bit set while the transmit holding register is empty.
const LSR_THR_EMPTY: u8 = 1 << 5;

/// Serializes console output between background writers.
static CONSOLE_LOCK: Mutex<()> = Mutex::new(());

/// UART device interface for formatted output.
///
/// Implements fmt::Write to enable formatted printing via the write! macro.
/// Newlines are expanded to CRLF for serial terminals.
pub struct Uart;

impl Uart {
    #[inline(always)]
    pub fn put(byte: u8) {
        unsafe {
            while core::ptr::read_volatile(UART_LSR) & LSR_THR_EMPTY == 0 {
                core::hint::spin_loop();
            }
            core::ptr::write_volatile(UART_THR, byte);
        }
    }
}

impl fmt::Write for Uart {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for c in s.bytes() {
            if c == b'\n' {
                Uart::put(b'\r');
            }
            Uart::put(c);
        }
        Ok(())
    }
}

impl ComSink for Uart {
    fn send1(&self, byte: u8) {
        Uart::put(byte);
    }
}

#[doc(hidden)]
pub fn _print(args: fmt::Arguments) {
    use fmt::Write;
    let _guard = CONSOLE_LOCK.lock();
    let _ = Uart.write_fmt(args);
}

/// Macro for printing a line to the console.
///
/// ```ignore
/// println!("ticks: {}", 42);
/// ```
#[macro_export]
macro_rules! println {
    ($($arg:tt)*) => ({
        $crate::console::_print(format_args!("{}\n", format_args!($($arg)*)));
    });
}
pub use println;

/// `log` backend writing one line per record to the UART.
struct ConsoleLogger;

impl log::Log for ConsoleLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &log::Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        use fmt::Write;
        if let Some(_guard) = CONSOLE_LOCK.try_lock() {
            let _ = writeln!(Uart, "[{:5}] {}", record.level(), record.args());
        }
    }

    fn flush(&self) {}
}

static LOGGER: ConsoleLogger = ConsoleLogger;

/// Installs the console as `log` backend.
pub fn init(level: log::LevelFilter) {
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(level);
    }
}
