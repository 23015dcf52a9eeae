use core::sync::atomic::{AtomicBool, Ordering};

/// Byte sink of the optional host-debug channel.
///
/// The transport behind it (a UART or a memory buffer read by the debugger) is not part
/// of this crate.
pub trait ComSink {
    /// Queues one byte. Clears the transmit flag once the byte is gone.
    fn send1(&self, byte: u8);

    fn send(&self, bytes: &[u8]) {
        for &byte in bytes {
            self.send1(byte);
        }
    }
}

static TX_ACTIVE: AtomicBool = AtomicBool::new(false);

/// Whether the debug channel is still transmitting.
pub fn tx_active() -> bool {
    TX_ACTIVE.load(Ordering::Acquire)
}

/// Marks a transmission in progress.
pub fn set_tx_active() {
    TX_ACTIVE.store(true, Ordering::Release);
}

pub fn clear_tx_active() {
    TX_ACTIVE.store(false, Ordering::Release);
}

/// Channel used when no transport is configured: bytes are dropped and
/// transmission is reported finished at once.
pub struct Disabled;

impl ComSink for Disabled {
    fn send1(&self, _byte: u8) {
        clear_tx_active();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_channel_never_stays_busy() {
        set_tx_active();
        Disabled.send(b"tick");
        assert!(!tx_active());
    }
}
