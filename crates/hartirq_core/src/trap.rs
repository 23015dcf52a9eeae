use hartirq_common::cause::{MCAUSE_CAUSE, MCAUSE_INT};

use crate::fault::FaultSink;
use crate::vector::{InterruptVector, Local};

/// Decoded `mcause` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrapCause {
    /// Asynchronous interrupt; the code indexes the core-local vector.
    Interrupt(usize),
    /// Synchronous exception code.
    Exception(usize),
}

impl TrapCause {
    /// Splits a raw `mcause` on its interrupt bit.
    #[inline(always)]
    pub const fn from_bits(mcause: usize) -> Self {
        if mcause & MCAUSE_INT != 0 {
            TrapCause::Interrupt(mcause & MCAUSE_CAUSE)
        } else {
            TrapCause::Exception(mcause)
        }
    }

    /// Interrupt or exception code without the interrupt bit.
    pub const fn code(self) -> usize {
        match self {
            TrapCause::Interrupt(code) | TrapCause::Exception(code) => code,
        }
    }

    pub const fn is_interrupt(self) -> bool {
        matches!(self, TrapCause::Interrupt(_))
    }
}

/// Routes one trap and returns the address to resume at.
///
/// Interrupts are dispatched through the core-local vector; exceptions go
/// to `sink`, which never returns. The resume address is always `mepc`.
#[inline]
pub fn handle_trap<S, const N: usize>(
    local: &InterruptVector<Local, N>,
    sink: &S,
    mcause: usize,
    mepc: usize,
) -> usize
where
    S: FaultSink + ?Sized,
{
    match TrapCause::from_bits(mcause) {
        TrapCause::Interrupt(index) => local.dispatch(index, sink),
        TrapCause::Exception(_) => sink.exception(mcause, mepc),
    }
    mepc
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{PanicSink, hits, record_hit, reset_hits};
    use crate::vector::{Handler, LocalVectorBuilder};
    use hartirq_common::cause::{IRQ_M_EXTERNAL, IRQ_M_TIMER};

    #[test]
    fn top_bit_selects_interrupt() {
        assert_eq!(
            TrapCause::from_bits(MCAUSE_INT | IRQ_M_TIMER),
            TrapCause::Interrupt(IRQ_M_TIMER)
        );
        assert_eq!(TrapCause::from_bits(2), TrapCause::Exception(2));
        assert!(TrapCause::from_bits(MCAUSE_INT).is_interrupt());
        assert_eq!(TrapCause::from_bits(MCAUSE_INT | 11).code(), 11);
    }

    #[test]
    fn interrupt_runs_local_handler_and_resumes_at_mepc() {
        reset_hits();
        let mut builder = LocalVectorBuilder::new();
        builder
            .install(IRQ_M_TIMER, Handler::WithContext(record_hit, IRQ_M_TIMER))
            .unwrap();
        builder
            .install(IRQ_M_EXTERNAL, Handler::WithContext(record_hit, IRQ_M_EXTERNAL))
            .unwrap();
        let local = builder.initialize_defaults();

        let resume = handle_trap(&local, &PanicSink, MCAUSE_INT | IRQ_M_EXTERNAL, 0x8000_1234);
        assert_eq!(resume, 0x8000_1234);
        handle_trap(&local, &PanicSink, MCAUSE_INT | IRQ_M_TIMER, 0x8000_2000);

        assert_eq!(hits(), vec![IRQ_M_EXTERNAL, IRQ_M_TIMER]);
    }

    #[test]
    #[should_panic(expected = "exception mcause=0x2 mepc=0x80000040")]
    fn exception_goes_to_fault_sink() {
        let local = LocalVectorBuilder::new().initialize_defaults();
        handle_trap(&local, &PanicSink, 2, 0x8000_0040);
    }

    #[test]
    #[should_panic(expected = "unregistered Local(7)")]
    fn uninstalled_interrupt_never_takes_exception_path() {
        let local = LocalVectorBuilder::new().initialize_defaults();
        handle_trap(&local, &PanicSink, MCAUSE_INT | 7, 0x8000_0040);
    }
}
