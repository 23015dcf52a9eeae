use core::sync::atomic::{AtomicU8, AtomicUsize, Ordering};

use hartirq_common::cause::{ExceptionCode, MCAUSE_CAUSE};

/// Origin of an interrupt that reached the not-installed sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    /// Core-local cause code.
    Local(usize),
    /// PLIC source ID.
    Platform(usize),
}

/// Terminal handler for traps the dispatcher cannot service.
///
/// Both methods diverge. Implementations must not rely on the trap being
/// resumable: an exception is never retried and an unregistered interrupt
/// is never acknowledged.
pub trait FaultSink {
    /// Synchronous exception with the raw `mcause` and the faulting PC.
    fn exception(&self, mcause: usize, mepc: usize) -> !;

    /// Interrupt whose vector slot was never installed.
    fn unregistered(&self, source: Source) -> !;
}

const NO_SOURCE: usize = usize::MAX;
const PLATFORM_TAG: usize = 1 << (usize::BITS - 2);

static LAST_UNREGISTERED: AtomicUsize = AtomicUsize::new(NO_SOURCE);
static HALT_POINT: AtomicU8 = AtomicU8::new(0);

/// Halt point of reserved exception codes and of production builds.
pub const HALT_RESERVED: u8 = 0xFF;

/// Source that most recently tripped the sentinel, if any.
pub fn last_unregistered() -> Option<Source> {
    match LAST_UNREGISTERED.load(Ordering::Relaxed) {
        NO_SOURCE => None,
        raw if raw & PLATFORM_TAG != 0 => Some(Source::Platform(raw & !PLATFORM_TAG)),
        raw => Some(Source::Local(raw)),
    }
}

fn record_unregistered(source: Source) {
    let raw = match source {
        Source::Local(index) => index & !PLATFORM_TAG,
        Source::Platform(index) => index | PLATFORM_TAG,
    };
    LAST_UNREGISTERED.store(raw, Ordering::Relaxed);
}

/// Halt point reached by the fault sink; 0 while running.
///
/// In diagnostics builds this is the exception code plus one, with 0xFF for
/// reserved codes. Production builds always report 0xFF.
pub fn halt_point() -> u8 {
    HALT_POINT.load(Ordering::Relaxed)
}

/// Halt point for an exception with raw `mcause`.
///
/// # Returns
///
/// The exception code plus one, or [`HALT_RESERVED`] if the code is not
/// a defined exception.
pub const fn halt_point_for(mcause: usize) -> u8 {
    match ExceptionCode::from_code(mcause & MCAUSE_CAUSE) {
        Some(code) => code as u8 + 1,
        None => HALT_RESERVED,
    }
}

#[inline(always)]
fn halt(point: u8) -> ! {
    HALT_POINT.store(point, Ordering::SeqCst);
    loop {
        core::hint::spin_loop();
    }
}

// One non-inlined function per exception cause so a debugger breakpoint
// can be placed on a single cause.
macro_rules! halt_points {
    ($($name:ident => $code:ident),* $(,)?) => {
        $(
            #[cfg(feature = "diagnostics")]
            #[inline(never)]
            fn $name() -> ! {
                halt(halt_point_for(ExceptionCode::$code as usize))
            }
        )*
    };
}

halt_points! {
    halt_instruction_misaligned => InstructionMisaligned,
    halt_instruction_fault => InstructionFault,
    halt_illegal_instruction => IllegalInstruction,
    halt_breakpoint => Breakpoint,
    halt_load_misaligned => LoadMisaligned,
    halt_load_fault => LoadFault,
    halt_store_misaligned => StoreMisaligned,
    halt_store_fault => StoreFault,
    halt_user_env_call => UserEnvCall,
    halt_supervisor_env_call => SupervisorEnvCall,
    halt_machine_env_call => MachineEnvCall,
    halt_instruction_page_fault => InstructionPageFault,
    halt_load_page_fault => LoadPageFault,
    halt_store_page_fault => StorePageFault,
}

#[cfg(feature = "diagnostics")]
#[inline(never)]
fn halt_reserved() -> ! {
    halt(HALT_RESERVED)
}

/// Stops the hart after a synchronous exception.
#[cfg(feature = "diagnostics")]
pub fn halt_on_exception(mcause: usize) -> ! {
    match ExceptionCode::from_code(mcause & MCAUSE_CAUSE) {
        Some(ExceptionCode::InstructionMisaligned) => halt_instruction_misaligned(),
        Some(ExceptionCode::InstructionFault) => halt_instruction_fault(),
        Some(ExceptionCode::IllegalInstruction) => halt_illegal_instruction(),
        Some(ExceptionCode::Breakpoint) => halt_breakpoint(),
        Some(ExceptionCode::LoadMisaligned) => halt_load_misaligned(),
        Some(ExceptionCode::LoadFault) => halt_load_fault(),
        Some(ExceptionCode::StoreMisaligned) => halt_store_misaligned(),
        Some(ExceptionCode::StoreFault) => halt_store_fault(),
        Some(ExceptionCode::UserEnvCall) => halt_user_env_call(),
        Some(ExceptionCode::SupervisorEnvCall) => halt_supervisor_env_call(),
        Some(ExceptionCode::MachineEnvCall) => halt_machine_env_call(),
        Some(ExceptionCode::InstructionPageFault) => halt_instruction_page_fault(),
        Some(ExceptionCode::LoadPageFault) => halt_load_page_fault(),
        Some(ExceptionCode::StorePageFault) => halt_store_page_fault(),
        None => halt_reserved(),
    }
}

/// Stops the hart after a synchronous exception.
#[cfg(not(feature = "diagnostics"))]
pub fn halt_on_exception(_mcause: usize) -> ! {
    halt(HALT_RESERVED)
}

/// Parks the hart on behalf of an interrupt nobody installed a handler for.
///
/// The source is recorded before spinning so it can be read back with
/// `last_unregistered` from a debugger or a watchdog context.
#[inline(never)]
pub fn park_unregistered(source: Source) -> ! {
    record_unregistered(source);
    log::warn!("interrupt from {:?} has no installed handler", source);
    loop {
        core::hint::spin_loop();
    }
}

/// Fault sink used on the target: halts on exceptions, parks on
/// unregistered interrupts.
pub struct Halt;

impl FaultSink for Halt {
    fn exception(&self, mcause: usize, _mepc: usize) -> ! {
        halt_on_exception(mcause)
    }

    fn unregistered(&self, source: Source) -> ! {
        park_unregistered(source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unregistered_source_encoding_keeps_scope() {
        record_unregistered(Source::Platform(42));
        assert_eq!(last_unregistered(), Some(Source::Platform(42)));

        record_unregistered(Source::Local(7));
        assert_eq!(last_unregistered(), Some(Source::Local(7)));
    }

    #[test]
    fn halt_point_is_exception_code_plus_one() {
        assert_eq!(halt_point_for(0), 1);
        assert_eq!(halt_point_for(2), 3);
        assert_eq!(halt_point_for(11), 12);
        assert_eq!(halt_point_for(15), 16);
    }

    #[test]
    fn reserved_exception_codes_share_one_halt_point() {
        for code in [10, 14, 16, 24, 100, MCAUSE_CAUSE] {
            assert_eq!(halt_point_for(code), HALT_RESERVED, "code {code}");
        }
    }

    #[test]
    fn defined_exceptions_have_distinct_halt_points() {
        let mut seen = [false; 256];
        for code in 0..16 {
            let Some(exception) = ExceptionCode::from_code(code) else {
                continue;
            };
            let point = halt_point_for(exception as usize);
            assert_ne!(point, HALT_RESERVED);
            assert_ne!(point, 0);
            assert!(!seen[point as usize], "{exception:?} shares halt point {point}");
            seen[point as usize] = true;
        }
    }

    #[test]
    fn running_hart_reports_no_halt_point() {
        assert_eq!(halt_point(), 0);
    }
}
