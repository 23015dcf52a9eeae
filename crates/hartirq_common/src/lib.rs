//! Common definitions and constants shared across the interrupt dispatch system.
//!
//! This crate provides the memory map of the interrupt controllers and timer,
//! the numbering of core-local interrupt causes and synchronous exceptions,
//! and the board-level tick configuration. It is shared by the dispatch core,
//! the firmware image, and the host-side simulator.

#![no_std]

// Memory-mapped I/O address space definitions for the QEMU 'virt' board.
//
// Defines the physical address layout of the core-local interruptor, the
// platform-level interrupt controller, and the console UART. These
// addresses must match the device tree of the target machine.
pub mod mmio {
    /// Base address of the CLINT (Core Local Interruptor) in QEMU 'virt' machine.
    ///
    /// The CLINT provides per-hart machine-mode timer interrupts and software
    /// interrupt generation.
    pub const CLINT_BASE: usize = 0x200_0000;

    /// Machine software interrupt pending register of hart 0.
    ///
    /// Writing 1 raises the machine software interrupt, writing 0 clears it.
    /// The MSIP bit in `mip` mirrors this register and cannot be cleared
    /// through the CSR.
    pub const MSIP_ADDR: usize = CLINT_BASE;

    /// Memory-mapped address for the machine timer compare register.
    ///
    /// When the machine timer (MTIME) reaches this value, a timer interrupt
    /// becomes pending. Writing a value above MTIME clears the pending bit.
    pub const MTIMECMP_ADDR: usize = CLINT_BASE + 0x4000;

    /// Memory-mapped address for the machine timer counter register.
    ///
    /// Free-running 64-bit counter incrementing at `board::TIMER_FREQ`.
    pub const MTIME_ADDR: usize = CLINT_BASE + 0xBFF8;

    /// Base address of the PLIC (Platform-Level Interrupt Controller).
    pub const PLIC_BASE: usize = 0x0C00_0000;

    /// Offset of the per-source priority registers (one u32 per source).
    pub const PLIC_PRIORITY_OFFSET: usize = 0x0000;

    /// Offset of the per-context enable bit banks.
    pub const PLIC_ENABLE_OFFSET: usize = 0x2000;

    /// Bytes per context in the enable region.
    pub const PLIC_ENABLE_STRIDE: usize = 0x80;

    /// Offset of the per-context threshold and claim/complete registers.
    pub const PLIC_CONTEXT_OFFSET: usize = 0x20_0000;

    /// Bytes per context in the threshold/claim region.
    pub const PLIC_CONTEXT_STRIDE: usize = 0x1000;

    /// PLIC context of hart 0 in machine mode.
    pub const PLIC_CONTEXT_M_HART0: usize = 0;

    /// Base address of the 16550-compatible console UART.
    pub const UART0_BASE: usize = 0x1000_0000;

    /// Base address of the LED GPIO bank.
    pub const GPIO0_BASE: usize = 0x1006_0000;
}

/// Trap cause encoding as reported in `mcause`.
pub mod cause {
    /// Bit that marks an asynchronous interrupt in `mcause`.
    pub const MCAUSE_INT: usize = 1 << (usize::BITS - 1);

    /// Mask selecting the cause index below the interrupt bit.
    pub const MCAUSE_CAUSE: usize = !MCAUSE_INT;

    pub const IRQ_U_SOFTWARE: usize = 0;
    pub const IRQ_S_SOFTWARE: usize = 1;
    pub const IRQ_M_SOFTWARE: usize = 3;
    pub const IRQ_U_TIMER: usize = 4;
    pub const IRQ_S_TIMER: usize = 5;
    pub const IRQ_M_TIMER: usize = 7;
    pub const IRQ_U_EXTERNAL: usize = 8;
    pub const IRQ_S_EXTERNAL: usize = 9;
    pub const IRQ_M_EXTERNAL: usize = 11;

    /// Synchronous exception codes defined by the privileged architecture.
    ///
    /// Codes 10 and 14 are reserved; anything outside the table decodes to
    /// `None` and is handled as a reserved cause.
    #[repr(u8)]
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum ExceptionCode {
        InstructionMisaligned = 0,
        InstructionFault = 1,
        IllegalInstruction = 2,
        Breakpoint = 3,
        LoadMisaligned = 4,
        LoadFault = 5,
        StoreMisaligned = 6,
        StoreFault = 7,
        UserEnvCall = 8,
        SupervisorEnvCall = 9,
        MachineEnvCall = 11,
        InstructionPageFault = 12,
        LoadPageFault = 13,
        StorePageFault = 15,
    }

    impl ExceptionCode {
        /// Decodes the cause index of a synchronous trap.
        pub const fn from_code(code: usize) -> Option<Self> {
            Some(match code {
                0 => Self::InstructionMisaligned,
                1 => Self::InstructionFault,
                2 => Self::IllegalInstruction,
                3 => Self::Breakpoint,
                4 => Self::LoadMisaligned,
                5 => Self::LoadFault,
                6 => Self::StoreMisaligned,
                7 => Self::StoreFault,
                8 => Self::UserEnvCall,
                9 => Self::SupervisorEnvCall,
                11 => Self::MachineEnvCall,
                12 => Self::InstructionPageFault,
                13 => Self::LoadPageFault,
                15 => Self::StorePageFault,
                _ => return None,
            })
        }

        /// Human-readable name used by diagnostics output.
        pub const fn name(self) -> &'static str {
            match self {
                Self::InstructionMisaligned => "instruction address misaligned",
                Self::InstructionFault => "instruction access fault",
                Self::IllegalInstruction => "illegal instruction",
                Self::Breakpoint => "breakpoint",
                Self::LoadMisaligned => "load address misaligned",
                Self::LoadFault => "load access fault",
                Self::StoreMisaligned => "store/AMO address misaligned",
                Self::StoreFault => "store/AMO access fault",
                Self::UserEnvCall => "environment call from U-mode",
                Self::SupervisorEnvCall => "environment call from S-mode",
                Self::MachineEnvCall => "environment call from M-mode",
                Self::InstructionPageFault => "instruction page fault",
                Self::LoadPageFault => "load page fault",
                Self::StorePageFault => "store/AMO page fault",
            }
        }
    }
}

/// Board-level interrupt and tick configuration.
///
/// These values size the dispatch tables and define the scheduler time
/// base. They must agree with the interrupt controller configuration of
/// the target board.
pub mod board {
    /// Number of implementation-defined local causes above the 16
    /// architectural ones.
    pub const LOCAL_INT_COUNT: usize = 0;

    /// Length of the core-local dispatch table.
    pub const NUM_LOCAL_INTERRUPTS: usize = 16 + LOCAL_INT_COUNT;

    /// Number of PLIC sources including the reserved source 0.
    pub const PLIC_TOTAL_INTERRUPT_COUNT: usize = 96;

    /// Highest priority the PLIC implements.
    pub const PLIC_MAX_PRIORITY: u32 = 7;

    /// PLIC source of the console UART.
    pub const UART0_IRQ: u32 = 10;

    /// Frequency of `mtime` in Hz (QEMU 'virt' runs it at 10 MHz).
    pub const TIMER_FREQ: u32 = 10_000_000;

    /// Scheduler tick frequency in Hz.
    pub const TICK_FREQ: u32 = 1_000;

    /// Timer cycles per tick.
    pub const TIMER_RELOAD: u32 = TIMER_FREQ / TICK_FREQ;
}
