//! MMIO and CSR implementations of the controller traits for QEMU 'virt'.

use core::arch::asm;
use core::ptr::{read_volatile, write_volatile};

use hartirq_common::cause::IRQ_M_SOFTWARE;
use hartirq_common::mmio::{
    MSIP_ADDR, MTIME_ADDR, MTIMECMP_ADDR, PLIC_CONTEXT_OFFSET, PLIC_CONTEXT_STRIDE,
    PLIC_ENABLE_OFFSET, PLIC_ENABLE_STRIDE, PLIC_PRIORITY_OFFSET,
};
use hartirq_core::clint::{LocalController, TrapMode};
use hartirq_core::plic::PlatformController;
use hartirq_core::tick::MachineTimer;
use riscv::register::{mip, mtvec};

/// Core-local interrupt control through `mie`/`mip`/`mtvec` and the CLINT.
pub struct Clint;

impl LocalController for Clint {
    fn enable(&self, cause: usize) {
        unsafe { asm!("csrs mie, {0}", in(reg) 1usize << cause) };
    }

    fn disable(&self, cause: usize) {
        unsafe { asm!("csrc mie, {0}", in(reg) 1usize << cause) };
    }

    fn disable_all(&self) {
        unsafe { asm!("csrw mie, zero") };
    }

    fn is_pending(&self, cause: usize) -> bool {
        mip::read().bits() & (1 << cause) != 0
    }

    fn clear_pending(&self, cause: usize) {
        if cause == IRQ_M_SOFTWARE {
            // MSIP is read-only in mip; it follows the CLINT register.
            unsafe { write_volatile(MSIP_ADDR as *mut u32, 0) };
        } else {
            unsafe { asm!("csrc mip, {0}", in(reg) 1usize << cause) };
        }
    }

    fn set_trap_vector(&self, base: usize, mode: TrapMode) {
        let mode = match mode {
            TrapMode::Direct => mtvec::TrapMode::Direct,
            TrapMode::Vectored => mtvec::TrapMode::Vectored,
        };
        unsafe { mtvec::write(base, mode) };
    }
}

/// Raises the machine software interrupt of hart 0.
pub fn raise_software_interrupt() {
    unsafe { write_volatile(MSIP_ADDR as *mut u32, 1) };
}

/// `mtime`/`mtimecmp` of hart 0.
pub struct Mtimer;

impl MachineTimer for Mtimer {
    fn counter(&self) -> u64 {
        unsafe { read_volatile(MTIME_ADDR as *const u64) }
    }

    fn set_counter(&self, value: u64) {
        unsafe { write_volatile(MTIME_ADDR as *mut u64, value) };
    }

    fn compare(&self) -> u64 {
        unsafe { read_volatile(MTIMECMP_ADDR as *const u64) }
    }

    fn set_compare(&self, value: u64) {
        unsafe { write_volatile(MTIMECMP_ADDR as *mut u64, value) };
    }

    fn interrupt_pending(&self) -> bool {
        mip::read().mtimer()
    }
}

/// One context of the SiFive-compatible PLIC.
pub struct Plic {
    base: usize,
    context: usize,
}

impl Plic {
    pub const fn new(base: usize, context: usize) -> Self {
        Self { base, context }
    }

    #[inline(always)]
    fn priority_addr(&self, source: u32) -> *mut u32 {
        (self.base + PLIC_PRIORITY_OFFSET + source as usize * 4) as *mut u32
    }

    #[inline(always)]
    fn enable_word_addr(&self, source: u32) -> *mut u32 {
        (self.base
            + PLIC_ENABLE_OFFSET
            + self.context * PLIC_ENABLE_STRIDE
            + (source as usize / 32) * 4) as *mut u32
    }

    #[inline(always)]
    fn threshold_addr(&self) -> *mut u32 {
        (self.base + PLIC_CONTEXT_OFFSET + self.context * PLIC_CONTEXT_STRIDE) as *mut u32
    }

    #[inline(always)]
    fn claim_complete_addr(&self) -> *mut u32 {
        (self.base + PLIC_CONTEXT_OFFSET + self.context * PLIC_CONTEXT_STRIDE + 4) as *mut u32
    }
}

impl PlatformController for Plic {
    fn set_priority(&self, source: u32, priority: u32) {
        unsafe { write_volatile(self.priority_addr(source), priority) };
    }

    fn enable(&self, source: u32) {
        let addr = self.enable_word_addr(source);
        unsafe { write_volatile(addr, read_volatile(addr) | 1 << (source % 32)) };
    }

    fn disable(&self, source: u32) {
        let addr = self.enable_word_addr(source);
        unsafe { write_volatile(addr, read_volatile(addr) & !(1 << (source % 32))) };
    }

    fn set_threshold(&self, threshold: u32) {
        unsafe { write_volatile(self.threshold_addr(), threshold) };
    }

    fn claim(&self) -> u32 {
        unsafe { read_volatile(self.claim_complete_addr()) }
    }

    fn complete(&self, source: u32) {
        unsafe { write_volatile(self.claim_complete_addr(), source) };
    }
}
