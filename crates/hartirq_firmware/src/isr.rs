//! Interrupt service routines and the interrupt bring-up sequence.

use core::num::NonZeroU32;

use hartirq_common::board::{
    NUM_LOCAL_INTERRUPTS, PLIC_TOTAL_INTERRUPT_COUNT, TICK_FREQ, TIMER_FREQ, TIMER_RELOAD,
    UART0_IRQ,
};
use hartirq_common::cause::{IRQ_M_EXTERNAL, IRQ_M_SOFTWARE, IRQ_M_TIMER};
use hartirq_common::mmio::{PLIC_BASE, PLIC_CONTEXT_M_HART0, UART0_BASE};
use hartirq_core::IrqError;
use hartirq_core::clint::{LocalController, enable_checked};
use hartirq_core::fault::Halt;
use hartirq_core::nesting::IsrNesting;
use hartirq_core::plic;
use hartirq_core::tick::{CountDirection, TickConfig, TickGenerator};
use hartirq_core::vector::{
    Handler, LocalVector, LocalVectorBuilder, PlatformVector, PlatformVectorBuilder,
};
use riscv::register::mstatus;
use spin::Once;

use crate::drivers::uart;
use crate::hw::{Clint, Mtimer, Plic};
use crate::{kernel, trap};

const RELOAD: NonZeroU32 = match NonZeroU32::new(TIMER_RELOAD) {
    Some(reload) => reload,
    None => panic!("TIMER_RELOAD must be non-zero"),
};

/// PLIC source priority of the console UART.
const UART0_PRIORITY: u32 = 1;

static LOCAL: Once<LocalVector> = Once::new();
static PLATFORM: Once<PlatformVector> = Once::new();
static TICKS: TickGenerator<Mtimer> = TickGenerator::new(Mtimer, RELOAD);
static NESTING: IsrNesting = IsrNesting::new();
static PLIC: Plic = Plic::new(PLIC_BASE, PLIC_CONTEXT_M_HART0);

pub fn local_vector() -> Option<&'static LocalVector> {
    LOCAL.get()
}

pub fn nesting_depth() -> u32 {
    NESTING.depth()
}

/// Machine software interrupt: acknowledges MSIP so it does not re-fire.
fn isr_machine_software() {
    let _scope = NESTING.enter();
    Clint.clear_pending(IRQ_M_SOFTWARE);
}

/// Machine timer interrupt: delivers due ticks and arms the next period.
fn isr_machine_timer() {
    let _scope = NESTING.enter();
    TICKS.catch_up(kernel::tick_handle);
}

/// Machine external interrupt: services the highest-priority PLIC source.
fn isr_machine_external() {
    let _scope = NESTING.enter();
    match PLATFORM.get() {
        Some(platform) => {
            platform.dispatch_pending(&PLIC, &Halt);
        }
        None => {
            // Sources are only enabled after the platform vector is published.
            log::warn!("external interrupt before platform vector");
        }
    }
}

fn elapsed_cycles() -> u32 {
    TICKS.elapsed_cycles()
}

fn tick_pending() -> bool {
    TICKS.pending_flag()
}

/// Brings up the interrupt system of hart 0.
///
/// Runs with interrupts globally disabled and only enables them once both
/// vectors are published and every source is armed.
pub fn init_hw() -> Result<(), IrqError> {
    unsafe { mstatus::clear_mie() };
    Clint.disable_all();

    let mut local = LocalVectorBuilder::new();
    local.install(IRQ_M_SOFTWARE, Handler::Plain(isr_machine_software))?;
    local.install(IRQ_M_TIMER, Handler::Plain(isr_machine_timer))?;
    local.install(IRQ_M_EXTERNAL, Handler::Plain(isr_machine_external))?;
    LOCAL.call_once(|| local.initialize_defaults());

    Clint.set_trap_vector(trap::vector_base(), trap::MODE);

    enable_checked(&Clint, IRQ_M_TIMER, NUM_LOCAL_INTERRUPTS)?;
    enable_checked(&Clint, IRQ_M_EXTERNAL, NUM_LOCAL_INTERRUPTS)?;
    enable_checked(&Clint, IRQ_M_SOFTWARE, NUM_LOCAL_INTERRUPTS)?;

    plic::reset(&PLIC, PLIC_TOTAL_INTERRUPT_COUNT);
    uart::init(UART0_BASE);
    let mut platform = PlatformVectorBuilder::new();
    platform.install(
        UART0_IRQ as usize,
        Handler::WithContext(uart::isr_rx, UART0_BASE),
    )?;
    let platform = PLATFORM.call_once(|| platform.initialize_defaults());
    plic::enable_source(&PLIC, platform, UART0_IRQ, UART0_PRIORITY)?;

    TICKS.start();
    kernel::config_sys_timer(TickConfig::new(
        TIMER_FREQ,
        TICK_FREQ,
        CountDirection::Up,
        elapsed_cycles,
        tick_pending,
    )?);

    unsafe { mstatus::set_mie() };
    log::info!("interrupts enabled");
    Ok(())
}
