//! Scheduler boundary.
//!
//! The firmware has no real scheduler; this module keeps the tick count and
//! the time base handed over at startup so the rest of the image can tell
//! time at sub-tick resolution.

use core::sync::atomic::{AtomicU64, Ordering};

use hartirq_core::tick::TickConfig;
use riscv::register::mstatus;
use spin::Once;

static SYS_TICKS: AtomicU64 = AtomicU64::new(0);
static SYS_TIMER: Once<TickConfig> = Once::new();

/// Called once per delivered tick from the timer interrupt.
pub fn tick_handle() {
    SYS_TICKS.fetch_add(1, Ordering::Relaxed);
}

/// Registers the system time base. Later calls are ignored.
pub fn config_sys_timer(config: TickConfig) {
    let stored = SYS_TIMER.call_once(|| config);
    log::info!(
        "sys timer: {} Hz timer, {} Hz tick, reload {}",
        stored.timer_freq,
        stored.tick_freq,
        stored.reload()
    );
}

pub fn ticks() -> u64 {
    SYS_TICKS.load(Ordering::Relaxed)
}

/// Time since start in timer cycles, or `None` before the time base is set.
pub fn time_cycles() -> Option<u64> {
    let config = SYS_TIMER.get()?;
    // The tick count and the timer registers must come from the same period.
    let enabled = mstatus::read().mie();
    unsafe { mstatus::clear_mie() };
    let cycles = config.time_cycles(ticks());
    if enabled {
        unsafe { mstatus::set_mie() };
    }
    Some(cycles)
}

/// Whether a tick is pending but not yet delivered.
pub fn tick_pending() -> bool {
    SYS_TIMER.get().is_some_and(|config| (config.pending)())
}
