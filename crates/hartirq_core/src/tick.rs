use core::num::NonZeroU32;

use crate::IrqError;

/// Free-running 64-bit counter with a compare register.
///
/// The timer interrupt is pending while `counter() >= compare()`; writing a
/// compare value above the counter clears it.
pub trait MachineTimer {
    /// Current value of the free-running counter (`mtime`).
    fn counter(&self) -> u64;

    /// Overwrites the counter. Only used when the timer is started.
    fn set_counter(&self, value: u64);

    /// Current compare value (`mtimecmp`).
    fn compare(&self) -> u64;

    /// Writes the compare value. Writing a value above the counter
    /// acknowledges a pending timer interrupt.
    fn set_compare(&self, value: u64);

    /// State of the timer pending bit (MTIP).
    fn interrupt_pending(&self) -> bool;
}

impl<T: MachineTimer + ?Sized> MachineTimer for &T {
    fn counter(&self) -> u64 {
        (**self).counter()
    }

    fn set_counter(&self, value: u64) {
        (**self).set_counter(value)
    }

    fn compare(&self) -> u64 {
        (**self).compare()
    }

    fn set_compare(&self, value: u64) {
        (**self).set_compare(value)
    }

    fn interrupt_pending(&self) -> bool {
        (**self).interrupt_pending()
    }
}

/// Counting direction of the hardware timer as seen by the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountDirection {
    Up,
    Down,
}

/// Time base description handed to the scheduler once at startup.
#[derive(Debug, Clone, Copy)]
pub struct TickConfig {
    /// Input frequency of the timer in Hz.
    pub timer_freq: u32,
    /// Tick interrupt frequency in Hz.
    pub tick_freq: u32,
    pub direction: CountDirection,
    /// Cycles elapsed in the current tick period.
    pub elapsed_cycles: fn() -> u32,
    /// Whether a timer interrupt is pending.
    pub pending: fn() -> bool,
}

impl TickConfig {
    /// Builds a time base description.
    ///
    /// # Arguments
    ///
    /// * `timer_freq` - Timer input frequency in Hz.
    /// * `tick_freq` - Tick frequency in Hz, at most `timer_freq`.
    /// * `elapsed_cycles` - Reads the position inside the current period.
    /// * `pending` - Reads the timer pending bit.
    ///
    /// # Returns
    ///
    /// `IrqError::InvalidTickConfig` when `tick_freq` is zero or above
    /// `timer_freq`.
    pub fn new(
        timer_freq: u32,
        tick_freq: u32,
        direction: CountDirection,
        elapsed_cycles: fn() -> u32,
        pending: fn() -> bool,
    ) -> Result<Self, IrqError> {
        if tick_freq == 0 || tick_freq > timer_freq {
            return Err(IrqError::InvalidTickConfig {
                timer_freq,
                tick_freq,
            });
        }
        Ok(Self {
            timer_freq,
            tick_freq,
            direction,
            elapsed_cycles,
            pending,
        })
    }

    /// Timer cycles per tick.
    pub fn reload(&self) -> NonZeroU32 {
        // tick_freq <= timer_freq is checked on construction.
        NonZeroU32::new(self.timer_freq / self.tick_freq).unwrap_or(NonZeroU32::MIN)
    }

    /// Timer cycles since start, given the number of ticks delivered so far.
    ///
    /// Must be called with the timer interrupt masked so `ticks` and the
    /// timer registers are read from the same period.
    pub fn time_cycles(&self, ticks: u64) -> u64 {
        time_base(
            ticks,
            u64::from(self.reload().get()),
            self.elapsed_cycles,
            self.pending,
        )
    }
}

/// Combines a tick count with the position of the timer inside its period.
///
/// A pending compare event starts a period that `ticks` does not count yet,
/// so one reload is added and the position is re-read relative to that
/// event.
fn time_base(
    ticks: u64,
    reload: u64,
    elapsed: impl Fn() -> u32,
    pending: impl Fn() -> bool,
) -> u64 {
    let mut cycles = u64::from(elapsed());
    if pending() {
        cycles = reload + u64::from(elapsed());
    }
    ticks.wrapping_mul(reload).wrapping_add(cycles)
}

/// Periodic tick source driven by `mtimecmp`.
pub struct TickGenerator<T> {
    timer: T,
    reload: u64,
}

impl<T: MachineTimer> TickGenerator<T> {
    /// Wraps `timer`; nothing is written until [`start`](Self::start).
    pub const fn new(timer: T, reload: NonZeroU32) -> Self {
        Self {
            timer,
            reload: reload.get() as u64,
        }
    }

    /// Timer cycles per tick.
    pub fn reload(&self) -> u64 {
        self.reload
    }

    pub fn timer(&self) -> &T {
        &self.timer
    }

    /// Starts counting with the first compare event one period ahead.
    ///
    /// The counter is set to 1 because some cores do not start counting
    /// from 0.
    pub fn start(&self) {
        self.timer.set_counter(1);
        self.timer.set_compare(self.reload + 1);
        log::debug!("tick timer started, reload {} cycles", self.reload);
    }

    /// Cycles elapsed since the last compare event.
    ///
    /// Before the compare event fires the counter is below the compare
    /// value and the result lies in `[0, reload)`. Once the event is
    /// pending the raw distance past the compare value is returned, so the
    /// caller sees time keep moving forward until the handler runs.
    pub fn elapsed_cycles(&self) -> u32 {
        let compare = self.timer.compare();
        let counter = self.timer.counter();
        let diff = counter.wrapping_sub(compare) as i64;
        if diff < 0 {
            (self.reload as i64 + diff) as u32
        } else {
            diff as u32
        }
    }

    pub fn pending_flag(&self) -> bool {
        self.timer.interrupt_pending()
    }

    /// Timer cycles since start, see [`TickConfig::time_cycles`].
    pub fn time_cycles(&self, ticks: u64) -> u64 {
        time_base(
            ticks,
            self.reload,
            || self.elapsed_cycles(),
            || self.pending_flag(),
        )
    }

    /// Timer interrupt body: delivers every tick that is due.
    ///
    /// `on_tick` runs once for the compare event that raised the interrupt
    /// and once more for each further period that elapsed while the
    /// interrupt was masked. The new compare value is accumulated locally
    /// and written once at the end, which also clears the pending bit.
    /// Returns the number of ticks delivered.
    pub fn catch_up<F: FnMut()>(&self, mut on_tick: F) -> u32 {
        let mut compare = self.timer.compare();
        let mut ticks = 0u32;
        loop {
            on_tick();
            ticks = ticks.wrapping_add(1);
            compare = compare.wrapping_add(self.reload);
            if compare > self.timer.counter() {
                break;
            }
        }
        self.timer.set_compare(compare);
        ticks
    }
}
