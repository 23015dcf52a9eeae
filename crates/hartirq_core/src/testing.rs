//! Simulated hardware and recording handlers for unit tests.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::vec::Vec;

use crate::fault::{FaultSink, Source};
use crate::plic::PlatformController;
use crate::tick::MachineTimer;

thread_local! {
    static HITS: RefCell<Vec<usize>> = const { RefCell::new(Vec::new()) };
}

/// Handler body that records its context word for the current test thread.
pub fn record_hit(context: usize) {
    HITS.with(|hits| hits.borrow_mut().push(context));
}

pub fn hits() -> Vec<usize> {
    HITS.with(|hits| hits.borrow().clone())
}

pub fn reset_hits() {
    HITS.with(|hits| hits.borrow_mut().clear());
}

/// Sink that turns both divergent paths into distinguishable panics.
pub struct PanicSink;

impl FaultSink for PanicSink {
    fn exception(&self, mcause: usize, mepc: usize) -> ! {
        panic!("exception mcause={:#x} mepc={:#x}", mcause, mepc);
    }

    fn unregistered(&self, source: Source) -> ! {
        panic!("unregistered {:?}", source);
    }
}

/// `mtime`/`mtimecmp` pair. The counter only moves when a test moves it,
/// unless `auto_step` makes every counter read advance it.
#[derive(Default)]
pub struct FakeTimer {
    pub counter: Cell<u64>,
    pub compare: Cell<u64>,
    pub auto_step: Cell<u64>,
    pub compare_writes: Cell<u32>,
}

impl FakeTimer {
    pub fn at(counter: u64, compare: u64) -> Self {
        let timer = Self::default();
        timer.counter.set(counter);
        timer.compare.set(compare);
        timer
    }
}

impl MachineTimer for FakeTimer {
    fn counter(&self) -> u64 {
        let now = self.counter.get();
        self.counter.set(now + self.auto_step.get());
        now
    }

    fn set_counter(&self, value: u64) {
        self.counter.set(value);
    }

    fn compare(&self) -> u64 {
        self.compare.get()
    }

    fn set_compare(&self, value: u64) {
        self.compare_writes.set(self.compare_writes.get() + 1);
        self.compare.set(value);
    }

    fn interrupt_pending(&self) -> bool {
        self.counter.get() >= self.compare.get()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlicEvent {
    Claim(u32),
    Complete(u32),
    Priority(u32, u32),
    Enable(u32),
    Disable(u32),
    Threshold(u32),
}

/// PLIC with a FIFO of sources to hand out on claim.
#[derive(Default)]
pub struct FakePlic {
    pub pending: RefCell<VecDeque<u32>>,
    pub events: RefCell<Vec<PlicEvent>>,
}

impl FakePlic {
    pub fn with_pending(sources: &[u32]) -> Self {
        let plic = Self::default();
        plic.pending.borrow_mut().extend(sources.iter().copied());
        plic
    }

    pub fn events(&self) -> Vec<PlicEvent> {
        self.events.borrow().clone()
    }
}

impl PlatformController for FakePlic {
    fn set_priority(&self, source: u32, priority: u32) {
        self.events.borrow_mut().push(PlicEvent::Priority(source, priority));
    }

    fn enable(&self, source: u32) {
        self.events.borrow_mut().push(PlicEvent::Enable(source));
    }

    fn disable(&self, source: u32) {
        self.events.borrow_mut().push(PlicEvent::Disable(source));
    }

    fn set_threshold(&self, threshold: u32) {
        self.events.borrow_mut().push(PlicEvent::Threshold(threshold));
    }

    fn claim(&self) -> u32 {
        let source = self.pending.borrow_mut().pop_front().unwrap_or(0);
        self.events.borrow_mut().push(PlicEvent::Claim(source));
        source
    }

    fn complete(&self, source: u32) {
        self.events.borrow_mut().push(PlicEvent::Complete(source));
    }
}
