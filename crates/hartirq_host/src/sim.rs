//! Simulated hart with CLINT, PLIC and machine timer.
//!
//! Runs the dispatch core against software models of the interrupt
//! controllers. Time only moves when a script event advances it; pending
//! interrupts are taken whenever `mstatus.MIE` is set, with the same
//! priority order as the hardware (external, software, timer).

use anyhow::{Result, bail};
use bitvec::prelude::*;
use hartirq_common::cause::{
    ExceptionCode, IRQ_M_EXTERNAL, IRQ_M_SOFTWARE, IRQ_M_TIMER, MCAUSE_CAUSE, MCAUSE_INT,
};
use hartirq_core::IrqError;
use hartirq_core::clint::{LocalController, TrapMode, enable_checked, entry_address, mtvec_bits};
use hartirq_core::fault::{FaultSink, Source};
use hartirq_core::nesting::IsrNesting;
use hartirq_core::plic::{self, PlatformController};
use hartirq_core::tick::{CountDirection, MachineTimer, TickConfig, TickGenerator};
use hartirq_core::trap::handle_trap;
use hartirq_core::vector::{Handler, InterruptVector, Local, Platform, VectorBuilder};
use hartirq_io::{BoardConfig, Controller, Directive, Event, Script};
use std::cell::{Cell, OnceCell, RefCell};
use std::num::NonZeroU32;
use std::rc::Rc;

use crate::stats::TickStats;

/// Local vector capacity of the simulator; `board local=` may not exceed it.
pub const MAX_LOCAL: usize = 64;

/// Platform vector capacity, the architectural PLIC maximum.
pub const MAX_PLATFORM: usize = 1024;

/// Bound on back-to-back traps without time moving.
const STORM_LIMIT: usize = 4096;

/// Bound on timer periods a single `advance` or `mask` may span.
const MAX_EVENT_PERIODS: u64 = 1 << 24;

/// Trap vector base programmed during bring-up.
const TRAP_BASE: usize = 0x8000_0000;

const TRAP_MODE: TrapMode = TrapMode::Direct;

/// Reported as `mepc` for every simulated interrupt.
const IDLE_PC: usize = 0x8000_1000;

#[derive(Default)]
pub struct SimTimer {
    counter: Cell<u64>,
    compare: Cell<u64>,
    compare_writes: Cell<u64>,
}

impl MachineTimer for SimTimer {
    fn counter(&self) -> u64 {
        self.counter.get()
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

/// `mie`, `mip.MSIP`, `mtvec` and the other software-visible local bits.
#[derive(Default)]
pub struct SimClint {
    mie: Cell<u64>,
    mip: Cell<u64>,
    mtvec: Cell<usize>,
}

impl LocalController for SimClint {
    fn enable(&self, cause: usize) {
        self.mie.set(self.mie.get() | 1 << cause);
    }

    fn disable(&self, cause: usize) {
        self.mie.set(self.mie.get() & !(1 << cause));
    }

    fn disable_all(&self) {
        self.mie.set(0);
    }

    fn is_pending(&self, cause: usize) -> bool {
        self.mip.get() & (1 << cause) != 0
    }

    fn clear_pending(&self, cause: usize) {
        self.mip.set(self.mip.get() & !(1 << cause));
    }

    fn set_trap_vector(&self, base: usize, mode: TrapMode) {
        self.mtvec.set(mtvec_bits(base, mode));
    }
}

impl SimClint {
    fn raise(&self, cause: usize) {
        self.mip.set(self.mip.get() | 1 << cause);
    }
}

/// One PLIC context with level-triggered gateways.
pub struct SimPlic {
    priority: RefCell<Vec<u32>>,
    enabled: RefCell<BitVec>,
    pending: RefCell<BitVec>,
    in_service: RefCell<BitVec>,
    threshold: Cell<u32>,
}

impl SimPlic {
    pub fn new(sources: usize) -> Self {
        Self {
            priority: RefCell::new(vec![0; sources]),
            enabled: RefCell::new(bitvec![0; sources]),
            pending: RefCell::new(bitvec![0; sources]),
            in_service: RefCell::new(bitvec![0; sources]),
            threshold: Cell::new(0),
        }
    }

    pub fn sources(&self) -> usize {
        self.priority.borrow().len()
    }

    pub fn raise(&self, source: usize) {
        self.pending.borrow_mut().set(source, true);
    }

    /// Highest-priority claimable source, lowest ID on ties.
    fn best(&self) -> Option<usize> {
        let priority = self.priority.borrow();
        let enabled = self.enabled.borrow();
        let in_service = self.in_service.borrow();
        let pending = self.pending.borrow();
        let threshold = self.threshold.get();

        pending
            .iter_ones()
            .filter(|&source| source != 0 && enabled[source] && !in_service[source])
            .filter(|&source| priority[source] > threshold)
            .fold(None, |best: Option<usize>, source| match best {
                Some(b) if priority[b] >= priority[source] => Some(b),
                _ => Some(source),
            })
    }

    /// Whether the context's external interrupt line is asserted.
    pub fn line_asserted(&self) -> bool {
        self.best().is_some()
    }
}

impl PlatformController for SimPlic {
    fn set_priority(&self, source: u32, priority: u32) {
        if let Some(slot) = self.priority.borrow_mut().get_mut(source as usize) {
            *slot = priority;
        }
    }

    fn enable(&self, source: u32) {
        if (source as usize) < self.sources() {
            self.enabled.borrow_mut().set(source as usize, true);
        }
    }

    fn disable(&self, source: u32) {
        if (source as usize) < self.sources() {
            self.enabled.borrow_mut().set(source as usize, false);
        }
    }

    fn set_threshold(&self, threshold: u32) {
        self.threshold.set(threshold);
    }

    fn claim(&self) -> u32 {
        match self.best() {
            Some(source) => {
                self.pending.borrow_mut().set(source, false);
                self.in_service.borrow_mut().set(source, true);
                source as u32
            }
            None => 0,
        }
    }

    fn complete(&self, source: u32) {
        if (source as usize) < self.sources() {
            self.in_service.borrow_mut().set(source as usize, false);
        }
    }
}

/// Terminal fault handling for the simulator: report and exit.
pub struct ExitOnFault;

impl FaultSink for ExitOnFault {
    fn exception(&self, mcause: usize, mepc: usize) -> ! {
        let name = ExceptionCode::from_code(mcause & MCAUSE_CAUSE).map_or("reserved", ExceptionCode::name);
        log::error!("exception mcause={:#x} ({}) mepc={:#x}", mcause, name, mepc);
        std::process::exit(3);
    }

    fn unregistered(&self, source: Source) -> ! {
        log::error!("interrupt without handler: {:?}", source);
        std::process::exit(4);
    }
}

/// Counters collected while a script runs.
#[derive(Default)]
pub struct Counters {
    pub local_hits: Vec<u64>,
    pub platform_hits: Vec<u64>,
    pub spurious_claims: u64,
    pub traps: u64,
    pub max_depth: u32,
    /// Handler bodies entered while another handler was running.
    pub nested_entries: u64,
    /// Time base value printed by each `query`.
    pub query_times: Vec<u64>,
    pub ticks: TickStats,
}

pub struct Machine {
    board: BoardConfig,
    timer: TickGenerator<SimTimer>,
    clint: SimClint,
    plic: SimPlic,
    mstatus_mie: Cell<bool>,
    nesting: IsrNesting,
    local: OnceCell<InterruptVector<Local, MAX_LOCAL>>,
    platform: OnceCell<InterruptVector<Platform, MAX_PLATFORM>>,
    sys_ticks: Cell<u64>,
    sys_timer: OnceCell<TickConfig>,
    counters: RefCell<Counters>,
}

thread_local! {
    static CURRENT: RefCell<Option<Rc<Machine>>> = const { RefCell::new(None) };
}

/// Keeps a machine installed on this thread until dropped.
struct CurrentMachine;

impl CurrentMachine {
    fn install(machine: Rc<Machine>) -> Self {
        CURRENT.with(|current| *current.borrow_mut() = Some(machine));
        CurrentMachine
    }
}

impl Drop for CurrentMachine {
    fn drop(&mut self) {
        CURRENT.with(|current| *current.borrow_mut() = None);
    }
}

/// Runs `f` on the machine installed on this thread, if any.
fn with_current<R>(f: impl FnOnce(&Machine) -> R) -> Option<R> {
    let machine = CURRENT.with(|current| current.borrow().clone())?;
    Some(f(&machine))
}

fn isr_machine_software() {
    with_current(|m| {
        let _scope = m.enter_isr();
        m.clint.clear_pending(IRQ_M_SOFTWARE);
    });
}

fn isr_machine_timer() {
    with_current(|m| {
        let _scope = m.enter_isr();
        let delivered = m.timer.catch_up(|| m.sys_ticks.set(m.sys_ticks.get() + 1));
        m.counters.borrow_mut().ticks.record(delivered);
    });
}

fn isr_machine_external() {
    with_current(|m| {
        let _scope = m.enter_isr();
        if let Some(platform) = m.platform.get() {
            if platform.dispatch_pending(&m.plic, &ExitOnFault).is_none() {
                m.counters.borrow_mut().spurious_claims += 1;
            }
        }
    });
}

/// Handler installed by `install local <n>`: counts and acknowledges.
fn record_local(cause: usize) {
    with_current(|m| {
        let _scope = m.enter_isr();
        m.clint.clear_pending(cause);
        m.counters.borrow_mut().local_hits[cause] += 1;
    });
}

/// Handler installed by `install plic <n>`.
fn record_platform(source: usize) {
    with_current(|m| {
        let _scope = m.enter_isr();
        m.counters.borrow_mut().platform_hits[source] += 1;
    });
}

fn sim_elapsed_cycles() -> u32 {
    with_current(|m| m.timer.elapsed_cycles()).unwrap_or(0)
}

fn sim_tick_pending() -> bool {
    with_current(|m| m.timer.pending_flag()).unwrap_or(false)
}

impl Machine {
    fn new(board: BoardConfig) -> Result<Self> {
        if board.local > MAX_LOCAL || board.local <= IRQ_M_EXTERNAL {
            bail!("board local={} must be in {}..={}", board.local, IRQ_M_EXTERNAL + 1, MAX_LOCAL);
        }
        if board.platform > MAX_PLATFORM || board.platform < 2 {
            bail!("board platform={} must be in 2..={}", board.platform, MAX_PLATFORM);
        }
        let reload = NonZeroU32::new(board.timer_freq / board.tick_freq)
            .ok_or(IrqError::InvalidTickConfig {
                timer_freq: board.timer_freq,
                tick_freq: board.tick_freq,
            })?;

        Ok(Self {
            board,
            timer: TickGenerator::new(SimTimer::default(), reload),
            clint: SimClint::default(),
            plic: SimPlic::new(board.platform),
            mstatus_mie: Cell::new(false),
            nesting: IsrNesting::new(),
            local: OnceCell::new(),
            platform: OnceCell::new(),
            sys_ticks: Cell::new(0),
            sys_timer: OnceCell::new(),
            counters: RefCell::new(Counters {
                local_hits: vec![0; board.local],
                platform_hits: vec![0; board.platform],
                ..Counters::default()
            }),
        })
    }

    fn enter_isr(&self) -> hartirq_core::nesting::IsrScope<'_> {
        let scope = self.nesting.enter();
        let mut counters = self.counters.borrow_mut();
        counters.max_depth = counters.max_depth.max(self.nesting.depth());
        if !scope.is_outermost() {
            counters.nested_entries += 1;
        }
        scope
    }

    fn check_index(&self, index: usize, capacity: usize) -> Result<(), IrqError> {
        if index >= capacity {
            return Err(IrqError::IndexOutOfRange { index, capacity });
        }
        Ok(())
    }

    /// Same bring-up order as the firmware: everything masked, vectors
    /// published, sources armed, timer started, then interrupts enabled.
    fn init(&self, setup: &[Directive]) -> Result<()> {
        self.mstatus_mie.set(false);
        self.clint.disable_all();

        let mut local = VectorBuilder::<Local, MAX_LOCAL>::new();
        local.install(IRQ_M_SOFTWARE, Handler::Plain(isr_machine_software))?;
        local.install(IRQ_M_TIMER, Handler::Plain(isr_machine_timer))?;
        local.install(IRQ_M_EXTERNAL, Handler::Plain(isr_machine_external))?;

        let mut platform = VectorBuilder::<Platform, MAX_PLATFORM>::new();
        let mut enables = Vec::new();
        for directive in setup {
            match *directive {
                Directive::Install {
                    controller: Controller::Local,
                    index,
                    ..
                } => {
                    self.check_index(index, self.board.local)?;
                    if local
                        .install(index, Handler::WithContext(record_local, index))?
                        .is_some()
                    {
                        log::warn!("local cause {} replaces a built-in handler", index);
                    }
                }
                Directive::Install {
                    controller: Controller::Plic,
                    index,
                    priority,
                } => {
                    self.check_index(index, self.board.platform)?;
                    platform.install(index, Handler::WithContext(record_platform, index))?;
                    if let Some(priority) = priority {
                        enables.push((index as u32, priority));
                    }
                }
                Directive::Enable { source, priority } => {
                    enables.push((source, priority.unwrap_or(1)));
                }
            }
        }

        let local = self.local.get_or_init(|| local.initialize_defaults());
        self.clint.set_trap_vector(TRAP_BASE, TRAP_MODE);
        log::debug!("mtvec = {:#x}", self.clint.mtvec.get());
        for cause in 0..self.board.local {
            if local.slot(cause).is_installed() {
                enable_checked(&self.clint, cause, self.board.local)?;
            }
        }

        plic::reset(&self.plic, self.board.platform);
        let platform = self.platform.get_or_init(|| platform.initialize_defaults());
        for (source, priority) in enables {
            if source as usize >= self.board.platform {
                return Err(IrqError::IndexOutOfRange {
                    index: source as usize,
                    capacity: self.board.platform,
                }
                .into());
            }
            plic::enable_source(&self.plic, platform, source, priority)?;
        }

        self.timer.start();
        let config = TickConfig::new(
            self.board.timer_freq,
            self.board.tick_freq,
            CountDirection::Up,
            sim_elapsed_cycles,
            sim_tick_pending,
        )?;
        let _ = self.sys_timer.set(config);

        self.mstatus_mie.set(true);
        Ok(())
    }

    fn line_pending(&self, cause: usize) -> bool {
        match cause {
            IRQ_M_TIMER => self.timer.pending_flag(),
            IRQ_M_EXTERNAL => self.plic.line_asserted(),
            _ => self.clint.is_pending(cause),
        }
    }

    /// Next cause to trap on: external, software, timer, then the
    /// platform-specific causes from 16 upwards.
    fn next_cause(&self) -> Option<usize> {
        let enabled = self.clint.mie.get();
        [IRQ_M_EXTERNAL, IRQ_M_SOFTWARE, IRQ_M_TIMER]
            .into_iter()
            .chain((16..self.board.local).rev())
            .chain((0..16).filter(|c| ![IRQ_M_EXTERNAL, IRQ_M_SOFTWARE, IRQ_M_TIMER].contains(c)))
            .find(|&cause| enabled & (1 << cause) != 0 && self.line_pending(cause))
    }

    /// Takes interrupts until none is pending.
    ///
    /// Dispatch is flat: nothing is taken while a handler is running.
    fn take_interrupts(&self) -> Result<()> {
        let Some(local) = self.local.get() else {
            return Ok(());
        };
        if self.nesting.in_isr() {
            return Ok(());
        }
        let mut taken = 0;
        while self.mstatus_mie.get() {
            let Some(cause) = self.next_cause() else {
                break;
            };
            taken += 1;
            if taken > STORM_LIMIT {
                bail!("interrupt storm on local cause {}", cause);
            }
            // Hardware clears MIE on trap entry and restores it on mret.
            self.mstatus_mie.set(false);
            self.counters.borrow_mut().traps += 1;
            log::trace!(
                "trap on cause {} at {:#x}",
                cause,
                entry_address(TRAP_BASE, TRAP_MODE, cause)
            );
            let resume = handle_trap(local, &ExitOnFault, MCAUSE_INT | cause, IDLE_PC);
            debug_assert_eq!(resume, IDLE_PC);
            self.mstatus_mie.set(true);
        }
        Ok(())
    }

    /// Moves time forward, stopping at every compare event so interrupts
    /// are taken on time while enabled.
    fn advance(&self, cycles: u64) -> Result<()> {
        let timer = self.timer.timer();
        let reload = self.timer.reload();
        if timer
            .counter()
            .checked_add(cycles)
            .and_then(|end| end.checked_add(reload))
            .is_none()
        {
            bail!("advancing {} cycles overflows the 64-bit timer", cycles);
        }
        if cycles / reload > MAX_EVENT_PERIODS {
            bail!(
                "advancing {} cycles spans more than {} tick periods",
                cycles,
                MAX_EVENT_PERIODS
            );
        }
        let mut remaining = cycles;
        self.take_interrupts()?;
        while remaining > 0 {
            let to_compare = timer.compare().saturating_sub(timer.counter()).max(1);
            let step = if self.mstatus_mie.get() {
                remaining.min(to_compare)
            } else {
                remaining
            };
            timer.set_counter(timer.counter() + step);
            remaining -= step;
            self.take_interrupts()?;
        }
        Ok(())
    }

    fn raise(&self, controller: Controller, index: usize) -> Result<()> {
        match controller {
            Controller::Local => {
                self.check_index(index, self.board.local)?;
                self.clint.raise(index);
            }
            Controller::Plic => {
                self.check_index(index, self.board.platform)?;
                self.plic.raise(index);
            }
        }
        self.take_interrupts()
    }

    /// Time since start as the scheduler would compute it.
    fn time_cycles(&self) -> Option<u64> {
        let config = self.sys_timer.get()?;
        Some(config.time_cycles(self.sys_ticks.get()))
    }

    fn query(&self) {
        let elapsed = self.timer.elapsed_cycles();
        let time = self.time_cycles();
        if let Some(time) = time {
            self.counters.borrow_mut().query_times.push(time);
        }
        println!(
            "t={} ticks={} elapsed={} pending={} time_cycles={}",
            self.timer.timer().counter(),
            self.sys_ticks.get(),
            elapsed,
            self.sys_timer.get().is_some_and(|config| (config.pending)()),
            time.map_or_else(|| "-".to_string(), |t| t.to_string()),
        );
    }

    fn run_event(&self, event: Event) -> Result<()> {
        match event {
            Event::Advance(cycles) => self.advance(cycles),
            Event::Mask(cycles) => {
                self.mstatus_mie.set(false);
                self.advance(cycles)?;
                self.mstatus_mie.set(true);
                self.take_interrupts()
            }
            Event::Raise(controller, index) => self.raise(controller, index),
            Event::Query => {
                self.query();
                Ok(())
            }
        }
    }
}

/// Outcome of one script run.
pub struct Report {
    pub sys_ticks: u64,
    pub counter: u64,
    pub compare: u64,
    pub compare_writes: u64,
    pub counters: Counters,
}

impl Report {
    pub fn print(&self) {
        println!("\nSimulation Summary");
        println!("Counter:        {}", self.counter);
        println!("Compare:        {}", self.compare);
        println!("Ticks:          {}", self.sys_ticks);
        println!("Traps:          {}", self.counters.traps);
        println!("Compare writes: {}", self.compare_writes);
        println!("Spurious:       {}", self.counters.spurious_claims);
        println!("Max nesting:    {}", self.counters.max_depth);
        println!("Nested entries: {}", self.counters.nested_entries);
        for (cause, &hits) in self.counters.local_hits.iter().enumerate() {
            if hits > 0 {
                println!("local {:4}:     {}", cause, hits);
            }
        }
        for (source, &hits) in self.counters.platform_hits.iter().enumerate() {
            if hits > 0 {
                println!("plic  {:4}:     {}", source, hits);
            }
        }
        self.counters.ticks.print_report();
    }
}

/// Replays `script` on a fresh machine installed on the current thread.
pub fn run(script: &Script) -> Result<Report> {
    let machine = Rc::new(Machine::new(script.board)?);
    {
        let _current = CurrentMachine::install(Rc::clone(&machine));
        machine.init(&script.setup)?;
        for &event in &script.events {
            machine.run_event(event)?;
        }
    }

    let timer = machine.timer.timer();
    Ok(Report {
        sys_ticks: machine.sys_ticks.get(),
        counter: timer.counter(),
        compare: timer.compare(),
        compare_writes: timer.compare_writes.get(),
        counters: machine.counters.take(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use hartirq_io::parse_script;

    fn run_text(text: &str) -> Report {
        run(&parse_script(text).unwrap()).unwrap()
    }

    #[test]
    fn ticks_follow_time() {
        let report = run_text("board timer_freq=1000 tick_freq=10\nadvance 1000");
        // started at counter 1: compare events at 101, 201, ..., 1001
        assert_eq!(report.sys_ticks, 10);
        assert_eq!(report.compare, 1101);
        assert_eq!(report.compare_writes, 11);
        assert_eq!(report.counters.ticks.max, 1);
    }

    #[test]
    fn masked_periods_are_caught_up_in_one_trap() {
        let report = run_text("board timer_freq=1000 tick_freq=10\nmask 350");
        assert_eq!(report.sys_ticks, 3);
        assert_eq!(report.counters.traps, 1);
        assert_eq!(report.counters.ticks.max, 3);
        assert_eq!(report.compare, 401);
        assert!(report.compare > report.counter);
    }

    #[test]
    fn external_interrupts_are_claimed_and_completed() {
        let report = run_text(
            "board platform=32\n\
             install plic 5 priority=2\n\
             install plic 9 priority=4\n\
             raise plic 5\n\
             raise plic 9\n\
             raise plic 9",
        );
        assert_eq!(report.counters.platform_hits[5], 1);
        assert_eq!(report.counters.platform_hits[9], 2);
        assert_eq!(report.counters.spurious_claims, 0);
        // each source handler runs inside the external interrupt handler
        assert_eq!(report.counters.max_depth, 2);
        assert_eq!(report.counters.nested_entries, 3);
    }

    #[test]
    fn disabled_sources_are_not_delivered() {
        let report = run_text("install plic 10\nraise plic 10\nadvance 10");
        assert_eq!(report.counters.platform_hits[10], 0);
        assert_eq!(report.counters.traps, 0);
    }

    #[test]
    fn software_interrupt_is_acknowledged() {
        let report = run_text("raise local 3\nraise local 3");
        assert_eq!(report.counters.traps, 2);
    }

    #[test]
    fn query_times_never_step_back() {
        let report = run_text(
            "board timer_freq=1000 tick_freq=10\n\
             query\n\
             mask 250\n\
             query\n\
             advance 33\n\
             query\n\
             mask 99\n\
             query",
        );
        assert_eq!(report.counters.query_times, vec![0, 250, 283, 382]);
    }

    #[test]
    fn time_includes_pending_tick_before_handler_runs() {
        let board = parse_script("board timer_freq=1000 tick_freq=10").unwrap().board;
        let machine = Rc::new(Machine::new(board).unwrap());
        let _current = CurrentMachine::install(Rc::clone(&machine));
        machine.init(&[]).unwrap();
        assert_eq!(machine.time_cycles(), Some(0));

        machine.mstatus_mie.set(false);
        machine.advance(150).unwrap();
        assert!(machine.timer.pending_flag());
        assert_eq!(machine.sys_ticks.get(), 0);
        assert_eq!(machine.time_cycles(), Some(150));

        machine.mstatus_mie.set(true);
        machine.take_interrupts().unwrap();
        assert_eq!(machine.sys_ticks.get(), 1);
        assert_eq!(machine.time_cycles(), Some(150));
    }

    #[test]
    fn nothing_is_taken_inside_a_handler() {
        let machine = Rc::new(Machine::new(BoardConfig::default()).unwrap());
        let _current = CurrentMachine::install(Rc::clone(&machine));
        machine.init(&[]).unwrap();

        machine.clint.raise(IRQ_M_SOFTWARE);
        {
            let _scope = machine.enter_isr();
            machine.take_interrupts().unwrap();
            assert_eq!(machine.counters.borrow().traps, 0);
        }
        machine.take_interrupts().unwrap();
        assert_eq!(machine.counters.borrow().traps, 1);
        assert!(!machine.clint.is_pending(IRQ_M_SOFTWARE));
    }

    #[test]
    fn rejects_time_overflow() {
        let huge = format!("mask {}", u64::MAX);
        assert!(run(&parse_script(&huge).unwrap()).is_err());
        let huge = format!("advance {}", u64::MAX - 10);
        assert!(run(&parse_script(&huge).unwrap()).is_err());
        // fits the counter but would take tens of millions of traps
        let long = "board timer_freq=1000 tick_freq=10\nadvance 2000000000";
        assert!(run(&parse_script(long).unwrap()).is_err());
    }

    #[test]
    fn rejects_sources_outside_the_board() {
        let script = parse_script("board platform=8\ninstall plic 8").unwrap();
        assert!(run(&script).is_err());
        let script = parse_script("board local=12\nraise local 12").unwrap();
        assert!(run(&script).is_err());
    }
}
