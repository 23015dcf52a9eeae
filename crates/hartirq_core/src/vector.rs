use core::marker::PhantomData;

use hartirq_common::board::{NUM_LOCAL_INTERRUPTS, PLIC_TOTAL_INTERRUPT_COUNT};

use crate::IrqError;
use crate::fault::{FaultSink, Source};

/// Interrupt service routine stored in a vector slot.
///
/// `WithContext` carries a word that is passed back to the routine on every
/// invocation, so one routine can serve several sources.
#[derive(Debug, Clone, Copy)]
pub enum Handler {
    /// Routine taking no arguments.
    Plain(fn()),
    /// Routine called with the stored context word.
    WithContext(fn(usize), usize),
}

impl Handler {
    /// Runs the routine, passing the context word if there is one.
    #[inline(always)]
    pub fn call(&self) {
        match *self {
            Handler::Plain(isr) => isr(),
            Handler::WithContext(isr, context) => isr(context),
        }
    }
}

/// Content of a sealed vector slot.
#[derive(Debug, Clone, Copy)]
pub enum Slot {
    Installed(Handler),
    /// Sentinel for sources nobody claimed; dispatching it is fatal.
    NotInstalled,
}

impl Slot {
    pub fn is_installed(&self) -> bool {
        matches!(self, Slot::Installed(_))
    }
}

/// Index space a vector belongs to.
pub trait Scope {
    /// Name used in log messages.
    const NAME: &'static str;

    /// Lowest index that may carry a handler.
    const FIRST_SOURCE: usize;

    /// Fault report identifying `index` in this index space.
    fn source(index: usize) -> Source;
}

/// Core-local causes, indexed by the `mcause` code.
#[derive(Debug)]
pub enum Local {}

/// PLIC sources, indexed by the claimed source ID. Source 0 is reserved.
#[derive(Debug)]
pub enum Platform {}

impl Scope for Local {
    const NAME: &'static str = "local";
    const FIRST_SOURCE: usize = 0;

    fn source(index: usize) -> Source {
        Source::Local(index)
    }
}

impl Scope for Platform {
    const NAME: &'static str = "platform";
    const FIRST_SOURCE: usize = 1;

    fn source(index: usize) -> Source {
        Source::Platform(index)
    }
}

pub type LocalVector = InterruptVector<Local, NUM_LOCAL_INTERRUPTS>;
pub type PlatformVector = InterruptVector<Platform, PLIC_TOTAL_INTERRUPT_COUNT>;
pub type LocalVectorBuilder = VectorBuilder<Local, NUM_LOCAL_INTERRUPTS>;
pub type PlatformVectorBuilder = VectorBuilder<Platform, PLIC_TOTAL_INTERRUPT_COUNT>;

fn check_index<S: Scope>(index: usize, capacity: usize) -> Result<(), IrqError> {
    if index >= capacity {
        Err(IrqError::IndexOutOfRange { index, capacity })
    } else if index < S::FIRST_SOURCE {
        Err(IrqError::ReservedSource(index))
    } else {
        Ok(())
    }
}

/// Vector under construction.
///
/// Slots start out empty. `initialize_defaults` consumes the builder and
/// fills every empty slot with the not-installed sentinel, so an empty slot
/// can never be observed by the dispatcher.
pub struct VectorBuilder<S, const N: usize> {
    slots: [Option<Handler>; N],
    _scope: PhantomData<S>,
}

impl<S: Scope, const N: usize> Default for VectorBuilder<S, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Scope, const N: usize> VectorBuilder<S, N> {
    /// Creates a builder with every slot empty.
    pub const fn new() -> Self {
        Self {
            slots: [None; N],
            _scope: PhantomData,
        }
    }

    /// Installs `handler` at `index`.
    ///
    /// # Arguments
    ///
    /// * `index` - Cause code or PLIC source ID, depending on the scope.
    /// * `handler` - Routine to run when `index` is dispatched.
    ///
    /// # Returns
    ///
    /// The handler previously installed at `index`, or an error if the
    /// index is outside the vector or reserved by the controller.
    pub fn install(&mut self, index: usize, handler: Handler) -> Result<Option<Handler>, IrqError> {
        check_index::<S>(index, N)?;
        log::debug!("{} vector: install {}", S::NAME, index);
        Ok(self.slots[index].replace(handler))
    }

    pub fn is_installed(&self, index: usize) -> bool {
        matches!(self.slots.get(index), Some(Some(_)))
    }

    /// Seals the vector, routing every slot left empty to the sentinel.
    pub fn initialize_defaults(self) -> InterruptVector<S, N> {
        let mut slots = [Slot::NotInstalled; N];
        let mut installed = 0;
        for (slot, handler) in slots.iter_mut().zip(self.slots) {
            if let Some(handler) = handler {
                *slot = Slot::Installed(handler);
                installed += 1;
            }
        }
        log::info!(
            "{} vector ready: {} of {} sources installed",
            S::NAME,
            installed,
            N - S::FIRST_SOURCE
        );
        InterruptVector {
            slots,
            _scope: PhantomData,
        }
    }
}

/// Sealed interrupt vector.
///
/// Built once during initialization, then published and shared by
/// reference. While still exclusively owned, further handlers may be
/// installed; once shared it is read-only.
pub struct InterruptVector<S, const N: usize> {
    slots: [Slot; N],
    _scope: PhantomData<S>,
}

impl<S: Scope, const N: usize> InterruptVector<S, N> {
    /// Replaces the slot at `index`, returning its previous content.
    pub fn install(&mut self, index: usize, handler: Handler) -> Result<Slot, IrqError> {
        check_index::<S>(index, N)?;
        log::debug!("{} vector: install {}", S::NAME, index);
        Ok(core::mem::replace(&mut self.slots[index], Slot::Installed(handler)))
    }

    /// Slot content; indices past the end read as not installed.
    pub fn slot(&self, index: usize) -> Slot {
        self.slots.get(index).copied().unwrap_or(Slot::NotInstalled)
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    /// Number of slots, reserved ones included.
    pub const fn len(&self) -> usize {
        N
    }

    pub const fn is_empty(&self) -> bool {
        N == 0
    }

    /// Invokes the handler at `index`.
    ///
    /// A slot holding the sentinel, or an index the table does not cover,
    /// diverges into `sink.unregistered`.
    #[inline]
    pub fn dispatch<F: FaultSink + ?Sized>(&self, index: usize, sink: &F) {
        match self.slots.get(index) {
            Some(Slot::Installed(handler)) => handler.call(),
            _ => sink.unregistered(S::source(index)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{PanicSink, hits, record_hit, reset_hits};

    fn on_three() {
        record_hit(3);
    }

    #[test]
    fn sealed_vector_has_no_empty_slot() {
        let mut builder = LocalVectorBuilder::new();
        builder.install(3, Handler::Plain(on_three)).unwrap();
        let vector = builder.initialize_defaults();

        assert_eq!(vector.len(), NUM_LOCAL_INTERRUPTS);
        for (index, slot) in vector.slots().iter().enumerate() {
            assert_eq!(slot.is_installed(), index == 3, "slot {}", index);
        }
    }

    #[test]
    fn install_rejects_out_of_range_and_reserved() {
        let mut local = LocalVectorBuilder::new();
        assert_eq!(
            local.install(NUM_LOCAL_INTERRUPTS, Handler::Plain(on_three)).unwrap_err(),
            IrqError::IndexOutOfRange {
                index: NUM_LOCAL_INTERRUPTS,
                capacity: NUM_LOCAL_INTERRUPTS
            }
        );

        let mut platform = PlatformVectorBuilder::new();
        assert_eq!(
            platform.install(0, Handler::Plain(on_three)).unwrap_err(),
            IrqError::ReservedSource(0)
        );
        assert!(platform.install(PLIC_TOTAL_INTERRUPT_COUNT - 1, Handler::Plain(on_three)).is_ok());
    }

    #[test]
    fn install_returns_previous_handler() {
        let mut builder = LocalVectorBuilder::new();
        assert!(builder.install(7, Handler::Plain(on_three)).unwrap().is_none());
        assert!(builder.install(7, Handler::WithContext(record_hit, 7)).unwrap().is_some());

        let mut vector = builder.initialize_defaults();
        assert!(!vector.install(11, Handler::Plain(on_three)).unwrap().is_installed());
        assert!(vector.install(11, Handler::Plain(on_three)).unwrap().is_installed());
    }

    #[test]
    fn dispatch_invokes_installed_handler_with_context() {
        reset_hits();
        let mut builder = PlatformVectorBuilder::new();
        builder.install(5, Handler::WithContext(record_hit, 5)).unwrap();
        builder.install(9, Handler::WithContext(record_hit, 90)).unwrap();
        let vector = builder.initialize_defaults();

        vector.dispatch(5, &PanicSink);
        vector.dispatch(9, &PanicSink);
        vector.dispatch(5, &PanicSink);

        assert_eq!(hits(), vec![5, 90, 5]);
    }

    #[test]
    #[should_panic(expected = "unregistered Local(7)")]
    fn never_installed_cause_reaches_sentinel() {
        let vector = LocalVectorBuilder::new().initialize_defaults();
        vector.dispatch(7, &PanicSink);
    }

    #[test]
    #[should_panic(expected = "unregistered Local(40)")]
    fn index_past_table_reaches_sentinel() {
        let vector = LocalVectorBuilder::new().initialize_defaults();
        vector.dispatch(40, &PanicSink);
    }
}
