use hartirq_common::board::PLIC_MAX_PRIORITY;

use crate::IrqError;
use crate::fault::FaultSink;
use crate::vector::{InterruptVector, Platform};

/// Register-level view of one PLIC context.
///
/// `claim` returns the highest-priority pending source above the
/// threshold and masks it until the same ID is passed to `complete`.
/// Source 0 is never a real source; a claim of 0 means nothing is pending.
pub trait PlatformController {
    /// Priority 0 never interrupts.
    fn set_priority(&self, source: u32, priority: u32);

    fn enable(&self, source: u32);

    fn disable(&self, source: u32);

    /// Sources at or below `threshold` are masked for this context.
    fn set_threshold(&self, threshold: u32);

    fn claim(&self) -> u32;

    /// Signals that the handler of a claimed `source` has finished.
    fn complete(&self, source: u32);
}

/// Puts the controller in a known state: every source disabled with
/// priority 0, threshold 0.
pub fn reset<P: PlatformController + ?Sized>(plic: &P, sources: usize) {
    for source in 1..sources as u32 {
        plic.disable(source);
        plic.set_priority(source, 0);
    }
    plic.set_threshold(0);
    log::debug!("plic reset: {} sources", sources.saturating_sub(1));
}

/// Enables `source` at `priority`, clamped to `1..=PLIC_MAX_PRIORITY`.
///
/// A source may be enabled without a handler installed; it then lands in
/// the not-installed sentinel when it fires.
pub fn enable_source<P, const N: usize>(
    plic: &P,
    vector: &InterruptVector<Platform, N>,
    source: u32,
    priority: u32,
) -> Result<(), IrqError>
where
    P: PlatformController + ?Sized,
{
    let index = source as usize;
    if index == 0 {
        return Err(IrqError::ReservedSource(0));
    }
    if index >= N {
        return Err(IrqError::IndexOutOfRange { index, capacity: N });
    }
    if !vector.slot(index).is_installed() {
        log::warn!("plic source {} enabled without a handler", source);
    }
    plic.set_priority(source, priority.clamp(1, PLIC_MAX_PRIORITY));
    plic.enable(source);
    Ok(())
}

impl<const N: usize> InterruptVector<Platform, N> {
    /// Asks the controller for the highest-priority pending source.
    #[inline(always)]
    pub fn claim_highest_pending<P: PlatformController + ?Sized>(plic: &P) -> u32 {
        plic.claim()
    }

    /// Services one external interrupt: claim, run the handler, complete.
    ///
    /// Returns the serviced source, or `None` if nothing was pending, in
    /// which case neither a handler nor a completion is issued. A source
    /// without a handler diverges into the sentinel and is never
    /// completed.
    #[inline]
    pub fn dispatch_pending<P, F>(&self, plic: &P, sink: &F) -> Option<u32>
    where
        P: PlatformController + ?Sized,
        F: FaultSink + ?Sized,
    {
        let source = Self::claim_highest_pending(plic);
        if source == 0 {
            return None;
        }
        self.dispatch(source as usize, sink);
        plic.complete(source);
        Some(source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakePlic, PanicSink, PlicEvent, hits, record_hit, reset_hits};
    use crate::vector::{Handler, PlatformVector, PlatformVectorBuilder};

    fn vector_with(sources: &[usize]) -> PlatformVector {
        let mut builder = PlatformVectorBuilder::new();
        for &source in sources {
            builder.install(source, Handler::WithContext(record_hit, source)).unwrap();
        }
        builder.initialize_defaults()
    }

    #[test]
    fn empty_claim_neither_dispatches_nor_completes() {
        reset_hits();
        let vector = vector_with(&[10]);
        let plic = FakePlic::default();

        assert_eq!(vector.dispatch_pending(&plic, &PanicSink), None);
        assert!(hits().is_empty());
        assert_eq!(plic.events(), vec![PlicEvent::Claim(0)]);
    }

    #[test]
    fn every_claim_is_completed_before_the_next() {
        reset_hits();
        let vector = vector_with(&[3, 10]);
        let plic = FakePlic::with_pending(&[10, 3, 10]);

        while vector.dispatch_pending(&plic, &PanicSink).is_some() {}

        assert_eq!(hits(), vec![10, 3, 10]);
        assert_eq!(
            plic.events(),
            vec![
                PlicEvent::Claim(10),
                PlicEvent::Complete(10),
                PlicEvent::Claim(3),
                PlicEvent::Complete(3),
                PlicEvent::Claim(10),
                PlicEvent::Complete(10),
                PlicEvent::Claim(0),
            ]
        );
    }

    #[test]
    #[should_panic(expected = "unregistered Platform(4)")]
    fn claimed_source_without_handler_reaches_sentinel() {
        let vector = vector_with(&[10]);
        let plic = FakePlic::with_pending(&[4]);
        vector.dispatch_pending(&plic, &PanicSink);
    }

    #[test]
    fn reset_disables_all_real_sources() {
        let plic = FakePlic::default();
        reset(&plic, 4);
        assert_eq!(
            plic.events(),
            vec![
                PlicEvent::Disable(1),
                PlicEvent::Priority(1, 0),
                PlicEvent::Disable(2),
                PlicEvent::Priority(2, 0),
                PlicEvent::Disable(3),
                PlicEvent::Priority(3, 0),
                PlicEvent::Threshold(0),
            ]
        );
    }

    #[test]
    fn enable_source_clamps_priority_and_checks_range() {
        let vector = vector_with(&[10]);
        let plic = FakePlic::default();

        enable_source(&plic, &vector, 10, 99).unwrap();
        enable_source(&plic, &vector, 11, 0).unwrap();
        assert_eq!(
            plic.events(),
            vec![
                PlicEvent::Priority(10, PLIC_MAX_PRIORITY),
                PlicEvent::Enable(10),
                PlicEvent::Priority(11, 1),
                PlicEvent::Enable(11),
            ]
        );

        assert_eq!(
            enable_source(&plic, &vector, 0, 1),
            Err(IrqError::ReservedSource(0))
        );
        assert!(matches!(
            enable_source(&plic, &vector, vector.len() as u32, 1),
            Err(IrqError::IndexOutOfRange { .. })
        ));
    }
}
