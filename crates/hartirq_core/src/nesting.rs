use core::sync::atomic::{AtomicU32, Ordering};

/// Count of interrupt handlers currently executing.
///
/// The scheduler reads it to defer context switches requested from inside
/// a handler until the outermost handler leaves.
pub struct IsrNesting {
    depth: AtomicU32,
}

impl Default for IsrNesting {
    fn default() -> Self {
        Self::new()
    }
}

impl IsrNesting {
    pub const fn new() -> Self {
        Self {
            depth: AtomicU32::new(0),
        }
    }

    /// Marks entry into a handler; the returned guard marks the exit.
    pub fn enter(&self) -> IsrScope<'_> {
        self.depth.fetch_add(1, Ordering::Acquire);
        IsrScope { nesting: self }
    }

    /// Number of handler bodies currently executing.
    pub fn depth(&self) -> u32 {
        self.depth.load(Ordering::Relaxed)
    }

    /// True while any handler is running.
    pub fn in_isr(&self) -> bool {
        self.depth() != 0
    }
}

/// Guard held for the duration of one handler body.
pub struct IsrScope<'a> {
    nesting: &'a IsrNesting,
}

impl IsrScope<'_> {
    /// True when this scope is not nested inside another handler.
    pub fn is_outermost(&self) -> bool {
        self.nesting.depth() == 1
    }
}

impl Drop for IsrScope<'_> {
    fn drop(&mut self) {
        self.nesting.depth.fetch_sub(1, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scopes_track_depth() {
        let nesting = IsrNesting::new();
        assert!(!nesting.in_isr());
        {
            let outer = nesting.enter();
            assert!(outer.is_outermost());
            {
                let inner = nesting.enter();
                assert_eq!(nesting.depth(), 2);
                assert!(!inner.is_outermost());
            }
            assert_eq!(nesting.depth(), 1);
        }
        assert!(!nesting.in_isr());
    }
}
