//! Progress reporting for batch calls.

use std::sync::atomic::{AtomicUsize, Ordering};

/// Receiver for batch progress.
///
/// `advance` may be called from several worker threads at once.
pub trait Progress: Send + Sync {
    /// A batch of `total` items is starting.
    fn start(&self, total: usize, label: &str);

    /// One item finished.
    fn advance(&self);

    /// The batch finished.
    fn finish(&self);
}

/// Discards progress.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct NoProgress;

impl Progress for NoProgress {
    fn start(&self, _total: usize, _label: &str) {}

    fn advance(&self) {}

    fn finish(&self) {}
}

/// Counts finished items.
#[derive(Debug, Default)]
pub struct CountingProgress {
    total: AtomicUsize,
    done: AtomicUsize,
}

impl CountingProgress {
    /// Create a counter at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Items announced by the last `start`.
    #[must_use]
    pub fn total(&self) -> usize {
        self.total.load(Ordering::SeqCst)
    }

    /// Items finished so far.
    #[must_use]
    pub fn done(&self) -> usize {
        self.done.load(Ordering::SeqCst)
    }
}

impl Progress for CountingProgress {
    fn start(&self, total: usize, _label: &str) {
        self.total.store(total, Ordering::SeqCst);
        self.done.store(0, Ordering::SeqCst);
    }

    fn advance(&self) {
        self.done.fetch_add(1, Ordering::SeqCst);
    }

    fn finish(&self) {}
}
