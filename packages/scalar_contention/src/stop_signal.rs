use std::sync::atomic::{self, AtomicBool};

/// One-shot broadcast that tells the writer of a workload run to exit.
///
/// The signal starts in the "run" state and moves to "stop" at most once; it never reverts.
/// Checking it is a single non-blocking load so that polling it on every writer iteration does
/// not itself perturb the contention being measured.
#[derive(Debug, Default)]
pub struct StopSignal {
    stopped: AtomicBool,
}

impl StopSignal {
    /// Creates a signal in the "run" state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves the signal to the "stop" state. Calling this again has no further effect.
    pub fn stop(&self) {
        // Release pairs with the Acquire in `is_stopped()` so that whatever the stopping thread
        // did before stopping is visible to the thread that observes the stop.
        self.stopped.store(true, atomic::Ordering::Release);
    }

    /// Whether [`stop()`][Self::stop] has been called.
    #[inline]
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(atomic::Ordering::Acquire)
    }
}
