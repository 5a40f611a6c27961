#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(coverage_nightly, coverage(off))] // This is all test code, no need to test it.

//! Private helpers for the scalar contention tests.
//!
//! Workload runs that lose track of their writer hang instead of failing. The watchdog here
//! turns such a hang into a test failure.

use std::env;
use std::panic;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

/// How long a watched test may run before it is considered hung.
///
/// Miri is dramatically slower at thread synchronization, so it gets more time.
#[must_use]
pub fn default_timeout() -> Duration {
    if cfg!(miri) {
        Duration::from_secs(60)
    } else {
        Duration::from_secs(10)
    }
}

/// Runs `test_fn` on a separate thread, panicking if it does not finish within
/// [`default_timeout()`].
///
/// # Panics
///
/// Panics if the test exceeds the timeout, or resumes the panic of `test_fn` if it panicked.
///
/// # Example
///
/// ```rust
/// use testing::with_watchdog;
///
/// let answer = with_watchdog(|| 6 * 7);
/// assert_eq!(answer, 42);
/// ```
pub fn with_watchdog<F, R>(test_fn: F) -> R
where
    F: FnOnce() -> R + Send + 'static,
    R: Send + 'static,
{
    with_watchdog_timeout(default_timeout(), test_fn)
}

/// Like [`with_watchdog()`] but with a caller-chosen limit.
///
/// When the `MUTATION_TESTING` environment variable is `1` the watchdog steps aside and runs
/// `test_fn` inline, so that the mutation tester can observe hanging mutants itself.
///
/// # Panics
///
/// Panics if the test exceeds `timeout`, or resumes the panic of `test_fn` if it panicked.
pub fn with_watchdog_timeout<F, R>(timeout: Duration, test_fn: F) -> R
where
    F: FnOnce() -> R + Send + 'static,
    R: Send + 'static,
{
    if env::var("MUTATION_TESTING").as_deref() == Ok("1") {
        return test_fn();
    }

    let (tx, rx) = mpsc::channel();

    let watched = thread::spawn(move || {
        // If the receiver is gone, the watchdog already gave up on us.
        drop(tx.send(test_fn()));
    });

    match rx.recv_timeout(timeout) {
        Ok(result) => {
            watched.join().expect("watched thread already delivered its result");
            result
        }
        Err(mpsc::RecvTimeoutError::Timeout) => {
            panic!("test did not finish within {timeout:?}, it is probably hung");
        }
        Err(mpsc::RecvTimeoutError::Disconnected) => match watched.join() {
            Ok(()) => panic!("watched thread exited without delivering a result"),
            Err(payload) => panic::resume_unwind(payload),
        },
    }
}

/// Whether `actual` is no slower than `baseline` stretched by `tolerance`.
///
/// Timing comparisons on shared machines are noisy; a tolerance of 1.5 means `actual` may take
/// up to half again as long as `baseline`.
#[must_use]
pub fn no_slower_than(actual: Duration, baseline: Duration, tolerance: f64) -> bool {
    actual.as_secs_f64() <= baseline.as_secs_f64() * tolerance
}
