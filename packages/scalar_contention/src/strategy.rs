use std::str::FromStr;
use std::sync::atomic::{self, AtomicI64};

use parking_lot::{Mutex, RwLock};

use crate::ConfigError;

/// A way of guarding one 64-bit scalar that is written by one thread and read by many.
///
/// Every operation is total: there is no error path. Lock-based strategies may block the caller
/// while another thread holds the conflicting lock class; the others never block.
///
/// Each lock is held for exactly one read or one write, never across operations, so that the
/// measured contention comes from the strategy itself and not from how the caller batches work.
pub trait AccessStrategy: Send + Sync {
    /// Creates the guarded storage, holding `initial` until the first write.
    fn new(initial: i64) -> Self
    where
        Self: Sized;

    /// Reads the current value, subject to the strategy's consistency class.
    fn read(&self) -> i64;

    /// Stores `value`, making it available to subsequent reads subject to the strategy's
    /// consistency class.
    fn write(&self, value: i64);
}

/// Baseline with no ordering or visibility guarantee between threads.
///
/// A plain non-atomic access from two threads is a data race, which Rust does not permit even
/// for a baseline, so this uses relaxed atomic operations instead. On mainstream targets these
/// compile to ordinary aligned loads and stores without fences. A reader may observe a stale
/// value for an unbounded time; it will never observe a torn one.
#[derive(Debug, Default)]
pub struct Unsynchronized {
    value: AtomicI64,
}

impl AccessStrategy for Unsynchronized {
    fn new(initial: i64) -> Self {
        Self {
            value: AtomicI64::new(initial),
        }
    }

    #[inline]
    fn read(&self) -> i64 {
        self.value.load(atomic::Ordering::Relaxed)
    }

    #[inline]
    fn write(&self, value: i64) {
        self.value.store(value, atomic::Ordering::Relaxed);
    }
}

/// Readers and the writer all take the same mutual-exclusion lock.
#[derive(Debug, Default)]
pub struct ExclusiveLock {
    value: Mutex<i64>,
}

impl AccessStrategy for ExclusiveLock {
    fn new(initial: i64) -> Self {
        Self {
            value: Mutex::new(initial),
        }
    }

    #[inline]
    fn read(&self) -> i64 {
        *self.value.lock()
    }

    #[inline]
    fn write(&self, value: i64) {
        *self.value.lock() = value;
    }
}

/// Readers take shared access, the writer takes exclusive access.
///
/// Any number of readers may hold the lock together as long as the writer does not.
#[derive(Debug, Default)]
pub struct SharedExclusiveLock {
    value: RwLock<i64>,
}

impl AccessStrategy for SharedExclusiveLock {
    fn new(initial: i64) -> Self {
        Self {
            value: RwLock::new(initial),
        }
    }

    #[inline]
    fn read(&self) -> i64 {
        *self.value.read()
    }

    #[inline]
    fn write(&self, value: i64) {
        *self.value.write() = value;
    }
}

/// Sequentially consistent atomic loads and stores. Never blocks.
#[derive(Debug, Default)]
pub struct AtomicVariable {
    value: AtomicI64,
}

impl AccessStrategy for AtomicVariable {
    fn new(initial: i64) -> Self {
        Self {
            value: AtomicI64::new(initial),
        }
    }

    #[inline]
    fn read(&self) -> i64 {
        self.value.load(atomic::Ordering::SeqCst)
    }

    #[inline]
    fn write(&self, value: i64) {
        self.value.store(value, atomic::Ordering::SeqCst);
    }
}

/// Holds exactly one 64-bit value, guarded by the access strategy `S`.
///
/// A cell is created fresh for every workload run and is owned by that run. Threads of the run
/// borrow it; nothing outlives the run.
///
/// # Examples
///
/// ```
/// use scalar_contention::{AtomicVariable, SharedCell};
///
/// let cell = SharedCell::<AtomicVariable>::new(0);
/// cell.write(42);
/// assert_eq!(cell.read(), 42);
/// ```
#[derive(Debug)]
pub struct SharedCell<S> {
    strategy: S,
}

impl<S: AccessStrategy> SharedCell<S> {
    /// Creates a cell holding `initial`.
    #[must_use]
    pub fn new(initial: i64) -> Self {
        Self {
            strategy: S::new(initial),
        }
    }

    /// Reads the value through the bound strategy.
    #[inline]
    #[must_use]
    pub fn read(&self) -> i64 {
        self.strategy.read()
    }

    /// Writes the value through the bound strategy.
    #[inline]
    pub fn write(&self, value: i64) {
        self.strategy.write(value);
    }
}

/// Names one of the access strategies, for use where the strategy is chosen at runtime.
///
/// The variants form a ladder of increasing synchronization cost and correctness guarantee.
///
/// The [`Display`][std::fmt::Display] form is the stable name accepted by
/// [`FromStr`][std::str::FromStr].
#[derive(Clone, Copy, Debug, derive_more::Display, Eq, Hash, PartialEq)]
#[expect(
    clippy::exhaustive_enums,
    reason = "the set of strategies under comparison is closed"
)]
pub enum StrategyKind {
    /// See [`Unsynchronized`].
    #[display("unsynchronized")]
    Unsynchronized,

    /// See [`ExclusiveLock`].
    #[display("exclusive_lock")]
    ExclusiveLock,

    /// See [`SharedExclusiveLock`].
    #[display("shared_exclusive_lock")]
    SharedExclusiveLock,

    /// See [`AtomicVariable`].
    #[display("atomic_variable")]
    AtomicVariable,
}

impl StrategyKind {
    /// Every strategy, cheapest first.
    pub const ALL: [Self; 4] = [
        Self::Unsynchronized,
        Self::ExclusiveLock,
        Self::SharedExclusiveLock,
        Self::AtomicVariable,
    ];

    /// Whether an access through this strategy may block waiting for another thread.
    #[must_use]
    pub fn blocks(self) -> bool {
        matches!(self, Self::ExclusiveLock | Self::SharedExclusiveLock)
    }
}

impl FromStr for StrategyKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.to_string() == s)
            .ok_or_else(|| ConfigError::UnknownStrategy(s.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Barrier;
    use std::thread;
    use std::time::{Duration, Instant};

    use super::*;

    fn write_then_read<S: AccessStrategy>() {
        let cell = SharedCell::<S>::new(-1);
        assert_eq!(cell.read(), -1);

        cell.write(7);
        assert_eq!(cell.read(), 7);

        cell.write(i64::MAX);
        assert_eq!(cell.read(), i64::MAX);

        cell.write(i64::MIN);
        assert_eq!(cell.read(), i64::MIN);
    }

    #[test]
    fn atomic_variable_reads_back_write() {
        write_then_read::<AtomicVariable>();
    }

    #[test]
    fn exclusive_lock_reads_back_write() {
        write_then_read::<ExclusiveLock>();
    }

    #[test]
    fn shared_exclusive_lock_reads_back_write() {
        write_then_read::<SharedExclusiveLock>();
    }

    #[test]
    fn unsynchronized_reads_back_write_on_same_thread() {
        write_then_read::<Unsynchronized>();
    }

    #[cfg_attr(miri, ignore)]
    #[test]
    fn shared_exclusive_lock_admits_concurrent_readers() {
        let lock = RwLock::new(5_i64);
        let both_inside = Barrier::new(2);

        // If shared access were exclusive, the second reader could never reach the barrier
        // while the first one is still holding its guard, and this would deadlock.
        thread::scope(|s| {
            for _ in 0..2 {
                s.spawn(|| {
                    let guard = lock.read();
                    both_inside.wait();
                    assert_eq!(*guard, 5);
                });
            }
        });
    }

    #[cfg_attr(miri, ignore)]
    #[test]
    fn shared_reads_overlap_in_time() {
        const HOLD: Duration = Duration::from_millis(50);

        let cell = SharedCell::<SharedExclusiveLock>::new(3);

        let hold_shared = || {
            let guard = cell.strategy.value.read();
            thread::sleep(HOLD);
            *guard
        };

        let serialized_start = Instant::now();
        assert_eq!(hold_shared(), 3);
        assert_eq!(hold_shared(), 3);
        let serialized = serialized_start.elapsed();

        let concurrent_start = Instant::now();
        thread::scope(|s| {
            let first = s.spawn(hold_shared);
            let second = s.spawn(hold_shared);
            assert_eq!(first.join().unwrap(), 3);
            assert_eq!(second.join().unwrap(), 3);
        });
        let concurrent = concurrent_start.elapsed();

        // Overlapping holds take about one HOLD, serialized ones at least two.
        assert!(
            testing::no_slower_than(concurrent, serialized, 0.8),
            "concurrent shared reads took {concurrent:?}, serialized took {serialized:?}"
        );
    }

    #[cfg_attr(miri, ignore)]
    #[test]
    fn exclusive_lock_blocks_reader_while_held() {
        let cell = SharedCell::<ExclusiveLock>::new(1);
        let guard = cell.strategy.value.lock();

        thread::scope(|s| {
            let reader = s.spawn(|| cell.read());

            thread::sleep(Duration::from_millis(20));
            assert!(!reader.is_finished());

            drop(guard);
            assert_eq!(reader.join().unwrap(), 1);
        });
    }

    #[test]
    fn kind_names_round_trip() {
        for kind in StrategyKind::ALL {
            assert_eq!(kind.to_string().parse::<StrategyKind>().unwrap(), kind);
        }
    }

    #[test]
    fn unknown_kind_is_rejected() {
        let err = "spinlock".parse::<StrategyKind>().unwrap_err();
        assert!(matches!(err, ConfigError::UnknownStrategy(ref name) if name == "spinlock"));
    }

    #[test]
    fn only_lock_strategies_block() {
        assert!(!StrategyKind::Unsynchronized.blocks());
        assert!(StrategyKind::ExclusiveLock.blocks());
        assert!(StrategyKind::SharedExclusiveLock.blocks());
        assert!(!StrategyKind::AtomicVariable.blocks());
    }
}
