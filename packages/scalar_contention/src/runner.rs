use std::marker::PhantomData;
use std::num::NonZero;
use std::panic;
use std::sync::atomic::{self, AtomicUsize};
use std::sync::mpsc;
use std::thread::{self, ScopedJoinHandle};
use std::time::{Duration, Instant};

use tracing::debug;

use crate::{
    AccessStrategy, AtomicVariable, ConfigError, ExclusiveLock, ReaderDriver, ReaderReport,
    SharedCell, SharedExclusiveLock, StopSignal, StrategyKind, Unsynchronized, WriterDriver,
    WriterPacing, WriterReport,
};

/// Smallest number of concurrent readers a workload may use.
pub const MIN_READERS: usize = 1;

/// Largest number of concurrent readers a workload may use.
pub const MAX_READERS: usize = 5;

/// The value every fresh cell holds before the writer's first write.
///
/// The writer only ever writes non-negative values and completes its first write before any
/// reader is launched, so readers of a run never observe this value.
pub const INITIAL_VALUE: i64 = -1;

/// Describes one measured configuration. Immutable once constructed.
///
/// # Examples
///
/// ```
/// use scalar_contention::{StrategyKind, WorkloadConfig, WriterPacing};
///
/// let config =
///     WorkloadConfig::new(StrategyKind::AtomicVariable, 3, WriterPacing::Saturated, 1000)?;
/// assert_eq!(config.readers().get(), 3);
///
/// assert!(WorkloadConfig::new(StrategyKind::AtomicVariable, 6, WriterPacing::Saturated, 1).is_err());
/// # Ok::<(), scalar_contention::ConfigError>(())
/// ```
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct WorkloadConfig {
    strategy: StrategyKind,
    readers: NonZero<usize>,
    pacing: WriterPacing,
    op_count: u64,
}

impl WorkloadConfig {
    /// Creates a configuration with `readers` concurrent reader threads, each performing
    /// `op_count` reads.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ReaderCountOutOfRange`] if `readers` is not in
    /// [`MIN_READERS`]`..=`[`MAX_READERS`].
    pub fn new(
        strategy: StrategyKind,
        readers: usize,
        pacing: WriterPacing,
        op_count: u64,
    ) -> Result<Self, ConfigError> {
        let readers = NonZero::new(readers)
            .filter(|r| r.get() <= MAX_READERS)
            .ok_or(ConfigError::ReaderCountOutOfRange(readers))?;

        Ok(Self {
            strategy,
            readers,
            pacing,
            op_count,
        })
    }

    /// The access strategy guarding the shared cell.
    #[must_use]
    pub fn strategy(&self) -> StrategyKind {
        self.strategy
    }

    /// Number of concurrent reader threads.
    #[must_use]
    pub fn readers(&self) -> NonZero<usize> {
        self.readers
    }

    /// How the writer thread is paced.
    #[must_use]
    pub fn pacing(&self) -> WriterPacing {
        self.pacing
    }

    /// Reads performed by each reader.
    #[must_use]
    pub fn op_count(&self) -> u64 {
        self.op_count
    }

    /// Returns a copy of this configuration with a different per-reader operation count.
    #[must_use]
    pub fn with_op_count(self, op_count: u64) -> Self {
        Self { op_count, ..self }
    }
}

/// Executes workload configurations, one at a time.
///
/// Each run follows a fixed protocol:
///
/// 1. A fresh [`SharedCell`] and [`StopSignal`] are created.
/// 2. The writer thread is started and the runner waits until it has completed its first
///    iteration.
/// 3. The measurement window opens.
/// 4. The reader threads are started.
/// 5. The runner waits for every reader to finish.
/// 6. The measurement window closes. Only steps 4 and 5 are timed.
/// 7. The stop is broadcast and the writer is joined, in both pacing modes.
/// 8. The cell and signal are dropped.
///
/// All threads are scoped to the run, so nothing outlives it, even if a thread panics.
#[derive(Debug)]
pub struct WorkloadRunner {
    _no_construct: PhantomData<()>,
}

impl WorkloadRunner {
    /// Runs one configuration to completion and returns its measurement.
    ///
    /// # Panics
    ///
    /// Propagates a panic from any reader or writer thread, after the writer has been stopped.
    pub fn run(config: &WorkloadConfig) -> Measurement {
        match config.strategy() {
            StrategyKind::Unsynchronized => run_with::<Unsynchronized>(config),
            StrategyKind::ExclusiveLock => run_with::<ExclusiveLock>(config),
            StrategyKind::SharedExclusiveLock => run_with::<SharedExclusiveLock>(config),
            StrategyKind::AtomicVariable => run_with::<AtomicVariable>(config),
        }
    }
}

fn run_with<S: AccessStrategy>(config: &WorkloadConfig) -> Measurement {
    debug!(
        strategy = %config.strategy(),
        readers = config.readers().get(),
        pacing = %config.pacing(),
        op_count = config.op_count(),
        "workload starting"
    );

    let cell = SharedCell::<S>::new(INITIAL_VALUE);
    let stop = StopSignal::new();
    let readers_completed = AtomicUsize::new(0);

    let (elapsed, reader_reports, writer_report) = thread::scope(|s| {
        let cell = &cell;
        let stop = &stop;
        let readers_completed = &readers_completed;

        // If anything below unwinds, the writer must still be told to stop or the scope
        // would wait for it forever.
        let _stop_on_unwind = scopeguard::guard(stop, |stop| stop.stop());

        // Rendezvous with the writer once it has completed its first iteration, so readers never
        // run against a writer that has not started yet. A writer that panics first drops the
        // sender, which ends the wait.
        let (live_tx, live_rx) = mpsc::sync_channel::<()>(0);

        let writer = thread::Builder::new()
            .name("scalar-writer".to_owned())
            .spawn_scoped(s, move || {
                debug!(pacing = %config.pacing(), "writer thread started");

                let report = WriterDriver::new(cell, stop, readers_completed, config.pacing())
                    .run(move || {
                        // The coordinator only hangs up if it is itself unwinding.
                        drop(live_tx.send(()));
                    });

                debug!(
                    iterations = report.iterations,
                    writes = report.writes,
                    "writer thread exiting"
                );

                report
            })
            .expect("failed to spawn writer thread: thread spawning failure is not supported");

        if live_rx.recv().is_err() {
            // The sender only goes away unannounced if the writer panicked.
            _ = join_propagating_panic(writer);
            panic!("writer thread exited before reporting that it is live");
        }

        let start = Instant::now();

        // All readers are spawned before any is joined.
        let mut readers = Vec::with_capacity(config.readers().get());

        for reader_index in 0..config.readers().get() {
            readers.push(
                thread::Builder::new()
                    .name(format!("scalar-reader-{reader_index}"))
                    .spawn_scoped(s, move || {
                        let report = ReaderDriver::new(cell, config.op_count()).run(INITIAL_VALUE);

                        // Release pairs with the Acquire load the writer makes when it exits.
                        readers_completed.fetch_add(1, atomic::Ordering::Release);

                        report
                    })
                    .expect(
                        "failed to spawn reader thread: thread spawning failure is not supported",
                    ),
            );
        }

        let reader_reports = readers
            .into_iter()
            .map(join_propagating_panic)
            .collect::<Box<[_]>>();

        let elapsed = start.elapsed();

        // Every reader has been joined, so the stop happens-after all reader completions.
        stop.stop();
        debug!(
            elapsed_nanos = elapsed.as_nanos(),
            "readers finished, writer stop broadcast"
        );

        let writer_report = join_propagating_panic(writer);

        (elapsed, reader_reports, writer_report)
    });

    Measurement {
        config: *config,
        elapsed,
        readers: reader_reports,
        writer: writer_report,
    }
}

fn join_propagating_panic<T>(handle: ScopedJoinHandle<'_, T>) -> T {
    match handle.join() {
        Ok(value) => value,
        Err(payload) => panic::resume_unwind(payload),
    }
}

/// The outcome of running one workload configuration.
///
/// Only the reader phase is timed. The derived rates are reported and then discarded; nothing is
/// persisted.
#[derive(Debug)]
#[must_use = "a measurement is the only output of a workload run"]
pub struct Measurement {
    config: WorkloadConfig,
    elapsed: Duration,
    readers: Box<[ReaderReport]>,
    writer: WriterReport,
}

impl Measurement {
    /// The configuration that was measured.
    #[must_use]
    pub fn config(&self) -> &WorkloadConfig {
        &self.config
    }

    /// Wall-clock time from the launch of the first reader to the completion of the last.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// One report per reader thread that was launched.
    #[must_use]
    pub fn readers(&self) -> &[ReaderReport] {
        &self.readers
    }

    /// What the writer did while the readers ran.
    #[must_use]
    pub fn writer(&self) -> &WriterReport {
        &self.writer
    }

    /// Reads performed across all readers.
    #[must_use]
    pub fn total_reads(&self) -> u64 {
        self.readers.iter().map(|r| r.reads).sum()
    }

    /// Elapsed time divided by the per-reader operation count.
    ///
    /// This is the rate a benchmark framework sees when it supplies the operation count as its
    /// iteration budget. Zero if no operations were requested.
    #[must_use]
    #[cfg_attr(test, mutants::skip)] // Real timing is not something we can set expectations on.
    pub fn time_per_op(&self) -> Duration {
        divide_duration(self.elapsed, self.config.op_count())
    }

    /// Like [`time_per_op()`][Self::time_per_op] but with sub-nanosecond resolution.
    #[must_use]
    #[cfg_attr(test, mutants::skip)] // Real timing is not something we can set expectations on.
    pub fn nanos_per_op(&self) -> f64 {
        divide_nanos(self.elapsed, self.config.op_count())
    }

    /// Average latency of a single read: elapsed time divided by readers × operation count.
    ///
    /// Zero if no reads were performed.
    #[must_use]
    #[cfg_attr(test, mutants::skip)] // Real timing is not something we can set expectations on.
    pub fn nanos_per_read(&self) -> f64 {
        divide_nanos(self.elapsed, self.total_reads())
    }
}

fn divide_nanos(duration: Duration, divisor: u64) -> f64 {
    if divisor == 0 {
        return 0.0;
    }

    #[expect(
        clippy::cast_precision_loss,
        reason = "precision loss only matters beyond 2^52 nanoseconds or operations"
    )]
    let nanos = duration.as_nanos() as f64 / divisor as f64;

    nanos
}

fn divide_duration(duration: Duration, divisor: u64) -> Duration {
    duration
        .as_nanos()
        .checked_div(u128::from(divisor))
        .map_or(Duration::ZERO, |nanos| {
            Duration::from_nanos(
                nanos
                    .try_into()
                    .expect("overflowing u64 is unrealistic when using a real clock"),
            )
        })
}
