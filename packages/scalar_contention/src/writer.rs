use std::str::FromStr;
use std::sync::atomic::{self, AtomicUsize};
use std::thread;

use crate::{AccessStrategy, ConfigError, SharedCell, StopSignal};

/// In throttled mode the writer writes on every Nth iteration and only yields on the rest.
pub const THROTTLED_WRITE_INTERVAL: u64 = 100;

/// How hard the writer thread pushes on the shared cell.
#[derive(Clone, Copy, Debug, Default, derive_more::Display, Eq, Hash, PartialEq)]
#[expect(
    clippy::exhaustive_enums,
    reason = "the two pacing modes are the whole design space we measure"
)]
pub enum WriterPacing {
    /// Write on every iteration without pause, maximizing write-side contention.
    #[default]
    #[display("saturated")]
    Saturated,

    /// Write on one iteration in [`THROTTLED_WRITE_INTERVAL`] and yield the processor on every
    /// iteration, approximating a realistic low write rate.
    #[display("throttled")]
    Throttled,
}

impl WriterPacing {
    /// Both pacing modes.
    pub const ALL: [Self; 2] = [Self::Saturated, Self::Throttled];
}

impl FromStr for WriterPacing {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|pacing| pacing.to_string() == s)
            .ok_or_else(|| ConfigError::UnknownPacing(s.to_owned()))
    }
}

/// What the writer did before it observed the stop signal.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub struct WriterReport {
    /// Loop iterations executed, including the ones that only yielded.
    pub iterations: u64,

    /// Writes issued to the cell.
    pub writes: u64,

    /// The last value written, if any write happened.
    pub last_written: Option<i64>,

    /// How many readers had reported completion when the writer exited.
    pub readers_completed_at_exit: usize,
}

/// Drives the single writer of a workload run.
///
/// The writer writes its own iteration counter, so every value it ever stores is in
/// `0..iterations`. It polls the stop signal once per iteration, which bounds its exit latency
/// to one iteration in either pacing mode.
#[derive(Debug)]
pub struct WriterDriver<'a, S> {
    cell: &'a SharedCell<S>,
    stop: &'a StopSignal,
    readers_completed: &'a AtomicUsize,
    pacing: WriterPacing,
}

impl<'a, S: AccessStrategy> WriterDriver<'a, S> {
    /// Creates a writer for `cell` that runs until `stop` is signaled.
    ///
    /// `readers_completed` is only inspected once, after the stop is observed.
    #[must_use]
    pub fn new(
        cell: &'a SharedCell<S>,
        stop: &'a StopSignal,
        readers_completed: &'a AtomicUsize,
        pacing: WriterPacing,
    ) -> Self {
        Self {
            cell,
            stop,
            readers_completed,
            pacing,
        }
    }

    /// Runs the write loop until the stop signal is observed.
    ///
    /// `started` is called exactly once, after the first iteration (or right away if the stop
    /// was already signaled). The caller can wait on it to know that the writer is live and that
    /// the cell already holds a written value before it opens the measurement window.
    pub fn run(&self, started: impl FnOnce()) -> WriterReport {
        let progress = match self.pacing {
            WriterPacing::Saturated => self.drive(started, Self::saturated_step),
            WriterPacing::Throttled => self.drive(started, Self::throttled_step),
        };

        WriterReport {
            iterations: progress.iterations,
            writes: progress.writes,
            last_written: progress.last_written,
            // Acquire pairs with the Release increments made by readers. Every reader increments
            // before the stop is broadcast, and we are past observing the stop here.
            readers_completed_at_exit: self.readers_completed.load(atomic::Ordering::Acquire),
        }
    }

    fn drive(&self, started: impl FnOnce(), step: impl Fn(&Self, &mut Progress)) -> Progress {
        let mut progress = Progress::default();

        if !self.stop.is_stopped() {
            step(self, &mut progress);
        }

        started();

        while !self.stop.is_stopped() {
            step(self, &mut progress);
        }

        progress
    }

    #[inline]
    fn saturated_step(&self, progress: &mut Progress) {
        progress.write(self.cell);
        progress.iterations = progress.iterations.wrapping_add(1);
    }

    #[inline]
    fn throttled_step(&self, progress: &mut Progress) {
        if progress.iterations.is_multiple_of(THROTTLED_WRITE_INTERVAL) {
            progress.write(self.cell);
        }

        thread::yield_now();
        progress.iterations = progress.iterations.wrapping_add(1);
    }
}

#[derive(Debug, Default)]
struct Progress {
    iterations: u64,
    writes: u64,
    last_written: Option<i64>,
}

impl Progress {
    /// Writes the current iteration number.
    #[inline]
    fn write<S: AccessStrategy>(&mut self, cell: &SharedCell<S>) {
        let value = self.iterations.cast_signed();
        cell.write(value);

        self.last_written = Some(value);
        self.writes = self.writes.wrapping_add(1);
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::{AtomicVariable, ExclusiveLock, SharedExclusiveLock};

    #[test]
    fn stopped_before_start_writes_nothing() {
        let cell = SharedCell::<AtomicVariable>::new(-5);
        let stop = StopSignal::new();
        let completed = AtomicUsize::new(0);
        stop.stop();

        for pacing in WriterPacing::ALL {
            let report = WriterDriver::new(&cell, &stop, &completed, pacing).run(|| {});

            assert_eq!(report.iterations, 0);
            assert_eq!(report.writes, 0);
            assert_eq!(report.last_written, None);
        }

        assert_eq!(cell.read(), -5);
    }

    #[cfg_attr(miri, ignore)]
    #[test]
    fn saturated_writes_every_iteration() {
        let cell = SharedCell::<ExclusiveLock>::new(-1);
        let stop = StopSignal::new();
        let completed = AtomicUsize::new(0);

        let report = thread::scope(|s| {
            let writer = s.spawn(|| {
                WriterDriver::new(&cell, &stop, &completed, WriterPacing::Saturated).run(|| {})
            });

            thread::sleep(Duration::from_millis(10));
            stop.stop();
            writer.join().unwrap()
        });

        assert_eq!(report.iterations, report.writes);
        assert!(report.writes > 0);

        let last = report.last_written.unwrap();
        assert_eq!(cell.read(), last);
        assert_eq!(last, (report.iterations - 1).cast_signed());
    }

    #[cfg_attr(miri, ignore)]
    #[test]
    fn throttled_writes_one_in_interval() {
        let cell = SharedCell::<SharedExclusiveLock>::new(-1);
        let stop = StopSignal::new();
        let completed = AtomicUsize::new(0);

        let report = thread::scope(|s| {
            let writer = s.spawn(|| {
                WriterDriver::new(&cell, &stop, &completed, WriterPacing::Throttled).run(|| {})
            });

            thread::sleep(Duration::from_millis(10));
            stop.stop();
            writer.join().unwrap()
        });

        assert!(report.iterations > 0);
        assert_eq!(
            report.writes,
            report.iterations.div_ceil(THROTTLED_WRITE_INTERVAL)
        );

        let last = report.last_written.unwrap();
        assert_eq!(last % THROTTLED_WRITE_INTERVAL.cast_signed(), 0);
        assert_eq!(cell.read(), last);
    }

    #[test]
    fn started_callback_runs_once() {
        let cell = SharedCell::<AtomicVariable>::new(0);
        let stop = StopSignal::new();
        let completed = AtomicUsize::new(0);
        stop.stop();

        let mut calls = 0;
        _ = WriterDriver::new(&cell, &stop, &completed, WriterPacing::Saturated).run(|| calls += 1);

        assert_eq!(calls, 1);
    }

    #[test]
    fn cell_holds_written_value_when_started() {
        let cell = SharedCell::<AtomicVariable>::new(-1);
        let completed = AtomicUsize::new(0);

        for pacing in WriterPacing::ALL {
            let stop = StopSignal::new();
            cell.write(-1);

            _ = WriterDriver::new(&cell, &stop, &completed, pacing).run(|| {
                assert_eq!(cell.read(), 0);
                stop.stop();
            });
        }
    }

    #[test]
    fn reports_completed_readers() {
        let cell = SharedCell::<AtomicVariable>::new(0);
        let stop = StopSignal::new();
        let completed = AtomicUsize::new(3);
        stop.stop();

        let report = WriterDriver::new(&cell, &stop, &completed, WriterPacing::Throttled).run(|| {});

        assert_eq!(report.readers_completed_at_exit, 3);
    }

    #[test]
    fn pacing_names_parse() {
        assert_eq!("saturated".parse::<WriterPacing>().unwrap(), WriterPacing::Saturated);
        assert_eq!("throttled".parse::<WriterPacing>().unwrap(), WriterPacing::Throttled);
        assert!(matches!(
            "bursty".parse::<WriterPacing>(),
            Err(ConfigError::UnknownPacing(_))
        ));
    }
}
