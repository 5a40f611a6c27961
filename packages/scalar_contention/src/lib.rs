#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Measures what it costs to share one mutable 64-bit scalar between a single writer thread and
//! a number of concurrent reader threads, under different synchronization strategies.
//!
//! The core pieces are:
//!
//! - [`AccessStrategy`] and its four implementations, [`Unsynchronized`], [`ExclusiveLock`],
//!   [`SharedExclusiveLock`] and [`AtomicVariable`], bound to a value by [`SharedCell`].
//! - [`WriterDriver`] and [`ReaderDriver`], the loops executed by the writer and reader threads.
//! - [`WorkloadRunner`], which starts the writer, times exactly the reader phase, then stops and
//!   joins the writer using a [`StopSignal`].
//! - [`Sweep`] and [`Scenario`], which walk every scenario across 1 to 5 readers.
//!
//! This package is not meant for use in production, serving only as a development tool for
//! comparing synchronization strategies.
//!
//! # Operating principles
//!
//! ## Measurement window
//!
//! The writer is started and confirmed live before the timer starts. The timer covers launching
//! the readers and waiting for all of them to complete their fixed number of reads. The writer is
//! stopped only after every reader has completed, and writer shutdown is not timed.
//!
//! ## Cancellation
//!
//! The writer is never forcibly terminated. It polls a [`StopSignal`] once per loop iteration,
//! so it exits at most one iteration after the stop is broadcast. All threads are scoped to the
//! run that created them; no thread outlives a workload run.
//!
//! # Example
//!
//! ```
//! use scalar_contention::{StrategyKind, WorkloadConfig, WorkloadRunner, WriterPacing};
//!
//! let config = WorkloadConfig::new(StrategyKind::SharedExclusiveLock, 3, WriterPacing::Throttled, 1000)?;
//!
//! let measurement = WorkloadRunner::run(&config);
//!
//! assert_eq!(measurement.readers().len(), 3);
//! println!("{:.2} ns per read", measurement.nanos_per_read());
//! # Ok::<(), scalar_contention::ConfigError>(())
//! ```
//!
//! # Criterion
//!
//! With the `criterion` feature enabled, [`Scenario::execute_criterion`] registers one benchmark
//! group per scenario and lets Criterion pick the operation count.

mod error;
mod reader;
mod runner;
mod stop_signal;
mod strategy;
mod sweep;
mod sweep_criterion;
mod writer;

pub use error::*;
pub use reader::*;
pub use runner::*;
pub use stop_signal::*;
pub use strategy::*;
pub use sweep::*;
pub use writer::*;
