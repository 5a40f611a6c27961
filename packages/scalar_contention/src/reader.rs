use std::hint::black_box;

use crate::{AccessStrategy, SharedCell};

/// What one reader did during the measured phase.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub struct ReaderReport {
    /// Reads performed. Always equal to the configured operation count.
    pub reads: u64,

    /// The most recent value observed, or the value the cell was created with if no read
    /// happened.
    pub last_value: i64,
}

/// Drives one reader of a workload run: a fixed number of reads and nothing else.
#[derive(Debug)]
pub struct ReaderDriver<'a, S> {
    cell: &'a SharedCell<S>,
    op_count: u64,
}

impl<'a, S: AccessStrategy> ReaderDriver<'a, S> {
    /// Creates a reader that will perform exactly `op_count` reads of `cell`.
    #[must_use]
    pub fn new(cell: &'a SharedCell<S>, op_count: u64) -> Self {
        Self { cell, op_count }
    }

    /// Performs the reads. Only the last value is kept.
    ///
    /// `initial` is reported as the last value when the operation count is zero.
    #[must_use]
    pub fn run(&self, initial: i64) -> ReaderReport {
        let mut last_value = initial;

        for _ in 0..self.op_count {
            // The value is otherwise unused; black_box keeps the read from being optimized away.
            last_value = black_box(self.cell.read());
        }

        ReaderReport {
            reads: self.op_count,
            last_value: black_box(last_value),
        }
    }
}
