use thiserror::Error;

use crate::{MAX_READERS, MIN_READERS};

/// A workload or sweep was described with values outside what the harness can measure.
///
/// Running a workload never fails; these errors only come from building its configuration.
#[derive(Debug, Error, Eq, PartialEq)]
#[non_exhaustive]
pub enum ConfigError {
    /// The reader count is outside the supported range.
    #[error(
        "reader count {0} is outside the supported range {min}..={max}",
        min = MIN_READERS,
        max = MAX_READERS
    )]
    ReaderCountOutOfRange(usize),

    /// No access strategy has the given name.
    #[error(
        "unknown access strategy '{0}' (expected unsynchronized, exclusive_lock, shared_exclusive_lock or atomic_variable)"
    )]
    UnknownStrategy(String),

    /// No writer pacing mode has the given name.
    #[error("unknown writer pacing '{0}' (expected saturated or throttled)")]
    UnknownPacing(String),

    /// No predefined scenario has the given name.
    #[error("unknown scenario '{0}'")]
    UnknownScenario(String),
}
