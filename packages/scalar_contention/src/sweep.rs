use std::str::FromStr;

use tracing::info;

use crate::{
    ConfigError, MAX_READERS, MIN_READERS, Measurement, StrategyKind, WorkloadConfig,
    WorkloadRunner, WriterPacing,
};

/// A named pairing of access strategy and writer pacing whose cost we compare across reader
/// counts.
#[derive(Clone, Copy, Debug, derive_more::Display, Eq, Hash, PartialEq)]
#[display("{name}")]
pub struct Scenario {
    name: &'static str,
    strategy: StrategyKind,
    pacing: WriterPacing,
}

impl Scenario {
    /// No synchronization at all, against a saturated writer.
    pub const GLOBAL_VARIABLE: Self = Self::new(
        "global_variable",
        StrategyKind::Unsynchronized,
        WriterPacing::Saturated,
    );

    /// Readers and writer share one mutex, against a saturated writer.
    pub const MUTEX: Self = Self::new("mutex", StrategyKind::ExclusiveLock, WriterPacing::Saturated);

    /// Readers take a shared lock, against a saturated writer.
    pub const RWLOCK: Self = Self::new(
        "rwlock",
        StrategyKind::SharedExclusiveLock,
        WriterPacing::Saturated,
    );

    /// Atomic loads and stores, against a saturated writer.
    pub const ATOMIC: Self = Self::new(
        "atomic",
        StrategyKind::AtomicVariable,
        WriterPacing::Saturated,
    );

    /// Readers take a shared lock, against a writer that writes rarely and yields often.
    pub const RWLOCK_REALISTIC: Self = Self::new(
        "rwlock_realistic",
        StrategyKind::SharedExclusiveLock,
        WriterPacing::Throttled,
    );

    /// Every predefined scenario, in reporting order.
    pub const ALL: [Self; 5] = [
        Self::GLOBAL_VARIABLE,
        Self::MUTEX,
        Self::RWLOCK,
        Self::ATOMIC,
        Self::RWLOCK_REALISTIC,
    ];

    /// Defines a scenario. The name is used to label results.
    #[must_use]
    pub const fn new(name: &'static str, strategy: StrategyKind, pacing: WriterPacing) -> Self {
        Self {
            name,
            strategy,
            pacing,
        }
    }

    /// Label of the scenario in reports.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The access strategy measured by the scenario.
    #[must_use]
    pub fn strategy(&self) -> StrategyKind {
        self.strategy
    }

    /// How the writer is paced in the scenario.
    #[must_use]
    pub fn pacing(&self) -> WriterPacing {
        self.pacing
    }

    /// Builds the configuration of this scenario for a reader count and operation count.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ReaderCountOutOfRange`] if `readers` is out of range.
    pub fn config(&self, readers: usize, op_count: u64) -> Result<WorkloadConfig, ConfigError> {
        WorkloadConfig::new(self.strategy, readers, self.pacing, op_count)
    }
}

impl FromStr for Scenario {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|scenario| scenario.name == s)
            .ok_or_else(|| ConfigError::UnknownScenario(s.to_owned()))
    }
}

/// One measured point of a sweep.
#[derive(Debug)]
#[non_exhaustive]
pub struct SweepEntry {
    /// The scenario that was measured.
    pub scenario: Scenario,

    /// The measurement of the scenario at one reader count.
    pub measurement: Measurement,
}

impl SweepEntry {
    /// Number of concurrent readers in this entry.
    #[must_use]
    pub fn readers(&self) -> usize {
        self.measurement.config().readers().get()
    }

    /// Label in the `<scenario>/readers: <n>` form.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{}/readers: {}", self.scenario, self.readers())
    }
}

/// Measures every combination of scenario and reader count (1 through 5) with a fixed
/// per-reader operation count.
///
/// Configurations run strictly one after another; two runs never overlap.
///
/// # Examples
///
/// ```
/// use scalar_contention::{Scenario, Sweep};
///
/// let entries = Sweep::new(&[Scenario::ATOMIC], 100).entries();
///
/// assert_eq!(entries.len(), 5);
/// assert_eq!(entries[0].label(), "atomic/readers: 1");
/// ```
#[derive(Debug)]
pub struct Sweep<'a> {
    scenarios: &'a [Scenario],
    op_count: u64,
}

impl<'a> Sweep<'a> {
    /// Creates a sweep over `scenarios` where each reader performs `op_count` reads.
    #[must_use]
    pub fn new(scenarios: &'a [Scenario], op_count: u64) -> Self {
        Self {
            scenarios,
            op_count,
        }
    }

    /// Runs the sweep, handing each entry to `on_entry` as soon as it is measured.
    pub fn run(&self, mut on_entry: impl FnMut(SweepEntry)) {
        for &scenario in self.scenarios {
            for readers in MIN_READERS..=MAX_READERS {
                let config = scenario
                    .config(readers, self.op_count)
                    .expect("sweep reader counts are always within the supported range");

                let measurement = WorkloadRunner::run(&config);

                info!(
                    scenario = scenario.name(),
                    readers,
                    nanos_per_read = measurement.nanos_per_read(),
                    "configuration measured"
                );

                on_entry(SweepEntry {
                    scenario,
                    measurement,
                });
            }
        }
    }

    /// Runs the sweep and returns every entry in order.
    #[must_use]
    pub fn entries(&self) -> Vec<SweepEntry> {
        let mut entries = Vec::with_capacity(self.scenarios.len().saturating_mul(MAX_READERS));
        self.run(|entry| entries.push(entry));
        entries
    }
}

#[cfg(test)]
#[cfg(not(miri))]
mod tests {
    use super::*;

    #[test]
    fn all_scenarios_have_distinct_names() {
        for (i, a) in Scenario::ALL.iter().enumerate() {
            for b in Scenario::ALL.iter().skip(i + 1) {
                assert_ne!(a.name(), b.name());
            }
        }
    }

    #[test]
    fn only_realistic_scenario_is_throttled() {
        let throttled = Scenario::ALL
            .iter()
            .filter(|s| s.pacing() == WriterPacing::Throttled)
            .collect::<Vec<_>>();

        assert_eq!(throttled, [&Scenario::RWLOCK_REALISTIC]);
    }

    #[test]
    fn scenario_parses_from_name() {
        assert_eq!("mutex".parse::<Scenario>().unwrap(), Scenario::MUTEX);
        assert_eq!(
            "rwlock_realistic".parse::<Scenario>().unwrap(),
            Scenario::RWLOCK_REALISTIC
        );
        assert_eq!(
            "nope".parse::<Scenario>(),
            Err(ConfigError::UnknownScenario("nope".to_owned()))
        );
    }

    #[test]
    fn sweep_covers_every_combination_in_order() {
        let scenarios = [Scenario::GLOBAL_VARIABLE, Scenario::RWLOCK_REALISTIC];

        let entries = Sweep::new(&scenarios, 3).entries();

        let labels = entries.iter().map(SweepEntry::label).collect::<Vec<_>>();
        assert_eq!(
            labels,
            [
                "global_variable/readers: 1",
                "global_variable/readers: 2",
                "global_variable/readers: 3",
                "global_variable/readers: 4",
                "global_variable/readers: 5",
                "rwlock_realistic/readers: 1",
                "rwlock_realistic/readers: 2",
                "rwlock_realistic/readers: 3",
                "rwlock_realistic/readers: 4",
                "rwlock_realistic/readers: 5",
            ]
        );

        for entry in &entries {
            assert_eq!(entry.measurement.readers().len(), entry.readers());
            assert_eq!(entry.measurement.config().op_count(), 3);
            assert_eq!(entry.measurement.config().strategy(), entry.scenario.strategy());
        }
    }

    #[test]
    fn empty_sweep_measures_nothing() {
        assert!(Sweep::new(&[], 10).entries().is_empty());
    }
}
