#![cfg(any(test, feature = "criterion"))]

use std::hint::black_box;

use criterion::{Criterion, Throughput};

use crate::{MAX_READERS, MIN_READERS, Scenario, WorkloadRunner};

impl Scenario {
    /// Measures this scenario at every reader count as a Criterion benchmark group named after
    /// the scenario, with one benchmark per reader count labeled `readers: <n>`.
    ///
    /// Criterion chooses the per-reader operation count and keeps growing it until the timing
    /// is stable. Throughput is reported per read, so with more readers each Criterion iteration
    /// counts as that many elements.
    #[cfg_attr(test, mutants::skip)] // Timing output is only meaningful to a human reader.
    pub fn execute_criterion(&self, c: &mut Criterion) {
        let mut group = c.benchmark_group(self.name());

        for readers in MIN_READERS..=MAX_READERS {
            let config = self
                .config(readers, 0)
                .expect("sweep reader counts are always within the supported range");

            group.throughput(Throughput::Elements(
                u64::try_from(readers).expect("reader count always fits in u64"),
            ));

            group.bench_function(format!("readers: {readers}"), |b| {
                b.iter_custom(|iters| {
                    black_box(WorkloadRunner::run(&config.with_op_count(iters))).elapsed()
                });
            });
        }

        group.finish();
    }
}
