#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(coverage_nightly, coverage(off))]

//! Runs the scalar contention sweep and prints one line per configuration.

use std::io;
use std::process::ExitCode;

use argh::FromArgs;
use scalar_contention::{Scenario, Sweep, SweepEntry};
use tracing_subscriber::EnvFilter;

const DEFAULT_OP_COUNT: u64 = 1_000_000;

/// Compare the cost of sharing one scalar between a writer thread and 1 to 5 reader threads.
#[derive(FromArgs)]
struct Args {
    /// reads performed by each reader thread per measurement (default 1000000)
    #[argh(option, default = "DEFAULT_OP_COUNT")]
    ops: u64,

    /// scenario to run (`global_variable`, `mutex`, `rwlock`, `atomic`, `rwlock_realistic`);
    /// repeat to run several, omit to run all
    #[argh(option)]
    scenario: Vec<Scenario>,

    /// how many times to measure each configuration, reporting the fastest (default 1)
    #[argh(option, default = "1")]
    samples: u32,
}

#[cfg_attr(test, mutants::skip)] // Only observable through a child process and its output.
fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let args: Args = argh::from_env();

    if args.samples == 0 {
        eprintln!("--samples must be at least 1");
        return ExitCode::FAILURE;
    }

    let scenarios = if args.scenario.is_empty() {
        Scenario::ALL.to_vec()
    } else {
        args.scenario
    };

    let sweep = Sweep::new(&scenarios, args.ops);

    // Each sample is a full sweep; we keep the fastest observation per configuration.
    let mut best: Vec<SweepEntry> = Vec::new();

    for sample in 0..args.samples {
        let mut index = 0_usize;

        sweep.run(|entry| {
            if sample == 0 {
                best.push(entry);
            } else if let Some(current) = best.get_mut(index) {
                if entry.measurement.elapsed() < current.measurement.elapsed() {
                    *current = entry;
                }
            }

            index = index.wrapping_add(1);
        });
    }

    for entry in &best {
        println!(
            "{:<32} {:>12.2} ns/op {:>10.2} ns/read",
            entry.label(),
            entry.measurement.nanos_per_op(),
            entry.measurement.nanos_per_read(),
        );
    }

    ExitCode::SUCCESS
}
