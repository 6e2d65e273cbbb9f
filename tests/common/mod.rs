//! Common test utilities
#![allow(dead_code)]

use gatherbench::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

/// Every strategy this host can run for `isa`
///
/// Hardware gathers are skipped on CPUs without the instruction set.
pub fn available_strategies(isa: Isa) -> Vec<Box<dyn GatherStrategy>> {
    [
        StrategyKind::Scalar,
        StrategyKind::Vector,
        StrategyKind::Hardware,
    ]
    .into_iter()
    .filter_map(|kind| select_strategy(kind, isa).ok())
    .collect()
}

/// Calibration small enough for unit-test runtimes
pub fn quick_calibration() -> Calibration {
    Calibration {
        warmup_reps: 3,
        target_secs: 1e-4,
    }
}

/// Random neighbor lists in trace-file form, plus the lists themselves
pub fn random_trace(
    seed: u64,
    nlocal: usize,
    nghost: usize,
    maxneighs: usize,
) -> (String, Vec<Vec<i32>>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let n_alloc = 2 * (nlocal + nghost);
    let lists: Vec<Vec<i32>> = (0..nlocal)
        .map(|_| {
            let count = rng.random_range(0..=maxneighs);
            (0..count)
                .map(|_| rng.random_range(0..n_alloc) as i32)
                .collect()
        })
        .collect();

    let mut text = format!("N: {nlocal} {nghost} {maxneighs}\n");
    for (atom, list) in lists.iter().enumerate() {
        writeln!(text, "A: {atom}").unwrap();
        // split long lists over several index records
        for chunk in list.chunks(5) {
            let idx: Vec<String> = chunk.iter().map(i32::to_string).collect();
            writeln!(text, "I: {}", idx.join(" ")).unwrap();
        }
    }
    (text, lists)
}

/// Write `text` to `dir/name` and return the path
pub fn write_file(dir: &Path, name: &str, text: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, text).unwrap();
    path
}
