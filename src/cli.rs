//! Command-line plumbing shared by the binaries

use crate::config::BenchConfig;
use crate::error::Error;
use crate::kernels::{Isa, StrategyKind};
use crate::layout::LayoutKind;
use clap::Args;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Kernel-variant options common to both benchmarks
#[derive(Args, Clone, Debug, PartialEq)]
pub struct KernelArgs {
    /// Record layout: `aos` or `soa`
    #[arg(long, default_value = "soa")]
    pub layout: LayoutKind,

    /// Add one padding slot per AoS record
    #[arg(long)]
    pub padding: bool,

    /// Check every gathered record after timing
    #[arg(long)]
    pub verify: bool,

    /// Bracket the timed burst with the time-stamp counter
    #[arg(long)]
    pub measure_cycles: bool,

    /// Vector family: `avx2` (4 lanes) or `avx512` (8 lanes)
    ///
    /// Defaults to the widest family the CPU supports.
    #[arg(long)]
    pub isa: Option<Isa>,

    /// Gather kernel: `scalar`, `vector` or `hardware`
    ///
    /// Defaults to hardware gathers when available.
    #[arg(long)]
    pub strategy: Option<StrategyKind>,
}

impl KernelArgs {
    /// Fold these options into `config`
    pub fn apply(&self, config: BenchConfig) -> BenchConfig {
        let mut config = config
            .with_layout(self.layout)
            .with_padding(self.padding)
            .with_verify(self.verify)
            .with_measure_cycles(self.measure_cycles);
        if let Some(isa) = self.isa {
            config = config.with_isa(isa);
        }
        if let Some(strategy) = self.strategy {
            config = config.with_strategy(strategy);
        }
        config
    }
}

/// Install the stderr log subscriber (`RUST_LOG`, default `info`)
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Report a failed run and pick the exit status
///
/// Verification mismatches print the `Test failed!` status on stdout, like
/// a passing point prints `Test passed!`.
pub fn exit_with(err: &Error) -> ExitCode {
    if err.is_verification_failure() {
        println!("{}", crate::bench::TEST_FAILED);
    }
    eprintln!("Error: {err}");
    ExitCode::FAILURE
}
