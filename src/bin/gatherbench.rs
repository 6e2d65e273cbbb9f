//! Synthetic stride sweep
//!
//! ```text
//! gatherbench <stride> <freq GHz> [cache_line_bytes] [--layout aos|soa] [--verify] ...
//! ```

use clap::Parser;
use gatherbench::cli::{KernelArgs, exit_with, init_logging};
use gatherbench::prelude::*;
use std::process::ExitCode;

/// Gather benchmark over a geometric sweep of problem sizes
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Index stride (idx[i] = i * stride mod N)
    stride: usize,

    /// Nominal CPU frequency in GHz
    freq: f64,

    /// Cache-line size in bytes
    #[arg(default_value_t = 64)]
    cache_line: usize,

    /// Gather one f64 field per record; cy/gather counts 8 elements
    #[arg(long)]
    single_array: bool,

    #[command(flatten)]
    kernel: KernelArgs,
}

fn run(cli: Cli) -> Result<()> {
    let config = cli.kernel.apply(
        BenchConfig::default()
            .with_stride(cli.stride)
            .with_freq_ghz(cli.freq)
            .with_cache_line(cli.cache_line)
            .with_single_array(cli.single_array),
    );
    let mut bench = StrideBench::new(config)?;
    let mut report = Report::new(std::io::stdout().lock());
    bench.run(&mut report)?;
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => exit_with(&e),
    }
}
