//! Neighbor-list trace replay
//!
//! ```text
//! gatherbench-md --trace <file> [--freq 2.5] [--line 64] [--mem-trace] ...
//! ```

use clap::Parser;
use gatherbench::cli::{KernelArgs, exit_with, init_logging};
use gatherbench::prelude::*;
use gatherbench::trace::tracer::mem_tracer_path;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;

/// MD variant of the gather benchmark, driven by a captured trace
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Input file with traced neighbor indices
    #[arg(short, long)]
    trace: PathBuf,

    /// Nominal CPU frequency in GHz
    #[arg(short, long, default_value_t = 2.5)]
    freq: f64,

    /// Cache-line size in bytes
    #[arg(short, long, default_value_t = 64)]
    line: usize,

    /// Write every memory access to `mem_tracer_<trace>.txt` (times one traced pass)
    #[arg(long)]
    mem_trace: bool,

    #[command(flatten)]
    kernel: KernelArgs,
}

fn run(cli: Cli) -> Result<()> {
    let trace = NeighborTrace::open(&cli.trace)?;
    let config = cli.kernel.apply(
        BenchConfig::default()
            .with_freq_ghz(cli.freq)
            .with_cache_line(cli.line),
    );
    let mut bench = TraceBench::new(config, trace)?;
    let mut report = Report::new(std::io::stdout().lock());

    if cli.mem_trace {
        let path = mem_tracer_path(&cli.trace);
        info!(path = %path.display(), "tracing memory accesses");
        let mut tracer = MemTracer::create(&path)?;
        bench.run(&mut report, Some(&mut tracer))?;
        info!(lines = tracer.lines(), "memory trace written");
        tracer.finish()?;
    } else {
        bench.run(&mut report, None)?;
    }
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
