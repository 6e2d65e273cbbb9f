//! # gatherbench
//!
//! **Micro-benchmarks for indexed ("gather") loads on x86-64 vector units.**
//!
//! gatherbench measures what it costs to pull scattered f64 records into
//! contiguous vector registers, as a function of index stride, record layout
//! (AoS or SoA), vector width and cache-line size. It reports wall-clock and
//! frequency-derived cycle counts next to an analytic cache-line model.
//!
//! ## Pieces
//!
//! - **Layout model** ([`layout`]): address rules and value encoding for
//!   AoS/SoA records with optional AoS padding
//! - **Datasets** ([`dataset`]): 64-byte aligned records and stride index
//!   patterns
//! - **Gather kernels** ([`kernels`]): scalar, portable vector and hardware
//!   (`vgatherdpd`) strategies behind one [`GatherStrategy`](kernels::GatherStrategy) trait
//! - **Trace replay** ([`trace`], [`replay`]): neighbor lists captured from an
//!   MD code, replayed atom by atom
//! - **Timing** ([`timer`], [`markers`]): calibrated repetition bursts with
//!   optional region markers
//! - **Verification and metrics** ([`verify`], [`metrics`], [`report`])
//! - **Engine** ([`bench`]): the per-point pipeline tying it together
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use gatherbench::prelude::*;
//!
//! # fn main() -> gatherbench::error::Result<()> {
//! let config = BenchConfig::default()
//!     .with_layout(LayoutKind::Aos)
//!     .with_stride(4)
//!     .with_verify(true);
//! let mut bench = StrideBench::new(config)?;
//! let mut report = Report::new(std::io::stdout().lock());
//! bench.run(&mut report)?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod bench;
pub mod cli;
pub mod config;
pub mod dataset;
pub mod error;
pub mod kernels;
pub mod layout;
pub mod markers;
pub mod memory;
pub mod metrics;
pub mod replay;
pub mod report;
pub mod timer;
pub mod trace;
pub mod verify;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::bench::{PointResult, StrideBench, TraceBench};
    pub use crate::config::{BenchConfig, SweepRange};
    pub use crate::dataset::{Dataset, Records};
    pub use crate::error::{Error, Result};
    pub use crate::kernels::{
        GatherOutput, GatherStrategy, HardwareGather, Isa, ScalarLoad, SimdLevel, StrategyKind,
        VectorLoad, detect_simd, select_strategy,
    };
    pub use crate::layout::{LayoutKind, RecordLayout};
    pub use crate::markers::{NoMarker, RegionMarker, TscMarker};
    pub use crate::metrics::{CacheGeometry, Metrics};
    pub use crate::replay::TraceReplay;
    pub use crate::report::Report;
    pub use crate::timer::{Calibration, Measurement};
    pub use crate::trace::NeighborTrace;
    pub use crate::trace::tracer::{AccessOp, AccessTracer, MemTracer};
}
