//! Benchmark engine
//!
//! [`StrideBench`] sweeps synthetic stride patterns over growing problem
//! sizes; [`TraceBench`] replays one captured neighbor-list trace. Both
//! share the same pipeline per point:
//!
//! ```text
//! generate ──► calibrate + time ──► verify (optional) ──► metrics ──► report row
//! ```
//!
//! Buffers live for one point only and are dropped before the next one is
//! allocated.

use crate::config::BenchConfig;
use crate::dataset::Dataset;
use crate::error::Result;
use crate::kernels::{GatherOutput, GatherStrategy, detect_simd, select_strategy};
use crate::layout::LayoutKind;
use crate::markers::{NoMarker, RegionMarker, TscMarker};
use crate::metrics::{CacheGeometry, Metrics};
use crate::replay::TraceReplay;
use crate::report::{Report, SweepPreamble, TracePreamble};
use crate::timer::{Calibration, Measurement};
use crate::trace::NeighborTrace;
use crate::trace::tracer::AccessTracer;
use crate::verify::{verify_stride, verify_trace};
use std::io::Write;
use tracing::{debug, info, info_span, warn};

/// Status line printed after each verified point
pub const TEST_PASSED: &str = "Test passed!";

/// Status line for a verification mismatch
pub const TEST_FAILED: &str = "Test failed!";

/// Result of one benchmark point
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PointResult {
    /// Raw timing
    pub measurement: Measurement,
    /// Derived values
    pub metrics: Metrics,
    /// Whether the output was checked (and matched)
    pub verified: bool,
}

type Resolved = (Box<dyn GatherStrategy>, Box<dyn RegionMarker>);

/// Validate, apply host fallbacks, and build the strategy and marker
fn resolve(config: &mut BenchConfig) -> Result<Resolved> {
    config.validate()?;
    let strategy = select_strategy(config.strategy, config.isa)?;

    if config.padding && config.layout == LayoutKind::Soa {
        warn!("padding only applies to the AoS layout; ignored for SoA");
    }
    if config.measure_cycles && !TscMarker::available() {
        warn!("no cycle counter on this architecture; measured cycles disabled");
        config.measure_cycles = false;
    }

    let marker: Box<dyn RegionMarker> = if config.measure_cycles {
        Box::new(TscMarker::new())
    } else {
        Box::new(NoMarker)
    };

    info!(
        simd = %detect_simd(),
        isa = %config.isa,
        strategy = strategy.name(),
        layout = %config.layout,
        padding = config.effective_padding(),
        single_array = config.single_array,
        verify = config.verify,
        "benchmark configured"
    );
    Ok((strategy, marker))
}

/// Keep the counter column only when the header announces it
fn measured_cycles(mut metrics: Metrics, measure_cycles: bool) -> Metrics {
    if !measure_cycles {
        metrics.tsc_cycles_per_element = None;
    }
    metrics
}

/// Synthetic stride sweep
pub struct StrideBench {
    config: BenchConfig,
    strategy: Box<dyn GatherStrategy>,
    geometry: CacheGeometry,
    marker: Box<dyn RegionMarker>,
}

impl StrideBench {
    /// Validate `config` and pick the gather strategy
    pub fn new(mut config: BenchConfig) -> Result<Self> {
        let (strategy, marker) = resolve(&mut config)?;
        let geometry = config.geometry()?;
        Ok(Self {
            config,
            strategy,
            geometry,
            marker,
        })
    }

    /// Replace the region marker around the measured burst
    pub fn with_marker(mut self, marker: Box<dyn RegionMarker>) -> Self {
        self.marker = marker;
        self
    }

    /// Replace the selected kernel with a caller-supplied strategy
    pub fn with_gather(mut self, strategy: Box<dyn GatherStrategy>) -> Self {
        self.strategy = strategy;
        self
    }

    /// Resolved configuration
    pub fn config(&self) -> &BenchConfig {
        &self.config
    }

    /// Name of the active gather strategy
    pub fn strategy_name(&self) -> &'static str {
        self.strategy.name()
    }

    /// Analytic cache lines per gather for the configured stride and layout
    pub fn lines_per_gather(&self) -> usize {
        let c = &self.config;
        let record_elems = c.dims + c.effective_padding() as usize;
        self.geometry
            .lines_per_gather(c.layout, record_elems, c.dims, c.stride, c.lanes())
    }

    /// Report preamble for this sweep
    pub fn preamble(&self) -> SweepPreamble {
        let c = &self.config;
        SweepPreamble {
            isa: c.isa.as_str(),
            layout: c.layout.as_str(),
            stride: c.stride,
            dims: c.dims,
            freq_ghz: c.freq_ghz,
            cache_line: c.cache_line,
            lanes: c.lanes(),
            lines_per_gather: self.lines_per_gather(),
        }
    }

    /// Generate, time, and optionally verify one problem size
    pub fn run_point(&mut self, n: usize) -> Result<PointResult> {
        let c = &self.config;
        let _span = info_span!("point", n, stride = c.stride).entered();

        let dataset = Dataset::synthetic(c.layout, c.dims, c.effective_padding(), n, c.stride)?;
        let records = dataset.records();
        let idx = dataset.indices();
        let mut out = if c.verify {
            Some(GatherOutput::new(c.dims, n)?)
        } else {
            None
        };

        let strategy = &*self.strategy;
        let measurement = c.calibration.measure(
            || {
                // SAFETY: synthetic indices lie in [0, n), inside the 2n-record container.
                unsafe { strategy.gather(records, idx, out.as_mut(), 0) };
            },
            self.marker.as_mut(),
        );
        debug!(
            warmup_secs = measurement.warmup_secs,
            repetitions = measurement.repetitions,
            elapsed_secs = measurement.elapsed_secs,
            "measured"
        );

        if let Some(out) = &out {
            verify_stride(records, n, c.stride, out)?;
        }

        let metrics = if c.single_array {
            Metrics::single_array(n, c.freq_ghz, &measurement)
        } else {
            Metrics::compute(n, c.dims, c.lanes(), c.freq_ghz, &measurement)
        }
        .with_lines_touched(self.geometry.lines_touched(n as u64, c.stride as u64));
        let metrics = measured_cycles(metrics, c.measure_cycles);

        Ok(PointResult {
            measurement,
            metrics,
            verified: out.is_some(),
        })
    }

    /// Run the whole sweep, writing the report as points complete
    pub fn run<W: Write>(&mut self, report: &mut Report<W>) -> Result<Vec<PointResult>> {
        report.sweep_preamble(&self.preamble())?;
        report.sweep_header(self.config.measure_cycles)?;

        let points: Vec<usize> = self.config.sweep.points(self.config.lanes()).collect();
        let mut results = Vec::with_capacity(points.len());
        for n in points {
            let result = self.run_point(n)?;
            if result.verified {
                report.line(TEST_PASSED)?;
            }
            report.sweep_row(&result.metrics)?;
            report.flush()?;
            results.push(result);
        }
        Ok(results)
    }
}

/// Replay of one captured neighbor-list trace
pub struct TraceBench {
    config: BenchConfig,
    strategy: Box<dyn GatherStrategy>,
    replay: TraceReplay,
    marker: Box<dyn RegionMarker>,
}

impl TraceBench {
    /// Bind `trace` to a record container laid out per `config`
    pub fn new(mut config: BenchConfig, trace: NeighborTrace) -> Result<Self> {
        let (strategy, marker) = resolve(&mut config)?;
        info!(
            nlocal = trace.nlocal(),
            nghost = trace.nghost(),
            maxneighs = trace.maxneighs(),
            neighbors = trace.total_neighbors(),
            "trace loaded"
        );
        let padding = config.effective_padding();
        let replay = TraceReplay::new(trace, config.layout, config.dims, padding)?;
        Ok(Self {
            config,
            strategy,
            replay,
            marker,
        })
    }

    /// Replace the region marker around the measured burst
    pub fn with_marker(mut self, marker: Box<dyn RegionMarker>) -> Self {
        self.marker = marker;
        self
    }

    /// Resolved configuration
    pub fn config(&self) -> &BenchConfig {
        &self.config
    }

    /// Trace and records being replayed
    pub fn replay(&self) -> &TraceReplay {
        &self.replay
    }

    /// Report preamble for this replay
    pub fn preamble(&self) -> TracePreamble {
        let c = &self.config;
        TracePreamble {
            isa: c.isa.as_str(),
            layout: c.layout.as_str(),
            dims: c.dims,
            freq_ghz: c.freq_ghz,
            cache_line: c.cache_line,
            lanes: c.lanes(),
        }
    }

    /// Time the replay
    ///
    /// With a `tracer`, a single traced pass is timed instead of a
    /// calibrated burst, and every access is reported to it.
    pub fn run_point(&mut self, tracer: Option<&mut dyn AccessTracer>) -> Result<PointResult> {
        let c = &self.config;
        let replay = &self.replay;
        let total = replay.trace().total_neighbors();
        let _span = info_span!("trace_replay", atoms = replay.trace().nlocal(), total).entered();

        let mut out = if c.verify {
            Some(replay.output()?)
        } else {
            None
        };

        let measurement = match tracer {
            Some(tracer) => {
                let mut traced = Ok(0);
                let m = Calibration::measure_once(
                    || traced = replay.run_traced(out.as_mut(), tracer),
                    self.marker.as_mut(),
                );
                traced?;
                m
            }
            None => {
                let strategy = &*self.strategy;
                c.calibration.measure(
                    || {
                        replay.run(strategy, out.as_mut());
                    },
                    self.marker.as_mut(),
                )
            }
        };
        debug!(
            warmup_secs = measurement.warmup_secs,
            repetitions = measurement.repetitions,
            elapsed_secs = measurement.elapsed_secs,
            "measured"
        );

        if let Some(out) = &out {
            verify_trace(replay.records(), replay.trace(), out)?;
        }

        let metrics = measured_cycles(
            Metrics::compute(total, c.dims, c.lanes(), c.freq_ghz, &measurement),
            c.measure_cycles,
        );
        Ok(PointResult {
            measurement,
            metrics,
            verified: out.is_some(),
        })
    }

    /// Replay and write the full report
    pub fn run<W: Write>(
        &mut self,
        report: &mut Report<W>,
        tracer: Option<&mut dyn AccessTracer>,
    ) -> Result<PointResult> {
        report.trace_preamble(&self.preamble())?;
        report.trace_header(self.config.measure_cycles)?;
        let result = self.run_point(tracer)?;
        report.trace_row(&result.metrics)?;
        if result.verified {
            report.line(TEST_PASSED)?;
        }
        report.flush()?;
        Ok(result)
    }
}
