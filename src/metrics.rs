//! Derived benchmark metrics
//!
//! Converts a [`Measurement`] into per-lookup times and cycle counts, and
//! evaluates the analytic cache-line model:
//!
//! | Metric                | Formula                                     |
//! |-----------------------|---------------------------------------------|
//! | time/LUP (us)         | `t * 1e6 / (N * rep)`                       |
//! | cycles/iteration      | `t * f * VL / (N * rep)`                    |
//! | cycles/gather         | `cycles/iteration / D`                      |
//! | cycles/element        | `t * f / (N * rep * D)`                     |
//! | cache lines touched   | `N * (ceil(epl / stride) - 1)`              |
//!
//! `f` is the nominal clock in Hz and `epl` the number of f64 elements per
//! cache line. An empty problem (`N * rep == 0`) reports zeros.

use crate::error::{Error, Result};
use crate::layout::LayoutKind;
use crate::timer::Measurement;

const ELEM_BYTES: usize = std::mem::size_of::<f64>();
const INDEX_BYTES: usize = std::mem::size_of::<i32>();

/// Integer division rounding up
///
/// # Panics
/// If `b` is zero.
#[inline]
pub const fn round_up_div(a: u64, b: u64) -> u64 {
    a.div_ceil(b)
}

/// Cache-line size and the element counts derived from it
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct CacheGeometry {
    line_bytes: usize,
}

impl Default for CacheGeometry {
    fn default() -> Self {
        Self { line_bytes: 64 }
    }
}

impl CacheGeometry {
    /// Geometry for `line_bytes`-byte lines (a positive multiple of 8)
    pub fn new(line_bytes: usize) -> Result<Self> {
        if line_bytes == 0 || !line_bytes.is_multiple_of(ELEM_BYTES) {
            return Err(Error::invalid_argument(
                "cache_line",
                format!("{line_bytes} is not a positive multiple of {ELEM_BYTES} bytes"),
            ));
        }
        Ok(Self { line_bytes })
    }

    /// Line size in bytes
    #[inline]
    pub fn line_bytes(&self) -> usize {
        self.line_bytes
    }

    /// f64 elements per line
    #[inline]
    pub fn elements_per_line(&self) -> usize {
        self.line_bytes / ELEM_BYTES
    }

    /// Analytic cache lines touched by `n` lookups at `stride`
    ///
    /// Zero once the stride reaches a full line.
    ///
    /// # Panics
    /// If `stride` is zero.
    pub fn lines_touched(&self, n: u64, stride: u64) -> u64 {
        let epl = self.elements_per_line() as u64;
        n * (round_up_div(epl, stride) - 1)
    }

    /// Distinct lines one `lanes`-wide gather of `dims`-field records reaches
    ///
    /// AoS records are `record_elems` slots wide (fields plus padding) and
    /// share lines across fields; SoA pays once per field.
    pub fn lines_per_gather(
        &self,
        kind: LayoutKind,
        record_elems: usize,
        dims: usize,
        stride: usize,
        lanes: usize,
    ) -> usize {
        let epl = self.elements_per_line();
        match kind {
            LayoutKind::Aos => {
                let span = stride.saturating_mul(lanes).saturating_mul(record_elems);
                (span / epl).clamp(1, lanes.max(1))
            }
            LayoutKind::Soa => (stride.saturating_mul(lanes) / epl).clamp(1, lanes.max(1)) * dims,
        }
    }
}

/// One report row worth of derived values
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Metrics {
    /// Lookups per kernel call (`N`)
    pub n: usize,
    /// Bytes of records plus indices touched per call, in kB
    pub size_kb: f64,
    /// Seconds spent in the measured burst
    pub time: f64,
    /// Microseconds per lookup
    pub time_per_lookup: f64,
    /// Cycles per `VL` lookups
    pub cycles_per_iteration: f64,
    /// Cycles per single-field gather instruction
    pub cycles_per_gather: f64,
    /// Cycles per gathered element
    pub cycles_per_element: f64,
    /// Analytic cache lines touched by one call
    pub lines_touched: u64,
    /// Cycles per element from the region marker's counter
    pub tsc_cycles_per_element: Option<f64>,
}

impl Metrics {
    /// Derive metrics for `n` lookups of `dims`-field records on a
    /// `lanes`-wide vector unit clocked at `freq_ghz`
    pub fn compute(n: usize, dims: usize, lanes: usize, freq_ghz: f64, m: &Measurement) -> Self {
        let freq = freq_ghz * 1e9;
        let lookups = n as f64 * m.repetitions as f64;
        let elems = lookups * dims as f64;
        let t = m.elapsed_secs;

        let (time_per_lookup, cycles_per_iteration, cycles_per_element) = if lookups > 0.0 {
            (
                t * 1e6 / lookups,
                t * freq * lanes as f64 / lookups,
                t * freq / elems,
            )
        } else {
            (0.0, 0.0, 0.0)
        };
        let cycles_per_gather = if dims > 0 {
            cycles_per_iteration / dims as f64
        } else {
            0.0
        };

        Self {
            n,
            size_kb: (n * (dims * ELEM_BYTES + INDEX_BYTES)) as f64 / 1000.0,
            time: t,
            time_per_lookup,
            cycles_per_iteration,
            cycles_per_gather,
            cycles_per_element,
            lines_touched: 0,
            tsc_cycles_per_element: m
                .cycles
                .filter(|_| elems > 0.0)
                .map(|cy| cy as f64 / elems),
        }
    }

    /// Single-array throughput variant: one field, eight elements per gather
    pub fn single_array(n: usize, freq_ghz: f64, m: &Measurement) -> Self {
        let mut metrics = Self::compute(n, 1, 1, freq_ghz, m);
        metrics.cycles_per_gather = metrics.cycles_per_element * 8.0;
        metrics
    }

    /// Attach the analytic cache-line count
    pub fn with_lines_touched(mut self, lines: u64) -> Self {
        self.lines_touched = lines;
        self
    }

    /// Cache lines touched in millions (the `tCL(10^6)` column)
    pub fn lines_touched_millions(&self) -> f64 {
        self.lines_touched as f64 / 1e6
    }
}
