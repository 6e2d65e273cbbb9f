//! Benchmark configuration
//!
//! Every option that selects a kernel variant or a report parameter is
//! resolved once into a [`BenchConfig`] before any buffer is allocated.

use crate::error::{Error, Result};
use crate::kernels::{Isa, StrategyKind};
use crate::layout::LayoutKind;
use crate::metrics::CacheGeometry;
use crate::timer::Calibration;

/// Geometric sweep over problem sizes
///
/// Starting from `start`, each point is rounded up to a multiple of the
/// vector width, used, then multiplied by `growth`, while below `end`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SweepRange {
    /// First N (before rounding)
    pub start: usize,
    /// Exclusive upper bound on N
    pub end: usize,
    /// Multiplicative step
    pub growth: f64,
}

impl Default for SweepRange {
    fn default() -> Self {
        Self {
            start: 512,
            end: 200_000,
            growth: 1.5,
        }
    }
}

impl SweepRange {
    /// A sweep containing only `n`
    pub fn single(n: usize) -> Self {
        Self {
            start: n,
            end: n + 1,
            growth: 2.0,
        }
    }

    /// Check that the sweep terminates
    pub fn validate(&self) -> Result<()> {
        if self.start == 0 {
            return Err(Error::invalid_argument("sweep", "start must be at least 1"));
        }
        if !(self.growth.is_finite() && self.growth > 1.0) {
            return Err(Error::invalid_argument(
                "sweep",
                format!("growth must be greater than 1, got {}", self.growth),
            ));
        }
        Ok(())
    }

    /// Problem sizes for a `lanes`-wide vector unit
    pub fn points(&self, lanes: usize) -> SweepPoints {
        SweepPoints {
            next: self.start,
            end: self.end,
            growth: self.growth,
            lanes: lanes.max(1),
        }
    }
}

/// Iterator over the sizes of a [`SweepRange`]
#[derive(Clone, Debug)]
pub struct SweepPoints {
    next: usize,
    end: usize,
    growth: f64,
    lanes: usize,
}

impl Iterator for SweepPoints {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.next >= self.end {
            return None;
        }
        let n = self.next.next_multiple_of(self.lanes);
        let grown = (n as f64 * self.growth) as usize;
        // a growth factor that rounds back to n would never terminate
        self.next = grown.max(n + 1);
        Some(n)
    }
}

/// Everything one benchmark run needs to know
#[derive(Clone, Debug, PartialEq)]
pub struct BenchConfig {
    /// Record container shape
    pub layout: LayoutKind,
    /// One padding slot per AoS record (ignored for SoA)
    pub padding: bool,
    /// Bracket the measured burst with a cycle-counting region marker
    pub measure_cycles: bool,
    /// Write gathered records and check them after timing
    pub verify: bool,
    /// One-field throughput mode: `dims` is 1 and a gather counts 8 elements
    pub single_array: bool,
    /// Vector family (sets the vector width)
    pub isa: Isa,
    /// Gather kernel implementation
    pub strategy: StrategyKind,
    /// Fields per record
    pub dims: usize,
    /// Cache-line size in bytes
    pub cache_line: usize,
    /// Nominal core clock in GHz
    pub freq_ghz: f64,
    /// Synthetic index stride
    pub stride: usize,
    /// Problem sizes to sweep
    pub sweep: SweepRange,
    /// Warm-up and measurement sizing
    pub calibration: Calibration,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            layout: LayoutKind::default(),
            padding: false,
            measure_cycles: false,
            verify: false,
            single_array: false,
            isa: Isa::detect(),
            strategy: StrategyKind::detect(),
            dims: 3,
            cache_line: 64,
            freq_ghz: 2.5,
            stride: 1,
            sweep: SweepRange::default(),
            calibration: Calibration::default(),
        }
    }
}

impl BenchConfig {
    /// Set the record layout
    pub fn with_layout(mut self, layout: LayoutKind) -> Self {
        self.layout = layout;
        self
    }

    /// Enable or disable AoS padding
    pub fn with_padding(mut self, padding: bool) -> Self {
        self.padding = padding;
        self
    }

    /// Enable or disable the cycle-counting marker
    pub fn with_measure_cycles(mut self, measure_cycles: bool) -> Self {
        self.measure_cycles = measure_cycles;
        self
    }

    /// Enable or disable verification
    pub fn with_verify(mut self, verify: bool) -> Self {
        self.verify = verify;
        self
    }

    /// Switch the single-array throughput mode
    ///
    /// Enabling it also sets `dims` to 1.
    pub fn with_single_array(mut self, single_array: bool) -> Self {
        self.single_array = single_array;
        if single_array {
            self.dims = 1;
        }
        self
    }

    /// Set the vector family
    pub fn with_isa(mut self, isa: Isa) -> Self {
        self.isa = isa;
        self
    }

    /// Set the gather strategy
    pub fn with_strategy(mut self, strategy: StrategyKind) -> Self {
        self.strategy = strategy;
        self
    }

    /// Set the number of fields per record
    pub fn with_dims(mut self, dims: usize) -> Self {
        self.dims = dims;
        self
    }

    /// Set the cache-line size in bytes
    pub fn with_cache_line(mut self, cache_line: usize) -> Self {
        self.cache_line = cache_line;
        self
    }

    /// Set the nominal clock in GHz
    pub fn with_freq_ghz(mut self, freq_ghz: f64) -> Self {
        self.freq_ghz = freq_ghz;
        self
    }

    /// Set the synthetic index stride
    pub fn with_stride(mut self, stride: usize) -> Self {
        self.stride = stride;
        self
    }

    /// Set the problem-size sweep
    pub fn with_sweep(mut self, sweep: SweepRange) -> Self {
        self.sweep = sweep;
        self
    }

    /// Set warm-up and measurement sizing
    pub fn with_calibration(mut self, calibration: Calibration) -> Self {
        self.calibration = calibration;
        self
    }

    /// f64 lanes of the configured vector family
    #[inline]
    pub fn lanes(&self) -> usize {
        self.isa.lanes()
    }

    /// Whether padding actually applies to the configured layout
    #[inline]
    pub fn effective_padding(&self) -> bool {
        self.padding && self.layout == LayoutKind::Aos
    }

    /// Cache geometry for the configured line size
    pub fn geometry(&self) -> Result<CacheGeometry> {
        CacheGeometry::new(self.cache_line)
    }

    /// Reject configurations no run can use
    pub fn validate(&self) -> Result<()> {
        if self.stride == 0 {
            return Err(Error::invalid_argument("stride", "must be at least 1"));
        }
        if self.dims == 0 {
            return Err(Error::invalid_argument("dims", "must be at least 1"));
        }
        if self.single_array && self.dims != 1 {
            return Err(Error::invalid_argument(
                "dims",
                format!("single-array mode gathers one field, got {}", self.dims),
            ));
        }
        if !(self.freq_ghz.is_finite() && self.freq_ghz > 0.0) {
            return Err(Error::invalid_argument(
                "freq",
                format!("must be a positive frequency in GHz, got {}", self.freq_ghz),
            ));
        }
        self.geometry()?;
        self.sweep.validate()?;
        self.calibration.validate()
    }
}
