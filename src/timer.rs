//! Calibrated repetition timing
//!
//! A short warm-up burst sizes the real measurement so that it runs for
//! roughly a fixed wall-clock time regardless of problem size:
//!
//! ```text
//! t_warm = time(warmup_reps calls)
//! rep    = warmup_reps * target_secs / t_warm      clamped to [1, MAX_REPETITIONS]
//! t_meas = time(rep calls)                          bracketed by the region marker
//! ```

use crate::error::{Error, Result};
use crate::markers::RegionMarker;
use std::time::Instant;

/// Ceiling on the measured repetition count
///
/// Also used when the warm-up burst is too fast for the clock to resolve.
pub const MAX_REPETITIONS: u64 = 100_000_000;

/// Warm-up size and measurement target
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Calibration {
    /// Kernel calls in the warm-up burst
    pub warmup_reps: u64,
    /// Wall-clock seconds the measured burst should take
    pub target_secs: f64,
}

impl Default for Calibration {
    fn default() -> Self {
        Self {
            warmup_reps: 100,
            target_secs: 0.5,
        }
    }
}

/// Outcome of one calibrated measurement
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Measurement {
    /// Seconds spent in the warm-up burst
    pub warmup_secs: f64,
    /// Calls in the measured burst
    pub repetitions: u64,
    /// Seconds spent in the measured burst
    pub elapsed_secs: f64,
    /// Marker cycles over the measured burst, when the marker counts them
    pub cycles: Option<u64>,
}

impl Calibration {
    /// Check that the calibration can produce a measurement
    pub fn validate(&self) -> Result<()> {
        if self.warmup_reps == 0 {
            return Err(Error::invalid_argument("warmup_reps", "must be at least 1"));
        }
        if !(self.target_secs.is_finite() && self.target_secs > 0.0) {
            return Err(Error::invalid_argument(
                "target_secs",
                format!("must be a positive number of seconds, got {}", self.target_secs),
            ));
        }
        Ok(())
    }

    /// Measured repetition count for a warm-up burst that took `warmup_secs`
    ///
    /// A zero, negative or non-finite warm-up time yields
    /// [`MAX_REPETITIONS`]; the result is never below 1.
    pub fn repetitions_for(&self, warmup_secs: f64) -> u64 {
        if !(warmup_secs.is_finite() && warmup_secs > 0.0) {
            return MAX_REPETITIONS;
        }
        let rep = self.warmup_reps as f64 * (self.target_secs / warmup_secs);
        // float-to-int casts saturate, so a huge ratio lands on u64::MAX
        (rep as u64).clamp(1, MAX_REPETITIONS)
    }

    /// Warm up, size, and time `kernel`
    pub fn measure<F: FnMut()>(
        &self,
        mut kernel: F,
        marker: &mut dyn RegionMarker,
    ) -> Measurement {
        let start = Instant::now();
        for _ in 0..self.warmup_reps {
            kernel();
        }
        let warmup_secs = start.elapsed().as_secs_f64();

        let repetitions = self.repetitions_for(warmup_secs);

        marker.start();
        let start = Instant::now();
        for _ in 0..repetitions {
            kernel();
        }
        let elapsed_secs = start.elapsed().as_secs_f64();
        marker.stop();

        Measurement {
            warmup_secs,
            repetitions,
            elapsed_secs,
            cycles: marker.cycles(),
        }
    }

    /// Time a single call of `kernel` with no warm-up
    pub fn measure_once<F: FnOnce()>(kernel: F, marker: &mut dyn RegionMarker) -> Measurement {
        marker.start();
        let start = Instant::now();
        kernel();
        let elapsed_secs = start.elapsed().as_secs_f64();
        marker.stop();

        Measurement {
            warmup_secs: 0.0,
            repetitions: 1,
            elapsed_secs,
            cycles: marker.cycles(),
        }
    }
}
