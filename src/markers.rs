//! Region markers around the timed burst
//!
//! A marker is notified immediately before and after the measured
//! repetitions. [`NoMarker`] does nothing; [`TscMarker`] reads the CPU
//! time-stamp counter so a measured cycle count can be reported next to the
//! frequency-derived one.

/// Instrumentation hook bracketing a measured region
pub trait RegionMarker {
    /// Region is about to start
    fn start(&mut self);

    /// Region just finished
    fn stop(&mut self);

    /// Cycles counted over the last `start`/`stop` pair, if the marker counts
    fn cycles(&self) -> Option<u64> {
        None
    }
}

/// Marker that records nothing
#[derive(Copy, Clone, Debug, Default)]
pub struct NoMarker;

impl RegionMarker for NoMarker {
    #[inline]
    fn start(&mut self) {}

    #[inline]
    fn stop(&mut self) {}
}

/// Time-stamp-counter marker (x86-64 only)
///
/// On other architectures [`TscMarker::cycles`] is always `None`.
#[derive(Copy, Clone, Debug, Default)]
pub struct TscMarker {
    begin: u64,
    elapsed: Option<u64>,
}

impl TscMarker {
    /// Create a marker with no region recorded yet
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether this build can read a cycle counter
    pub const fn available() -> bool {
        cfg!(target_arch = "x86_64")
    }
}

#[cfg(target_arch = "x86_64")]
#[inline(always)]
#[allow(unused_unsafe)]
fn read_tsc() -> Option<u64> {
    // SAFETY: rdtsc is part of the x86-64 baseline.
    Some(unsafe { std::arch::x86_64::_rdtsc() })
}

#[cfg(not(target_arch = "x86_64"))]
#[inline(always)]
fn read_tsc() -> Option<u64> {
    None
}

impl RegionMarker for TscMarker {
    #[inline]
    fn start(&mut self) {
        self.elapsed = None;
        self.begin = read_tsc().unwrap_or(0);
    }

    #[inline]
    fn stop(&mut self) {
        self.elapsed = read_tsc().map(|end| end.wrapping_sub(self.begin));
    }

    fn cycles(&self) -> Option<u64> {
        self.elapsed
    }
}
