//! Gather kernels
//!
//! Every kernel implements the same contract through [`GatherStrategy`]:
//! read one `dims`-field record per index from a [`Records`] container and
//! write it, field-major, into a [`GatherOutput`] starting at a cursor (or
//! discard it when no destination is given). Three strategies exist:
//!
//! | Strategy          | Loads                                     | Hosts          |
//! |-------------------|-------------------------------------------|----------------|
//! | [`ScalarLoad`]    | one scalar per field per index            | any            |
//! | [`VectorLoad`]    | `VL`-lane tiles built from scalar loads   | any            |
//! | [`HardwareGather`]| `vgatherdpd` with an all-true mask        | AVX2 / AVX-512 |
//!
//! Both layouts reduce to one address rule, `offset = i * record_stride +
//! d * field_stride`, so each kernel has a single inner loop for AoS and SoA.

pub mod scalar;
pub mod simd;
pub mod vector;

pub use scalar::{ScalarLoad, gather_traced};
pub use simd::gather::HardwareGather;
pub use simd::{SimdLevel, detect_simd};
pub use vector::VectorLoad;

use crate::dataset::Records;
use crate::error::{Error, Result};
use crate::memory::AlignedBuffer;
use std::fmt;
use std::str::FromStr;

/// Vector instruction family the benchmark is modelled on
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Isa {
    /// 256-bit vectors, 4 f64 lanes
    Avx2,
    /// 512-bit vectors, 8 f64 lanes
    Avx512,
}

impl Isa {
    /// Widest family the host supports (AVX2 on hosts without either)
    pub fn detect() -> Self {
        if detect_simd().has_avx512() {
            Self::Avx512
        } else {
            Self::Avx2
        }
    }

    /// f64 lanes per vector register (`VL`)
    #[inline]
    pub const fn lanes(self) -> usize {
        match self {
            Self::Avx2 => 4,
            Self::Avx512 => 8,
        }
    }

    /// SIMD level needed to issue this family's instructions
    #[inline]
    pub const fn required_level(self) -> SimdLevel {
        match self {
            Self::Avx2 => SimdLevel::Avx2,
            Self::Avx512 => SimdLevel::Avx512,
        }
    }

    /// Report name
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Avx2 => "avx2",
            Self::Avx512 => "avx512",
        }
    }
}

impl fmt::Display for Isa {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Isa {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "avx2" => Ok(Self::Avx2),
            "avx512" => Ok(Self::Avx512),
            other => Err(Error::invalid_argument(
                "isa",
                format!("expected 'avx2' or 'avx512', got '{other}'"),
            )),
        }
    }
}

/// Which [`GatherStrategy`] implementation to run
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum StrategyKind {
    /// [`ScalarLoad`]
    Scalar,
    /// [`VectorLoad`]
    Vector,
    /// [`HardwareGather`]
    Hardware,
}

impl StrategyKind {
    /// Hardware gathers when the host has them, portable vector loads otherwise
    pub fn detect() -> Self {
        if detect_simd().has_avx2() {
            Self::Hardware
        } else {
            Self::Vector
        }
    }

    /// Report name
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Scalar => "scalar",
            Self::Vector => "vector",
            Self::Hardware => "hardware",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "scalar" => Ok(Self::Scalar),
            "vector" => Ok(Self::Vector),
            "hardware" | "hw" => Ok(Self::Hardware),
            other => Err(Error::invalid_argument(
                "strategy",
                format!("expected 'scalar', 'vector' or 'hardware', got '{other}'"),
            )),
        }
    }
}

/// Field-major destination for gathered records
///
/// Field `d` of output position `p` lives at `d * capacity + p`, matching
/// what SoA consumers downstream of a neighbor-list gather expect
/// regardless of the source layout.
pub struct GatherOutput {
    data: AlignedBuffer<f64>,
    dims: usize,
    capacity: usize,
}

impl GatherOutput {
    /// Allocate room for `capacity` records of `dims` fields
    pub fn new(dims: usize, capacity: usize) -> Result<Self> {
        let len = dims
            .checked_mul(capacity)
            .ok_or(Error::OutOfMemory { size: usize::MAX })?;
        Ok(Self {
            data: AlignedBuffer::zeroed(len)?,
            dims,
            capacity,
        })
    }

    /// Records the buffer can hold
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Fields per record
    #[inline]
    pub fn dims(&self) -> usize {
        self.dims
    }

    /// Field `d` of output position `pos`
    #[inline]
    pub fn get(&self, pos: usize, d: usize) -> f64 {
        self.data[d * self.capacity + pos]
    }
}

/// A gather kernel implementation
///
/// Implementations move data only; no arithmetic is applied to gathered
/// values.
pub trait GatherStrategy {
    /// Short identifier used in logs and reports
    fn name(&self) -> &'static str;

    /// Vector width (f64 lanes) the strategy processes per step
    fn lanes(&self) -> usize;

    /// Gather `idx.len()` records from `src`
    ///
    /// With a destination, record `j` lands at output position `cursor + j`;
    /// without one, loads are issued and discarded. Returns the number of
    /// records gathered.
    ///
    /// # Panics
    /// If the destination cannot hold `cursor + idx.len()` records or has a
    /// different field count than `src`.
    ///
    /// # Safety
    /// Every entry of `idx` must be a record index in
    /// `[0, src.layout().n_alloc())`.
    unsafe fn gather(
        &self,
        src: &Records,
        idx: &[i32],
        dst: Option<&mut GatherOutput>,
        cursor: usize,
    ) -> usize;
}

/// Build the strategy named by `kind` for the `isa` vector family
///
/// Fails with [`Error::UnsupportedStrategy`] when hardware gathers are
/// requested on a CPU without them.
pub fn select_strategy(kind: StrategyKind, isa: Isa) -> Result<Box<dyn GatherStrategy>> {
    Ok(match (kind, isa) {
        (StrategyKind::Scalar, _) => Box::new(ScalarLoad::new(isa.lanes())),
        (StrategyKind::Vector, Isa::Avx2) => Box::new(VectorLoad::<4>),
        (StrategyKind::Vector, Isa::Avx512) => Box::new(VectorLoad::<8>),
        (StrategyKind::Hardware, _) => Box::new(HardwareGather::new(isa)?),
    })
}

/// Check that every index is a valid record index for `src`
pub fn validate_indices(src: &Records, idx: &[i32]) -> Result<()> {
    let n_alloc = src.layout().n_alloc();
    match idx.iter().position(|&k| k < 0 || k as usize >= n_alloc) {
        Some(pos) => Err(Error::invalid_argument(
            "idx",
            format!(
                "index {} at position {pos} outside [0, {n_alloc})",
                idx[pos]
            ),
        )),
        None => Ok(()),
    }
}

/// Safe gather entry point: validates indices, then runs the strategy
pub fn gather_checked(
    strategy: &dyn GatherStrategy,
    src: &Records,
    idx: &[i32],
    dst: Option<&mut GatherOutput>,
    cursor: usize,
) -> Result<usize> {
    validate_indices(src, idx)?;
    // SAFETY: indices validated above.
    Ok(unsafe { strategy.gather(src, idx, dst, cursor) })
}

/// Raw pointers and strides shared by every kernel implementation
#[derive(Copy, Clone, Debug)]
pub(crate) struct RawGather {
    pub src: *const f64,
    pub record_stride: usize,
    pub field_stride: usize,
    pub dims: usize,
    pub idx: *const i32,
    pub len: usize,
    pub out: *mut f64,
    pub out_stride: usize,
}

impl RawGather {
    /// Capture pointers for one kernel call; `out` is null without a destination
    pub(crate) fn new(
        src: &Records,
        idx: &[i32],
        dst: Option<&mut GatherOutput>,
        cursor: usize,
    ) -> Self {
        let layout = src.layout();
        let (out, out_stride) = match dst {
            Some(dst) => {
                assert_eq!(dst.dims, layout.dims(), "destination field count mismatch");
                assert!(
                    cursor + idx.len() <= dst.capacity,
                    "destination holds {} records, gather needs {}",
                    dst.capacity,
                    cursor + idx.len()
                );
                (dst.data.as_mut_ptr().wrapping_add(cursor), dst.capacity)
            }
            None => (std::ptr::null_mut(), 0),
        };

        Self {
            src: src.as_ptr(),
            record_stride: layout.record_stride(),
            field_stride: layout.field_stride(),
            dims: layout.dims(),
            idx: idx.as_ptr(),
            len: idx.len(),
            out,
            out_stride,
        }
    }

    #[inline]
    pub(crate) fn stores(&self) -> bool {
        !self.out.is_null()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Dataset;
    use crate::layout::LayoutKind;

    #[test]
    fn test_isa_lanes() {
        assert_eq!(Isa::Avx2.lanes(), 4);
        assert_eq!(Isa::Avx512.lanes(), 8);
        assert_eq!("AVX512".parse::<Isa>().unwrap(), Isa::Avx512);
        assert!("sse".parse::<Isa>().is_err());
    }

    #[test]
    fn test_strategy_kind_parse() {
        assert_eq!("hw".parse::<StrategyKind>().unwrap(), StrategyKind::Hardware);
        assert_eq!(
            "vector".parse::<StrategyKind>().unwrap(),
            StrategyKind::Vector
        );
        assert!("simd".parse::<StrategyKind>().is_err());
    }

    #[test]
    fn test_portable_strategies_always_available() {
        for isa in [Isa::Avx2, Isa::Avx512] {
            let s = select_strategy(StrategyKind::Scalar, isa).unwrap();
            assert_eq!(s.lanes(), isa.lanes());
            let v = select_strategy(StrategyKind::Vector, isa).unwrap();
            assert_eq!(v.lanes(), isa.lanes());
        }
    }

    #[test]
    fn test_hardware_strategy_matches_detection() {
        for isa in [Isa::Avx2, Isa::Avx512] {
            let supported = detect_simd() >= isa.required_level();
            let result = select_strategy(StrategyKind::Hardware, isa);
            assert_eq!(result.is_ok(), supported, "isa {isa}");
        }
    }

    #[test]
    fn test_validate_indices() {
        let ds = Dataset::synthetic(LayoutKind::Soa, 3, false, 8, 1).unwrap();
        assert!(validate_indices(ds.records(), &[0, 15]).is_ok());
        assert!(validate_indices(ds.records(), &[16]).is_err());
        assert!(validate_indices(ds.records(), &[-1]).is_err());
    }

    #[test]
    fn test_output_starts_zeroed() {
        let out = GatherOutput::new(3, 4).unwrap();
        assert_eq!((out.dims(), out.capacity()), (3, 4));
        assert_eq!(out.get(3, 2), 0.0);
    }

    #[test]
    #[should_panic(expected = "destination holds")]
    fn test_destination_overflow_panics() {
        let ds = Dataset::synthetic(LayoutKind::Soa, 3, false, 8, 1).unwrap();
        let mut out = GatherOutput::new(3, 4).unwrap();
        let strategy = ScalarLoad::new(4);
        let _ = gather_checked(&strategy, ds.records(), ds.indices(), Some(&mut out), 0);
    }
}
